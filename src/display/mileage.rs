use serde_json::Value;

use crate::catalog::{is_blank, value_text};

/// Unit appended to every mileage label.
pub const DISTANCE_UNIT: &str = "กม.";

/// Human-facing mileage.
///
/// Values that already carry `x` placeholders ("65xxx") are regrouped as-is.
/// Numeric values are truncated to whole kilometres; when the figure contains
/// a `0` digit, that digit and every digit after it are masked, since round
/// figures are estimates (150300 → "15x,xxx"). Figures without a zero are
/// grouped normally.
pub fn mileage_label(value: &Value) -> Option<String> {
  if is_blank(value) {
    return None;
  }
  let raw = value_text(value);

  if let Some(placeholder) = placeholder_token(&raw) {
    return Some(format!("{} {}", group_thousands(&placeholder), DISTANCE_UNIT));
  }

  let cleaned: String = raw
    .chars()
    .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
    .collect();
  // The unit suffix "กม." leaves a trailing dot behind
  let number: f64 = cleaned.trim_end_matches('.').parse().ok()?;
  if !number.is_finite() || number < 0.0 || number >= u64::MAX as f64 {
    return None;
  }

  let digits = (number.trunc() as u64).to_string();
  let masked = mask_from_first_zero(&digits);
  Some(format!("{} {}", group_thousands(&masked), DISTANCE_UNIT))
}

/// First word shaped like `65xxx` or `65,XXX`: digits, then a run of `x`.
/// Returned lowercased with separators dropped.
fn placeholder_token(raw: &str) -> Option<String> {
  raw.split_whitespace().find_map(|word| {
    let packed: String = word.chars().filter(|c| *c != ',' && *c != '.').collect();
    let digits = packed.chars().take_while(char::is_ascii_digit).count();
    let rest = &packed[digits..];
    let is_placeholder = digits > 0 && !rest.is_empty() && rest.chars().all(|c| c == 'x' || c == 'X');
    is_placeholder.then(|| packed.to_lowercase())
  })
}

fn mask_from_first_zero(digits: &str) -> String {
  match digits.find('0') {
    Some(at) => format!("{}{}", &digits[..at], "x".repeat(digits.len() - at)),
    None => digits.to_string(),
  }
}

/// Insert `,` every three characters from the right. Input is ASCII.
fn group_thousands(digits: &str) -> String {
  let len = digits.len();
  let mut out = String::with_capacity(len + len / 3);
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (len - i) % 3 == 0 {
      out.push(',');
    }
    out.push(c);
  }
  out
}
