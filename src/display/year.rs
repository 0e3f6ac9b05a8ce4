use serde_json::Value;

use crate::catalog::{is_blank, value_text};

/// Offset between the Buddhist and Gregorian calendars.
const BUDDHIST_OFFSET: u32 = 543;

/// Gregorian model year from a raw year attribute.
///
/// Takes the first four consecutive digits. Buddhist-era years (2500-2600)
/// are converted; plausible Gregorian years (1900-2100) pass through;
/// anything else is unknown.
pub fn normalize_year(value: &Value) -> Option<u32> {
  if is_blank(value) {
    return None;
  }
  let raw = value_text(value);
  let year = first_four_digits(&raw)?;

  match year {
    2500..=2600 => Some(year - BUDDHIST_OFFSET),
    1900..=2100 => Some(year),
    _ => None,
  }
}

pub fn year_label(value: &Value) -> Option<String> {
  normalize_year(value).map(|y| y.to_string())
}

fn first_four_digits(text: &str) -> Option<u32> {
  // ASCII digits never occur inside multi-byte UTF-8 sequences
  text
    .as_bytes()
    .windows(4)
    .find(|w| w.iter().all(u8::is_ascii_digit))
    .and_then(|w| std::str::from_utf8(w).ok())
    .and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_buddhist_era_converted() {
    assert_eq!(year_label(&json!("2567")).as_deref(), Some("2024"));
    assert_eq!(year_label(&json!(2562)).as_deref(), Some("2019"));
    assert_eq!(year_label(&json!("ปี 2560")).as_deref(), Some("2017"));
  }

  #[test]
  fn test_gregorian_passes_through() {
    assert_eq!(year_label(&json!("2024")).as_deref(), Some("2024"));
    assert_eq!(year_label(&json!("MY2019 facelift")).as_deref(), Some("2019"));
  }

  #[test]
  fn test_unknown_years() {
    assert_eq!(year_label(&json!("รถปี 99")), None);
    assert_eq!(year_label(&json!("1850")), None);
    assert_eq!(year_label(&json!("2700")), None);
    assert_eq!(year_label(&json!("")), None);
    assert_eq!(year_label(&json!(null)), None);
  }
}
