//! Canonical transmission, drivetrain and fuel tokens.
//!
//! Listings spell these every which way, in English and Thai. Matching is
//! case-insensitive; input nothing recognises passes through untouched.

use std::fmt;

use crate::catalog::{value_text, Item, DRIVETRAIN_ALIASES};

/// Lowercased text with spaces, dashes and underscores removed, so
/// "ขับเคลื่อน 4 ล้อ" and "toyota-hilux-4wd" match compact tokens.
fn compact(text: &str) -> String {
  text
    .to_lowercase()
    .chars()
    .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
    .collect()
}

/// Lowercased words, keeping `/` so "A/T" stays one word.
fn words(text: &str) -> Vec<String> {
  text
    .to_lowercase()
    .split(|c: char| !c.is_alphanumeric() && c != '/')
    .filter(|w| !w.is_empty())
    .map(String::from)
    .collect()
}

// ============================================================================
// Transmission
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transmission {
  /// Includes CVT
  Automatic,
  Manual,
  Other(String),
}

const AUTOMATIC_MARKERS: &[&str] = &["auto", "cvt", "อัตโนมัติ", "ออโต้"];
const AUTOMATIC_WORDS: &[&str] = &["at", "a/t"];
const MANUAL_MARKERS: &[&str] = &["manual", "ธรรมดา"];
const MANUAL_WORDS: &[&str] = &["mt", "m/t"];

impl Transmission {
  pub fn normalize(raw: &str) -> Option<Self> {
    let raw = raw.trim();
    if raw.is_empty() {
      return None;
    }

    let packed = compact(raw);
    let words = words(raw);
    let has_word = |set: &[&str]| words.iter().any(|w| set.contains(&w.as_str()));

    if AUTOMATIC_MARKERS.iter().any(|m| packed.contains(m)) || has_word(AUTOMATIC_WORDS) {
      Some(Transmission::Automatic)
    } else if MANUAL_MARKERS.iter().any(|m| packed.contains(m)) || has_word(MANUAL_WORDS) {
      Some(Transmission::Manual)
    } else {
      Some(Transmission::Other(raw.to_string()))
    }
  }

  pub fn label(&self) -> &str {
    match self {
      Transmission::Automatic => "Automatic",
      Transmission::Manual => "Manual",
      Transmission::Other(raw) => raw,
    }
  }
}

impl fmt::Display for Transmission {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

// ============================================================================
// Drivetrain
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drivetrain {
  Awd,
  FourWd,
  TwoWd,
  Fwd,
  Rwd,
  Other(String),
}

const AWD_MARKERS: &[&str] = &["awd", "allwheeldrive", "ขับเคลื่อนทุกล้อ"];
const FOUR_WD_MARKERS: &[&str] = &[
  "4wd",
  "4x4",
  "fourwheeldrive",
  "ขับเคลื่อนสี่ล้อ",
  "ขับเคลื่อน4ล้อ",
  "ขับสี่",
];
const TWO_WD_MARKERS: &[&str] = &[
  "2wd",
  "4x2",
  "twowheeldrive",
  "ขับเคลื่อนสองล้อ",
  "ขับเคลื่อน2ล้อ",
  "ขับสอง",
];
const FWD_MARKERS: &[&str] = &["fwd", "frontwheeldrive", "ขับหน้า", "ขับเคลื่อนล้อหน้า"];
const RWD_MARKERS: &[&str] = &["rwd", "rearwheeldrive", "ขับหลัง", "ขับเคลื่อนล้อหลัง"];

impl Drivetrain {
  /// Recognise a drivetrain token anywhere in `text`.
  pub fn detect(text: &str) -> Option<Self> {
    let packed = compact(text);
    if packed.is_empty() {
      return None;
    }
    let has = |markers: &[&str]| markers.iter().any(|m| packed.contains(m));

    // AWD before 4WD
    if has(AWD_MARKERS) {
      Some(Drivetrain::Awd)
    } else if has(FOUR_WD_MARKERS) {
      Some(Drivetrain::FourWd)
    } else if has(TWO_WD_MARKERS) {
      Some(Drivetrain::TwoWd)
    } else if has(FWD_MARKERS) {
      Some(Drivetrain::Fwd)
    } else if has(RWD_MARKERS) {
      Some(Drivetrain::Rwd)
    } else {
      None
    }
  }

  /// Drivetrain for an item: explicit attribute first, then the title and
  /// handle, then the tags. An explicit value nothing recognises is shown
  /// as-is when no other source matches either.
  pub fn resolve(item: &Item) -> Option<Self> {
    let explicit = item
      .attributes
      .group_value(DRIVETRAIN_ALIASES)
      .map(value_text);

    explicit
      .as_deref()
      .and_then(Self::detect)
      .or_else(|| Self::detect(&item.title))
      .or_else(|| Self::detect(&item.handle))
      .or_else(|| item.tags.iter().find_map(|tag| Self::detect(tag)))
      .or_else(|| explicit.map(Drivetrain::Other))
  }

  pub fn label(&self) -> &str {
    match self {
      Drivetrain::Awd => "AWD",
      Drivetrain::FourWd => "4WD",
      Drivetrain::TwoWd => "2WD",
      Drivetrain::Fwd => "FWD",
      Drivetrain::Rwd => "RWD",
      Drivetrain::Other(raw) => raw,
    }
  }
}

impl fmt::Display for Drivetrain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

// ============================================================================
// Fuel
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FuelType {
  Gasoline,
  Diesel,
  Hybrid,
  Electric,
  Lpg,
  Cng,
  Other(String),
}

impl FuelType {
  pub fn normalize(raw: &str) -> Option<Self> {
    let raw = raw.trim();
    if raw.is_empty() {
      return None;
    }

    let packed = compact(raw);
    let words = words(raw);
    let has = |markers: &[&str]| markers.iter().any(|m| packed.contains(m));
    let has_word = |set: &[&str]| words.iter().any(|w| set.contains(&w.as_str()));

    // Hybrids often mention their combustion fuel too
    let fuel = if has(&["hybrid", "ไฮบริด"]) || has_word(&["hev", "phev"]) {
      FuelType::Hybrid
    } else if has(&["electric", "ไฟฟ้า"]) || has_word(&["ev", "bev"]) {
      FuelType::Electric
    } else if has(&["diesel", "ดีเซล"]) {
      FuelType::Diesel
    } else if has(&["lpg"]) {
      FuelType::Lpg
    } else if has(&["cng", "ngv"]) {
      FuelType::Cng
    } else if has(&["gasoline", "petrol", "benzin", "เบนซิน"]) || has_word(&["gas"]) {
      FuelType::Gasoline
    } else {
      FuelType::Other(raw.to_string())
    };
    Some(fuel)
  }

  pub fn label(&self) -> &str {
    match self {
      FuelType::Gasoline => "Gasoline",
      FuelType::Diesel => "Diesel",
      FuelType::Hybrid => "Hybrid",
      FuelType::Electric => "Electric",
      FuelType::Lpg => "LPG",
      FuelType::Cng => "CNG",
      FuelType::Other(raw) => raw,
    }
  }
}

impl fmt::Display for FuelType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}
