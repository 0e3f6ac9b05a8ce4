use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Keys that carry the fuel type. Kept mutually consistent by the merge.
pub const FUEL_ALIASES: &[&str] = &["fuelType", "fuel_type"];

/// Keys that carry the drivetrain. Kept mutually consistent by the merge.
pub const DRIVETRAIN_ALIASES: &[&str] = &[
  "drivetrain",
  "drive_type",
  "driveType",
  "drive-type",
  "wheel_drive",
  "wheelDrive",
];

/// Single-key attributes filled from supplemental data.
pub const SCALAR_ATTRIBUTES: &[&str] = &[
  "year",
  "mileage",
  "transmission",
  "installment",
  "category",
  "body_type",
];

/// Alias groups, in the order the merge reconciles them.
pub const ALIAS_GROUPS: &[&[&str]] = &[FUEL_ALIASES, DRIVETRAIN_ALIASES];

/// A catalog listing as delivered by the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
  pub id: String,
  pub handle: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub tags: Vec<String>,
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub available_for_sale: bool,
  #[serde(default)]
  pub attributes: Attributes,
}

impl Item {
  pub fn new(id: impl Into<String>, handle: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      handle: handle.into(),
      title: String::new(),
      tags: Vec::new(),
      status: None,
      available_for_sale: true,
      attributes: Attributes::default(),
    }
  }

  pub fn with_title(mut self, title: impl Into<String>) -> Self {
    self.title = title.into();
    self
  }

  pub fn with_tags<I, T>(mut self, tags: I) -> Self
  where
    I: IntoIterator<Item = T>,
    T: Into<String>,
  {
    self.tags = tags.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_attr(mut self, key: &str, value: impl Into<Value>) -> Self {
    self.attributes.set(key, value.into());
    self
  }
}

/// Display attributes keyed by their wire names.
///
/// Values are raw JSON scalars; the storefront sends years and mileages both as
/// strings and as numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, Value>);

impl Attributes {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.0.get(key)
  }

  /// Value for `key` if it is not blank.
  pub fn present(&self, key: &str) -> Option<&Value> {
    self.0.get(key).filter(|v| !is_blank(v))
  }

  pub fn is_blank(&self, key: &str) -> bool {
    self.present(key).is_none()
  }

  pub fn set(&mut self, key: &str, value: Value) {
    self.0.insert(key.to_string(), value);
  }

  pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
    self.set(key, value.into());
    self
  }

  /// First non-blank value across an alias group, in group order.
  pub fn group_value(&self, group: &[&str]) -> Option<&Value> {
    group.iter().find_map(|key| self.present(key))
  }

  /// Non-blank value rendered as display text.
  pub fn text(&self, key: &str) -> Option<String> {
    self.present(key).map(value_text)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
    self.0.iter()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl FromIterator<(String, Value)> for Attributes {
  fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

/// A value is blank when it is null or its text form trims to nothing.
/// Numbers are never blank, so a mileage of `0` counts as present.
pub fn is_blank(value: &Value) -> bool {
  match value {
    Value::Null => true,
    Value::String(s) => s.trim().is_empty(),
    Value::Number(_) | Value::Bool(_) => false,
    Value::Array(items) => items.is_empty(),
    Value::Object(map) => map.is_empty(),
  }
}

/// Text form of a scalar value, without JSON quoting.
pub fn value_text(value: &Value) -> String {
  match value {
    Value::String(s) => s.trim().to_string(),
    Value::Null => String::new(),
    other => other.to_string(),
  }
}

/// Volatile status of a listing as served by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
  pub status: String,
  /// Backends send either an ISO string or epoch milliseconds
  #[serde(default, deserialize_with = "scalar_text")]
  pub updated_at: Option<String>,
}

/// Any JSON scalar as text; `null` and blanks as `None`.
fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(value.filter(|v| !is_blank(v)).map(|v| value_text(&v)))
}

impl StatusEntry {
  pub fn new(status: impl Into<String>) -> Self {
    Self {
      status: status.into(),
      updated_at: None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_blank_rules() {
    assert!(is_blank(&Value::Null));
    assert!(is_blank(&json!("")));
    assert!(is_blank(&json!("   ")));
    assert!(!is_blank(&json!(0)));
    assert!(!is_blank(&json!("0")));
    assert!(!is_blank(&json!(false)));
    assert!(is_blank(&json!([])));
  }

  #[test]
  fn test_group_value_skips_blank_aliases() {
    let attrs = Attributes::new()
      .with("drivetrain", " ")
      .with("driveType", "4WD");
    assert_eq!(attrs.group_value(DRIVETRAIN_ALIASES), Some(&json!("4WD")));
    assert_eq!(attrs.group_value(FUEL_ALIASES), None);
  }

  #[test]
  fn test_status_entry_accepts_numeric_timestamp() {
    let entry: StatusEntry =
      serde_json::from_value(json!({ "status": "sold", "updatedAt": 1714521600000u64 })).unwrap();
    assert_eq!(entry.updated_at.as_deref(), Some("1714521600000"));

    let entry: StatusEntry =
      serde_json::from_value(json!({ "status": "sold", "updatedAt": null })).unwrap();
    assert_eq!(entry.updated_at, None);
  }

  #[test]
  fn test_item_deserializes_storefront_shape() {
    let item: Item = serde_json::from_value(json!({
      "id": "gid://shopify/Product/1",
      "handle": "toyota-hilux-revo-2019",
      "title": "Toyota Hilux Revo 4WD",
      "availableForSale": true,
      "attributes": { "year": "2562", "mileage": 150300, "fuel_type": "Diesel" }
    }))
    .unwrap();

    assert_eq!(item.handle, "toyota-hilux-revo-2019");
    assert!(item.available_for_sale);
    assert_eq!(item.status, None);
    assert_eq!(item.attributes.text("mileage").as_deref(), Some("150300"));
    assert_eq!(item.attributes.text("fuel_type").as_deref(), Some("Diesel"));
  }
}
