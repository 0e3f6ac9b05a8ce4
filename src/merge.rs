//! Folding supplemental spec bundles into base listings.
//!
//! Base data is authoritative: a merge only ever fills blanks. Alias groups
//! (`fuelType`/`fuel_type`, the six drivetrain spellings) are written as a
//! unit so every alias reads the same value afterwards.

use serde_json::Value;

use crate::catalog::{Attributes, Item, ALIAS_GROUPS, SCALAR_ATTRIBUTES};

/// Merge `supplemental` into a copy of `base`.
pub fn merge_specs(base: &Item, supplemental: Option<&Attributes>) -> Item {
  let mut merged = base.clone();
  merged.attributes = merge_attributes(&base.attributes, supplemental);
  merged
}

/// Attribute-level merge behind [`merge_specs`].
pub fn merge_attributes(base: &Attributes, supplemental: Option<&Attributes>) -> Attributes {
  let mut merged = base.clone();

  for group in ALIAS_GROUPS {
    reconcile_group(&mut merged, group);
  }

  let Some(extra) = supplemental else {
    return merged;
  };

  for key in SCALAR_ATTRIBUTES {
    if merged.is_blank(key) {
      if let Some(value) = extra.present(key) {
        merged.set(key, value.clone());
      }
    }
  }

  for group in ALIAS_GROUPS {
    if merged.group_value(group).is_some() {
      continue;
    }
    if let Some(value) = extra.group_value(group).cloned() {
      fill_group(&mut merged, group, &value);
    }
  }

  merged
}

/// Copy the first non-blank alias into every blank alias of the group.
fn reconcile_group(attrs: &mut Attributes, group: &[&str]) {
  if let Some(value) = attrs.group_value(group).cloned() {
    fill_group(attrs, group, &value);
  }
}

fn fill_group(attrs: &mut Attributes, group: &[&str], value: &Value) {
  for key in group {
    if attrs.is_blank(key) {
      attrs.set(key, value.clone());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::{is_blank, DRIVETRAIN_ALIASES, FUEL_ALIASES};
  use proptest::prelude::*;
  use proptest::test_runner::Config;
  use serde_json::json;

  fn base() -> Item {
    Item::new("1", "mazda-cx5-2019")
      .with_attr("year", "2019")
      .with_attr("mileage", 0)
      .with_attr("transmission", "")
  }

  fn extra() -> Attributes {
    Attributes::new()
      .with("year", "2020")
      .with("mileage", 88000)
      .with("transmission", "Automatic")
      .with("fuel_type", "Diesel")
      .with("wheel_drive", "AWD")
      .with("body_type", "SUV")
  }

  fn assert_group_consistent(attrs: &Attributes, group: &[&str]) {
    let values: Vec<Option<&Value>> = group.iter().map(|k| attrs.present(k)).collect();
    let all_blank = values.iter().all(Option::is_none);
    let all_same = values.iter().all(|v| v.is_some() && *v == values[0]);
    assert!(all_blank || all_same, "inconsistent group {:?}: {:?}", group, values);
  }

  #[test]
  fn test_fills_only_blank_scalars() {
    let merged = merge_specs(&base(), Some(&extra()));
    let attrs = &merged.attributes;

    assert_eq!(attrs.get("year"), Some(&json!("2019")));
    // Numeric zero is a real value
    assert_eq!(attrs.get("mileage"), Some(&json!(0)));
    assert_eq!(attrs.get("transmission"), Some(&json!("Automatic")));
    assert_eq!(attrs.get("body_type"), Some(&json!("SUV")));
  }

  #[test]
  fn test_supplemental_alias_fills_whole_group() {
    let merged = merge_specs(&base(), Some(&extra()));
    for key in FUEL_ALIASES {
      assert_eq!(merged.attributes.get(key), Some(&json!("Diesel")));
    }
    for key in DRIVETRAIN_ALIASES {
      assert_eq!(merged.attributes.get(key), Some(&json!("AWD")));
    }
  }

  #[test]
  fn test_base_alias_wins_over_supplemental() {
    let item = base().with_attr("driveType", "4WD");
    let merged = merge_specs(&item, Some(&extra()));
    for key in DRIVETRAIN_ALIASES {
      assert_eq!(merged.attributes.get(key), Some(&json!("4WD")));
    }
  }

  #[test]
  fn test_reconciles_base_aliases_without_supplemental() {
    let item = Item::new("1", "h").with_attr("fuelType", "Hybrid");
    let merged = merge_specs(&item, None);
    assert_eq!(merged.attributes.get("fuel_type"), Some(&json!("Hybrid")));
    assert_group_consistent(&merged.attributes, DRIVETRAIN_ALIASES);
  }

  #[test]
  fn test_merge_is_idempotent() {
    let once = merge_specs(&base(), Some(&extra()));
    let twice = merge_specs(&once, Some(&extra()));
    assert_eq!(once, twice);
  }

  #[test]
  fn test_non_clobbering_over_all_keys() {
    let item = Item::new("1", "h")
      .with_attr("year", "2015")
      .with_attr("mileage", "120000")
      .with_attr("transmission", "Manual")
      .with_attr("installment", "5,900")
      .with_attr("category", "Pickup")
      .with_attr("body_type", "Truck")
      .with_attr("fuel_type", "Gasoline")
      .with_attr("drive-type", "RWD");
    let merged = merge_specs(&item, Some(&extra()));

    for (key, value) in item.attributes.iter() {
      assert_eq!(merged.attributes.get(key), Some(value), "clobbered {}", key);
    }
    assert_group_consistent(&merged.attributes, FUEL_ALIASES);
    assert_group_consistent(&merged.attributes, DRIVETRAIN_ALIASES);
  }

  #[test]
  fn test_blank_supplemental_values_are_ignored() {
    let item = Item::new("1", "h");
    let extra = Attributes::new().with("year", "  ").with("fuelType", "");
    let merged = merge_specs(&item, Some(&extra));
    assert!(merged.attributes.is_blank("year"));
    assert_group_consistent(&merged.attributes, FUEL_ALIASES);
  }

  #[test]
  fn test_identity_fields_come_from_base() {
    let item = Item::new("42", "honda-jazz").with_title("Honda Jazz");
    let merged = merge_specs(&item, Some(&extra()));
    assert_eq!(merged.id, "42");
    assert_eq!(merged.handle, "honda-jazz");
    assert_eq!(merged.title, "Honda Jazz");
  }

  fn any_key() -> impl Strategy<Value = &'static str> {
    let keys: Vec<&'static str> = SCALAR_ATTRIBUTES
      .iter()
      .chain(ALIAS_GROUPS.iter().flat_map(|group| group.iter()))
      .copied()
      .collect();
    proptest::sample::select(keys)
  }

  /// Blank and non-blank shapes the storefront actually sends.
  fn any_value() -> impl Strategy<Value = Value> {
    prop_oneof![
      Just(Value::Null),
      Just(json!("")),
      Just(json!("  ")),
      Just(json!(0)),
      Just(json!(150300)),
      Just(json!("AWD")),
      Just(json!("Diesel")),
      Just(json!("2562")),
    ]
  }

  fn any_attrs() -> impl Strategy<Value = Attributes> {
    proptest::collection::vec((any_key(), any_value()), 0..10)
      .prop_map(|pairs| {
        pairs
          .into_iter()
          .map(|(k, v)| (k.to_string(), v))
          .collect::<Attributes>()
      })
  }

  /// Attributes whose alias groups never disagree with themselves.
  fn consistent_attrs() -> impl Strategy<Value = Attributes> {
    any_attrs().prop_map(|mut attrs| {
      for group in ALIAS_GROUPS {
        if let Some(value) = attrs.group_value(group).cloned() {
          for key in group.iter() {
            if !attrs.is_blank(key) {
              attrs.set(key, value.clone());
            }
          }
        }
      }
      attrs
    })
  }

  proptest! {
    #![proptest_config(Config::with_cases(512))]

    #[test]
    fn test_merge_is_idempotent_for_any_pair(base in any_attrs(), extra in any_attrs()) {
      let once = merge_attributes(&base, Some(&extra));
      let twice = merge_attributes(&once, Some(&extra));
      prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_never_clobbers_present_values(base in any_attrs(), extra in any_attrs()) {
      let merged = merge_attributes(&base, Some(&extra));
      for (key, value) in base.iter() {
        if !is_blank(value) {
          prop_assert_eq!(merged.get(key), Some(value));
        }
      }
    }

    #[test]
    fn test_merge_leaves_alias_groups_consistent(
      base in consistent_attrs(),
      extra in proptest::option::of(any_attrs()),
    ) {
      let merged = merge_attributes(&base, extra.as_ref());
      for group in ALIAS_GROUPS {
        let values: Vec<Option<&Value>> = group.iter().map(|k| merged.present(k)).collect();
        let all_blank = values.iter().all(Option::is_none);
        let all_same = values.iter().all(|v| v.is_some() && *v == values[0]);
        prop_assert!(all_blank || all_same, "inconsistent {:?}: {:?}", group, values);
      }
    }
  }
}
