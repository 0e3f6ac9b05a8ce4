//! Human-facing labels derived from a merged item.

mod mileage;
mod tokens;
mod year;

pub use mileage::{mileage_label, DISTANCE_UNIT};
pub use tokens::{Drivetrain, FuelType, Transmission};
pub use year::{normalize_year, year_label};

use crate::catalog::{value_text, Item, FUEL_ALIASES};

/// Every label a card or detail row shows for one item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayLabels {
  pub year: Option<String>,
  pub mileage: Option<String>,
  pub transmission: Option<Transmission>,
  pub drivetrain: Option<Drivetrain>,
  pub fuel: Option<FuelType>,
  pub status: Option<String>,
}

impl DisplayLabels {
  pub fn derive(item: &Item) -> Self {
    let attrs = &item.attributes;
    Self {
      year: attrs.present("year").and_then(year_label),
      mileage: attrs.present("mileage").and_then(mileage_label),
      transmission: attrs
        .text("transmission")
        .and_then(|raw| Transmission::normalize(&raw)),
      drivetrain: Drivetrain::resolve(item),
      fuel: attrs
        .group_value(FUEL_ALIASES)
        .map(value_text)
        .and_then(|raw| FuelType::normalize(&raw)),
      status: item
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_derive_all_labels() {
    let mut item = Item::new("7", "toyota-hilux-revo")
      .with_title("Toyota Hilux Revo 4x4")
      .with_attr("year", "2565")
      .with_attr("mileage", 85000)
      .with_attr("transmission", "A/T")
      .with_attr("fuel_type", "ดีเซล");
    item.status = Some(" reserved ".to_string());

    let labels = DisplayLabels::derive(&item);
    assert_eq!(labels.year.as_deref(), Some("2022"));
    assert_eq!(labels.mileage.as_deref(), Some("85,xxx กม."));
    assert_eq!(labels.transmission, Some(Transmission::Automatic));
    assert_eq!(labels.drivetrain, Some(Drivetrain::FourWd));
    assert_eq!(labels.fuel, Some(FuelType::Diesel));
    assert_eq!(labels.status.as_deref(), Some("reserved"));
  }

  #[test]
  fn test_bare_item_has_no_labels() {
    assert_eq!(DisplayLabels::derive(&Item::new("1", "x")), DisplayLabels::default());
  }
}
