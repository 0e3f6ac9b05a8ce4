use crate::catalog::{Attributes, DRIVETRAIN_ALIASES, FUEL_ALIASES};

/// One "attribute present" check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requirement {
  Year,
  Mileage,
  Transmission,
  /// Satisfied by any drivetrain alias
  Drivetrain,
  /// Satisfied by any fuel alias
  FuelType,
  Category,
  BodyType,
}

impl Requirement {
  pub fn is_met(self, attrs: &Attributes) -> bool {
    match self {
      Requirement::Year => attrs.present("year").is_some(),
      Requirement::Mileage => attrs.present("mileage").is_some(),
      Requirement::Transmission => attrs.present("transmission").is_some(),
      Requirement::Drivetrain => attrs.group_value(DRIVETRAIN_ALIASES).is_some(),
      Requirement::FuelType => attrs.group_value(FUEL_ALIASES).is_some(),
      Requirement::Category => attrs.present("category").is_some(),
      Requirement::BodyType => attrs.present("body_type").is_some(),
    }
  }
}

/// Conjunction of requirements. An item is complete only when every
/// requirement holds; any single miss justifies a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletenessPredicate {
  required: Vec<Requirement>,
}

impl CompletenessPredicate {
  pub const CORE: [Requirement; 5] = [
    Requirement::Year,
    Requirement::Mileage,
    Requirement::Transmission,
    Requirement::Drivetrain,
    Requirement::FuelType,
  ];

  /// Add a requirement. Adding twice has no effect.
  pub fn with(mut self, requirement: Requirement) -> Self {
    if !self.required.contains(&requirement) {
      self.required.push(requirement);
    }
    self
  }

  pub fn requirements(&self) -> &[Requirement] {
    &self.required
  }

  pub fn is_complete(&self, attrs: &Attributes) -> bool {
    self.required.iter().all(|r| r.is_met(attrs))
  }

  /// Requirements `attrs` fails, in declaration order.
  pub fn missing(&self, attrs: &Attributes) -> Vec<Requirement> {
    self
      .required
      .iter()
      .copied()
      .filter(|r| !r.is_met(attrs))
      .collect()
  }
}

impl Default for CompletenessPredicate {
  fn default() -> Self {
    Self {
      required: Self::CORE.to_vec(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn complete() -> Attributes {
    Attributes::new()
      .with("year", "2021")
      .with("mileage", 0)
      .with("transmission", "AT")
      .with("wheelDrive", "FWD")
      .with("fuelType", "Gasoline")
  }

  #[test]
  fn test_core_predicate_accepts_any_alias() {
    assert!(CompletenessPredicate::default().is_complete(&complete()));
  }

  #[test]
  fn test_single_missing_attribute_is_incomplete() {
    let attrs = complete().with("transmission", " ");
    let predicate = CompletenessPredicate::default();
    assert!(!predicate.is_complete(&attrs));
    assert_eq!(predicate.missing(&attrs), vec![Requirement::Transmission]);
  }

  #[test]
  fn test_extended_predicate() {
    let predicate = CompletenessPredicate::default()
      .with(Requirement::Category)
      .with(Requirement::BodyType)
      .with(Requirement::Category);
    assert_eq!(predicate.requirements().len(), 7);
    assert!(!predicate.is_complete(&complete()));
    assert!(predicate.is_complete(&complete().with("category", "SUV").with("body_type", "SUV")));
  }
}
