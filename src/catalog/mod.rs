pub mod api_types;
pub mod client;
pub mod error;
pub mod source;
pub mod types;

pub use client::CatalogClient;
pub use error::FetchError;
pub use source::{SpecSource, StatusSource};
pub use types::{
  is_blank, value_text, Attributes, Item, StatusEntry, ALIAS_GROUPS, DRIVETRAIN_ALIASES,
  FUEL_ALIASES, SCALAR_ATTRIBUTES,
};
