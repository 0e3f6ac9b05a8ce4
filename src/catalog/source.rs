//! Read-only data sources the pipeline consumes.

use futures::future::BoxFuture;
use std::collections::HashMap;

use super::error::FetchError;
use super::types::{Attributes, StatusEntry};

/// Supplemental attribute bundles keyed by handle.
///
/// A handle missing from the returned map means "no data", not an error.
pub trait SpecSource: Send + Sync {
  fn fetch_specs<'a>(
    &'a self,
    handles: &'a [String],
  ) -> BoxFuture<'a, Result<HashMap<String, Attributes>, FetchError>>;
}

/// Volatile listing statuses keyed by item id.
pub trait StatusSource: Send + Sync {
  fn fetch_statuses<'a>(
    &'a self,
    ids: &'a [String],
  ) -> BoxFuture<'a, Result<HashMap<String, StatusEntry>, FetchError>>;
}
