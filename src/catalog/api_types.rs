//! Serde-deserializable types matching the catalog API responses.
//!
//! Both endpoints wrap their payload in an `ok` envelope. A body without
//! `ok: true` or without the payload key is treated as malformed.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use super::error::FetchError;
use super::types::{Attributes, StatusEntry};

// ============================================================================
// GET /status?ids=
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiStatusResponse {
  pub ok: Option<bool>,
  /// Decoded entry by entry so one bad record does not sink the batch
  pub statuses: Option<HashMap<String, Value>>,
}

impl ApiStatusResponse {
  /// Entries that do not decode are skipped, like ids the endpoint omitted.
  pub fn into_statuses(self) -> Result<HashMap<String, StatusEntry>, FetchError> {
    match (self.ok, self.statuses) {
      (Some(true), Some(statuses)) => Ok(
        statuses
          .into_iter()
          .filter_map(|(id, raw)| match serde_json::from_value::<StatusEntry>(raw) {
            Ok(entry) => Some((id, entry)),
            Err(error) => {
              debug!(id = %id, %error, "skipping undecodable status entry");
              None
            }
          })
          .collect(),
      ),
      (Some(true), None) => Err(FetchError::Malformed("missing `statuses`".to_string())),
      _ => Err(FetchError::Malformed("`ok` is not true".to_string())),
    }
  }
}

// ============================================================================
// GET /specs?handles=
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiSpecsResponse {
  pub ok: Option<bool>,
  pub specs: Option<HashMap<String, Option<Attributes>>>,
}

impl ApiSpecsResponse {
  /// Handles mapped to `null` carry no data and are dropped, same as absent ones.
  pub fn into_specs(self) -> Result<HashMap<String, Attributes>, FetchError> {
    match (self.ok, self.specs) {
      (Some(true), Some(specs)) => Ok(
        specs
          .into_iter()
          .filter_map(|(handle, attrs)| attrs.map(|a| (handle, a)))
          .collect(),
      ),
      (Some(true), None) => Err(FetchError::Malformed("missing `specs`".to_string())),
      _ => Err(FetchError::Malformed("`ok` is not true".to_string())),
    }
  }
}

/// Decode a response body, mapping JSON errors to [`FetchError::Malformed`].
pub fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, FetchError> {
  serde_json::from_slice(body).map_err(|e| FetchError::Malformed(e.to_string()))
}
