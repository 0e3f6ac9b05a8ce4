use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// A canonical spec request: deduplicated handles in sorted order.
///
/// Two requests for the same set of handles always carry the same handle list
/// and the same signature, whatever order the handles were discovered in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRequest {
  handles: Vec<String>,
}

impl SpecRequest {
  pub fn new<I, T>(handles: I) -> Self
  where
    I: IntoIterator<Item = T>,
    T: Into<String>,
  {
    let handles: BTreeSet<String> = handles.into_iter().map(Into::into).collect();
    Self {
      handles: handles.into_iter().collect(),
    }
  }

  pub fn handles(&self) -> &[String] {
    &self.handles
  }

  pub fn len(&self) -> usize {
    self.handles.len()
  }

  pub fn is_empty(&self) -> bool {
    self.handles.is_empty()
  }

  /// Split into requests of at most `size` handles, preserving canonical order.
  pub fn chunks(&self, size: usize) -> Vec<SpecRequest> {
    self
      .handles
      .chunks(size.max(1))
      .map(|chunk| SpecRequest {
        handles: chunk.to_vec(),
      })
      .collect()
  }

  /// SHA256 of the canonical handle list, hex encoded.
  pub fn signature(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"specs:");
    hasher.update(self.handles.join(",").as_bytes());
    hex::encode(hasher.finalize())
  }
}
