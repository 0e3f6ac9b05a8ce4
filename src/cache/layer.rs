//! Cache-first status resolution with network refill.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

use super::status::StatusCache;
use super::traits::CacheResult;
use crate::catalog::{StatusEntry, StatusSource};

/// Sits between a surface and the status endpoint.
///
/// Reads go to the shared [`StatusCache`] first; a miss fetches the whole id
/// set and writes it back through `set_cached_statuses`, the only write path
/// into the cache.
pub struct StatusLayer<S: StatusSource + ?Sized> {
  cache: StatusCache,
  source: Arc<S>,
}

impl<S: StatusSource + ?Sized> StatusLayer<S> {
  pub fn new(cache: StatusCache, source: Arc<S>) -> Self {
    Self { cache, source }
  }

  pub fn cache(&self) -> &StatusCache {
    &self.cache
  }

  /// Statuses for `ids`.
  ///
  /// 1. Empty request - nothing to do
  /// 2. Cache hit - return immediately
  /// 3. Miss - fetch, store, return the requested subset
  /// 4. Fetch failure - empty map; the caller keeps its baked-in statuses
  pub async fn resolve(&self, ids: &[String]) -> CacheResult<HashMap<String, StatusEntry>> {
    if ids.is_empty() {
      return CacheResult::from_cache(HashMap::new());
    }

    if let Some(cached) = self.cache.get_cached_statuses(ids) {
      return CacheResult::from_cache(cached);
    }

    let request: Vec<String> = ids
      .iter()
      .cloned()
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect();

    match self.source.fetch_statuses(&request).await {
      Ok(fetched) => {
        debug!(requested = request.len(), received = fetched.len(), "statuses fetched");
        let subset = ids
          .iter()
          .filter_map(|id| fetched.get(id).map(|s| (id.clone(), s.clone())))
          .collect();
        self.cache.set_cached_statuses(fetched);
        CacheResult::from_network(subset)
      }
      Err(error) => {
        warn!(%error, ids = request.len(), "status fetch failed");
        CacheResult::unavailable(HashMap::new())
      }
    }
  }
}

impl<S: StatusSource + ?Sized> Clone for StatusLayer<S> {
  fn clone(&self) -> Self {
    Self {
      cache: self.cache.clone(),
      source: Arc::clone(&self.source),
    }
  }
}
