//! Process-wide status cache with a single global expiry.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::catalog::StatusEntry;
use crate::clock::{Clock, SystemClock};

/// Default time-to-live for cached statuses, in seconds.
pub const CACHE_DURATION_SECS: i64 = 5 * 60;

#[derive(Debug, Default)]
struct Entries {
  statuses: HashMap<String, StatusEntry>,
  /// `None` means epoch: the next read misses.
  last_fetch: Option<DateTime<Utc>>,
}

/// In-memory map from item id to its volatile status.
///
/// Expiry is global: every entry ages with the most recent
/// [`set_cached_statuses`](Self::set_cached_statuses) call, not individually.
/// Clones share the same entries, so one cache can be handed to every surface
/// of a session.
#[derive(Clone)]
pub struct StatusCache {
  entries: Arc<Mutex<Entries>>,
  clock: Arc<dyn Clock>,
  ttl: Duration,
}

impl StatusCache {
  /// Create an empty cache on the given clock.
  pub fn init(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
    Self {
      entries: Arc::new(Mutex::new(Entries::default())),
      clock,
      ttl,
    }
  }

  /// Empty cache on the wall clock with the default TTL.
  pub fn new() -> Self {
    Self::init(Arc::new(SystemClock), Duration::seconds(CACHE_DURATION_SECS))
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  fn lock(&self) -> MutexGuard<'_, Entries> {
    self.entries.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Cached statuses for exactly `ids`, or `None` on a miss.
  ///
  /// An elapsed TTL clears the whole cache. A requested id that was never
  /// cached is a miss but leaves the cache intact.
  pub fn get_cached_statuses(&self, ids: &[String]) -> Option<HashMap<String, StatusEntry>> {
    let now = self.clock.now();
    let mut entries = self.lock();

    let fresh = entries
      .last_fetch
      .map(|at| now - at <= self.ttl)
      .unwrap_or(false);
    if !fresh {
      entries.statuses.clear();
      entries.last_fetch = None;
      return None;
    }

    ids
      .iter()
      .map(|id| entries.statuses.get(id).map(|s| (id.clone(), s.clone())))
      .collect()
  }

  /// Upsert a fetched batch and restart the TTL. Entries absent from the batch are kept.
  pub fn set_cached_statuses(&self, statuses: HashMap<String, StatusEntry>) {
    let now = self.clock.now();
    let mut entries = self.lock();
    entries.last_fetch = Some(now);
    entries.statuses.extend(statuses);
  }

  /// Drop every entry and force the next read to miss.
  pub fn invalidate_cache(&self) {
    let mut entries = self.lock();
    entries.statuses.clear();
    entries.last_fetch = None;
  }

  /// Tear-down counterpart of [`init`](Self::init).
  pub fn reset(&self) {
    self.invalidate_cache();
  }

  pub fn len(&self) -> usize {
    self.lock().statuses.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl Default for StatusCache {
  fn default() -> Self {
    Self::new()
  }
}

impl std::fmt::Debug for StatusCache {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StatusCache")
      .field("ttl", &self.ttl)
      .field("len", &self.len())
      .finish_non_exhaustive()
  }
}
