use std::collections::{HashMap, HashSet};

/// Per-surface bookkeeping for spec requests.
///
/// `requested` holds handles that are in flight or already answered; they are
/// never claimed again until released. `attempts` counts claims per handle and
/// is never decremented, so a handle is claimed at most `max_attempts` times
/// whatever happens to its requests.
#[derive(Debug)]
pub struct RequestTracker {
  requested: HashSet<String>,
  attempts: HashMap<String, u32>,
  max_attempts: u32,
}

impl RequestTracker {
  pub fn new(max_attempts: u32) -> Self {
    Self {
      requested: HashSet::new(),
      attempts: HashMap::new(),
      max_attempts,
    }
  }

  pub fn max_attempts(&self) -> u32 {
    self.max_attempts
  }

  pub fn attempts(&self, handle: &str) -> u32 {
    self.attempts.get(handle).copied().unwrap_or(0)
  }

  pub fn is_requested(&self, handle: &str) -> bool {
    self.requested.contains(handle)
  }

  pub fn is_exhausted(&self, handle: &str) -> bool {
    self.attempts(handle) >= self.max_attempts
  }

  /// Whether `handle` may be claimed right now.
  pub fn is_eligible(&self, handle: &str) -> bool {
    !self.is_requested(handle) && !self.is_exhausted(handle)
  }

  /// Claim every eligible handle: mark it requested and count the attempt.
  /// Returns the claimed handles, without duplicates, in input order.
  pub fn claim<'a, I>(&mut self, handles: I) -> Vec<String>
  where
    I: IntoIterator<Item = &'a str>,
  {
    let mut claimed = Vec::new();
    for handle in handles {
      if !self.is_eligible(handle) {
        continue;
      }
      self.requested.insert(handle.to_string());
      *self.attempts.entry(handle.to_string()).or_insert(0) += 1;
      claimed.push(handle.to_string());
    }
    claimed
  }

  /// Make handles claimable again (attempt counts stand).
  pub fn release<'a, I>(&mut self, handles: I)
  where
    I: IntoIterator<Item = &'a str>,
  {
    for handle in handles {
      self.requested.remove(handle);
    }
  }

  pub fn requested_len(&self) -> usize {
    self.requested.len()
  }

  /// Forget everything. Called when the owning surface goes away.
  pub fn dispose(&mut self) {
    self.requested.clear();
    self.attempts.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_claim_marks_and_counts() {
    let mut tracker = RequestTracker::new(2);
    let claimed = tracker.claim(["a", "b", "a"]);
    assert_eq!(claimed, vec!["a".to_string(), "b".to_string()]);
    assert!(tracker.is_requested("a"));
    assert_eq!(tracker.attempts("a"), 1);
  }

  #[test]
  fn test_in_flight_handle_is_not_claimed_twice() {
    let mut tracker = RequestTracker::new(2);
    tracker.claim(["a"]);
    assert!(tracker.claim(["a"]).is_empty());
    assert_eq!(tracker.attempts("a"), 1);
  }

  #[test]
  fn test_retry_bound() {
    let mut tracker = RequestTracker::new(2);

    assert_eq!(tracker.claim(["a"]).len(), 1);
    tracker.release(["a"]);
    assert_eq!(tracker.claim(["a"]).len(), 1);
    tracker.release(["a"]);

    assert!(tracker.is_exhausted("a"));
    assert!(tracker.claim(["a"]).is_empty());
    assert_eq!(tracker.attempts("a"), 2);
  }

  #[test]
  fn test_dispose_forgets_state() {
    let mut tracker = RequestTracker::new(1);
    tracker.claim(["a"]);
    tracker.dispose();
    assert_eq!(tracker.requested_len(), 0);
    assert_eq!(tracker.attempts("a"), 0);
  }
}
