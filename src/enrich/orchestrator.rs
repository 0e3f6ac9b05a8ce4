//! Per-surface spec backfill.
//!
//! An [`Enricher`] looks at the items a surface shows, works out which ones
//! still miss attributes, and fetches their specs in the background without
//! ever holding up the first render:
//!
//! 1. Evaluate the completeness predicate against each item merged with the
//!    specs already known
//! 2. Skip handles that are requested or out of attempts
//! 3. Claim the rest, sort them canonically, split into batches
//! 4. Defer each batch until the page has loaded and the host is idle
//! 5. Fetch with a hard timeout and report back over the surface's event channel
//! 6. Fold the answer into the spec store; release whatever came back empty
//!
//! All state lives here and changes only through `&mut self`, so the owning
//! surface applies results in the order it receives them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::predicate::CompletenessPredicate;
use super::request::SpecRequest;
use super::tracker::RequestTracker;
use crate::catalog::{Attributes, FetchError, Item, SpecSource};
use crate::config::EnrichmentConfig;
use crate::event::Event;
use crate::merge::{merge_attributes, merge_specs};
use crate::scheduler::{CancelHandle, IdleOptions, Scheduler};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichConfig {
  pub max_attempts: u32,
  /// `None` sends every claimed handle in one request
  pub batch_size: Option<usize>,
  pub fetch_timeout: Duration,
  pub idle: IdleOptions,
  pub predicate: CompletenessPredicate,
}

impl EnrichConfig {
  pub fn from_settings(settings: &EnrichmentConfig) -> Self {
    Self {
      max_attempts: settings.max_attempts,
      batch_size: Some(settings.batch_size),
      fetch_timeout: Duration::from_millis(settings.fetch_timeout_ms),
      idle: IdleOptions {
        timeout: Duration::from_millis(settings.idle_timeout_ms),
        fallback_delay: Duration::from_millis(settings.fallback_delay_ms),
      },
      predicate: CompletenessPredicate::default(),
    }
  }

  pub fn with_predicate(mut self, predicate: CompletenessPredicate) -> Self {
    self.predicate = predicate;
    self
  }

  pub fn without_batching(mut self) -> Self {
    self.batch_size = None;
    self
  }
}

impl Default for EnrichConfig {
  fn default() -> Self {
    Self::from_settings(&EnrichmentConfig::default())
  }
}

pub struct Enricher<S: SpecSource + ?Sized + 'static> {
  surface: &'static str,
  source: Arc<S>,
  scheduler: Scheduler,
  config: EnrichConfig,
  tracker: RequestTracker,
  specs: HashMap<String, Attributes>,
  /// Scheduled or running requests, by signature
  pending: HashMap<String, CancelHandle>,
  events: mpsc::UnboundedSender<Event>,
  revision: u64,
  disposed: bool,
}

impl<S: SpecSource + ?Sized + 'static> Enricher<S> {
  pub fn new(
    surface: &'static str,
    source: Arc<S>,
    scheduler: Scheduler,
    config: EnrichConfig,
    events: mpsc::UnboundedSender<Event>,
  ) -> Self {
    Self {
      surface,
      source,
      scheduler,
      tracker: RequestTracker::new(config.max_attempts),
      config,
      specs: HashMap::new(),
      pending: HashMap::new(),
      events,
      revision: 0,
      disposed: false,
    }
  }

  pub fn config(&self) -> &EnrichConfig {
    &self.config
  }

  pub fn tracker(&self) -> &RequestTracker {
    &self.tracker
  }

  /// Supplemental specs known so far, by handle.
  pub fn specs(&self) -> &HashMap<String, Attributes> {
    &self.specs
  }

  /// Bumped every time the spec store changes.
  pub fn revision(&self) -> u64 {
    self.revision
  }

  /// Requests scheduled or in flight.
  pub fn outstanding(&self) -> usize {
    self.pending.len()
  }

  /// `item` merged with whatever specs are known for its handle.
  pub fn merged(&self, item: &Item) -> Item {
    merge_specs(item, self.specs.get(&item.handle))
  }

  pub fn needs_enrichment(&self, item: &Item) -> bool {
    let attrs = merge_attributes(&item.attributes, self.specs.get(&item.handle));
    !self.config.predicate.is_complete(&attrs)
  }

  /// Work out which visible items need specs and schedule fetches for them.
  ///
  /// Returns the requests dispatched; empty when there is nothing to do.
  pub fn evaluate(&mut self, items: &[Item]) -> Vec<SpecRequest> {
    if self.disposed {
      return Vec::new();
    }

    let needed: Vec<&str> = items
      .iter()
      .filter(|item| !item.handle.trim().is_empty())
      .filter(|item| self.needs_enrichment(item))
      .map(|item| item.handle.as_str())
      .collect();

    let claimed = self.tracker.claim(needed);
    if claimed.is_empty() {
      return Vec::new();
    }

    let request = SpecRequest::new(claimed);
    let batches = match self.config.batch_size {
      Some(size) => request.chunks(size),
      None => vec![request],
    };

    for batch in &batches {
      self.dispatch(batch.clone());
    }
    batches
  }

  fn dispatch(&mut self, request: SpecRequest) {
    let signature = request.signature();
    debug!(
      surface = self.surface,
      signature = %signature,
      handles = request.len(),
      "scheduling spec fetch"
    );

    let source = Arc::clone(&self.source);
    let events = self.events.clone();
    let timeout = self.config.fetch_timeout;
    let handles = request.clone();

    let handle = self.scheduler.schedule_after_load_then_idle(
      move || async move {
        let result = tokio::time::timeout(timeout, source.fetch_specs(request.handles())).await;
        let outcome = match result {
          Ok(result) => result,
          Err(elapsed) => Err(FetchError::from(elapsed)),
        };
        // Receiver gone means the surface was torn down
        let _ = events.send(Event::SpecsFetched { request, outcome });
      },
      self.config.idle,
    );

    if handle.is_cancelled() {
      // Could not schedule at all; make the handles claimable again
      self
        .tracker
        .release(handles.handles().iter().map(String::as_str));
      return;
    }
    self.pending.insert(signature, handle);
  }

  /// Apply the result of a spec request. Returns whether the spec store changed.
  pub fn handle_specs(
    &mut self,
    request: SpecRequest,
    outcome: Result<HashMap<String, Attributes>, FetchError>,
  ) -> bool {
    self.pending.remove(&request.signature());
    if self.disposed {
      return false;
    }

    match outcome {
      Ok(mut specs) => {
        let mut missing = Vec::new();
        let mut merged = 0usize;
        for handle in request.handles() {
          match specs.remove(handle) {
            Some(attrs) => {
              self.specs.insert(handle.clone(), attrs);
              merged += 1;
            }
            None => missing.push(handle.as_str()),
          }
        }

        if !specs.is_empty() {
          debug!(
            surface = self.surface,
            ignored = specs.len(),
            "response carried handles that were not requested"
          );
        }
        if !missing.is_empty() {
          debug!(
            surface = self.surface,
            missing = missing.len(),
            "no specs for some handles; releasing for retry"
          );
        }
        self.tracker.release(missing);

        if merged > 0 {
          self.revision += 1;
        }
        merged > 0
      }
      Err(error) => {
        warn!(
          surface = self.surface,
          signature = %request.signature(),
          handles = request.len(),
          %error,
          "spec fetch failed"
        );
        self
          .tracker
          .release(request.handles().iter().map(String::as_str));
        false
      }
    }
  }

  /// Stop all scheduled work and forget request state.
  pub fn dispose(&mut self) {
    if self.disposed {
      return;
    }
    for (_, handle) in self.pending.drain() {
      handle.abort();
    }
    self.tracker.dispose();
    self.disposed = true;
  }
}

impl<S: SpecSource + ?Sized + 'static> Drop for Enricher<S> {
  fn drop(&mut self) {
    self.dispose();
  }
}
