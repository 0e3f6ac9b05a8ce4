use std::collections::HashMap;
use tokio::sync::mpsc;

use crate::catalog::{Attributes, FetchError, StatusEntry};
use crate::enrich::SpecRequest;

/// Results delivered back to a surface by its background tasks
#[derive(Debug)]
pub enum Event {
  /// A spec request finished, successfully or not
  SpecsFetched {
    request: SpecRequest,
    outcome: Result<HashMap<String, Attributes>, FetchError>,
  },
  /// Status resolution for one generation of visible items finished
  StatusesResolved {
    generation: u64,
    statuses: HashMap<String, StatusEntry>,
  },
}

/// Channel that background tasks report into. Owned by the surface that
/// applies the events, so all state changes happen in one place.
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  pub fn new() -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self { tx, rx }
  }

  /// Sender for a background task
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}

impl Default for EventHandler {
  fn default() -> Self {
    Self::new()
  }
}
