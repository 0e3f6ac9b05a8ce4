//! One display surface: its enrichment state, its status overlay and the
//! snapshot it publishes for rendering.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheSource, StatusCache, StatusLayer};
use crate::catalog::{Attributes, Item, SpecSource, StatusEntry, StatusSource};
use crate::config::EnrichmentConfig;
use crate::enrich::{CompletenessPredicate, EnrichConfig, Enricher, Requirement};
use crate::event::{Event, EventHandler};
use crate::scheduler::Scheduler;

/// Where a set of items is shown. Each surface tracks its own requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SurfaceKind {
  /// Paged catalog grid
  #[default]
  Listing,
  /// "Similar cars" strip on a detail page
  Similar,
  /// Brand landing page
  Brand,
}

impl SurfaceKind {
  pub fn label(self) -> &'static str {
    match self {
      SurfaceKind::Listing => "listing",
      SurfaceKind::Similar => "similar",
      SurfaceKind::Brand => "brand",
    }
  }

  pub fn enrich_config(self, settings: &EnrichmentConfig) -> EnrichConfig {
    let config = EnrichConfig::from_settings(settings);
    match self {
      SurfaceKind::Listing => config,
      // A handful of cards; one request is enough
      SurfaceKind::Similar => config.without_batching(),
      SurfaceKind::Brand => config.with_predicate(
        CompletenessPredicate::default()
          .with(Requirement::Category)
          .with(Requirement::BodyType),
      ),
    }
  }
}

/// What a surface renders: merged items plus the raw specs by handle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceSnapshot {
  pub revision: u64,
  pub items: Vec<Item>,
  pub specs: HashMap<String, Attributes>,
}

pub struct SurfaceSession<S: SpecSource + StatusSource + ?Sized + 'static> {
  kind: SurfaceKind,
  events: EventHandler,
  enricher: Enricher<S>,
  statuses: StatusLayer<S>,
  /// Base items as handed in, never modified
  items: Vec<Item>,
  /// Cached statuses by item id, shown instead of the baked-in status
  overlay: HashMap<String, StatusEntry>,
  status_generation: u64,
  status_task: Option<JoinHandle<()>>,
  snapshot: watch::Sender<SurfaceSnapshot>,
  revision: u64,
  disposed: bool,
}

impl<S: SpecSource + StatusSource + ?Sized + 'static> SurfaceSession<S> {
  pub fn new(
    kind: SurfaceKind,
    source: Arc<S>,
    cache: StatusCache,
    scheduler: Scheduler,
    settings: &EnrichmentConfig,
  ) -> Self {
    let events = EventHandler::new();
    let enricher = Enricher::new(
      kind.label(),
      Arc::clone(&source),
      scheduler,
      kind.enrich_config(settings),
      events.sender(),
    );
    let (snapshot, _) = watch::channel(SurfaceSnapshot::default());

    Self {
      kind,
      events,
      enricher,
      statuses: StatusLayer::new(cache, source),
      items: Vec::new(),
      overlay: HashMap::new(),
      status_generation: 0,
      status_task: None,
      snapshot,
      revision: 0,
      disposed: false,
    }
  }

  pub fn kind(&self) -> SurfaceKind {
    self.kind
  }

  pub fn enricher(&self) -> &Enricher<S> {
    &self.enricher
  }

  /// Base items currently shown.
  pub fn items(&self) -> &[Item] {
    &self.items
  }

  pub fn subscribe(&self) -> watch::Receiver<SurfaceSnapshot> {
    self.snapshot.subscribe()
  }

  /// Latest published snapshot.
  pub fn snapshot(&self) -> SurfaceSnapshot {
    self.snapshot.borrow().clone()
  }

  /// No status lookup or spec fetch outstanding.
  pub fn is_settled(&self) -> bool {
    self.status_task.is_none() && self.enricher.outstanding() == 0
  }

  /// Replace the visible items.
  ///
  /// Publishes right away with whatever is known, then resolves statuses and
  /// schedules spec fetches in the background.
  pub fn set_items(&mut self, items: Vec<Item>) {
    if self.disposed {
      return;
    }
    self.items = items;
    self.refresh_statuses();
    self.enricher.evaluate(&self.items);
    self.publish();
  }

  fn refresh_statuses(&mut self) {
    self.status_generation += 1;
    if let Some(task) = self.status_task.take() {
      task.abort();
    }

    let ids: Vec<String> = self
      .items
      .iter()
      .filter(|item| !item.id.trim().is_empty())
      .map(|item| item.id.clone())
      .collect();
    if ids.is_empty() {
      return;
    }

    let Ok(runtime) = Handle::try_current() else {
      warn!(surface = self.kind.label(), "no runtime; statuses not refreshed");
      return;
    };

    let layer = self.statuses.clone();
    let events = self.events.sender();
    let generation = self.status_generation;
    self.status_task = Some(runtime.spawn(async move {
      let result = layer.resolve(&ids).await;
      if result.source == CacheSource::Unavailable {
        debug!(generation, "keeping baked-in statuses");
      }
      let _ = events.send(Event::StatusesResolved {
        generation,
        statuses: result.data,
      });
    }));
  }

  /// Apply one background result. Returns whether a new snapshot went out.
  pub fn handle_event(&mut self, event: Event) -> bool {
    if self.disposed {
      return false;
    }

    match event {
      Event::SpecsFetched { request, outcome } => {
        if !self.enricher.handle_specs(request, outcome) {
          return false;
        }
        // The store changed; released handles may be claimable again
        self.enricher.evaluate(&self.items);
      }
      Event::StatusesResolved {
        generation,
        statuses,
      } => {
        if generation != self.status_generation {
          debug!(
            surface = self.kind.label(),
            generation,
            current = self.status_generation,
            "dropping superseded statuses"
          );
          return false;
        }
        self.status_task = None;
        if statuses.is_empty() {
          return false;
        }
        self.overlay.extend(statuses);
      }
    }

    self.publish();
    true
  }

  /// Wait for and apply the next background result.
  pub async fn step(&mut self) -> bool {
    if self.disposed {
      return false;
    }
    match self.events.next().await {
      Some(event) => self.handle_event(event),
      None => false,
    }
  }

  /// Process results until nothing is outstanding or `limit` passes.
  /// Returns whether the session settled.
  pub async fn run_until_settled(&mut self, limit: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while !self.disposed && !self.is_settled() {
      match tokio::time::timeout_at(deadline, self.events.next()).await {
        Ok(Some(event)) => {
          self.handle_event(event);
        }
        Ok(None) | Err(_) => break,
      }
    }
    self.is_settled()
  }

  /// Follow a changing item list until its sender goes away.
  pub async fn run(&mut self, mut items: watch::Receiver<Vec<Item>>) {
    let initial = items.borrow_and_update().clone();
    self.set_items(initial);

    while !self.disposed {
      tokio::select! {
        changed = items.changed() => {
          if changed.is_err() {
            break;
          }
          let next = items.borrow_and_update().clone();
          self.set_items(next);
        }
        Some(event) = self.events.next() => {
          self.handle_event(event);
        }
      }
    }
    info!(surface = self.kind.label(), revision = self.revision, "surface stopped");
  }

  fn publish(&mut self) {
    self.revision += 1;
    let items = self.items.iter().map(|item| self.display_item(item)).collect();
    self.snapshot.send_replace(SurfaceSnapshot {
      revision: self.revision,
      items,
      specs: self.enricher.specs().clone(),
    });
  }

  fn display_item(&self, item: &Item) -> Item {
    let mut merged = self.enricher.merged(item);
    if let Some(entry) = self.overlay.get(&item.id) {
      merged.status = Some(entry.status.clone());
    }
    merged
  }

  /// Cancel everything in flight. The last snapshot stays readable.
  pub fn dispose(&mut self) {
    if self.disposed {
      return;
    }
    self.enricher.dispose();
    if let Some(task) = self.status_task.take() {
      task.abort();
    }
    self.disposed = true;
  }
}

impl<S: SpecSource + StatusSource + ?Sized + 'static> Drop for SurfaceSession<S> {
  fn drop(&mut self) {
    self.dispose();
  }
}
