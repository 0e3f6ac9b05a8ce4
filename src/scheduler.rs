//! Deferred execution: run work only once the page has loaded and the host is idle.
//!
//! Hosts differ in what they can signal. A host with an idle signal plugs in an
//! [`IdleHost`]; a host without one gets a plain fallback delay. The choice is
//! made once, when the [`Scheduler`] is built.
//!
//! # Example
//!
//! ```ignore
//! let load = PageLoad::new();
//! let scheduler = Scheduler::new(load.clone(), Some(Arc::new(RuntimeIdle)));
//!
//! let handle = scheduler.schedule_after_load_then_idle(
//!     || async { fetch_specs().await },
//!     IdleOptions::default(),
//! );
//!
//! load.mark_loaded(); // fetch may now run
//! handle.cancel();    // or not, if this wins first
//! ```

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::warn;

/// One-shot "page finished loading" signal.
#[derive(Clone)]
pub struct PageLoad {
  tx: Arc<watch::Sender<bool>>,
}

impl PageLoad {
  /// A page that is still loading.
  pub fn new() -> Self {
    let (tx, _rx) = watch::channel(false);
    Self { tx: Arc::new(tx) }
  }

  /// A page that has already loaded.
  pub fn loaded() -> Self {
    let load = Self::new();
    load.mark_loaded();
    load
  }

  pub fn mark_loaded(&self) {
    self.tx.send_replace(true);
  }

  pub fn is_loaded(&self) -> bool {
    *self.tx.borrow()
  }

  /// Resolve once the load signal has fired.
  pub async fn wait(&self) {
    let mut rx = self.tx.subscribe();
    // The sender lives in `self`, so this can only end by observing `true`
    let _ = rx.wait_for(|loaded| *loaded).await;
  }
}

impl Default for PageLoad {
  fn default() -> Self {
    Self::new()
  }
}

/// Host capability for "run when there is spare capacity".
pub trait IdleHost: Send + Sync {
  fn supports_idle(&self) -> bool {
    true
  }

  /// Resolves when the host reports idle capacity.
  fn idle(&self) -> BoxFuture<'static, ()>;
}

/// Idle signal for a tokio host: yield until queued tasks have had a turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeIdle;

impl IdleHost for RuntimeIdle {
  fn idle(&self) -> BoxFuture<'static, ()> {
    async {
      for _ in 0..4 {
        tokio::task::yield_now().await;
      }
    }
    .boxed()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleOptions {
  /// Longest wait for idle before running anyway
  pub timeout: Duration,
  /// Plain delay used when the host has no idle signal
  pub fallback_delay: Duration,
}

impl Default for IdleOptions {
  fn default() -> Self {
    Self {
      timeout: Duration::from_millis(2_000),
      fallback_delay: Duration::from_millis(200),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
  Pending,
  Fired,
  Cancelled,
}

/// Cancels a scheduled callback. Every method is safe to call at any time, any
/// number of times.
#[derive(Clone)]
pub struct CancelHandle {
  phase: Arc<Mutex<Phase>>,
  task: Option<AbortHandle>,
}

impl CancelHandle {
  fn inert() -> Self {
    Self {
      phase: Arc::new(Mutex::new(Phase::Cancelled)),
      task: None,
    }
  }

  fn phase(&self) -> Phase {
    *self.phase.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Prevent the callback from starting. No-op once it has fired.
  pub fn cancel(&self) {
    let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
    if *phase == Phase::Pending {
      *phase = Phase::Cancelled;
      if let Some(task) = &self.task {
        task.abort();
      }
    }
  }

  /// Cancel, and also stop a callback that already started. Used on teardown.
  pub fn abort(&self) {
    self.cancel();
    if let Some(task) = &self.task {
      task.abort();
    }
  }

  pub fn is_fired(&self) -> bool {
    self.phase() == Phase::Fired
  }

  pub fn is_cancelled(&self) -> bool {
    self.phase() == Phase::Cancelled
  }
}

impl std::fmt::Debug for CancelHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CancelHandle")
      .field("phase", &self.phase())
      .finish_non_exhaustive()
  }
}

/// Pending → Fired, unless a cancel got there first.
fn try_fire(phase: &Mutex<Phase>) -> bool {
  let mut phase = phase.lock().unwrap_or_else(|e| e.into_inner());
  if *phase == Phase::Pending {
    *phase = Phase::Fired;
    true
  } else {
    false
  }
}

#[derive(Clone)]
pub struct Scheduler {
  load: PageLoad,
  idle: Option<Arc<dyn IdleHost>>,
}

impl Scheduler {
  pub fn new(load: PageLoad, idle: Option<Arc<dyn IdleHost>>) -> Self {
    let idle = idle.filter(|host| host.supports_idle());
    Self { load, idle }
  }

  /// Scheduler for a host without an idle signal.
  pub fn without_idle(load: PageLoad) -> Self {
    Self::new(load, None)
  }

  pub fn supports_idle(&self) -> bool {
    self.idle.is_some()
  }

  pub fn page_load(&self) -> &PageLoad {
    &self.load
  }

  /// Run `callback` at the next idle moment, or after `options.timeout`.
  /// Without idle support, run it after `options.fallback_delay`.
  pub fn schedule_idle<F, Fut>(&self, callback: F, options: IdleOptions) -> CancelHandle
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
  {
    self.spawn(false, callback, options)
  }

  /// Like [`schedule_idle`](Self::schedule_idle), but idle scheduling only
  /// begins after the load signal. Cancelling before load means idle
  /// scheduling never starts.
  pub fn schedule_after_load_then_idle<F, Fut>(
    &self,
    callback: F,
    options: IdleOptions,
  ) -> CancelHandle
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
  {
    let wait_for_load = !self.load.is_loaded();
    self.spawn(wait_for_load, callback, options)
  }

  fn spawn<F, Fut>(&self, wait_for_load: bool, callback: F, options: IdleOptions) -> CancelHandle
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
  {
    let Ok(runtime) = Handle::try_current() else {
      warn!("no async runtime; scheduled callback dropped");
      return CancelHandle::inert();
    };

    let phase = Arc::new(Mutex::new(Phase::Pending));
    let load = self.load.clone();
    let idle = self.idle.clone();
    let task_phase = Arc::clone(&phase);

    let task = runtime.spawn(async move {
      if wait_for_load {
        load.wait().await;
      }

      match idle {
        Some(host) => {
          tokio::select! {
            _ = host.idle() => {}
            _ = tokio::time::sleep(options.timeout) => {}
          }
        }
        None => tokio::time::sleep(options.fallback_delay).await,
      }

      if try_fire(&task_phase) {
        callback().await;
      }
    });

    CancelHandle {
      phase,
      task: Some(task.abort_handle()),
    }
  }
}

impl std::fmt::Debug for Scheduler {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Scheduler")
      .field("loaded", &self.load.is_loaded())
      .field("supports_idle", &self.supports_idle())
      .finish()
  }
}
