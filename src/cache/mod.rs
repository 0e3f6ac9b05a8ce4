//! Status caching for listing surfaces.
//!
//! This module provides:
//! - A process-wide id → status cache with one global TTL
//! - A cache-first resolution layer that refills from the status endpoint
//! - Source metadata so callers can tell cached answers from fresh ones

mod layer;
mod status;
mod traits;

pub use layer::StatusLayer;
pub use status::{StatusCache, CACHE_DURATION_SECS};
pub use traits::{CacheResult, CacheSource};
