//! Incremental enrichment for vehicle catalog listings.
//!
//! Surfaces hand in partially loaded items; the pipeline backfills missing
//! attributes from the spec endpoint once the page is idle, overlays cached
//! statuses, and derives the labels cards display.

pub mod cache;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod display;
pub mod enrich;
pub mod event;
pub mod merge;
pub mod scheduler;
pub mod surface;
