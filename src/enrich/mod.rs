//! Backfilling missing listing attributes from the spec endpoint.

mod orchestrator;
mod predicate;
mod request;
mod tracker;

pub use orchestrator::{EnrichConfig, Enricher};
pub use predicate::{CompletenessPredicate, Requirement};
pub use request::SpecRequest;
pub use tracker::RequestTracker;
