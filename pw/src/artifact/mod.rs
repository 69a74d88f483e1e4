//! Plan artifact persistence
//!
//! One human-readable markdown document per run at a stable path, so an
//! external viewer can tail progress while the workflow runs.

mod persister;

pub use persister::PlanPersister;
