//! StepStore - persistent step-output accumulator
//!
//! Keeps the highest-fidelity (longest) observed copy of each workflow
//! step's output across a run. Callers that relay step outputs may
//! condense them before echoing them back; the store defends against
//! that by never letting a shorter write replace a longer cached value.
//!
//! # Architecture
//!
//! ```text
//! .stepstore/
//! ├── add-dark-mode-toggle.json    # step_id -> output map
//! ├── migrate-billing-service.json
//! └── ...
//! ```
//!
//! One JSON file per task slug. A missing or malformed file reads as an
//! empty map, never an error.
//!
//! # Example
//!
//! ```ignore
//! use stepstore::{FileStore, StepStore};
//!
//! let store = FileStore::open(".stepstore")?;
//! store.record("Add dark mode toggle", "analyze-requirements", &output)?;
//! let outputs = store.load("Add dark mode toggle")?;
//! store.delete("Add dark mode toggle")?;
//! ```

pub mod cli;
pub mod config;
mod store;

pub use store::{FileStore, MemoryStore, StepStore, StoreError, task_slug};

/// Maximum length of a task slug
pub const MAX_SLUG_LEN: usize = 50;
