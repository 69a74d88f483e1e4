//! Step Coordinator
//!
//! The state machine at the center of the workflow: each caller
//! invocation maps (task, mode, step index, prior map, flags) to either
//! the next capability action or the completed result.

mod core;
mod messages;

pub use core::Coordinator;
pub use messages::{CoordinatorCall, CoordinatorResponse, Mode, NextAction};
