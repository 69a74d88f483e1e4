//! Plan execution support
//!
//! Parses a finished plan document into discrete steps and emits
//! verification instructions at fixed progress checkpoints. Stateless:
//! the caller supplies the set of completed step indices on every call.

mod checkpoint;
mod parser;

pub use checkpoint::{Checkpoint, CheckpointKind, VerificationInstruction, VerifyOptions, checkpoints, due_instructions};
pub use parser::{ParsedPlan, PlanParser, PlanStep};
