//! PlanWeaver - multi-phase plan-synthesis workflow coordinator
//!
//! PlanWeaver coordinates a fixed but conditionally-filtered sequence
//! of calls to external text-generation capability endpoints. The
//! external caller executes each capability and echoes prior outputs
//! back; because that relay may be lossy, a disk-backed accumulator
//! keeps the longest observed copy of every step's output and the
//! final artifact is assembled from the accumulator, not the relay.
//!
//! # Core Concepts
//!
//! - **Frozen Workflow**: the step set is computed once at `start` from
//!   conditional predicates and must not change mid-run
//! - **Distilled Context**: every step re-derives bounded context from
//!   the raw prior map instead of trusting caller condensation
//! - **Fidelity Accumulator**: longest-write-wins cache per task slug,
//!   the content source of truth at completion
//! - **Incremental Artifact**: one markdown plan document per run,
//!   rewritten after every call so progress can be tailed
//!
//! # Modules
//!
//! - [`distill`] - summary extraction and smart truncation
//! - [`workflow`] - step registry and parameter building
//! - [`coordinator`] - the step-coordinator state machine
//! - [`artifact`] - incremental plan persistence
//! - [`verify`] - plan parsing and checkpoint verification
//! - [`config`] - configuration types and loading

pub mod artifact;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod distill;
pub mod prompts;
pub mod verify;
pub mod workflow;

// Re-export commonly used types
pub use config::{BudgetConfig, CapabilityConfig, Config, StorageConfig};
pub use coordinator::{Coordinator, CoordinatorCall, CoordinatorResponse, Mode, NextAction};
pub use distill::{ContextBudget, DistilledContext, extract_summary, truncate_smart};
pub use verify::{Checkpoint, CheckpointKind, ParsedPlan, PlanParser, PlanStep, VerifyOptions};
pub use workflow::{WorkflowOverrides, WorkflowStep, compute_workflow};
