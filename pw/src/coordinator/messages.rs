//! Coordinator call and response types

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::workflow::WorkflowOverrides;

/// Coordinator invocation mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// First call of a run: freeze the workflow, return step 1
    #[default]
    Start,
    /// Subsequent call reporting a finished step
    Continue,
}

/// One caller invocation of the coordinator
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CoordinatorCall {
    /// The task being planned
    pub task: String,
    /// Free-text context
    pub context: String,
    /// Optional code or reference blob
    pub code_context: Option<String>,
    /// Free-text clarifying answers
    pub answers: String,
    /// Invocation mode
    pub mode: Mode,
    /// Requested step index (1-based; ignored for `start`)
    pub step: usize,
    /// Prior step outputs as relayed by the caller (possibly truncated)
    pub prior: HashMap<String, String>,
    /// Per-call conditional-step overrides; must be held constant for a run
    pub overrides: WorkflowOverrides,
}

/// The capability invocation the caller should perform next
#[derive(Debug, Clone, Serialize)]
pub struct NextAction {
    /// Capability endpoint name
    pub capability: String,
    /// Built free-text parameters
    pub parameters: String,
    /// Maximum output size the capability should produce
    pub max_output_budget: usize,
    /// Why this step runs
    pub description: String,
}

/// Coordinator response for one call
#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorResponse {
    /// Phase label of the current step (or "complete")
    pub phase: String,
    /// Current step index, 1-based
    pub step: usize,
    /// Frozen workflow length
    pub total_steps: usize,
    /// Human-readable progress, e.g. "3/7"
    pub progress: String,
    /// Next capability action, absent when complete or on error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_action: Option<NextAction>,
    /// Whether the run is finished
    pub is_complete: bool,
    /// Assembled result, present only on completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Plan artifact location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<PathBuf>,
    /// Explicit caller-protocol error (e.g. step not found)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CoordinatorResponse {
    /// Explicit "step not found" response; never a panic or an Err
    pub fn not_found(step: usize, total_steps: usize) -> Self {
        Self {
            phase: "unknown".to_string(),
            step,
            total_steps,
            progress: String::new(),
            next_action: None,
            is_complete: false,
            result: None,
            artifact_path: None,
            error: Some(format!("step {} not found", step)),
        }
    }
}
