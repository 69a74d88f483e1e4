//! Workflow step model
//!
//! The ordered, conditionally-filtered step sequence the coordinator
//! walks through, and the parameter building that turns a step plus
//! distilled prior context into capability parameters.

mod params;
mod registry;

pub use params::{StepPromptContext, build_step_parameters};
pub use registry::{
    ReviewFlag, StepCondition, WorkflowOverrides, WorkflowStep, capability_names, compute_workflow, phase_names,
};
