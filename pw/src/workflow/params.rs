//! Step parameter building
//!
//! Turns a workflow step plus raw prior outputs into the free-text
//! parameters for its capability endpoint. Distillation happens here,
//! per step, from the raw prior map: whatever condensation the caller
//! already applied is outside our control, so we never rely on it.

use eyre::Result;
use serde::Serialize;

use super::registry::WorkflowStep;
use crate::distill::DistilledContext;
use crate::prompts::PromptLoader;

/// Template context for a step's parameter build
#[derive(Debug, Clone, Serialize)]
pub struct StepPromptContext {
    /// The task text
    pub task: String,
    /// Free-text caller context
    pub context: String,
    /// Optional code/reference blob
    pub code_context: String,
    /// Clarifying answers from the caller
    pub answers: String,
    /// Why this step exists
    pub rationale: String,
    /// Distilled per-step summaries of prior outputs
    pub prior_summary: String,
    /// Constraints and working-memory sections from prior outputs
    pub working_memory: String,
}

/// Build a step's capability parameters
///
/// Deterministic: identical inputs yield identical parameters, so
/// coordinator calls are safely retryable. `prior` carries the merged
/// (step_id, output) pairs for steps before this one, in workflow
/// order; `budget_chars` is the step's context budget tier in chars.
pub fn build_step_parameters(
    step: &WorkflowStep,
    task: &str,
    context: &str,
    code_context: &str,
    answers: &str,
    prior: &[(String, String)],
    budget_chars: usize,
    loader: &PromptLoader,
) -> Result<String> {
    let distilled = DistilledContext::from_prior(task, prior, budget_chars);

    let prompt_ctx = StepPromptContext {
        task: task.to_string(),
        context: context.to_string(),
        code_context: code_context.to_string(),
        answers: answers.to_string(),
        rationale: step.rationale.to_string(),
        prior_summary: distilled.render_summaries(),
        working_memory: distilled.render_working_memory(),
    };

    loader.render(step.template, &prompt_ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{WorkflowOverrides, compute_workflow};

    fn prior_fixture() -> Vec<(String, String)> {
        vec![(
            "analyze-requirements".to_string(),
            "deep analysis...\nCONSTRAINT: no new dependencies\n=== SUMMARY ===\nThe toggle needs a persisted preference, a theme context, and a default that follows the system setting.\n=== END SUMMARY ===".to_string(),
        )]
    }

    #[test]
    fn test_parameters_contain_task_text() {
        let workflow = compute_workflow("Add dark mode toggle", "", &WorkflowOverrides::default());
        let loader = PromptLoader::embedded_only();

        let params =
            build_step_parameters(&workflow[0], "Add dark mode toggle", "", "", "", &[], 1500, &loader).unwrap();
        assert!(params.contains("Add dark mode toggle"));
    }

    #[test]
    fn test_parameters_carry_distilled_prior() {
        let workflow = compute_workflow("t", "", &WorkflowOverrides::default());
        let loader = PromptLoader::embedded_only();

        let params = build_step_parameters(&workflow[1], "t", "", "", "", &prior_fixture(), 1500, &loader).unwrap();
        // Summary block content, not the raw output
        assert!(params.contains("persisted preference"));
        assert!(!params.contains("deep analysis"));
        // Scraped constraint
        assert!(params.contains("no new dependencies"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let workflow = compute_workflow("t", "", &WorkflowOverrides::default());
        let loader = PromptLoader::embedded_only();
        let prior = prior_fixture();

        let a = build_step_parameters(&workflow[2], "t", "ctx", "code", "answers", &prior, 1500, &loader).unwrap();
        let b = build_step_parameters(&workflow[2], "t", "ctx", "code", "answers", &prior, 1500, &loader).unwrap();
        assert_eq!(a, b);
    }
}
