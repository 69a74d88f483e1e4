//! Coordinator state machine
//!
//! Pure call-and-response: every input the state machine needs is
//! either in the call (step index, prior map, flags) or in the disk
//! accumulator. The only in-process state is the artifact path table,
//! and losing it merely starts a new artifact file.

use std::collections::HashMap;

use eyre::{Context, Result};
use regex::Regex;
use tracing::{debug, info, warn};

use stepstore::{FileStore, StepStore};

use super::messages::{CoordinatorCall, CoordinatorResponse, Mode, NextAction};
use crate::artifact::PlanPersister;
use crate::config::Config;
use crate::distill::ContextBudget;
use crate::prompts::PromptLoader;
use crate::workflow::{WorkflowStep, build_step_parameters, compute_workflow};

/// The step coordinator
pub struct Coordinator {
    config: Config,
    store: Box<dyn StepStore>,
    persister: PlanPersister,
    loader: PromptLoader,
    score_re: Regex,
}

impl Coordinator {
    /// Create a coordinator over an explicit store (tests use MemoryStore)
    pub fn new(config: Config, store: Box<dyn StepStore>) -> Result<Self> {
        let persister = PlanPersister::new(&config.storage.plan_dir);
        let loader = match &config.storage.template_dir {
            Some(dir) => PromptLoader::new(dir),
            None => PromptLoader::embedded_only(),
        };
        let score_re = Regex::new(r"(?m)^\s*([A-Za-z][A-Za-z ]{2,30}?)\s*:\s*(\d+(?:\.\d+)?)\s*/\s*10\b")
            .context("score pattern")?;

        Ok(Self {
            config,
            store,
            persister,
            loader,
            score_re,
        })
    }

    /// Create a coordinator with the configured file-backed store
    pub fn from_config(config: Config) -> Result<Self> {
        let store = FileStore::open(&config.storage.cache_dir).context("Failed to open step store")?;
        Self::new(config, Box::new(store))
    }

    /// Handle one coordinator call
    ///
    /// Returns the next capability action, the completed result, or an
    /// explicit error response for an invalid step index. Store and
    /// artifact failures degrade to reduced progress tracking; they
    /// never abort the run.
    pub fn handle(&mut self, call: &CoordinatorCall) -> Result<CoordinatorResponse> {
        let workflow = compute_workflow(&call.task, &call.context, &call.overrides);
        let total = workflow.len();

        let step = match call.mode {
            Mode::Start => 1,
            Mode::Continue => call.step,
        };

        if step == 0 {
            debug!(task = %call.task, "Rejecting step 0");
            return Ok(CoordinatorResponse::not_found(0, total));
        }

        // Record the step that just finished: workflow[step - 2], the
        // one immediately prior to the new current step.
        if call.mode == Mode::Continue && step >= 2 {
            let completed = &workflow[(step - 2).min(total - 1)];
            if let Some(output) = call.prior.get(completed.id) {
                match self.store.record(&call.task, completed.id, output) {
                    Ok(kept) => debug!(step_id = completed.id, kept, "Accumulated step output"),
                    Err(e) => warn!(step_id = completed.id, error = %e, "Accumulator write failed, continuing"),
                }
            }
        }

        let cache = self.store.load(&call.task).unwrap_or_else(|e| {
            warn!(task = %call.task, error = %e, "Accumulator read failed, treating as empty");
            HashMap::new()
        });

        if step > total {
            return self.complete(call, &workflow, cache);
        }

        // Per key, the longer of cached and caller-relayed output: the
        // caller's condensation granularity is outside our control.
        let mut merged = cache;
        for (key, value) in &call.prior {
            let entry = merged.entry(key.clone()).or_default();
            if value.len() > entry.len() {
                *entry = value.clone();
            }
        }

        self.advance(call, &workflow, &merged, step)
    }

    /// Return step `step`'s capability action
    fn advance(
        &mut self,
        call: &CoordinatorCall,
        workflow: &[WorkflowStep],
        merged: &HashMap<String, String>,
        step: usize,
    ) -> Result<CoordinatorResponse> {
        let total = workflow.len();
        let current = &workflow[step - 1];

        let tier = if current.synthesis {
            ContextBudget::Synthesis
        } else {
            ContextBudget::Intermediate
        };
        let budget_chars = self.config.budgets.chars_for(tier);

        // Prior outputs for steps before this one, in workflow order
        let ordered: Vec<(String, String)> = workflow[..step - 1]
            .iter()
            .map(|s| (s.id.to_string(), merged.get(s.id).cloned().unwrap_or_default()))
            .collect();

        let parameters = build_step_parameters(
            current,
            &call.task,
            &call.context,
            call.code_context.as_deref().unwrap_or(""),
            &call.answers,
            &ordered,
            budget_chars,
            &self.loader,
        )?;

        let artifact_path = self.persister.write_progress(&call.task, workflow, merged, step - 1);

        info!(task = %call.task, step, total, capability = current.capability, "Advancing workflow");

        Ok(CoordinatorResponse {
            phase: current.phase.to_string(),
            step,
            total_steps: total,
            progress: format!("{}/{}", step, total),
            next_action: Some(NextAction {
                capability: current.capability.to_string(),
                parameters,
                max_output_budget: self.config.capabilities.budget_for(current.capability),
                description: current.rationale.to_string(),
            }),
            is_complete: false,
            result: None,
            artifact_path: Some(artifact_path),
            error: None,
        })
    }

    /// Terminal transition: assemble the result from the cache and clean up
    fn complete(
        &mut self,
        call: &CoordinatorCall,
        workflow: &[WorkflowStep],
        cache: HashMap<String, String>,
    ) -> Result<CoordinatorResponse> {
        let total = workflow.len();

        let result = synthesized_result(&call.task, workflow, &cache);
        let scores = self.extract_scores(workflow, &cache);

        let artifact_path = self
            .persister
            .write_final(&call.task, workflow, &cache, &result, &scores);

        if let Err(e) = self.store.delete(&call.task) {
            warn!(task = %call.task, error = %e, "Failed to delete accumulator cache");
        }

        info!(task = %call.task, total, scores = scores.len(), "Workflow complete");

        Ok(CoordinatorResponse {
            phase: "complete".to_string(),
            step: total,
            total_steps: total,
            progress: format!("{}/{}", total, total),
            next_action: None,
            is_complete: true,
            result: Some(result),
            artifact_path: Some(artifact_path),
            error: None,
        })
    }

    /// Extract quality scores from the concatenated cache values
    ///
    /// Later occurrences win, so a score restated after revision
    /// replaces the original.
    fn extract_scores(&self, workflow: &[WorkflowStep], cache: &HashMap<String, String>) -> Vec<(String, f64)> {
        let mut concatenated = String::new();
        for step in workflow {
            if let Some(output) = cache.get(step.id) {
                concatenated.push_str(output);
                concatenated.push('\n');
            }
        }

        let mut scores: Vec<(String, f64)> = Vec::new();
        for caps in self.score_re.captures_iter(&concatenated) {
            let name = caps[1].trim().to_string();
            let Ok(value) = caps[2].parse::<f64>() else {
                continue;
            };
            if let Some(existing) = scores.iter_mut().find(|(n, _)| *n == name) {
                existing.1 = value;
            } else {
                scores.push((name, value));
            }
        }
        scores
    }
}

/// The run's result, derived from accumulated cache contents
///
/// Prefers the last synthesis step's recorded output; always non-empty
/// even when the cache is.
fn synthesized_result(task: &str, workflow: &[WorkflowStep], cache: &HashMap<String, String>) -> String {
    for step in workflow.iter().rev().filter(|s| s.synthesis) {
        if let Some(output) = cache.get(step.id)
            && !output.is_empty()
        {
            return output.clone();
        }
    }

    // No synthesis output recorded: fall back to whatever the cache holds
    let mut result = format!("# Plan: {}\n\n", task);
    let mut any = false;
    for step in workflow {
        if let Some(output) = cache.get(step.id)
            && !output.is_empty()
        {
            result.push_str(&format!("## {}\n\n{}\n\n", step.title, output));
            any = true;
        }
    }
    if !any {
        result.push_str("No step outputs were recorded for this run.\n");
    }
    result.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::WorkflowOverrides;
    use stepstore::MemoryStore;
    use tempfile::TempDir;

    fn coordinator(dir: &TempDir) -> Coordinator {
        let mut config = Config::default();
        config.storage.plan_dir = dir.path().join("plans");
        config.storage.cache_dir = dir.path().join("cache");
        Coordinator::new(config, Box::new(MemoryStore::new())).unwrap()
    }

    fn start_call(task: &str) -> CoordinatorCall {
        CoordinatorCall {
            task: task.to_string(),
            mode: Mode::Start,
            ..Default::default()
        }
    }

    fn continue_call(task: &str, step: usize, prior: &[(&str, &str)]) -> CoordinatorCall {
        CoordinatorCall {
            task: task.to_string(),
            mode: Mode::Continue,
            step,
            prior: prior.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_start_returns_first_step() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir);

        let response = coordinator.handle(&start_call("Add dark mode toggle")).unwrap();
        assert_eq!(response.step, 1);
        assert_eq!(response.total_steps, 7);
        assert_eq!(response.progress, "1/7");
        assert_eq!(response.phase, "Discovery");
        assert!(!response.is_complete);

        let action = response.next_action.unwrap();
        assert_eq!(action.capability, "reasoner");
        assert!(action.parameters.contains("Add dark mode toggle"));
        assert!(action.max_output_budget > 0);
    }

    #[test]
    fn test_continue_accumulates_and_advances() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir);

        coordinator.handle(&start_call("task")).unwrap();
        let response = coordinator
            .handle(&continue_call("task", 2, &[("analyze-requirements", "step one output")]))
            .unwrap();

        assert_eq!(response.step, 2);
        assert_eq!(response.progress, "2/7");
        // First write landed verbatim
        let cache = coordinator.store.load("task").unwrap();
        assert_eq!(cache["analyze-requirements"], "step one output");
    }

    #[test]
    fn test_lossy_relay_does_not_shrink_cache() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir);

        let full = "a detailed analysis with many observations and constraints spelled out";
        coordinator
            .handle(&continue_call("task", 2, &[("analyze-requirements", full)]))
            .unwrap();

        // Caller relays a condensed copy on a retry of the same step
        coordinator
            .handle(&continue_call("task", 2, &[("analyze-requirements", "condensed")]))
            .unwrap();

        let cache = coordinator.store.load("task").unwrap();
        assert_eq!(cache["analyze-requirements"], full);
    }

    #[test]
    fn test_parameters_prefer_longer_cached_output() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir);

        let full = format!(
            "analysis\n=== SUMMARY ===\n{}\n=== END SUMMARY ===",
            "The feature needs a persisted preference and a theme context to work."
        );
        coordinator
            .handle(&continue_call("task", 2, &[("analyze-requirements", &full)]))
            .unwrap();

        // Next call relays only a stub, but the builder sees the cache
        let response = coordinator
            .handle(&continue_call("task", 3, &[("explore-approaches", "x"), ("analyze-requirements", "stub")]))
            .unwrap();
        let params = response.next_action.unwrap().parameters;
        assert!(params.contains("persisted preference"));
        assert!(!params.contains("stub"));
    }

    #[test]
    fn test_determinism_of_parameters() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir);

        let call = continue_call("task", 3, &[("analyze-requirements", "one"), ("explore-approaches", "two")]);
        let a = coordinator.handle(&call).unwrap().next_action.unwrap().parameters;
        let b = coordinator.handle(&call).unwrap().next_action.unwrap().parameters;
        assert_eq!(a, b);
    }

    #[test]
    fn test_completion_assembles_from_cache() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir);

        for (idx, id) in [
            "analyze-requirements",
            "explore-approaches",
            "draft-architecture",
            "identify-risks",
            "synthesize-plan",
            "critique-plan",
        ]
        .iter()
        .enumerate()
        {
            coordinator
                .handle(&continue_call("task", idx + 2, &[(id, &format!("{} output", id))]))
                .unwrap();
        }

        let response = coordinator
            .handle(&continue_call("task", 8, &[("finalize-plan", "## Step 1: the final plan")]))
            .unwrap();

        assert!(response.is_complete);
        assert_eq!(response.progress, "7/7");
        assert_eq!(response.result.as_deref(), Some("## Step 1: the final plan"));
        assert!(response.artifact_path.is_some());

        // Cache cleared on completion
        assert!(coordinator.store.load("task").unwrap().is_empty());
    }

    #[test]
    fn test_completion_total_even_with_empty_prior() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir);

        let response = coordinator.handle(&continue_call("task", 8, &[])).unwrap();
        assert!(response.is_complete);
        let result = response.result.unwrap();
        assert!(!result.is_empty());
        assert!(result.contains("No step outputs were recorded"));
    }

    #[test]
    fn test_scores_extracted_on_completion() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir);

        let critique = "weak ordering in step 3\n\nCompleteness: 8/10\nCorrectness: 7.5/10\nClarity: 9/10\n";
        coordinator
            .handle(&continue_call("task", 7, &[("critique-plan", critique)]))
            .unwrap();
        let response = coordinator.handle(&continue_call("task", 8, &[])).unwrap();

        let artifact = std::fs::read_to_string(response.artifact_path.unwrap()).unwrap();
        assert!(artifact.contains("- Completeness: 8/10"));
        assert!(artifact.contains("- Correctness: 7.5/10"));
    }

    #[test]
    fn test_step_zero_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir);

        let response = coordinator.handle(&continue_call("task", 0, &[])).unwrap();
        assert!(response.error.is_some());
        assert!(!response.is_complete);
        assert!(response.next_action.is_none());
    }

    #[test]
    fn test_overrides_extend_workflow() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir);

        let mut call = start_call("task");
        call.overrides = WorkflowOverrides {
            security_review: Some(true),
            ..Default::default()
        };
        let response = coordinator.handle(&call).unwrap();
        assert_eq!(response.total_steps, 8);
    }

    #[test]
    fn test_artifact_written_incrementally() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir);

        let a = coordinator.handle(&start_call("task")).unwrap().artifact_path.unwrap();
        let b = coordinator
            .handle(&continue_call("task", 2, &[("analyze-requirements", "out")]))
            .unwrap()
            .artifact_path
            .unwrap();
        assert_eq!(a, b);

        let doc = std::fs::read_to_string(&b).unwrap();
        assert!(doc.contains("- Status: in-progress"));
        assert!(doc.contains("out"));
    }

    #[test]
    fn test_synthesized_result_fallback_order() {
        let workflow = compute_workflow("t", "", &WorkflowOverrides::default());

        let mut cache = HashMap::new();
        cache.insert("synthesize-plan".to_string(), "draft plan".to_string());
        assert_eq!(synthesized_result("t", &workflow, &cache), "draft plan");

        cache.insert("finalize-plan".to_string(), "final plan".to_string());
        assert_eq!(synthesized_result("t", &workflow, &cache), "final plan");
    }
}
