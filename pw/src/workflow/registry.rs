//! Workflow Registry - ordered step definitions with conditional inclusion
//!
//! The step set is computed once per run at `start` and must be treated
//! as frozen: the caller supplies the same task, context, and overrides
//! on every call, so recomputation is deterministic.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Optional review steps that can be forced in or out per call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewFlag {
    Security,
    Ux,
    Performance,
}

/// Per-call force-include/exclude for conditional steps
///
/// An explicit value threaded into workflow computation; `None` defers
/// to keyword detection over the task and context text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowOverrides {
    /// Force the security review step in or out
    pub security_review: Option<bool>,
    /// Force the UX review step in or out
    pub ux_review: Option<bool>,
    /// Force the performance review step in or out
    pub performance_review: Option<bool>,
}

impl WorkflowOverrides {
    fn for_flag(&self, flag: ReviewFlag) -> Option<bool> {
        match flag {
            ReviewFlag::Security => self.security_review,
            ReviewFlag::Ux => self.ux_review,
            ReviewFlag::Performance => self.performance_review,
        }
    }
}

/// Inclusion predicate for a conditional step
#[derive(Debug, Clone, Copy)]
pub struct StepCondition {
    /// Which override flag governs this step
    pub flag: ReviewFlag,
    /// Keywords that auto-include the step when found in task or context
    pub keywords: &'static [&'static str],
}

impl StepCondition {
    /// Evaluate over (task, context), override first, keywords second
    pub fn included(&self, task: &str, context: &str, overrides: &WorkflowOverrides) -> bool {
        if let Some(forced) = overrides.for_flag(self.flag) {
            return forced;
        }
        let haystack = format!("{} {}", task, context).to_lowercase();
        self.keywords.iter().any(|kw| haystack.contains(kw))
    }
}

/// One unit of work in the frozen step sequence
///
/// Maps to exactly one capability invocation by the external caller.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowStep {
    /// Stable identifier, used as the accumulator key
    pub id: &'static str,
    /// Human-readable title for artifacts and checklists
    pub title: &'static str,
    /// Phase label
    pub phase: &'static str,
    /// Capability endpoint name
    pub capability: &'static str,
    /// Handlebars template rendered by the parameter builder
    pub template: &'static str,
    /// Why this step exists
    pub rationale: &'static str,
    /// Synthesis steps get the larger context budget
    pub synthesis: bool,
    /// Inclusion predicate; unconditional when None
    pub condition: Option<StepCondition>,
}

const SECURITY_KEYWORDS: &[&str] = &["auth", "security", "crypto", "secret", "password", "permission"];
const UX_KEYWORDS: &[&str] = &["accessibility", "usability", "user experience", " ux ", "screen reader"];
const PERFORMANCE_KEYWORDS: &[&str] = &["performance", "latency", "throughput", "scalab", "hot path"];

/// All step definitions in workflow order
const ALL_STEPS: &[WorkflowStep] = &[
    WorkflowStep {
        id: "analyze-requirements",
        title: "Analyze Requirements",
        phase: "Discovery",
        capability: "reasoner",
        template: "analyze-requirements",
        rationale: "Pin down what the task actually demands before anything is designed",
        synthesis: false,
        condition: None,
    },
    WorkflowStep {
        id: "explore-approaches",
        title: "Explore Approaches",
        phase: "Discovery",
        capability: "reasoner",
        template: "explore-approaches",
        rationale: "Surface competing approaches and their trade-offs",
        synthesis: false,
        condition: None,
    },
    WorkflowStep {
        id: "draft-architecture",
        title: "Draft Architecture",
        phase: "Design",
        capability: "architect",
        template: "draft-architecture",
        rationale: "Commit to a structure the remaining steps can critique",
        synthesis: false,
        condition: None,
    },
    WorkflowStep {
        id: "identify-risks",
        title: "Identify Risks",
        phase: "Design",
        capability: "critic",
        template: "identify-risks",
        rationale: "Find the failure modes while they are still cheap to address",
        synthesis: false,
        condition: None,
    },
    WorkflowStep {
        id: "security-review",
        title: "Security Review",
        phase: "Review",
        capability: "critic",
        template: "security-review",
        rationale: "Tasks touching auth or secrets get a dedicated security pass",
        synthesis: false,
        condition: Some(StepCondition {
            flag: ReviewFlag::Security,
            keywords: SECURITY_KEYWORDS,
        }),
    },
    WorkflowStep {
        id: "ux-review",
        title: "UX Review",
        phase: "Review",
        capability: "critic",
        template: "ux-review",
        rationale: "User-facing tasks get a usability and accessibility pass",
        synthesis: false,
        condition: Some(StepCondition {
            flag: ReviewFlag::Ux,
            keywords: UX_KEYWORDS,
        }),
    },
    WorkflowStep {
        id: "performance-review",
        title: "Performance Review",
        phase: "Review",
        capability: "critic",
        template: "performance-review",
        rationale: "Performance-sensitive tasks get a dedicated budget pass",
        synthesis: false,
        condition: Some(StepCondition {
            flag: ReviewFlag::Performance,
            keywords: PERFORMANCE_KEYWORDS,
        }),
    },
    WorkflowStep {
        id: "synthesize-plan",
        title: "Synthesize Plan",
        phase: "Synthesis",
        capability: "architect",
        template: "synthesize-plan",
        rationale: "Draft the full plan from everything learned so far",
        synthesis: true,
        condition: None,
    },
    WorkflowStep {
        id: "critique-plan",
        title: "Critique Plan",
        phase: "Synthesis",
        capability: "critic",
        template: "critique-plan",
        rationale: "Judge the draft and score it before finalizing",
        synthesis: true,
        condition: None,
    },
    WorkflowStep {
        id: "finalize-plan",
        title: "Finalize Plan",
        phase: "Synthesis",
        capability: "architect",
        template: "finalize-plan",
        rationale: "Fold the critique back in and produce the final plan",
        synthesis: true,
        condition: None,
    },
];

/// Compute the frozen step sequence for a run
///
/// Pure in (task, context, overrides); the caller must hold these
/// constant across the run's calls.
pub fn compute_workflow(task: &str, context: &str, overrides: &WorkflowOverrides) -> Vec<WorkflowStep> {
    let workflow: Vec<WorkflowStep> = ALL_STEPS
        .iter()
        .filter(|step| {
            step.condition
                .map(|cond| cond.included(task, context, overrides))
                .unwrap_or(true)
        })
        .copied()
        .collect();

    debug!(
        steps = workflow.len(),
        ids = ?workflow.iter().map(|s| s.id).collect::<Vec<_>>(),
        "Computed workflow"
    );
    workflow
}

/// Distinct phase labels in workflow order
pub fn phase_names(workflow: &[WorkflowStep]) -> Vec<&'static str> {
    let mut phases = Vec::new();
    for step in workflow {
        if !phases.contains(&step.phase) {
            phases.push(step.phase);
        }
    }
    phases
}

/// Distinct capability names in workflow order
pub fn capability_names(workflow: &[WorkflowStep]) -> Vec<&'static str> {
    let mut names = Vec::new();
    for step in workflow {
        if !names.contains(&step.capability) {
            names.push(step.capability);
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_workflow_is_seven_steps() {
        let workflow = compute_workflow("Add dark mode toggle", "", &WorkflowOverrides::default());
        assert_eq!(workflow.len(), 7);
        assert_eq!(workflow[0].id, "analyze-requirements");
        assert_eq!(workflow[6].id, "finalize-plan");
        assert!(!workflow.iter().any(|s| s.phase == "Review"));
    }

    #[test]
    fn test_keywords_include_security_review() {
        let workflow = compute_workflow("Add OAuth login flow with password reset", "", &WorkflowOverrides::default());
        assert!(workflow.iter().any(|s| s.id == "security-review"));
        assert_eq!(workflow.len(), 8);
    }

    #[test]
    fn test_keywords_detected_in_context_too() {
        let workflow = compute_workflow(
            "Refactor request pipeline",
            "latency budget is 50ms p99",
            &WorkflowOverrides::default(),
        );
        assert!(workflow.iter().any(|s| s.id == "performance-review"));
    }

    #[test]
    fn test_override_forces_inclusion() {
        let overrides = WorkflowOverrides {
            ux_review: Some(true),
            ..Default::default()
        };
        let workflow = compute_workflow("Rename a config key", "", &overrides);
        assert!(workflow.iter().any(|s| s.id == "ux-review"));
    }

    #[test]
    fn test_override_forces_exclusion_despite_keywords() {
        let overrides = WorkflowOverrides {
            security_review: Some(false),
            ..Default::default()
        };
        let workflow = compute_workflow("Harden auth token security", "", &overrides);
        assert!(!workflow.iter().any(|s| s.id == "security-review"));
    }

    #[test]
    fn test_all_reviews_included() {
        let overrides = WorkflowOverrides {
            security_review: Some(true),
            ux_review: Some(true),
            performance_review: Some(true),
        };
        let workflow = compute_workflow("anything", "", &overrides);
        assert_eq!(workflow.len(), 10);
        // Review steps sit between identify-risks and synthesize-plan
        let risk_pos = workflow.iter().position(|s| s.id == "identify-risks").unwrap();
        let synth_pos = workflow.iter().position(|s| s.id == "synthesize-plan").unwrap();
        assert_eq!(synth_pos - risk_pos, 4);
    }

    #[test]
    fn test_compute_workflow_is_deterministic() {
        let overrides = WorkflowOverrides::default();
        let a = compute_workflow("task", "ctx", &overrides);
        let b = compute_workflow("task", "ctx", &overrides);
        let ids_a: Vec<_> = a.iter().map(|s| s.id).collect();
        let ids_b: Vec<_> = b.iter().map(|s| s.id).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_synthesis_flags() {
        let workflow = compute_workflow("task", "", &WorkflowOverrides::default());
        let synthesis: Vec<_> = workflow.iter().filter(|s| s.synthesis).map(|s| s.id).collect();
        assert_eq!(synthesis, vec!["synthesize-plan", "critique-plan", "finalize-plan"]);
    }

    #[test]
    fn test_phase_and_capability_names() {
        let workflow = compute_workflow("task", "", &WorkflowOverrides::default());
        assert_eq!(phase_names(&workflow), vec!["Discovery", "Design", "Synthesis"]);
        assert_eq!(capability_names(&workflow), vec!["reasoner", "architect", "critic"]);
    }

    #[test]
    fn test_step_ids_are_unique() {
        let overrides = WorkflowOverrides {
            security_review: Some(true),
            ux_review: Some(true),
            performance_review: Some(true),
        };
        let workflow = compute_workflow("t", "", &overrides);
        let mut ids: Vec<_> = workflow.iter().map(|s| s.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), workflow.len());
    }
}
