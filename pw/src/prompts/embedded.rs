//! Embedded fallback templates
//!
//! These are compiled into the binary and used when override files are
//! not found. Every template ends with the summary-block instruction so
//! later steps can distill this step's output reliably.

/// Shared tail asking the capability to emit a distillable summary
const SUMMARY_INSTRUCTION: &str = r#"
End your response with a summary block:

=== SUMMARY ===
(5-10 sentences: your key findings, stated so a later step can act on them without reading the full output. Prefix hard requirements with CONSTRAINT:, notable observations with INSIGHT:, choices you made with DECISION:, and unresolved items with OPEN QUESTION:.)
=== END SUMMARY ===
"#;

const ANALYZE_REQUIREMENTS: &str = r#"You are analyzing requirements for a development task before any design work begins.

## Task
{{task}}

{{#if context}}## Context
{{context}}
{{/if}}
{{#if code_context}}## Code / Reference Material
{{code_context}}
{{/if}}
{{#if answers}}## Clarifying Answers
{{answers}}
{{/if}}

Identify:
1. The explicit requirements stated in the task
2. Implicit requirements a reviewer would expect
3. Hard constraints (technical, compatibility, scope)
4. What is explicitly out of scope
5. Ambiguities that need a decision

Be concrete. Quote the task where it pins something down.
"#;

const EXPLORE_APPROACHES: &str = r#"You are exploring implementation approaches for a development task.

## Task
{{task}}

{{#if working_memory}}## Working Memory
{{working_memory}}
{{/if}}
{{#if prior_summary}}## Prior Analysis
{{prior_summary}}
{{/if}}

Lay out 2-4 viable approaches. For each: core idea, main trade-off,
what it would break or complicate. Recommend one and say why the
others lose.
"#;

const DRAFT_ARCHITECTURE: &str = r#"You are drafting the architecture for a development task.

## Task
{{task}}

{{#if working_memory}}## Working Memory
{{working_memory}}
{{/if}}
{{#if prior_summary}}## Prior Analysis
{{prior_summary}}
{{/if}}

Produce a concrete structure: components, responsibilities, data flow,
and the seams where the design could flex later. Name files/modules
where the task makes that possible. State every assumption as a
DECISION: line so later steps inherit it.
"#;

const IDENTIFY_RISKS: &str = r#"You are reviewing a draft architecture for risks.

## Task
{{task}}

{{#if working_memory}}## Working Memory
{{working_memory}}
{{/if}}
{{#if prior_summary}}## Prior Analysis
{{prior_summary}}
{{/if}}

List the ways this plan fails: technical risks, integration risks,
sequencing risks, and anything the analysis missed. For each risk give
likelihood, blast radius, and a mitigation or detection step.
"#;

const SECURITY_REVIEW: &str = r#"You are performing a security review of a draft plan.

## Task
{{task}}

{{#if working_memory}}## Working Memory
{{working_memory}}
{{/if}}
{{#if prior_summary}}## Prior Analysis
{{prior_summary}}
{{/if}}

Review for: authentication/authorization gaps, secret handling, input
validation, injection surfaces, and data exposure. Flag every finding
with severity and a concrete fix.
"#;

const UX_REVIEW: &str = r#"You are performing a usability and accessibility review of a draft plan.

## Task
{{task}}

{{#if working_memory}}## Working Memory
{{working_memory}}
{{/if}}
{{#if prior_summary}}## Prior Analysis
{{prior_summary}}
{{/if}}

Review for: discoverability, error states, keyboard and screen-reader
accessibility, and consistency with existing interaction patterns.
Flag findings with severity and a concrete fix.
"#;

const PERFORMANCE_REVIEW: &str = r#"You are performing a performance review of a draft plan.

## Task
{{task}}

{{#if working_memory}}## Working Memory
{{working_memory}}
{{/if}}
{{#if prior_summary}}## Prior Analysis
{{prior_summary}}
{{/if}}

Review for: hot paths, unnecessary allocations or I/O, scaling limits,
and missing measurement points. Flag findings with expected impact and
a concrete fix.
"#;

const SYNTHESIZE_PLAN: &str = r#"You are synthesizing a complete implementation plan from prior analysis.

## Task
{{task}}

{{#if context}}## Context
{{context}}
{{/if}}
{{#if working_memory}}## Working Memory
{{working_memory}}
{{/if}}
{{#if prior_summary}}## Accumulated Analysis
{{prior_summary}}
{{/if}}

Write the full plan as markdown with numbered step sections:

## Step 1: <title>
...

Each step must be independently executable, with concrete files or
components named and a verification note saying how to confirm the
step is done. Honor every CONSTRAINT and DECISION in working memory.
"#;

const CRITIQUE_PLAN: &str = r#"You are judging a draft implementation plan.

## Task
{{task}}

{{#if working_memory}}## Working Memory
{{working_memory}}
{{/if}}
{{#if prior_summary}}## Draft Plan and Prior Analysis
{{prior_summary}}
{{/if}}

Critique the draft: missing steps, wrong ordering, unhandled risks,
vague instructions. Then score it, one line per dimension, exactly in
this format:

Completeness: n/10
Correctness: n/10
Feasibility: n/10
Clarity: n/10
"#;

const FINALIZE_PLAN: &str = r#"You are producing the final implementation plan.

## Task
{{task}}

{{#if working_memory}}## Working Memory
{{working_memory}}
{{/if}}
{{#if prior_summary}}## Draft, Critique, and Prior Analysis
{{prior_summary}}
{{/if}}

Revise the draft plan to address every critique point. Output the
complete final plan as markdown with `## Step N: <title>` sections.
Do not output a diff or partial plan - always the full document.
"#;

/// Get an embedded template by step id
pub fn get_embedded(name: &str) -> Option<String> {
    let body = match name {
        "analyze-requirements" => ANALYZE_REQUIREMENTS,
        "explore-approaches" => EXPLORE_APPROACHES,
        "draft-architecture" => DRAFT_ARCHITECTURE,
        "identify-risks" => IDENTIFY_RISKS,
        "security-review" => SECURITY_REVIEW,
        "ux-review" => UX_REVIEW,
        "performance-review" => PERFORMANCE_REVIEW,
        "synthesize-plan" => SYNTHESIZE_PLAN,
        "critique-plan" => CRITIQUE_PLAN,
        "finalize-plan" => FINALIZE_PLAN,
        _ => return None,
    };
    Some(format!("{}{}", body, SUMMARY_INSTRUCTION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_step_template_exists() {
        for name in [
            "analyze-requirements",
            "explore-approaches",
            "draft-architecture",
            "identify-risks",
            "security-review",
            "ux-review",
            "performance-review",
            "synthesize-plan",
            "critique-plan",
            "finalize-plan",
        ] {
            assert!(get_embedded(name).is_some(), "missing template: {}", name);
        }
    }

    #[test]
    fn test_unknown_template_is_none() {
        assert!(get_embedded("no-such-step").is_none());
    }

    #[test]
    fn test_templates_carry_summary_instruction() {
        let t = get_embedded("analyze-requirements").unwrap();
        assert!(t.contains("=== SUMMARY ==="));
        assert!(t.contains("=== END SUMMARY ==="));
    }
}
