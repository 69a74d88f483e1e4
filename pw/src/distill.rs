//! Context Distiller
//!
//! Bounds the size of context handed to later workflow steps regardless
//! of how verbose earlier capability outputs were. Capabilities are
//! asked to wrap their key findings in a delimited summary block; when
//! one is present we lift it out, otherwise we truncate the raw output
//! at the friendliest boundary we can find.

use serde::Serialize;
use tracing::debug;

/// Opening delimiter of a capability's summary block
pub const SUMMARY_OPEN: &str = "=== SUMMARY ===";

/// Closing delimiter of a capability's summary block
pub const SUMMARY_CLOSE: &str = "=== END SUMMARY ===";

/// Minimum trimmed length for a summary block to be trusted
const MIN_SUMMARY_LEN: usize = 50;

/// Appended when a truncation cut lands on a text boundary
const TRUNCATION_MARKER: &str = "\n[truncated]";

/// Appended when nothing better than a hard cut was possible
const HARD_CUT_MARKER: &str = "…";

/// Boundary cuts are only taken at or past this fraction of the limit
const BOUNDARY_FLOOR: f64 = 0.7;

/// Context budget tier for a workflow step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContextBudget {
    /// Small step-to-step handoff
    Intermediate,
    /// Larger budget for synthesis steps that draft or judge a final answer
    Synthesis,
}

impl ContextBudget {
    /// Default character budget for this tier
    pub fn default_chars(&self) -> usize {
        match self {
            Self::Intermediate => 1_500,
            Self::Synthesis => 6_000,
        }
    }
}

/// Largest byte index <= `limit` that is a char boundary in `text`
fn floor_char_boundary(text: &str, limit: usize) -> usize {
    if limit >= text.len() {
        return text.len();
    }
    let mut idx = limit;
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Byte index just past the last sentence end in `head`, if any
fn last_sentence_end(head: &str) -> Option<usize> {
    let mut last = None;
    let mut prev: Option<(usize, char)> = None;
    for (idx, c) in head.char_indices() {
        if let Some((p_idx, p_char)) = prev
            && matches!(p_char, '.' | '!' | '?')
            && c.is_whitespace()
        {
            last = Some(p_idx + p_char.len_utf8());
        }
        prev = Some((idx, c));
    }
    last
}

/// Truncate `text` to roughly `limit` characters at a friendly boundary
///
/// Returns `text` unchanged when it already fits. Otherwise cuts at the
/// last paragraph break at or past 70% of the limit, else the last
/// sentence boundary past the same floor, else the last newline, else a
/// hard cut. Boundary cuts append a truncation marker, the hard cut an
/// ellipsis.
pub fn truncate_smart(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }

    let head = &text[..floor_char_boundary(text, limit)];
    let floor = (limit as f64 * BOUNDARY_FLOOR) as usize;

    if let Some(pos) = head.rfind("\n\n")
        && pos >= floor
    {
        return format!("{}{}", &head[..pos], TRUNCATION_MARKER);
    }

    if let Some(pos) = last_sentence_end(head)
        && pos >= floor
    {
        return format!("{}{}", head[..pos].trim_end(), TRUNCATION_MARKER);
    }

    if let Some(pos) = head.rfind('\n')
        && pos > 0
    {
        return format!("{}{}", &head[..pos], TRUNCATION_MARKER);
    }

    format!("{}{}", head, HARD_CUT_MARKER)
}

/// Extract the bounded essence of a step output
///
/// Prefers the capability's own delimited summary block when present
/// and substantial (>= 50 trimmed chars); falls back to truncating the
/// whole output. Empty input yields an empty string.
pub fn extract_summary(output: &str, limit: usize) -> String {
    if output.is_empty() {
        return String::new();
    }

    if let Some(open) = output.find(SUMMARY_OPEN) {
        let after_open = open + SUMMARY_OPEN.len();
        if let Some(close) = output[after_open..].find(SUMMARY_CLOSE) {
            let content = output[after_open..after_open + close].trim();
            if content.len() >= MIN_SUMMARY_LEN {
                debug!(len = content.len(), "Extracted delimited summary block");
                return truncate_smart(content, limit);
            }
        }
    }

    truncate_smart(output, limit)
}

/// Bounded context distilled from prior step outputs
///
/// Re-derived from the raw prior map by every parameter builder; the
/// coordinator never trusts whatever condensation the caller applied.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DistilledContext {
    /// The task being planned
    pub task: String,
    /// Per-step summaries in workflow order (step_id, summary)
    pub summaries: Vec<(String, String)>,
    /// Constraint lines scraped from prior outputs
    pub constraints: Vec<String>,
    /// Working-memory insight lines
    pub insights: Vec<String>,
    /// Working-memory decision lines
    pub decisions: Vec<String>,
    /// Working-memory open questions
    pub open_questions: Vec<String>,
    /// Total character estimate of the rendered context
    pub estimated_chars: usize,
}

/// Scrape a prefixed line, returning the remainder if the prefix matches
fn strip_tag<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    let trimmed = line.trim_start();
    trimmed
        .strip_prefix(tag)
        .map(|rest| rest.trim_start_matches(':').trim())
        .filter(|rest| !rest.is_empty())
}

impl DistilledContext {
    /// Distill ordered (step_id, output) pairs into bounded context
    ///
    /// `budget_chars` bounds the combined per-step summaries; each step
    /// gets an equal share with a small minimum so late steps are never
    /// squeezed out entirely.
    pub fn from_prior(task: &str, prior: &[(String, String)], budget_chars: usize) -> Self {
        let mut ctx = Self {
            task: task.to_string(),
            ..Self::default()
        };

        let non_empty = prior.iter().filter(|(_, out)| !out.is_empty()).count();
        if non_empty == 0 {
            return ctx;
        }
        let per_step = (budget_chars / non_empty).max(200);

        for (step_id, output) in prior {
            if output.is_empty() {
                continue;
            }

            for line in output.lines() {
                if let Some(rest) = strip_tag(line, "CONSTRAINT") {
                    ctx.constraints.push(rest.to_string());
                } else if line.trim_start().starts_with("MUST ") || line.trim_start().starts_with("MUST NOT ") {
                    ctx.constraints.push(line.trim().to_string());
                } else if let Some(rest) = strip_tag(line, "INSIGHT") {
                    ctx.insights.push(rest.to_string());
                } else if let Some(rest) = strip_tag(line, "DECISION") {
                    ctx.decisions.push(rest.to_string());
                } else if let Some(rest) = strip_tag(line, "OPEN QUESTION") {
                    ctx.open_questions.push(rest.to_string());
                }
            }

            let summary = extract_summary(output, per_step);
            ctx.summaries.push((step_id.clone(), summary));
        }

        ctx.estimated_chars = ctx.render_summaries().len() + ctx.render_working_memory().len();
        debug!(
            steps = ctx.summaries.len(),
            constraints = ctx.constraints.len(),
            estimated_chars = ctx.estimated_chars,
            "Distilled prior context"
        );
        ctx
    }

    /// Render per-step summaries as a markdown block
    pub fn render_summaries(&self) -> String {
        let mut out = String::new();
        for (step_id, summary) in &self.summaries {
            if summary.is_empty() {
                continue;
            }
            out.push_str(&format!("### {}\n{}\n\n", step_id, summary));
        }
        out.trim_end().to_string()
    }

    /// Render constraints + working-memory sections as a markdown block
    pub fn render_working_memory(&self) -> String {
        let mut out = String::new();

        let sections: [(&str, &Vec<String>); 4] = [
            ("Constraints", &self.constraints),
            ("Insights", &self.insights),
            ("Decisions", &self.decisions),
            ("Open Questions", &self.open_questions),
        ];

        for (title, lines) in sections {
            if lines.is_empty() {
                continue;
            }
            out.push_str(&format!("#### {}\n", title));
            for line in lines {
                out.push_str(&format!("- {}\n", line));
            }
            out.push('\n');
        }

        out.trim_end().to_string()
    }
}
