//! Plan parser - ordered fallback chain of pattern strategies
//!
//! Each strategy is an independent "attempt parse"; they are tried in
//! sequence and the first one matching at least two steps wins. A plan
//! with no recognizable step markers falls back to top-level section
//! headers; failing that, the parse result says so explicitly.

use eyre::{Context, Result};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// A strategy must match at least this many steps to win
const MIN_STEPS: usize = 2;

/// One parsed step of a finished plan
#[derive(Debug, Clone, Serialize)]
pub struct PlanStep {
    /// 1-based step index
    pub index: usize,
    /// Step title text
    pub title: String,
    /// Body between this step marker and the next
    pub body: String,
}

/// Result of parsing a plan document
#[derive(Debug, Clone, Serialize)]
pub struct ParsedPlan {
    /// Parsed steps, possibly empty
    pub steps: Vec<PlanStep>,
    /// Name of the strategy that matched, if any
    pub strategy: Option<&'static str>,
}

impl ParsedPlan {
    /// True when no strategy (including the fallback) matched anything
    pub fn could_not_parse(&self) -> bool {
        self.strategy.is_none()
    }
}

struct ParseStrategy {
    name: &'static str,
    pattern: Regex,
}

/// Parses plan documents into discrete steps
pub struct PlanParser {
    strategies: Vec<ParseStrategy>,
    fallback: Regex,
}

impl PlanParser {
    /// Build the parser with its ordered strategy chain
    pub fn new() -> Result<Self> {
        let strategies = vec![
            ParseStrategy {
                name: "step-headers",
                pattern: Regex::new(r"(?m)^#{1,3}\s*Step\s+(\d+)\s*[:.\-]?\s*(.*)$").context("step-headers pattern")?,
            },
            ParseStrategy {
                name: "numbered-items",
                pattern: Regex::new(r"(?m)^\s*(\d+)[.)]\s+(.+)$").context("numbered-items pattern")?,
            },
            ParseStrategy {
                name: "phase-headers",
                pattern: Regex::new(r"(?m)^#{1,3}\s*(?:Phase|Task)\s+(\d+)\s*[:.\-]?\s*(.*)$")
                    .context("phase-headers pattern")?,
            },
        ];
        let fallback = Regex::new(r"(?m)^#\s+(.+)$").context("section-headers pattern")?;

        Ok(Self { strategies, fallback })
    }

    /// Parse a plan document
    ///
    /// Never errors: an unparseable document yields zero steps with
    /// `could_not_parse()` set.
    pub fn parse(&self, doc: &str) -> ParsedPlan {
        for strategy in &self.strategies {
            let steps = apply_numbered(&strategy.pattern, doc);
            if steps.len() >= MIN_STEPS {
                debug!(strategy = strategy.name, steps = steps.len(), "Plan parsed");
                return ParsedPlan {
                    steps,
                    strategy: Some(strategy.name),
                };
            }
        }

        // Fall back to splitting on top-level section headers
        let steps = apply_headers(&self.fallback, doc);
        if !steps.is_empty() {
            debug!(steps = steps.len(), "Plan parsed via section-header fallback");
            return ParsedPlan {
                steps,
                strategy: Some("section-headers"),
            };
        }

        debug!("Plan could not be parsed");
        ParsedPlan {
            steps: Vec::new(),
            strategy: None,
        }
    }
}

/// Split `doc` on matches of a (number, title) capturing pattern
fn apply_numbered(pattern: &Regex, doc: &str) -> Vec<PlanStep> {
    let marks: Vec<(usize, usize, usize, String)> = pattern
        .captures_iter(doc)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let index: usize = caps.get(1)?.as_str().parse().ok()?;
            let title = caps.get(2).map(|m| m.as_str().trim().to_string()).unwrap_or_default();
            Some((whole.start(), whole.end(), index, title))
        })
        .collect();

    marks
        .iter()
        .enumerate()
        .map(|(i, (_, end, index, title))| {
            let body_end = marks.get(i + 1).map(|next| next.0).unwrap_or(doc.len());
            PlanStep {
                index: *index,
                title: title.clone(),
                body: doc[*end..body_end].trim().to_string(),
            }
        })
        .collect()
}

/// Split `doc` on top-level headers, numbering steps sequentially
fn apply_headers(pattern: &Regex, doc: &str) -> Vec<PlanStep> {
    let marks: Vec<(usize, usize, String)> = pattern
        .captures_iter(doc)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let title = caps.get(1)?.as_str().trim().to_string();
            Some((whole.start(), whole.end(), title))
        })
        .collect();

    marks
        .iter()
        .enumerate()
        .map(|(i, (_, end, title))| {
            let body_end = marks.get(i + 1).map(|next| next.0).unwrap_or(doc.len());
            PlanStep {
                index: i + 1,
                title: title.clone(),
                body: doc[*end..body_end].trim().to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> PlanParser {
        PlanParser::new().unwrap()
    }

    #[test]
    fn test_step_headers_win() {
        let doc = "# Final Plan\n\n## Step 1: Add theme context\nbody one\n\n## Step 2: Wire the toggle\nbody two\n";
        let parsed = parser().parse(doc);

        assert_eq!(parsed.strategy, Some("step-headers"));
        assert_eq!(parsed.steps.len(), 2);
        assert_eq!(parsed.steps[0].index, 1);
        assert_eq!(parsed.steps[0].title, "Add theme context");
        assert_eq!(parsed.steps[0].body, "body one");
        assert_eq!(parsed.steps[1].title, "Wire the toggle");
    }

    #[test]
    fn test_numbered_items() {
        let doc = "Plan overview\n\n1. Create the settings entry\n   details here\n2. Persist the preference\n3) Apply on startup\n";
        let parsed = parser().parse(doc);

        assert_eq!(parsed.strategy, Some("numbered-items"));
        assert_eq!(parsed.steps.len(), 3);
        assert_eq!(parsed.steps[1].title, "Persist the preference");
        assert_eq!(parsed.steps[0].body, "details here");
    }

    #[test]
    fn test_phase_headers() {
        let doc = "## Phase 1: Foundations\nwork\n\n## Phase 2 - Integration\nmore work\n";
        let parsed = parser().parse(doc);

        assert_eq!(parsed.strategy, Some("phase-headers"));
        assert_eq!(parsed.steps.len(), 2);
        assert_eq!(parsed.steps[1].title, "Integration");
    }

    #[test]
    fn test_single_match_does_not_win() {
        // One "Step" header is below the minimum; falls through to the
        // section-header fallback
        let doc = "# Overview\nintro\n\n# Approach\n## Step 1: only one\n";
        let parsed = parser().parse(doc);
        assert_eq!(parsed.strategy, Some("section-headers"));
        assert_eq!(parsed.steps.len(), 2);
        assert_eq!(parsed.steps[0].title, "Overview");
    }

    #[test]
    fn test_section_header_fallback() {
        let doc = "# The Whole Plan\nNo structured steps here, just prose.\n";
        let parsed = parser().parse(doc);

        assert_eq!(parsed.strategy, Some("section-headers"));
        assert_eq!(parsed.steps.len(), 1);
        assert_eq!(parsed.steps[0].index, 1);
        assert!(!parsed.could_not_parse());
    }

    #[test]
    fn test_could_not_parse() {
        let doc = "just prose with no headers\nand no numbering at all\n";
        let parsed = parser().parse(doc);

        assert!(parsed.could_not_parse());
        assert!(parsed.steps.is_empty());
    }

    #[test]
    fn test_empty_document() {
        let parsed = parser().parse("");
        assert!(parsed.could_not_parse());
    }

    #[test]
    fn test_last_step_body_runs_to_end() {
        let doc = "## Step 1: a\nfirst\n## Step 2: b\nsecond\nand more\n";
        let parsed = parser().parse(doc);
        assert_eq!(parsed.steps[1].body, "second\nand more");
    }
}
