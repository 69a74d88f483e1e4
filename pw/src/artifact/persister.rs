//! PlanPersister - incremental plan artifact writing
//!
//! Maintains one markdown artifact per run at a deterministic,
//! day-bucketed path. The slug -> path table lives for the process
//! lifetime only; a restart simply creates a new path, and the
//! accumulator remains the content source of truth.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use tracing::{debug, warn};

use stepstore::task_slug;

use crate::workflow::{WorkflowStep, capability_names, phase_names};

/// Writes and updates the per-run plan artifact
pub struct PlanPersister {
    /// Root directory, day-bucketed beneath
    root: PathBuf,
    /// In-memory task-slug -> artifact-path table for the run
    paths: HashMap<String, PathBuf>,
}

impl PlanPersister {
    /// Create a persister rooted at the given directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            paths: HashMap::new(),
        }
    }

    /// Artifact path for a task, reused across the run's writes
    pub fn path_for(&mut self, task: &str) -> PathBuf {
        let slug = task_slug(task);
        if let Some(path) = self.paths.get(&slug) {
            return path.clone();
        }

        let now = chrono::Local::now();
        let day = now.format("%Y-%m-%d").to_string();
        let weekday = now.format("%A").to_string().to_lowercase();
        let filename = format!("{}-{}-plan-{}.md", now.format("%Y-%m-%d-%H%M"), weekday, slug);

        let path = self.root.join(day).join(filename);
        debug!(task, path = %path.display(), "Allocated artifact path");
        self.paths.insert(slug, path.clone());
        path
    }

    /// Release the path table entry when a run completes
    pub fn release(&mut self, task: &str) {
        self.paths.remove(&task_slug(task));
    }

    /// Write the in-progress artifact
    ///
    /// `completed` is how many workflow steps have reported output.
    /// Best-effort: failures are logged and the path is still returned.
    pub fn write_progress(
        &mut self,
        task: &str,
        workflow: &[WorkflowStep],
        outputs: &HashMap<String, String>,
        completed: usize,
    ) -> PathBuf {
        let doc = render_document(task, workflow, outputs, DocumentState::InProgress { completed });
        let path = self.path_for(task);
        if let Err(e) = write_file(&path, &doc) {
            warn!(task, error = %e, "Failed to write plan artifact, continuing without progress tracking");
        }
        path
    }

    /// Write the final artifact and release the path entry
    pub fn write_final(
        &mut self,
        task: &str,
        workflow: &[WorkflowStep],
        outputs: &HashMap<String, String>,
        result: &str,
        scores: &[(String, f64)],
    ) -> PathBuf {
        let doc = render_document(task, workflow, outputs, DocumentState::Complete { result, scores });
        let path = self.path_for(task);
        if let Err(e) = write_file(&path, &doc) {
            warn!(task, error = %e, "Failed to write final plan artifact");
        }
        self.release(task);
        path
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create artifact directory")?;
    }
    fs::write(path, content).context("Failed to write artifact")?;
    Ok(())
}

enum DocumentState<'a> {
    InProgress { completed: usize },
    Complete { result: &'a str, scores: &'a [(String, f64)] },
}

fn render_document(
    task: &str,
    workflow: &[WorkflowStep],
    outputs: &HashMap<String, String>,
    state: DocumentState<'_>,
) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Plan: {}\n\n", task));

    let status = match state {
        DocumentState::InProgress { .. } => "in-progress",
        DocumentState::Complete { .. } => "pending",
    };
    md.push_str(&format!("- Status: {}\n", status));
    md.push_str(&format!("- Phases: {}\n", phase_names(workflow).join(", ")));
    md.push_str(&format!("- Capabilities: {}\n", capability_names(workflow).join(", ")));

    if let DocumentState::Complete { scores, .. } = state
        && !scores.is_empty()
    {
        md.push_str("- Scores:\n");
        for (name, value) in scores {
            md.push_str(&format!("  - {}: {}/10\n", name, value));
        }
    }

    md.push_str("\n---\n\n");

    match state {
        DocumentState::InProgress { completed } => {
            for step in workflow.iter().take(completed) {
                md.push_str(&format!("## {} ({})\n\n", step.title, step.phase));
                match outputs.get(step.id) {
                    Some(output) if !output.is_empty() => md.push_str(&format!("{}\n\n", output)),
                    _ => md.push_str("_no output recorded_\n\n"),
                }
            }

            if completed < workflow.len() {
                md.push_str("## Remaining\n\n");
                for step in workflow.iter().skip(completed) {
                    md.push_str(&format!("- [ ] {}\n", step.title));
                }
            }
        }
        DocumentState::Complete { result, .. } => {
            md.push_str(result);
            md.push_str("\n\n# Step Analyses\n\n");
            for step in workflow {
                md.push_str(&format!("## {} ({})\n\n", step.title, step.phase));
                match outputs.get(step.id) {
                    Some(output) if !output.is_empty() => md.push_str(&format!("{}\n\n", output)),
                    _ => md.push_str("_no output recorded_\n\n"),
                }
            }

            // Leftover keys not present in the workflow
            let known: Vec<&str> = workflow.iter().map(|s| s.id).collect();
            let mut leftovers: Vec<(&String, &String)> =
                outputs.iter().filter(|(k, _)| !known.contains(&k.as_str())).collect();
            leftovers.sort();
            for (key, output) in leftovers {
                md.push_str(&format!("## {}\n\n{}\n\n", key, output));
            }
        }
    }

    md.trim_end().to_string() + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{WorkflowOverrides, compute_workflow};
    use tempfile::TempDir;

    fn workflow_fixture() -> Vec<WorkflowStep> {
        compute_workflow("Add dark mode toggle", "", &WorkflowOverrides::default())
    }

    #[test]
    fn test_path_is_stable_within_run() {
        let dir = TempDir::new().unwrap();
        let mut persister = PlanPersister::new(dir.path());

        let a = persister.path_for("Add dark mode toggle");
        let b = persister.path_for("Add dark mode toggle");
        assert_eq!(a, b);
    }

    #[test]
    fn test_path_shape() {
        let dir = TempDir::new().unwrap();
        let mut persister = PlanPersister::new(dir.path());

        let path = persister.path_for("Add dark mode toggle");
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.ends_with("-plan-add-dark-mode-toggle.md"));
        // Day bucket directory
        let bucket = path.parent().unwrap().file_name().unwrap().to_string_lossy();
        assert_eq!(bucket.len(), "2026-08-30".len());
    }

    #[test]
    fn test_release_allocates_fresh_path_next_run() {
        let dir = TempDir::new().unwrap();
        let mut persister = PlanPersister::new(dir.path());

        let a = persister.path_for("task");
        persister.release("task");
        // Table entry is gone; a new lookup recomputes (possibly equal
        // if within the same minute, but the table itself is empty)
        assert!(persister.paths.is_empty());
        let _ = a;
    }

    #[test]
    fn test_progress_document_contents() {
        let dir = TempDir::new().unwrap();
        let mut persister = PlanPersister::new(dir.path());
        let workflow = workflow_fixture();

        let mut outputs = HashMap::new();
        outputs.insert("analyze-requirements".to_string(), "requirements analysis text".to_string());

        let path = persister.write_progress("Add dark mode toggle", &workflow, &outputs, 1);
        let doc = fs::read_to_string(&path).unwrap();

        assert!(doc.contains("- Status: in-progress"));
        assert!(doc.contains("- Phases: Discovery, Design, Synthesis"));
        assert!(doc.contains("requirements analysis text"));
        assert!(doc.contains("- [ ] Explore Approaches"));
        assert!(!doc.contains("- [ ] Analyze Requirements"));
    }

    #[test]
    fn test_incremental_writes_reuse_path() {
        let dir = TempDir::new().unwrap();
        let mut persister = PlanPersister::new(dir.path());
        let workflow = workflow_fixture();
        let outputs = HashMap::new();

        let a = persister.write_progress("task", &workflow, &outputs, 0);
        let b = persister.write_progress("task", &workflow, &outputs, 2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_final_document_contents() {
        let dir = TempDir::new().unwrap();
        let mut persister = PlanPersister::new(dir.path());
        let workflow = workflow_fixture();

        let mut outputs = HashMap::new();
        for step in &workflow {
            outputs.insert(step.id.to_string(), format!("full analysis for {}", step.id));
        }
        outputs.insert("stray-key".to_string(), "orphaned output".to_string());

        let scores = vec![("Completeness".to_string(), 8.0)];
        let path = persister.write_final("task", &workflow, &outputs, "## Step 1: Do the thing", &scores);
        let doc = fs::read_to_string(&path).unwrap();

        assert!(doc.contains("- Status: pending"));
        assert!(doc.contains("- Completeness: 8/10"));
        assert!(doc.contains("## Step 1: Do the thing"));
        assert!(doc.contains("full analysis for finalize-plan"));
        // Leftover key lands after the workflow sections
        assert!(doc.contains("orphaned output"));
        // Path entry released
        assert!(persister.paths.is_empty());
    }

    #[test]
    fn test_write_failure_is_non_fatal() {
        // Root under a path that cannot be created (a file in the way)
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, "file, not dir").unwrap();

        let mut persister = PlanPersister::new(&blocker);
        let workflow = workflow_fixture();
        // Does not panic or error, still returns the intended path
        let path = persister.write_progress("task", &workflow, &HashMap::new(), 0);
        assert!(path.starts_with(&blocker));
    }
}
