//! Core StepStore trait and implementations

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

/// Errors from store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying filesystem failure
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache file could not be serialized
    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Slugify a task name for use as a store namespace and in filenames
///
/// Lowercased, runs of non-alphanumerics collapsed to single dashes,
/// capped at [`crate::MAX_SLUG_LEN`] characters.
pub fn task_slug(task: &str) -> String {
    let slug: String = task
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    slug.chars().take(crate::MAX_SLUG_LEN).collect()
}

/// Minimal key-value accumulator namespaced by task
///
/// `record` implements longest-write-wins: a shorter write never
/// replaces a longer cached value for the same (task, step) key.
pub trait StepStore {
    /// Load the full step_id -> output map for a task
    ///
    /// Missing state reads as an empty map.
    fn load(&self, task: &str) -> Result<HashMap<String, String>, StoreError>;

    /// Record a step output, keeping whichever copy is longer
    ///
    /// Returns true if the supplied output was kept, false if a longer
    /// cached value already existed.
    fn record(&self, task: &str, step_id: &str, output: &str) -> Result<bool, StoreError>;

    /// Delete all accumulated state for a task
    fn delete(&self, task: &str) -> Result<(), StoreError>;

    /// List task slugs with accumulated state
    fn list(&self) -> Result<Vec<String>, StoreError>;
}

/// File-backed store: one JSON map file per task slug
///
/// Writes are plain create-and-replace with no locking; concurrent runs
/// sharing a task slug are not supported.
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Open or create a store at the given directory
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        debug!(?base_path, "Opened step store");
        Ok(Self { base_path })
    }

    /// Path of the cache file for a task
    pub fn cache_path(&self, task: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", task_slug(task)))
    }

    fn read_map(&self, path: &Path) -> HashMap<String, String> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return HashMap::new(),
        };

        match serde_json::from_str(&content) {
            Ok(map) => map,
            Err(e) => {
                // Malformed cache is recovered as empty, never fatal
                warn!(path = %path.display(), error = %e, "Malformed cache file, treating as empty");
                HashMap::new()
            }
        }
    }
}

impl StepStore for FileStore {
    fn load(&self, task: &str) -> Result<HashMap<String, String>, StoreError> {
        Ok(self.read_map(&self.cache_path(task)))
    }

    fn record(&self, task: &str, step_id: &str, output: &str) -> Result<bool, StoreError> {
        let path = self.cache_path(task);
        let mut map = self.read_map(&path);

        if let Some(existing) = map.get(step_id)
            && existing.len() >= output.len()
        {
            debug!(
                step_id,
                cached_len = existing.len(),
                offered_len = output.len(),
                "Keeping longer cached output"
            );
            return Ok(false);
        }

        map.insert(step_id.to_string(), output.to_string());
        fs::write(&path, serde_json::to_string_pretty(&map)?)?;
        debug!(step_id, len = output.len(), path = %path.display(), "Recorded step output");
        Ok(true)
    }

    fn delete(&self, task: &str) -> Result<(), StoreError> {
        let path = self.cache_path(task);
        if path.exists() {
            fs::remove_file(&path)?;
            debug!(path = %path.display(), "Deleted cache file");
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut slugs = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(stem) = path.file_stem()
            {
                slugs.push(stem.to_string_lossy().to_string());
            }
        }
        slugs.sort();
        Ok(slugs)
    }
}

/// In-memory store for tests and dry runs
#[derive(Default)]
pub struct MemoryStore {
    maps: Mutex<HashMap<String, HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

impl StepStore for MemoryStore {
    fn load(&self, task: &str) -> Result<HashMap<String, String>, StoreError> {
        let maps = self.maps.lock().unwrap_or_else(|e| e.into_inner());
        Ok(maps.get(&task_slug(task)).cloned().unwrap_or_default())
    }

    fn record(&self, task: &str, step_id: &str, output: &str) -> Result<bool, StoreError> {
        let mut maps = self.maps.lock().unwrap_or_else(|e| e.into_inner());
        let map = maps.entry(task_slug(task)).or_default();

        if let Some(existing) = map.get(step_id)
            && existing.len() >= output.len()
        {
            return Ok(false);
        }

        map.insert(step_id.to_string(), output.to_string());
        Ok(true)
    }

    fn delete(&self, task: &str) -> Result<(), StoreError> {
        let mut maps = self.maps.lock().unwrap_or_else(|e| e.into_inner());
        maps.remove(&task_slug(task));
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let maps = self.maps.lock().unwrap_or_else(|e| e.into_inner());
        let mut slugs: Vec<String> = maps.keys().cloned().collect();
        slugs.sort();
        Ok(slugs)
    }
}
