//! PlanWeaver configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::distill::ContextBudget;

/// Main PlanWeaver configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage locations
    pub storage: StorageConfig,

    /// Context distillation budgets
    pub budgets: BudgetConfig,

    /// Capability output budgets
    pub capabilities: CapabilityConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .planweaver.yml
        let local_config = PathBuf::from(".planweaver.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/planweaver/planweaver.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("planweaver").join("planweaver.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Storage locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for plan artifacts (day-bucketed beneath)
    #[serde(rename = "plan-dir")]
    pub plan_dir: PathBuf,

    /// Directory for accumulator cache files
    #[serde(rename = "cache-dir")]
    pub cache_dir: PathBuf,

    /// Optional user template override directory
    #[serde(rename = "template-dir")]
    pub template_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            plan_dir: data_dir.join("planweaver").join("plans"),
            cache_dir: data_dir.join("stepstore"),
            template_dir: None,
        }
    }
}

/// Context distillation budgets, in characters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Step-to-step handoff budget
    #[serde(rename = "intermediate-chars")]
    pub intermediate_chars: usize,

    /// Budget for synthesis-flagged steps
    #[serde(rename = "synthesis-chars")]
    pub synthesis_chars: usize,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            intermediate_chars: ContextBudget::Intermediate.default_chars(),
            synthesis_chars: ContextBudget::Synthesis.default_chars(),
        }
    }
}

impl BudgetConfig {
    /// Character budget for a tier
    pub fn chars_for(&self, budget: ContextBudget) -> usize {
        match budget {
            ContextBudget::Intermediate => self.intermediate_chars,
            ContextBudget::Synthesis => self.synthesis_chars,
        }
    }
}

/// Maximum-output-size budgets per capability name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityConfig {
    /// Fallback budget for capabilities not listed
    #[serde(rename = "default-output-budget")]
    pub default_output_budget: usize,

    /// Per-capability overrides
    #[serde(rename = "output-budgets")]
    pub output_budgets: HashMap<String, usize>,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        let mut output_budgets = HashMap::new();
        output_budgets.insert("architect".to_string(), 16_384);
        output_budgets.insert("critic".to_string(), 8_192);
        Self {
            default_output_budget: 8_192,
            output_budgets,
        }
    }
}

impl CapabilityConfig {
    /// Budget for a capability name, with default fallback
    pub fn budget_for(&self, capability: &str) -> usize {
        self.output_budgets
            .get(capability)
            .copied()
            .unwrap_or(self.default_output_budget)
    }
}
