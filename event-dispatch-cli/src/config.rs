//! Configuration loading and parsing

use anyhow::{Context, Result};
use event_dispatch::DispatcherConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from a TOML file)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, rename = "scenario")]
    pub scenarios: Vec<ScenarioConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dispatcher: DispatcherConfig::default(),
            output: OutputConfig::default(),
            scenarios: vec![
                ScenarioConfig::new("steady", 200, 4),
                ScenarioConfig {
                    lifetime: 3,
                    ..ScenarioConfig::new("churn", 500, 8)
                },
                ScenarioConfig {
                    trigger_once_every: 2,
                    optimize_every: 50,
                    ..ScenarioConfig::new("one-shot", 500, 6)
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
}

/// One add/remove/invoke workload
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub name: String,
    /// Number of add/invoke/remove rounds
    pub rounds: usize,
    /// Listeners subscribed per round
    pub subscribers: usize,
    /// Rounds a listener stays subscribed before removal (0 = forever)
    #[serde(default)]
    pub lifetime: usize,
    /// Every n-th subscription fires only once (0 = never)
    #[serde(default)]
    pub trigger_once_every: usize,
    /// Run an explicit compaction every n rounds (0 = never)
    #[serde(default)]
    pub optimize_every: usize,
    /// Release unused storage after the last round
    #[serde(default)]
    pub shrink_at_end: bool,
}

impl ScenarioConfig {
    pub fn new(name: impl Into<String>, rounds: usize, subscribers: usize) -> Self {
        Self {
            name: name.into(),
            rounds,
            subscribers,
            lifetime: 0,
            trigger_once_every: 0,
            optimize_every: 0,
            shrink_at_end: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Scenario at position {0} has an empty name")]
    EmptyName(usize),

    #[error("Duplicate scenario name: {0}")]
    DuplicateName(String),

    #[error("Scenario {0}: rounds must be greater than zero")]
    NoRounds(String),

    #[error("Scenario {0}: subscribers must be greater than zero")]
    NoSubscribers(String),
}

impl AppConfig {
    /// Check scenario parameters
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        for (position, scenario) in self.scenarios.iter().enumerate() {
            if scenario.name.trim().is_empty() {
                return Err(ConfigError::EmptyName(position));
            }
            if !seen.insert(scenario.name.as_str()) {
                return Err(ConfigError::DuplicateName(scenario.name.clone()));
            }
            if scenario.rounds == 0 {
                return Err(ConfigError::NoRounds(scenario.name.clone()));
            }
            if scenario.subscribers == 0 {
                return Err(ConfigError::NoSubscribers(scenario.name.clone()));
            }
        }
        Ok(())
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .validate()
        .with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}
