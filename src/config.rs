use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;

/// Cluster/job settings handed to the job driver with every submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub master: String,
    pub executors: Option<u32>,
    pub executor_memory: String,
    /// Prefix for output artifact names derived from node identity.
    pub output_prefix: String,
    pub properties: BTreeMap<String, String>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            master: "local[*]".to_string(),
            executors: None,
            executor_memory: "1g".to_string(),
            output_prefix: "mapalgebra".to_string(),
            properties: BTreeMap::new(),
        }
    }
}

impl ExecutionConfig {
    pub fn from_json(config: Value) -> Result<Self> {
        serde_json::from_value(config).context("Failed to parse execution config")
    }

    /// Reads the config file, writing a default one first if it is missing.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create config directory")?;
            }

            let json = serde_json::to_string_pretty(&Self::default())?;
            fs::write(path, json)
                .await
                .context("Failed to write default config")?;
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Applies `MAPALGEBRA_*` environment variables on top of this config.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(master) = lookup("MAPALGEBRA_MASTER") {
            self.master = master;
        }
        if let Some(executors) = lookup("MAPALGEBRA_EXECUTORS") {
            let count = executors
                .parse()
                .with_context(|| format!("MAPALGEBRA_EXECUTORS is not a number: {}", executors))?;
            self.executors = Some(count);
        }
        if let Some(memory) = lookup("MAPALGEBRA_EXECUTOR_MEMORY") {
            self.executor_memory = memory;
        }
        if let Some(prefix) = lookup("MAPALGEBRA_OUTPUT_PREFIX") {
            self.output_prefix = prefix;
        }
        Ok(self)
    }
}
