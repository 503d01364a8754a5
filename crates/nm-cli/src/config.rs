//! Node configuration loaded from an optional TOML file.
//!
//! Resolution order: explicit `--config` path, then the `NODEMIND_CONFIG`
//! environment variable, then built-in defaults. Every key is optional.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nm_core::{EngineConfig, ReasoningEngine};
use serde::Deserialize;

pub const CONFIG_ENV: &str = "NODEMIND_CONFIG";

/// Symbol that holds the node's name.
const NAME_SYMBOL: &str = "nombre";
/// Symbol that holds the node's description.
const DESCRIPTION_SYMBOL: &str = "descripción";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub name: Option<String>,
    pub description: Option<String>,
    pub engine: EngineConfig,
    /// Symbols learned at startup, tagged `token`.
    pub dictionary: BTreeMap<String, String>,
}

impl NodeConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid config TOML")
    }

    /// Load from `path`, or from `$NODEMIND_CONFIG`, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        tracing::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// A fresh engine seeded with the node identity and dictionary.
    pub fn build_engine(&self) -> ReasoningEngine {
        let mut engine = ReasoningEngine::with_config(self.engine);
        if let Some(name) = &self.name {
            engine.seed_meta(NAME_SYMBOL, name);
        }
        if let Some(description) = &self.description {
            engine.seed_meta(DESCRIPTION_SYMBOL, description);
        }
        let seeded = engine.seed_dictionary(&self.dictionary);
        if seeded > 0 {
            tracing::info!("learned {seeded} symbols from the configured dictionary");
        }
        engine
    }
}
