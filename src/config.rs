use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::model::{default_relationships, RelationshipIndex, RelationshipType};
use crate::session::BuildSession;

/// Environment variable pointing at the configuration file.
pub const CONFIG_ENV: &str = "TRACEABLES_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub traceables: TraceablesConfig,
    /// Relationship declarations, in order. The built-in set applies when
    /// the file declares none.
    #[serde(default = "default_relationships")]
    pub relationships: Vec<RelationshipType>,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub matrix: MatrixConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraceablesConfig {
    /// Root directory scanned for source documents. Relative paths are
    /// taken relative to the configuration file.
    pub source_folder: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// Default page limits for matrices; 0 means no limit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatrixConfig {
    #[serde(default)]
    pub max_primaries: usize,
    #[serde(default)]
    pub max_secondaries: usize,
}

impl MatrixConfig {
    pub fn max_primaries(&self) -> Option<usize> {
        (self.max_primaries > 0).then_some(self.max_primaries)
    }

    pub fn max_secondaries(&self) -> Option<usize> {
        (self.max_secondaries > 0).then_some(self.max_secondaries)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphConfig {
    /// Hop limit for relationships requested without one.
    #[serde(default)]
    pub default_max_depth: Option<usize>,
    /// DOT node attributes by category, merged over the built-in
    /// `__default__` and `__unresolved__` styles.
    #[serde(default)]
    pub styles: BTreeMap<String, BTreeMap<String, toml::Value>>,
}

/// DOT node attributes by style name.
pub type NodeStyles = BTreeMap<String, BTreeMap<String, String>>;

pub const DEFAULT_STYLE: &str = "__default__";
pub const UNRESOLVED_STYLE: &str = "__unresolved__";

impl GraphConfig {
    /// Built-in styles with the configured ones merged over them.
    pub fn node_styles(&self) -> NodeStyles {
        let mut styles = default_node_styles();
        for (name, attributes) in &self.styles {
            let style = styles.entry(name.clone()).or_default();
            for (key, value) in attributes {
                let text = match value {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                style.insert(key.clone(), text);
            }
        }
        styles
    }
}

pub fn default_node_styles() -> NodeStyles {
    fn style(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    let mut styles = BTreeMap::new();
    styles.insert(
        DEFAULT_STYLE.to_string(),
        style(&[("shape", "box"), ("textwrap", "16")]),
    );
    styles.insert(
        UNRESOLVED_STYLE.to_string(),
        style(&[
            ("shape", "box"),
            ("style", "filled"),
            ("color", "gray80"),
            ("fillcolor", "white"),
            ("fontcolor", "gray30"),
        ]),
    );
    styles
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cache_capacity() -> usize {
    128
}

fn default_debounce_ms() -> u64 {
    500
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in TRACEABLES_CONFIG environment variable
    /// 2. ./traceables.toml in current directory
    pub fn load() -> Result<Self> {
        Self::load_with_override(None)
    }

    /// Like [`Config::load`], but an explicit `path` (e.g. from `--config`)
    /// takes precedence over `TRACEABLES_CONFIG` and the default file.
    pub fn load_with_override(path: Option<&Path>) -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => std::env::var(CONFIG_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("traceables.toml")),
        };

        Self::load_from(&config_path)
    }

    /// Load and validate the configuration at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config = Self::parse(&config_str)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if config.traceables.source_folder.is_relative() {
            if let Some(parent) = path.parent() {
                config.traceables.source_folder = parent.join(&config.traceables.source_folder);
            }
        }

        config.validate()?;

        Ok(config)
    }

    /// Parse configuration text without validating it.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid configuration")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let folder = &self.traceables.source_folder;
        if !folder.exists() {
            anyhow::bail!(
                "source_folder path does not exist: {}. Set source_folder in traceables.toml to your docs directory.",
                folder.display()
            );
        }

        if !folder.is_dir() {
            anyhow::bail!(
                "source_folder must be a directory, not a file: {}",
                folder.display()
            );
        }

        RelationshipIndex::new(self.relationships.clone())
            .context("Invalid [[relationships]] declarations")?;

        if self.filter.cache_capacity == 0 {
            anyhow::bail!("filter.cache_capacity must be greater than 0");
        }

        Ok(())
    }

    /// Get the docs root path
    pub fn source_folder(&self) -> &Path {
        &self.traceables.source_folder
    }

    /// Fresh, empty session using the configured relationships.
    pub fn build_session(&self) -> crate::Result<BuildSession> {
        BuildSession::new(self.relationships.clone(), self.filter.cache_capacity)
    }
}
