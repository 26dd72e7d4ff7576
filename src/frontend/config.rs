use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::performance::cache::{DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_CONTRACTS};

pub const CONFIG_FILE_NAME: &str = ".xmlcontract.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },

    #[error("invalid path pattern '{pattern}': {source}")]
    Pattern { pattern: String, source: glob::PatternError },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub resolve: ResolveConfig,

    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,

    /// Hard ceiling on contract ids; exceeding it aborts the run.
    #[serde(default = "default_max_contracts")]
    pub max_contracts: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveConfig {
    #[serde(default = "default_true")]
    pub include_primitives: bool,

    #[serde(default = "default_true")]
    pub register_common_implementations: bool,

    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Worker threads for parallel resolution (0 = one per core)
    #[serde(default)]
    pub workers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default = "default_100")]
    pub max_errors: usize,

    #[serde(default = "default_false")]
    pub warnings_as_errors: bool,

    /// Diagnostic codes to drop, e.g. `"DCS103"`.
    #[serde(default)]
    pub suppress: Vec<String>,

    #[serde(default = "default_true")]
    pub report_unsupported: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default = "default_true")]
    pub color: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            other => Err(format!("unknown output format '{}' (expected json or text)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Model files picked up when a directory is given.
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { initial_capacity: DEFAULT_INITIAL_CAPACITY, max_contracts: DEFAULT_MAX_CONTRACTS }
    }
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self { include_primitives: true, register_common_implementations: true, parallel: true, workers: 0 }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { max_errors: 100, warnings_as_errors: false, suppress: Vec::new(), report_unsupported: true }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { format: OutputFormat::Json, color: true }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self { include: vec!["**/*.json".to_string()], exclude: vec!["**/target/**".to_string()] }
    }
}

fn default_true() -> bool { true }
fn default_false() -> bool { false }
fn default_100() -> usize { 100 }
fn default_initial_capacity() -> usize { DEFAULT_INITIAL_CAPACITY }
fn default_max_contracts() -> usize { DEFAULT_MAX_CONTRACTS }

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Find and load `.xmlcontract.toml` from the current directory or its parents
    pub fn discover() -> Self {
        match std::env::current_dir() {
            Ok(dir) => Self::discover_from(&dir),
            Err(_) => Self::default(),
        }
    }

    pub fn discover_from(start: &Path) -> Self {
        let mut current = Some(start.to_path_buf());
        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                match Self::load(&config_path) {
                    Ok(config) => {
                        tracing::debug!(path = %config_path.display(), "config discovered");
                        return config;
                    }
                    Err(error) => tracing::warn!(path = %config_path.display(), %error, "ignoring invalid config"),
                }
            }
            current = dir.parent().map(|p| p.to_path_buf());
        }
        Self::default()
    }

    /// Whether a model file found under a directory should be loaded
    pub fn should_load(&self, path: &Path) -> Result<bool, ConfigError> {
        let options = glob::MatchOptions { require_literal_separator: false, ..Default::default() };
        let normalized = path.to_string_lossy().replace('\\', "/");
        for pattern in &self.paths.exclude {
            if compile(pattern)?.matches_with(&normalized, options) {
                return Ok(false);
            }
        }
        if self.paths.include.is_empty() {
            return Ok(true);
        }
        for pattern in &self.paths.include {
            if compile(pattern)?.matches_with(&normalized, options) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Generate default configuration file content
    pub fn generate_default() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_else(|_| String::from("# Failed to generate config"))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })
    }
}

fn compile(pattern: &str) -> Result<glob::Pattern, ConfigError> {
    glob::Pattern::new(pattern).map_err(|source| ConfigError::Pattern { pattern: pattern.to_string(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.resolve.include_primitives);
        assert_eq!(config.diagnostics.max_errors, 100);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[resolve]
parallel = false
workers = 2

[diagnostics]
suppress = ["DCS103"]
warnings_as_errors = true

[output]
format = "text"
"#;
        let config = Config::parse(toml).unwrap();
        assert!(!config.resolve.parallel);
        assert_eq!(config.resolve.workers, 2);
        assert!(config.resolve.register_common_implementations);
        assert_eq!(config.diagnostics.suppress, vec!["DCS103".to_string()]);
        assert!(config.diagnostics.warnings_as_errors);
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(config.cache.max_contracts, DEFAULT_MAX_CONTRACTS);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(Config::parse("[output]\nformat = \"xml\""), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_generate_default_round_trips() {
        let text = Config::generate_default();
        assert_eq!(Config::parse(&text).unwrap(), Config::default());
    }

    #[test]
    fn test_should_load() {
        let config = Config::default();
        assert!(config.should_load(Path::new("models/shop/order.json")).unwrap());
        assert!(!config.should_load(Path::new("models/readme.md")).unwrap());
        assert!(!config.should_load(Path::new("crate/target/debug/out.json")).unwrap());
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
