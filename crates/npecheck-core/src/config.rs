//! Configuration loading from npecheck.toml.

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "npecheck.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub npecheck: NpecheckConfig,
    pub rules: RulesConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NpecheckConfig {
    /// Cap on reported diagnostics. `0` = unlimited.
    pub max_diagnostics: usize,
    pub skip_generated: bool,
    pub skip_tests: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub npe: NpeConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NpeConfig {
    pub enabled: bool,
    /// Function display names (`Name` or `Recv.Name`) excluded from
    /// analysis. A trailing `*` matches by prefix.
    pub ignore_functions: Vec<String>,
}

impl Default for NpecheckConfig {
    fn default() -> Self {
        Self {
            max_diagnostics: 0,
            skip_generated: true,
            skip_tests: false,
        }
    }
}

impl Default for NpeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ignore_functions: Vec::new(),
        }
    }
}

impl NpeConfig {
    pub fn is_ignored(&self, function: &str) -> bool {
        self.ignore_functions
            .iter()
            .any(|pattern| match pattern.strip_suffix('*') {
                Some(prefix) => function.starts_with(prefix),
                None => function == pattern,
            })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Find and load npecheck.toml, walking up from `start_dir`, then falling
/// back to the user config directory. Returns the default config if no
/// file is found.
pub fn load_config(start_dir: &Path) -> Result<Config, ConfigError> {
    match find_config_file(start_dir).or_else(user_config_file) {
        Some(path) => load_config_file(&path),
        None => Ok(Config::default()),
    }
}

pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Walk up directories looking for npecheck.toml.
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// `<config dir>/npecheck/npecheck.toml`, if it exists.
fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("npecheck").join(CONFIG_FILE_NAME))
        .filter(|p| p.is_file())
}

/// Default TOML content for `npecheck init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"[npecheck]
# 0 = unlimited
max_diagnostics = 0
skip_generated = true
skip_tests = false

[rules.npe]
enabled = true
# Functions excluded from analysis; a trailing `*` matches by prefix.
# ignore_functions = ["Order.legacy*", "mustInit"]
ignore_functions = []
"#;
