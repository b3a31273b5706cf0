//! `finqa.toml` configuration.
//!
//! Every value is optional. Command-line flags override file values, which
//! override built-in defaults. The binary applies that precedence; this module
//! only parses files.
//!
//! ```toml
//! [responder]
//! model = "llama3.1:8b"
//! base_url = "http://localhost:11434/v1"
//! timeout_secs = 120
//! max_steps = 10
//!
//! [judge]
//! model = "gpt-4o"
//! max_tokens = 300
//!
//! [grading]
//! concurrency = 8
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project-local config file.
pub const CONFIG_FILE_NAME: &str = "finqa.toml";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Root of `finqa.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct FinqaConfig {
    pub responder: Option<BackendToml>,
    pub judge: Option<BackendToml>,
    pub grading: Option<GradingToml>,
}

impl FinqaConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given, else `./finqa.toml` if it exists, else defaults.
    ///
    /// An explicitly requested file must exist; the implicit one is optional.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                Self::load(path)
            }
            None => {
                let local = Path::new(CONFIG_FILE_NAME);
                if local.is_file() {
                    log::info!("Loading config from {}", local.display());
                    Self::load(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn responder(&self) -> BackendToml {
        self.responder.clone().unwrap_or_default()
    }

    pub fn judge(&self) -> BackendToml {
        self.judge.clone().unwrap_or_default()
    }

    pub fn grading(&self) -> GradingToml {
        self.grading.clone().unwrap_or_default()
    }
}

/// Backend settings for the responder or the judge.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct BackendToml {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
    /// Agentic loop step limit (responder only)
    pub max_steps: Option<usize>,
}

/// Grading settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct GradingToml {
    pub concurrency: Option<usize>,
}
