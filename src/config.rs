//! Configuration for the rateware server
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (RATEWARE_*)
//! 3. Config file (rateware.toml by default)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "rateware.toml";

/// 2.5 MiB
pub const DEFAULT_FORM_LIMIT: usize = 2_621_440;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,

    /// Directory served under /assets
    pub assets_dir: PathBuf,

    /// Largest accepted form body in bytes
    pub form_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3004".to_string(),
            assets_dir: PathBuf::from("assets"),
            form_limit: DEFAULT_FORM_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "rateware.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleBackend {
    /// Score in-process from the artifact file
    Artifact,
    /// Forward to a model server
    Http,
}

/// Which oracle serves predictions, and where it lives
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OracleConfig {
    pub backend: OracleBackend,
    pub artifact_path: PathBuf,
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            backend: OracleBackend::Artifact,
            artifact_path: PathBuf::from("data/predict.json"),
            endpoint: None,
            timeout_secs: 10,
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// tracing-subscriber filter directive, used when RUST_LOG is unset
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub oracle: OracleConfig,
    pub log: LogConfig,
}

/// Values given on the command line; `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub addr: Option<String>,
    pub database: Option<String>,
    pub artifact: Option<PathBuf>,
    pub oracle_url: Option<String>,
}

impl Config {
    /// Load from `path`, or from the default file when it exists.
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load_from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - RATEWARE_ADDR: listen address
    /// - RATEWARE_DATABASE: SQLite file
    /// - RATEWARE_ARTIFACT: prediction artifact path
    /// - RATEWARE_ORACLE_URL: model server endpoint, switches to the http backend
    /// - RATEWARE_LOG: log filter
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(addr) = lookup("RATEWARE_ADDR") {
            self.server.addr = addr;
        }
        if let Some(path) = lookup("RATEWARE_DATABASE") {
            self.database.path = path;
        }
        if let Some(path) = lookup("RATEWARE_ARTIFACT") {
            self.oracle.artifact_path = PathBuf::from(path);
        }
        if let Some(url) = lookup("RATEWARE_ORACLE_URL") {
            self.oracle.backend = OracleBackend::Http;
            self.oracle.endpoint = Some(url);
        }
        if let Some(filter) = lookup("RATEWARE_LOG") {
            self.log.filter = filter;
        }
        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, cli: CliOverrides) -> Self {
        if let Some(addr) = cli.addr {
            self.server.addr = addr;
        }
        if let Some(path) = cli.database {
            self.database.path = path;
        }
        if let Some(path) = cli.artifact {
            self.oracle.artifact_path = path;
        }
        if let Some(url) = cli.oracle_url {
            self.oracle.backend = OracleBackend::Http;
            self.oracle.endpoint = Some(url);
        }
        self
    }
}
