// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Node configuration, read from TOML. Every field has a default so a missing
//! file or a partial file is valid.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Env var naming the config file.
pub const CONFIG_ENV: &str = "MODKIT_CONFIG";
/// Config path when the env var is unset.
pub const DEFAULT_CONFIG_PATH: &str = "./modkit.toml";

/// Config errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level config.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// `[node]`
    pub node: NodeSection,
    /// `[chain]`
    pub chain: ChainSection,
    /// `[http]`
    pub http: HttpSection,
    /// `[logging]`
    pub logging: LoggingConfig,
    /// `[ante]`
    pub ante: AnteSection,
}

/// `[node]`
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    /// Node name, logged at startup.
    pub name: String,
    /// sled directory.
    pub data_dir: PathBuf,
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            name: "modkit-node".into(),
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// `[chain]`
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ChainSection {
    /// Chain id bound into sign bytes.
    pub chain_id: String,
    /// Genesis JSON imported on first start.
    pub genesis_path: Option<PathBuf>,
}

impl Default for ChainSection {
    fn default() -> Self {
        Self {
            chain_id: "amunchain-local".into(),
            genesis_path: None,
        }
    }
}

/// `[http]`
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    /// Bind address for `/metrics` and `/capabilities`.
    pub listen_addr: String,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:9615".into(),
        }
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single line.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

/// `[logging]`
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Max level (`trace` .. `error`).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            level: "info".into(),
        }
    }
}

/// `[ante]`
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AnteSection {
    /// Append the signature verification stage.
    pub verify_signatures: bool,
    /// Decode cap for raw transactions.
    pub max_tx_bytes: usize,
}

impl Default for AnteSection {
    fn default() -> Self {
        Self {
            verify_signatures: true,
            max_tx_bytes: 1024 * 1024,
        }
    }
}

impl NodeConfig {
    /// Parse TOML text.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load from `MODKIT_CONFIG` or the default path.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(Path::new(&path))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.chain.chain_id.is_empty() {
            return Err(ConfigError::Invalid("chain.chain_id must not be empty".into()));
        }
        if self.ante.max_tx_bytes == 0 {
            return Err(ConfigError::Invalid("ante.max_tx_bytes must be positive".into()));
        }
        Ok(())
    }
}
