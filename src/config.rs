// File: src/config.rs
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides [`Config::store_path`].
pub const STORE_PATH_ENV: &str = "TREKIPSUM_STORE";

const DEFAULT_STORE_PATH: &str = "assets/dialog.sqlite";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite file holding the chain store.
    pub store_path: PathBuf,
    /// Default log filter when no `-v` flag or `RUST_LOG` is given.
    pub log_level: String,
    /// Lines printed per `generate` run.
    pub count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            log_level: "warn".to_string(),
            count: 1,
        }
    }
}

impl Config {
    /// Reads a JSON config file, falling back to defaults when it is absent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Self::default()
        };
        if let Ok(store) = env::var(STORE_PATH_ENV) {
            config.store_path = PathBuf::from(store);
        }
        Ok(config)
    }
}
