// Configuration
// Connection settings for both backends plus the maximum server delay.
// Loaded from a JSON file; anything missing falls back to the defaults below.

use crate::error::{QueryError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Settings for connecting to MySQL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MySqlConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub db: String,
}

impl Default for MySqlConfig {
    fn default() -> Self {
        Self {
            host: "host".to_string(),
            user: "user".to_string(),
            password: "password".to_string(),
            db: "db".to_string(),
        }
    }
}

/// Settings for connecting to MongoDB
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MongoConfig {
    pub host: String,
    pub port: u16,
    pub db: String,
    /// Collections to search. When empty, every non-system collection
    /// of the database is discovered at connect time.
    pub collections: Vec<String>,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            host: "host".to_string(),
            port: 27017,
            db: "db".to_string(),
            collections: vec!["collection".to_string()],
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub mysql: MySqlConfig,
    pub mongo: MongoConfig,
    /// Maximum server delay, in milliseconds
    pub max_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mysql: MySqlConfig::default(),
            mongo: MongoConfig::default(),
            max_delay_ms: 30_000,
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| QueryError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Parse a configuration from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| QueryError::Config(e.to_string()))
    }

    /// How long MongoDB may take to select a server
    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// MySQL connect timeout: the max delay in whole seconds, never zero
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs((self.max_delay_ms / 1000).max(1))
    }
}
