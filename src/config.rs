use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;

use crate::errors::{RepositoryError, RepositoryResult};

pub const IN_MEMORY_URL: &str = ":memory:";

/// How a `StudentRepository` reaches its store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RepositoryConfig {
    /// SQLite path, or `:memory:` for a store that lives as long as the
    /// repository.
    pub database_url: String,
    /// Apply the embedded migrations when the repository opens.
    pub create_schema: bool,
    /// Log every generated statement at debug level.
    pub log_statements: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        RepositoryConfig {
            database_url: IN_MEMORY_URL.to_string(),
            create_schema: false,
            log_statements: true,
        }
    }
}

impl RepositoryConfig {
    pub fn in_memory() -> Self {
        RepositoryConfig {
            create_schema: true,
            ..Default::default()
        }
    }

    /// Reads `DATABASE_URL`, `ROSTER_CREATE_SCHEMA` and `ROSTER_LOG_STATEMENTS`,
    /// loading `.env` first. Unset variables keep their defaults.
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = RepositoryConfig::default();
        RepositoryConfig {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            create_schema: env::var("ROSTER_CREATE_SCHEMA")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.create_schema),
            log_statements: env::var("ROSTER_LOG_STATEMENTS")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.log_statements),
        }
    }

    pub fn from_json(json: &str) -> RepositoryResult<Self> {
        serde_json::from_str(json).map_err(|e| RepositoryError::Config(e.to_string()))
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url == IN_MEMORY_URL
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
