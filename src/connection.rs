use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use log::info;

use crate::config::RepositoryConfig;
use crate::errors::{RepositoryError, RepositoryResult};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub fn establish_connection(config: &RepositoryConfig) -> RepositoryResult<SqliteConnection> {
    let connection = SqliteConnection::establish(&config.database_url)?;
    info!("Opened store at {}", config.database_url);
    Ok(connection)
}

/// Applies pending migrations and returns how many ran. A store that already
/// has the schema gets zero.
pub fn run_migrations(connection: &mut SqliteConnection) -> RepositoryResult<usize> {
    let applied = connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| RepositoryError::Migration(e.to_string()))?;
    for version in &applied {
        info!("Applied migration {}", version);
    }
    Ok(applied.len())
}
