pub(crate) mod config;
pub(crate) mod db;
pub(crate) mod migrate;
pub(crate) mod seed;
pub(crate) mod serve;
pub(crate) mod user;

use std::path::PathBuf;

use rusqlite::Connection;
use switchbook_server::ServerConfig;

use crate::CliError;

/// Resolve server configuration, with `--db` taking priority.
pub(crate) fn load_config(db: Option<PathBuf>) -> Result<ServerConfig, CliError> {
    Ok(ServerConfig::load()?.with_overrides(db, None))
}

/// Open (creating or migrating if needed) the configured database.
pub(crate) fn open_db(db: Option<PathBuf>) -> Result<(Connection, PathBuf), CliError> {
    let path = load_config(db)?.database;
    let conn = switchbook_db::open_database(&path).map_err(|e| {
        CliError::database(format!("Failed to open database at {}: {}", path.display(), e))
    })?;
    log::debug!("Opened database {}", path.display());
    Ok((conn, path))
}
