use std::path::PathBuf;

use switchbook_catalog::yaml::manufacturers_dir;

use crate::CliError;

use super::open_db;

/// Default location of the curated catalog data.
fn default_catalog_dir() -> PathBuf {
    PathBuf::from("catalog")
}

/// Upsert curated manufacturers and aliases from YAML, marking them verified.
pub(crate) fn run_seed_manufacturers(
    db: Option<PathBuf>,
    dir: Option<PathBuf>,
) -> Result<(), CliError> {
    let dir = dir.unwrap_or_else(|| manufacturers_dir(&default_catalog_dir()));
    if !dir.exists() {
        log::warn!("Seed directory not found at {}; nothing to do", dir.display());
        return Ok(());
    }

    let seeds = switchbook_catalog::load_manufacturers(&dir)?;
    let (conn, _) = open_db(db)?;

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| CliError::database(e.to_string()))?;
    let stats = switchbook_db::seed_manufacturers(&tx, &seeds)?;
    tx.commit().map_err(|e| CliError::database(e.to_string()))?;

    log::info!(
        "Seeded {} manufacturers from {}: {} new, {} updated, {} aliases added",
        seeds.len(),
        dir.display(),
        stats.inserted,
        stats.updated,
        stats.aliases,
    );
    Ok(())
}
