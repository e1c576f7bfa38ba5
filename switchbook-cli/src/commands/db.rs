use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use crate::CliError;

use super::open_db;

/// Create the database or bring it to the current schema version.
pub(crate) fn run_db_init(db: Option<PathBuf>) -> Result<(), CliError> {
    let (conn, path) = open_db(db)?;
    let version = switchbook_db::schema::get_schema_version(&conn)?;
    log::info!(
        "{} {} (schema version {})",
        "Database ready:".if_supports_color(Stdout, |t| t.green()),
        path.display(),
        version,
    );
    Ok(())
}

pub(crate) fn run_db_stats(db: Option<PathBuf>) -> Result<(), CliError> {
    let (conn, path) = open_db(db)?;
    let stats = switchbook_db::site_stats(&conn)?;

    log::info!(
        "{}",
        "Switchbook Database Statistics".if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!("  Database: {}", path.display());
    crate::log_blank();
    log::info!("  Users:                 {:>8}", stats.users);
    log::info!("  Admins:                {:>8}", stats.admins);
    log::info!("  Collection entries:    {:>8}", stats.switches);
    log::info!("  Master switches:       {:>8}", stats.approved_master_switches);
    log::info!("  Pending submissions:   {:>8}", stats.pending_submissions);
    log::info!("  Pending edits:         {:>8}", stats.pending_edits);
    log::info!("  Manufacturers:         {:>8}", stats.manufacturers);
    log::info!(
        "  Unverified makers:     {:>8}",
        stats.unverified_manufacturers,
    );

    Ok(())
}
