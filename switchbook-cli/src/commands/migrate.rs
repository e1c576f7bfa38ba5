use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use crate::CliError;
use crate::progress::BarProgress;

use super::open_db;

fn dry_run_banner(dry_run: bool) {
    if dry_run {
        log::info!(
            "{}",
            "Dry run: no changes will be written".if_supports_color(Stdout, |t| t.yellow()),
        );
    }
}

pub(crate) fn run_backfill_share_ids(db: Option<PathBuf>, quiet: bool) -> Result<(), CliError> {
    let (conn, _) = open_db(db)?;
    let progress = BarProgress::new(quiet);
    let count = switchbook_moderation::backfill_shareable_ids(&conn, &progress)?;
    if count == 0 {
        log::info!("Every user already has a shareable ID");
    }
    Ok(())
}

pub(crate) fn run_normalize_manufacturers(
    db: Option<PathBuf>,
    dry_run: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let (conn, _) = open_db(db)?;
    dry_run_banner(dry_run);

    let progress = BarProgress::new(quiet);
    let report = switchbook_moderation::normalize_manufacturers(&conn, dry_run, &progress)?;

    for rename in &report.renames {
        log::info!(
            "  {} -> {} ({} records)",
            rename.from.if_supports_color(Stdout, |t| t.dimmed()),
            rename.to.if_supports_color(Stdout, |t| t.green()),
            rename.records,
        );
    }
    if !report.unmatched.is_empty() {
        crate::log_blank();
        log::warn!(
            "{} spelling(s) match no known manufacturer: {}",
            report.unmatched.len(),
            report.unmatched.join(", "),
        );
    }
    crate::log_blank();
    log::info!(
        "{} {} records across {} spellings ({} checked)",
        if dry_run { "Would update" } else { "Updated" },
        report.records_updated(),
        report.renames.len(),
        report.spellings_checked,
    );
    Ok(())
}

pub(crate) fn run_link_master_switches(
    db: Option<PathBuf>,
    dry_run: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let (conn, _) = open_db(db)?;
    dry_run_banner(dry_run);

    let progress = BarProgress::new(quiet);
    let report = switchbook_moderation::link_master_switches(&conn, dry_run, &progress)?;

    for link in &report.linked {
        log::debug!(
            "  switch {} '{}' -> master {}",
            link.switch_id,
            link.name,
            link.master_switch_id,
        );
    }
    if !report.ambiguous.is_empty() {
        log::warn!(
            "Skipped {} entries matching more than one master switch (ids: {})",
            report.ambiguous.len(),
            report
                .ambiguous
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        );
    }
    log::info!(
        "{} {} of {} unlinked entries",
        if dry_run { "Would link" } else { "Linked" },
        report.linked.len().if_supports_color(Stdout, |t| t.bold()),
        report.checked,
    );
    Ok(())
}
