//! One-off data migrations run from the CLI.
//!
//! Each migration is idempotent: running it twice leaves the database as the
//! first run did. The two that rewrite data accept `dry_run`, which computes
//! the same report without writing anything.

use std::collections::HashMap;

use rusqlite::Connection;
use serde::Serialize;
use switchbook_catalog::manufacturer::{Resolution, normalize_key, resolve};
use switchbook_catalog::types::{MasterSwitch, SubmissionStatus};
use switchbook_db::{operations, queries};

use crate::accounts::unused_shareable_id;
use crate::error::ModerationError;
use crate::progress::MigrationProgress;

/// Give every user without a shareable ID a fresh one. Returns how many
/// users were updated.
pub fn backfill_shareable_ids(
    conn: &Connection,
    progress: &dyn MigrationProgress,
) -> Result<usize, ModerationError> {
    let user_ids = queries::users_without_shareable_id(conn)?;
    let total = user_ids.len();
    progress.on_phase(&format!("Assigning shareable IDs to {total} users"));

    let tx = conn.unchecked_transaction()?;
    for (i, user_id) in user_ids.iter().enumerate() {
        let shareable_id = unused_shareable_id(&tx)?;
        operations::set_shareable_id(&tx, *user_id, &shareable_id)?;
        progress.on_item(i + 1, total, &shareable_id);
    }
    tx.commit()?;

    progress.on_complete(&format!("Backfilled {total} shareable IDs"));
    Ok(total)
}

/// A manufacturer spelling that was (or would be) rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rename {
    pub from: String,
    pub to: String,
    pub records: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct NormalizeReport {
    pub spellings_checked: usize,
    pub renames: Vec<Rename>,
    /// Spellings that match no known manufacturer or alias. Left untouched.
    pub unmatched: Vec<String>,
}

impl NormalizeReport {
    pub fn records_updated(&self) -> usize {
        self.renames.iter().map(|r| r.records).sum()
    }
}

/// Rewrite every manufacturer string that resolves to a known manufacturer
/// but is not spelled canonically.
pub fn normalize_manufacturers(
    conn: &Connection,
    dry_run: bool,
    progress: &dyn MigrationProgress,
) -> Result<NormalizeReport, ModerationError> {
    let known = queries::known_manufacturers(conn)?;
    let spellings = queries::manufacturer_spellings(conn)?;
    let total = spellings.len();
    progress.on_phase(&format!("Checking {total} manufacturer spellings"));

    let mut report = NormalizeReport {
        spellings_checked: total,
        ..Default::default()
    };

    let tx = conn.unchecked_transaction()?;
    for (i, (spelling, count)) in spellings.into_iter().enumerate() {
        progress.on_item(i + 1, total, &spelling);
        let canonical = match resolve(&spelling, &known) {
            Resolution::Canonical { name, .. } | Resolution::Alias { name, .. } => name,
            Resolution::Unknown(_) => {
                report.unmatched.push(spelling);
                continue;
            }
        };
        if canonical == spelling {
            continue;
        }

        let records = if dry_run {
            count as usize
        } else {
            operations::rename_manufacturer_references(&tx, &spelling, &canonical)?
        };
        report.renames.push(Rename {
            from: spelling,
            to: canonical,
            records,
        });
    }
    if !dry_run {
        tx.commit()?;
    }

    progress.on_complete(&format!(
        "{} {} records across {} spellings ({} unmatched)",
        if dry_run { "Would update" } else { "Updated" },
        report.records_updated(),
        report.renames.len(),
        report.unmatched.len()
    ));
    Ok(report)
}

/// A collection entry matched to a master switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub switch_id: i64,
    pub master_switch_id: String,
    pub name: String,
}

#[derive(Debug, Default, Serialize)]
pub struct LinkReport {
    pub checked: usize,
    pub linked: Vec<Link>,
    /// Switches whose name and manufacturer match more than one master switch.
    pub ambiguous: Vec<i64>,
}

fn match_key(name: &str, manufacturer: Option<&str>) -> (String, String) {
    (
        name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase(),
        manufacturer.map(normalize_key).unwrap_or_default(),
    )
}

/// Link unlinked collection entries to the APPROVED master switch with the
/// same name and manufacturer. Entries with several candidates are reported
/// and left alone.
pub fn link_master_switches(
    conn: &Connection,
    dry_run: bool,
    progress: &dyn MigrationProgress,
) -> Result<LinkReport, ModerationError> {
    let masters = queries::master_switches_by_status(conn, Some(SubmissionStatus::Approved))?;
    let mut by_key: HashMap<(String, String), Vec<&MasterSwitch>> = HashMap::new();
    for master in &masters {
        let key = match_key(&master.specs.name, master.specs.manufacturer.as_deref());
        by_key.entry(key).or_default().push(master);
    }

    let switches = queries::unlinked_switches(conn)?;
    let total = switches.len();
    progress.on_phase(&format!(
        "Matching {total} switches against {} master switches",
        masters.len()
    ));

    let mut report = LinkReport {
        checked: total,
        ..Default::default()
    };

    let tx = conn.unchecked_transaction()?;
    for (i, switch) in switches.iter().enumerate() {
        progress.on_item(i + 1, total, &switch.specs.name);
        let key = match_key(&switch.specs.name, switch.specs.manufacturer.as_deref());
        match by_key.get(&key).map(Vec::as_slice) {
            Some([master]) => {
                if !dry_run {
                    operations::link_switch_to_master(&tx, switch.id, &master.id, master.version)?;
                }
                report.linked.push(Link {
                    switch_id: switch.id,
                    master_switch_id: master.id.clone(),
                    name: switch.specs.name.clone(),
                });
            }
            Some([_, _, ..]) => report.ambiguous.push(switch.id),
            _ => {}
        }
    }
    if !dry_run {
        tx.commit()?;
    }

    progress.on_complete(&format!(
        "{} {} of {} switches ({} ambiguous)",
        if dry_run { "Would link" } else { "Linked" },
        report.linked.len(),
        total,
        report.ambiguous.len()
    ));
    Ok(report)
}
