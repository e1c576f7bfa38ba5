//! Manufacturer name resolution and the admin workflows around it.
//!
//! Every switch or master switch write passes its manufacturer string through
//! [`resolve_or_register`]. Known names and aliases are rewritten to the
//! canonical spelling; anything else becomes a new unverified manufacturer
//! that an admin later verifies, renames, merges, or deletes.

use rusqlite::Connection;
use serde::Serialize;
use switchbook_catalog::manufacturer::{
    DEFAULT_SIMILARITY_DISTANCE, Resolution, clean_display_name, resolve, similar,
};
use switchbook_catalog::types::{Manufacturer, NotificationKind, SwitchSpecs};
use switchbook_db::{operations, queries};

use crate::error::ModerationError;
use crate::notify::{Transition, notify};

/// Map a free-text manufacturer to its canonical name, registering unknown
/// names as unverified manufacturers owned by `submitted_by_id`.
///
/// Blank input yields `None`.
pub fn resolve_or_register(
    conn: &Connection,
    input: &str,
    submitted_by_id: Option<i64>,
) -> Result<Option<String>, ModerationError> {
    if input.trim().is_empty() {
        return Ok(None);
    }

    let known = queries::known_manufacturers(conn)?;
    match resolve(input, &known) {
        Resolution::Canonical { name, .. } | Resolution::Alias { name, .. } => Ok(Some(name)),
        Resolution::Unknown(name) => {
            if switchbook_catalog::normalize_key(&name).is_empty() {
                return Err(ModerationError::Invalid(format!(
                    "'{name}' is not a valid manufacturer name"
                )));
            }
            operations::insert_manufacturer(conn, &name, false, submitted_by_id)?;
            log::info!("Registered unverified manufacturer '{}'", name);
            Ok(Some(name))
        }
    }
}

/// Rewrite `specs.manufacturer` in place through [`resolve_or_register`].
pub fn normalize_specs(
    conn: &Connection,
    specs: &mut SwitchSpecs,
    submitted_by_id: Option<i64>,
) -> Result<(), ModerationError> {
    specs.manufacturer = match specs.manufacturer.as_deref() {
        Some(name) => resolve_or_register(conn, name, submitted_by_id)?,
        None => None,
    };
    Ok(())
}

/// Result of a user proposing a manufacturer name.
#[derive(Debug, Serialize)]
pub struct ManufacturerSubmission {
    pub manufacturer: Manufacturer,
    /// False when the name resolved to an existing manufacturer.
    pub created: bool,
    /// Canonical names of existing manufacturers that look like typos of the input.
    pub similar: Vec<String>,
}

/// Propose a manufacturer. Existing names or aliases return the existing
/// record; new names are stored unverified.
pub fn submit_manufacturer(
    conn: &Connection,
    name: &str,
    user_id: i64,
) -> Result<ManufacturerSubmission, ModerationError> {
    let known = queries::known_manufacturers(conn)?;
    let (id, created) = match resolve(name, &known) {
        Resolution::Canonical { id, .. } | Resolution::Alias { id, .. } => (id, false),
        Resolution::Unknown(cleaned) => {
            (operations::insert_manufacturer(conn, &cleaned, false, Some(user_id))?, true)
        }
    };

    let similar = if created {
        similar(name, &known, DEFAULT_SIMILARITY_DISTANCE)
            .into_iter()
            .map(|(m, _)| m.name.clone())
            .collect()
    } else {
        Vec::new()
    };

    let manufacturer = operations::get_manufacturer(conn, id)?
        .ok_or_else(|| ModerationError::not_found("Manufacturer", id))?;
    Ok(ManufacturerSubmission {
        manufacturer,
        created,
        similar,
    })
}

fn require_manufacturer(conn: &Connection, id: i64) -> Result<Manufacturer, ModerationError> {
    operations::get_manufacturer(conn, id)?.ok_or_else(|| ModerationError::not_found("Manufacturer", id))
}

/// Mark a manufacturer verified and tell the user who submitted it.
/// Verifying an already verified manufacturer changes nothing.
pub fn verify_manufacturer(
    conn: &Connection,
    id: i64,
) -> Result<Transition<Manufacturer>, ModerationError> {
    let tx = conn.unchecked_transaction()?;
    let manufacturer = require_manufacturer(&tx, id)?;
    if manufacturer.verified {
        return Ok(Transition::new(manufacturer));
    }

    operations::set_manufacturer_verified(&tx, id, true)?;
    let mut emails = Vec::new();
    if let Some(submitter) = manufacturer.submitted_by_id {
        let email = notify(
            &tx,
            submitter,
            NotificationKind::ManufacturerVerified,
            "Manufacturer verified".to_string(),
            format!("The manufacturer '{}' you added has been verified.", manufacturer.name),
            None,
        )?;
        emails.extend(email);
    }
    let record = require_manufacturer(&tx, id)?;
    tx.commit()?;

    log::info!("Verified manufacturer '{}'", record.name);
    Ok(Transition { record, emails })
}

/// Admin edit of a manufacturer.
///
/// A new name takes over every switch and master switch that used the old
/// one, and the old name is kept as an alias. `aliases`, when given, replaces
/// the alias list.
pub fn update_manufacturer(
    conn: &Connection,
    id: i64,
    name: Option<&str>,
    aliases: Option<&[String]>,
) -> Result<Manufacturer, ModerationError> {
    let tx = conn.unchecked_transaction()?;
    let current = require_manufacturer(&tx, id)?;

    if let Some(aliases) = aliases {
        operations::set_manufacturer_aliases(&tx, id, aliases)?;
    }

    if let Some(new_name) = name.map(clean_display_name).filter(|n| *n != current.name) {
        operations::rename_manufacturer(&tx, id, &new_name)?;
        operations::add_manufacturer_alias(&tx, id, &current.name)?;
        let renamed = operations::rename_manufacturer_references(&tx, &current.name, &new_name)?;
        log::info!(
            "Renamed manufacturer '{}' to '{}' ({} records updated)",
            current.name,
            new_name,
            renamed
        );
    }

    let record = require_manufacturer(&tx, id)?;
    tx.commit()?;
    Ok(record)
}

/// What a merge changed.
#[derive(Debug, Serialize)]
pub struct MergeReport {
    pub target: Manufacturer,
    pub records_updated: usize,
    pub aliases_added: usize,
}

/// Fold `source_id` into `target_id`: the source's name and aliases become
/// aliases of the target, every record using them is renamed, and the source
/// is deleted.
pub fn merge_manufacturers(
    conn: &Connection,
    source_id: i64,
    target_id: i64,
) -> Result<MergeReport, ModerationError> {
    if source_id == target_id {
        return Err(ModerationError::Invalid(
            "Cannot merge a manufacturer into itself".to_string(),
        ));
    }

    let tx = conn.unchecked_transaction()?;
    let source = require_manufacturer(&tx, source_id)?;
    let target = require_manufacturer(&tx, target_id)?;

    // Free the source's name and alias keys before the target claims them
    operations::delete_manufacturer(&tx, source_id)?;

    let mut records_updated = 0;
    let mut aliases_added = 0;
    for name in std::iter::once(&source.name).chain(source.aliases.iter()) {
        if operations::add_manufacturer_alias(&tx, target_id, name)? {
            aliases_added += 1;
        }
        records_updated += operations::rename_manufacturer_references(&tx, name, &target.name)?;
    }

    let target = require_manufacturer(&tx, target_id)?;
    tx.commit()?;

    log::info!(
        "Merged manufacturer '{}' into '{}' ({} records updated)",
        source.name,
        target.name,
        records_updated
    );
    Ok(MergeReport {
        target,
        records_updated,
        aliases_added,
    })
}

/// Delete a manufacturer that no switch or master switch uses.
pub fn delete_unused_manufacturer(conn: &Connection, id: i64) -> Result<(), ModerationError> {
    let manufacturer = require_manufacturer(conn, id)?;
    let usage = queries::manufacturer_usage(conn, &manufacturer.name)?;
    if usage.total() > 0 {
        return Err(ModerationError::Conflict(format!(
            "Manufacturer '{}' is used by {} switches and {} master switches",
            manufacturer.name, usage.switches, usage.master_switches
        )));
    }
    operations::delete_manufacturer(conn, id)?;
    log::info!("Deleted manufacturer '{}'", manufacturer.name);
    Ok(())
}
