//! Writes to a user's collection and wishlist.
//!
//! Every path that stores specs runs the manufacturer through
//! [`resolve_or_register`](crate::manufacturers::resolve_or_register) first.
//! Ownership is checked here: another user's switch or wishlist item is
//! reported as not found.

use rusqlite::Connection;
use serde::Serialize;
use switchbook_catalog::collection_csv::{ParsedCollection, RowError};
use switchbook_catalog::types::{
    CollectionDetails, MasterSwitch, SubmissionStatus, Switch, SwitchInput, SwitchSpecs,
    WishlistInput, WishlistItem,
};
use switchbook_catalog::validation::{
    validate_details, validate_switch_input, validate_wishlist_input,
};
use switchbook_db::operations;

use crate::error::ModerationError;
use crate::manufacturers::normalize_specs;
use crate::submissions::require_master;

fn require_switch(conn: &Connection, user_id: i64, id: i64) -> Result<Switch, ModerationError> {
    operations::get_user_switch(conn, user_id, id)?
        .ok_or_else(|| ModerationError::not_found("Switch", id))
}

fn require_approved(conn: &Connection, master_switch_id: &str) -> Result<MasterSwitch, ModerationError> {
    let master = require_master(conn, master_switch_id)?;
    if master.status != SubmissionStatus::Approved {
        return Err(ModerationError::Invalid(format!(
            "Master switch '{}' is not approved",
            master.specs.name
        )));
    }
    Ok(master)
}

// Neither helper opens a transaction; callers own it.

fn insert_normalized(
    conn: &Connection,
    user_id: i64,
    input: &SwitchInput,
) -> Result<i64, ModerationError> {
    let mut input = input.clone();
    normalize_specs(conn, &mut input.specs, Some(user_id))?;
    Ok(operations::insert_switch(conn, user_id, &input, None)?)
}

fn insert_from_master(
    conn: &Connection,
    user_id: i64,
    master: &MasterSwitch,
    details: &CollectionDetails,
) -> Result<i64, ModerationError> {
    let input = SwitchInput {
        specs: master.specs.clone(),
        details: details.clone(),
    };
    Ok(operations::insert_switch(
        conn,
        user_id,
        &input,
        Some((master.id.as_str(), master.version)),
    )?)
}

// ── Collection ──────────────────────────────────────────────────────────────

pub fn create_switch(
    conn: &Connection,
    user_id: i64,
    input: &SwitchInput,
) -> Result<Switch, ModerationError> {
    validate_switch_input(input)?;

    let tx = conn.unchecked_transaction()?;
    let id = insert_normalized(&tx, user_id, input)?;
    let switch = require_switch(&tx, user_id, id)?;
    tx.commit()?;
    Ok(switch)
}

/// Replace the specs and details of one of the user's switches. The master
/// switch link, if any, is left alone.
pub fn update_switch(
    conn: &Connection,
    user_id: i64,
    id: i64,
    input: &SwitchInput,
) -> Result<Switch, ModerationError> {
    validate_switch_input(input)?;

    let tx = conn.unchecked_transaction()?;
    require_switch(&tx, user_id, id)?;
    let mut input = input.clone();
    normalize_specs(&tx, &mut input.specs, Some(user_id))?;
    operations::update_switch(&tx, id, &input)?;
    let switch = require_switch(&tx, user_id, id)?;
    tx.commit()?;
    Ok(switch)
}

pub fn delete_switch(conn: &Connection, user_id: i64, id: i64) -> Result<(), ModerationError> {
    require_switch(conn, user_id, id)?;
    operations::delete_switch(conn, id)?;
    Ok(())
}

/// Copy an APPROVED master switch into the user's collection, remembering
/// which version was copied.
pub fn add_master_to_collection(
    conn: &Connection,
    user_id: i64,
    master_switch_id: &str,
    details: &CollectionDetails,
) -> Result<Switch, ModerationError> {
    validate_details(details)?;

    let tx = conn.unchecked_transaction()?;
    let master = require_approved(&tx, master_switch_id)?;
    let id = insert_from_master(&tx, user_id, &master, details)?;
    let switch = require_switch(&tx, user_id, id)?;
    tx.commit()?;

    log::debug!("User {} added '{}' from the master database", user_id, master.specs.name);
    Ok(switch)
}

/// Re-copy specs from the linked master switch and record its current version.
pub fn sync_with_master(conn: &Connection, user_id: i64, id: i64) -> Result<Switch, ModerationError> {
    let tx = conn.unchecked_transaction()?;
    let switch = require_switch(&tx, user_id, id)?;
    let Some(master_id) = switch.master_switch_id.as_deref() else {
        return Err(ModerationError::Invalid(
            "Switch is not linked to a master switch".to_string(),
        ));
    };
    let master = require_master(&tx, master_id)?;
    operations::sync_switch_specs(&tx, id, &master.specs, master.version)?;
    let switch = require_switch(&tx, user_id, id)?;
    tx.commit()?;
    Ok(switch)
}

/// Outcome of a collection import.
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub errors: Vec<RowError>,
}

/// Insert every parsed row into the user's collection.
///
/// Rows that fail validation or manufacturer normalization are reported with
/// their line number and skipped; the rest are committed together.
pub fn import_collection(
    conn: &Connection,
    user_id: i64,
    parsed: ParsedCollection,
) -> Result<ImportReport, ModerationError> {
    let mut report = ImportReport {
        created: 0,
        errors: parsed.errors,
    };

    let tx = conn.unchecked_transaction()?;
    for (line, input) in &parsed.rows {
        let result = validate_switch_input(input)
            .map_err(ModerationError::from)
            .and_then(|()| insert_normalized(&tx, user_id, input));
        match result {
            Ok(_) => report.created += 1,
            Err(e @ (ModerationError::Validation(_) | ModerationError::Invalid(_))) => {
                report.errors.push(RowError {
                    line: *line,
                    message: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }
    tx.commit()?;

    report.errors.sort_by_key(|e| e.line);
    log::info!(
        "Imported {} switches for user {} ({} rows skipped)",
        report.created,
        user_id,
        report.errors.len()
    );
    Ok(report)
}

// ── Wishlist ────────────────────────────────────────────────────────────────

pub fn add_to_wishlist(
    conn: &Connection,
    user_id: i64,
    input: &WishlistInput,
) -> Result<WishlistItem, ModerationError> {
    validate_wishlist_input(input)?;
    if let Some(master_id) = input.master_switch_id.as_deref() {
        require_approved(conn, master_id.trim())?;
    }

    let id = operations::insert_wishlist_item(conn, user_id, input)?;
    operations::get_wishlist_item(conn, user_id, id)?
        .ok_or_else(|| ModerationError::not_found("Wishlist item", id))
}

/// Turn a wishlist entry into a collection entry and drop it from the
/// wishlist. Entries pointing at a master switch copy it; custom entries
/// become a switch with just a name and manufacturer. The item's notes
/// become the entry's personal notes unless `details` already has some.
pub fn move_wishlist_to_collection(
    conn: &Connection,
    user_id: i64,
    item_id: i64,
    details: &CollectionDetails,
) -> Result<Switch, ModerationError> {
    validate_details(details)?;

    let tx = conn.unchecked_transaction()?;
    let item = operations::get_wishlist_item(&tx, user_id, item_id)?
        .ok_or_else(|| ModerationError::not_found("Wishlist item", item_id))?;

    let mut details = details.clone();
    if details.personal_notes.as_deref().is_none_or(|n| n.trim().is_empty()) {
        details.personal_notes = item.notes.clone();
    }
    let details = &details;

    let id = match (&item.master_switch_id, &item.custom_name) {
        (Some(master_id), _) => {
            let master = require_master(&tx, master_id)?;
            insert_from_master(&tx, user_id, &master, details)?
        }
        (None, Some(name)) => {
            let input = SwitchInput {
                specs: SwitchSpecs {
                    name: name.clone(),
                    manufacturer: item.custom_manufacturer.clone(),
                    ..SwitchSpecs::default()
                },
                details: details.clone(),
            };
            insert_normalized(&tx, user_id, &input)?
        }
        (None, None) => {
            return Err(ModerationError::Invalid(
                "Wishlist item has neither a master switch nor a name".to_string(),
            ));
        }
    };

    operations::delete_wishlist_item(&tx, user_id, item_id)?;
    let switch = require_switch(&tx, user_id, id)?;
    tx.commit()?;

    log::debug!("User {} moved wishlist item {} to their collection", user_id, item_id);
    Ok(switch)
}
