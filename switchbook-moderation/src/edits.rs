//! Edit suggestions against approved master switches.
//!
//! A suggestion stores only the whitelisted fields it changes. Approving it
//! copies those fields onto the master switch, bumps the version, and
//! supersedes any other pending suggestion that touches the same fields.

use rusqlite::Connection;
use serde::Serialize;
use serde_json::{Map, Value};
use switchbook_catalog::diff::{apply_diff, compute_diff, fields_overlap};
use switchbook_catalog::types::{EditStatus, MasterSwitchEdit, NotificationKind, SubmissionStatus, User};
use switchbook_catalog::validation::validate_specs;
use switchbook_db::{operations, queries};

use crate::error::ModerationError;
use crate::manufacturers::normalize_specs;
use crate::notify::{Transition, master_switch_link, notify};
use crate::submissions::{require_admin, require_master};

fn require_edit(conn: &Connection, id: &str) -> Result<MasterSwitchEdit, ModerationError> {
    operations::get_edit(conn, id)?.ok_or_else(|| ModerationError::not_found("Edit", id))
}

fn require_pending(edit: &MasterSwitchEdit) -> Result<(), ModerationError> {
    if edit.status == EditStatus::Pending {
        Ok(())
    } else {
        Err(ModerationError::NotPending {
            entity_type: "Edit",
            status: edit.status.as_str(),
        })
    }
}

/// Propose changes to an APPROVED master switch.
///
/// `changes` maps serialized spec field names to new values; keys outside the
/// edit whitelist are ignored. The suggestion is rejected if, after manufacturer
/// normalization, nothing differs from the current record.
pub fn suggest_edit(
    conn: &Connection,
    user_id: i64,
    master_switch_id: &str,
    changes: &Map<String, Value>,
) -> Result<MasterSwitchEdit, ModerationError> {
    let tx = conn.unchecked_transaction()?;
    let master = require_master(&tx, master_switch_id)?;
    if master.status != SubmissionStatus::Approved {
        return Err(ModerationError::Invalid(
            "Only approved master switches can be edited".to_string(),
        ));
    }

    let mut proposed = apply_diff(&master.specs, changes)
        .map_err(|e| ModerationError::Invalid(format!("Invalid edit: {e}")))?;
    validate_specs(&proposed)?;
    normalize_specs(&tx, &mut proposed, Some(user_id))?;

    let diff = compute_diff(&master.specs, &proposed)?;
    if diff.is_empty() {
        return Err(ModerationError::EmptyEdit);
    }

    let id = operations::insert_edit(&tx, master_switch_id, user_id, &diff)?;
    let edit = require_edit(&tx, &id)?;
    tx.commit()?;

    log::info!(
        "User {} suggested an edit to '{}' changing {}",
        user_id,
        master.specs.name,
        edit.changed_fields.join(", ")
    );
    Ok(edit)
}

/// What approving an edit did.
#[derive(Debug, Serialize)]
pub struct EditApproval {
    pub edit: MasterSwitchEdit,
    pub master_version: i64,
    /// IDs of pending edits closed as SUPERSEDED.
    pub superseded: Vec<String>,
}

/// Apply a PENDING edit to its master switch.
pub fn approve_edit(
    conn: &Connection,
    admin: &User,
    edit_id: &str,
) -> Result<Transition<EditApproval>, ModerationError> {
    require_admin(admin)?;

    let tx = conn.unchecked_transaction()?;
    let edit = require_edit(&tx, edit_id)?;
    require_pending(&edit)?;
    let master = require_master(&tx, &edit.master_switch_id)?;

    let updated = apply_diff(&master.specs, &edit.new_data)?;
    let master_version = operations::update_master_switch_specs(&tx, &master.id, &updated)?;
    operations::close_edit(&tx, edit_id, EditStatus::Approved, Some(admin.id), None)?;

    let mut superseded = Vec::new();
    for other in queries::edits_for_master(&tx, &master.id, Some(EditStatus::Pending))? {
        if fields_overlap(&other.changed_fields, &edit.changed_fields)
            && operations::close_edit(&tx, &other.id, EditStatus::Superseded, None, None)? {
            superseded.push(other.id);
        }
    }

    let mut emails = Vec::new();
    emails.extend(notify(
        &tx,
        edit.edited_by_id,
        NotificationKind::EditApproved,
        "Edit approved".to_string(),
        format!(
            "Your edit to '{}' was approved ({}).",
            updated.name,
            edit.changed_fields.join(", ")
        ),
        Some(master_switch_link(&master.id)),
    )?);

    let edit = require_edit(&tx, edit_id)?;
    tx.commit()?;

    log::info!(
        "{} approved edit {} to '{}', now version {} ({} superseded)",
        admin.username,
        edit_id,
        updated.name,
        master_version,
        superseded.len()
    );
    Ok(Transition {
        record: EditApproval {
            edit,
            master_version,
            superseded,
        },
        emails,
    })
}

/// Reject a PENDING edit with an optional reason.
pub fn reject_edit(
    conn: &Connection,
    admin: &User,
    edit_id: &str,
    reason: Option<&str>,
) -> Result<Transition<MasterSwitchEdit>, ModerationError> {
    require_admin(admin)?;
    let reason = reason.map(str::trim).filter(|r| !r.is_empty());

    let tx = conn.unchecked_transaction()?;
    let edit = require_edit(&tx, edit_id)?;
    require_pending(&edit)?;
    let master = require_master(&tx, &edit.master_switch_id)?;
    operations::close_edit(&tx, edit_id, EditStatus::Rejected, Some(admin.id), reason)?;

    let message = match reason {
        Some(reason) => format!(
            "Your edit to '{}' was rejected. Reason: {}",
            master.specs.name, reason
        ),
        None => format!("Your edit to '{}' was rejected.", master.specs.name),
    };
    let emails: Vec<_> = notify(
        &tx,
        edit.edited_by_id,
        NotificationKind::EditRejected,
        "Edit rejected".to_string(),
        message,
        Some(master_switch_link(&master.id)),
    )?
    .into_iter()
    .collect();

    let record = require_edit(&tx, edit_id)?;
    tx.commit()?;

    log::info!("{} rejected edit {} to '{}'", admin.username, edit_id, master.specs.name);
    Ok(Transition { record, emails })
}
