//! Master-switch submissions and their moderation.
//!
//! ```text
//! PENDING ──approve──▶ APPROVED   (version + 1)
//!    │
//!    └────reject───▶ REJECTED
//! ```
//!
//! Both transitions require an admin and a PENDING record, and each leaves a
//! notification for the submitter.

use rusqlite::Connection;
use switchbook_catalog::types::{MasterSwitch, NotificationKind, SubmissionStatus, SwitchSpecs, User};
use switchbook_catalog::validation::validate_specs;
use switchbook_db::operations;

use crate::error::ModerationError;
use crate::manufacturers::normalize_specs;
use crate::notify::{Transition, master_switch_link, notify};

pub(crate) fn require_admin(user: &User) -> Result<(), ModerationError> {
    if user.role.is_admin() {
        Ok(())
    } else {
        Err(ModerationError::Forbidden)
    }
}

pub(crate) fn require_master(conn: &Connection, id: &str) -> Result<MasterSwitch, ModerationError> {
    operations::get_master_switch(conn, id)?
        .ok_or_else(|| ModerationError::not_found("Master switch", id))
}

fn require_pending(master: &MasterSwitch) -> Result<(), ModerationError> {
    if master.status == SubmissionStatus::Pending {
        Ok(())
    } else {
        Err(ModerationError::NotPending {
            entity_type: "Master switch",
            status: master.status.as_str(),
        })
    }
}

/// Submit a new master switch for review. It starts PENDING at version 0.
pub fn submit_master_switch(
    conn: &Connection,
    user_id: i64,
    specs: &SwitchSpecs,
) -> Result<MasterSwitch, ModerationError> {
    validate_specs(specs)?;

    let tx = conn.unchecked_transaction()?;
    let mut specs = specs.clone();
    normalize_specs(&tx, &mut specs, Some(user_id))?;
    let id = operations::insert_master_switch(&tx, &specs, user_id)?;
    let master = require_master(&tx, &id)?;
    tx.commit()?;

    log::info!("User {} submitted master switch '{}' ({})", user_id, master.specs.name, id);
    Ok(master)
}

/// Approve a PENDING submission: status becomes APPROVED and the version
/// goes up by one.
pub fn approve_submission(
    conn: &Connection,
    admin: &User,
    id: &str,
) -> Result<Transition<MasterSwitch>, ModerationError> {
    require_admin(admin)?;

    let tx = conn.unchecked_transaction()?;
    let master = require_master(&tx, id)?;
    require_pending(&master)?;
    if !operations::approve_master_switch(&tx, id, admin.id)? {
        return Err(ModerationError::NotPending {
            entity_type: "Master switch",
            status: master.status.as_str(),
        });
    }

    let mut emails = Vec::new();
    if let Some(submitter) = master.submitted_by_id {
        emails.extend(notify(
            &tx,
            submitter,
            NotificationKind::SubmissionApproved,
            "Submission approved".to_string(),
            format!(
                "Your submission '{}' was approved and is now in the master database.",
                master.specs.name
            ),
            Some(master_switch_link(id)),
        )?);
    }
    let record = require_master(&tx, id)?;
    tx.commit()?;

    log::info!(
        "{} approved master switch '{}' ({}), now version {}",
        admin.username,
        record.specs.name,
        id,
        record.version
    );
    Ok(Transition { record, emails })
}

/// Reject a PENDING submission with an optional reason.
pub fn reject_submission(
    conn: &Connection,
    admin: &User,
    id: &str,
    reason: Option<&str>,
) -> Result<Transition<MasterSwitch>, ModerationError> {
    require_admin(admin)?;
    let reason = reason.map(str::trim).filter(|r| !r.is_empty());

    let tx = conn.unchecked_transaction()?;
    let master = require_master(&tx, id)?;
    require_pending(&master)?;
    if !operations::reject_master_switch(&tx, id, reason)? {
        return Err(ModerationError::NotPending {
            entity_type: "Master switch",
            status: master.status.as_str(),
        });
    }

    let mut emails = Vec::new();
    if let Some(submitter) = master.submitted_by_id {
        let message = match reason {
            Some(reason) => format!(
                "Your submission '{}' was rejected. Reason: {}",
                master.specs.name, reason
            ),
            None => format!("Your submission '{}' was rejected.", master.specs.name),
        };
        emails.extend(notify(
            &tx,
            submitter,
            NotificationKind::SubmissionRejected,
            "Submission rejected".to_string(),
            message,
            Some(master_switch_link(id)),
        )?);
    }
    let record = require_master(&tx, id)?;
    tx.commit()?;

    log::info!("{} rejected master switch '{}' ({})", admin.username, record.specs.name, id);
    Ok(Transition { record, emails })
}

/// Fetch a master switch for display.
///
/// APPROVED records are public and each view is counted. PENDING and
/// REJECTED records are visible only to their submitter and to admins;
/// everyone else gets `NotFound`.
pub fn view_master_switch(
    conn: &Connection,
    viewer: Option<&User>,
    id: &str,
) -> Result<MasterSwitch, ModerationError> {
    let master = require_master(conn, id)?;
    if master.status == SubmissionStatus::Approved {
        operations::increment_master_view_count(conn, id)?;
        return require_master(conn, id);
    }

    let allowed = viewer.is_some_and(|v| v.role.is_admin() || master.submitted_by_id == Some(v.id));
    if allowed {
        Ok(master)
    } else {
        Err(ModerationError::not_found("Master switch", id))
    }
}
