//! Account creation, shareable IDs, and role changes.

use rusqlite::Connection;
use switchbook_catalog::share::generate_shareable_id;
use switchbook_catalog::types::{Role, User};
use switchbook_catalog::validation::{validate_email, validate_username};
use switchbook_db::operations;

use crate::error::ModerationError;
use crate::submissions::require_admin;

const SHAREABLE_ID_ATTEMPTS: usize = 8;

pub(crate) fn unused_shareable_id(conn: &Connection) -> Result<String, ModerationError> {
    for _ in 0..SHAREABLE_ID_ATTEMPTS {
        let candidate = generate_shareable_id();
        if operations::find_user_by_shareable_id(conn, &candidate)?.is_none() {
            return Ok(candidate);
        }
    }
    Err(ModerationError::Conflict(
        "Could not generate a unique shareable ID".to_string(),
    ))
}

fn require_user(conn: &Connection, id: i64) -> Result<User, ModerationError> {
    operations::get_user(conn, id)?.ok_or_else(|| ModerationError::not_found("User", id))
}

/// Register a user. The password must already be hashed; the caller checks
/// its length before hashing.
pub fn create_account(
    conn: &Connection,
    username: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> Result<User, ModerationError> {
    let username = username.trim();
    let email = email.trim();
    validate_username(username)?;
    validate_email(email)?;

    let tx = conn.unchecked_transaction()?;
    let shareable_id = unused_shareable_id(&tx)?;
    let id = operations::insert_user(&tx, username, email, password_hash, role, &shareable_id)?;
    let user = require_user(&tx, id)?;
    tx.commit()?;

    log::info!("Created {} account '{}'", user.role.as_str(), user.username);
    Ok(user)
}

/// Give a user a fresh shareable ID, invalidating old share links.
pub fn regenerate_shareable_id(conn: &Connection, user_id: i64) -> Result<String, ModerationError> {
    let tx = conn.unchecked_transaction()?;
    require_user(&tx, user_id)?;
    let shareable_id = unused_shareable_id(&tx)?;
    operations::set_shareable_id(&tx, user_id, &shareable_id)?;
    tx.commit()?;
    Ok(shareable_id)
}

/// Set another user's role. Admins cannot demote themselves, which keeps at
/// least the acting admin in place.
pub fn change_role(
    conn: &Connection,
    admin: &User,
    user_id: i64,
    role: Role,
) -> Result<User, ModerationError> {
    require_admin(admin)?;
    if admin.id == user_id && !role.is_admin() {
        return Err(ModerationError::Invalid(
            "You cannot remove your own admin role".to_string(),
        ));
    }

    let user = require_user(conn, user_id)?;
    if user.role != role {
        operations::set_user_role(conn, user_id, role)?;
        log::info!(
            "{} changed the role of '{}' to {}",
            admin.username,
            user.username,
            role.as_str()
        );
    }
    require_user(conn, user_id)
}
