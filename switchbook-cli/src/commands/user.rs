use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use switchbook_catalog::types::Role;
use switchbook_catalog::validation::validate_password;

use crate::CliError;

use super::open_db;

pub(crate) fn run_user_create(
    db: Option<PathBuf>,
    username: &str,
    email: &str,
    password: &str,
    admin: bool,
) -> Result<(), CliError> {
    validate_password(password).map_err(|e| CliError::other(e.to_string()))?;
    let hash = switchbook_server::hash_password(password)
        .map_err(|e| CliError::other(format!("Failed to hash password: {}", e)))?;
    let role = if admin { Role::Admin } else { Role::User };

    let (conn, _) = open_db(db)?;
    let user = switchbook_moderation::create_account(&conn, username, email, &hash, role)?;
    log::info!(
        "  {} id {}, share ID {}",
        user.username.if_supports_color(Stdout, |t| t.bold()),
        user.id,
        user.shareable_id.as_deref().unwrap_or("-"),
    );
    Ok(())
}

/// Set the role of the account matching `login` (username or email).
pub(crate) fn run_user_set_role(
    db: Option<PathBuf>,
    login: &str,
    role: Role,
) -> Result<(), CliError> {
    let (conn, _) = open_db(db)?;
    let user = switchbook_db::find_user_by_login(&conn, login)?
        .ok_or_else(|| CliError::other(format!("No user named '{}'", login)))?;

    if user.role == role {
        log::info!("'{}' already has role {}", user.username, role.as_str());
        return Ok(());
    }
    switchbook_db::set_user_role(&conn, user.id, role)?;
    log::info!(
        "'{}': {} -> {}",
        user.username,
        user.role.as_str(),
        role.as_str().if_supports_color(Stdout, |t| t.green()),
    );
    Ok(())
}
