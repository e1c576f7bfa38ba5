//! CRUD operations for all Switchbook entity types.

use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};
use switchbook_catalog::manufacturer::{clean_display_name, normalize_key};
use switchbook_catalog::types::*;
use switchbook_catalog::{ManufacturerSeed, SpecDiff};
use thiserror::Error;

use crate::rows::*;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Entity not found: {entity_type} with id '{id}'")]
    NotFound { entity_type: String, id: String },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Limit reached: at most {max} {what}")]
    LimitReached { what: &'static str, max: usize },
    #[error("Invalid input: {0}")]
    Invalid(String),
}

fn not_found(entity_type: &str, id: impl ToString) -> OperationError {
    OperationError::NotFound {
        entity_type: entity_type.to_string(),
        id: id.to_string(),
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Name of the `table.column` a UNIQUE violation was raised for, if SQLite said.
fn violated_column(err: &rusqlite::Error) -> Option<&str> {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(msg)) => msg.rsplit(": ").next(),
        _ => None,
    }
}

fn optional<T>(result: rusqlite::Result<T>) -> Result<Option<T>, OperationError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── User Operations ─────────────────────────────────────────────────────────

/// Insert a new account. Returns the generated ID.
///
/// Duplicate usernames or emails (case-insensitive) are reported as
/// [`OperationError::Conflict`].
pub fn insert_user(
    conn: &Connection,
    username: &str,
    email: &str,
    password_hash: &str,
    role: Role,
    shareable_id: &str,
) -> Result<i64, OperationError> {
    let result = conn.execute(
        "INSERT INTO users (username, email, password_hash, role, shareable_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            username.trim(),
            email.trim(),
            password_hash,
            role.as_str(),
            shareable_id
        ],
    );
    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => {
            let message = match violated_column(&e) {
                Some("users.email") => "Email is already registered",
                Some("users.username") => "Username is already taken",
                _ => "Account already exists",
            };
            Err(OperationError::Conflict(message.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

fn find_user_where(
    conn: &Connection,
    clause: &str,
    value: &dyn rusqlite::ToSql,
) -> Result<Option<User>, OperationError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {clause}");
    optional(conn.query_row(&sql, [value], row_to_user))
}

pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>, OperationError> {
    find_user_where(conn, "id = ?1", &id)
}

pub fn find_user_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<User>, OperationError> {
    find_user_where(conn, "username = ?1", &username.trim())
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, OperationError> {
    find_user_where(conn, "email = ?1", &email.trim())
}

/// Look a user up by either username or email, as typed on the login form.
pub fn find_user_by_login(conn: &Connection, login: &str) -> Result<Option<User>, OperationError> {
    find_user_where(conn, "username = ?1 OR email = ?1", &login.trim())
}

pub fn find_user_by_shareable_id(
    conn: &Connection,
    shareable_id: &str,
) -> Result<Option<User>, OperationError> {
    find_user_where(conn, "shareable_id = ?1", &shareable_id)
}

pub fn update_password(
    conn: &Connection,
    user_id: i64,
    password_hash: &str,
) -> Result<(), OperationError> {
    let changed = conn.execute(
        "UPDATE users SET password_hash = ?1, reset_token = NULL, reset_token_expires = NULL,
             updated_at = datetime('now')
         WHERE id = ?2",
        params![password_hash, user_id],
    )?;
    if changed == 0 {
        return Err(not_found("user", user_id));
    }
    Ok(())
}

pub fn set_user_role(conn: &Connection, user_id: i64, role: Role) -> Result<(), OperationError> {
    let changed = conn.execute(
        "UPDATE users SET role = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![role.as_str(), user_id],
    )?;
    if changed == 0 {
        return Err(not_found("user", user_id));
    }
    Ok(())
}

pub fn set_shareable_id(
    conn: &Connection,
    user_id: i64,
    shareable_id: &str,
) -> Result<(), OperationError> {
    let result = conn.execute(
        "UPDATE users SET shareable_id = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![shareable_id, user_id],
    );
    match result {
        Ok(0) => Err(not_found("user", user_id)),
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(OperationError::Conflict(
            "Shareable ID already in use".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Store a password-reset token valid for `ttl_minutes`.
pub fn set_reset_token(
    conn: &Connection,
    user_id: i64,
    token: &str,
    ttl_minutes: i64,
) -> Result<(), OperationError> {
    let changed = conn.execute(
        "UPDATE users SET reset_token = ?1, reset_token_expires = datetime('now', ?2)
         WHERE id = ?3",
        params![token, format!("{ttl_minutes:+} minutes"), user_id],
    )?;
    if changed == 0 {
        return Err(not_found("user", user_id));
    }
    Ok(())
}

/// The user holding an unexpired reset token.
pub fn find_user_by_reset_token(
    conn: &Connection,
    token: &str,
) -> Result<Option<User>, OperationError> {
    find_user_where(
        conn,
        "reset_token = ?1 AND reset_token_expires > datetime('now')",
        &token,
    )
}

// ── Session Operations ──────────────────────────────────────────────────────

/// Start a session for `user_id` lasting `ttl_hours`.
pub fn create_session(
    conn: &Connection,
    user_id: i64,
    ttl_hours: i64,
) -> Result<Session, OperationError> {
    let token = uuid::Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, datetime('now', ?3))",
        params![token, user_id, format!("{ttl_hours:+} hours")],
    )?;
    let session = conn.query_row(
        "SELECT token, user_id, expires_at, created_at FROM sessions WHERE token = ?1",
        params![token],
        |row| {
            Ok(Session {
                token: row.get(0)?,
                user_id: row.get(1)?,
                expires_at: row.get(2)?,
                created_at: row.get(3)?,
            })
        },
    )?;
    Ok(session)
}

/// The user owning an unexpired session token.
pub fn find_session_user(conn: &Connection, token: &str) -> Result<Option<User>, OperationError> {
    find_user_where(
        conn,
        "id = (SELECT user_id FROM sessions WHERE token = ?1 AND expires_at > datetime('now'))",
        &token,
    )
}

pub fn delete_session(conn: &Connection, token: &str) -> Result<(), OperationError> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// End every session of a user except, optionally, the one making the request.
pub fn delete_user_sessions(
    conn: &Connection,
    user_id: i64,
    keep_token: Option<&str>,
) -> Result<usize, OperationError> {
    let removed = conn.execute(
        "DELETE FROM sessions WHERE user_id = ?1 AND token IS NOT ?2",
        params![user_id, keep_token],
    )?;
    Ok(removed)
}

pub fn purge_expired_sessions(conn: &Connection) -> Result<usize, OperationError> {
    let removed = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= datetime('now')",
        [],
    )?;
    Ok(removed)
}

// ── Manufacturer Operations ─────────────────────────────────────────────────

/// Insert a manufacturer under its cleaned display name. Returns the generated ID.
pub fn insert_manufacturer(
    conn: &Connection,
    name: &str,
    verified: bool,
    submitted_by_id: Option<i64>,
) -> Result<i64, OperationError> {
    let name = clean_display_name(name);
    let key = normalize_key(&name);
    if key.is_empty() {
        return Err(OperationError::Invalid(
            "Manufacturer name must contain letters or digits".to_string(),
        ));
    }
    if find_manufacturer_by_key(conn, &key)?.is_some() {
        return Err(OperationError::Conflict(format!(
            "Manufacturer '{name}' already exists"
        )));
    }
    conn.execute(
        "INSERT INTO manufacturers (name, name_key, verified, submitted_by_id)
         VALUES (?1, ?2, ?3, ?4)",
        params![name, key, verified, submitted_by_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn manufacturer_aliases(conn: &Connection, id: i64) -> Result<Vec<String>, OperationError> {
    let mut stmt = conn.prepare(
        "SELECT alias FROM manufacturer_aliases WHERE manufacturer_id = ?1 ORDER BY alias",
    )?;
    let aliases = stmt
        .query_map(params![id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(aliases)
}

pub fn get_manufacturer(conn: &Connection, id: i64) -> Result<Option<Manufacturer>, OperationError> {
    let sql = format!("SELECT {MANUFACTURER_COLUMNS} FROM manufacturers WHERE id = ?1");
    let Some(mut m) = optional(conn.query_row(&sql, params![id], row_to_manufacturer))? else {
        return Ok(None);
    };
    m.aliases = manufacturer_aliases(conn, id)?;
    Ok(Some(m))
}

/// Find the manufacturer whose name or one of whose aliases has `key`.
/// Canonical names win over aliases.
pub fn find_manufacturer_by_key(
    conn: &Connection,
    key: &str,
) -> Result<Option<Manufacturer>, OperationError> {
    let id = optional(conn.query_row(
        "SELECT id, 0 AS rank FROM manufacturers WHERE name_key = ?1
         UNION ALL
         SELECT manufacturer_id, 1 AS rank FROM manufacturer_aliases WHERE alias_key = ?1
         ORDER BY rank
         LIMIT 1",
        params![key],
        |row| row.get::<_, i64>(0),
    ))?;
    match id {
        Some(id) => get_manufacturer(conn, id),
        None => Ok(None),
    }
}

/// Record `alias` for a manufacturer.
///
/// An alias whose key equals the manufacturer's own name, or one it already
/// has, is skipped and `Ok(false)` returned. An alias claimed by another
/// manufacturer is a conflict.
pub fn add_manufacturer_alias(
    conn: &Connection,
    manufacturer_id: i64,
    alias: &str,
) -> Result<bool, OperationError> {
    let alias = clean_display_name(alias);
    let key = normalize_key(&alias);
    if key.is_empty() {
        return Ok(false);
    }
    match find_manufacturer_by_key(conn, &key)? {
        Some(existing) if existing.id == manufacturer_id => Ok(false),
        Some(existing) => Err(OperationError::Conflict(format!(
            "'{alias}' already refers to manufacturer '{}'",
            existing.name
        ))),
        None => {
            conn.execute(
                "INSERT INTO manufacturer_aliases (manufacturer_id, alias, alias_key)
                 VALUES (?1, ?2, ?3)",
                params![manufacturer_id, alias, key],
            )?;
            Ok(true)
        }
    }
}

/// Replace every alias of a manufacturer.
pub fn set_manufacturer_aliases(
    conn: &Connection,
    manufacturer_id: i64,
    aliases: &[String],
) -> Result<(), OperationError> {
    conn.execute(
        "DELETE FROM manufacturer_aliases WHERE manufacturer_id = ?1",
        params![manufacturer_id],
    )?;
    for alias in aliases {
        add_manufacturer_alias(conn, manufacturer_id, alias)?;
    }
    Ok(())
}

/// Change the canonical name. The new name must not belong to another manufacturer.
pub fn rename_manufacturer(
    conn: &Connection,
    manufacturer_id: i64,
    new_name: &str,
) -> Result<(), OperationError> {
    let name = clean_display_name(new_name);
    let key = normalize_key(&name);
    if key.is_empty() {
        return Err(OperationError::Invalid(
            "Manufacturer name must contain letters or digits".to_string(),
        ));
    }
    if let Some(existing) = find_manufacturer_by_key(conn, &key)? {
        if existing.id != manufacturer_id {
            return Err(OperationError::Conflict(format!(
                "'{name}' already refers to manufacturer '{}'",
                existing.name
            )));
        }
    }
    // The new name may have been one of this manufacturer's aliases
    conn.execute(
        "DELETE FROM manufacturer_aliases WHERE manufacturer_id = ?1 AND alias_key = ?2",
        params![manufacturer_id, key],
    )?;
    let changed = conn.execute(
        "UPDATE manufacturers SET name = ?1, name_key = ?2, updated_at = datetime('now')
         WHERE id = ?3",
        params![name, key, manufacturer_id],
    )?;
    if changed == 0 {
        return Err(not_found("manufacturer", manufacturer_id));
    }
    Ok(())
}

pub fn set_manufacturer_verified(
    conn: &Connection,
    manufacturer_id: i64,
    verified: bool,
) -> Result<(), OperationError> {
    let changed = conn.execute(
        "UPDATE manufacturers SET verified = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![verified, manufacturer_id],
    )?;
    if changed == 0 {
        return Err(not_found("manufacturer", manufacturer_id));
    }
    Ok(())
}

pub fn delete_manufacturer(conn: &Connection, manufacturer_id: i64) -> Result<(), OperationError> {
    let changed = conn.execute(
        "DELETE FROM manufacturers WHERE id = ?1",
        params![manufacturer_id],
    )?;
    if changed == 0 {
        return Err(not_found("manufacturer", manufacturer_id));
    }
    Ok(())
}

/// Point every switch and master switch whose manufacturer reads `from`
/// (ignoring case) at `to`. Returns the number of rows changed.
pub fn rename_manufacturer_references(
    conn: &Connection,
    from: &str,
    to: &str,
) -> Result<usize, OperationError> {
    let mut changed = 0;
    for table in ["switches", "master_switches"] {
        changed += conn.execute(
            &format!(
                "UPDATE {table} SET manufacturer = ?1, updated_at = datetime('now')
                 WHERE manufacturer = ?2 COLLATE NOCASE AND manufacturer IS NOT ?1"
            ),
            params![to, from],
        )?;
    }
    Ok(changed)
}

/// Counts from a manufacturer seed load.
#[derive(Debug, Default)]
pub struct SeedStats {
    pub inserted: usize,
    pub updated: usize,
    pub aliases: usize,
}

/// Load curated manufacturers. Existing entries (matched by name or alias key)
/// are marked verified and take the curated name; aliases are added.
pub fn seed_manufacturers(
    conn: &Connection,
    seeds: &[ManufacturerSeed],
) -> Result<SeedStats, OperationError> {
    let mut stats = SeedStats::default();

    for seed in seeds {
        let key = normalize_key(&seed.name);
        let id = match find_manufacturer_by_key(conn, &key)? {
            Some(existing) => {
                if existing.name != clean_display_name(&seed.name) {
                    rename_manufacturer(conn, existing.id, &seed.name)?;
                    add_manufacturer_alias(conn, existing.id, &existing.name)?;
                }
                set_manufacturer_verified(conn, existing.id, true)?;
                stats.updated += 1;
                existing.id
            }
            None => {
                stats.inserted += 1;
                insert_manufacturer(conn, &seed.name, true, None)?
            }
        };

        for alias in &seed.aliases {
            if add_manufacturer_alias(conn, id, alias)? {
                stats.aliases += 1;
            }
        }
    }

    Ok(stats)
}

// ── Collection Operations ───────────────────────────────────────────────────

/// Insert a collection entry, optionally recording the master switch and
/// version it was copied from. Returns the generated ID.
pub fn insert_switch(
    conn: &Connection,
    user_id: i64,
    input: &SwitchInput,
    master: Option<(&str, i64)>,
) -> Result<i64, OperationError> {
    let mut values = vec![Value::Integer(user_id)];
    values.extend(spec_values(&input.specs));
    values.extend(detail_values(&input.details)?);
    match master {
        Some((id, version)) => {
            values.push(Value::Text(id.to_string()));
            values.push(Value::Integer(version));
        }
        None => {
            values.push(Value::Null);
            values.push(Value::Null);
        }
    }

    let sql = format!(
        "INSERT INTO switches (user_id, {SPEC_COLUMNS}, {DETAIL_COLUMNS}, master_switch_id, master_switch_version)
         VALUES ({})",
        placeholders(1, values.len())
    );
    conn.execute(&sql, params_from_iter(values))?;
    Ok(conn.last_insert_rowid())
}

pub fn get_switch(conn: &Connection, id: i64) -> Result<Option<Switch>, OperationError> {
    let sql = format!("SELECT {SWITCH_COLUMNS} FROM switches WHERE id = ?1");
    let Some(mut switch) = optional(conn.query_row(&sql, params![id], row_to_switch))? else {
        return Ok(None);
    };
    switch.images = switch_images(conn, id)?;
    Ok(Some(switch))
}

/// Fetch a switch only if it belongs to `user_id`.
pub fn get_user_switch(
    conn: &Connection,
    user_id: i64,
    id: i64,
) -> Result<Option<Switch>, OperationError> {
    Ok(get_switch(conn, id)?.filter(|s| s.user_id == user_id))
}

/// Overwrite the specs and details of a collection entry.
pub fn update_switch(conn: &Connection, id: i64, input: &SwitchInput) -> Result<(), OperationError> {
    let mut values = spec_values(&input.specs);
    values.extend(detail_values(&input.details)?);
    let id_param = values.len() + 1;
    values.push(Value::Integer(id));

    let sql = format!(
        "UPDATE switches SET {}, {}, updated_at = datetime('now') WHERE id = ?{id_param}",
        assignments(SPEC_COLUMNS, 1),
        assignments(DETAIL_COLUMNS, 1 + SPEC_COLUMN_COUNT),
    );
    let changed = conn.execute(&sql, params_from_iter(values))?;
    if changed == 0 {
        return Err(not_found("switch", id));
    }
    Ok(())
}

/// Re-copy specs from a master switch and record the version copied.
pub fn sync_switch_specs(
    conn: &Connection,
    id: i64,
    specs: &SwitchSpecs,
    master_version: i64,
) -> Result<(), OperationError> {
    let mut values = spec_values(specs);
    values.push(Value::Integer(master_version));
    values.push(Value::Integer(id));

    let sql = format!(
        "UPDATE switches SET {}, master_switch_version = ?{}, updated_at = datetime('now')
         WHERE id = ?{}",
        assignments(SPEC_COLUMNS, 1),
        SPEC_COLUMN_COUNT + 1,
        SPEC_COLUMN_COUNT + 2,
    );
    let changed = conn.execute(&sql, params_from_iter(values))?;
    if changed == 0 {
        return Err(not_found("switch", id));
    }
    Ok(())
}

/// Link an existing collection entry to a master switch without copying specs.
pub fn link_switch_to_master(
    conn: &Connection,
    id: i64,
    master_switch_id: &str,
    master_version: i64,
) -> Result<(), OperationError> {
    let changed = conn.execute(
        "UPDATE switches SET master_switch_id = ?1, master_switch_version = ?2,
             updated_at = datetime('now')
         WHERE id = ?3",
        params![master_switch_id, master_version, id],
    )?;
    if changed == 0 {
        return Err(not_found("switch", id));
    }
    Ok(())
}

pub fn delete_switch(conn: &Connection, id: i64) -> Result<(), OperationError> {
    let changed = conn.execute("DELETE FROM switches WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(not_found("switch", id));
    }
    Ok(())
}

// ── Image Operations ────────────────────────────────────────────────────────

pub fn switch_images(conn: &Connection, switch_id: i64) -> Result<Vec<SwitchImage>, OperationError> {
    let sql = format!(
        "SELECT {IMAGE_COLUMNS} FROM switch_images WHERE switch_id = ?1 ORDER BY order_index, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let images = stmt
        .query_map(params![switch_id], row_to_image)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(images)
}

/// Append an image URL after the existing images of a switch.
pub fn add_switch_image(
    conn: &Connection,
    switch_id: i64,
    url: &str,
) -> Result<SwitchImage, OperationError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM switch_images WHERE switch_id = ?1",
        params![switch_id],
        |row| row.get(0),
    )?;
    if count as usize >= MAX_IMAGES_PER_SWITCH {
        return Err(OperationError::LimitReached {
            what: "images per switch",
            max: MAX_IMAGES_PER_SWITCH,
        });
    }

    conn.execute(
        "INSERT INTO switch_images (switch_id, url, order_index)
         VALUES (?1, ?2, (SELECT COALESCE(MAX(order_index) + 1, 0) FROM switch_images WHERE switch_id = ?1))",
        params![switch_id, url.trim()],
    )?;
    let id = conn.last_insert_rowid();
    let sql = format!("SELECT {IMAGE_COLUMNS} FROM switch_images WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], row_to_image)?)
}

/// Delete one image and close the gap in `order_index`.
pub fn delete_switch_image(
    conn: &Connection,
    switch_id: i64,
    image_id: i64,
) -> Result<(), OperationError> {
    let changed = conn.execute(
        "DELETE FROM switch_images WHERE id = ?1 AND switch_id = ?2",
        params![image_id, switch_id],
    )?;
    if changed == 0 {
        return Err(not_found("image", image_id));
    }
    let ids: Vec<i64> = switch_images(conn, switch_id)?
        .into_iter()
        .map(|img| img.id)
        .collect();
    write_image_order(conn, &ids)
}

/// Reorder a switch's images. `ordered_ids` must list each image exactly once.
pub fn reorder_switch_images(
    conn: &Connection,
    switch_id: i64,
    ordered_ids: &[i64],
) -> Result<(), OperationError> {
    let mut current: Vec<i64> = switch_images(conn, switch_id)?
        .into_iter()
        .map(|img| img.id)
        .collect();
    let mut requested = ordered_ids.to_vec();
    current.sort_unstable();
    requested.sort_unstable();
    if current != requested {
        return Err(OperationError::Invalid(
            "Image order must list every image of the switch exactly once".to_string(),
        ));
    }
    write_image_order(conn, ordered_ids)
}

fn write_image_order(conn: &Connection, ordered_ids: &[i64]) -> Result<(), OperationError> {
    let mut stmt = conn.prepare("UPDATE switch_images SET order_index = ?1 WHERE id = ?2")?;
    for (index, id) in ordered_ids.iter().enumerate() {
        stmt.execute(params![index as i64, id])?;
    }
    Ok(())
}

// ── Master Switch Operations ────────────────────────────────────────────────

/// Insert a PENDING master switch at version 0. Returns the generated UUID.
pub fn insert_master_switch(
    conn: &Connection,
    specs: &SwitchSpecs,
    submitted_by_id: i64,
) -> Result<String, OperationError> {
    let id = uuid::Uuid::new_v4().to_string();
    let mut values = vec![Value::Text(id.clone())];
    values.extend(spec_values(specs));
    values.push(Value::Integer(submitted_by_id));

    let sql = format!(
        "INSERT INTO master_switches (id, {SPEC_COLUMNS}, submitted_by_id) VALUES ({})",
        placeholders(1, values.len())
    );
    conn.execute(&sql, params_from_iter(values))?;
    Ok(id)
}

pub fn get_master_switch(
    conn: &Connection,
    id: &str,
) -> Result<Option<MasterSwitch>, OperationError> {
    let sql = format!("SELECT {MASTER_COLUMNS} FROM master_switches WHERE id = ?1");
    optional(conn.query_row(&sql, params![id], row_to_master))
}

/// Move a PENDING master switch to APPROVED and bump its version.
///
/// Returns `false` when the record was not PENDING (or does not exist).
pub fn approve_master_switch(
    conn: &Connection,
    id: &str,
    admin_id: i64,
) -> Result<bool, OperationError> {
    let changed = conn.execute(
        "UPDATE master_switches
         SET status = 'APPROVED', approved_by_id = ?1, approved_at = datetime('now'),
             rejection_reason = NULL, version = version + 1, updated_at = datetime('now')
         WHERE id = ?2 AND status = 'PENDING'",
        params![admin_id, id],
    )?;
    Ok(changed > 0)
}

/// Move a PENDING master switch to REJECTED.
///
/// Returns `false` when the record was not PENDING (or does not exist).
pub fn reject_master_switch(
    conn: &Connection,
    id: &str,
    reason: Option<&str>,
) -> Result<bool, OperationError> {
    let changed = conn.execute(
        "UPDATE master_switches
         SET status = 'REJECTED', rejection_reason = ?1, updated_at = datetime('now')
         WHERE id = ?2 AND status = 'PENDING'",
        params![reason, id],
    )?;
    Ok(changed > 0)
}

/// Overwrite the specs of a master switch and bump its version.
/// Returns the new version.
pub fn update_master_switch_specs(
    conn: &Connection,
    id: &str,
    specs: &SwitchSpecs,
) -> Result<i64, OperationError> {
    let mut values = spec_values(specs);
    values.push(Value::Text(id.to_string()));

    let sql = format!(
        "UPDATE master_switches SET {}, version = version + 1, updated_at = datetime('now')
         WHERE id = ?{}",
        assignments(SPEC_COLUMNS, 1),
        SPEC_COLUMN_COUNT + 1,
    );
    let changed = conn.execute(&sql, params_from_iter(values))?;
    if changed == 0 {
        return Err(not_found("master switch", id));
    }
    let version = conn.query_row(
        "SELECT version FROM master_switches WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(version)
}

pub fn increment_master_view_count(conn: &Connection, id: &str) -> Result<(), OperationError> {
    conn.execute(
        "UPDATE master_switches SET view_count = view_count + 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}

// ── Edit Suggestion Operations ──────────────────────────────────────────────

/// Store a PENDING edit suggestion. Returns the generated UUID.
pub fn insert_edit(
    conn: &Connection,
    master_switch_id: &str,
    edited_by_id: i64,
    diff: &SpecDiff,
) -> Result<String, OperationError> {
    let id = uuid::Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO master_switch_edits
             (id, master_switch_id, edited_by_id, previous_data, new_data, changed_fields)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            master_switch_id,
            edited_by_id,
            serde_json::to_string(&diff.previous)?,
            serde_json::to_string(&diff.proposed)?,
            serde_json::to_string(&diff.changed_fields)?,
        ],
    )?;
    Ok(id)
}

pub fn get_edit(conn: &Connection, id: &str) -> Result<Option<MasterSwitchEdit>, OperationError> {
    let sql = format!("SELECT {EDIT_COLUMNS} FROM master_switch_edits WHERE id = ?1");
    optional(conn.query_row(&sql, params![id], row_to_edit))
}

/// Move a PENDING edit to a terminal status. `reviewer_id` is recorded for
/// approvals; `reason` for rejections.
///
/// Returns `false` when the edit was not PENDING (or does not exist).
pub fn close_edit(
    conn: &Connection,
    id: &str,
    status: EditStatus,
    reviewer_id: Option<i64>,
    reason: Option<&str>,
) -> Result<bool, OperationError> {
    let changed = conn.execute(
        "UPDATE master_switch_edits
         SET status = ?1, approved_by_id = ?2,
             approved_at = CASE WHEN ?1 = 'APPROVED' THEN datetime('now') END,
             rejection_reason = ?3
         WHERE id = ?4 AND status = 'PENDING'",
        params![status.as_str(), reviewer_id, reason, id],
    )?;
    Ok(changed > 0)
}

// ── Wishlist Operations ─────────────────────────────────────────────────────

/// Add to a user's wishlist. Returns the generated ID.
///
/// A master switch can be on a user's wishlist once.
pub fn insert_wishlist_item(
    conn: &Connection,
    user_id: i64,
    item: &WishlistInput,
) -> Result<i64, OperationError> {
    let master_id = item
        .master_switch_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let result = conn.execute(
        "INSERT INTO wishlist (user_id, master_switch_id, custom_name, custom_manufacturer, notes, priority)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            master_id,
            item.custom_name.as_deref().map(str::trim),
            item.custom_manufacturer.as_deref().map(str::trim),
            item.notes,
            item.priority,
        ],
    );
    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => Err(OperationError::Conflict(
            "Switch is already on your wishlist".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

pub fn get_wishlist_item(
    conn: &Connection,
    user_id: i64,
    id: i64,
) -> Result<Option<WishlistItem>, OperationError> {
    let sql = format!("SELECT {WISHLIST_COLUMNS} FROM wishlist WHERE id = ?1 AND user_id = ?2");
    optional(conn.query_row(&sql, params![id, user_id], row_to_wishlist))
}

pub fn delete_wishlist_item(conn: &Connection, user_id: i64, id: i64) -> Result<(), OperationError> {
    let changed = conn.execute(
        "DELETE FROM wishlist WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    if changed == 0 {
        return Err(not_found("wishlist item", id));
    }
    Ok(())
}

// ── Notification Operations ─────────────────────────────────────────────────

pub fn insert_notification(
    conn: &Connection,
    notification: &NewNotification,
) -> Result<i64, OperationError> {
    conn.execute(
        "INSERT INTO notifications (user_id, kind, title, message, link)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            notification.user_id,
            notification.kind.as_str(),
            notification.title,
            notification.message,
            notification.link,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn mark_notification_read(
    conn: &Connection,
    user_id: i64,
    id: i64,
) -> Result<(), OperationError> {
    let changed = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    if changed == 0 {
        return Err(not_found("notification", id));
    }
    Ok(())
}

pub fn mark_all_notifications_read(conn: &Connection, user_id: i64) -> Result<usize, OperationError> {
    let changed = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
        params![user_id],
    )?;
    Ok(changed)
}
