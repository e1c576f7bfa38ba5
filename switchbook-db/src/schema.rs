//! SQLite schema creation and migration.

use rusqlite::Connection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Migration error: expected version {expected}, found {found}")]
    VersionMismatch { expected: i32, found: i32 },
}

/// Current schema version. Increment when adding migrations.
pub const CURRENT_VERSION: i32 = 2;

/// Create all tables and indexes if they don't exist.
///
/// Idempotent: safe to call on an existing database.
pub fn create_schema(conn: &Connection) -> Result<(), SchemaError> {
    conn.execute_batch(SCHEMA_SQL)?;
    set_schema_version(conn, CURRENT_VERSION)?;
    Ok(())
}

/// Open or create a Switchbook database at the given path.
pub fn open_database(path: &std::path::Path) -> Result<Connection, SchemaError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;

    let version = get_schema_version(&conn)?;
    if version == 0 {
        create_schema(&conn)?;
    } else if version != CURRENT_VERSION {
        migrate(&conn, version)?;
    }

    Ok(conn)
}

/// Open an in-memory database with the full schema. Useful for testing.
pub fn open_memory() -> Result<Connection, SchemaError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Get the current schema version, or 0 if no schema exists.
pub fn get_schema_version(conn: &Connection) -> Result<i32, SchemaError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), SchemaError> {
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Run migrations from `from_version` up to `CURRENT_VERSION`.
fn migrate(conn: &Connection, from_version: i32) -> Result<(), SchemaError> {
    if from_version > CURRENT_VERSION {
        return Err(SchemaError::VersionMismatch {
            expected: CURRENT_VERSION,
            found: from_version,
        });
    }

    let mut version = from_version;
    while version < CURRENT_VERSION {
        match version {
            1 => {
                log::info!("Migrating schema v1 -> v2: tracking linked master-switch versions");
                conn.execute_batch(
                    "ALTER TABLE switches ADD COLUMN master_switch_version INTEGER;
                     UPDATE switches SET master_switch_version = (
                         SELECT version FROM master_switches m WHERE m.id = switches.master_switch_id
                     ) WHERE master_switch_id IS NOT NULL;",
                )?;
            }
            _ => {}
        }
        version += 1;
        set_schema_version(conn, version)?;
    }

    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Accounts
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE COLLATE NOCASE,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'USER',
    shareable_id TEXT UNIQUE,
    reset_token TEXT,
    reset_token_expires TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    expires_at TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);

-- Manufacturers and their aliases; *_key columns hold normalize_key() output
CREATE TABLE IF NOT EXISTS manufacturers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    name_key TEXT NOT NULL UNIQUE,
    verified BOOLEAN NOT NULL DEFAULT 0,
    submitted_by_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS manufacturer_aliases (
    manufacturer_id INTEGER NOT NULL REFERENCES manufacturers(id) ON DELETE CASCADE,
    alias TEXT NOT NULL,
    alias_key TEXT NOT NULL UNIQUE,
    PRIMARY KEY (manufacturer_id, alias)
);

-- Community-curated switch records
CREATE TABLE IF NOT EXISTS master_switches (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    chinese_name TEXT,
    manufacturer TEXT,
    switch_type TEXT,
    technology TEXT,
    actuation_force REAL,
    bottom_out_force REAL,
    pre_travel REAL,
    bottom_out REAL,
    spring_weight TEXT,
    spring_length TEXT,
    top_housing TEXT,
    bottom_housing TEXT,
    stem TEXT,
    magnet_orientation TEXT,
    magnet_position TEXT,
    magnet_polarity TEXT,
    initial_force REAL,
    initial_magnetic_flux REAL,
    bottom_out_magnetic_flux REAL,
    pcb_thickness TEXT,
    compatibility TEXT,
    notes TEXT,
    image_url TEXT,
    status TEXT NOT NULL DEFAULT 'PENDING',
    version INTEGER NOT NULL DEFAULT 0,
    submitted_by_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    approved_by_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    approved_at TEXT,
    rejection_reason TEXT,
    view_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_master_switches_status ON master_switches(status);
CREATE INDEX IF NOT EXISTS idx_master_switches_name ON master_switches(name);
CREATE INDEX IF NOT EXISTS idx_master_switches_submitter ON master_switches(submitted_by_id);

-- Edit suggestions: JSON objects holding only the changed fields
CREATE TABLE IF NOT EXISTS master_switch_edits (
    id TEXT PRIMARY KEY,
    master_switch_id TEXT NOT NULL REFERENCES master_switches(id) ON DELETE CASCADE,
    edited_by_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    previous_data TEXT NOT NULL,
    new_data TEXT NOT NULL,
    changed_fields TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'PENDING',
    approved_by_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    approved_at TEXT,
    rejection_reason TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_edits_master ON master_switch_edits(master_switch_id);
CREATE INDEX IF NOT EXISTS idx_edits_status ON master_switch_edits(status);

-- Personal collection entries
CREATE TABLE IF NOT EXISTS switches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    chinese_name TEXT,
    manufacturer TEXT,
    switch_type TEXT,
    technology TEXT,
    actuation_force REAL,
    bottom_out_force REAL,
    pre_travel REAL,
    bottom_out REAL,
    spring_weight TEXT,
    spring_length TEXT,
    top_housing TEXT,
    bottom_housing TEXT,
    stem TEXT,
    magnet_orientation TEXT,
    magnet_position TEXT,
    magnet_polarity TEXT,
    initial_force REAL,
    initial_magnetic_flux REAL,
    bottom_out_magnetic_flux REAL,
    pcb_thickness TEXT,
    compatibility TEXT,
    notes TEXT,
    image_url TEXT,
    quantity INTEGER NOT NULL DEFAULT 1,
    date_obtained TEXT,
    personal_notes TEXT,
    personal_tags TEXT NOT NULL DEFAULT '[]',
    is_lubed BOOLEAN NOT NULL DEFAULT 0,
    is_filmed BOOLEAN NOT NULL DEFAULT 0,
    is_modified BOOLEAN NOT NULL DEFAULT 0,
    franken_top TEXT,
    franken_bottom TEXT,
    franken_stem TEXT,
    master_switch_id TEXT REFERENCES master_switches(id) ON DELETE SET NULL,
    master_switch_version INTEGER,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_switches_user ON switches(user_id);
CREATE INDEX IF NOT EXISTS idx_switches_master ON switches(master_switch_id);

CREATE TABLE IF NOT EXISTS switch_images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    switch_id INTEGER NOT NULL REFERENCES switches(id) ON DELETE CASCADE,
    url TEXT NOT NULL,
    order_index INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_switch_images_switch ON switch_images(switch_id, order_index);

-- Wishlist
CREATE TABLE IF NOT EXISTS wishlist (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    master_switch_id TEXT REFERENCES master_switches(id) ON DELETE CASCADE,
    custom_name TEXT,
    custom_manufacturer TEXT,
    notes TEXT,
    priority INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(user_id, master_switch_id)
);

-- In-app notifications
CREATE TABLE IF NOT EXISTS notifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    link TEXT,
    is_read BOOLEAN NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_notifications_unread ON notifications(user_id, is_read);
"#;
