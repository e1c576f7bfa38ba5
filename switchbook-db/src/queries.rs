//! Read queries for the Switchbook database.
//!
//! Provides collection filtering and statistics, the public master-switch
//! listing, moderation queues, and admin summaries.

use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};
use serde::Serialize;
use switchbook_catalog::manufacturer::KnownManufacturer;
use switchbook_catalog::types::*;

use crate::operations::{OperationError, get_master_switch, manufacturer_aliases, switch_images};
use crate::rows::*;

/// A `LIKE` pattern matching `query` anywhere, with its own wildcards escaped.
/// Use with `ESCAPE '\'`.
fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Accumulates `WHERE` conditions with numbered parameters.
#[derive(Default)]
struct Conditions {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl Conditions {
    /// Add a clause; each `?` in `clause` is bound to `value`.
    fn push(&mut self, clause: &str, value: Value) {
        self.values.push(value);
        let n = self.values.len();
        self.clauses.push(clause.replace('?', &format!("?{n}")));
    }

    fn search(&mut self, query: Option<&str>) {
        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            self.push(
                "(name LIKE ? ESCAPE '\\' OR manufacturer LIKE ? ESCAPE '\\' \
                 OR chinese_name LIKE ? ESCAPE '\\')",
                Value::Text(contains_pattern(q)),
            );
        }
    }

    fn specs(
        &mut self,
        switch_type: Option<SwitchType>,
        technology: Option<SwitchTechnology>,
        manufacturer: Option<&str>,
    ) {
        if let Some(t) = switch_type {
            self.push("switch_type = ?", Value::Text(t.as_str().to_string()));
        }
        if let Some(t) = technology {
            self.push("technology = ?", Value::Text(t.as_str().to_string()));
        }
        if let Some(m) = manufacturer.map(str::trim).filter(|m| !m.is_empty()) {
            self.push("manufacturer = ? COLLATE NOCASE", Value::Text(m.to_string()));
        }
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }
}

// ── Collection ──────────────────────────────────────────────────────────────

/// Filters for a user's collection listing.
#[derive(Debug, Clone, Default)]
pub struct SwitchFilter {
    /// Matches name, manufacturer, or Chinese name.
    pub search: Option<String>,
    pub switch_type: Option<SwitchType>,
    pub technology: Option<SwitchTechnology>,
    pub manufacturer: Option<String>,
}

/// A user's collection, newest first, with images.
pub fn list_switches(
    conn: &Connection,
    user_id: i64,
    filter: &SwitchFilter,
) -> Result<Vec<Switch>, OperationError> {
    let mut cond = Conditions::default();
    cond.push("user_id = ?", Value::Integer(user_id));
    cond.search(filter.search.as_deref());
    cond.specs(filter.switch_type, filter.technology, filter.manufacturer.as_deref());

    let sql = format!(
        "SELECT {SWITCH_COLUMNS} FROM switches {} ORDER BY created_at DESC, id DESC",
        cond.where_sql()
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut switches = stmt
        .query_map(params_from_iter(cond.values), row_to_switch)?
        .collect::<Result<Vec<_>, _>>()?;
    for switch in &mut switches {
        switch.images = switch_images(conn, switch.id)?;
    }
    Ok(switches)
}

/// Summary numbers for a user's collection.
#[derive(Debug, Default, Serialize)]
pub struct CollectionStats {
    /// Distinct collection entries.
    pub total_entries: i64,
    /// Sum of quantities.
    pub total_switches: i64,
    pub lubed: i64,
    pub filmed: i64,
    pub linked_to_master: i64,
    /// (type, entries), most common first. Untyped entries are omitted.
    pub by_type: Vec<(String, i64)>,
    /// (manufacturer, entries), most common first.
    pub by_manufacturer: Vec<(String, i64)>,
}

pub fn collection_stats(conn: &Connection, user_id: i64) -> Result<CollectionStats, OperationError> {
    let mut stats = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(quantity), 0),
                COALESCE(SUM(is_lubed), 0), COALESCE(SUM(is_filmed), 0),
                COUNT(master_switch_id)
         FROM switches WHERE user_id = ?1",
        params![user_id],
        |row| {
            Ok(CollectionStats {
                total_entries: row.get(0)?,
                total_switches: row.get(1)?,
                lubed: row.get(2)?,
                filmed: row.get(3)?,
                linked_to_master: row.get(4)?,
                ..Default::default()
            })
        },
    )?;

    let grouped = |column: &str| -> Result<Vec<(String, i64)>, OperationError> {
        let sql = format!(
            "SELECT {column}, COUNT(*) AS n FROM switches
             WHERE user_id = ?1 AND {column} IS NOT NULL
             GROUP BY {column} ORDER BY n DESC, {column}"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    };
    stats.by_type = grouped("switch_type")?;
    stats.by_manufacturer = grouped("manufacturer")?;

    Ok(stats)
}

/// A collection entry whose master switch has moved past the copied version.
#[derive(Debug, Serialize)]
pub struct OutdatedSwitch {
    pub switch: Switch,
    pub current_version: i64,
}

pub fn outdated_switches(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<OutdatedSwitch>, OperationError> {
    let sql = format!(
        "SELECT {SWITCH_COLUMNS}, (SELECT m.version FROM master_switches m WHERE m.id = switches.master_switch_id)
         FROM switches
         WHERE user_id = ?1 AND master_switch_id IS NOT NULL
           AND COALESCE(master_switch_version, 0) <
               (SELECT m.version FROM master_switches m WHERE m.id = switches.master_switch_id)
         ORDER BY name COLLATE NOCASE"
    );
    let version_col = 2 + SPEC_COLUMN_COUNT + DETAIL_COLUMN_COUNT + 4;
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok(OutdatedSwitch {
            switch: row_to_switch(row)?,
            current_version: row.get(version_col)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Collection entries not linked to any master switch, across all users.
pub fn unlinked_switches(conn: &Connection) -> Result<Vec<Switch>, OperationError> {
    let sql = format!(
        "SELECT {SWITCH_COLUMNS} FROM switches WHERE master_switch_id IS NULL ORDER BY id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], row_to_switch)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

// ── Master Switches ─────────────────────────────────────────────────────────

/// Ordering of the public master-switch listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MasterSort {
    #[default]
    Name,
    Popular,
    Newest,
}

impl MasterSort {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "name" => Some(Self::Name),
            "popular" | "views" => Some(Self::Popular),
            "newest" | "new" | "recent" => Some(Self::Newest),
            _ => None,
        }
    }

    fn order_by(&self) -> &'static str {
        match self {
            Self::Name => "name COLLATE NOCASE, id",
            Self::Popular => "view_count DESC, name COLLATE NOCASE, id",
            Self::Newest => "created_at DESC, rowid DESC",
        }
    }
}

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Parameters of the public master-switch listing.
#[derive(Debug, Clone)]
pub struct MasterSwitchQuery {
    pub search: Option<String>,
    pub switch_type: Option<SwitchType>,
    pub technology: Option<SwitchTechnology>,
    pub manufacturer: Option<String>,
    pub sort: MasterSort,
    /// 1-based.
    pub page: u32,
    pub limit: u32,
}

impl Default for MasterSwitchQuery {
    fn default() -> Self {
        Self {
            search: None,
            switch_type: None,
            technology: None,
            manufacturer: None,
            sort: MasterSort::default(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus the total match count.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

/// APPROVED master switches matching `query`.
///
/// `page` below 1 is treated as 1 and `limit` is clamped to 1..=100.
pub fn list_master_switches(
    conn: &Connection,
    query: &MasterSwitchQuery,
) -> Result<Page<MasterSwitch>, OperationError> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, MAX_PAGE_SIZE);

    let mut cond = Conditions::default();
    cond.push(
        "status = ?",
        Value::Text(SubmissionStatus::Approved.as_str().to_string()),
    );
    cond.search(query.search.as_deref());
    cond.specs(query.switch_type, query.technology, query.manufacturer.as_deref());
    let where_sql = cond.where_sql();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM master_switches {where_sql}"),
        params_from_iter(cond.values.iter()),
        |row| row.get(0),
    )?;

    let sql = format!(
        "SELECT {MASTER_COLUMNS} FROM master_switches {where_sql}
         ORDER BY {} LIMIT {limit} OFFSET {}",
        query.sort.order_by(),
        (page as i64 - 1) * limit as i64
    );
    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(params_from_iter(cond.values.iter()), row_to_master)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page {
        items,
        total,
        page,
        limit,
        total_pages: (total + limit as i64 - 1) / limit as i64,
    })
}

fn master_switches_where(
    conn: &Connection,
    where_sql: &str,
    values: Vec<Value>,
) -> Result<Vec<MasterSwitch>, OperationError> {
    let sql = format!(
        "SELECT {MASTER_COLUMNS} FROM master_switches {where_sql} ORDER BY created_at DESC, rowid DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), row_to_master)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Master switches in a given moderation state, or all of them. Newest first.
pub fn master_switches_by_status(
    conn: &Connection,
    status: Option<SubmissionStatus>,
) -> Result<Vec<MasterSwitch>, OperationError> {
    match status {
        Some(s) => master_switches_where(
            conn,
            "WHERE status = ?1",
            vec![Value::Text(s.as_str().to_string())],
        ),
        None => master_switches_where(conn, "", Vec::new()),
    }
}

/// Every submission made by a user, whatever its status.
pub fn master_switches_by_submitter(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<MasterSwitch>, OperationError> {
    master_switches_where(
        conn,
        "WHERE submitted_by_id = ?1",
        vec![Value::Integer(user_id)],
    )
}

// ── Edit Suggestions ────────────────────────────────────────────────────────

fn edits_where(
    conn: &Connection,
    where_sql: &str,
    values: Vec<Value>,
) -> Result<Vec<MasterSwitchEdit>, OperationError> {
    let sql = format!(
        "SELECT {EDIT_COLUMNS} FROM master_switch_edits {where_sql} ORDER BY created_at DESC, rowid DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), row_to_edit)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Edits of one master switch, optionally restricted to one status.
pub fn edits_for_master(
    conn: &Connection,
    master_switch_id: &str,
    status: Option<EditStatus>,
) -> Result<Vec<MasterSwitchEdit>, OperationError> {
    match status {
        Some(s) => edits_where(
            conn,
            "WHERE master_switch_id = ?1 AND status = ?2",
            vec![
                Value::Text(master_switch_id.to_string()),
                Value::Text(s.as_str().to_string()),
            ],
        ),
        None => edits_where(
            conn,
            "WHERE master_switch_id = ?1",
            vec![Value::Text(master_switch_id.to_string())],
        ),
    }
}

/// The moderation queue: edits in a given state, or all of them.
pub fn edits_by_status(
    conn: &Connection,
    status: Option<EditStatus>,
) -> Result<Vec<MasterSwitchEdit>, OperationError> {
    match status {
        Some(s) => edits_where(
            conn,
            "WHERE status = ?1",
            vec![Value::Text(s.as_str().to_string())],
        ),
        None => edits_where(conn, "", Vec::new()),
    }
}

// ── Manufacturers ───────────────────────────────────────────────────────────

/// How many records refer to a manufacturer name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ManufacturerUsage {
    pub switches: i64,
    pub master_switches: i64,
}

impl ManufacturerUsage {
    pub fn total(&self) -> i64 {
        self.switches + self.master_switches
    }
}

pub fn manufacturer_usage(conn: &Connection, name: &str) -> Result<ManufacturerUsage, OperationError> {
    let usage = conn.query_row(
        "SELECT
             (SELECT COUNT(*) FROM switches WHERE manufacturer = ?1 COLLATE NOCASE),
             (SELECT COUNT(*) FROM master_switches WHERE manufacturer = ?1 COLLATE NOCASE)",
        params![name],
        |row| {
            Ok(ManufacturerUsage {
                switches: row.get(0)?,
                master_switches: row.get(1)?,
            })
        },
    )?;
    Ok(usage)
}

/// A manufacturer with its usage counts, for the admin table.
#[derive(Debug, Serialize)]
pub struct ManufacturerSummary {
    #[serde(flatten)]
    pub manufacturer: Manufacturer,
    pub usage: ManufacturerUsage,
}

fn manufacturers_where(
    conn: &Connection,
    where_sql: &str,
    values: Vec<Value>,
    limit: Option<u32>,
) -> Result<Vec<Manufacturer>, OperationError> {
    let limit_sql = limit.map(|n| format!("LIMIT {n}")).unwrap_or_default();
    let sql = format!(
        "SELECT {MANUFACTURER_COLUMNS} FROM manufacturers {where_sql}
         ORDER BY verified DESC, name COLLATE NOCASE {limit_sql}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut manufacturers = stmt
        .query_map(params_from_iter(values), row_to_manufacturer)?
        .collect::<Result<Vec<_>, _>>()?;
    for m in &mut manufacturers {
        m.aliases = manufacturer_aliases(conn, m.id)?;
    }
    Ok(manufacturers)
}

/// All manufacturers with usage counts. Verified first, then by name.
pub fn list_manufacturers(conn: &Connection) -> Result<Vec<ManufacturerSummary>, OperationError> {
    manufacturers_where(conn, "", Vec::new(), None)?
        .into_iter()
        .map(|m| -> Result<ManufacturerSummary, OperationError> {
            let usage = manufacturer_usage(conn, &m.name)?;
            Ok(ManufacturerSummary {
                manufacturer: m,
                usage,
            })
        })
        .collect()
}

/// Autocomplete: manufacturers whose name or an alias contains `query`.
pub fn search_manufacturers(
    conn: &Connection,
    query: &str,
    limit: u32,
) -> Result<Vec<Manufacturer>, OperationError> {
    let query = query.trim();
    if query.is_empty() {
        return manufacturers_where(conn, "", Vec::new(), Some(limit));
    }
    manufacturers_where(
        conn,
        "WHERE name LIKE ?1 ESCAPE '\\'
            OR id IN (SELECT manufacturer_id FROM manufacturer_aliases WHERE alias LIKE ?1 ESCAPE '\\')",
        vec![Value::Text(contains_pattern(query))],
        Some(limit),
    )
}

/// Every manufacturer as input for name resolution.
pub fn known_manufacturers(conn: &Connection) -> Result<Vec<KnownManufacturer>, OperationError> {
    let mut stmt = conn.prepare("SELECT id, name FROM manufacturers ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter()
        .map(|(id, name)| -> Result<KnownManufacturer, OperationError> {
            Ok(KnownManufacturer {
                id,
                name,
                aliases: manufacturer_aliases(conn, id)?,
            })
        })
        .collect()
}

/// Distinct manufacturer strings used by switches and master switches, with
/// the number of rows using each exact spelling.
pub fn manufacturer_spellings(conn: &Connection) -> Result<Vec<(String, i64)>, OperationError> {
    let mut stmt = conn.prepare(
        "SELECT manufacturer, COUNT(*) FROM (
             SELECT manufacturer FROM switches WHERE manufacturer IS NOT NULL
             UNION ALL
             SELECT manufacturer FROM master_switches WHERE manufacturer IS NOT NULL
         )
         GROUP BY manufacturer ORDER BY manufacturer",
    )?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

// ── Wishlist ────────────────────────────────────────────────────────────────

/// A wishlist entry with its master switch, when it names one.
#[derive(Debug, Serialize)]
pub struct WishlistEntry {
    #[serde(flatten)]
    pub item: WishlistItem,
    pub master_switch: Option<MasterSwitch>,
}

/// A user's wishlist, highest priority first.
pub fn list_wishlist(conn: &Connection, user_id: i64) -> Result<Vec<WishlistEntry>, OperationError> {
    let sql = format!(
        "SELECT {WISHLIST_COLUMNS} FROM wishlist WHERE user_id = ?1
         ORDER BY priority DESC, created_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(params![user_id], row_to_wishlist)?
        .collect::<Result<Vec<_>, _>>()?;
    items
        .into_iter()
        .map(|item| -> Result<WishlistEntry, OperationError> {
            let master_switch = match item.master_switch_id.as_deref() {
                Some(id) => get_master_switch(conn, id)?,
                None => None,
            };
            Ok(WishlistEntry {
                item,
                master_switch,
            })
        })
        .collect()
}

// ── Notifications ───────────────────────────────────────────────────────────

/// A user's most recent notifications.
pub fn list_notifications(
    conn: &Connection,
    user_id: i64,
    unread_only: bool,
    limit: u32,
) -> Result<Vec<Notification>, OperationError> {
    let unread_sql = if unread_only { "AND is_read = 0" } else { "" };
    let sql = format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications
         WHERE user_id = ?1 {unread_sql}
         ORDER BY created_at DESC, id DESC LIMIT {limit}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id], row_to_notification)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

pub fn unread_notification_count(conn: &Connection, user_id: i64) -> Result<i64, OperationError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ── Users & Site ────────────────────────────────────────────────────────────

pub fn list_users(conn: &Connection) -> Result<Vec<User>, OperationError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY username COLLATE NOCASE");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], row_to_user)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// IDs of users that have never been given a shareable ID.
pub fn users_without_shareable_id(conn: &Connection) -> Result<Vec<i64>, OperationError> {
    let mut stmt = conn.prepare("SELECT id FROM users WHERE shareable_id IS NULL ORDER BY id")?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Site-wide counts for the admin dashboard and `db stats`.
#[derive(Debug, Default, Serialize)]
pub struct SiteStats {
    pub users: i64,
    pub admins: i64,
    pub switches: i64,
    pub approved_master_switches: i64,
    pub pending_submissions: i64,
    pub pending_edits: i64,
    pub manufacturers: i64,
    pub unverified_manufacturers: i64,
    pub wishlist_items: i64,
}

pub fn site_stats(conn: &Connection) -> Result<SiteStats, OperationError> {
    let count = |sql: &str| -> Result<i64, OperationError> {
        Ok(conn.query_row(sql, [], |row| row.get(0))?)
    };

    Ok(SiteStats {
        users: count("SELECT COUNT(*) FROM users")?,
        admins: count("SELECT COUNT(*) FROM users WHERE role = 'ADMIN'")?,
        switches: count("SELECT COUNT(*) FROM switches")?,
        approved_master_switches: count(
            "SELECT COUNT(*) FROM master_switches WHERE status = 'APPROVED'",
        )?,
        pending_submissions: count("SELECT COUNT(*) FROM master_switches WHERE status = 'PENDING'")?,
        pending_edits: count("SELECT COUNT(*) FROM master_switch_edits WHERE status = 'PENDING'")?,
        manufacturers: count("SELECT COUNT(*) FROM manufacturers")?,
        unverified_manufacturers: count("SELECT COUNT(*) FROM manufacturers WHERE verified = 0")?,
        wishlist_items: count("SELECT COUNT(*) FROM wishlist")?,
    })
}
