//! Column lists and row mappers shared by operations and queries.

use rusqlite::Row;
use rusqlite::types::{Type, Value};
use switchbook_catalog::types::*;

macro_rules! spec_columns {
    () => {
        "name, chinese_name, manufacturer, switch_type, technology, actuation_force, \
         bottom_out_force, pre_travel, bottom_out, spring_weight, spring_length, top_housing, \
         bottom_housing, stem, magnet_orientation, magnet_position, magnet_polarity, \
         initial_force, initial_magnetic_flux, bottom_out_magnetic_flux, pcb_thickness, \
         compatibility, notes, image_url"
    };
}

macro_rules! detail_columns {
    () => {
        "quantity, date_obtained, personal_notes, personal_tags, is_lubed, is_filmed, \
         is_modified, franken_top, franken_bottom, franken_stem"
    };
}

/// Number of columns in `spec_columns!()`.
pub(crate) const SPEC_COLUMN_COUNT: usize = 24;
pub(crate) const DETAIL_COLUMN_COUNT: usize = 10;

pub(crate) const SPEC_COLUMNS: &str = spec_columns!();
pub(crate) const DETAIL_COLUMNS: &str = detail_columns!();

pub(crate) const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, shareable_id, created_at, updated_at";

pub(crate) const SWITCH_COLUMNS: &str = concat!(
    "id, user_id, ",
    spec_columns!(),
    ", ",
    detail_columns!(),
    ", master_switch_id, master_switch_version, created_at, updated_at"
);

pub(crate) const MASTER_COLUMNS: &str = concat!(
    "id, ",
    spec_columns!(),
    ", status, version, submitted_by_id, approved_by_id, approved_at, rejection_reason, \
     view_count, created_at, updated_at"
);

pub(crate) const EDIT_COLUMNS: &str = "id, master_switch_id, edited_by_id, previous_data, new_data, \
     changed_fields, status, approved_by_id, approved_at, rejection_reason, created_at";

pub(crate) const IMAGE_COLUMNS: &str = "id, switch_id, url, order_index, created_at";

pub(crate) const MANUFACTURER_COLUMNS: &str =
    "id, name, verified, submitted_by_id, created_at, updated_at";

pub(crate) const WISHLIST_COLUMNS: &str = "id, user_id, master_switch_id, custom_name, \
     custom_manufacturer, notes, priority, created_at";

pub(crate) const NOTIFICATION_COLUMNS: &str =
    "id, user_id, kind, title, message, link, is_read, created_at";

// ── Writing ─────────────────────────────────────────────────────────────────

fn text(value: &Option<String>) -> Value {
    match value.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Value::Text(s.to_string()),
        _ => Value::Null,
    }
}

fn real(value: Option<f64>) -> Value {
    value.map(Value::Real).unwrap_or(Value::Null)
}

/// SQL values for the spec columns, in `SPEC_COLUMNS` order.
pub(crate) fn spec_values(specs: &SwitchSpecs) -> Vec<Value> {
    vec![
        Value::Text(specs.name.trim().to_string()),
        text(&specs.chinese_name),
        text(&specs.manufacturer),
        specs
            .switch_type
            .map(|t| Value::Text(t.as_str().to_string()))
            .unwrap_or(Value::Null),
        specs
            .technology
            .map(|t| Value::Text(t.as_str().to_string()))
            .unwrap_or(Value::Null),
        real(specs.actuation_force),
        real(specs.bottom_out_force),
        real(specs.pre_travel),
        real(specs.bottom_out),
        text(&specs.spring_weight),
        text(&specs.spring_length),
        text(&specs.top_housing),
        text(&specs.bottom_housing),
        text(&specs.stem),
        text(&specs.magnet_orientation),
        text(&specs.magnet_position),
        text(&specs.magnet_polarity),
        real(specs.initial_force),
        real(specs.initial_magnetic_flux),
        real(specs.bottom_out_magnetic_flux),
        text(&specs.pcb_thickness),
        text(&specs.compatibility),
        text(&specs.notes),
        text(&specs.image_url),
    ]
}

/// SQL values for the detail columns, in `DETAIL_COLUMNS` order.
pub(crate) fn detail_values(details: &CollectionDetails) -> Result<Vec<Value>, serde_json::Error> {
    let tags: Vec<&str> = details
        .personal_tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    Ok(vec![
        Value::Integer(details.quantity),
        text(&details.date_obtained),
        text(&details.personal_notes),
        Value::Text(serde_json::to_string(&tags)?),
        Value::Integer(details.is_lubed.into()),
        Value::Integer(details.is_filmed.into()),
        Value::Integer(details.is_modified.into()),
        text(&details.franken_top),
        text(&details.franken_bottom),
        text(&details.franken_stem),
    ])
}

/// `col = ?N` assignments for a column list, numbering from `first`.
pub(crate) fn assignments(columns: &str, first: usize) -> String {
    columns
        .split(',')
        .map(str::trim)
        .enumerate()
        .map(|(i, col)| format!("{col} = ?{}", first + i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `?N, ?N+1, ...` placeholders.
pub(crate) fn placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Reading ─────────────────────────────────────────────────────────────────

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn json_column<T: serde::de::DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

/// Read the spec columns starting at column `at`.
pub(crate) fn specs_from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<SwitchSpecs> {
    let switch_type: Option<String> = row.get(at + 3)?;
    let technology: Option<String> = row.get(at + 4)?;
    Ok(SwitchSpecs {
        name: row.get(at)?,
        chinese_name: row.get(at + 1)?,
        manufacturer: row.get(at + 2)?,
        // Unrecognized values from older rows read back as unset
        switch_type: switch_type.and_then(|t| t.parse().ok()),
        technology: technology.and_then(|t| t.parse().ok()),
        actuation_force: row.get(at + 5)?,
        bottom_out_force: row.get(at + 6)?,
        pre_travel: row.get(at + 7)?,
        bottom_out: row.get(at + 8)?,
        spring_weight: row.get(at + 9)?,
        spring_length: row.get(at + 10)?,
        top_housing: row.get(at + 11)?,
        bottom_housing: row.get(at + 12)?,
        stem: row.get(at + 13)?,
        magnet_orientation: row.get(at + 14)?,
        magnet_position: row.get(at + 15)?,
        magnet_polarity: row.get(at + 16)?,
        initial_force: row.get(at + 17)?,
        initial_magnetic_flux: row.get(at + 18)?,
        bottom_out_magnetic_flux: row.get(at + 19)?,
        pcb_thickness: row.get(at + 20)?,
        compatibility: row.get(at + 21)?,
        notes: row.get(at + 22)?,
        image_url: row.get(at + 23)?,
    })
}

pub(crate) fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: Role::from_str_loose(&role),
        shareable_id: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Map a `SWITCH_COLUMNS` row. Images are loaded separately.
pub(crate) fn row_to_switch(row: &Row<'_>) -> rusqlite::Result<Switch> {
    let d = 2 + SPEC_COLUMN_COUNT;
    Ok(Switch {
        id: row.get(0)?,
        user_id: row.get(1)?,
        specs: specs_from_row(row, 2)?,
        details: CollectionDetails {
            quantity: row.get(d)?,
            date_obtained: row.get(d + 1)?,
            personal_notes: row.get(d + 2)?,
            personal_tags: json_column(row, d + 3)?,
            is_lubed: row.get(d + 4)?,
            is_filmed: row.get(d + 5)?,
            is_modified: row.get(d + 6)?,
            franken_top: row.get(d + 7)?,
            franken_bottom: row.get(d + 8)?,
            franken_stem: row.get(d + 9)?,
        },
        master_switch_id: row.get(d + 10)?,
        master_switch_version: row.get(d + 11)?,
        images: Vec::new(),
        created_at: row.get(d + 12)?,
        updated_at: row.get(d + 13)?,
    })
}

pub(crate) fn row_to_master(row: &Row<'_>) -> rusqlite::Result<MasterSwitch> {
    let m = 1 + SPEC_COLUMN_COUNT;
    let status: String = row.get(m)?;
    Ok(MasterSwitch {
        id: row.get(0)?,
        specs: specs_from_row(row, 1)?,
        status: SubmissionStatus::from_str_loose(&status),
        version: row.get(m + 1)?,
        submitted_by_id: row.get(m + 2)?,
        approved_by_id: row.get(m + 3)?,
        approved_at: row.get(m + 4)?,
        rejection_reason: row.get(m + 5)?,
        view_count: row.get(m + 6)?,
        created_at: row.get(m + 7)?,
        updated_at: row.get(m + 8)?,
    })
}

pub(crate) fn row_to_edit(row: &Row<'_>) -> rusqlite::Result<MasterSwitchEdit> {
    let status: String = row.get(6)?;
    Ok(MasterSwitchEdit {
        id: row.get(0)?,
        master_switch_id: row.get(1)?,
        edited_by_id: row.get(2)?,
        previous_data: json_column(row, 3)?,
        new_data: json_column(row, 4)?,
        changed_fields: json_column(row, 5)?,
        status: EditStatus::from_str_loose(&status),
        approved_by_id: row.get(7)?,
        approved_at: row.get(8)?,
        rejection_reason: row.get(9)?,
        created_at: row.get(10)?,
    })
}

pub(crate) fn row_to_image(row: &Row<'_>) -> rusqlite::Result<SwitchImage> {
    Ok(SwitchImage {
        id: row.get(0)?,
        switch_id: row.get(1)?,
        url: row.get(2)?,
        order_index: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Map a `MANUFACTURER_COLUMNS` row. Aliases are loaded separately.
pub(crate) fn row_to_manufacturer(row: &Row<'_>) -> rusqlite::Result<Manufacturer> {
    Ok(Manufacturer {
        id: row.get(0)?,
        name: row.get(1)?,
        aliases: Vec::new(),
        verified: row.get(2)?,
        submitted_by_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

pub(crate) fn row_to_wishlist(row: &Row<'_>) -> rusqlite::Result<WishlistItem> {
    Ok(WishlistItem {
        id: row.get(0)?,
        user_id: row.get(1)?,
        master_switch_id: row.get(2)?,
        custom_name: row.get(3)?,
        custom_manufacturer: row.get(4)?,
        notes: row.get(5)?,
        priority: row.get(6)?,
        created_at: row.get(7)?,
    })
}

#[derive(Debug)]
struct UnknownKind(String);

impl std::fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown notification kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownKind {}

pub(crate) fn row_to_notification(row: &Row<'_>) -> rusqlite::Result<Notification> {
    let kind: String = row.get(2)?;
    let kind = NotificationKind::from_str_loose(&kind)
        .ok_or_else(|| conversion_error(2, UnknownKind(kind)))?;
    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind,
        title: row.get(3)?,
        message: row.get(4)?,
        link: row.get(5)?,
        is_read: row.get(6)?,
        created_at: row.get(7)?,
    })
}
