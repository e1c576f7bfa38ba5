//! Data model types for the switch catalog.
//!
//! These types represent the persistent schema: users, personal collection
//! entries, master switches and their edit suggestions, manufacturers,
//! wishlist items, and notifications.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error returned when a string cannot be parsed into one of the catalog enums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumParseError {
    pub kind: &'static str,
    pub value: String,
}

impl std::fmt::Display for EnumParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {}: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for EnumParseError {}

/// Uppercase a loosely-written enum value and join words with underscores,
/// so "silent linear", "Silent-Linear" and "SILENT_LINEAR" compare equal.
fn enum_key(s: &str) -> String {
    s.trim()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}

// ── Users ───────────────────────────────────────────────────────────────────

/// Account role. Admins moderate submissions, edits, and manufacturers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }

    /// Unknown values fall back to the least-privileged role.
    pub fn from_str_loose(s: &str) -> Self {
        match enum_key(s).as_str() {
            "ADMIN" => Self::Admin,
            _ => Self::User,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// A registered account.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub shareable_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A login session backed by an opaque random token.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub expires_at: String,
    pub created_at: String,
}

// ── Switch specifications ───────────────────────────────────────────────────

/// Actuation feel of a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwitchType {
    Linear,
    Tactile,
    Clicky,
    SilentLinear,
    SilentTactile,
}

impl SwitchType {
    pub const ALL: [SwitchType; 5] = [
        Self::Linear,
        Self::Tactile,
        Self::Clicky,
        Self::SilentLinear,
        Self::SilentTactile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "LINEAR",
            Self::Tactile => "TACTILE",
            Self::Clicky => "CLICKY",
            Self::SilentLinear => "SILENT_LINEAR",
            Self::SilentTactile => "SILENT_TACTILE",
        }
    }
}

impl std::fmt::Display for SwitchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SwitchType {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = enum_key(s);
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == key)
            .ok_or_else(|| EnumParseError {
                kind: "switch type",
                value: s.to_string(),
            })
    }
}

/// Sensing technology of a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwitchTechnology {
    Mechanical,
    Optical,
    Magnetic,
    Inductive,
    ElectroCapacitive,
}

impl SwitchTechnology {
    pub const ALL: [SwitchTechnology; 5] = [
        Self::Mechanical,
        Self::Optical,
        Self::Magnetic,
        Self::Inductive,
        Self::ElectroCapacitive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mechanical => "MECHANICAL",
            Self::Optical => "OPTICAL",
            Self::Magnetic => "MAGNETIC",
            Self::Inductive => "INDUCTIVE",
            Self::ElectroCapacitive => "ELECTRO_CAPACITIVE",
        }
    }
}

impl std::fmt::Display for SwitchTechnology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SwitchTechnology {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = enum_key(s);
        // "hall effect" is how most vendors market magnetic switches
        if key == "HALL_EFFECT" {
            return Ok(Self::Magnetic);
        }
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == key)
            .ok_or_else(|| EnumParseError {
                kind: "switch technology",
                value: s.to_string(),
            })
    }
}

/// Specification fields shared by collection entries and master switches.
///
/// The serialized field names of this struct are the edit whitelist: an edit
/// suggestion can only ever touch these keys (see [`crate::diff`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchSpecs {
    pub name: String,
    pub chinese_name: Option<String>,
    pub manufacturer: Option<String>,
    #[serde(rename = "type")]
    pub switch_type: Option<SwitchType>,
    pub technology: Option<SwitchTechnology>,
    /// Grams-force at the actuation point.
    pub actuation_force: Option<f64>,
    pub bottom_out_force: Option<f64>,
    /// Millimetres to actuation.
    pub pre_travel: Option<f64>,
    /// Total travel in millimetres.
    pub bottom_out: Option<f64>,
    pub spring_weight: Option<String>,
    pub spring_length: Option<String>,
    pub top_housing: Option<String>,
    pub bottom_housing: Option<String>,
    pub stem: Option<String>,
    pub magnet_orientation: Option<String>,
    pub magnet_position: Option<String>,
    pub magnet_polarity: Option<String>,
    pub initial_force: Option<f64>,
    /// Gauss.
    pub initial_magnetic_flux: Option<f64>,
    pub bottom_out_magnetic_flux: Option<f64>,
    pub pcb_thickness: Option<String>,
    pub compatibility: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
}

// ── Collection ──────────────────────────────────────────────────────────────

fn default_quantity() -> i64 {
    1
}

/// Ownership details a user records about their own copy of a switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionDetails {
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    /// `YYYY-MM-DD`.
    pub date_obtained: Option<String>,
    pub personal_notes: Option<String>,
    pub personal_tags: Vec<String>,
    pub is_lubed: bool,
    pub is_filmed: bool,
    pub is_modified: bool,
    pub franken_top: Option<String>,
    pub franken_bottom: Option<String>,
    pub franken_stem: Option<String>,
}

impl Default for CollectionDetails {
    fn default() -> Self {
        Self {
            quantity: default_quantity(),
            date_obtained: None,
            personal_notes: None,
            personal_tags: Vec::new(),
            is_lubed: false,
            is_filmed: false,
            is_modified: false,
            franken_top: None,
            franken_bottom: None,
            franken_stem: None,
        }
    }
}

/// Everything a user can write when creating or updating a collection entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwitchInput {
    #[serde(flatten)]
    pub specs: SwitchSpecs,
    #[serde(flatten)]
    pub details: CollectionDetails,
}

/// A switch in a user's personal collection.
#[derive(Debug, Clone, Serialize)]
pub struct Switch {
    pub id: i64,
    pub user_id: i64,
    #[serde(flatten)]
    pub specs: SwitchSpecs,
    #[serde(flatten)]
    pub details: CollectionDetails,
    /// The master switch this entry was copied from, if any.
    pub master_switch_id: Option<String>,
    /// The master switch version at the time of the last copy.
    pub master_switch_version: Option<i64>,
    pub images: Vec<SwitchImage>,
    pub created_at: String,
    pub updated_at: String,
}

/// Maximum number of images attached to one collection entry.
pub const MAX_IMAGES_PER_SWITCH: usize = 10;

/// An image URL attached to a collection entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwitchImage {
    pub id: i64,
    pub switch_id: i64,
    pub url: String,
    pub order_index: i64,
    pub created_at: String,
}

// ── Master switches ─────────────────────────────────────────────────────────

/// Moderation state of a master-switch submission.
///
/// `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match enum_key(s).as_str() {
            "APPROVED" => Self::Approved,
            "REJECTED" => Self::Rejected,
            _ => Self::Pending,
        }
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = enum_key(s);
        [Self::Pending, Self::Approved, Self::Rejected]
            .into_iter()
            .find(|t| t.as_str() == key)
            .ok_or_else(|| EnumParseError {
                kind: "status",
                value: s.to_string(),
            })
    }
}

/// A community-curated canonical switch record.
#[derive(Debug, Clone, Serialize)]
pub struct MasterSwitch {
    pub id: String,
    #[serde(flatten)]
    pub specs: SwitchSpecs,
    pub status: SubmissionStatus,
    pub version: i64,
    pub submitted_by_id: Option<i64>,
    pub approved_by_id: Option<i64>,
    pub approved_at: Option<String>,
    pub rejection_reason: Option<String>,
    pub view_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Moderation state of an edit suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    /// Another approved edit changed the same fields first.
    Superseded,
}

impl EditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Superseded => "SUPERSEDED",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match enum_key(s).as_str() {
            "APPROVED" => Self::Approved,
            "REJECTED" => Self::Rejected,
            "SUPERSEDED" => Self::Superseded,
            _ => Self::Pending,
        }
    }
}

impl std::str::FromStr for EditStatus {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = enum_key(s);
        [Self::Pending, Self::Approved, Self::Rejected, Self::Superseded]
            .into_iter()
            .find(|t| t.as_str() == key)
            .ok_or_else(|| EnumParseError {
                kind: "status",
                value: s.to_string(),
            })
    }
}

/// A proposed change to a master switch, stored as a per-field diff.
#[derive(Debug, Clone, Serialize)]
pub struct MasterSwitchEdit {
    pub id: String,
    pub master_switch_id: String,
    pub edited_by_id: i64,
    pub previous_data: Map<String, Value>,
    pub new_data: Map<String, Value>,
    pub changed_fields: Vec<String>,
    pub status: EditStatus,
    pub approved_by_id: Option<i64>,
    pub approved_at: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: String,
}

// ── Manufacturers ───────────────────────────────────────────────────────────

/// A canonical manufacturer name plus the aliases that map onto it.
#[derive(Debug, Clone, Serialize)]
pub struct Manufacturer {
    pub id: i64,
    pub name: String,
    pub aliases: Vec<String>,
    pub verified: bool,
    pub submitted_by_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

// ── Wishlist ────────────────────────────────────────────────────────────────

/// A switch the user wants to acquire.
#[derive(Debug, Clone, Serialize)]
pub struct WishlistItem {
    pub id: i64,
    pub user_id: i64,
    pub master_switch_id: Option<String>,
    pub custom_name: Option<String>,
    pub custom_manufacturer: Option<String>,
    pub notes: Option<String>,
    pub priority: i64,
    pub created_at: String,
}

/// Fields a user supplies when adding to their wishlist. Either
/// `master_switch_id` or `custom_name` must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WishlistInput {
    pub master_switch_id: Option<String>,
    pub custom_name: Option<String>,
    pub custom_manufacturer: Option<String>,
    pub notes: Option<String>,
    pub priority: i64,
}

// ── Notifications ───────────────────────────────────────────────────────────

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    SubmissionApproved,
    SubmissionRejected,
    EditApproved,
    EditRejected,
    ManufacturerVerified,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubmissionApproved => "SUBMISSION_APPROVED",
            Self::SubmissionRejected => "SUBMISSION_REJECTED",
            Self::EditApproved => "EDIT_APPROVED",
            Self::EditRejected => "EDIT_REJECTED",
            Self::ManufacturerVerified => "MANUFACTURER_VERIFIED",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match enum_key(s).as_str() {
            "SUBMISSION_APPROVED" => Some(Self::SubmissionApproved),
            "SUBMISSION_REJECTED" => Some(Self::SubmissionRejected),
            "EDIT_APPROVED" => Some(Self::EditApproved),
            "EDIT_REJECTED" => Some(Self::EditRejected),
            "MANUFACTURER_VERIFIED" => Some(Self::ManufacturerVerified),
            _ => None,
        }
    }
}

/// An in-app message for a user.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: String,
}

/// A notification about to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_type_parses_loosely() {
        assert_eq!("linear".parse::<SwitchType>().unwrap(), SwitchType::Linear);
        assert_eq!(
            "Silent Tactile".parse::<SwitchType>().unwrap(),
            SwitchType::SilentTactile
        );
        assert_eq!(
            "silent-linear".parse::<SwitchType>().unwrap(),
            SwitchType::SilentLinear
        );
        assert!("mushy".parse::<SwitchType>().is_err());
    }

    #[test]
    fn hall_effect_is_magnetic() {
        assert_eq!(
            "Hall Effect".parse::<SwitchTechnology>().unwrap(),
            SwitchTechnology::Magnetic
        );
    }

    #[test]
    fn unknown_role_is_user() {
        assert_eq!(Role::from_str_loose("superuser"), Role::User);
        assert_eq!(Role::from_str_loose("admin"), Role::Admin);
    }

    #[test]
    fn statuses_parse_strictly() {
        assert_eq!("approved".parse::<SubmissionStatus>(), Ok(SubmissionStatus::Approved));
        assert_eq!("Superseded".parse::<EditStatus>(), Ok(EditStatus::Superseded));
        assert!("superseded".parse::<SubmissionStatus>().is_err());
        assert!("bogus".parse::<EditStatus>().is_err());
    }

    #[test]
    fn switch_input_defaults_quantity_to_one() {
        let input: SwitchInput = serde_json::from_str(r#"{"name": "Oil King"}"#).unwrap();
        assert_eq!(input.specs.name, "Oil King");
        assert_eq!(input.details.quantity, 1);
    }

    #[test]
    fn specs_serialize_type_key() {
        let specs = SwitchSpecs {
            name: "Holy Panda".to_string(),
            switch_type: Some(SwitchType::Tactile),
            ..Default::default()
        };
        let value = serde_json::to_value(&specs).unwrap();
        assert_eq!(value["type"], "TACTILE");
    }
}
