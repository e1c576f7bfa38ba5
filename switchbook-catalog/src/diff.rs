//! Field-level diffs between two sets of switch specifications.
//!
//! An edit suggestion is stored as two JSON objects holding only the changed
//! keys: the values before the edit and the proposed values. Only keys in
//! [`EDITABLE_FIELDS`] are ever compared or applied.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::SwitchSpecs;

/// Serialized names of the [`SwitchSpecs`] fields an edit may change.
pub const EDITABLE_FIELDS: &[&str] = &[
    "name",
    "chinese_name",
    "manufacturer",
    "type",
    "technology",
    "actuation_force",
    "bottom_out_force",
    "pre_travel",
    "bottom_out",
    "spring_weight",
    "spring_length",
    "top_housing",
    "bottom_housing",
    "stem",
    "magnet_orientation",
    "magnet_position",
    "magnet_polarity",
    "initial_force",
    "initial_magnetic_flux",
    "bottom_out_magnetic_flux",
    "pcb_thickness",
    "compatibility",
    "notes",
    "image_url",
];

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Specifications did not serialize to an object")]
    NotAnObject,
}

/// The changed fields between two spec sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecDiff {
    /// Old values of the changed fields.
    pub previous: Map<String, Value>,
    /// New values of the changed fields.
    pub proposed: Map<String, Value>,
    /// Changed field names in whitelist order.
    pub changed_fields: Vec<String>,
}

impl SpecDiff {
    pub fn is_empty(&self) -> bool {
        self.changed_fields.is_empty()
    }
}

/// Whether two changed-field lists share at least one field.
pub fn fields_overlap(a: &[String], b: &[String]) -> bool {
    a.iter().any(|f| b.contains(f))
}

fn to_object(specs: &SwitchSpecs) -> Result<Map<String, Value>, DiffError> {
    match serde_json::to_value(specs)? {
        Value::Object(map) => Ok(map),
        _ => Err(DiffError::NotAnObject),
    }
}

/// Compare text the way it is stored: trimmed, with blank meaning `null`.
fn canonical(value: Option<&Value>) -> Value {
    match value {
        None | Some(Value::Null) => Value::Null,
        Some(Value::String(s)) if s.trim().is_empty() => Value::Null,
        Some(Value::String(s)) => Value::String(s.trim().to_string()),
        Some(v) => v.clone(),
    }
}

/// Compute the whitelisted fields that differ between `current` and `proposed`.
pub fn compute_diff(current: &SwitchSpecs, proposed: &SwitchSpecs) -> Result<SpecDiff, DiffError> {
    let old = to_object(current)?;
    let new = to_object(proposed)?;

    let mut diff = SpecDiff::default();
    for &field in EDITABLE_FIELDS {
        let before = canonical(old.get(field));
        let after = canonical(new.get(field));
        if before != after {
            diff.previous.insert(field.to_string(), before);
            diff.proposed.insert(field.to_string(), after);
            diff.changed_fields.push(field.to_string());
        }
    }

    Ok(diff)
}

/// Copy the whitelisted keys present in `new_data` onto `target`.
///
/// Keys outside [`EDITABLE_FIELDS`] are ignored. Fails if a value has the
/// wrong type for its field.
pub fn apply_diff(target: &SwitchSpecs, new_data: &Map<String, Value>) -> Result<SwitchSpecs, DiffError> {
    let mut object = to_object(target)?;
    for &field in EDITABLE_FIELDS {
        if let Some(value) = new_data.get(field) {
            object.insert(field.to_string(), value.clone());
        }
    }
    Ok(serde_json::from_value(Value::Object(object))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelist_covers_every_spec_field() {
        let object = to_object(&SwitchSpecs::default()).unwrap();
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        let mut fields = EDITABLE_FIELDS.to_vec();
        fields.sort_unstable();
        assert_eq!(keys, fields);
    }
}
