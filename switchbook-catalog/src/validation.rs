//! Input validation for user-submitted data.

use thiserror::Error;

use crate::types::{CollectionDetails, SwitchInput, SwitchSpecs, WishlistInput};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Username must be 3-32 characters of letters, digits, '-' or '_'")]
    Username,
    #[error("Invalid email address")]
    Email,
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{field} must be an http(s) URL")]
    Url { field: &'static str },
    #[error("{field} must be a date in YYYY-MM-DD form")]
    Date { field: &'static str },
}

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_TEXT_LEN: usize = 2000;
const MAX_FORCE_GF: f64 = 1000.0;
const MAX_TRAVEL_MM: f64 = 10.0;
const MAX_FLUX_GAUSS: f64 = 10_000.0;

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let ok = (3..=32).contains(&username.chars().count())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok { Ok(()) } else { Err(ValidationError::Username) }
}

/// Shape check only: one `@`, non-empty local part, dotted domain.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::Email);
    };
    let ok = !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace);
    if ok { Ok(()) } else { Err(ValidationError::Email) }
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

pub fn validate_url(field: &'static str, url: &str) -> Result<(), ValidationError> {
    let url = url.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !url.chars().any(char::is_whitespace) => Ok(()),
        _ => Err(ValidationError::Url { field }),
    }
}

fn check_len(field: &'static str, value: Option<&str>, max: usize) -> Result<(), ValidationError> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong { field, max }),
        _ => Ok(()),
    }
}

fn check_range(field: &'static str, value: Option<f64>, max: f64) -> Result<(), ValidationError> {
    match value {
        Some(v) if !(0.0..=max).contains(&v) => Err(ValidationError::OutOfRange {
            field,
            min: 0.0,
            max,
        }),
        _ => Ok(()),
    }
}

/// Validate the specification fields shared by collection entries and
/// master switches.
pub fn validate_specs(specs: &SwitchSpecs) -> Result<(), ValidationError> {
    if specs.name.trim().is_empty() {
        return Err(ValidationError::Required { field: "name" });
    }
    check_len("name", Some(&specs.name), MAX_NAME_LEN)?;
    check_len("chinese_name", specs.chinese_name.as_deref(), MAX_NAME_LEN)?;
    check_len("manufacturer", specs.manufacturer.as_deref(), MAX_NAME_LEN)?;
    check_len("notes", specs.notes.as_deref(), MAX_TEXT_LEN)?;

    check_range("actuation_force", specs.actuation_force, MAX_FORCE_GF)?;
    check_range("bottom_out_force", specs.bottom_out_force, MAX_FORCE_GF)?;
    check_range("initial_force", specs.initial_force, MAX_FORCE_GF)?;
    check_range("pre_travel", specs.pre_travel, MAX_TRAVEL_MM)?;
    check_range("bottom_out", specs.bottom_out, MAX_TRAVEL_MM)?;
    check_range("initial_magnetic_flux", specs.initial_magnetic_flux, MAX_FLUX_GAUSS)?;
    check_range(
        "bottom_out_magnetic_flux",
        specs.bottom_out_magnetic_flux,
        MAX_FLUX_GAUSS,
    )?;

    if let Some(url) = specs.image_url.as_deref().filter(|u| !u.trim().is_empty()) {
        validate_url("image_url", url)?;
    }
    Ok(())
}

pub fn validate_details(details: &CollectionDetails) -> Result<(), ValidationError> {
    if !(1..=100_000).contains(&details.quantity) {
        return Err(ValidationError::OutOfRange {
            field: "quantity",
            min: 1.0,
            max: 100_000.0,
        });
    }
    if let Some(date) = details.date_obtained.as_deref().filter(|d| !d.is_empty()) {
        chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| ValidationError::Date {
                field: "date_obtained",
            })?;
    }
    check_len("personal_notes", details.personal_notes.as_deref(), MAX_TEXT_LEN)?;
    Ok(())
}

pub fn validate_switch_input(input: &SwitchInput) -> Result<(), ValidationError> {
    validate_specs(&input.specs)?;
    validate_details(&input.details)
}

/// A wishlist entry names either a master switch or a custom switch.
pub fn validate_wishlist_input(input: &WishlistInput) -> Result<(), ValidationError> {
    let has_master = input
        .master_switch_id
        .as_deref()
        .is_some_and(|id| !id.trim().is_empty());
    let has_custom = input
        .custom_name
        .as_deref()
        .is_some_and(|n| !n.trim().is_empty());
    if !has_master && !has_custom {
        return Err(ValidationError::Required {
            field: "master_switch_id or custom_name",
        });
    }
    check_len("custom_name", input.custom_name.as_deref(), MAX_NAME_LEN)?;
    check_len(
        "custom_manufacturer",
        input.custom_manufacturer.as_deref(),
        MAX_NAME_LEN,
    )?;
    check_len("notes", input.notes.as_deref(), MAX_TEXT_LEN)?;
    if !(0..=10).contains(&input.priority) {
        return Err(ValidationError::OutOfRange {
            field: "priority",
            min: 0.0,
            max: 10.0,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames() {
        assert!(validate_username("keeb_fan-01").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(33)).is_err());
    }

    #[test]
    fn emails() {
        assert!(validate_email("someone@example.com").is_ok());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("a@localhost").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn passwords() {
        assert!(validate_password("hunter22").is_ok());
        assert_eq!(
            validate_password("short"),
            Err(ValidationError::PasswordTooShort { min: 8 })
        );
    }

    #[test]
    fn specs_require_name_and_sane_numbers() {
        let mut specs = SwitchSpecs::default();
        assert_eq!(
            validate_specs(&specs),
            Err(ValidationError::Required { field: "name" })
        );

        specs.name = "Cherry MX Black".to_string();
        specs.actuation_force = Some(60.0);
        assert!(validate_specs(&specs).is_ok());

        specs.pre_travel = Some(-1.0);
        assert!(matches!(
            validate_specs(&specs),
            Err(ValidationError::OutOfRange { field: "pre_travel", .. })
        ));
    }

    #[test]
    fn image_url_must_be_http() {
        let specs = SwitchSpecs {
            name: "Box Jade".to_string(),
            image_url: Some("javascript:alert(1)".to_string()),
            ..Default::default()
        };
        assert_eq!(
            validate_specs(&specs),
            Err(ValidationError::Url { field: "image_url" })
        );
    }

    #[test]
    fn details_check_quantity_and_date() {
        let mut details = CollectionDetails::default();
        assert!(validate_details(&details).is_ok());

        details.quantity = 0;
        assert!(validate_details(&details).is_err());

        details.quantity = 70;
        details.date_obtained = Some("2023-13-01".to_string());
        assert_eq!(
            validate_details(&details),
            Err(ValidationError::Date {
                field: "date_obtained"
            })
        );
    }

    #[test]
    fn wishlist_needs_master_or_custom_name() {
        let mut input = WishlistInput::default();
        assert!(validate_wishlist_input(&input).is_err());

        input.custom_name = Some("Gateron Oil King".to_string());
        assert!(validate_wishlist_input(&input).is_ok());

        input.priority = 11;
        assert!(validate_wishlist_input(&input).is_err());
    }
}
