//! Shareable IDs: short random public identifiers for collection links.

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Length of a generated shareable ID.
pub const SHAREABLE_ID_LEN: usize = 10;

/// Generate a new random alphanumeric shareable ID.
pub fn generate_shareable_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SHAREABLE_ID_LEN)
        .map(char::from)
        .collect()
}

/// Whether `id` has the shape of a shareable ID. Cheap pre-check before a
/// database lookup on a public route.
pub fn is_valid_shareable_id(id: &str) -> bool {
    id.len() == SHAREABLE_ID_LEN && id.chars().all(|c| c.is_ascii_alphanumeric())
}
