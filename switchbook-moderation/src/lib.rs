//! Transactional workflows on top of the Switchbook database.
//!
//! This crate owns the business rules: master-switch submission and
//! moderation, edit suggestions, manufacturer resolution and the admin
//! manufacturer tools, collection and wishlist writes, accounts, and the
//! one-off data migrations. Every multi-row change runs in one SQLite
//! transaction.

pub mod accounts;
pub mod collection;
pub mod edits;
pub mod error;
pub mod manufacturers;
pub mod migrations;
pub mod notify;
pub mod progress;
pub mod submissions;

pub use accounts::{change_role, create_account, regenerate_shareable_id};
pub use collection::{
    ImportReport, add_master_to_collection, add_to_wishlist, create_switch, delete_switch,
    import_collection, move_wishlist_to_collection, sync_with_master, update_switch,
};
pub use edits::{EditApproval, approve_edit, reject_edit, suggest_edit};
pub use error::ModerationError;
pub use manufacturers::{
    ManufacturerSubmission, MergeReport, delete_unused_manufacturer, merge_manufacturers,
    normalize_specs, resolve_or_register, submit_manufacturer, update_manufacturer,
    verify_manufacturer,
};
pub use migrations::{
    Link, LinkReport, NormalizeReport, Rename, backfill_shareable_ids, link_master_switches,
    normalize_manufacturers,
};
pub use notify::{EmailMessage, Transition};
pub use progress::{LogProgress, MigrationProgress, SilentProgress};
pub use submissions::{
    approve_submission, reject_submission, submit_master_switch, view_master_switch,
};
