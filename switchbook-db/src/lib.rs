//! SQLite persistence layer for Switchbook.
//!
//! Provides schema creation and migration, CRUD operations, and query APIs
//! backed by SQLite (via rusqlite with bundled feature).

pub mod operations;
pub mod queries;
mod rows;
pub mod schema;

pub use operations::{
    OperationError, SeedStats, add_manufacturer_alias, add_switch_image, approve_master_switch,
    close_edit, create_session, delete_manufacturer, delete_session, delete_switch,
    delete_switch_image, delete_user_sessions, delete_wishlist_item, find_manufacturer_by_key,
    find_session_user, find_user_by_email, find_user_by_login, find_user_by_reset_token,
    find_user_by_shareable_id, find_user_by_username, get_edit, get_manufacturer,
    get_master_switch, get_switch, get_user, get_user_switch, get_wishlist_item,
    increment_master_view_count, insert_edit, insert_manufacturer, insert_master_switch,
    insert_notification, insert_switch, insert_user, insert_wishlist_item, link_switch_to_master,
    manufacturer_aliases, mark_all_notifications_read, mark_notification_read,
    purge_expired_sessions, reject_master_switch, rename_manufacturer,
    rename_manufacturer_references, reorder_switch_images, seed_manufacturers,
    set_manufacturer_aliases, set_manufacturer_verified,
    set_reset_token, set_shareable_id, set_user_role, switch_images,
    sync_switch_specs, update_master_switch_specs, update_password, update_switch,
};
pub use queries::{
    CollectionStats, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, ManufacturerSummary, ManufacturerUsage,
    MasterSort, MasterSwitchQuery, OutdatedSwitch, Page, SiteStats, SwitchFilter, WishlistEntry,
    collection_stats, edits_by_status, edits_for_master, known_manufacturers, list_manufacturers,
    list_master_switches, list_notifications, list_switches, list_users, list_wishlist,
    manufacturer_spellings, manufacturer_usage, master_switches_by_status,
    master_switches_by_submitter, outdated_switches, search_manufacturers, site_stats,
    unlinked_switches, unread_notification_count, users_without_shareable_id,
};
pub use schema::{SchemaError, open_database, open_memory};
