use switchbook_catalog::types::*;
use switchbook_catalog::{ManufacturerSeed, compute_diff};
use switchbook_db::*;

fn add_user(conn: &rusqlite::Connection, username: &str) -> i64 {
    insert_user(
        conn,
        username,
        &format!("{username}@example.com"),
        "hash",
        Role::User,
        &format!("{username:0>10}"),
    )
    .unwrap()
}

fn specs(name: &str, manufacturer: &str) -> SwitchSpecs {
    SwitchSpecs {
        name: name.to_string(),
        manufacturer: Some(manufacturer.to_string()),
        switch_type: Some(SwitchType::Linear),
        actuation_force: Some(45.0),
        ..Default::default()
    }
}

fn input(name: &str, manufacturer: &str) -> SwitchInput {
    SwitchInput {
        specs: specs(name, manufacturer),
        details: CollectionDetails {
            quantity: 70,
            personal_tags: vec!["thocky".to_string(), "favorite".to_string()],
            is_lubed: true,
            ..Default::default()
        },
    }
}

// ── Users & sessions ────────────────────────────────────────────────────────

#[test]
fn insert_and_find_user() {
    let conn = open_memory().unwrap();
    let id = add_user(&conn, "alice");

    let user = get_user(&conn, id).unwrap().unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.role, Role::User);

    // Lookups are case-insensitive
    assert_eq!(find_user_by_username(&conn, "ALICE").unwrap().unwrap().id, id);
    assert_eq!(find_user_by_email(&conn, "Alice@Example.com").unwrap().unwrap().id, id);
    assert_eq!(find_user_by_login(&conn, "alice@example.com").unwrap().unwrap().id, id);
    assert_eq!(find_user_by_login(&conn, "alice").unwrap().unwrap().id, id);
    assert!(find_user_by_login(&conn, "bob").unwrap().is_none());
}

#[test]
fn duplicate_username_or_email_conflicts() {
    let conn = open_memory().unwrap();
    add_user(&conn, "alice");

    let err = insert_user(&conn, "Alice", "other@example.com", "h", Role::User, "bbbbbbbbbb")
        .unwrap_err();
    assert!(matches!(err, OperationError::Conflict(ref m) if m.contains("Username")));

    let err = insert_user(&conn, "alice2", "ALICE@example.com", "h", Role::User, "cccccccccc")
        .unwrap_err();
    assert!(matches!(err, OperationError::Conflict(ref m) if m.contains("Email")));
}

#[test]
fn session_lifecycle() {
    let conn = open_memory().unwrap();
    let id = add_user(&conn, "alice");

    let session = create_session(&conn, id, 24).unwrap();
    assert_eq!(find_session_user(&conn, &session.token).unwrap().unwrap().id, id);

    delete_session(&conn, &session.token).unwrap();
    assert!(find_session_user(&conn, &session.token).unwrap().is_none());
}

#[test]
fn expired_sessions_are_ignored_and_purged() {
    let conn = open_memory().unwrap();
    let id = add_user(&conn, "alice");

    let expired = create_session(&conn, id, -1).unwrap();
    let live = create_session(&conn, id, 1).unwrap();
    assert!(find_session_user(&conn, &expired.token).unwrap().is_none());

    assert_eq!(purge_expired_sessions(&conn).unwrap(), 1);
    assert!(find_session_user(&conn, &live.token).unwrap().is_some());
}

#[test]
fn delete_user_sessions_keeps_current() {
    let conn = open_memory().unwrap();
    let id = add_user(&conn, "alice");
    let a = create_session(&conn, id, 1).unwrap();
    let b = create_session(&conn, id, 1).unwrap();

    assert_eq!(delete_user_sessions(&conn, id, Some(&a.token)).unwrap(), 1);
    assert!(find_session_user(&conn, &a.token).unwrap().is_some());
    assert!(find_session_user(&conn, &b.token).unwrap().is_none());
}

#[test]
fn reset_token_expires() {
    let conn = open_memory().unwrap();
    let id = add_user(&conn, "alice");

    set_reset_token(&conn, id, "tok-live", 60).unwrap();
    assert_eq!(find_user_by_reset_token(&conn, "tok-live").unwrap().unwrap().id, id);

    // Changing the password consumes the token
    update_password(&conn, id, "new-hash").unwrap();
    assert!(find_user_by_reset_token(&conn, "tok-live").unwrap().is_none());

    set_reset_token(&conn, id, "tok-old", -5).unwrap();
    assert!(find_user_by_reset_token(&conn, "tok-old").unwrap().is_none());
}

#[test]
fn shareable_id_is_unique() {
    let conn = open_memory().unwrap();
    let a = add_user(&conn, "alice");
    let b = add_user(&conn, "bob");

    set_shareable_id(&conn, a, "AbCdEf1234").unwrap();
    assert_eq!(
        find_user_by_shareable_id(&conn, "AbCdEf1234").unwrap().unwrap().id,
        a
    );
    assert!(matches!(
        set_shareable_id(&conn, b, "AbCdEf1234"),
        Err(OperationError::Conflict(_))
    ));
}

#[test]
fn role_change_and_missing_user() {
    let conn = open_memory().unwrap();
    let id = add_user(&conn, "alice");
    set_user_role(&conn, id, Role::Admin).unwrap();
    assert!(get_user(&conn, id).unwrap().unwrap().role.is_admin());

    assert!(matches!(
        set_user_role(&conn, 999, Role::Admin),
        Err(OperationError::NotFound { .. })
    ));
}

// ── Manufacturers ───────────────────────────────────────────────────────────

#[test]
fn manufacturer_lookup_by_name_and_alias_key() {
    let conn = open_memory().unwrap();
    let id = insert_manufacturer(&conn, "  Gateron ", true, None).unwrap();
    add_manufacturer_alias(&conn, id, "GTR").unwrap();

    let m = get_manufacturer(&conn, id).unwrap().unwrap();
    assert_eq!(m.name, "Gateron");
    assert_eq!(m.aliases, vec!["GTR"]);

    assert_eq!(find_manufacturer_by_key(&conn, "gateron").unwrap().unwrap().id, id);
    assert_eq!(find_manufacturer_by_key(&conn, "gtr").unwrap().unwrap().id, id);
    assert!(find_manufacturer_by_key(&conn, "kailh").unwrap().is_none());
}

#[test]
fn duplicate_manufacturer_key_conflicts() {
    let conn = open_memory().unwrap();
    insert_manufacturer(&conn, "Gateron", true, None).unwrap();
    assert!(matches!(
        insert_manufacturer(&conn, "GATERON Co., Ltd.", false, None),
        Err(OperationError::Conflict(_))
    ));
}

#[test]
fn alias_owned_by_other_manufacturer_conflicts() {
    let conn = open_memory().unwrap();
    let gateron = insert_manufacturer(&conn, "Gateron", true, None).unwrap();
    let kailh = insert_manufacturer(&conn, "Kailh", true, None).unwrap();

    assert!(!add_manufacturer_alias(&conn, gateron, "gateron").unwrap());
    assert!(matches!(
        add_manufacturer_alias(&conn, kailh, "Gateron"),
        Err(OperationError::Conflict(_))
    ));
}

#[test]
fn rename_manufacturer_promotes_alias() {
    let conn = open_memory().unwrap();
    let id = insert_manufacturer(&conn, "Kaihua", true, None).unwrap();
    set_manufacturer_aliases(&conn, id, &["Kailh".to_string()]).unwrap();

    rename_manufacturer(&conn, id, "Kailh").unwrap();
    let m = get_manufacturer(&conn, id).unwrap().unwrap();
    assert_eq!(m.name, "Kailh");
    assert!(m.aliases.is_empty());
}

#[test]
fn rename_references_ignores_case() {
    let conn = open_memory().unwrap();
    let user = add_user(&conn, "alice");
    insert_switch(&conn, user, &input("Box Jade", "kailh"), None).unwrap();
    insert_switch(&conn, user, &input("Box Navy", "KAILH"), None).unwrap();
    insert_master_switch(&conn, &specs("Box White", "Kailh"), user).unwrap();

    // Only rows not already spelled "Kailh" change
    assert_eq!(rename_manufacturer_references(&conn, "kailh", "Kailh").unwrap(), 2);
}

#[test]
fn seed_manufacturers_inserts_then_updates() {
    let conn = open_memory().unwrap();
    let unverified = insert_manufacturer(&conn, "jwk", false, None).unwrap();

    let seeds = vec![
        ManufacturerSeed {
            name: "Gateron".to_string(),
            aliases: vec!["GTR".to_string()],
        },
        ManufacturerSeed {
            name: "JWK".to_string(),
            aliases: vec!["JWICK".to_string(), "Durock".to_string()],
        },
    ];
    let stats = seed_manufacturers(&conn, &seeds).unwrap();
    assert_eq!(stats.inserted, 1);
    assert_eq!(stats.updated, 1);
    assert_eq!(stats.aliases, 3);

    let jwk = get_manufacturer(&conn, unverified).unwrap().unwrap();
    assert_eq!(jwk.name, "JWK");
    assert!(jwk.verified);

    // Re-running adds nothing new
    let again = seed_manufacturers(&conn, &seeds).unwrap();
    assert_eq!(again.inserted, 0);
    assert_eq!(again.aliases, 0);
}

// ── Collection ──────────────────────────────────────────────────────────────

#[test]
fn insert_get_update_delete_switch() {
    let conn = open_memory().unwrap();
    let user = add_user(&conn, "alice");
    let id = insert_switch(&conn, user, &input("Oil King", "Gateron"), None).unwrap();

    let s = get_switch(&conn, id).unwrap().unwrap();
    assert_eq!(s.specs.name, "Oil King");
    assert_eq!(s.specs.switch_type, Some(SwitchType::Linear));
    assert_eq!(s.details.quantity, 70);
    assert_eq!(s.details.personal_tags, vec!["thocky", "favorite"]);
    assert!(s.details.is_lubed);
    assert!(s.master_switch_id.is_none());

    let mut changed = input("Oil King", "Gateron");
    changed.details.quantity = 90;
    changed.specs.notes = Some("   ".to_string());
    update_switch(&conn, id, &changed).unwrap();
    let s = get_switch(&conn, id).unwrap().unwrap();
    assert_eq!(s.details.quantity, 90);
    // Blank text is stored as NULL
    assert_eq!(s.specs.notes, None);

    delete_switch(&conn, id).unwrap();
    assert!(get_switch(&conn, id).unwrap().is_none());
    assert!(matches!(
        delete_switch(&conn, id),
        Err(OperationError::NotFound { .. })
    ));
}

#[test]
fn get_user_switch_hides_other_users_entries() {
    let conn = open_memory().unwrap();
    let alice = add_user(&conn, "alice");
    let bob = add_user(&conn, "bob");
    let id = insert_switch(&conn, alice, &input("Oil King", "Gateron"), None).unwrap();

    assert!(get_user_switch(&conn, alice, id).unwrap().is_some());
    assert!(get_user_switch(&conn, bob, id).unwrap().is_none());
}

#[test]
fn sync_switch_copies_specs_and_version() {
    let conn = open_memory().unwrap();
    let user = add_user(&conn, "alice");
    let master = insert_master_switch(&conn, &specs("Ink Black", "Gateron"), user).unwrap();
    let id = insert_switch(&conn, user, &input("Ink Black", "Gateron"), Some((master.as_str(), 1))).unwrap();

    let mut newer = specs("Ink Black V2", "Gateron");
    newer.actuation_force = Some(60.0);
    sync_switch_specs(&conn, id, &newer, 2).unwrap();

    let s = get_switch(&conn, id).unwrap().unwrap();
    assert_eq!(s.specs.name, "Ink Black V2");
    assert_eq!(s.specs.actuation_force, Some(60.0));
    assert_eq!(s.master_switch_version, Some(2));
    // Personal details are untouched
    assert_eq!(s.details.quantity, 70);
}

// ── Images ──────────────────────────────────────────────────────────────────

#[test]
fn images_append_delete_and_reorder() {
    let conn = open_memory().unwrap();
    let user = add_user(&conn, "alice");
    let id = insert_switch(&conn, user, &input("Oil King", "Gateron"), None).unwrap();

    let a = add_switch_image(&conn, id, "https://img.example.com/a.jpg").unwrap();
    let b = add_switch_image(&conn, id, "https://img.example.com/b.jpg").unwrap();
    let c = add_switch_image(&conn, id, "https://img.example.com/c.jpg").unwrap();
    assert_eq!((a.order_index, b.order_index, c.order_index), (0, 1, 2));

    reorder_switch_images(&conn, id, &[c.id, a.id, b.id]).unwrap();
    let order: Vec<i64> = switch_images(&conn, id).unwrap().iter().map(|i| i.id).collect();
    assert_eq!(order, vec![c.id, a.id, b.id]);

    delete_switch_image(&conn, id, a.id).unwrap();
    let images = switch_images(&conn, id).unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(
        images.iter().map(|i| i.order_index).collect::<Vec<_>>(),
        vec![0, 1]
    );
}

#[test]
fn reorder_requires_a_permutation() {
    let conn = open_memory().unwrap();
    let user = add_user(&conn, "alice");
    let id = insert_switch(&conn, user, &input("Oil King", "Gateron"), None).unwrap();
    let a = add_switch_image(&conn, id, "https://img.example.com/a.jpg").unwrap();
    let b = add_switch_image(&conn, id, "https://img.example.com/b.jpg").unwrap();

    assert!(matches!(
        reorder_switch_images(&conn, id, &[a.id]),
        Err(OperationError::Invalid(_))
    ));
    assert!(matches!(
        reorder_switch_images(&conn, id, &[a.id, a.id]),
        Err(OperationError::Invalid(_))
    ));
    reorder_switch_images(&conn, id, &[b.id, a.id]).unwrap();
}

#[test]
fn image_limit_is_enforced() {
    let conn = open_memory().unwrap();
    let user = add_user(&conn, "alice");
    let id = insert_switch(&conn, user, &input("Oil King", "Gateron"), None).unwrap();
    for i in 0..MAX_IMAGES_PER_SWITCH {
        add_switch_image(&conn, id, &format!("https://img.example.com/{i}.jpg")).unwrap();
    }
    assert!(matches!(
        add_switch_image(&conn, id, "https://img.example.com/extra.jpg"),
        Err(OperationError::LimitReached { max: 10, .. })
    ));
}

// ── Master switches & edits ─────────────────────────────────────────────────

#[test]
fn master_switch_starts_pending_at_version_zero() {
    let conn = open_memory().unwrap();
    let user = add_user(&conn, "alice");
    let id = insert_master_switch(&conn, &specs("Cream", "NovelKeys"), user).unwrap();

    let m = get_master_switch(&conn, &id).unwrap().unwrap();
    assert_eq!(m.status, SubmissionStatus::Pending);
    assert_eq!(m.version, 0);
    assert_eq!(m.submitted_by_id, Some(user));
}

#[test]
fn approve_only_from_pending() {
    let conn = open_memory().unwrap();
    let user = add_user(&conn, "alice");
    let admin = add_user(&conn, "admin");
    let id = insert_master_switch(&conn, &specs("Cream", "NovelKeys"), user).unwrap();

    assert!(approve_master_switch(&conn, &id, admin).unwrap());
    let m = get_master_switch(&conn, &id).unwrap().unwrap();
    assert_eq!(m.status, SubmissionStatus::Approved);
    assert_eq!(m.version, 1);
    assert_eq!(m.approved_by_id, Some(admin));
    assert!(m.approved_at.is_some());

    // A second approval or a rejection changes nothing
    assert!(!approve_master_switch(&conn, &id, admin).unwrap());
    assert!(!reject_master_switch(&conn, &id, Some("dupe")).unwrap());
    assert_eq!(get_master_switch(&conn, &id).unwrap().unwrap().version, 1);
}

#[test]
fn reject_records_reason() {
    let conn = open_memory().unwrap();
    let user = add_user(&conn, "alice");
    let id = insert_master_switch(&conn, &specs("Cream", "NovelKeys"), user).unwrap();

    assert!(reject_master_switch(&conn, &id, Some("Duplicate entry")).unwrap());
    let m = get_master_switch(&conn, &id).unwrap().unwrap();
    assert_eq!(m.status, SubmissionStatus::Rejected);
    assert_eq!(m.rejection_reason.as_deref(), Some("Duplicate entry"));
    assert_eq!(m.version, 0);
}

#[test]
fn update_master_specs_bumps_version() {
    let conn = open_memory().unwrap();
    let user = add_user(&conn, "alice");
    let id = insert_master_switch(&conn, &specs("Cream", "NovelKeys"), user).unwrap();
    approve_master_switch(&conn, &id, user).unwrap();

    let version = update_master_switch_specs(&conn, &id, &specs("Cream Arc", "NovelKeys")).unwrap();
    assert_eq!(version, 2);
    assert!(matches!(
        update_master_switch_specs(&conn, "missing", &specs("x", "y")),
        Err(OperationError::NotFound { .. })
    ));
}

#[test]
fn edit_round_trips_diff() {
    let conn = open_memory().unwrap();
    let user = add_user(&conn, "alice");
    let current = specs("Cream", "NovelKeys");
    let master = insert_master_switch(&conn, &current, user).unwrap();

    let mut proposed = current.clone();
    proposed.actuation_force = Some(55.0);
    let diff = compute_diff(&current, &proposed).unwrap();
    let id = insert_edit(&conn, &master, user, &diff).unwrap();

    let edit = get_edit(&conn, &id).unwrap().unwrap();
    assert_eq!(edit.status, EditStatus::Pending);
    assert_eq!(edit.changed_fields, vec!["actuation_force"]);
    assert_eq!(edit.new_data["actuation_force"], 55.0);
    assert_eq!(edit.previous_data["actuation_force"], 45.0);

    assert!(close_edit(&conn, &id, EditStatus::Approved, Some(user), None).unwrap());
    let edit = get_edit(&conn, &id).unwrap().unwrap();
    assert_eq!(edit.status, EditStatus::Approved);
    assert!(edit.approved_at.is_some());
    assert!(!close_edit(&conn, &id, EditStatus::Rejected, None, None).unwrap());
}

// ── Wishlist & notifications ────────────────────────────────────────────────

#[test]
fn wishlist_rejects_duplicate_master() {
    let conn = open_memory().unwrap();
    let user = add_user(&conn, "alice");
    let master = insert_master_switch(&conn, &specs("Cream", "NovelKeys"), user).unwrap();
    let item = WishlistInput {
        master_switch_id: Some(master),
        priority: 3,
        ..Default::default()
    };

    let id = insert_wishlist_item(&conn, user, &item).unwrap();
    assert!(matches!(
        insert_wishlist_item(&conn, user, &item),
        Err(OperationError::Conflict(_))
    ));

    // Custom entries have no master and never collide
    let custom = WishlistInput {
        custom_name: Some("Mystery switch".to_string()),
        ..Default::default()
    };
    insert_wishlist_item(&conn, user, &custom).unwrap();
    insert_wishlist_item(&conn, user, &custom).unwrap();

    delete_wishlist_item(&conn, user, id).unwrap();
    assert!(get_wishlist_item(&conn, user, id).unwrap().is_none());
}

#[test]
fn wishlist_items_are_private() {
    let conn = open_memory().unwrap();
    let alice = add_user(&conn, "alice");
    let bob = add_user(&conn, "bob");
    let custom = WishlistInput {
        custom_name: Some("Mystery switch".to_string()),
        ..Default::default()
    };
    let id = insert_wishlist_item(&conn, alice, &custom).unwrap();

    assert!(get_wishlist_item(&conn, bob, id).unwrap().is_none());
    assert!(matches!(
        delete_wishlist_item(&conn, bob, id),
        Err(OperationError::NotFound { .. })
    ));
}

#[test]
fn notifications_mark_read() {
    let conn = open_memory().unwrap();
    let user = add_user(&conn, "alice");
    let other = add_user(&conn, "bob");
    let note = |title: &str| NewNotification {
        user_id: user,
        kind: NotificationKind::SubmissionApproved,
        title: title.to_string(),
        message: "ok".to_string(),
        link: None,
    };
    let first = insert_notification(&conn, &note("one")).unwrap();
    insert_notification(&conn, &note("two")).unwrap();
    assert_eq!(unread_notification_count(&conn, user).unwrap(), 2);

    assert!(mark_notification_read(&conn, other, first).is_err());
    mark_notification_read(&conn, user, first).unwrap();
    assert_eq!(unread_notification_count(&conn, user).unwrap(), 1);

    assert_eq!(mark_all_notifications_read(&conn, user).unwrap(), 1);
    assert_eq!(unread_notification_count(&conn, user).unwrap(), 0);
}
