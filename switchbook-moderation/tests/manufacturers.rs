use rusqlite::Connection;
use switchbook_catalog::types::*;
use switchbook_db::*;
use switchbook_moderation::*;

fn setup() -> (Connection, User) {
    let conn = open_memory().unwrap();
    let alice = create_account(&conn, "alice", "alice@example.com", "hash", Role::User).unwrap();
    let gateron = insert_manufacturer(&conn, "Gateron", true, None).unwrap();
    add_manufacturer_alias(&conn, gateron, "JWK Gateron").unwrap();
    insert_manufacturer(&conn, "Kailh", true, None).unwrap();
    (conn, alice)
}

fn switch_with(name: &str, manufacturer: &str) -> SwitchInput {
    SwitchInput {
        specs: SwitchSpecs {
            name: name.to_string(),
            manufacturer: Some(manufacturer.to_string()),
            ..Default::default()
        },
        details: CollectionDetails::default(),
    }
}

#[test]
fn resolve_or_register_maps_known_spellings() {
    let (conn, alice) = setup();
    let resolved = |input: &str| resolve_or_register(&conn, input, Some(alice.id)).unwrap();

    assert_eq!(resolved("GATERON").as_deref(), Some("Gateron"));
    assert_eq!(resolved("Gateron Co., Ltd.").as_deref(), Some("Gateron"));
    assert_eq!(resolved("jwk-gateron").as_deref(), Some("Gateron"));
    assert_eq!(resolved("   "), None);
    assert_eq!(list_manufacturers(&conn).unwrap().len(), 2);
}

#[test]
fn resolve_or_register_creates_unverified_once() {
    let (conn, alice) = setup();
    assert_eq!(
        resolve_or_register(&conn, "Akko", Some(alice.id)).unwrap().as_deref(),
        Some("Akko")
    );
    assert_eq!(
        resolve_or_register(&conn, "AKKO", Some(alice.id)).unwrap().as_deref(),
        Some("Akko")
    );

    let akko = find_manufacturer_by_key(&conn, "akko").unwrap().unwrap();
    assert!(!akko.verified);
    assert_eq!(akko.submitted_by_id, Some(alice.id));
    assert_eq!(list_manufacturers(&conn).unwrap().len(), 3);
}

#[test]
fn punctuation_only_name_is_invalid() {
    let (conn, alice) = setup();
    let err = resolve_or_register(&conn, "---", Some(alice.id)).unwrap_err();
    assert!(matches!(err, ModerationError::Invalid(_)));
}

#[test]
fn submit_manufacturer_warns_about_near_duplicates() {
    let (conn, alice) = setup();

    let existing = submit_manufacturer(&conn, "jwk gateron", alice.id).unwrap();
    assert!(!existing.created);
    assert_eq!(existing.manufacturer.name, "Gateron");

    let typo = submit_manufacturer(&conn, "Gaterin", alice.id).unwrap();
    assert!(typo.created);
    assert!(!typo.manufacturer.verified);
    assert_eq!(typo.similar, vec!["Gateron".to_string()]);
}

#[test]
fn verify_notifies_submitter_and_is_idempotent() {
    let (conn, alice) = setup();
    let akko = submit_manufacturer(&conn, "Akko", alice.id).unwrap().manufacturer;

    let first = verify_manufacturer(&conn, akko.id).unwrap();
    assert!(first.record.verified);
    assert_eq!(first.emails.len(), 1);
    assert_eq!(first.emails[0].to, "alice@example.com");

    let second = verify_manufacturer(&conn, akko.id).unwrap();
    assert!(second.record.verified);
    assert!(second.emails.is_empty());

    let notes = list_notifications(&conn, alice.id, false, 10).unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, NotificationKind::ManufacturerVerified);

    assert!(matches!(
        verify_manufacturer(&conn, 999),
        Err(ModerationError::NotFound { .. })
    ));
}

#[test]
fn rename_keeps_old_name_as_alias_and_updates_switches() {
    let (conn, alice) = setup();
    let switch = create_switch(&conn, alice.id, &switch_with("Box Jade", "kailh")).unwrap();
    assert_eq!(switch.specs.manufacturer.as_deref(), Some("Kailh"));

    let kailh = find_manufacturer_by_key(&conn, "kailh").unwrap().unwrap();
    let renamed = update_manufacturer(&conn, kailh.id, Some("Kaihua"), None).unwrap();
    assert_eq!(renamed.name, "Kaihua");
    assert!(renamed.aliases.contains(&"Kailh".to_string()));

    let switch = get_switch(&conn, switch.id).unwrap().unwrap();
    assert_eq!(switch.specs.manufacturer.as_deref(), Some("Kaihua"));

    // Old spelling still resolves
    assert_eq!(
        resolve_or_register(&conn, "Kailh", None).unwrap().as_deref(),
        Some("Kaihua")
    );
}

#[test]
fn update_replaces_aliases() {
    let (conn, _) = setup();
    let gateron = find_manufacturer_by_key(&conn, "gateron").unwrap().unwrap();
    let updated = update_manufacturer(
        &conn,
        gateron.id,
        None,
        Some(&["Gateron Optical".to_string(), "GTR".to_string()]),
    )
    .unwrap();
    assert_eq!(updated.name, "Gateron");
    assert_eq!(updated.aliases.len(), 2);
    assert!(updated.aliases.contains(&"Gateron Optical".to_string()));
    assert!(updated.aliases.contains(&"GTR".to_string()));
    assert!(find_manufacturer_by_key(&conn, "jwkgateron").unwrap().is_none());
}

#[test]
fn merge_moves_names_aliases_and_references() {
    let (conn, alice) = setup();
    let typo = submit_manufacturer(&conn, "Gaterin", alice.id).unwrap().manufacturer;
    create_switch(&conn, alice.id, &switch_with("Yellow", "Gaterin")).unwrap();
    create_switch(&conn, alice.id, &switch_with("Red", "GATERIN")).unwrap();
    let master = submit_master_switch(
        &conn,
        alice.id,
        &SwitchSpecs {
            name: "Milky Yellow".to_string(),
            manufacturer: Some("Gaterin".to_string()),
            ..Default::default()
        },
    )
    .unwrap();

    let gateron = find_manufacturer_by_key(&conn, "gateron").unwrap().unwrap();
    let report = merge_manufacturers(&conn, typo.id, gateron.id).unwrap();
    assert_eq!(report.records_updated, 3);
    assert_eq!(report.aliases_added, 1);
    assert!(report.target.aliases.contains(&"Gaterin".to_string()));

    assert!(get_manufacturer(&conn, typo.id).unwrap().is_none());
    let master = get_master_switch(&conn, &master.id).unwrap().unwrap();
    assert_eq!(master.specs.manufacturer.as_deref(), Some("Gateron"));
    let usage = manufacturer_usage(&conn, "Gateron").unwrap();
    assert_eq!(usage.switches, 2);
    assert_eq!(usage.master_switches, 1);
}

#[test]
fn merge_into_self_is_invalid() {
    let (conn, _) = setup();
    let gateron = find_manufacturer_by_key(&conn, "gateron").unwrap().unwrap();
    assert!(matches!(
        merge_manufacturers(&conn, gateron.id, gateron.id),
        Err(ModerationError::Invalid(_))
    ));
}

#[test]
fn delete_only_unused() {
    let (conn, alice) = setup();
    create_switch(&conn, alice.id, &switch_with("Box Jade", "Kailh")).unwrap();
    let kailh = find_manufacturer_by_key(&conn, "kailh").unwrap().unwrap();
    let gateron = find_manufacturer_by_key(&conn, "gateron").unwrap().unwrap();

    assert!(matches!(
        delete_unused_manufacturer(&conn, kailh.id),
        Err(ModerationError::Conflict(_))
    ));
    delete_unused_manufacturer(&conn, gateron.id).unwrap();
    assert!(get_manufacturer(&conn, gateron.id).unwrap().is_none());
}
