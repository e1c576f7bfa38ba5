use rusqlite::{Connection, params};
use switchbook_catalog::types::*;
use switchbook_db::*;
use switchbook_moderation::{
    LogProgress, SilentProgress, approve_submission, backfill_shareable_ids, create_account,
    link_master_switches, normalize_manufacturers, submit_master_switch,
};

fn switch_named(conn: &Connection, user_id: i64, name: &str, manufacturer: &str) -> i64 {
    // Raw insert, bypassing normalization, like rows written before it existed
    let input = SwitchInput {
        specs: SwitchSpecs {
            name: name.to_string(),
            manufacturer: Some(manufacturer.to_string()),
            ..Default::default()
        },
        details: CollectionDetails::default(),
    };
    insert_switch(conn, user_id, &input, None).unwrap()
}

#[test]
fn backfill_assigns_missing_ids_once() {
    let conn = open_memory().unwrap();
    let alice = create_account(&conn, "alice", "alice@example.com", "hash", Role::User).unwrap();
    let bob = create_account(&conn, "bob", "bob@example.com", "hash", Role::User).unwrap();
    conn.execute("UPDATE users SET shareable_id = NULL WHERE id = ?1", params![bob.id])
        .unwrap();

    assert_eq!(backfill_shareable_ids(&conn, &SilentProgress).unwrap(), 1);
    let bob = get_user(&conn, bob.id).unwrap().unwrap();
    assert!(switchbook_catalog::is_valid_shareable_id(bob.shareable_id.as_deref().unwrap()));
    assert_eq!(
        get_user(&conn, alice.id).unwrap().unwrap().shareable_id,
        alice.shareable_id
    );

    assert_eq!(backfill_shareable_ids(&conn, &SilentProgress).unwrap(), 0);
}

#[test]
fn normalize_rewrites_known_spellings() {
    let conn = open_memory().unwrap();
    let alice = create_account(&conn, "alice", "alice@example.com", "hash", Role::User).unwrap();
    let gateron = insert_manufacturer(&conn, "Gateron", true, None).unwrap();
    add_manufacturer_alias(&conn, gateron, "JWK Gateron").unwrap();

    let a = switch_named(&conn, alice.id, "Yellow", "GATERON");
    let b = switch_named(&conn, alice.id, "Red", "jwk gateron");
    switch_named(&conn, alice.id, "Black", "Gateron");
    switch_named(&conn, alice.id, "Cream", "NovelKeys");

    let preview = normalize_manufacturers(&conn, true, &SilentProgress).unwrap();
    assert_eq!(preview.records_updated(), 2);
    assert_eq!(preview.unmatched, vec!["NovelKeys".to_string()]);
    assert_eq!(
        get_switch(&conn, a).unwrap().unwrap().specs.manufacturer.as_deref(),
        Some("GATERON")
    );

    let report = normalize_manufacturers(&conn, false, &LogProgress).unwrap();
    assert_eq!(report.records_updated(), 2);
    for id in [a, b] {
        assert_eq!(
            get_switch(&conn, id).unwrap().unwrap().specs.manufacturer.as_deref(),
            Some("Gateron")
        );
    }

    let again = normalize_manufacturers(&conn, false, &SilentProgress).unwrap();
    assert!(again.renames.is_empty());
}

#[test]
fn link_matches_name_and_manufacturer_key() {
    let conn = open_memory().unwrap();
    let alice = create_account(&conn, "alice", "alice@example.com", "hash", Role::User).unwrap();
    let admin = create_account(&conn, "root", "root@example.com", "hash", Role::Admin).unwrap();
    insert_manufacturer(&conn, "Gateron", true, None).unwrap();

    let master = submit_master_switch(
        &conn,
        admin.id,
        &SwitchSpecs {
            name: "Oil King".to_string(),
            manufacturer: Some("Gateron".to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    let master = approve_submission(&conn, &admin, &master.id).unwrap().record;
    // A pending record with the same name is not a candidate
    submit_master_switch(
        &conn,
        alice.id,
        &SwitchSpecs {
            name: "Oil King".to_string(),
            manufacturer: Some("Gateron".to_string()),
            ..Default::default()
        },
    )
    .unwrap();

    let matched = switch_named(&conn, alice.id, "oil  king", "GATERON Co., Ltd.");
    let other = switch_named(&conn, alice.id, "Oil King", "Kailh");

    let preview = link_master_switches(&conn, true, &SilentProgress).unwrap();
    assert_eq!(preview.checked, 2);
    assert_eq!(preview.linked.len(), 1);
    assert!(get_switch(&conn, matched).unwrap().unwrap().master_switch_id.is_none());

    let report = link_master_switches(&conn, false, &SilentProgress).unwrap();
    assert_eq!(report.linked[0].switch_id, matched);
    let linked = get_switch(&conn, matched).unwrap().unwrap();
    assert_eq!(linked.master_switch_id.as_deref(), Some(master.id.as_str()));
    assert_eq!(linked.master_switch_version, Some(1));
    assert!(get_switch(&conn, other).unwrap().unwrap().master_switch_id.is_none());

    assert!(link_master_switches(&conn, false, &SilentProgress).unwrap().linked.is_empty());
}

#[test]
fn link_skips_ambiguous_matches() {
    let conn = open_memory().unwrap();
    let admin = create_account(&conn, "root", "root@example.com", "hash", Role::Admin).unwrap();
    for _ in 0..2 {
        let m = submit_master_switch(
            &conn,
            admin.id,
            &SwitchSpecs {
                name: "Cream".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        approve_submission(&conn, &admin, &m.id).unwrap();
    }
    let id = switch_named(&conn, admin.id, "Cream", "");

    let report = link_master_switches(&conn, false, &SilentProgress).unwrap();
    assert!(report.linked.is_empty());
    assert_eq!(report.ambiguous, vec![id]);
}
