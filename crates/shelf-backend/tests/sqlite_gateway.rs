//! SQLite-specific behaviour: persistence across connections and backups.

use shelf_backend::{Gateway, SqliteGateway};
use shelf_model::{Creator, Work};

#[test]
fn data_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("library.db");

    let gateway = SqliteGateway::new();
    gateway.open(&path).expect("open");
    let status = gateway.add_status("Reading").expect("status");
    let work_type = gateway.get_types().expect("types")[1].id;
    let format = gateway.get_formats().expect("formats")[0].id;
    let creator = gateway.add_creator(&Creator::draft("Inoue")).expect("creator");
    let work = Work::draft("Vagabond", "37", status, work_type, format).with_creators([creator]);
    let work = gateway.add_work(&work).expect("work");
    gateway.close().expect("close");

    let reopened = SqliteGateway::new();
    reopened.open(&path).expect("reopen");
    let works = reopened.get_works().expect("works");
    assert_eq!(works.len(), 1);
    assert_eq!(works[0].id, work);
    assert_eq!(works[0].work_type, work_type);
    assert_eq!(works[0].creators, vec![creator]);
    // Seeding happens once per file.
    assert_eq!(reopened.get_types().expect("types").len(), 5);
}

#[test]
fn reopening_writes_backup_next_to_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("library.db");
    let backup = SqliteGateway::backup_path(&path);

    let gateway = SqliteGateway::new();
    gateway.open(&path).expect("create");
    assert!(!backup.exists(), "fresh database is not backed up");
    gateway.add_status("Reading").expect("status");

    gateway.open(&path).expect("reopen");
    assert!(backup.exists());

    let restored = SqliteGateway::new();
    restored.open(&backup).expect("open backup");
    let statuses = restored.get_statuses().expect("statuses");
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].name, "Reading");
}

#[test]
fn creators_list_work_ids_in_attachment_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let gateway = SqliteGateway::new();
    gateway.open(&dir.path().join("order.db")).expect("open");
    let status = gateway.add_status("Reading").expect("status");
    let work_type = gateway.get_types().expect("types")[0].id;
    let format = gateway.get_formats().expect("formats")[0].id;
    let creator = gateway.add_creator(&Creator::draft("Urasawa")).expect("creator");

    let first = gateway
        .add_work(&Work::draft("Monster", "", status, work_type, format))
        .expect("first");
    let second = gateway
        .add_work(&Work::draft("Pluto", "", status, work_type, format))
        .expect("second");
    gateway.attach(second, creator).expect("attach second");
    gateway.attach(first, creator).expect("attach first");

    let creators = gateway.get_creators().expect("creators");
    assert_eq!(creators[0].works, vec![second, first]);
}
