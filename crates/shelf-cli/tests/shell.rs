//! End-to-end shell behaviour over both gateway engines.

use std::path::Path;
use std::sync::Arc;

use shelf_backend::{Endpoint, MemoryGateway};
use shelf_cli::shell::{Shell, find_creator, find_taxonomy, find_work};
use shelf_model::{Creator, Format, Status, Work};

fn memory_shell() -> (Arc<MemoryGateway>, Shell) {
    let gateway = Arc::new(MemoryGateway::new());
    let shell = Shell::open_with(gateway.clone(), Path::new("library")).expect("open");
    (gateway, shell)
}

fn first_ids(shell: &Shell) -> (shelf_model::WorkTypeId, shelf_model::FormatId) {
    let catalog = shell.catalog();
    (
        catalog.types().as_slice()[0].id,
        catalog.formats().as_slice()[0].id,
    )
}

#[test]
fn sqlite_library_round_trips_through_the_shell() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("library.db");

    let work = {
        let mut shell = Shell::open(&path).expect("create library");
        let status = shell.add_taxonomy::<Status>("Reading").expect("add status");
        let (work_type, format) = first_ids(&shell);
        let creator = shell
            .add_creator(Creator::draft("Miura"))
            .expect("add creator");
        let work = shell
            .add_work(
                Work::draft("Berserk", "364", status, work_type, format).with_creators([creator]),
            )
            .expect("add work");
        assert!(work.is_persisted());
        assert_eq!(shell.catalog().creator(creator).expect("creator").works, vec![work]);
        work
    };

    let shell = Shell::open(&path).expect("reopen library");
    let catalog = shell.catalog();
    assert_eq!(find_work(catalog, "berserk").expect("find work"), work);
    let stored = catalog.work(work).expect("stored work");
    assert_eq!(stored.progress, "364");
    assert_eq!(stored.creators.len(), 1);
    assert_eq!(
        find_creator(catalog, "MIURA").expect("find creator"),
        stored.creators[0]
    );
}

#[test]
fn rejected_mutation_becomes_error_and_rolls_back() {
    let (gateway, mut shell) = memory_shell();
    let status = shell.add_taxonomy::<Status>("Reading").expect("add status");
    let (work_type, format) = first_ids(&shell);
    let work = shell
        .add_work(Work::draft("Monster", "12", status, work_type, format))
        .expect("add work");

    gateway.fail_next(Endpoint::UpdateWorkName, "disk full");
    let error = shell
        .mutate(|catalog| catalog.update_work_name(work, "Pluto"))
        .expect_err("rename should fail");
    assert!(error.to_string().contains("disk full"), "{error}");
    assert_eq!(shell.catalog().work(work).expect("work").name, "Monster");

    // The notice was consumed, so the next mutation starts clean.
    shell
        .mutate(|catalog| catalog.update_work_progress(work, "13"))
        .expect("progress");
    assert_eq!(shell.catalog().work(work).expect("work").progress, "13");
}

#[test]
fn failed_open_is_reported() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.fail_next(Endpoint::Open, "locked by another process");
    let result = Shell::open_with(gateway, Path::new("library"));
    let error = result.err().expect("open should fail");
    assert!(error.to_string().contains("locked"), "{error}");
}

#[test]
fn removing_format_in_use_is_refused() {
    let (_gateway, mut shell) = memory_shell();
    let status = shell.add_taxonomy::<Status>("Reading").expect("add status");
    let (work_type, format) = first_ids(&shell);
    shell
        .add_work(Work::draft("Vagabond", "1", status, work_type, format))
        .expect("add work");

    let error = shell
        .apply(|app| app.remove_format(format))
        .expect_err("format is referenced");
    assert!(error.to_string().contains("Format still in use"), "{error}");
    assert!(shell.catalog().formats().contains(format));
}

#[test]
fn lookups_accept_ids_and_case_insensitive_names() {
    let (_gateway, mut shell) = memory_shell();
    let status = shell.add_taxonomy::<Status>("On Hold").expect("add status");
    let catalog = shell.catalog();

    assert_eq!(
        find_taxonomy(catalog.statuses(), "on hold").expect("by name"),
        status
    );
    assert_eq!(
        find_taxonomy(catalog.statuses(), &status.get().to_string()).expect("by id"),
        status
    );
    assert!(find_taxonomy::<Format>(catalog.formats(), "Scroll").is_err());
    assert!(find_work(catalog, "Nothing").is_err());
}

#[test]
fn ambiguous_names_require_an_id() {
    let (_gateway, mut shell) = memory_shell();
    let first = shell.add_creator(Creator::draft("Clamp")).expect("first");
    let second = shell.add_creator(Creator::draft("CLAMP")).expect("second");
    assert_ne!(first, second);

    let error = find_creator(shell.catalog(), "clamp").expect_err("ambiguous");
    assert!(error.to_string().contains("use an id"), "{error}");
    assert_eq!(
        find_creator(shell.catalog(), &second.get().to_string()).expect("by id"),
        second
    );
}
