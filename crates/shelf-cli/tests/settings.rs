use std::path::Path;

use shelf_cli::settings::{MAX_RECENT, Settings};
use shelf_model::{CreatorColumn, SortOrder, WorkColumn};

#[test]
fn settings_round_trip_through_toml() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("settings.toml");

    let mut settings = Settings::default();
    settings.record_database(Path::new("/libraries/manga.db"));
    settings.record_database(Path::new("/libraries/novels.db"));
    settings.works_sort = SortOrder::descending(WorkColumn::Updated);
    settings.creators_sort = SortOrder::ascending(CreatorColumn::Works);
    settings.save_to(&path).expect("save settings");

    let loaded = Settings::load_from(&path);
    assert_eq!(loaded, settings);
    assert_eq!(
        loaded.last_database.as_deref(),
        Some(Path::new("/libraries/novels.db"))
    );
}

#[test]
fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let loaded = Settings::load_from(&dir.path().join("absent.toml"));
    assert_eq!(loaded, Settings::default());
    assert_eq!(loaded.max_recent, MAX_RECENT);
}

#[test]
fn unreadable_file_gives_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "max_recent = \"many\"").expect("write");
    assert_eq!(Settings::load_from(&path), Settings::default());
}

#[test]
fn partial_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "last_database = \"lib.db\"\n").expect("write");

    let loaded = Settings::load_from(&path);
    assert_eq!(loaded.last_database.as_deref(), Some(Path::new("lib.db")));
    assert_eq!(loaded.works_sort, SortOrder::default());
    assert_eq!(loaded.max_recent, MAX_RECENT);
}
