//! Table sorting behaviour.

use shelf_model::{
    Creator, CreatorColumn, CreatorId, DisplayOrder, Format, FormatId, SortOrder, Status, StatusId,
    Work, WorkColumn, WorkId, WorkType, WorkTypeId, sort_creators, sort_works,
};

fn work(id: i64, name: &str, progress: &str) -> Work {
    let mut work = Work::draft(name, progress, StatusId(1), WorkTypeId(1), FormatId(1));
    work.id = WorkId(id);
    work
}

fn progress_of(works: &[&Work]) -> Vec<String> {
    works.iter().map(|w| w.progress.clone()).collect()
}

#[test]
fn non_numeric_progress_sorts_last_ascending() {
    let works = vec![work(1, "a", "3"), work(2, "b", "abc"), work(3, "c", "1")];
    let sorted = sort_works(
        &works,
        SortOrder::ascending(WorkColumn::Progress),
        &DisplayOrder::default(),
    );
    assert_eq!(progress_of(&sorted), vec!["1", "3", "abc"]);
}

#[test]
fn non_numeric_progress_sorts_first_descending() {
    let works = vec![work(1, "a", "3"), work(2, "b", "abc"), work(3, "c", "1")];
    let sorted = sort_works(
        &works,
        SortOrder::descending(WorkColumn::Progress),
        &DisplayOrder::default(),
    );
    assert_eq!(progress_of(&sorted), vec!["abc", "3", "1"]);
}

#[test]
fn progress_compares_numerically_not_lexically() {
    let works = vec![work(1, "a", "10"), work(2, "b", "9"), work(3, "c", "9.5")];
    let sorted = sort_works(
        &works,
        SortOrder::ascending(WorkColumn::Progress),
        &DisplayOrder::default(),
    );
    assert_eq!(progress_of(&sorted), vec!["9", "9.5", "10"]);
}

#[test]
fn status_sorts_by_display_order_not_id() {
    let statuses = vec![
        Status { id: StatusId(2), name: "Reading".into(), is_update: true },
        Status { id: StatusId(1), name: "Completed".into(), is_update: false },
    ];
    let types = vec![WorkType { id: WorkTypeId(1), name: "Manga".into() }];
    let formats = vec![Format { id: FormatId(1), name: "Series".into() }];
    let ranks = DisplayOrder::new(&statuses, &types, &formats);

    let mut first = work(1, "a", "1");
    first.status = StatusId(1);
    let mut second = work(2, "b", "1");
    second.status = StatusId(2);
    let works = vec![first, second];

    let sorted = sort_works(&works, SortOrder::ascending(WorkColumn::Status), &ranks);
    assert_eq!(sorted[0].id, WorkId(2));
}

#[test]
fn updated_ascending_lists_most_recent_first() {
    let mut old = work(1, "old", "1");
    old.updated = 1_000;
    let mut new = work(2, "new", "1");
    new.updated = 2_000;
    let works = vec![old, new];

    let sorted = sort_works(
        &works,
        SortOrder::ascending(WorkColumn::Updated),
        &DisplayOrder::default(),
    );
    assert_eq!(sorted[0].name, "new");
}

#[test]
fn creators_sort_by_work_count() {
    let few = Creator {
        id: CreatorId(1),
        name: "Few".into(),
        works: vec![WorkId(1)],
    };
    let many = Creator {
        id: CreatorId(2),
        name: "Many".into(),
        works: vec![WorkId(1), WorkId(2), WorkId(3)],
    };
    let creators = vec![many, few];

    let sorted = sort_creators(&creators, SortOrder::ascending(CreatorColumn::Works));
    assert_eq!(sorted[0].name, "Few");
    let sorted = sort_creators(&creators, SortOrder::descending(CreatorColumn::Works));
    assert_eq!(sorted[0].name, "Many");
}

#[test]
fn names_sort_case_insensitively() {
    let works = vec![work(1, "beta", "1"), work(2, "Alpha", "1"), work(3, "gamma", "1")];
    let sorted = sort_works(
        &works,
        SortOrder::ascending(WorkColumn::Name),
        &DisplayOrder::default(),
    );
    let names: Vec<&str> = sorted.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "beta", "gamma"]);
}
