//! Optimistic mutation and reconciliation scenarios against the in-memory backend.

use std::sync::Arc;

use shelf_backend::{Endpoint, Gateway, MemoryGateway};
use shelf_model::{
    Creator, CreatorId, EntityKind, FormatId, SortOrder, StatusId, Work, WorkColumn, WorkId,
    WorkTypeId, WorksFilter,
};
use shelf_state::{App, MemorySessionStorage, Message, Phase, StateError, Task};

struct Fixture {
    gateway: Arc<MemoryGateway>,
    app: App,
    reading: StatusId,
    done: StatusId,
    manga: WorkTypeId,
    series: FormatId,
    miura: CreatorId,
    urasawa: CreatorId,
    berserk: WorkId,
    monster: WorkId,
}

async fn fixture() -> Fixture {
    let gateway = Arc::new(MemoryGateway::opened("library"));
    let reading = gateway.add_status("Reading").expect("add status");
    gateway.update_status(reading, true).expect("flag status");
    let done = gateway.add_status("Done").expect("add status");
    let manga = gateway.get_types().expect("types")[0].id;
    let series = gateway.get_formats().expect("formats")[0].id;

    let miura = gateway.add_creator(&Creator::draft("Miura")).expect("add creator");
    let urasawa = gateway
        .add_creator(&Creator::draft("Urasawa"))
        .expect("add creator");
    let berserk = gateway
        .add_work(&Work::draft("Berserk", "364", reading, manga, series).with_creators([miura]))
        .expect("add work");
    let monster = gateway
        .add_work(&Work::draft("Monster", "162", done, manga, series).with_creators([urasawa]))
        .expect("add work");

    let mut app = App::new(gateway.clone(), Arc::new(MemorySessionStorage::new()));
    let task = app.start();
    app.settle(task).await;
    gateway.clear_calls();

    Fixture {
        gateway,
        app,
        reading,
        done,
        manga,
        series,
        miura,
        urasawa,
        berserk,
        monster,
    }
}

async fn run(app: &mut App, task: Task<shelf_state::CatalogMessage>) {
    app.settle(task.map(Message::Catalog)).await;
}

#[tokio::test]
async fn start_loads_every_collection() {
    let f = fixture().await;
    let catalog = f.app.catalog();
    assert_eq!(catalog.works().phase(), Phase::Ready);
    assert_eq!(catalog.creators().phase(), Phase::Ready);
    assert_eq!(catalog.statuses().len(), 2);
    assert_eq!(catalog.works().len(), 2);
    assert_eq!(catalog.creators().len(), 2);
    assert!(catalog.audit().is_empty());
    assert!(catalog.notices().is_empty());
}

#[tokio::test]
async fn rejected_rename_is_rolled_back_by_reload() {
    let mut f = fixture().await;
    f.gateway.fail_next(Endpoint::UpdateWorkName, "database is locked");

    let task = f
        .app
        .catalog_mut()
        .update_work_name(f.berserk, "Beserk")
        .expect("update");
    assert_eq!(f.app.catalog().work(f.berserk).expect("work").name, "Beserk");

    run(&mut f.app, task).await;

    let catalog = f.app.catalog();
    assert_eq!(catalog.work(f.berserk).expect("work").name, "Berserk");
    let notice = catalog.notices().latest().expect("notice");
    assert_eq!(notice.title, "Failed to update Work Name.");
    assert_eq!(notice.detail, "database is locked");
    assert_eq!(f.gateway.call_count(Endpoint::GetWorks), 1);
}

#[tokio::test]
async fn progress_update_stamps_updated_time() {
    let mut f = fixture().await;
    let before = f.app.catalog().work(f.berserk).expect("work").updated;

    let task = f
        .app
        .catalog_mut()
        .update_work_progress(f.berserk, "365")
        .expect("update");
    let local = f.app.catalog().work(f.berserk).expect("work").clone();
    assert_eq!(local.progress, "365");
    assert!(local.updated >= before);

    run(&mut f.app, task).await;
    let stored = f.gateway.get_work(f.berserk).expect("stored work");
    assert_eq!(stored.progress, "365");
    assert_eq!(stored.updated, local.updated);
    assert!(f.app.catalog().notices().is_empty());
}

#[tokio::test]
async fn attaching_twice_sends_one_request() {
    let mut f = fixture().await;

    let task = f
        .app
        .catalog_mut()
        .attach(f.monster, f.miura)
        .expect("attach");
    run(&mut f.app, task).await;
    let again = f
        .app
        .catalog_mut()
        .attach(f.monster, f.miura)
        .expect("attach again");
    assert!(again.is_none());

    let catalog = f.app.catalog();
    assert_eq!(
        catalog.work(f.monster).expect("work").creators,
        vec![f.urasawa, f.miura]
    );
    assert_eq!(
        catalog.creator(f.miura).expect("creator").works,
        vec![f.berserk, f.monster]
    );
    assert_eq!(f.gateway.call_count(Endpoint::Attach), 1);
}

#[tokio::test]
async fn rejected_attach_reloads_both_sides() {
    let mut f = fixture().await;
    f.gateway.fail_next(Endpoint::Attach, "connection lost");

    let task = f
        .app
        .catalog_mut()
        .attach(f.monster, f.miura)
        .expect("attach");
    assert!(
        f.app
            .catalog()
            .creator(f.miura)
            .expect("creator")
            .has_work(f.monster)
    );
    run(&mut f.app, task).await;

    let catalog = f.app.catalog();
    assert!(!catalog.work(f.monster).expect("work").has_creator(f.miura));
    assert!(!catalog.creator(f.miura).expect("creator").has_work(f.monster));
    assert!(catalog.notices().contains_title("Failed to attach."));
    assert_eq!(f.gateway.call_count(Endpoint::GetWorks), 1);
    assert_eq!(f.gateway.call_count(Endpoint::GetCreators), 1);
    assert!(catalog.audit().is_empty());
}

#[tokio::test]
async fn detaching_an_unrelated_pair_is_a_no_op() {
    let mut f = fixture().await;
    let task = f
        .app
        .catalog_mut()
        .detach(f.monster, f.miura)
        .expect("detach");
    assert!(task.is_none());
    assert_eq!(f.gateway.call_count(Endpoint::Detach), 0);
}

#[tokio::test]
async fn removing_a_work_severs_its_creators() {
    let mut f = fixture().await;
    let task = f
        .app
        .catalog_mut()
        .attach(f.berserk, f.urasawa)
        .expect("attach");
    run(&mut f.app, task).await;

    let task = f.app.remove_work(f.berserk).expect("remove");
    assert!(f.app.catalog().creators().iter().all(|c| !c.has_work(f.berserk)));
    f.app.settle(task).await;

    let catalog = f.app.catalog();
    assert!(!catalog.works().contains(f.berserk));
    assert!(catalog.creator(f.miura).expect("creator").works.is_empty());
    assert_eq!(
        catalog.creator(f.urasawa).expect("creator").works,
        vec![f.monster]
    );
    assert!(catalog.audit().is_empty());
    assert!(f.gateway.get_creator(f.miura).expect("creator").works.is_empty());
}

#[tokio::test]
async fn added_work_is_rekeyed_then_linked() {
    let mut f = fixture().await;
    let draft =
        Work::draft("Vagabond", "37", f.reading, f.manga, f.series).with_creators([f.miura]);

    let (provisional, task) = f.app.catalog_mut().add_work(draft).expect("add");
    assert!(provisional.is_provisional());
    let local = f.app.catalog().work(provisional).expect("provisional work");
    assert_eq!(local.name, "Vagabond");
    assert!(local.creators.is_empty());
    assert!(matches!(
        f.app.catalog_mut().attach(provisional, f.urasawa),
        Err(StateError::Provisional { .. })
    ));

    run(&mut f.app, task).await;

    let catalog = f.app.catalog();
    assert!(!catalog.works().contains(provisional));
    let work = catalog
        .works()
        .iter()
        .find(|work| work.name == "Vagabond")
        .expect("confirmed work");
    assert!(work.id.is_persisted());
    assert_eq!(catalog.resolve::<Work>(provisional), Some(work.id));
    assert_eq!(work.creators, vec![f.miura]);
    assert!(catalog.creator(f.miura).expect("creator").has_work(work.id));
    assert!(catalog.audit().is_empty());
    assert_eq!(
        f.gateway.get_work(work.id).expect("stored").creators,
        vec![f.miura]
    );
}

#[tokio::test]
async fn reload_racing_an_add_repairs_the_stale_side() {
    let mut f = fixture().await;
    let draft =
        Work::draft("Vagabond", "37", f.reading, f.manga, f.series).with_creators([f.miura]);
    let (_, add) = f.app.catalog_mut().add_work(draft).expect("add");
    let creators = f.app.catalog_mut().load(EntityKind::Creator);
    let works = f.app.catalog_mut().load(EntityKind::Work);

    // Creators are read before the add commits, works after.
    let creators = creators.into_futures().pop().expect("creators load").await;
    let add = add.into_futures().pop().expect("add").await;
    let works = works.into_futures().pop().expect("works load").await;

    assert!(f.app.catalog_mut().update(creators).is_none());
    let repair = f.app.catalog_mut().update(works);
    assert_eq!(repair.len(), 1);
    let reload = f.app.catalog_mut().update(add);
    assert_eq!(reload.len(), 2);

    run(&mut f.app, Task::batch([repair, reload])).await;

    let catalog = f.app.catalog();
    let work = catalog
        .works()
        .iter()
        .find(|work| work.name == "Vagabond")
        .expect("confirmed work");
    assert_eq!(work.creators, vec![f.miura]);
    assert!(catalog.creator(f.miura).expect("creator").has_work(work.id));
    assert!(catalog.audit().is_empty());
    assert!(catalog.notices().is_empty());
}

#[tokio::test]
async fn repeated_ids_on_an_added_entry_are_linked_once() {
    let mut f = fixture().await;
    let mut draft = Work::draft("Vagabond", "37", f.reading, f.manga, f.series);
    draft.creators = vec![f.miura, f.urasawa, f.miura];
    let (_, task) = f.app.catalog_mut().add_work(draft).expect("add work");
    run(&mut f.app, task).await;

    let work = f
        .app
        .catalog()
        .works()
        .iter()
        .find(|work| work.name == "Vagabond")
        .map(|work| work.id)
        .expect("confirmed work");
    assert_eq!(
        f.gateway.get_work(work).expect("stored work").creators,
        vec![f.miura, f.urasawa]
    );

    let mut draft = Creator::draft("Takehiko Inoue");
    draft.works = vec![work, work];
    let (_, task) = f.app.catalog_mut().add_creator(draft).expect("add creator");
    run(&mut f.app, task).await;

    let catalog = f.app.catalog();
    assert!(catalog.notices().is_empty());
    let inoue = catalog
        .creators()
        .iter()
        .find(|creator| creator.name == "Takehiko Inoue")
        .expect("confirmed creator");
    assert_eq!(inoue.works, vec![work]);
    assert_eq!(
        catalog.work(work).expect("work").creators,
        vec![f.miura, f.urasawa, inoue.id]
    );
    assert_eq!(f.gateway.get_creator(inoue.id).expect("stored creator").works, vec![work]);
    assert!(catalog.audit().is_empty());
}

#[tokio::test]
async fn rejected_add_drops_the_provisional_entry() {
    let mut f = fixture().await;
    f.gateway.fail_next(Endpoint::AddCreator, "name too long");

    let (provisional, task) = f
        .app
        .catalog_mut()
        .add_creator(Creator::draft("Takehiko Inoue").with_works([f.berserk]))
        .expect("add");
    assert!(f.app.catalog().creators().contains(provisional));
    run(&mut f.app, task).await;

    let catalog = f.app.catalog();
    assert!(!catalog.creators().contains(provisional));
    assert_eq!(catalog.creators().len(), 2);
    assert!(catalog.notices().contains_title("Failed to add Creator."));
    assert_eq!(catalog.work(f.berserk).expect("work").creators, vec![f.miura]);
}

#[tokio::test]
async fn mutating_before_load_is_refused() {
    let gateway = Arc::new(MemoryGateway::opened("library"));
    let mut app = App::new(gateway, Arc::new(MemorySessionStorage::new()));
    let error = app
        .catalog_mut()
        .update_work_name(WorkId(1), "Anything")
        .expect_err("not loaded");
    assert_eq!(error, StateError::Uninitialized(EntityKind::Work));
}

#[tokio::test]
async fn unknown_ids_are_reported_not_invented() {
    let mut f = fixture().await;
    let error = f
        .app
        .catalog_mut()
        .update_work_status(f.berserk, StatusId(999))
        .expect_err("unknown status");
    assert_eq!(error, StateError::not_found(EntityKind::Status, 999));
    assert_eq!(
        f.app.catalog().work(f.berserk).expect("work").status,
        f.reading
    );
}

#[tokio::test]
async fn responses_from_a_previous_connection_are_dropped() {
    let mut f = fixture().await;
    f.gateway.fail_next(Endpoint::UpdateWorkName, "locked");
    let task = f
        .app
        .catalog_mut()
        .update_work_name(f.berserk, "Beserk")
        .expect("update");

    f.app.catalog_mut().reset();
    let epoch = f.app.catalog().epoch();
    for message in task.collect().await {
        assert_ne!(message.epoch(), epoch);
        assert!(f.app.catalog_mut().update(message).is_none());
    }

    assert!(f.app.catalog().notices().is_empty());
    assert_eq!(f.app.catalog().works().phase(), Phase::Uninitialized);
}

#[tokio::test]
async fn out_of_order_confirmations_keep_the_last_local_write() {
    let mut f = fixture().await;
    let first = f
        .app
        .catalog_mut()
        .update_work_progress(f.berserk, "365")
        .expect("first");
    let second = f
        .app
        .catalog_mut()
        .update_work_progress(f.berserk, "366")
        .expect("second");

    let mut futures = Task::batch([first, second]).into_futures();
    let later = futures.pop().expect("second future").await;
    let earlier = futures.pop().expect("first future").await;
    assert!(f.app.catalog_mut().update(later).is_none());
    assert!(f.app.catalog_mut().update(earlier).is_none());

    assert_eq!(
        f.app.catalog().work(f.berserk).expect("work").progress,
        "366"
    );
    assert!(f.app.catalog().notices().is_empty());
    // The backend applied the requests in arrival order.
    assert_eq!(f.gateway.get_work(f.berserk).expect("stored").progress, "365");
}

#[tokio::test]
async fn update_queue_follows_flagged_statuses() {
    let mut f = fixture().await;
    let queue: Vec<_> = f
        .app
        .catalog()
        .update_queue(&WorksFilter::default())
        .into_iter()
        .map(|work| work.id)
        .collect();
    assert_eq!(queue, vec![f.berserk]);

    let task = f
        .app
        .catalog_mut()
        .set_status_update(f.done, true)
        .expect("flag");
    run(&mut f.app, task).await;
    assert_eq!(f.app.catalog().update_queue(&WorksFilter::default()).len(), 2);
    assert!(f.gateway.get_statuses().expect("statuses")[1].is_update);
}

#[tokio::test]
async fn sorting_uses_status_display_order() {
    let mut f = fixture().await;
    let by_status = |app: &App| -> Vec<WorkId> {
        app.catalog()
            .sorted_works(
                &WorksFilter::default(),
                SortOrder::ascending(WorkColumn::Status),
            )
            .into_iter()
            .map(|work| work.id)
            .collect()
    };
    assert_eq!(by_status(&f.app), vec![f.berserk, f.monster]);

    let task = f
        .app
        .catalog_mut()
        .reorder_statuses(f.done, f.reading)
        .expect("reorder");
    assert_eq!(by_status(&f.app), vec![f.monster, f.berserk]);
    run(&mut f.app, task).await;

    let stored: Vec<_> = f
        .gateway
        .get_statuses()
        .expect("statuses")
        .into_iter()
        .map(|status| status.id)
        .collect();
    assert_eq!(stored, vec![f.done, f.reading]);
}

#[tokio::test]
async fn rejected_type_rename_is_rolled_back() {
    let mut f = fixture().await;
    f.gateway.fail_next(Endpoint::RenameType, "read-only database");

    let task = f
        .app
        .catalog_mut()
        .rename_type(f.manga, "Comic")
        .expect("rename");
    assert_eq!(f.app.catalog().types().get(f.manga).expect("type").name, "Comic");
    run(&mut f.app, task).await;

    assert_eq!(f.app.catalog().types().get(f.manga).expect("type").name, "Manga");
    assert!(
        f.app
            .catalog()
            .notices()
            .contains_title("Failed to update Type Name.")
    );
}

#[tokio::test]
async fn added_format_receives_its_backend_id() {
    let mut f = fixture().await;
    let (provisional, task) = f.app.catalog_mut().add_format("Webtoon").expect("add");
    assert_eq!(
        f.app.catalog().formats().as_slice().last().map(|format| format.id),
        Some(provisional)
    );
    run(&mut f.app, task).await;

    let formats = f.app.catalog().formats();
    let added = formats.as_slice().last().expect("format");
    assert_eq!(added.name, "Webtoon");
    assert!(added.id.is_persisted());
    assert_eq!(formats.len(), f.gateway.get_formats().expect("formats").len());
}
