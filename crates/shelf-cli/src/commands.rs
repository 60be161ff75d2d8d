use std::fmt::Display;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use shelf_model::{
    Creator, CreatorsFilter, Entity, Format, SortOrder, Status, Taxonomy, Work, WorkType,
    WorksFilter,
};
use shelf_state::{App, Catalog, CatalogTaxonomy, Message, OrderedStore, StateError, Task};
use tracing::{info, warn};

use shelf_cli::render;
use shelf_cli::settings::Settings;
use shelf_cli::shell::{Shell, find_creator, find_taxonomy, find_work};

use crate::cli::{
    AddWorkArgs, Command, CreatorsArgs, FilterArgs, StatusCommand, TaxonomyCommand, WorksArgs,
};

type RemoveTaxonomy<T> = fn(&mut App, <T as Entity>::Id) -> Result<Task<Message>, StateError>;

pub fn run(command: Command, database: Option<PathBuf>, settings: &mut Settings) -> Result<()> {
    match command {
        Command::Recent => {
            run_recent(settings);
            Ok(())
        }
        Command::Open { path } => {
            let shell = open_library(&path, settings)?;
            let catalog = shell.catalog();
            println!("Library: {}", path.display());
            println!(
                "{} works, {} creators, {} statuses, {} types, {} formats",
                catalog.works().len(),
                catalog.creators().len(),
                catalog.statuses().len(),
                catalog.types().len(),
                catalog.formats().len()
            );
            Ok(())
        }
        command => {
            let path = database
                .or_else(|| settings.last_database.clone())
                .ok_or_else(|| {
                    anyhow!("No library selected. Pass --database or run `shelf open <PATH>` first")
                })?;
            let mut shell = open_library(&path, settings)?;
            run_in_library(&mut shell, command, settings)
        }
    }
}

fn open_library(path: &Path, settings: &mut Settings) -> Result<Shell> {
    let shell =
        Shell::open(path).with_context(|| format!("Failed to open library {}", path.display()))?;
    info!(path = %path.display(), "library ready");
    settings.record_database(path);
    save_settings(settings);
    Ok(shell)
}

fn save_settings(settings: &Settings) {
    if let Err(error) = settings.save() {
        warn!(error = %format!("{error:#}"), "failed to save settings");
    }
}

fn run_recent(settings: &Settings) {
    if settings.recent_databases.is_empty() {
        println!("No libraries opened yet.");
        return;
    }
    for path in &settings.recent_databases {
        let marker = if settings.last_database.as_deref() == Some(path.as_path()) {
            "*"
        } else {
            " "
        };
        println!("{marker} {}", path.display());
    }
}

fn run_in_library(shell: &mut Shell, command: Command, settings: &mut Settings) -> Result<()> {
    match command {
        Command::Open { .. } | Command::Recent => Ok(()),
        Command::Works(args) => run_works(shell, &args, settings),
        Command::Updates(args) => {
            let catalog = shell.catalog();
            let filter = works_filter(catalog, &args)?;
            let queue = catalog.update_queue(&filter);
            println!("{}", render::works_table(catalog, &queue));
            println!("{} works to check", queue.len());
            Ok(())
        }
        Command::Creators(args) => run_creators(shell, &args, settings),
        Command::ShowWork { work } => {
            let catalog = shell.catalog();
            let work = catalog.work(find_work(catalog, &work)?)?;
            println!("{}", render::work_detail(catalog, work));
            Ok(())
        }
        Command::ShowCreator { creator } => {
            let catalog = shell.catalog();
            let creator = catalog.creator(find_creator(catalog, &creator)?)?;
            println!("{}", render::creator_detail(catalog, creator));
            Ok(())
        }
        Command::AddWork(args) => run_add_work(shell, args),
        Command::AddCreator { name, works } => {
            let works = works
                .iter()
                .map(|key| find_work(shell.catalog(), key))
                .collect::<Result<Vec<_>>>()?;
            let id = shell.add_creator(Creator::draft(name).with_works(works))?;
            println!("Added creator {id}");
            Ok(())
        }
        Command::RenameWork { work, name } => {
            let id = find_work(shell.catalog(), &work)?;
            shell.mutate(|catalog| catalog.update_work_name(id, name))
        }
        Command::Progress { work, progress } => {
            let id = find_work(shell.catalog(), &work)?;
            shell.mutate(|catalog| catalog.update_work_progress(id, progress))
        }
        Command::SetStatus { work, status } => {
            let id = find_work(shell.catalog(), &work)?;
            let status = find_taxonomy(shell.catalog().statuses(), &status)?;
            shell.mutate(|catalog| catalog.update_work_status(id, status))
        }
        Command::SetType { work, work_type } => {
            let id = find_work(shell.catalog(), &work)?;
            let work_type = find_taxonomy(shell.catalog().types(), &work_type)?;
            shell.mutate(|catalog| catalog.update_work_type(id, work_type))
        }
        Command::SetFormat { work, format } => {
            let id = find_work(shell.catalog(), &work)?;
            let format = find_taxonomy(shell.catalog().formats(), &format)?;
            shell.mutate(|catalog| catalog.update_work_format(id, format))
        }
        Command::RenameCreator { creator, name } => {
            let id = find_creator(shell.catalog(), &creator)?;
            shell.mutate(|catalog| catalog.update_creator_name(id, name))
        }
        Command::RemoveWork { work } => {
            let id = find_work(shell.catalog(), &work)?;
            shell.apply(|app| app.remove_work(id))?;
            println!("Removed work {id}");
            Ok(())
        }
        Command::RemoveCreator { creator } => {
            let id = find_creator(shell.catalog(), &creator)?;
            shell.apply(|app| app.remove_creator(id))?;
            println!("Removed creator {id}");
            Ok(())
        }
        Command::Attach { work, creator } => {
            let work = find_work(shell.catalog(), &work)?;
            let creator = find_creator(shell.catalog(), &creator)?;
            shell.mutate(|catalog| catalog.attach(work, creator))
        }
        Command::Detach { work, creator } => {
            let work = find_work(shell.catalog(), &work)?;
            let creator = find_creator(shell.catalog(), &creator)?;
            shell.mutate(|catalog| catalog.detach(work, creator))
        }
        Command::Status(StatusCommand::Common(TaxonomyCommand::List)) => {
            println!("{}", render::statuses_table(shell.catalog().statuses()));
            Ok(())
        }
        Command::Status(StatusCommand::Common(command)) => {
            run_taxonomy::<Status>(shell, command, App::remove_status)
        }
        Command::Status(StatusCommand::Flag { entry, off }) => {
            let id = find_taxonomy(shell.catalog().statuses(), &entry)?;
            shell.mutate(|catalog| catalog.set_status_update(id, !off))
        }
        Command::Type(command) => run_taxonomy::<WorkType>(shell, command, App::remove_type),
        Command::Format(command) => run_taxonomy::<Format>(shell, command, App::remove_format),
    }
}

// =============================================================================
// LISTINGS
// =============================================================================

fn works_filter(catalog: &Catalog, args: &FilterArgs) -> Result<WorksFilter> {
    Ok(WorksFilter {
        name: args.name.clone().unwrap_or_default(),
        statuses: lookup_all(catalog.statuses(), &args.statuses)?,
        types: lookup_all(catalog.types(), &args.types)?,
        formats: lookup_all(catalog.formats(), &args.formats)?,
    })
}

fn lookup_all<T, C>(store: &OrderedStore<T>, keys: &[String]) -> Result<C>
where
    T: Taxonomy,
    C: FromIterator<T::Id>,
{
    keys.iter().map(|key| find_taxonomy(store, key)).collect()
}

fn run_works(shell: &Shell, args: &WorksArgs, settings: &mut Settings) -> Result<()> {
    let mut order = settings.works_sort;
    if let Some(column) = args.sort {
        order = SortOrder::ascending(column.into());
        settings.works_sort = order;
        save_settings(settings);
    }
    if args.descending {
        order.ascending = false;
    }

    let catalog = shell.catalog();
    let filter = works_filter(catalog, &args.filter)?;
    let works = catalog.sorted_works(&filter, order);
    println!("{}", render::works_table(catalog, &works));
    println!("{} of {} works", works.len(), catalog.works().len());
    Ok(())
}

fn run_creators(shell: &Shell, args: &CreatorsArgs, settings: &mut Settings) -> Result<()> {
    let mut order = settings.creators_sort;
    if let Some(column) = args.sort {
        order = SortOrder::ascending(column.into());
        settings.creators_sort = order;
        save_settings(settings);
    }
    if args.descending {
        order.ascending = false;
    }

    let catalog = shell.catalog();
    let filter = CreatorsFilter {
        name: args.name.clone().unwrap_or_default(),
    };
    let creators = catalog.sorted_creators(&filter, order);
    println!("{}", render::creators_table(&creators));
    println!("{} of {} creators", creators.len(), catalog.creators().len());
    Ok(())
}

// =============================================================================
// MUTATIONS
// =============================================================================

fn run_add_work(shell: &mut Shell, args: AddWorkArgs) -> Result<()> {
    let catalog = shell.catalog();
    let status = pick_taxonomy(catalog.statuses(), args.status.as_deref())?;
    let work_type = pick_taxonomy(catalog.types(), args.work_type.as_deref())?;
    let format = pick_taxonomy(catalog.formats(), args.format.as_deref())?;
    let creators = args
        .creators
        .iter()
        .map(|key| find_creator(catalog, key))
        .collect::<Result<Vec<_>>>()?;

    let draft =
        Work::draft(args.name, args.progress, status, work_type, format).with_creators(creators);
    let id = shell.add_work(draft)?;
    println!("Added work {id}");
    Ok(())
}

/// Look up `key`, or fall back to the first entry in display order.
fn pick_taxonomy<T: Taxonomy>(store: &OrderedStore<T>, key: Option<&str>) -> Result<T::Id> {
    match key {
        Some(key) => find_taxonomy(store, key),
        None => store
            .as_slice()
            .first()
            .map(Entity::id)
            .ok_or_else(|| anyhow!("No {} defined yet, add one first", T::KIND.label())),
    }
}

fn run_taxonomy<T>(
    shell: &mut Shell,
    command: TaxonomyCommand,
    remove: RemoveTaxonomy<T>,
) -> Result<()>
where
    T: CatalogTaxonomy,
    T::Id: Display,
{
    let label = T::KIND.label();
    match command {
        TaxonomyCommand::List => {
            println!("{}", render::taxonomy_table(T::store(shell.catalog())));
        }
        TaxonomyCommand::Add { name } => {
            let id = shell.add_taxonomy::<T>(&name)?;
            println!("Added {label} {id}");
        }
        TaxonomyCommand::Remove { entry } => {
            let id = find_taxonomy(T::store(shell.catalog()), &entry)?;
            shell.apply(|app| remove(app, id))?;
            println!("Removed {label} {id}");
        }
        TaxonomyCommand::Rename { entry, name } => {
            let id = find_taxonomy(T::store(shell.catalog()), &entry)?;
            shell.mutate(|catalog| catalog.rename_taxonomy::<T>(id, name))?;
        }
        TaxonomyCommand::Reorder { entry, target } => {
            let store = T::store(shell.catalog());
            let moved = find_taxonomy(store, &entry)?;
            let target = find_taxonomy(store, &target)?;
            shell.mutate(|catalog| catalog.reorder_taxonomy::<T>(moved, target))?;
        }
    }
    Ok(())
}
