//! Terminal tables for catalog listings.

use chrono::DateTime;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use shelf_model::{Creator, Status, Taxonomy, Work};
use shelf_state::{Catalog, OrderedStore};

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

/// Format a millisecond timestamp as UTC minutes. Zero means never.
pub fn format_timestamp(millis: i64) -> String {
    if millis <= 0 {
        return "-".to_string();
    }
    DateTime::from_timestamp_millis(millis)
        .map(|moment| moment.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn works_table(catalog: &Catalog, works: &[&Work]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Id"),
        header_cell("Name"),
        header_cell("Progress"),
        header_cell("Status"),
        header_cell("Type"),
        header_cell("Format"),
        header_cell("Creators"),
        header_cell("Updated"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 6, CellAlignment::Right);

    for work in works {
        table.add_row(vec![
            dim_cell(work.id),
            Cell::new(&work.name),
            Cell::new(&work.progress),
            Cell::new(taxonomy_name(catalog.statuses(), work.status)),
            Cell::new(taxonomy_name(catalog.types(), work.work_type)),
            Cell::new(taxonomy_name(catalog.formats(), work.format)),
            Cell::new(work.creators.len()),
            dim_cell(format_timestamp(work.updated)),
        ]);
    }
    table
}

pub fn creators_table(creators: &[&Creator]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Id"),
        header_cell("Name"),
        header_cell("Works"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);

    for creator in creators {
        table.add_row(vec![
            dim_cell(creator.id),
            Cell::new(&creator.name),
            Cell::new(creator.works.len()),
        ]);
    }
    table
}

/// Statuses in display order with their update flag.
pub fn statuses_table(statuses: &OrderedStore<Status>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Id"),
        header_cell("Name"),
        header_cell("Update"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Center);

    for (position, status) in statuses.as_slice().iter().enumerate() {
        let flag = if status.is_update {
            Cell::new("yes").fg(Color::Green)
        } else {
            dim_cell("-")
        };
        table.add_row(vec![
            Cell::new(position + 1),
            dim_cell(status.id),
            Cell::new(&status.name),
            flag,
        ]);
    }
    table
}

/// Types or formats in display order.
pub fn taxonomy_table<T: Taxonomy>(store: &OrderedStore<T>) -> Table
where
    T::Id: std::fmt::Display,
{
    let mut table = Table::new();
    table.set_header(vec![header_cell("#"), header_cell("Id"), header_cell("Name")]);
    apply_table_style(&mut table);

    for (position, entry) in store.as_slice().iter().enumerate() {
        table.add_row(vec![
            Cell::new(position + 1),
            dim_cell(entry.id()),
            Cell::new(entry.name()),
        ]);
    }
    table
}

pub fn work_detail(catalog: &Catalog, work: &Work) -> Table {
    let creators: Vec<&str> = work
        .creators
        .iter()
        .map(|id| {
            catalog
                .creators()
                .find(*id)
                .map_or("?", |creator| creator.name.as_str())
        })
        .collect();

    let mut table = Table::new();
    apply_table_style(&mut table);
    table.add_row(vec![label_cell("Id"), Cell::new(work.id)]);
    table.add_row(vec![label_cell("Name"), Cell::new(&work.name)]);
    table.add_row(vec![label_cell("Progress"), Cell::new(&work.progress)]);
    table.add_row(vec![
        label_cell("Status"),
        Cell::new(taxonomy_name(catalog.statuses(), work.status)),
    ]);
    table.add_row(vec![
        label_cell("Type"),
        Cell::new(taxonomy_name(catalog.types(), work.work_type)),
    ]);
    table.add_row(vec![
        label_cell("Format"),
        Cell::new(taxonomy_name(catalog.formats(), work.format)),
    ]);
    table.add_row(vec![label_cell("Creators"), Cell::new(creators.join(", "))]);
    table.add_row(vec![
        label_cell("Updated"),
        Cell::new(format_timestamp(work.updated)),
    ]);
    table.add_row(vec![
        label_cell("Added"),
        Cell::new(format_timestamp(work.added)),
    ]);
    table
}

pub fn creator_detail(catalog: &Catalog, creator: &Creator) -> Table {
    let works: Vec<&str> = creator
        .works
        .iter()
        .map(|id| {
            catalog
                .works()
                .find(*id)
                .map_or("?", |work| work.name.as_str())
        })
        .collect();

    let mut table = Table::new();
    apply_table_style(&mut table);
    table.add_row(vec![label_cell("Id"), Cell::new(creator.id)]);
    table.add_row(vec![label_cell("Name"), Cell::new(&creator.name)]);
    table.add_row(vec![label_cell("Works"), Cell::new(works.join(", "))]);
    table
}

fn taxonomy_name<T: Taxonomy>(store: &OrderedStore<T>, id: T::Id) -> &str {
    store.find(id).map_or("?", Taxonomy::name)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn label_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_timestamp_renders_dash() {
        assert_eq!(format_timestamp(0), "-");
    }

    #[test]
    fn test_timestamp_renders_utc_minutes() {
        assert_eq!(format_timestamp(1_700_000_000_000), "2023-11-14 22:13");
    }
}
