//! Data model types for the Shelf catalog.
//!
//! This crate provides the plain-data representations shared by the backend
//! gateway and the client-side state layer:
//! - **Works**: trackable items with progress, status, type and format
//! - **Creators**: people or groups related to any number of works
//! - **Taxonomies**: user-ordered statuses, types and formats
//!
//! # Module Organization
//!
//! - [`ids`]: Typed identifiers and the [`EntityKind`] tag
//! - [`entity`]: Entity structs and the [`Entity`]/[`Taxonomy`] traits
//! - [`sort`]: Column comparators used by the library tables
//! - [`filter`]: Library and update-view filters
//! - [`reorder`]: Display-order moves shared by stores and backends

pub mod entity;
pub mod filter;
pub mod ids;
pub mod reorder;
pub mod sort;

pub use entity::{Creator, Entity, Format, Status, Taxonomy, Work, WorkType};
pub use filter::{CreatorsFilter, WorksFilter, name_matches, update_queue};
pub use ids::{CreatorId, EntityKind, FormatId, StatusId, WorkId, WorkTypeId};
pub use reorder::move_to_target;
pub use sort::{
    CreatorColumn, DisplayOrder, SortOrder, WorkColumn, compare_creators, compare_progress,
    compare_works, progress_value, sort_creators, sort_works,
};
