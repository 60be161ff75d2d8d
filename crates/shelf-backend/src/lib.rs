//! Backend gateway for the Shelf catalog.
//!
//! The [`Gateway`] trait is the request/response contract the client state
//! layer talks to. Two engines implement it:
//! - [`SqliteGateway`]: one SQLite file per library
//! - [`MemoryGateway`]: process-local collections with failure injection,
//!   used by tests and demos
//!
//! Every request either succeeds with plain data or fails with a
//! [`BackendError`] whose text is shown to the user.

mod endpoint;
mod error;
mod gateway;
mod memory;
mod sqlite;

pub use endpoint::Endpoint;
pub use error::{BackendError, Result};
pub use gateway::{BackendEvent, EVENT_CAPACITY, Gateway, TaxonomyEndpoints, now_millis};
pub use memory::MemoryGateway;
pub use sqlite::SqliteGateway;

/// Work types seeded into a new library, in display order.
pub const DEFAULT_TYPES: &[&str] = &["Manga", "Manhwa", "Manhua", "OEL", "Novel"];

/// Formats seeded into a new library, in display order.
pub const DEFAULT_FORMATS: &[&str] = &["Series", "One Shot", "Anthology"];
