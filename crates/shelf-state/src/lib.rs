//! Client-side state for the Shelf catalog.
//!
//! Mirrors a backend's collections in memory, applies mutations
//! optimistically and reconciles them when the backend answers:
//!
//! - [`Catalog`]: entity stores, taxonomy operations and the
//!   work/creator relationship rules
//! - [`NavigationState`]: browser-style page history driven by a pure reducer
//! - [`SessionCell`]: JSON values scoped to the open database
//! - [`App`]: ties the above to backend lifecycle notifications
//!
//! # Module Organization
//!
//! - [`task`]: deferred continuations returned by mutators
//! - [`store`]: snapshot-backed keyed and ordered stores
//! - [`relationship`]: two-sided work/creator edits
//! - [`catalog`]: optimistic mutators and response handling
//! - [`navigation`]: history reducer
//! - [`session`]: session storage and cells
//! - [`notice`]: user-visible rejection messages
//! - [`app`]: top-level state machine

pub mod app;
pub mod catalog;
pub mod error;
pub mod navigation;
pub mod notice;
pub mod relationship;
pub mod session;
pub mod store;
pub mod task;

pub use app::{App, Message, Screen};
pub use catalog::{Catalog, CatalogEvent, CatalogMessage, CatalogTaxonomy};
pub use error::StateError;
pub use navigation::{MAIN_TAB_GROUP, MainTab, NavigationAction, NavigationState, Page};
pub use notice::{Notice, Notices};
pub use session::{
    MemorySessionStorage, SessionCell, SessionReducer, SessionStorage, StorageKey,
};
pub use store::{KeyedStore, OrderedStore, Phase};
pub use task::Task;
