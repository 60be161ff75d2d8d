//! Local state errors.
//!
//! These are developer-facing: they mean a caller asked for something the
//! local mirror cannot honour. Backend rejections never show up here; they
//! become [`Notice`](crate::Notice)s instead.

use shelf_model::EntityKind;
use thiserror::Error;

/// A request against local state that cannot be carried out.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// An id referenced locally has no local entry.
    #[error("{kind} [{id}] is missing from local state")]
    NotFound { kind: EntityKind, id: i64 },

    /// The entity has not been confirmed by the backend yet.
    #[error("{kind} [{id}] has not been saved yet")]
    Provisional { kind: EntityKind, id: i64 },

    /// The collection has never been loaded.
    #[error("{} have not been loaded", .0.plural())]
    Uninitialized(EntityKind),
}

impl StateError {
    pub fn not_found(kind: EntityKind, id: impl Into<i64>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn provisional(kind: EntityKind, id: impl Into<i64>) -> Self {
        Self::Provisional {
            kind,
            id: id.into(),
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => Some("Reload the library to resynchronize."),
            Self::Provisional { .. } => Some("Wait for the new entry to finish saving."),
            Self::Uninitialized(_) => Some("Open a database first."),
        }
    }
}
