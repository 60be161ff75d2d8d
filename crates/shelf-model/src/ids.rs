//! Typed entity identifiers.
//!
//! Identifiers are assigned by the backend. Two reserved ranges exist on the
//! client side:
//! - `0` marks a draft that has never been sent to the backend
//! - negative values are provisional identities handed out while a create
//!   request is in flight

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Identifier of a draft that has not been persisted.
            pub const UNSAVED: Self = Self(0);

            /// Raw backend value.
            #[inline]
            pub const fn get(self) -> i64 {
                self.0
            }

            /// True for identifiers confirmed by the backend.
            #[inline]
            pub const fn is_persisted(self) -> bool {
                self.0 > 0
            }

            /// True for placeholder identities awaiting backend confirmation.
            #[inline]
            pub const fn is_provisional(self) -> bool {
                self.0 < 0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of a [`Work`](crate::Work).
    WorkId
);
entity_id!(
    /// Identifier of a [`Creator`](crate::Creator).
    CreatorId
);
entity_id!(
    /// Identifier of a [`Status`](crate::Status).
    StatusId
);
entity_id!(
    /// Identifier of a [`WorkType`](crate::WorkType).
    WorkTypeId
);
entity_id!(
    /// Identifier of a [`Format`](crate::Format).
    FormatId
);

/// The five entity collections mirrored on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Work,
    Creator,
    Status,
    Type,
    Format,
}

impl EntityKind {
    /// Singular display label ("Work").
    pub fn label(&self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Creator => "Creator",
            Self::Status => "Status",
            Self::Type => "Type",
            Self::Format => "Format",
        }
    }

    /// Plural display label ("Works").
    pub fn plural(&self) -> &'static str {
        match self {
            Self::Work => "Works",
            Self::Creator => "Creators",
            Self::Status => "Statuses",
            Self::Type => "Types",
            Self::Format => "Formats",
        }
    }

    /// All kinds in load order.
    pub const fn all() -> &'static [EntityKind] {
        &[
            Self::Status,
            Self::Type,
            Self::Format,
            Self::Work,
            Self::Creator,
        ]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
