//! Catalog entities.
//!
//! Works and creators reference each other through ordered id lists. The
//! lists never contain duplicates; the helpers on each type keep it that way.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::ids::{CreatorId, EntityKind, FormatId, StatusId, WorkId, WorkTypeId};

// =============================================================================
// TRAITS
// =============================================================================

/// An entity with a backend-assigned identity.
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    /// Identifier type for this entity.
    type Id: Copy + Ord + Debug + Send + Sync + From<i64> + Into<i64> + 'static;

    /// Collection this entity belongs to.
    const KIND: EntityKind;

    fn id(&self) -> Self::Id;

    fn set_id(&mut self, id: Self::Id);
}

/// A user-configurable, user-ordered taxonomy entry (status, type, format).
pub trait Taxonomy: Entity {
    /// Create a fresh entry with the given identity and name.
    fn create(id: Self::Id, name: String) -> Self;

    fn name(&self) -> &str;

    fn set_name(&mut self, name: String);
}

// =============================================================================
// WORK
// =============================================================================

/// A trackable item, e.g. a series being followed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    pub id: WorkId,
    pub name: String,
    /// Free-form progress marker. Usually numeric ("12", "3.5") but not
    /// required to be.
    pub progress: String,
    pub status: StatusId,
    #[serde(rename = "type")]
    pub work_type: WorkTypeId,
    pub format: FormatId,
    /// Last progress/status change, epoch milliseconds.
    pub updated: i64,
    /// Creation time, epoch milliseconds.
    pub added: i64,
    /// Related creators, in attachment order.
    pub creators: Vec<CreatorId>,
}

impl Work {
    /// Create an unsaved work with no creators.
    pub fn draft(
        name: impl Into<String>,
        progress: impl Into<String>,
        status: StatusId,
        work_type: WorkTypeId,
        format: FormatId,
    ) -> Self {
        Self {
            id: WorkId::UNSAVED,
            name: name.into(),
            progress: progress.into(),
            status,
            work_type,
            format,
            updated: 0,
            added: 0,
            creators: Vec::new(),
        }
    }

    /// Set the creators list, dropping repeated ids.
    pub fn with_creators(mut self, creators: impl IntoIterator<Item = CreatorId>) -> Self {
        self.creators.clear();
        for id in creators {
            self.add_creator(id);
        }
        self
    }

    pub fn has_creator(&self, id: CreatorId) -> bool {
        self.creators.contains(&id)
    }

    /// Append a creator. Returns false if it was already present.
    pub fn add_creator(&mut self, id: CreatorId) -> bool {
        if self.has_creator(id) {
            return false;
        }
        self.creators.push(id);
        true
    }

    /// Remove a creator. Returns false if it was not present.
    pub fn remove_creator(&mut self, id: CreatorId) -> bool {
        let before = self.creators.len();
        self.creators.retain(|c| *c != id);
        self.creators.len() != before
    }
}

impl Entity for Work {
    type Id = WorkId;
    const KIND: EntityKind = EntityKind::Work;

    fn id(&self) -> WorkId {
        self.id
    }

    fn set_id(&mut self, id: WorkId) {
        self.id = id;
    }
}

// =============================================================================
// CREATOR
// =============================================================================

/// A person or group associated with works.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub id: CreatorId,
    pub name: String,
    /// Related works, in attachment order.
    pub works: Vec<WorkId>,
}

impl Creator {
    /// Create an unsaved creator with no works.
    pub fn draft(name: impl Into<String>) -> Self {
        Self {
            id: CreatorId::UNSAVED,
            name: name.into(),
            works: Vec::new(),
        }
    }

    /// Set the works list, dropping repeated ids.
    pub fn with_works(mut self, works: impl IntoIterator<Item = WorkId>) -> Self {
        self.works.clear();
        for id in works {
            self.add_work(id);
        }
        self
    }

    pub fn has_work(&self, id: WorkId) -> bool {
        self.works.contains(&id)
    }

    /// Append a work. Returns false if it was already present.
    pub fn add_work(&mut self, id: WorkId) -> bool {
        if self.has_work(id) {
            return false;
        }
        self.works.push(id);
        true
    }

    /// Remove a work. Returns false if it was not present.
    pub fn remove_work(&mut self, id: WorkId) -> bool {
        let before = self.works.len();
        self.works.retain(|w| *w != id);
        self.works.len() != before
    }
}

impl Entity for Creator {
    type Id = CreatorId;
    const KIND: EntityKind = EntityKind::Creator;

    fn id(&self) -> CreatorId {
        self.id
    }

    fn set_id(&mut self, id: CreatorId) {
        self.id = id;
    }
}

// =============================================================================
// TAXONOMIES
// =============================================================================

/// A work status. Statuses flagged `is_update` route their works into the
/// update triage view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub id: StatusId,
    pub name: String,
    pub is_update: bool,
}

/// A work type ("Manga", "Novel", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkType {
    pub id: WorkTypeId,
    pub name: String,
}

/// A publication format ("Series", "One Shot", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Format {
    pub id: FormatId,
    pub name: String,
}

macro_rules! impl_taxonomy {
    ($ty:ident, $id:ident, $kind:expr, |$tid:ident, $tname:ident| $create:expr) => {
        impl Entity for $ty {
            type Id = $id;
            const KIND: EntityKind = $kind;

            fn id(&self) -> $id {
                self.id
            }

            fn set_id(&mut self, id: $id) {
                self.id = id;
            }
        }

        impl Taxonomy for $ty {
            fn create($tid: $id, $tname: String) -> Self {
                $create
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn set_name(&mut self, name: String) {
                self.name = name;
            }
        }
    };
}

impl_taxonomy!(Status, StatusId, EntityKind::Status, |id, name| Status {
    id,
    name,
    is_update: false,
});
impl_taxonomy!(WorkType, WorkTypeId, EntityKind::Type, |id, name| WorkType {
    id,
    name
});
impl_taxonomy!(Format, FormatId, EntityKind::Format, |id, name| Format {
    id,
    name
});

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_work() -> Work {
        Work::draft("Berserk", "12", StatusId(1), WorkTypeId(1), FormatId(1))
    }

    #[test]
    fn test_with_creators_drops_duplicates() {
        let work = sample_work().with_creators([CreatorId(2), CreatorId(3), CreatorId(2)]);
        assert_eq!(work.creators, vec![CreatorId(2), CreatorId(3)]);
    }

    #[test]
    fn test_add_and_remove_creator() {
        let mut work = sample_work();
        assert!(work.add_creator(CreatorId(5)));
        assert!(!work.add_creator(CreatorId(5)));
        assert!(work.remove_creator(CreatorId(5)));
        assert!(!work.remove_creator(CreatorId(5)));
        assert!(work.creators.is_empty());
    }

    #[test]
    fn test_work_serializes_type_field() {
        let json = serde_json::to_value(sample_work()).unwrap();
        assert_eq!(json["type"], 1);
        assert_eq!(json["progress"], "12");
        assert!(json.get("workType").is_none());
    }

    #[test]
    fn test_status_json_uses_camel_case() {
        let status = Status {
            id: StatusId(3),
            name: "Reading".into(),
            is_update: true,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["isUpdate"], true);
    }

    #[test]
    fn test_taxonomy_create() {
        let status = Status::create(StatusId(9), "Dropped".into());
        assert!(!status.is_update);
        let format = Format::create(FormatId(2), "One Shot".into());
        assert_eq!(format.name(), "One Shot");
    }
}
