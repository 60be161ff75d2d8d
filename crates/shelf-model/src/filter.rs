//! Library and update-view filters.
//!
//! Filters are plain serialisable values so the UI can keep them in session
//! state between page visits.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::entity::{Creator, Status, Work};
use crate::ids::{FormatId, StatusId, WorkTypeId};

/// Case-insensitive substring match. An empty needle matches everything.
pub fn name_matches(name: &str, needle: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || name.to_lowercase().contains(&needle.to_lowercase())
}

/// Filter for the works table.
///
/// An empty id set means "no constraint" for that column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorksFilter {
    pub name: String,
    pub statuses: BTreeSet<StatusId>,
    pub types: BTreeSet<WorkTypeId>,
    pub formats: BTreeSet<FormatId>,
}

impl WorksFilter {
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
            && self.statuses.is_empty()
            && self.types.is_empty()
            && self.formats.is_empty()
    }

    pub fn matches(&self, work: &Work) -> bool {
        name_matches(&work.name, &self.name)
            && (self.statuses.is_empty() || self.statuses.contains(&work.status))
            && (self.types.is_empty() || self.types.contains(&work.work_type))
            && (self.formats.is_empty() || self.formats.contains(&work.format))
    }
}

/// Filter for the creators table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatorsFilter {
    pub name: String,
}

impl CreatorsFilter {
    pub fn matches(&self, creator: &Creator) -> bool {
        name_matches(&creator.name, &self.name)
    }
}

/// Works routed into the update triage view.
///
/// Keeps works whose status is flagged `is_update` and that pass `filter`,
/// ordered by status display position, then name.
pub fn update_queue<'a>(
    works: impl IntoIterator<Item = &'a Work>,
    statuses: &[Status],
    filter: &WorksFilter,
) -> Vec<&'a Work> {
    let positions: HashMap<StatusId, usize> = statuses
        .iter()
        .enumerate()
        .filter(|(_, status)| status.is_update)
        .map(|(index, status)| (status.id, index))
        .collect();

    let mut queue: Vec<&Work> = works
        .into_iter()
        .filter(|work| positions.contains_key(&work.status) && filter.matches(work))
        .collect();
    queue.sort_by(|a, b| {
        positions[&a.status]
            .cmp(&positions[&b.status])
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    queue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::WorkId;

    fn work(id: i64, name: &str, status: i64) -> Work {
        let mut work = Work::draft(name, "1", StatusId(status), WorkTypeId(1), FormatId(1));
        work.id = WorkId(id);
        work
    }

    #[test]
    fn test_name_matches_is_case_insensitive() {
        assert!(name_matches("Vinland Saga", "saga"));
        assert!(name_matches("Vinland Saga", "  "));
        assert!(!name_matches("Vinland Saga", "berserk"));
    }

    #[test]
    fn test_works_filter_sets() {
        let mut filter = WorksFilter::default();
        assert!(filter.is_empty());
        filter.statuses.insert(StatusId(2));
        assert!(!filter.matches(&work(1, "A", 1)));
        assert!(filter.matches(&work(2, "B", 2)));
    }

    #[test]
    fn test_works_filter_deserializes_partial_json() {
        let filter: WorksFilter = serde_json::from_str(r#"{"name":"one"}"#).unwrap();
        assert_eq!(filter.name, "one");
        assert!(filter.statuses.is_empty());
    }

    #[test]
    fn test_update_queue_uses_flagged_statuses() {
        let statuses = vec![
            Status { id: StatusId(1), name: "Reading".into(), is_update: true },
            Status { id: StatusId(2), name: "Completed".into(), is_update: false },
            Status { id: StatusId(3), name: "Waiting".into(), is_update: true },
        ];
        let works = vec![
            work(1, "zeta", 3),
            work(2, "alpha", 2),
            work(3, "beta", 1),
            work(4, "Gamma", 3),
        ];

        let queue: Vec<i64> = update_queue(&works, &statuses, &WorksFilter::default())
            .into_iter()
            .map(|w| w.id.get())
            .collect();
        assert_eq!(queue, vec![3, 4, 1]);
    }
}
