//! Column comparators for the works and creators tables.
//!
//! Progress is compared numerically when it parses as a number. Values that
//! do not parse always sort after numeric ones in ascending order and before
//! them in descending order.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::entity::{Creator, Format, Status, Work, WorkType};
use crate::ids::{FormatId, StatusId, WorkTypeId};

/// Sortable columns of the works table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkColumn {
    #[default]
    Name,
    Progress,
    Status,
    Type,
    Format,
    Updated,
    Added,
}

/// Sortable columns of the creators table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreatorColumn {
    #[default]
    Name,
    Works,
}

/// A column plus direction, stored in session state by the tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder<C> {
    pub column: C,
    pub ascending: bool,
}

impl<C: Default> Default for SortOrder<C> {
    fn default() -> Self {
        Self {
            column: C::default(),
            ascending: true,
        }
    }
}

impl<C> SortOrder<C> {
    pub fn ascending(column: C) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    pub fn descending(column: C) -> Self {
        Self {
            column,
            ascending: false,
        }
    }
}

/// Display positions of taxonomy entries, used to sort works by status,
/// type or format in the order the user arranged them.
#[derive(Debug, Clone, Default)]
pub struct DisplayOrder {
    statuses: HashMap<StatusId, usize>,
    types: HashMap<WorkTypeId, usize>,
    formats: HashMap<FormatId, usize>,
}

impl DisplayOrder {
    pub fn new(statuses: &[Status], types: &[WorkType], formats: &[Format]) -> Self {
        Self {
            statuses: statuses.iter().enumerate().map(|(i, s)| (s.id, i)).collect(),
            types: types.iter().enumerate().map(|(i, t)| (t.id, i)).collect(),
            formats: formats.iter().enumerate().map(|(i, f)| (f.id, i)).collect(),
        }
    }

    /// Position of a status; unknown ids go last.
    pub fn status(&self, id: StatusId) -> usize {
        self.statuses.get(&id).copied().unwrap_or(usize::MAX)
    }

    pub fn work_type(&self, id: WorkTypeId) -> usize {
        self.types.get(&id).copied().unwrap_or(usize::MAX)
    }

    pub fn format(&self, id: FormatId) -> usize {
        self.formats.get(&id).copied().unwrap_or(usize::MAX)
    }
}

/// Parse a progress string as a finite number.
pub fn progress_value(progress: &str) -> Option<f64> {
    progress
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Compare two progress strings for the given direction.
///
/// The returned ordering is already directed: callers sort with it as-is.
pub fn compare_progress(a: &str, b: &str, ascending: bool) -> Ordering {
    match (progress_value(a), progress_value(b)) {
        (Some(x), Some(y)) => {
            if ascending {
                x.total_cmp(&y)
            } else {
                y.total_cmp(&x)
            }
        }
        (Some(_), None) => {
            if ascending {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (None, Some(_)) => {
            if ascending {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (None, None) => Ordering::Equal,
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn directed(ordering: Ordering, ascending: bool) -> Ordering {
    if ascending {
        ordering
    } else {
        ordering.reverse()
    }
}

/// Directed comparison of two works on one column.
///
/// For `Updated` and `Added`, ascending lists the most recent first.
pub fn compare_works(
    a: &Work,
    b: &Work,
    order: SortOrder<WorkColumn>,
    ranks: &DisplayOrder,
) -> Ordering {
    let ascending = order.ascending;
    match order.column {
        WorkColumn::Name => directed(compare_names(&a.name, &b.name), ascending),
        WorkColumn::Progress => compare_progress(&a.progress, &b.progress, ascending),
        WorkColumn::Status => directed(
            ranks.status(a.status).cmp(&ranks.status(b.status)),
            ascending,
        ),
        WorkColumn::Type => directed(
            ranks.work_type(a.work_type).cmp(&ranks.work_type(b.work_type)),
            ascending,
        ),
        WorkColumn::Format => directed(
            ranks.format(a.format).cmp(&ranks.format(b.format)),
            ascending,
        ),
        WorkColumn::Updated => directed(b.updated.cmp(&a.updated), ascending),
        WorkColumn::Added => directed(b.added.cmp(&a.added), ascending),
    }
}

/// Directed comparison of two creators on one column.
pub fn compare_creators(a: &Creator, b: &Creator, order: SortOrder<CreatorColumn>) -> Ordering {
    let ordering = match order.column {
        CreatorColumn::Name => compare_names(&a.name, &b.name),
        CreatorColumn::Works => a.works.len().cmp(&b.works.len()),
    };
    directed(ordering, order.ascending)
}

/// Stable sort of borrowed works.
pub fn sort_works<'a>(
    works: impl IntoIterator<Item = &'a Work>,
    order: SortOrder<WorkColumn>,
    ranks: &DisplayOrder,
) -> Vec<&'a Work> {
    let mut sorted: Vec<&Work> = works.into_iter().collect();
    sorted.sort_by(|a, b| compare_works(a, b, order, ranks));
    sorted
}

/// Stable sort of borrowed creators.
pub fn sort_creators<'a>(
    creators: impl IntoIterator<Item = &'a Creator>,
    order: SortOrder<CreatorColumn>,
) -> Vec<&'a Creator> {
    let mut sorted: Vec<&Creator> = creators.into_iter().collect();
    sorted.sort_by(|a, b| compare_creators(a, b, order));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_value() {
        assert_eq!(progress_value(" 12 "), Some(12.0));
        assert_eq!(progress_value("3.5"), Some(3.5));
        assert_eq!(progress_value("0"), Some(0.0));
        assert_eq!(progress_value("abc"), None);
        assert_eq!(progress_value(""), None);
        assert_eq!(progress_value("NaN"), None);
        assert_eq!(progress_value("inf"), None);
    }

    #[test]
    fn test_compare_progress_mixed() {
        assert_eq!(compare_progress("2", "10", true), Ordering::Less);
        assert_eq!(compare_progress("2", "10", false), Ordering::Greater);
        assert_eq!(compare_progress("x", "1", true), Ordering::Greater);
        assert_eq!(compare_progress("x", "1", false), Ordering::Less);
        assert_eq!(compare_progress("x", "y", true), Ordering::Equal);
    }
}
