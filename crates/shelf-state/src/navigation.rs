//! Navigation history.
//!
//! A browser-style stack of visited detail pages with a cursor. The cursor
//! may sit before the first page, which is the home view. All transitions
//! go through [`NavigationState::reduce`], a pure function; persistence is
//! layered on top by [`SessionReducer`](crate::SessionReducer).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shelf_model::{CreatorId, WorkId};
use tracing::warn;

// =============================================================================
// PAGE
// =============================================================================

/// One browsable detail screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum Page {
    Work(WorkId),
    Creator(CreatorId),
}

impl Page {
    pub fn label(&self) -> String {
        match self {
            Self::Work(id) => format!("Work [{id}]"),
            Self::Creator(id) => format!("Creator [{id}]"),
        }
    }
}

// =============================================================================
// TABS
// =============================================================================

/// Tab group holding the top-level tab selection.
pub const MAIN_TAB_GROUP: &str = "main";

/// Top-level tabs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MainTab {
    /// Update triage view.
    #[default]
    Update,
    Library,
}

impl MainTab {
    pub const fn index(self) -> usize {
        match self {
            Self::Update => 0,
            Self::Library => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Update),
            1 => Some(Self::Library),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Update => "Update",
            Self::Library => "Library",
        }
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Visited pages plus a cursor. `cursor == None` is the home view.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationState {
    pages: Vec<Page>,
    cursor: Option<usize>,
    tabs: BTreeMap<String, usize>,
}

/// A navigation transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationAction {
    Home,
    Back,
    Forward,
    /// Visit a page, discarding forward history.
    New(Page),
    /// Move the cursor to an existing history index.
    GoTo(usize),
    /// Replace the whole history with one page and show the library tab.
    JumpTo(Page),
    /// Purge every occurrence of a page, e.g. after its entity was deleted.
    Remove(Page),
    TabChange { group: String, index: usize },
}

impl NavigationState {
    /// Build a state from parts. Out-of-range cursors are clamped to the last page.
    pub fn with_pages(pages: Vec<Page>, cursor: Option<usize>) -> Self {
        let cursor = match cursor {
            Some(index) if pages.is_empty() => {
                warn!(index, "cursor without pages, showing home");
                None
            }
            Some(index) => Some(index.min(pages.len() - 1)),
            None => None,
        };
        Self {
            pages,
            cursor,
            tabs: BTreeMap::new(),
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Page on display, `None` for home.
    pub fn current(&self) -> Option<Page> {
        self.cursor.and_then(|index| self.pages.get(index).copied())
    }

    pub fn is_home(&self) -> bool {
        self.cursor.is_none()
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_go_forward(&self) -> bool {
        self.next_index() < self.pages.len()
    }

    /// Pages behind the cursor, nearest first.
    pub fn back_entries(&self) -> Vec<(usize, Page)> {
        match self.cursor {
            Some(cursor) => self
                .pages
                .iter()
                .copied()
                .enumerate()
                .take(cursor)
                .rev()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Pages ahead of the cursor, nearest first.
    pub fn forward_entries(&self) -> Vec<(usize, Page)> {
        let start = self.next_index();
        self.pages
            .iter()
            .copied()
            .enumerate()
            .skip(start)
            .collect()
    }

    /// Selected tab of `group`, if one was ever chosen.
    pub fn tab(&self, group: &str) -> Option<usize> {
        self.tabs.get(group).copied()
    }

    pub fn main_tab(&self) -> MainTab {
        self.tab(MAIN_TAB_GROUP)
            .and_then(MainTab::from_index)
            .unwrap_or_default()
    }

    fn next_index(&self) -> usize {
        self.cursor.map_or(0, |cursor| cursor + 1)
    }

    /// Apply one transition.
    pub fn reduce(mut self, action: NavigationAction) -> Self {
        match action {
            NavigationAction::Home => self.cursor = None,
            NavigationAction::Back => {
                self.cursor = self.cursor.and_then(|cursor| cursor.checked_sub(1));
            }
            NavigationAction::Forward => {
                if self.can_go_forward() {
                    self.cursor = Some(self.next_index());
                }
            }
            NavigationAction::New(page) => {
                let keep = self.next_index();
                self.pages.truncate(keep);
                self.pages.push(page);
                self.cursor = Some(self.pages.len() - 1);
            }
            NavigationAction::GoTo(index) => {
                if index < self.pages.len() {
                    self.cursor = Some(index);
                } else {
                    warn!(index, len = self.pages.len(), "ignoring out-of-range history jump");
                }
            }
            NavigationAction::JumpTo(page) => {
                self.pages = vec![page];
                self.cursor = Some(0);
                self.tabs
                    .insert(MAIN_TAB_GROUP.to_string(), MainTab::Library.index());
            }
            NavigationAction::Remove(page) => {
                let removed_before = match self.cursor {
                    Some(cursor) => self
                        .pages
                        .iter()
                        .take(cursor + 1)
                        .filter(|p| **p == page)
                        .count(),
                    None => 0,
                };
                self.pages.retain(|p| *p != page);
                self.cursor = self
                    .cursor
                    .and_then(|cursor| (cursor + 1).checked_sub(removed_before))
                    .and_then(|remaining| remaining.checked_sub(1));
            }
            NavigationAction::TabChange { group, index } => {
                self.tabs.insert(group, index);
            }
        }
        self
    }
}

/// Free-function form of [`NavigationState::reduce`].
pub fn reduce(state: NavigationState, action: NavigationAction) -> NavigationState {
    state.reduce(action)
}
