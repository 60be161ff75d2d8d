//! User-visible messages about rejected backend requests.

use shelf_backend::{BackendError, Endpoint};

/// One dismissible message, titled after the attempted operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// e.g. "Failed to update Work Name."
    pub title: String,
    /// Backend-supplied reason.
    pub detail: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: detail.into(),
        }
    }

    /// Notice for a rejected request.
    pub fn rejected(endpoint: Endpoint, error: &BackendError) -> Self {
        Self::new(endpoint.failure_title(), error.user_message())
    }
}

/// Queue of notices awaiting dismissal, oldest first.
#[derive(Debug, Clone, Default)]
pub struct Notices {
    items: Vec<Notice>,
}

impl Notices {
    pub fn push(&mut self, notice: Notice) {
        self.items.push(notice);
    }

    /// Dismiss the notice at `index`. Out-of-range indices are ignored.
    pub fn dismiss(&mut self, index: usize) -> Option<Notice> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.items.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True if any queued notice carries `title`.
    pub fn contains_title(&self, title: &str) -> bool {
        self.items.iter().any(|notice| notice.title == title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_notice_names_operation() {
        let error = BackendError::Rejected("disk full".into());
        let notice = Notice::rejected(Endpoint::UpdateWorkName, &error);
        assert_eq!(notice.title, "Failed to update Work Name.");
        assert_eq!(notice.detail, "disk full");
    }

    #[test]
    fn test_dismiss() {
        let mut notices = Notices::default();
        notices.push(Notice::new("a", ""));
        notices.push(Notice::new("b", ""));
        assert!(notices.dismiss(5).is_none());
        assert_eq!(notices.dismiss(0).map(|n| n.title), Some("a".to_string()));
        assert_eq!(notices.latest().map(|n| n.title.as_str()), Some("b"));
        notices.clear();
        assert!(notices.is_empty());
    }
}
