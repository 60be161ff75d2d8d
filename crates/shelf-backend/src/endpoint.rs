//! Names of the gateway requests.
//!
//! Used for logging, failure injection in the in-memory backend, and for the
//! operation-named messages shown when a request is rejected.

use std::fmt;

/// One request of the gateway contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Open,
    Close,

    GetWorks,
    GetWork,
    AddWork,
    UpdateWorkName,
    UpdateWorkProgress,
    UpdateWorkStatus,
    UpdateWorkType,
    UpdateWorkFormat,
    RemoveWork,

    GetCreators,
    GetCreator,
    AddCreator,
    UpdateCreatorName,
    RemoveCreator,

    Attach,
    Detach,

    GetStatuses,
    AddStatus,
    RemoveStatus,
    RenameStatus,
    UpdateStatus,
    ReorderStatuses,

    GetTypes,
    AddType,
    RemoveType,
    RenameType,
    ReorderTypes,

    GetFormats,
    AddFormat,
    RemoveFormat,
    RenameFormat,
    ReorderFormats,
}

impl Endpoint {
    /// Verb phrase naming the attempted operation ("update Work Name").
    pub fn action(&self) -> &'static str {
        match self {
            Self::Open => "open database",
            Self::Close => "close database",
            Self::GetWorks => "get Works",
            Self::GetWork => "get Work",
            Self::AddWork => "add Work",
            Self::UpdateWorkName => "update Work Name",
            Self::UpdateWorkProgress => "update Work Progress",
            Self::UpdateWorkStatus => "update Work Status",
            Self::UpdateWorkType => "update Work Type",
            Self::UpdateWorkFormat => "update Work Format",
            Self::RemoveWork => "remove Work",
            Self::GetCreators => "get Creators",
            Self::GetCreator => "get Creator",
            Self::AddCreator => "add Creator",
            Self::UpdateCreatorName => "update Creator Name",
            Self::RemoveCreator => "remove Creator",
            Self::Attach => "attach",
            Self::Detach => "detach",
            Self::GetStatuses => "get Statuses",
            Self::AddStatus => "add Status",
            Self::RemoveStatus => "remove Status",
            Self::RenameStatus => "update Status Name",
            Self::UpdateStatus => "update Status",
            Self::ReorderStatuses => "reorder Statuses",
            Self::GetTypes => "get Types",
            Self::AddType => "add Type",
            Self::RemoveType => "remove Type",
            Self::RenameType => "update Type Name",
            Self::ReorderTypes => "reorder Types",
            Self::GetFormats => "get Formats",
            Self::AddFormat => "add Format",
            Self::RemoveFormat => "remove Format",
            Self::RenameFormat => "update Format Name",
            Self::ReorderFormats => "reorder Formats",
        }
    }

    /// Title of the message shown when this request is rejected.
    pub fn failure_title(&self) -> String {
        format!("Failed to {}.", self.action())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_titles_name_the_operation() {
        assert_eq!(Endpoint::UpdateWorkName.failure_title(), "Failed to update Work Name.");
        assert_eq!(Endpoint::Attach.failure_title(), "Failed to attach.");
        assert_eq!(Endpoint::GetCreators.failure_title(), "Failed to get Creators.");
    }
}
