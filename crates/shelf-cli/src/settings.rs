//! Persisted user preferences.
//!
//! Stored as TOML in the platform config directory. Unlike session state,
//! settings outlive the open database and the process.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shelf_model::{CreatorColumn, SortOrder, WorkColumn};
use tracing::{debug, warn};

/// Default number of recent databases remembered.
pub const MAX_RECENT: usize = 10;

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Database opened when `--database` is not given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_database: Option<PathBuf>,

    /// Recently opened databases, most recent first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recent_databases: Vec<PathBuf>,

    /// Maximum number of recent databases to remember.
    pub max_recent: usize,

    /// Default order of the works table.
    pub works_sort: SortOrder<WorkColumn>,

    /// Default order of the creators table.
    pub creators_sort: SortOrder<CreatorColumn>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_database: None,
            recent_databases: Vec::new(),
            max_recent: MAX_RECENT,
            works_sort: SortOrder::default(),
            creators_sort: SortOrder::default(),
        }
    }
}

impl Settings {
    /// Load settings from the default path.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`. Missing or unreadable files give defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Self::default();
        };
        match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring unreadable settings");
                Self::default()
            }
        }
    }

    /// Save settings to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save settings to `path`, creating its directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }

    /// Get the default config file path.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "shelf")
            .map(|dirs| dirs.config_dir().join("settings.toml"))
            .unwrap_or_else(|| PathBuf::from("settings.toml"))
    }

    /// Record `path` as the most recently opened database.
    pub fn record_database(&mut self, path: &Path) {
        self.recent_databases.retain(|recent| recent != path);
        self.recent_databases.insert(0, path.to_path_buf());
        self.recent_databases.truncate(self.max_recent);
        self.last_database = Some(path.to_path_buf());
    }

    /// Forget a database, e.g. one that no longer exists.
    pub fn forget_database(&mut self, path: &Path) {
        self.recent_databases.retain(|recent| recent != path);
        if self.last_database.as_deref() == Some(path) {
            self.last_database = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_moves_existing_entry_to_front() {
        let mut settings = Settings::default();
        settings.record_database(Path::new("a.db"));
        settings.record_database(Path::new("b.db"));
        settings.record_database(Path::new("a.db"));
        assert_eq!(
            settings.recent_databases,
            vec![PathBuf::from("a.db"), PathBuf::from("b.db")]
        );
        assert_eq!(settings.last_database, Some(PathBuf::from("a.db")));
    }

    #[test]
    fn test_recent_list_is_capped() {
        let mut settings = Settings::default();
        for index in 0..15 {
            settings.record_database(Path::new(&format!("{index}.db")));
        }
        assert_eq!(settings.recent_databases.len(), MAX_RECENT);
        assert_eq!(settings.recent_databases[0], PathBuf::from("14.db"));
    }

    #[test]
    fn test_forget_clears_last_database() {
        let mut settings = Settings::default();
        settings.record_database(Path::new("a.db"));
        settings.forget_database(Path::new("a.db"));
        assert!(settings.recent_databases.is_empty());
        assert_eq!(settings.last_database, None);
    }
}
