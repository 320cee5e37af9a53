//! Engine configuration

use std::path::PathBuf;

/// Environment variable naming the database
pub const ENV_DB_NAME: &str = "TABULA_DB_NAME";
/// Environment variable pointing at the snapshot file
pub const ENV_SNAPSHOT: &str = "TABULA_SNAPSHOT";
/// Environment variable enabling autosave (`1`, `true`, `yes`, `on`)
pub const ENV_AUTOSAVE: &str = "TABULA_AUTOSAVE";

/// Configuration for an [`ExecutionEngine`](crate::executor::ExecutionEngine)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Database name, used when no snapshot exists yet
    pub name: String,

    /// JSON snapshot to load on open and to save to
    pub snapshot_path: Option<PathBuf>,

    /// Persist after every successful mutating statement
    pub autosave: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            snapshot_path: None,
            autosave: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    /// Defaults overridden by `TABULA_DB_NAME`, `TABULA_SNAPSHOT` and
    /// `TABULA_AUTOSAVE`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(name) = lookup(ENV_DB_NAME).filter(|s| !s.is_empty()) {
            config.name = name;
        }
        if let Some(path) = lookup(ENV_SNAPSHOT).filter(|s| !s.is_empty()) {
            config.snapshot_path = Some(PathBuf::from(path));
        }
        if let Some(flag) = lookup(ENV_AUTOSAVE) {
            config.autosave = matches!(
                flag.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        config
    }
}
