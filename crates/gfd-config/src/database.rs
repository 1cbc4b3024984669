//! Local database and audit trail locations.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_path() -> String {
    ".gfd/gfd.db".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// libSQL database file. `":memory:"` opens a throwaway database.
    #[serde(default = "default_path")]
    pub path: String,

    /// Directory for the JSONL audit mirror. Empty disables the mirror.
    #[serde(default)]
    pub audit_trail_dir: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            audit_trail_dir: String::new(),
        }
    }
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }

    /// Audit mirror directory, if configured.
    pub fn audit_trail_path(&self) -> Option<PathBuf> {
        (!self.audit_trail_dir.is_empty()).then(|| PathBuf::from(&self.audit_trail_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = DatabaseConfig::default();
        assert_eq!(config.path, ".gfd/gfd.db");
        assert!(!config.is_in_memory());
        assert!(config.audit_trail_path().is_none());
    }

    #[test]
    fn audit_trail_path_when_set() {
        let config = DatabaseConfig {
            audit_trail_dir: ".gfd/audit".into(),
            ..Default::default()
        };
        assert_eq!(config.audit_trail_path(), Some(PathBuf::from(".gfd/audit")));
    }
}
