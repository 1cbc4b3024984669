//! JSONL mirror of the audit log.
//!
//! When enabled, every stored audit entry is also appended to
//! `{dir}/audit-YYYY-MM-DD.jsonl` (UTC date of the entry). The database stays
//! the source of truth; the mirror exists for log shipping and offline review.

use std::path::{Path, PathBuf};

use gfd_core::entities::AuditLog;

use crate::error::DatabaseError;

/// Appends audit entries to per-day JSONL files.
pub struct AuditTrailWriter {
    trail_dir: PathBuf,
    enabled: bool,
}

impl AuditTrailWriter {
    /// Create a writer for `trail_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory cannot be created.
    pub fn new(trail_dir: PathBuf) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(&trail_dir).map_err(|e| DatabaseError::Other(e.into()))?;
        Ok(Self {
            trail_dir,
            enabled: true,
        })
    }

    /// A writer that drops everything.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            trail_dir: PathBuf::new(),
            enabled: false,
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// File that holds entries for the entry's UTC day.
    #[must_use]
    pub fn path_for(&self, entry: &AuditLog) -> PathBuf {
        self.trail_dir
            .join(format!("audit-{}.jsonl", entry.timestamp.format("%Y-%m-%d")))
    }

    /// Append one entry.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the file write fails.
    pub fn append(&self, entry: &AuditLog) -> Result<(), DatabaseError> {
        if !self.enabled {
            return Ok(());
        }
        serde_jsonlines::append_json_lines(self.path_for(entry), [entry])
            .map_err(|e| DatabaseError::Other(e.into()))?;
        Ok(())
    }

    #[must_use]
    pub fn trail_dir(&self) -> &Path {
        &self.trail_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use gfd_core::enums::{AuditActionType, AuditStatus};

    fn entry(id: i64, day: u32) -> AuditLog {
        AuditLog {
            id,
            username: "admin".into(),
            action: "Track created".into(),
            action_type: AuditActionType::Create,
            resource_type: "Track".into(),
            resource_id: Some("1".into()),
            resource_name: Some("Spiral".into()),
            details: None,
            timestamp: Utc.with_ymd_and_hms(2026, 10, day, 12, 0, 0).unwrap(),
            ip_address: None,
            user_agent: None,
            status: AuditStatus::Success,
            error_message: None,
        }
    }

    #[test]
    fn appends_to_daily_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = AuditTrailWriter::new(dir.path().join("audit")).unwrap();
        writer.append(&entry(1, 15)).unwrap();
        writer.append(&entry(2, 15)).unwrap();
        writer.append(&entry(3, 16)).unwrap();

        let day15: Vec<AuditLog> =
            serde_jsonlines::json_lines(dir.path().join("audit/audit-2026-10-15.jsonl"))
                .unwrap()
                .collect::<Result<_, _>>()
                .unwrap();
        assert_eq!(day15.len(), 2);
        assert_eq!(day15[1].id, 2);
        assert!(dir.path().join("audit/audit-2026-10-16.jsonl").exists());
    }

    #[test]
    fn disabled_writer_is_a_no_op() {
        let writer = AuditTrailWriter::disabled();
        assert!(!writer.is_enabled());
        writer.append(&entry(1, 15)).unwrap();
    }
}
