//! Storage layer for formrelay.
//!
//! This module provides the file-backed submission log: one JSON array on
//! local disk that records are appended to and never mutated.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::submission::SubmissionRecord;

/// Append-only log of submission records.
///
/// The log is a pretty-printed JSON array in a single file. Appending reads
/// the whole file, pushes one record, and rewrites the file. Writes within
/// this process are serialized behind an async mutex so concurrent requests
/// cannot lose updates; the file itself carries no cross-process lock.
#[derive(Debug)]
pub struct SubmissionLog {
    /// Path to the log file.
    path: PathBuf,
    /// Serializes the read-modify-write append cycle.
    write_lock: Mutex<()>,
}

impl SubmissionLog {
    /// Open a submission log at the given path.
    ///
    /// Creates the parent directories if they don't exist. The file itself
    /// is created lazily on first append; a missing or empty file reads as
    /// an empty log.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        info!("Submission log at {}", path.display());
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Get the path to the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record to the log.
    ///
    /// Returns the number of records in the log after the append.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or rewritten.
    pub async fn append(&self, record: &SubmissionRecord) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.read_all()?;
        records.push(record.clone());

        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(&self.path, json).map_err(|source| Error::LogWrite {
            path: self.path.clone(),
            source,
        })?;

        debug!("Appended record {} ({} total)", record.id, records.len());
        Ok(records.len())
    }

    /// Get every record in the log, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn all(&self) -> Result<Vec<SubmissionRecord>> {
        let _guard = self.write_lock.lock().await;
        self.read_all()
    }

    /// Get the total record count plus the most recent `limit` records,
    /// newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn recent(&self, limit: usize) -> Result<(usize, Vec<SubmissionRecord>)> {
        let _guard = self.write_lock.lock().await;

        let records = self.read_all()?;
        let total = records.len();
        let recent = records
            .into_iter()
            .rev()
            .take(limit)
            .collect::<Vec<_>>();
        Ok((total, recent))
    }

    /// Read and parse the whole log file.
    ///
    /// A missing or empty file is an empty log.
    fn read_all(&self) -> Result<Vec<SubmissionRecord>> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(Error::LogRead {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if data.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&data).map_err(|source| Error::LogParse {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::{EmailOutcomes, SubmissionRecord};

    fn record(id: &str) -> SubmissionRecord {
        let form = crate::submission::SubmissionForm {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            service: "web".to_string(),
            message: "hello".to_string(),
        };
        SubmissionRecord::sent(
            id.to_string(),
            &form,
            EmailOutcomes::new(Some("msg-1".to_string()), Some("msg-2".to_string())),
        )
    }

    fn temp_log() -> (tempfile::TempDir, SubmissionLog) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let log = SubmissionLog::open(dir.path().join("submissions.json")).unwrap();
        (dir, log)
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let (_dir, log) = temp_log();
        assert!(log.all().await.unwrap().is_empty());

        let (total, recent) = log.recent(20).await.unwrap();
        assert_eq!(total, 0);
        assert!(recent.is_empty());
    }

    #[tokio::test]
    async fn test_empty_file_reads_empty() {
        let (_dir, log) = temp_log();
        std::fs::write(log.path(), "").unwrap();
        assert!(log.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_returns_count() {
        let (_dir, log) = temp_log();
        assert_eq!(log.append(&record("NL00000001")).await.unwrap(), 1);
        assert_eq!(log.append(&record("NL00000002")).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_append_preserves_order() {
        let (_dir, log) = temp_log();
        for i in 1..=5 {
            log.append(&record(&format!("NL0000000{i}"))).await.unwrap();
        }

        let all = log.all().await.unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].id, "NL00000001");
        assert_eq!(all[4].id, "NL00000005");
    }

    #[tokio::test]
    async fn test_recent_newest_first() {
        let (_dir, log) = temp_log();
        for i in 1..=5 {
            log.append(&record(&format!("NL0000000{i}"))).await.unwrap();
        }

        let (total, recent) = log.recent(3).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].id, "NL00000005");
        assert_eq!(recent[2].id, "NL00000003");
    }

    #[tokio::test]
    async fn test_recent_limit_caps_result() {
        let (_dir, log) = temp_log();
        for i in 10..35 {
            log.append(&record(&format!("NL000000{i}"))).await.unwrap();
        }

        let (total, recent) = log.recent(20).await.unwrap();
        assert_eq!(total, 25);
        assert_eq!(recent.len(), 20);
    }

    #[tokio::test]
    async fn test_file_is_json_array() {
        let (_dir, log) = temp_log();
        log.append(&record("NL00000001")).await.unwrap();

        let data = std::fs::read_to_string(log.path()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert!(parsed.is_array());
        assert_eq!(parsed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let (_dir, log) = temp_log();
        std::fs::write(log.path(), "{not json").unwrap();

        let result = log.all().await;
        assert!(matches!(result, Err(Error::LogParse { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_appends_lose_nothing() {
        let (_dir, log) = temp_log();
        let log = std::sync::Arc::new(log);

        let mut handles = Vec::new();
        for i in 0..10 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                log.append(&record(&format!("NL100000{i:02}"))).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(log.all().await.unwrap().len(), 10);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("submissions.json");
        let log = SubmissionLog::open(&nested).unwrap();
        assert_eq!(log.path(), nested.as_path());
        assert!(nested.parent().unwrap().exists());
    }
}
