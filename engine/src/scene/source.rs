//! Record sources: where the refresh worker gets the current record set.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::world::ContainerRecord;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode records: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record source unavailable: {0}")]
    Unavailable(String),
}

/// Anything that can produce the full record set. Called from the refresh
/// worker thread, so implementations must be `Send`.
pub trait RecordSource: Send {
    fn fetch(&self) -> Result<Vec<ContainerRecord>, SourceError>;

    /// Short label for log lines.
    fn describe(&self) -> String {
        "record source".to_string()
    }
}

/// JSON array of records on disk, re-read on every fetch.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for JsonFileSource {
    fn fetch(&self) -> Result<Vec<ContainerRecord>, SourceError> {
        let text = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        decode_records(&text)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Decode a JSON array of records. Entries that do not decode (unknown size
/// or status, missing fields) are skipped with a warning; only a document
/// that is not an array fails the whole set.
pub fn decode_records(text: &str) -> Result<Vec<ContainerRecord>, SourceError> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(text)?;
    let mut records = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<ContainerRecord>(entry) {
            Ok(record) => records.push(record),
            Err(e) => log::warn!("Skipping record #{}: {}", i, e),
        }
    }
    Ok(records)
}

/// In-memory record set. Clones share the same records, so a test or demo
/// can swap the contents and then request a refresh.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Arc<Mutex<Option<Vec<ContainerRecord>>>>,
}

impl StaticSource {
    pub fn new(records: Vec<ContainerRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(Some(records))),
        }
    }

    /// Replace the record set seen by later fetches.
    pub fn replace(&self, records: Vec<ContainerRecord>) {
        if let Ok(mut guard) = self.records.lock() {
            *guard = Some(records);
        }
    }

    /// Make later fetches fail until `replace` is called again.
    pub fn set_unavailable(&self) {
        if let Ok(mut guard) = self.records.lock() {
            *guard = None;
        }
    }
}

impl RecordSource for StaticSource {
    fn fetch(&self) -> Result<Vec<ContainerRecord>, SourceError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| SourceError::Unavailable("record store poisoned".to_string()))?;
        guard
            .clone()
            .ok_or_else(|| SourceError::Unavailable("static source offline".to_string()))
    }

    fn describe(&self) -> String {
        "static records".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{ContainerStatus, SizeClass};

    #[test]
    fn test_static_source_replace_and_fail() {
        let source = StaticSource::new(Vec::new());
        assert!(source.fetch().unwrap().is_empty());

        let handle = source.clone();
        handle.replace(vec![ContainerRecord::new("a", "A1A", SizeClass::Twenty, "MSC", ContainerStatus::Normal)]);
        assert_eq!(source.fetch().unwrap().len(), 1);

        handle.set_unavailable();
        assert!(matches!(source.fetch(), Err(SourceError::Unavailable(_))));
    }

    #[test]
    fn test_json_file_source_reads_records() {
        let path = std::env::temp_dir().join(format!("yard_records_{}.json", std::process::id()));
        fs::write(
            &path,
            r#"[{"id":"MSCU1","slot":"B2A","size":"40HC","carrier":"MSC","status":"flagged"}]"#,
        )
        .unwrap();

        let records = JsonFileSource::new(&path).fetch().unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].size, SizeClass::FortyHighCube);
        assert_eq!(records[0].status, ContainerStatus::Flagged);
    }

    #[test]
    fn test_bad_entries_are_skipped() {
        let text = r#"[
            {"id":"A","slot":"A1A","size":"20","carrier":"MSC","status":"normal"},
            {"id":"B","slot":"A2A","size":"53","carrier":"MSC","status":"normal"},
            {"id":"C","slot":"A3A","size":"40","carrier":"ONE","status":"lost"},
            {"id":"D","slot":"A4A","size":"45","carrier":"ONE","status":"pending"}
        ]"#;
        let records = decode_records(text).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "D"]);

        assert!(matches!(decode_records(r#"{"id":"A"}"#), Err(SourceError::Json(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = JsonFileSource::new("/nonexistent/yard.json").fetch().unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }
}
