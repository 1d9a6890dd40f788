//! Blob metadata snapshots

use crate::path::Metadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Metadata for a single blob, as reported by `info`
///
/// A snapshot: it does not follow later writes to the same path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Bucket-relative key
    pub path: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub modified_at: DateTime<Utc>,
    /// Content type, if the backend records one
    pub content_type: Option<String>,
    /// User metadata
    #[serde(default)]
    pub metadata: Metadata,
}

impl FileInfo {
    pub fn new(path: impl Into<String>, size: u64, modified_at: DateTime<Utc>) -> Self {
        FileInfo {
            path: path.into(),
            size,
            modified_at,
            content_type: None,
            metadata: Metadata::new(),
        }
    }

    /// Build from a native filesystem timestamp
    pub fn from_system_time(path: impl Into<String>, size: u64, mtime: SystemTime) -> Self {
        Self::new(path, size, DateTime::<Utc>::from(mtime))
    }

    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_from_system_time() {
        let mtime = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let info = FileInfo::from_system_time("a/b.txt", 10, mtime);
        assert_eq!(info.modified_at.timestamp(), 1_700_000_000);
        assert_eq!(info.content_type, None);
        assert!(info.metadata.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let mut meta = Metadata::new();
        meta.insert("key".into(), "val".into());
        let info = FileInfo::new("a.txt", 3, Utc::now())
            .with_content_type(Some("text/plain".into()))
            .with_metadata(meta);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["path"], "a.txt");
        assert_eq!(json["size"], 3);
        assert_eq!(json["content_type"], "text/plain");
        assert_eq!(json["metadata"]["key"], "val");
    }
}
