//! In-memory bucket
//!
//! Blobs live in a process-local map. Used as a test double and to exercise
//! the bucket contract without touching real storage. Registered under the
//! `mem` scheme.

use crate::bucket::{Bucket, Entries, Reader};
use crate::glob::Pattern;
use crate::info::FileInfo;
use crate::options::CreateOptions;
use crate::path::{self, Metadata};
use crate::writer::{AtomicWriter, Staged};
use crate::{Error, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use url::Url;

/// A stored blob
#[derive(Clone, Debug)]
struct Entry {
    data: Bytes,
    modified_at: DateTime<Utc>,
    content_type: Option<String>,
    metadata: Metadata,
}

type Files = Arc<RwLock<HashMap<String, Entry>>>;

/// Bucket backed by an in-process map
#[derive(Clone, Default)]
pub struct InMemBucket {
    files: Files,
}

impl InMemBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct from a `mem://` URL; host, path and query are ignored
    pub fn from_url(_url: &Url) -> Result<Self> {
        Ok(Self::new())
    }

    /// Remove every blob
    pub fn clear(&self) {
        self.files.write().clear();
    }

    /// Number of stored blobs
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl Bucket for InMemBucket {
    fn ls(&self, pattern: &str) -> Result<Entries<'_>> {
        let pattern = Pattern::new(pattern)?;
        // snapshot the keys so the listing does not hold the lock
        let keys: Vec<String> = self
            .files
            .read()
            .keys()
            .filter(|key| pattern.matches(key))
            .cloned()
            .collect();
        Ok(Box::new(keys.into_iter().map(Ok)))
    }

    fn info(&self, path: &str) -> Result<FileInfo> {
        let path = path::normalize(path)?;
        let files = self.files.read();
        let entry = files
            .get(&path)
            .ok_or_else(|| Error::FileNotFound(path.clone()))?;

        Ok(FileInfo::new(path.clone(), entry.data.len() as u64, entry.modified_at)
            .with_content_type(entry.content_type.clone())
            .with_metadata(entry.metadata.clone()))
    }

    fn open(&self, path: &str) -> Result<Reader> {
        let path = path::normalize(path)?;
        let files = self.files.read();
        let entry = files.get(&path).ok_or(Error::FileNotFound(path))?;
        // Bytes clones share the buffer but each cursor has its own position
        Ok(Box::new(Cursor::new(entry.data.clone())))
    }

    fn create(&self, path: &str, options: &CreateOptions) -> Result<AtomicWriter> {
        let path = path::normalize(path)?;
        let files = self.files.clone();
        let key = path.clone();
        let content_type = options.content_type.clone();
        let metadata = path::norm_meta(&options.metadata);

        Ok(AtomicWriter::in_memory(
            path,
            Box::new(move |staged: Staged| -> Result<()> {
                let entry = Entry {
                    data: Bytes::from(staged.into_bytes()?),
                    modified_at: Utc::now(),
                    content_type,
                    metadata,
                };
                files.write().insert(key, entry);
                Ok(())
            }),
        ))
    }

    fn rm(&self, path: &str) -> Result<()> {
        let path = path::normalize(path)?;
        self.files.write().remove(&path);
        Ok(())
    }
}
