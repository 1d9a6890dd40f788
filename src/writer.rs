//! Stage-then-commit write sink
//!
//! An [`AtomicWriter`] buffers everything written to it in a staging area (a
//! temporary file or an in-memory buffer). Nothing reaches the destination until
//! [`AtomicWriter::close`] hands the finished staging area to the driver's
//! commit action. Dropping a writer that was never closed aborts it, so an
//! early return or a panic leaves the destination untouched.
//!
//! ```text
//! open ──close──▶ committing ──ok──▶ committed
//!   │                  └──err──▶ aborted
//!   └──abort / drop──────────────▶ aborted
//! ```

use crate::Result;
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Driver-supplied action that makes staged content visible at the destination
pub type CommitFn = Box<dyn FnOnce(Staged) -> Result<()> + Send>;

/// Finished staging area handed to a commit action.
///
/// Temporary files are removed when this value is dropped, unless the commit
/// action persisted them.
pub enum Staged {
    File(NamedTempFile),
    Memory(Vec<u8>),
}

impl Staged {
    /// Number of staged bytes
    pub fn len(&self) -> io::Result<u64> {
        match self {
            Staged::File(tmp) => Ok(tmp.as_file().metadata()?.len()),
            Staged::Memory(buf) => Ok(buf.len() as u64),
        }
    }

    pub fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// A fresh read handle positioned at the start of the staged content
    pub fn reopen(&self) -> io::Result<Box<dyn Read + Send>> {
        match self {
            Staged::File(tmp) => Ok(Box::new(tmp.reopen()?)),
            Staged::Memory(buf) => Ok(Box::new(io::Cursor::new(buf.clone()))),
        }
    }

    /// Read all staged content into memory
    pub fn into_bytes(self) -> io::Result<Vec<u8>> {
        match self {
            Staged::File(tmp) => {
                let mut file: File = tmp.reopen()?;
                let mut buf = Vec::new();
                file.read_to_end(&mut buf)?;
                Ok(buf)
            }
            Staged::Memory(buf) => Ok(buf),
        }
    }
}

impl fmt::Debug for Staged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Staged::File(tmp) => f.debug_tuple("File").field(&tmp.path()).finish(),
            Staged::Memory(buf) => f.debug_tuple("Memory").field(&buf.len()).finish(),
        }
    }
}

/// Lifecycle of a writer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriterState {
    /// Accepting bytes
    Open,
    /// Commit action running
    Committing,
    /// Destination now holds the written content
    Committed,
    /// Destination unchanged, staging discarded
    Aborted,
}

/// Write sink bound to one destination path of one bucket
pub struct AtomicWriter {
    path: String,
    staging: Option<Staged>,
    commit: Option<CommitFn>,
    state: WriterState,
}

impl AtomicWriter {
    /// Stage into memory
    pub fn in_memory(path: impl Into<String>, commit: CommitFn) -> Self {
        Self::with_staging(path, Staged::Memory(Vec::new()), commit)
    }

    /// Stage into a temporary file in the system temp directory
    pub fn temp_file(path: impl Into<String>, commit: CommitFn) -> Result<Self> {
        let tmp = NamedTempFile::new()?;
        Ok(Self::with_staging(path, Staged::File(tmp), commit))
    }

    /// Stage into a temporary file inside `dir`.
    ///
    /// Staging next to the destination keeps the final rename on one filesystem.
    pub fn temp_file_in(
        path: impl Into<String>,
        dir: impl AsRef<Path>,
        commit: CommitFn,
    ) -> Result<Self> {
        let tmp = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(dir)?;
        Ok(Self::with_staging(path, Staged::File(tmp), commit))
    }

    fn with_staging(path: impl Into<String>, staging: Staged, commit: CommitFn) -> Self {
        AtomicWriter {
            path: path.into(),
            staging: Some(staging),
            commit: Some(commit),
            state: WriterState::Open,
        }
    }

    /// Destination key
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Commit the staged content.
    ///
    /// Runs the commit action exactly once. If it fails the writer ends up
    /// aborted and the error is returned. Closing an already closed writer does
    /// nothing and reports the earlier outcome.
    pub fn close(&mut self) -> Result<WriterState> {
        if self.state != WriterState::Open {
            return Ok(self.state);
        }

        let (staging, commit) = match (self.staging.take(), self.commit.take()) {
            (Some(staging), Some(commit)) => (staging, commit),
            _ => {
                self.state = WriterState::Aborted;
                return Ok(self.state);
            }
        };

        self.state = WriterState::Committing;
        match commit(staging) {
            Ok(()) => {
                self.state = WriterState::Committed;
                debug!(path = %self.path, "blob committed");
                Ok(self.state)
            }
            Err(err) => {
                self.state = WriterState::Aborted;
                warn!(path = %self.path, error = %err, "commit failed, write aborted");
                Err(err)
            }
        }
    }

    /// Discard the staged content, leaving the destination as it was
    pub fn abort(&mut self) -> WriterState {
        if self.state == WriterState::Open {
            self.staging = None;
            self.commit = None;
            self.state = WriterState::Aborted;
            debug!(path = %self.path, "write aborted");
        }
        self.state
    }

    fn staging_mut(&mut self) -> io::Result<&mut Staged> {
        match (self.state, self.staging.as_mut()) {
            (WriterState::Open, Some(staging)) => Ok(staging),
            _ => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                format!("writer for {} is closed", self.path),
            )),
        }
    }
}

/// File-name prefix of staging files created by [`AtomicWriter::temp_file_in`]
pub const STAGING_PREFIX: &str = ".bucketfs-tmp";

impl Write for AtomicWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.staging_mut()? {
            Staged::File(tmp) => tmp.write(buf),
            Staged::Memory(mem) => mem.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.staging_mut()? {
            Staged::File(tmp) => tmp.flush(),
            Staged::Memory(_) => Ok(()),
        }
    }
}

impl Drop for AtomicWriter {
    fn drop(&mut self) {
        self.abort();
    }
}

impl fmt::Debug for AtomicWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicWriter")
            .field("path", &self.path)
            .field("state", &self.state)
            .finish()
    }
}
