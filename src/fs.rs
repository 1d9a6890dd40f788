//! Filesystem bucket
//!
//! Blobs are regular files below a root directory. Writes are staged in a
//! temporary file next to the destination, synced, then renamed over it, so a
//! reader sees either the previous file or the complete new one. Registered
//! under the `file` scheme: `file:///var/data` or `file://relative/dir`.

use crate::bucket::{Bucket, Entries, Reader};
use crate::glob::Pattern;
use crate::info::FileInfo;
use crate::options::CreateOptions;
use crate::path;
use crate::writer::{AtomicWriter, Staged, STAGING_PREFIX};
use crate::{Error, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use url::Url;
use walkdir::WalkDir;

/// Bucket rooted at a local directory
#[derive(Clone, Debug)]
pub struct FsBucket {
    root: PathBuf,
    /// `root` as a string with a trailing separator, for trimming walked paths
    prefix: String,
}

impl FsBucket {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let prefix = path::dir_prefix(&root.to_string_lossy());
        FsBucket { root, prefix }
    }

    /// Construct from a `file://` URL.
    ///
    /// A URL host is treated as the first segment of a relative root.
    pub fn from_url(url: &Url) -> Result<Self> {
        let root = match url.host_str().filter(|h| !h.is_empty()) {
            Some(host) => Path::new(host).join(url.path().trim_start_matches('/')),
            None => url
                .to_file_path()
                .map_err(|_| Error::Config(format!("not a local path: {url}")))?,
        };
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, raw: &str) -> Result<(String, PathBuf)> {
        let key = path::normalize(raw)?;
        let full = self.root.join(&key);
        Ok((key, full))
    }

    fn key_for(&self, native: &Path) -> String {
        path::strip_prefix(&native.to_string_lossy(), &self.prefix)
    }
}

impl Bucket for FsBucket {
    fn ls(&self, pattern: &str) -> Result<Entries<'_>> {
        let pattern = Pattern::new(pattern)?;

        let entries = WalkDir::new(&self.root)
            .min_depth(1)
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() || is_staging(entry.path()) {
                        return None;
                    }
                    let key = self.key_for(entry.path());
                    pattern.matches(&key).then_some(Ok(key))
                }
                // root missing, or an entry removed while walking
                Err(err) if err.io_error().map(io::Error::kind) == Some(io::ErrorKind::NotFound) => {
                    None
                }
                Err(err) => Some(Err(Error::Io(err.into()))),
            });
        Ok(Box::new(entries))
    }

    fn info(&self, path: &str) -> Result<FileInfo> {
        let (key, full) = self.resolve(path)?;
        let meta = match fs::metadata(&full) {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(Error::FileNotFound(key)),
            Err(err) => return Err(not_found_or(err, key)),
        };
        Ok(FileInfo::from_system_time(key, meta.len(), meta.modified()?))
    }

    fn open(&self, path: &str) -> Result<Reader> {
        let (key, full) = self.resolve(path)?;
        let file = File::open(&full).map_err(|err| not_found_or(err, key.clone()))?;
        if !file.metadata()?.is_file() {
            return Err(Error::FileNotFound(key));
        }
        Ok(Box::new(file))
    }

    fn create(&self, path: &str, _options: &CreateOptions) -> Result<AtomicWriter> {
        let (key, full) = self.resolve(path)?;
        let dir = full.parent().unwrap_or(&self.root).to_path_buf();
        fs::create_dir_all(&dir)?;

        AtomicWriter::temp_file_in(
            key,
            &dir,
            Box::new(move |staged: Staged| -> Result<()> { persist(staged, &full) }),
        )
    }

    fn rm(&self, path: &str) -> Result<()> {
        let (key, full) = self.resolve(path)?;
        match fs::remove_file(&full) {
            Ok(()) => {
                debug!(path = %key, "blob removed");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn mv(&self, src: &str, dst: &str) -> Result<()> {
        let (src_key, src_full) = self.resolve(src)?;
        let (dst_key, dst_full) = self.resolve(dst)?;

        match fs::metadata(&src_full) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(Error::FileNotFound(src_key)),
            Err(err) => return Err(not_found_or(err, src_key)),
        }
        if src_key == dst_key {
            return Ok(());
        }

        if let Some(dir) = dst_full.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::rename(&src_full, &dst_full).map_err(|err| not_found_or(err, src_key.clone()))?;
        debug!(src = %src_key, dst = %dst_key, "blob moved");
        Ok(())
    }
}

/// Move staged content into place with a single rename
fn persist(staged: Staged, dest: &Path) -> Result<()> {
    let dir = dest.parent().unwrap_or(Path::new("."));
    let tmp = match staged {
        Staged::File(tmp) => tmp,
        Staged::Memory(buf) => {
            let mut tmp = tempfile::Builder::new()
                .prefix(STAGING_PREFIX)
                .tempfile_in(dir)?;
            tmp.write_all(&buf)?;
            tmp
        }
    };
    finish(tmp, dest)?;
    sync_dir(dir);
    Ok(())
}

fn finish(mut tmp: NamedTempFile, dest: &Path) -> Result<()> {
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|err| Error::Io(err.error))?;
    Ok(())
}

fn sync_dir(dir: &Path) {
    match File::open(dir) {
        Ok(handle) => {
            if let Err(err) = handle.sync_all() {
                warn!(path = %dir.display(), error = %err, "directory sync failed");
            }
        }
        Err(err) => {
            warn!(path = %dir.display(), error = %err, "directory open failed");
        }
    }
}

fn is_staging(native: &Path) -> bool {
    native
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(STAGING_PREFIX))
}

fn not_found_or(err: io::Error, key: String) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        Error::FileNotFound(key)
    } else {
        Error::Io(err)
    }
}
