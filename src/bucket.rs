//! The bucket capability interface
//!
//! Every driver implements [`Bucket`]. Callers hold a `Box<dyn Bucket>` from the
//! registry and never see the concrete driver type. [`BucketExt`] layers the
//! scoped read/write helpers on top of any bucket.

use crate::info::FileInfo;
use crate::options::CreateOptions;
use crate::path;
use crate::writer::AtomicWriter;
use crate::Result;
use std::io::{self, Read, Write};
use std::sync::Arc;

/// Readable byte stream returned by [`Bucket::open`]; released on drop
pub type Reader = Box<dyn Read + Send>;

/// Lazy listing returned by [`Bucket::ls`]
pub type Entries<'a> = Box<dyn Iterator<Item = Result<String>> + 'a>;

/// Uniform blob operations over one storage root.
///
/// Paths are bucket-relative and normalized by each driver with
/// [`path::normalize`]. Missing blobs are reported as
/// [`crate::Error::FileNotFound`], except by [`Bucket::rm`] which treats them
/// as already removed.
pub trait Bucket: Send + Sync {
    /// Lazily list blob keys matching a glob pattern.
    ///
    /// Only blobs are yielded, never directory markers. Order is unspecified;
    /// each call enumerates afresh.
    fn ls(&self, pattern: &str) -> Result<Entries<'_>>;

    /// Metadata for one blob
    fn info(&self, path: &str) -> Result<FileInfo>;

    /// Open a blob for reading
    fn open(&self, path: &str) -> Result<Reader>;

    /// Start an atomic write to `path`.
    ///
    /// Intermediate containers are created as needed. Nothing is visible at
    /// `path` until the returned writer is closed.
    fn create(&self, path: &str, options: &CreateOptions) -> Result<AtomicWriter>;

    /// Remove a blob; removing a missing blob succeeds
    fn rm(&self, path: &str) -> Result<()>;

    /// Copy `src` to `dst`, leaving `src` intact
    fn cp(&self, src: &str, dst: &str) -> Result<()> {
        let src = path::normalize(src)?;
        let dst = path::normalize(dst)?;

        let info = self.info(&src)?;
        let mut reader = self.open(&src)?;

        let mut options = CreateOptions::new().metadata(info.metadata);
        options.content_type = info.content_type;

        let mut writer = self.create(&dst, &options)?;
        io::copy(&mut reader, &mut writer)?;
        writer.close()?;
        Ok(())
    }

    /// Move `src` to `dst`; afterwards only `dst` exists
    fn mv(&self, src: &str, dst: &str) -> Result<()> {
        let src = path::normalize(src)?;
        let dst = path::normalize(dst)?;
        if src == dst {
            self.info(&src)?;
            return Ok(());
        }

        self.cp(&src, &dst)?;
        self.rm(&src)
    }
}

impl<B: Bucket + ?Sized> Bucket for Box<B> {
    fn ls(&self, pattern: &str) -> Result<Entries<'_>> {
        (**self).ls(pattern)
    }

    fn info(&self, path: &str) -> Result<FileInfo> {
        (**self).info(path)
    }

    fn open(&self, path: &str) -> Result<Reader> {
        (**self).open(path)
    }

    fn create(&self, path: &str, options: &CreateOptions) -> Result<AtomicWriter> {
        (**self).create(path, options)
    }

    fn rm(&self, path: &str) -> Result<()> {
        (**self).rm(path)
    }

    fn cp(&self, src: &str, dst: &str) -> Result<()> {
        (**self).cp(src, dst)
    }

    fn mv(&self, src: &str, dst: &str) -> Result<()> {
        (**self).mv(src, dst)
    }
}

impl<B: Bucket + ?Sized> Bucket for Arc<B> {
    fn ls(&self, pattern: &str) -> Result<Entries<'_>> {
        (**self).ls(pattern)
    }

    fn info(&self, path: &str) -> Result<FileInfo> {
        (**self).info(path)
    }

    fn open(&self, path: &str) -> Result<Reader> {
        (**self).open(path)
    }

    fn create(&self, path: &str, options: &CreateOptions) -> Result<AtomicWriter> {
        (**self).create(path, options)
    }

    fn rm(&self, path: &str) -> Result<()> {
        (**self).rm(path)
    }

    fn cp(&self, src: &str, dst: &str) -> Result<()> {
        (**self).cp(src, dst)
    }

    fn mv(&self, src: &str, dst: &str) -> Result<()> {
        (**self).mv(src, dst)
    }
}

/// Scoped helpers available on every bucket
pub trait BucketExt: Bucket {
    /// Create a writer, hand it to `f`, then commit.
    ///
    /// If `f` fails the write is aborted and `f`'s error is returned.
    fn write_with<T, F>(&self, path: &str, options: &CreateOptions, f: F) -> Result<T>
    where
        F: FnOnce(&mut AtomicWriter) -> Result<T>,
    {
        let mut writer = self.create(path, options)?;
        match f(&mut writer) {
            Ok(value) => {
                writer.close()?;
                Ok(value)
            }
            Err(err) => {
                writer.abort();
                Err(err)
            }
        }
    }

    /// Open a reader, hand it to `f`, then release it
    fn read_with<T, F>(&self, path: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Reader) -> Result<T>,
    {
        let mut reader = self.open(path)?;
        f(&mut reader)
    }

    /// Read a whole blob into memory
    fn read_bytes(&self, path: &str) -> Result<Vec<u8>> {
        self.read_with(path, |reader| {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf)?;
            Ok(buf)
        })
    }

    /// Atomically replace a blob with `data`
    fn write_bytes(&self, path: &str, data: &[u8], options: &CreateOptions) -> Result<()> {
        self.write_with(path, options, |writer| {
            writer.write_all(data)?;
            Ok(())
        })
    }

    /// Collect a listing, sorted
    fn list(&self, pattern: &str) -> Result<Vec<String>> {
        let mut keys = self.ls(pattern)?.collect::<Result<Vec<_>>>()?;
        keys.sort();
        Ok(keys)
    }
}

impl<B: Bucket + ?Sized> BucketExt for B {}
