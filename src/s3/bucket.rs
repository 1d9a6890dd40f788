use super::{PutObjectRequest, S3Client, S3Config, S3Error};
use crate::bucket::{Bucket, Entries, Reader};
use crate::glob::Pattern;
use crate::info::FileInfo;
use crate::options::CreateOptions;
use crate::path;
use crate::writer::{AtomicWriter, Staged};
use crate::{Error, Result};
use std::fmt;
use std::io::{Seek, SeekFrom};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::debug;
#[cfg(feature = "s3")]
use url::Url;

/// Bucket stored in an S3-compatible object store
#[derive(Clone)]
pub struct S3Bucket {
    config: S3Config,
    client: Arc<dyn S3Client>,
}

impl S3Bucket {
    pub fn new(config: S3Config, client: Arc<dyn S3Client>) -> Self {
        S3Bucket { config, client }
    }

    /// Construct from an `s3://bucket[/prefix][?options]` URL using the
    /// `object_store` backed client
    #[cfg(feature = "s3")]
    pub fn from_url(url: &Url) -> Result<Self> {
        let config = S3Config::from_url(url)?;
        let client = super::ObjectStoreClient::new(&config)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn name(&self) -> &str {
        &self.config.bucket
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    pub fn acl(&self) -> Option<&str> {
        self.config.acl.as_deref()
    }

    pub fn sse(&self) -> Option<&str> {
        self.config.sse.as_deref()
    }

    pub fn storage_class(&self) -> Option<&str> {
        self.config.storage_class.as_deref()
    }

    /// Object key for a bucket-relative path
    fn object_key(&self, key: &str) -> String {
        match &self.config.prefix {
            Some(prefix) => format!("{prefix}/{key}"),
            None => key.to_string(),
        }
    }

    /// Call options with the bucket's defaults filled in
    fn resolve_options(&self, options: &CreateOptions) -> CreateOptions {
        let mut resolved = options.clone();
        resolved.metadata = path::norm_meta(&options.metadata);
        resolved.acl = resolved.acl.or_else(|| self.config.acl.clone());
        resolved.server_side_encryption = resolved
            .server_side_encryption
            .or_else(|| self.config.sse.clone());
        resolved.storage_class = resolved
            .storage_class
            .or_else(|| self.config.storage_class.clone());
        resolved.content_encoding = resolved
            .content_encoding
            .or_else(|| self.config.content_encoding.clone());
        resolved
    }
}

impl fmt::Debug for S3Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Bucket")
            .field("bucket", &self.config.bucket)
            .field("prefix", &self.config.prefix)
            .finish()
    }
}

/// Translate a client failure for `key`; a missing object or bucket is a
/// missing blob, anything else passes through
fn translate(err: S3Error, key: &str) -> Error {
    match err {
        S3Error::NoSuchKey | S3Error::NoSuchBucket => Error::FileNotFound(key.to_string()),
        S3Error::Other(source) => Error::Backend(source),
    }
}

/// Lazily pages through `list_objects`
struct Listing<'a> {
    bucket: &'a S3Bucket,
    pattern: Pattern,
    list_prefix: Option<String>,
    strip: String,
    page: std::vec::IntoIter<String>,
    next_token: Option<String>,
    done: bool,
}

impl Listing<'_> {
    fn fetch(&mut self) -> Result<()> {
        let page = self
            .bucket
            .client
            .list_objects(self.list_prefix.as_deref(), self.next_token.as_deref())
            .map_err(|err| translate(err, self.bucket.name()))?;

        self.page = page.keys.into_iter();
        self.next_token = page.next_token.filter(|token| !token.is_empty());
        self.done = self.next_token.is_none();
        Ok(())
    }
}

impl Iterator for Listing<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(object_key) = self.page.next() {
                // trailing slash marks a directory placeholder
                if object_key.ends_with('/') {
                    continue;
                }
                let key = path::strip_prefix(&object_key, &self.strip);
                if self.pattern.matches(&key) {
                    return Some(Ok(key));
                }
                continue;
            }

            if self.done {
                return None;
            }
            if let Err(err) = self.fetch() {
                self.done = true;
                return Some(Err(err));
            }
        }
    }
}

impl Bucket for S3Bucket {
    fn ls(&self, pattern: &str) -> Result<Entries<'_>> {
        let list_prefix = self.config.prefix.as_deref().map(path::dir_prefix);
        Ok(Box::new(Listing {
            bucket: self,
            pattern: Pattern::new(pattern)?,
            strip: list_prefix.clone().unwrap_or_default(),
            list_prefix,
            page: Vec::new().into_iter(),
            next_token: None,
            done: false,
        }))
    }

    fn info(&self, path: &str) -> Result<FileInfo> {
        let key = path::normalize(path)?;
        let head = self
            .client
            .head_object(&self.object_key(&key))
            .map_err(|err| translate(err, &key))?;

        Ok(FileInfo::new(key, head.size, head.last_modified)
            .with_content_type(head.content_type)
            .with_metadata(path::norm_meta(&head.metadata)))
    }

    fn open(&self, path: &str) -> Result<Reader> {
        let key = path::normalize(path)?;
        let mut temp = NamedTempFile::new()?;
        self.client
            .get_object(&self.object_key(&key), temp.as_file_mut())
            .map_err(|err| translate(err, &key))?;

        temp.as_file_mut().seek(SeekFrom::Start(0))?;
        // the temp file is deleted when the reader is dropped
        Ok(Box::new(temp))
    }

    fn create(&self, path: &str, options: &CreateOptions) -> Result<AtomicWriter> {
        let key = path::normalize(path)?;
        let object_key = self.object_key(&key);
        let options = self.resolve_options(options);
        let client = self.client.clone();
        let blob = key.clone();

        AtomicWriter::temp_file(
            key,
            Box::new(move |staged: Staged| -> Result<()> {
                let request = PutObjectRequest {
                    key: object_key,
                    size: staged.len()?,
                    body: staged.reopen()?,
                    options,
                };
                client
                    .put_object(request)
                    .map_err(|err| translate(err, &blob))
            }),
        )
    }

    fn rm(&self, path: &str) -> Result<()> {
        let key = path::normalize(path)?;
        match self.client.delete_object(&self.object_key(&key)) {
            Ok(()) => {
                debug!(bucket = %self.name(), path = %key, "object removed");
                Ok(())
            }
            Err(S3Error::NoSuchKey) | Err(S3Error::NoSuchBucket) => {
                debug!(bucket = %self.name(), path = %key, "object already absent");
                Ok(())
            }
            Err(S3Error::Other(source)) => Err(Error::Backend(source)),
        }
    }

    fn cp(&self, src: &str, dst: &str) -> Result<()> {
        let src = path::normalize(src)?;
        let dst = path::normalize(dst)?;
        self.client
            .copy_object(&self.object_key(&src), &self.object_key(&dst))
            .map_err(|err| translate(err, &src))
    }
}
