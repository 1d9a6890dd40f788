//! Object-store bucket
//!
//! [`S3Bucket`] implements the bucket contract on top of an [`S3Client`], the
//! seam to the actual object-store API. Writes are staged to a local temp
//! file and sent with one full-object PUT on commit, so readers only ever see
//! the old object or the complete new one.
//!
//! With the `s3` feature, [`ObjectStoreClient`] provides a client backed by the
//! `object_store` crate and the `s3` scheme is registered in the default
//! registry.

mod bucket;
#[cfg(feature = "s3")]
mod client;
mod config;

pub use bucket::S3Bucket;
#[cfg(feature = "s3")]
pub use client::ObjectStoreClient;
pub use config::S3Config;

use crate::error::BackendError;
use crate::options::CreateOptions;
use crate::path::Metadata;
use chrono::{DateTime, Utc};
use std::io::{Read, Write};
use thiserror::Error;

/// Result type for [`S3Client`] calls
pub type S3Result<T> = std::result::Result<T, S3Error>;

/// Failures reported by an [`S3Client`]
#[derive(Error, Debug)]
pub enum S3Error {
    #[error("no such key")]
    NoSuchKey,

    #[error("no such bucket")]
    NoSuchBucket,

    #[error(transparent)]
    Other(#[from] BackendError),
}

/// Object attributes returned by a HEAD request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectHead {
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub content_type: Option<String>,
    pub metadata: Metadata,
}

/// One page of a key listing
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListPage {
    pub keys: Vec<String>,
    /// Token for the next page; `None` or empty when the listing is complete
    pub next_token: Option<String>,
}

/// A full-object upload
pub struct PutObjectRequest {
    pub key: String,
    pub body: Box<dyn Read + Send>,
    pub size: u64,
    /// Resolved options: call options with bucket defaults filled in
    pub options: CreateOptions,
}

/// Object-store API calls used by [`S3Bucket`].
///
/// A client is bound to one bucket. Missing objects must be reported as
/// [`S3Error::NoSuchKey`] (or [`S3Error::NoSuchBucket`]) so the driver can
/// translate them to [`crate::Error::FileNotFound`].
pub trait S3Client: Send + Sync {
    fn put_object(&self, request: PutObjectRequest) -> S3Result<()>;

    /// Download the whole object into `target`
    fn get_object(&self, key: &str, target: &mut dyn Write) -> S3Result<()>;

    fn head_object(&self, key: &str) -> S3Result<ObjectHead>;

    fn delete_object(&self, key: &str) -> S3Result<()>;

    /// Server-side copy within the bucket
    fn copy_object(&self, src_key: &str, dst_key: &str) -> S3Result<()>;

    fn list_objects(&self, prefix: Option<&str>, continuation: Option<&str>)
        -> S3Result<ListPage>;
}
