//! # bucketfs
//!
//! A uniform bucket abstraction over heterogeneous blob storage.
//!
//! Application code lists, reads, writes, copies, moves and deletes named blobs
//! through one [`Bucket`] interface, whatever backs it: a local directory, an
//! S3-compatible object store, or an in-memory map.
//!
//! ## Core Concepts
//!
//! - **Buckets**: handles bound to one storage root, obtained from a
//!   connection URL via the [`Registry`]
//! - **Blob paths**: normalized, bucket-relative keys; traversal above the
//!   root is rejected
//! - **Atomic writes**: every write goes through an [`AtomicWriter`] that
//!   stages content and commits it in one step on close
//!
//! ## Example
//!
//! ```ignore
//! use bucketfs::{BucketExt, CreateOptions};
//!
//! let bucket = bucketfs::resolve("file:///var/data")?;
//! bucket.write_bytes("reports/today.csv", b"a,b\n1,2\n", &CreateOptions::new())?;
//! for key in bucket.ls("reports/*.csv")? {
//!     println!("{}", key?);
//! }
//! ```

pub mod bucket;
pub mod fs;
pub mod glob;
pub mod info;
pub mod mem;
pub mod options;
pub mod path;
pub mod registry;
pub mod s3;
pub mod writer;

mod error;

pub use bucket::{Bucket, BucketExt, Entries, Reader};
pub use error::{BackendError, Error, Result};
pub use fs::FsBucket;
pub use glob::{Pattern, DEFAULT_PATTERN};
pub use info::FileInfo;
pub use mem::InMemBucket;
pub use options::CreateOptions;
pub use path::Metadata;
pub use registry::{register, resolve, Registry};
#[cfg(feature = "s3")]
pub use s3::ObjectStoreClient;
pub use s3::{S3Bucket, S3Client, S3Config, S3Error};
pub use writer::{AtomicWriter, Staged, WriterState};
