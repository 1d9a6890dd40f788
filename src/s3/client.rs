//! [`S3Client`] backed by the `object_store` crate
//!
//! `object_store` is async; each call is driven to completion on a private
//! current-thread runtime so the bucket API stays blocking. Do not call these
//! methods from inside another tokio runtime.
//!
//! Blob keys are used as object locations verbatim (`Path::parse`), never
//! percent-encoded, so listed keys are the keys that were written.

use super::{ListPage, ObjectHead, PutObjectRequest, S3Client, S3Config, S3Error, S3Result};
use crate::path::Metadata;
use crate::{Error, Result};
use futures::{StreamExt, TryStreamExt};
use object_store::aws::{AmazonS3Builder, AmazonS3ConfigKey};
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, GetOptions, ObjectStore, PutOptions, PutPayload};
use std::io::{Read, Write};
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// Keys fetched per `list_objects` page
const PAGE_SIZE: usize = 1000;

impl From<object_store::Error> for S3Error {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { .. } => S3Error::NoSuchKey,
            other => S3Error::Other(Box::new(other)),
        }
    }
}

pub struct ObjectStoreClient {
    store: Arc<dyn ObjectStore>,
    runtime: Runtime,
    page_size: usize,
}

impl ObjectStoreClient {
    /// Build an Amazon S3 client; settings not given in `config` fall back to
    /// the `AWS_*` environment variables
    pub fn new(config: &S3Config) -> Result<Self> {
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(&config.bucket);

        if let Some(region) = &config.region {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = &config.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }
        if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            builder = builder
                .with_access_key_id(key_id)
                .with_secret_access_key(secret);
        }
        if let Some(sse) = &config.sse {
            let key = "aws_server_side_encryption"
                .parse::<AmazonS3ConfigKey>()
                .map_err(|err| Error::Config(format!("server-side encryption: {err}")))?;
            builder = builder.with_config(key, sse);
        }

        let store = builder
            .build()
            .map_err(|err| Error::Config(format!("invalid S3 settings: {err}")))?;
        Self::with_store(Arc::new(store))
    }

    /// Wrap an existing store
    pub fn with_store(store: Arc<dyn ObjectStore>) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(ObjectStoreClient {
            store,
            runtime,
            page_size: PAGE_SIZE,
        })
    }

    /// Keys fetched per `list_objects` page
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

/// Object location for a key, taken verbatim
fn location(key: &str) -> S3Result<ObjectPath> {
    ObjectPath::parse(key).map_err(other)
}

fn other(err: impl std::error::Error + Send + Sync + 'static) -> S3Error {
    S3Error::Other(Box::new(err))
}

impl S3Client for ObjectStoreClient {
    fn put_object(&self, mut request: PutObjectRequest) -> S3Result<()> {
        let mut body = Vec::with_capacity(request.size as usize);
        request.body.read_to_end(&mut body).map_err(other)?;

        let options = &request.options;
        let mut attributes = Attributes::new();
        if let Some(content_type) = &options.content_type {
            attributes.insert(Attribute::ContentType, content_type.clone().into());
        }
        if let Some(encoding) = &options.content_encoding {
            attributes.insert(Attribute::ContentEncoding, encoding.clone().into());
        }
        if let Some(storage_class) = &options.storage_class {
            attributes.insert(Attribute::StorageClass, storage_class.clone().into());
        }
        for (key, value) in &options.metadata {
            attributes.insert(Attribute::Metadata(key.clone().into()), value.clone().into());
        }
        if options.acl.is_some() {
            debug!(key = %request.key, "canned ACLs are not supported by this client, ignoring");
        }

        let put = PutOptions {
            attributes,
            ..Default::default()
        };
        let location = location(&request.key)?;
        self.runtime
            .block_on(self.store.put_opts(&location, PutPayload::from(body), put))?;
        Ok(())
    }

    fn get_object(&self, key: &str, target: &mut dyn Write) -> S3Result<()> {
        let location = location(key)?;
        self.runtime.block_on(async {
            let mut stream = self.store.get(&location).await?.into_stream();
            while let Some(chunk) = stream.next().await {
                target.write_all(&chunk?).map_err(other)?;
            }
            Ok::<(), S3Error>(())
        })
    }

    fn head_object(&self, key: &str) -> S3Result<ObjectHead> {
        let location = location(key)?;
        let options = GetOptions {
            head: true,
            ..Default::default()
        };
        let result = self
            .runtime
            .block_on(self.store.get_opts(&location, options))?;

        let mut content_type = None;
        let mut metadata = Metadata::new();
        for (attribute, value) in result.attributes.iter() {
            match attribute {
                Attribute::ContentType => content_type = Some(value.to_string()),
                Attribute::Metadata(name) => {
                    metadata.insert(name.to_string(), value.to_string());
                }
                _ => {}
            }
        }

        Ok(ObjectHead {
            size: result.meta.size,
            last_modified: result.meta.last_modified,
            content_type,
            metadata,
        })
    }

    fn delete_object(&self, key: &str) -> S3Result<()> {
        let location = location(key)?;
        self.runtime.block_on(self.store.delete(&location))?;
        Ok(())
    }

    fn copy_object(&self, src_key: &str, dst_key: &str) -> S3Result<()> {
        let from = location(src_key)?;
        let to = location(dst_key)?;
        self.runtime.block_on(self.store.copy(&from, &to))?;
        Ok(())
    }

    fn list_objects(
        &self,
        prefix: Option<&str>,
        continuation: Option<&str>,
    ) -> S3Result<ListPage> {
        let prefix = prefix
            .map(|p| p.trim_end_matches('/'))
            .filter(|p| !p.is_empty())
            .map(location)
            .transpose()?;
        let offset = continuation.map(location).transpose()?;

        let keys: Vec<String> = self.runtime.block_on(async {
            let stream = match &offset {
                Some(offset) => self.store.list_with_offset(prefix.as_ref(), offset),
                None => self.store.list(prefix.as_ref()),
            };
            stream
                .take(self.page_size)
                .map_ok(|meta| meta.location.to_string())
                .try_collect()
                .await
        })?;

        let next_token = if keys.len() == self.page_size {
            keys.last().cloned()
        } else {
            None
        };
        Ok(ListPage { keys, next_token })
    }
}
