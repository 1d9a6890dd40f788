//! S3 bucket configuration

use crate::path;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Settings for one S3 bucket, usually parsed from an `s3://` URL:
///
/// ```text
/// s3://my-bucket/optional/prefix?region=eu-west-2&acl=private&sse=AES256
/// ```
///
/// Unrecognized query parameters are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Config {
    /// Bucket name
    pub bucket: String,
    /// Key prefix every blob is stored under
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible stores (MinIO, localstack)
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Default server-side encryption mode
    #[serde(default)]
    pub sse: Option<String>,
    /// Default canned ACL
    #[serde(default)]
    pub acl: Option<String>,
    /// Default storage class
    #[serde(default)]
    pub storage_class: Option<String>,
    /// Default content encoding
    #[serde(default)]
    pub content_encoding: Option<String>,
}

impl S3Config {
    pub fn new(bucket: impl Into<String>) -> Self {
        S3Config {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    pub fn from_url(url: &Url) -> Result<Self> {
        let bucket = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::Config(format!("missing bucket name in {url}")))?;

        let mut config = S3Config::new(bucket);

        let prefix = url.path().trim_matches('/');
        if !prefix.is_empty() {
            config.prefix = Some(path::normalize(prefix)?);
        }

        for (key, value) in url.query_pairs() {
            let value = Some(value.into_owned());
            match key.as_ref() {
                "region" => config.region = value,
                "endpoint" => config.endpoint = value,
                "access_key_id" => config.access_key_id = value,
                "secret_access_key" => config.secret_access_key = value,
                "sse" | "server_side_encryption" => config.sse = value,
                "acl" => config.acl = value,
                "storage_class" => config.storage_class = value,
                "content_encoding" => config.content_encoding = value,
                _ => {}
            }
        }

        Ok(config)
    }
}
