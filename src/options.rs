//! Options accepted by `Bucket::create`
//!
//! The same options value can be handed to any driver. A driver applies the
//! fields it understands and ignores the rest.

use crate::path::Metadata;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// MIME type recorded with the blob
    pub content_type: Option<String>,
    /// User metadata; keys are stored lower-cased
    pub metadata: Metadata,
    /// Content encoding, e.g. `gzip`
    pub content_encoding: Option<String>,
    /// Object-store storage class, e.g. `STANDARD_IA`
    pub storage_class: Option<String>,
    /// Canned access-control list, e.g. `private`
    pub acl: Option<String>,
    /// Server-side encryption mode, e.g. `AES256`
    pub server_side_encryption: Option<String>,
}

impl CreateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_type(mut self, val: impl Into<String>) -> Self {
        self.content_type = Some(val.into());
        self
    }

    pub fn meta(mut self, key: impl Into<String>, val: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), val.into());
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn content_encoding(mut self, val: impl Into<String>) -> Self {
        self.content_encoding = Some(val.into());
        self
    }

    pub fn storage_class(mut self, val: impl Into<String>) -> Self {
        self.storage_class = Some(val.into());
        self
    }

    pub fn acl(mut self, val: impl Into<String>) -> Self {
        self.acl = Some(val.into());
        self
    }

    pub fn server_side_encryption(mut self, val: impl Into<String>) -> Self {
        self.server_side_encryption = Some(val.into());
        self
    }
}
