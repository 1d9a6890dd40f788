//! Scheme registry
//!
//! Maps URL schemes to bucket constructors so a connection string such as
//! `file:///var/data` or `s3://assets?region=eu-west-2` resolves to a live
//! bucket. The process-wide registry starts out with the built-in drivers;
//! further drivers can be added at startup with [`register`].

use crate::bucket::Bucket;
use crate::fs::FsBucket;
use crate::mem::InMemBucket;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Builds a bucket from a parsed connection URL
pub type Constructor = Arc<dyn Fn(&Url) -> Result<Box<dyn Bucket>> + Send + Sync>;

/// Scheme → constructor table
#[derive(Default)]
pub struct Registry {
    entries: RwLock<HashMap<String, Constructor>>,
}

impl Registry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in drivers: `mem`, `file` and, with the `s3`
    /// feature, `s3`
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register("mem", |url| Ok(Box::new(InMemBucket::from_url(url)?)));
        registry.register("file", |url| Ok(Box::new(FsBucket::from_url(url)?)));
        #[cfg(feature = "s3")]
        registry.register("s3", |url| Ok(Box::new(crate::s3::S3Bucket::from_url(url)?)));
        registry
    }

    /// Register a constructor; a later registration for the same scheme wins
    pub fn register<F>(&self, scheme: &str, constructor: F)
    where
        F: Fn(&Url) -> Result<Box<dyn Bucket>> + Send + Sync + 'static,
    {
        let scheme = scheme.to_ascii_lowercase();
        debug!(scheme = %scheme, "bucket driver registered");
        self.entries.write().insert(scheme, Arc::new(constructor));
    }

    /// Parse `url` and hand it to the constructor registered for its scheme
    pub fn resolve(&self, url: &str) -> Result<Box<dyn Bucket>> {
        let url = Url::parse(url)?;
        let constructor = self
            .entries
            .read()
            .get(url.scheme())
            .cloned()
            .ok_or_else(|| Error::UnknownScheme(url.scheme().to_string()))?;

        debug!(scheme = %url.scheme(), "resolving bucket");
        // lock released: constructors may register further schemes
        constructor(&url)
    }

    pub fn is_registered(&self, scheme: &str) -> bool {
        self.entries
            .read()
            .contains_key(&scheme.to_ascii_lowercase())
    }

    /// Registered schemes, sorted
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.entries.read().keys().cloned().collect();
        schemes.sort();
        schemes
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("schemes", &self.schemes())
            .finish()
    }
}

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::with_defaults);

/// The process-wide registry
pub fn global() -> &'static Registry {
    &GLOBAL
}

/// Register a driver in the process-wide registry
pub fn register<F>(scheme: &str, constructor: F)
where
    F: Fn(&Url) -> Result<Box<dyn Bucket>> + Send + Sync + 'static,
{
    global().register(scheme, constructor);
}

/// Resolve a connection URL through the process-wide registry
pub fn resolve(url: &str) -> Result<Box<dyn Bucket>> {
    global().resolve(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::BucketExt;
    use crate::options::CreateOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    #[test]
    fn test_unknown_scheme_skips_constructors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Registry::new();
        let counter = calls.clone();
        registry.register("mem", move |_url| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(InMemBucket::new()))
        });

        assert!(matches!(
            registry.resolve("nosuch://host"),
            Err(Error::UnknownScheme(ref s)) if s == "nosuch"
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = Registry::new();
        registry.register("x", |_url| Err(Error::Config("first".into())));
        registry.register("X", |_url| Ok(Box::new(InMemBucket::new())));

        assert!(registry.resolve("x://anything").is_ok());
        assert_eq!(registry.schemes(), vec!["x"]);
    }

    #[test]
    fn test_constructor_sees_url_parts() {
        let registry = Registry::new();
        registry.register("inspect", |url| {
            assert_eq!(url.host_str(), Some("host"));
            assert_eq!(url.path(), "/some/path");
            let region = url
                .query_pairs()
                .find(|(k, _)| k == "region")
                .map(|(_, v)| v.into_owned());
            assert_eq!(region.as_deref(), Some("eu-west-2"));
            Ok(Box::new(InMemBucket::new()))
        });

        registry
            .resolve("inspect://host/some/path?region=eu-west-2")
            .unwrap();
    }

    #[test]
    fn test_invalid_url() {
        let registry = Registry::with_defaults();
        assert!(matches!(
            registry.resolve("not a url"),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_defaults_resolve_builtin_drivers() {
        let registry = Registry::with_defaults();
        assert!(registry.is_registered("mem"));
        assert!(registry.is_registered("file"));

        let mem = registry.resolve("mem://").unwrap();
        mem.write_bytes("a.txt", b"x", &CreateOptions::new()).unwrap();
        assert_eq!(mem.read_bytes("a.txt").unwrap(), b"x");

        let dir = tempdir().unwrap();
        let url = Url::from_directory_path(dir.path()).unwrap();
        let fs = registry.resolve(url.as_str()).unwrap();
        fs.write_bytes("b/c.txt", b"y", &CreateOptions::new()).unwrap();
        assert_eq!(std::fs::read(dir.path().join("b/c.txt")).unwrap(), b"y");
    }

    #[test]
    fn test_global_registry() {
        register("test-global", |_url| Ok(Box::new(InMemBucket::new())));
        assert!(global().is_registered("test-global"));
        assert!(resolve("test-global://").is_ok());
    }
}
