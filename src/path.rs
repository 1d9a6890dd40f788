//! Blob path rules
//!
//! Every driver addresses blobs by a normalized, bucket-relative key: slash
//! separated, no leading `/`, no `.` or `..` segments. Keys are normalized here
//! once so no driver has to re-derive its own traversal checks.

use crate::{Error, Result};
use std::collections::BTreeMap;

/// Key/value metadata attached to a blob
pub type Metadata = BTreeMap<String, String>;

/// Normalize a caller-supplied path into a bucket-relative key.
///
/// Leading slashes, empty segments and `.` segments are dropped, `..` climbs one
/// segment. Fails with [`Error::InvalidPath`] if `..` would climb above the
/// bucket root or nothing is left after normalization.
pub fn normalize(raw: &str) -> Result<String> {
    if raw.contains('\0') {
        return Err(Error::InvalidPath(raw.to_string()));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(Error::InvalidPath(raw.to_string()));
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(Error::InvalidPath(raw.to_string()));
    }
    Ok(segments.join("/"))
}

/// Remove a known root prefix from a native location.
///
/// Returns the input unchanged when it does not start with `root_prefix`.
pub fn strip_prefix(absolute: &str, root_prefix: &str) -> String {
    absolute
        .strip_prefix(root_prefix)
        .unwrap_or(absolute)
        .to_string()
}

/// Turn a root location into the prefix its native entries start with
/// (`"/data"` and `"/data/"` both become `"/data/"`).
pub fn dir_prefix(root: &str) -> String {
    if root.is_empty() {
        return String::new();
    }
    format!("{}/", root.trim_end_matches('/'))
}

/// Normalize metadata keys to lower case, the way object stores report them back
pub fn norm_meta(meta: &Metadata) -> Metadata {
    meta.iter()
        .map(|(k, v)| (k.to_lowercase(), v.clone()))
        .collect()
}
