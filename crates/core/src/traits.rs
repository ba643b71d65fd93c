//! Trait and record definitions
//!
//! [`OssApi`] is the capability ossfs consumes from an object-storage client.
//! [`FilesystemAdapter`] is the filesystem contract ossfs offers to its
//! callers. Keeping both here lets the facade be exercised against a test
//! double without any network SDK in the dependency graph.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use crate::error::{FsResult, Result};
use crate::options::{ObjectAcl, ObjectOptions, Visibility, WriteConfig};
use crate::urls::Expiration;

/// Number of keys requested per listing call
pub const LIST_PAGE_SIZE: u32 = 1000;

/// Kind of a listing entry or metadata record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// One result of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,

    /// Logical path, never ending in the delimiter
    pub path: String,

    /// Seconds since the epoch, 0 when unknown
    pub timestamp: i64,

    /// Size in bytes (files only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl ObjectEntry {
    /// Create a file entry
    pub fn file(path: impl Into<String>, timestamp: i64, size: u64) -> Self {
        Self {
            kind: EntryKind::File,
            path: path.into(),
            timestamp,
            size: Some(size),
        }
    }

    /// Create a directory entry
    pub fn dir(path: impl Into<String>, timestamp: i64) -> Self {
        Self {
            kind: EntryKind::Dir,
            path: path.into(),
            timestamp,
            size: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// Normalized file metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(rename = "type")]
    pub kind: EntryKind,

    pub path: String,

    pub dirname: String,

    pub basename: String,

    pub filename: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// User metadata attached to the object
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// Buffered file contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContents {
    pub path: String,
    pub contents: Vec<u8>,
}

/// Readable file contents
pub struct FileStream {
    pub path: String,
    pub stream: Box<dyn AsyncRead + Send + Unpin>,
}

impl std::fmt::Debug for FileStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStream")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Result of a visibility change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityRecord {
    pub path: String,
    pub visibility: Visibility,
}

/// HTTP method a signed URL is issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
}

/// Parameters of a single listing call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListObjectsRequest {
    /// Delimiter for grouping (usually "/")
    pub delimiter: String,

    /// Prefix to filter by
    pub prefix: String,

    /// Maximum number of keys and prefixes to return
    pub max_keys: u32,

    /// List keys strictly after this one
    pub marker: String,
}

/// An object as reported by a listing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    /// Last-modified time in the backend's own format
    pub last_modified: Option<String>,
}

/// Result of a single listing call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListing {
    pub objects: Vec<ObjectSummary>,

    /// Common prefixes, each ending in the delimiter
    pub prefixes: Vec<String>,

    /// Whether more keys exist beyond this page
    pub truncated: bool,

    pub next_marker: Option<String>,
}

/// Operations consumed from an object-storage client
///
/// Implemented by the OSS client and by the in-memory store; mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OssApi: Send + Sync {
    /// Upload an object, replacing any existing one
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        options: &ObjectOptions,
    ) -> Result<()>;

    /// Download an object's content
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// Delete keys in one batch; any per-key failure fails the whole call
    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<()>;

    async fn copy_object(
        &self,
        from_bucket: &str,
        from_key: &str,
        to_bucket: &str,
        to_key: &str,
    ) -> Result<()>;

    async fn does_object_exist(&self, bucket: &str, key: &str) -> Result<bool>;

    /// Object metadata as lowercase header names and values
    async fn get_object_meta(&self, bucket: &str, key: &str) -> Result<BTreeMap<String, String>>;

    async fn list_objects(&self, bucket: &str, request: &ListObjectsRequest)
    -> Result<ObjectListing>;

    async fn put_object_acl(&self, bucket: &str, key: &str, acl: ObjectAcl) -> Result<()>;

    async fn get_object_acl(&self, bucket: &str, key: &str) -> Result<ObjectAcl>;

    /// Create a zero-byte directory marker at `key` followed by the delimiter
    async fn create_object_dir(
        &self,
        bucket: &str,
        key: &str,
        options: &ObjectOptions,
    ) -> Result<()>;

    /// Upload the file at `local` as an object
    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        local: &Path,
        options: &ObjectOptions,
    ) -> Result<()>;

    /// Issue a URL that grants `method` on the object for `ttl_secs` seconds
    async fn sign_url(
        &self,
        bucket: &str,
        key: &str,
        ttl_secs: u64,
        method: HttpMethod,
        options: &ObjectOptions,
    ) -> Result<String>;
}

/// Filesystem contract offered to callers
///
/// Every path is logical. Failures are reported as
/// [`OperationFailed`](crate::error::OperationFailed) and carry no backend
/// detail.
#[async_trait]
pub trait FilesystemAdapter: Send + Sync {
    /// Whether an object exists at `path`; any failure reads as `false`
    async fn has(&self, path: &str) -> bool;

    async fn read(&self, path: &str) -> FsResult<FileContents>;

    async fn read_stream(&self, path: &str) -> FsResult<FileStream>;

    /// Write a file, replacing any existing content
    async fn write(&self, path: &str, contents: Vec<u8>, config: &WriteConfig)
    -> FsResult<Metadata>;

    async fn update(
        &self,
        path: &str,
        contents: Vec<u8>,
        config: &WriteConfig,
    ) -> FsResult<Metadata>;

    async fn write_stream(
        &self,
        path: &str,
        stream: Box<dyn AsyncRead + Send + Unpin>,
        config: &WriteConfig,
    ) -> FsResult<Metadata>;

    async fn update_stream(
        &self,
        path: &str,
        stream: Box<dyn AsyncRead + Send + Unpin>,
        config: &WriteConfig,
    ) -> FsResult<Metadata>;

    /// Upload a local file to `path`
    async fn write_file(&self, path: &str, local: &Path, config: &WriteConfig)
    -> FsResult<Metadata>;

    async fn copy(&self, path: &str, new_path: &str) -> FsResult<()>;

    /// Copy then delete the source
    ///
    /// When the delete fails after a successful copy the rename is reported
    /// as failed and both objects remain.
    async fn rename(&self, path: &str, new_path: &str) -> FsResult<()>;

    async fn delete(&self, path: &str) -> FsResult<()>;

    /// Delete everything under `dirname` in one batch
    async fn delete_dir(&self, dirname: &str) -> FsResult<()>;

    async fn create_dir(&self, dirname: &str, config: &WriteConfig) -> FsResult<ObjectEntry>;

    async fn set_visibility(
        &self,
        path: &str,
        visibility: Visibility,
    ) -> FsResult<VisibilityRecord>;

    async fn get_visibility(&self, path: &str) -> FsResult<Visibility>;

    async fn list_contents(&self, directory: &str, recursive: bool)
    -> FsResult<Vec<ObjectEntry>>;

    async fn get_metadata(&self, path: &str) -> FsResult<Metadata>;

    async fn get_size(&self, path: &str) -> FsResult<Metadata>;

    async fn get_mimetype(&self, path: &str) -> FsResult<Metadata>;

    async fn get_timestamp(&self, path: &str) -> FsResult<Metadata>;

    /// Public URL of `path`
    fn url(&self, path: &str) -> FsResult<String>;

    /// Signed URL of `path`, valid until `expiration`
    async fn temporary_url(&self, path: &str, expiration: Expiration) -> FsResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_entry_file() {
        let entry = ObjectEntry::file("d/f.txt", 1_700_000_000, 10);
        assert_eq!(entry.kind, EntryKind::File);
        assert_eq!(entry.size, Some(10));
        assert!(!entry.is_dir());
    }

    #[test]
    fn test_object_entry_dir() {
        let entry = ObjectEntry::dir("d/sub", 0);
        assert!(entry.is_dir());
        assert!(entry.size.is_none());
    }

    #[test]
    fn test_object_entry_serialization() {
        let json = serde_json::to_value(ObjectEntry::dir("d/sub", 0)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "dir", "path": "d/sub", "timestamp": 0}));
    }
}
