//! Object storage facade
//!
//! [`OssAdapter`] implements [`FilesystemAdapter`] on top of an injected
//! [`OssApi`] client. Each operation translates logical paths to keys, makes
//! one backend call (two for rename, a listing plus a batch for directory
//! deletion) and collapses any backend error into [`OperationFailed`].

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{FsResult, OperationFailed, collapse};
use crate::normalize::{RawResponse, normalize_response, response_from_headers};
use crate::options::{ObjectOptions, Visibility, WriteConfig};
use crate::path::{DELIMITER, PathPrefixer};
use crate::traits::{
    FileContents, FileStream, FilesystemAdapter, HttpMethod, Metadata, ObjectEntry, OssApi,
    VisibilityRecord,
};
use crate::urls::{Expiration, public_url, rewrite_authority};

/// Settings that shape requests and URLs but not the key namespace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterOptions {
    /// Backend endpoint, with or without a scheme
    pub endpoint: Option<String>,

    /// Custom domain used for public and signed URLs
    pub cname: Option<String>,

    /// Headers sent with every upload
    pub headers: BTreeMap<String, String>,
}

/// Filesystem view of one bucket under a fixed key prefix
pub struct OssAdapter {
    client: Arc<dyn OssApi>,
    bucket: String,
    prefixer: PathPrefixer,
    options: AdapterOptions,
}

impl std::fmt::Debug for OssAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OssAdapter")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefixer.prefix())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl OssAdapter {
    /// Create an adapter over `bucket`, rooted at `prefix`
    pub fn new(
        client: Arc<dyn OssApi>,
        bucket: impl Into<String>,
        prefix: &str,
        options: AdapterOptions,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefixer: PathPrefixer::new(prefix),
            options,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn client(&self) -> &Arc<dyn OssApi> {
        &self.client
    }

    pub fn prefixer(&self) -> &PathPrefixer {
        &self.prefixer
    }

    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }

    fn object_options(&self, config: &WriteConfig) -> ObjectOptions {
        ObjectOptions::with_headers(self.options.headers.clone()).apply(config)
    }

    async fn upload(&self, path: &str, body: Vec<u8>, config: &WriteConfig) -> FsResult<Metadata> {
        let key = self.prefixer.to_physical(path);
        let mut options = self.object_options(config);
        if options.content_length.is_none() {
            options.content_length = Some(body.len() as u64);
        }

        self.client
            .put_object(&self.bucket, &key, body, &options)
            .await
            .map_err(|e| collapse("write", &key, e))?;

        Ok(self.upload_metadata(path, &options))
    }

    /// Describe a completed upload from the options it was sent with
    fn upload_metadata(&self, path: &str, options: &ObjectOptions) -> Metadata {
        let mut response = RawResponse::new();
        if let Some(content_type) = &options.content_type {
            response.insert("ContentType".into(), Value::String(content_type.clone()));
        }
        if let Some(length) = options.content_length {
            response.insert("ContentLength".into(), Value::from(length));
        }
        normalize_response(&self.prefixer, &response, Some(path))
    }

    async fn read_object(&self, path: &str) -> FsResult<Vec<u8>> {
        let key = self.prefixer.to_physical(path);
        self.client
            .get_object(&self.bucket, &key)
            .await
            .map_err(|e| collapse("read", &key, e))
    }
}

#[async_trait]
impl FilesystemAdapter for OssAdapter {
    async fn has(&self, path: &str) -> bool {
        let key = self.prefixer.to_physical(path);
        match self.client.does_object_exist(&self.bucket, &key).await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "existence check failed; reporting missing");
                false
            }
        }
    }

    async fn read(&self, path: &str) -> FsResult<FileContents> {
        let contents = self.read_object(path).await?;
        Ok(FileContents {
            path: path.to_string(),
            contents,
        })
    }

    async fn read_stream(&self, path: &str) -> FsResult<FileStream> {
        let contents = self.read_object(path).await?;
        Ok(FileStream {
            path: path.to_string(),
            stream: Box::new(std::io::Cursor::new(contents)),
        })
    }

    async fn write(
        &self,
        path: &str,
        contents: Vec<u8>,
        config: &WriteConfig,
    ) -> FsResult<Metadata> {
        self.upload(path, contents, config).await
    }

    async fn update(
        &self,
        path: &str,
        contents: Vec<u8>,
        config: &WriteConfig,
    ) -> FsResult<Metadata> {
        self.upload(path, contents, config).await
    }

    async fn write_stream(
        &self,
        path: &str,
        mut stream: Box<dyn AsyncRead + Send + Unpin>,
        config: &WriteConfig,
    ) -> FsResult<Metadata> {
        let mut body = Vec::new();
        if let Err(e) = stream.read_to_end(&mut body).await {
            tracing::debug!(path, error = %e, "failed to read upload stream");
            return Err(OperationFailed);
        }
        self.upload(path, body, config).await
    }

    async fn update_stream(
        &self,
        path: &str,
        stream: Box<dyn AsyncRead + Send + Unpin>,
        config: &WriteConfig,
    ) -> FsResult<Metadata> {
        self.write_stream(path, stream, config).await
    }

    async fn write_file(
        &self,
        path: &str,
        local: &Path,
        config: &WriteConfig,
    ) -> FsResult<Metadata> {
        let key = self.prefixer.to_physical(path);
        let options = self.object_options(config);

        self.client
            .upload_file(&self.bucket, &key, local, &options)
            .await
            .map_err(|e| collapse("write_file", &key, e))?;

        Ok(self.upload_metadata(path, &options))
    }

    async fn copy(&self, path: &str, new_path: &str) -> FsResult<()> {
        let from = self.prefixer.to_physical(path);
        let to = self.prefixer.to_physical(new_path);

        self.client
            .copy_object(&self.bucket, &from, &self.bucket, &to)
            .await
            .map_err(|e| collapse("copy", &from, e))
    }

    async fn rename(&self, path: &str, new_path: &str) -> FsResult<()> {
        self.copy(path, new_path).await?;

        if let Err(e) = self.delete(path).await {
            tracing::warn!(
                from = path,
                to = new_path,
                "rename copied the object but could not delete the source; both now exist"
            );
            return Err(e);
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> FsResult<()> {
        let key = self.prefixer.to_physical(path);
        self.client
            .delete_object(&self.bucket, &key)
            .await
            .map_err(|e| collapse("delete", &key, e))
    }

    async fn delete_dir(&self, dirname: &str) -> FsResult<()> {
        let entries = self.list_contents(dirname, true).await?;

        let keys: Vec<String> = entries
            .iter()
            .map(|entry| {
                let key = self.prefixer.to_physical(&entry.path);
                if entry.is_dir() {
                    format!("{key}{DELIMITER}")
                } else {
                    key
                }
            })
            .collect();

        if keys.is_empty() {
            tracing::debug!(dirname, "nothing to delete under directory");
            return Err(OperationFailed);
        }

        self.client
            .delete_objects(&self.bucket, &keys)
            .await
            .map_err(|e| {
                tracing::warn!(
                    dirname,
                    keys = keys.len(),
                    "batch delete failed; some objects may already be gone"
                );
                collapse("delete_dir", dirname, e)
            })
    }

    async fn create_dir(&self, dirname: &str, config: &WriteConfig) -> FsResult<ObjectEntry> {
        let key = self.prefixer.to_physical(dirname);
        let options = self.object_options(config);

        self.client
            .create_object_dir(&self.bucket, &key, &options)
            .await
            .map_err(|e| collapse("create_dir", &key, e))?;

        Ok(ObjectEntry::dir(dirname, 0))
    }

    async fn set_visibility(
        &self,
        path: &str,
        visibility: Visibility,
    ) -> FsResult<VisibilityRecord> {
        let key = self.prefixer.to_physical(path);
        self.client
            .put_object_acl(&self.bucket, &key, visibility.acl())
            .await
            .map_err(|e| collapse("set_visibility", &key, e))?;

        Ok(VisibilityRecord {
            path: path.to_string(),
            visibility,
        })
    }

    async fn get_visibility(&self, path: &str) -> FsResult<Visibility> {
        let key = self.prefixer.to_physical(path);
        let acl = self
            .client
            .get_object_acl(&self.bucket, &key)
            .await
            .map_err(|e| collapse("get_visibility", &key, e))?;

        Ok(Visibility::from_acl(acl))
    }

    async fn list_contents(
        &self,
        directory: &str,
        recursive: bool,
    ) -> FsResult<Vec<ObjectEntry>> {
        self.list_level(directory.to_string(), recursive).await
    }

    async fn get_metadata(&self, path: &str) -> FsResult<Metadata> {
        let key = self.prefixer.to_physical(path);
        let headers = self
            .client
            .get_object_meta(&self.bucket, &key)
            .await
            .map_err(|e| collapse("get_metadata", &key, e))?;

        let response = response_from_headers(&headers);
        Ok(normalize_response(&self.prefixer, &response, Some(path)))
    }

    async fn get_size(&self, path: &str) -> FsResult<Metadata> {
        self.get_metadata(path).await
    }

    async fn get_mimetype(&self, path: &str) -> FsResult<Metadata> {
        self.get_metadata(path).await
    }

    async fn get_timestamp(&self, path: &str) -> FsResult<Metadata> {
        self.get_metadata(path).await
    }

    fn url(&self, path: &str) -> FsResult<String> {
        let key = self.prefixer.to_physical(path);
        public_url(
            self.options.endpoint.as_deref(),
            self.options.cname.as_deref(),
            &self.bucket,
            &key,
        )
        .map_err(|e| collapse("url", &key, e))
    }

    async fn temporary_url(&self, path: &str, expiration: Expiration) -> FsResult<String> {
        let key = self.prefixer.to_physical(path);
        let Some(ttl) = expiration.ttl_secs(jiff::Timestamp::now()) else {
            tracing::debug!(key, "temporary URL requested for an instant in the past");
            return Err(OperationFailed);
        };

        let signed = self
            .client
            .sign_url(
                &self.bucket,
                &key,
                ttl,
                HttpMethod::Get,
                &ObjectOptions::default(),
            )
            .await
            .map_err(|e| collapse("temporary_url", &key, e))?;

        match self.options.cname.as_deref().filter(|c| !c.is_empty()) {
            Some(cname) => {
                rewrite_authority(&signed, cname).map_err(|e| collapse("temporary_url", &key, e))
            }
            None => Ok(signed),
        }
    }
}
