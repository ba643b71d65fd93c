//! In-memory object store
//!
//! [`MemoryOss`] implements [`OssApi`] over a map of buckets held in process
//! memory. Listing follows OSS semantics (lexicographic keys, delimiter
//! grouping, `max-keys` counting both objects and common prefixes), which
//! makes it a faithful stand-in for the real service in tests.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use jiff::Timestamp;

use crate::error::{Error, Result};
use crate::options::{ObjectAcl, ObjectOptions};
use crate::path::DELIMITER;
use crate::traits::{HttpMethod, ListObjectsRequest, ObjectListing, ObjectSummary, OssApi};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: Option<String>,
    headers: BTreeMap<String, String>,
    acl: ObjectAcl,
    last_modified: Timestamp,
}

impl StoredObject {
    fn new(data: Vec<u8>, options: &ObjectOptions) -> Self {
        Self {
            data,
            content_type: options.content_type.clone(),
            headers: options.headers.clone(),
            acl: options.acl.unwrap_or(ObjectAcl::Default),
            last_modified: Timestamp::now(),
        }
    }
}

type Bucket = BTreeMap<String, StoredObject>;

/// Object store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryOss {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl MemoryOss {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Bucket>> {
        self.buckets.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store an object directly, bypassing option handling
    pub fn insert(&self, bucket: &str, key: &str, data: Vec<u8>) {
        self.lock()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), StoredObject::new(data, &ObjectOptions::default()));
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.lock()
            .get(bucket)
            .is_some_and(|objects| objects.contains_key(key))
    }

    /// All keys in a bucket, in lexicographic order
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn put(&self, bucket: &str, key: &str, data: Vec<u8>, options: &ObjectOptions) {
        self.lock()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), StoredObject::new(data, options));
    }

    fn with_object<T>(
        &self,
        bucket: &str,
        key: &str,
        f: impl FnOnce(&mut StoredObject) -> T,
    ) -> Result<T> {
        let mut buckets = self.lock();
        buckets
            .get_mut(bucket)
            .and_then(|objects| objects.get_mut(key))
            .map(f)
            .ok_or_else(|| Error::NotFound(format!("{bucket}/{key}")))
    }
}

#[async_trait]
impl OssApi for MemoryOss {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        options: &ObjectOptions,
    ) -> Result<()> {
        self.put(bucket, key, body, options);
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.with_object(bucket, key, |object| object.data.clone())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let mut buckets = self.lock();
        buckets
            .get_mut(bucket)
            .and_then(|objects| objects.remove(key))
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("{bucket}/{key}")))
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Err(Error::General("no keys to delete".into()));
        }
        let mut buckets = self.lock();
        if let Some(objects) = buckets.get_mut(bucket) {
            for key in keys {
                objects.remove(key);
            }
        }
        Ok(())
    }

    async fn copy_object(
        &self,
        from_bucket: &str,
        from_key: &str,
        to_bucket: &str,
        to_key: &str,
    ) -> Result<()> {
        let mut object = self.with_object(from_bucket, from_key, |object| object.clone())?;
        object.last_modified = Timestamp::now();
        self.lock()
            .entry(to_bucket.to_string())
            .or_default()
            .insert(to_key.to_string(), object);
        Ok(())
    }

    async fn does_object_exist(&self, bucket: &str, key: &str) -> Result<bool> {
        Ok(self.contains(bucket, key))
    }

    async fn get_object_meta(&self, bucket: &str, key: &str) -> Result<BTreeMap<String, String>> {
        self.with_object(bucket, key, |object| {
            let mut meta = object.headers.clone();
            meta.insert("content-length".into(), object.data.len().to_string());
            if let Some(content_type) = &object.content_type {
                meta.insert("content-type".into(), content_type.clone());
            }
            meta.insert("last-modified".into(), object.last_modified.to_string());
            meta
        })
    }

    async fn list_objects(
        &self,
        bucket: &str,
        request: &ListObjectsRequest,
    ) -> Result<ObjectListing> {
        let buckets = self.lock();
        let Some(objects) = buckets.get(bucket) else {
            return Ok(ObjectListing::default());
        };

        let max_keys = request.max_keys as usize;
        let mut listing = ObjectListing::default();
        let mut count = 0;
        let mut last_seen: Option<String> = None;

        let candidates = objects
            .iter()
            .filter(|(key, _)| key.as_str() > request.marker.as_str())
            .filter(|(key, _)| key.starts_with(&request.prefix));

        for (key, object) in candidates {
            let rest = &key[request.prefix.len()..];
            let group = if request.delimiter.is_empty() {
                None
            } else {
                rest.find(&request.delimiter)
                    .map(|pos| format!("{}{}", request.prefix, &rest[..pos + request.delimiter.len()]))
            };

            if let Some(group) = &group {
                if listing.prefixes.last() == Some(group) {
                    continue;
                }
            }

            if count == max_keys {
                listing.truncated = true;
                listing.next_marker = last_seen;
                return Ok(listing);
            }
            count += 1;

            match group {
                Some(group) => {
                    last_seen = Some(group.clone());
                    listing.prefixes.push(group);
                }
                None => {
                    last_seen = Some(key.clone());
                    listing.objects.push(ObjectSummary {
                        key: key.clone(),
                        size: object.data.len() as u64,
                        last_modified: Some(object.last_modified.to_string()),
                    });
                }
            }
        }

        Ok(listing)
    }

    async fn put_object_acl(&self, bucket: &str, key: &str, acl: ObjectAcl) -> Result<()> {
        self.with_object(bucket, key, |object| object.acl = acl)
    }

    async fn get_object_acl(&self, bucket: &str, key: &str) -> Result<ObjectAcl> {
        self.with_object(bucket, key, |object| object.acl)
    }

    async fn create_object_dir(
        &self,
        bucket: &str,
        key: &str,
        options: &ObjectOptions,
    ) -> Result<()> {
        let key = format!("{}{DELIMITER}", key.trim_end_matches(DELIMITER));
        self.put(bucket, &key, Vec::new(), options);
        Ok(())
    }

    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        local: &Path,
        options: &ObjectOptions,
    ) -> Result<()> {
        let data = tokio::fs::read(local).await?;
        self.put(bucket, key, data, options);
        Ok(())
    }

    async fn sign_url(
        &self,
        bucket: &str,
        key: &str,
        ttl_secs: u64,
        method: HttpMethod,
        _options: &ObjectOptions,
    ) -> Result<String> {
        let expires = Timestamp::now().as_second() + ttl_secs as i64;
        let method = match method {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
        };
        Ok(format!(
            "http://{bucket}.memory.invalid/{key}?Expires={expires}&Method={method}&Signature=memory"
        ))
    }
}
