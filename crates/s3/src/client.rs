//! OSS client implementation
//!
//! Wraps aws-sdk-s3 and implements the [`OssApi`] trait from ossfs-core.
//! Aliyun OSS serves the S3 protocol on its regular endpoints with
//! virtual-hosted bucket addressing.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::{RequestChecksumCalculation, ResponseChecksumValidation};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectCannedAcl, ObjectIdentifier, Permission};
use aws_smithy_types::date_time::{DateTime, Format};

use ossfs_core::{
    DiskConfig, Error, HttpMethod, ListObjectsRequest, ObjectAcl, ObjectListing, ObjectOptions,
    ObjectSummary, OssApi, Result,
};

/// Region used when neither the disk nor its endpoint names one
pub const DEFAULT_REGION: &str = "cn-hangzhou";

/// Largest batch a single multi-object delete accepts
const DELETE_BATCH_SIZE: usize = 1000;

/// Grantee group meaning "everyone"
const ALL_USERS_URI: &str = "http://acs.amazonaws.com/groups/global/AllUsers";

/// OSS client wrapper
pub struct OssClient {
    inner: aws_sdk_s3::Client,
}

impl Debug for OssClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OssClient").finish_non_exhaustive()
    }
}

impl OssClient {
    /// Create a new client from a disk configuration
    pub async fn new(disk: &DiskConfig) -> Result<Self> {
        let endpoint = endpoint_url(&disk.endpoint)?;
        let region = disk
            .region
            .clone()
            .or_else(|| region_from_endpoint(&endpoint))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        tracing::debug!(disk = %disk.name, endpoint = %endpoint, region = %region, "creating OSS client");

        let credentials = aws_credential_types::Credentials::new(
            disk.access_id.clone(),
            disk.access_key.clone(),
            None,
            None,
            "ossfs-static-credentials",
        );

        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(region))
            .endpoint_url(&endpoint)
            .load()
            .await;

        // OSS rejects the flexible checksums newer SDKs send by default
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(false)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .build();

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }
}

/// Endpoint as an absolute URL, defaulting to https
pub fn endpoint_url(endpoint: &str) -> Result<String> {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.is_empty() {
        return Err(Error::Config("endpoint is empty".into()));
    }
    let with_scheme = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{endpoint}")
    };
    let parsed = url::Url::parse(&with_scheme)?;
    if parsed.host_str().is_none() {
        return Err(Error::Config(format!("endpoint '{endpoint}' has no host")));
    }
    Ok(with_scheme)
}

/// Region encoded in an OSS endpoint host, e.g. `oss-cn-hangzhou.aliyuncs.com`
pub fn region_from_endpoint(endpoint: &str) -> Option<String> {
    let parsed = url::Url::parse(endpoint).ok()?;
    let host = parsed.host_str()?;
    host.split('.')
        .find_map(|label| label.strip_prefix("oss-"))
        .map(|region| region.trim_end_matches("-internal"))
        .filter(|region| !region.is_empty())
        .map(str::to_string)
}

/// Copy source header value: bucket and key with each key segment escaped
fn copy_source(bucket: &str, key: &str) -> String {
    let key = key
        .split('/')
        .map(|segment| {
            url::form_urlencoded::byte_serialize(segment.as_bytes())
                .collect::<String>()
                .replace('+', "%20")
        })
        .collect::<Vec<_>>()
        .join("/");
    format!("{bucket}/{key}")
}

fn is_header_safe(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b == b'\t' || (0x20..0x7f).contains(&b))
}

/// Whether `name` is a valid HTTP header name token
fn is_header_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}

/// Request headers of an upload, split into typed fields and raw extras
#[derive(Debug, Default, PartialEq, Eq)]
struct UploadHeaders {
    content_type: Option<String>,
    content_length: Option<i64>,
    extra: Vec<(String, String)>,
}

/// Resolve the headers of an upload
///
/// Typed options win over raw `Content-Type`/`Content-Length` entries; a raw
/// entry fills the typed field when it is unset. Other entries are attached
/// verbatim.
fn upload_headers(options: &ObjectOptions) -> Result<UploadHeaders> {
    let content_length = match options.content_length {
        Some(len) => Some(
            i64::try_from(len)
                .map_err(|_| Error::General(format!("content length {len} is out of range")))?,
        ),
        None => None,
    };
    let mut headers = UploadHeaders {
        content_type: options.content_type.clone(),
        content_length,
        extra: Vec::new(),
    };

    for (name, value) in &options.headers {
        if name.eq_ignore_ascii_case("content-type") {
            if headers.content_type.is_none() {
                if !is_header_safe(value) {
                    return Err(Error::General(format!("invalid Content-Type '{value}'")));
                }
                headers.content_type = Some(value.clone());
            }
            continue;
        }
        if name.eq_ignore_ascii_case("content-length") {
            if headers.content_length.is_none() {
                let len = value
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .filter(|len| *len >= 0)
                    .ok_or_else(|| Error::General(format!("invalid Content-Length '{value}'")))?;
                headers.content_length = Some(len);
            }
            continue;
        }
        if !is_header_name(name) {
            return Err(Error::General(format!("invalid header name '{name}'")));
        }
        if !is_header_safe(value) {
            tracing::warn!(header = %name, "skipping header whose value is not printable ASCII");
            continue;
        }
        headers.extra.push((name.clone(), value.clone()));
    }

    Ok(headers)
}

fn format_time(time: &DateTime, format: Format) -> Option<String> {
    time.fmt(format).ok()
}

/// Classify an SDK failure
fn sdk_error<E>(err: SdkError<E, HttpResponse>, target: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let message = format!("{target}: {}", DisplayErrorContext(&err));

    match (err.code(), status) {
        (Some("NoSuchKey" | "NoSuchBucket" | "NotFound"), _) | (_, Some(404)) => {
            Error::NotFound(target.to_string())
        }
        (Some("AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch"), _)
        | (_, Some(401 | 403)) => Error::Auth(message),
        (Some("PreconditionFailed" | "OperationAborted"), _) | (_, Some(409 | 412)) => {
            Error::Conflict(message)
        }
        _ => match &err {
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => Error::Network(message),
            _ => Error::General(message),
        },
    }
}

#[async_trait]
impl OssApi for OssClient {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        options: &ObjectOptions,
    ) -> Result<()> {
        let UploadHeaders {
            content_type,
            content_length,
            extra,
        } = upload_headers(options)?;

        self.inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .set_content_type(content_type)
            .set_content_length(content_length)
            .set_acl(options.acl.map(|acl| ObjectCannedAcl::from(acl.as_str())))
            .customize()
            .mutate_request(move |req| {
                for (name, value) in &extra {
                    req.headers_mut().insert(name.clone(), value.clone());
                }
            })
            .send()
            .await
            .map_err(|e| sdk_error(e, key))?;

        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error(e, key))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.inner
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error(e, key))?;

        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Err(Error::General("no keys to delete".into()));
        }

        for chunk in keys.chunks(DELETE_BATCH_SIZE) {
            let objects = chunk
                .iter()
                .map(|k| ObjectIdentifier::builder().key(k).build())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::General(e.to_string()))?;

            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|e| Error::General(e.to_string()))?;

            let response = self
                .inner
                .delete_objects()
                .bucket(bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| sdk_error(e, bucket))?;

            if !response.errors().is_empty() {
                let failed: Vec<&str> = response.errors().iter().filter_map(|e| e.key()).collect();
                return Err(Error::General(format!(
                    "failed to delete {} of {} objects: {:?}",
                    failed.len(),
                    chunk.len(),
                    failed
                )));
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
        self.inner
            .copy_object()
            .copy_source(copy_source(from_bucket, from_key))
            .bucket(to_bucket)
            .key(to_key)
            .send()
            .await
            .map_err(|e| sdk_error(e, from_key))?;

        Ok(())
    }

    async fn does_object_exist(&self, bucket: &str, key: &str) -> Result<bool> {
        match self.inner.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(e) => match sdk_error(e, key) {
                Error::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn get_object_meta(&self, bucket: &str, key: &str) -> Result<BTreeMap<String, String>> {
        let response = self
            .inner
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error(e, key))?;

        let mut meta = BTreeMap::new();
        if let Some(len) = response.content_length() {
            meta.insert("content-length".to_string(), len.to_string());
        }
        if let Some(content_type) = response.content_type() {
            meta.insert("content-type".to_string(), content_type.to_string());
        }
        if let Some(modified) = response
            .last_modified()
            .and_then(|t| format_time(t, Format::HttpDate))
        {
            meta.insert("last-modified".to_string(), modified);
        }
        if let Some(etag) = response.e_tag() {
            meta.insert("etag".to_string(), etag.to_string());
        }
        if let Some(user) = response.metadata() {
            for (name, value) in user {
                meta.insert(format!("x-oss-meta-{}", name.to_ascii_lowercase()), value.clone());
            }
        }

        Ok(meta)
    }

    async fn list_objects(
        &self,
        bucket: &str,
        request: &ListObjectsRequest,
    ) -> Result<ObjectListing> {
        let mut call = self
            .inner
            .list_objects()
            .bucket(bucket)
            .prefix(&request.prefix)
            .max_keys(i32::try_from(request.max_keys).unwrap_or(i32::MAX));

        if !request.delimiter.is_empty() {
            call = call.delimiter(&request.delimiter);
        }
        if !request.marker.is_empty() {
            call = call.marker(&request.marker);
        }

        let response = call.send().await.map_err(|e| sdk_error(e, &request.prefix))?;

        let objects = response
            .contents()
            .iter()
            .map(|object| ObjectSummary {
                key: object.key().unwrap_or_default().to_string(),
                size: object.size().unwrap_or(0).max(0) as u64,
                last_modified: object
                    .last_modified()
                    .and_then(|t| format_time(t, Format::DateTime)),
            })
            .collect();

        let prefixes = response
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(str::to_string))
            .collect();

        Ok(ObjectListing {
            objects,
            prefixes,
            truncated: response.is_truncated().unwrap_or(false),
            next_marker: response.next_marker().map(str::to_string),
        })
    }

    async fn put_object_acl(&self, bucket: &str, key: &str, acl: ObjectAcl) -> Result<()> {
        self.inner
            .put_object_acl()
            .bucket(bucket)
            .key(key)
            .acl(ObjectCannedAcl::from(acl.as_str()))
            .send()
            .await
            .map_err(|e| sdk_error(e, key))?;

        Ok(())
    }

    async fn get_object_acl(&self, bucket: &str, key: &str) -> Result<ObjectAcl> {
        let response = self
            .inner
            .get_object_acl()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error(e, key))?;

        let mut acl = ObjectAcl::Private;
        for grant in response.grants() {
            let Some(grantee) = grant.grantee() else {
                continue;
            };
            if grantee.uri() != Some(ALL_USERS_URI) {
                continue;
            }
            match grant.permission() {
                Some(Permission::Write | Permission::FullControl) => {
                    return Ok(ObjectAcl::PublicReadWrite);
                }
                Some(Permission::Read) => acl = ObjectAcl::PublicRead,
                _ => {}
            }
        }

        Ok(acl)
    }

    async fn create_object_dir(
        &self,
        bucket: &str,
        key: &str,
        options: &ObjectOptions,
    ) -> Result<()> {
        let key = format!("{}/", key.trim_end_matches('/'));
        let mut options = options.clone();
        options.content_length = Some(0);
        self.put_object(bucket, &key, Vec::new(), &options).await
    }

    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        local: &Path,
        options: &ObjectOptions,
    ) -> Result<()> {
        let body = ByteStream::from_path(local)
            .await
            .map_err(|e| Error::General(format!("{}: {e}", local.display())))?;
        // The body's own length is sent; a configured length is not applied
        let UploadHeaders {
            content_type,
            extra,
            ..
        } = upload_headers(options)?;

        self.inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .set_content_type(content_type)
            .set_acl(options.acl.map(|acl| ObjectCannedAcl::from(acl.as_str())))
            .customize()
            .mutate_request(move |req| {
                for (name, value) in &extra {
                    req.headers_mut().insert(name.clone(), value.clone());
                }
            })
            .send()
            .await
            .map_err(|e| sdk_error(e, key))?;

        Ok(())
    }

    async fn sign_url(
        &self,
        bucket: &str,
        key: &str,
        ttl_secs: u64,
        method: HttpMethod,
        options: &ObjectOptions,
    ) -> Result<String> {
        let config = PresigningConfig::expires_in(Duration::from_secs(ttl_secs))
            .map_err(|e| Error::General(format!("invalid expiry: {e}")))?;

        let request = match method {
            HttpMethod::Get => self
                .inner
                .get_object()
                .bucket(bucket)
                .key(key)
                .presigned(config)
                .await
                .map_err(|e| sdk_error(e, key))?,
            HttpMethod::Put => self
                .inner
                .put_object()
                .bucket(bucket)
                .key(key)
                .set_content_type(options.content_type.clone())
                .presigned(config)
                .await
                .map_err(|e| sdk_error(e, key))?,
        };

        Ok(request.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_adds_scheme() {
        assert_eq!(
            endpoint_url("oss-cn-hangzhou.aliyuncs.com").unwrap(),
            "https://oss-cn-hangzhou.aliyuncs.com"
        );
        assert_eq!(
            endpoint_url("http://localhost:9000/").unwrap(),
            "http://localhost:9000"
        );
        assert!(endpoint_url("").is_err());
    }

    #[test]
    fn test_region_from_endpoint() {
        assert_eq!(
            region_from_endpoint("https://oss-cn-hangzhou.aliyuncs.com").as_deref(),
            Some("cn-hangzhou")
        );
        assert_eq!(
            region_from_endpoint("https://oss-cn-shanghai-internal.aliyuncs.com").as_deref(),
            Some("cn-shanghai")
        );
        assert_eq!(
            region_from_endpoint("https://s3.oss-ap-southeast-1.aliyuncs.com").as_deref(),
            Some("ap-southeast-1")
        );
        assert_eq!(region_from_endpoint("http://localhost:9000"), None);
    }

    #[test]
    fn test_copy_source_escapes_segments() {
        assert_eq!(copy_source("b", "d/a b.txt"), "b/d/a%20b.txt");
        assert_eq!(copy_source("b", "plain/key.png"), "b/plain/key.png");
        assert_eq!(copy_source("b", "x/100%.txt"), "b/x/100%25.txt");
    }

    #[test]
    fn test_upload_headers_typed_fields_win() {
        let mut options = ObjectOptions::default();
        options.content_type = Some("image/png".into());
        options.headers.insert("Content-Type".into(), "text/plain".into());
        options.headers.insert("Cache-Control".into(), "no-cache".into());
        options.headers.insert("x-oss-meta-note".into(), "caf\u{e9}".into());

        let headers = upload_headers(&options).unwrap();
        assert_eq!(headers.content_type.as_deref(), Some("image/png"));
        assert_eq!(
            headers.extra,
            vec![("Cache-Control".to_string(), "no-cache".to_string())]
        );
    }

    #[test]
    fn test_upload_headers_raw_typed_headers_pass_through() {
        let mut options = ObjectOptions::default();
        options.headers.insert("Content-Type".into(), "text/csv".into());
        options.headers.insert("content-length".into(), "42".into());

        let headers = upload_headers(&options).unwrap();
        assert_eq!(headers.content_type.as_deref(), Some("text/csv"));
        assert_eq!(headers.content_length, Some(42));
        assert!(headers.extra.is_empty());
    }

    #[test]
    fn test_upload_headers_rejects_invalid_name() {
        for name in ["Bad Name", "a(b)", "x:y"] {
            let mut options = ObjectOptions::default();
            options.headers.insert(name.into(), "v".into());
            assert!(
                matches!(upload_headers(&options), Err(Error::General(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_upload_headers_rejects_oversized_length() {
        let options = ObjectOptions {
            content_length: Some(u64::MAX),
            ..Default::default()
        };
        assert!(upload_headers(&options).is_err());

        let mut options = ObjectOptions::default();
        options.headers.insert("Content-Length".into(), "-1".into());
        assert!(upload_headers(&options).is_err());
    }

    #[tokio::test]
    async fn test_put_object_with_invalid_header_name_fails() {
        let disk = DiskConfig::new(
            "assets",
            "oss-cn-beijing.aliyuncs.com",
            "bucket",
            "id",
            "secret",
        );
        let client = OssClient::new(&disk).await.unwrap();

        let mut options = ObjectOptions::default();
        options.headers.insert("Bad Name".into(), "v".into());
        let result = client.put_object("bucket", "a.txt", b"x".to_vec(), &options).await;
        assert!(matches!(result, Err(Error::General(_))));
    }

    #[tokio::test]
    async fn test_client_builds_without_network() {
        let disk = DiskConfig::new(
            "assets",
            "oss-cn-beijing.aliyuncs.com",
            "bucket",
            "id",
            "secret",
        );
        let client = OssClient::new(&disk).await.unwrap();
        assert_eq!(
            client.inner().config().region().map(|r| r.as_ref()),
            Some("cn-beijing")
        );
    }
}
