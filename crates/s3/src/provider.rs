//! `oss` driver registration

use std::sync::Arc;

use ossfs_core::{
    AdapterFuture, AdapterOptions, DiskConfig, FilesystemAdapter, OSS_DRIVER, OssAdapter, Result,
    StorageRegistry,
};

use crate::client::OssClient;

/// Install the `oss` driver into `registry`
pub fn register(registry: &mut StorageRegistry) {
    registry.extend(OSS_DRIVER, |disk: DiskConfig| -> AdapterFuture {
        Box::pin(async move {
            let adapter = build_adapter(&disk).await?;
            Ok(Arc::new(adapter) as Arc<dyn FilesystemAdapter>)
        })
    });
}

/// Build the facade for one disk: a client for its endpoint and credentials,
/// rooted at its bucket and prefix
pub async fn build_adapter(disk: &DiskConfig) -> Result<OssAdapter> {
    disk.validate()?;
    let client = OssClient::new(disk).await?;

    Ok(OssAdapter::new(
        Arc::new(client),
        disk.bucket.clone(),
        disk.prefix(),
        AdapterOptions {
            endpoint: Some(disk.endpoint.clone()),
            cname: disk.cname.clone(),
            headers: disk.headers.clone(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ossfs_core::Error;

    fn disk() -> DiskConfig {
        let mut disk = DiskConfig::new(
            "assets",
            "oss-cn-hangzhou.aliyuncs.com",
            "my-bucket",
            "id",
            "secret",
        );
        disk.prefix = Some("static".into());
        disk
    }

    #[test]
    fn test_register_installs_oss_driver() {
        let mut registry = StorageRegistry::new();
        assert!(!registry.has_driver("oss"));
        register(&mut registry);
        assert!(registry.has_driver("oss"));
    }

    #[tokio::test]
    async fn test_build_adapter_from_disk() {
        let adapter = build_adapter(&disk()).await.unwrap();
        assert_eq!(adapter.bucket(), "my-bucket");
        assert_eq!(adapter.prefixer().prefix(), "static/");
        assert_eq!(
            adapter.url("img/a.png").unwrap(),
            "http://my-bucket.oss-cn-hangzhou.aliyuncs.com/static/img/a.png"
        );
    }

    #[tokio::test]
    async fn test_resolve_rejects_incomplete_disk() {
        let mut registry = StorageRegistry::new();
        register(&mut registry);

        let mut disk = disk();
        disk.bucket.clear();
        let Err(err) = registry.resolve(&disk).await else {
            panic!("disk without bucket resolved");
        };
        assert!(matches!(err, Error::Config(_)));
    }
}
