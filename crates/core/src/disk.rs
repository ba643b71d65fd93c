//! Disk management
//!
//! A disk is a named configuration block describing one bucket (and an
//! optional key prefix inside it) together with the credentials and
//! endpoint needed to reach it. The `driver` field selects the factory in
//! the [`StorageRegistry`](crate::registry::StorageRegistry) that turns the
//! block into a filesystem.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ConfigManager;
use crate::error::{Error, Result};
use crate::path::is_valid_disk_name;

/// Driver name of the OSS backend
pub const OSS_DRIVER: &str = "oss";

fn default_driver() -> String {
    OSS_DRIVER.to_string()
}

/// A named configuration block for one storage disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskConfig {
    /// Unique name for this disk
    pub name: String,

    /// Registered driver that builds the filesystem
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Access key ID
    pub access_id: String,

    /// Access key secret
    pub access_key: String,

    /// Service endpoint, with or without a scheme
    pub endpoint: String,

    pub bucket: String,

    /// Key prefix all paths are rooted at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Custom domain bound to the bucket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cname: Option<String>,

    /// Region, derived from the endpoint when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Headers sent with every upload
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl DiskConfig {
    /// Create a disk using the OSS driver
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_id: impl Into<String>,
        access_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            driver: default_driver(),
            access_id: access_id.into(),
            access_key: access_key.into(),
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            prefix: None,
            cname: None,
            region: None,
            headers: BTreeMap::new(),
        }
    }

    /// Key prefix, empty when the disk is rooted at the bucket
    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or("")
    }

    /// Check the fields every driver relies on
    pub fn validate(&self) -> Result<()> {
        if !is_valid_disk_name(&self.name) {
            return Err(Error::Config(format!("invalid disk name '{}'", self.name)));
        }
        if self.bucket.is_empty() {
            return Err(Error::Config(format!("disk '{}' has no bucket", self.name)));
        }
        if self.endpoint.is_empty() {
            return Err(Error::Config(format!("disk '{}' has no endpoint", self.name)));
        }
        Ok(())
    }
}

/// Manager for disk operations
pub struct DiskManager {
    config_manager: ConfigManager,
}

impl DiskManager {
    /// Create a DiskManager over a specific ConfigManager
    pub fn with_config_manager(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    /// Create a DiskManager using the default config location
    pub fn new() -> Result<Self> {
        let config_manager = ConfigManager::new()?;
        Ok(Self { config_manager })
    }

    pub fn list(&self) -> Result<Vec<DiskConfig>> {
        let config = self.config_manager.load()?;
        Ok(config.disks)
    }

    pub fn get(&self, name: &str) -> Result<DiskConfig> {
        let config = self.config_manager.load()?;
        config
            .disks
            .into_iter()
            .find(|d| d.name == name)
            .ok_or_else(|| Error::DiskNotFound(name.to_string()))
    }

    /// Add a disk, replacing any existing disk with the same name
    pub fn set(&self, disk: DiskConfig) -> Result<()> {
        disk.validate()?;
        let mut config = self.config_manager.load()?;

        config.disks.retain(|d| d.name != disk.name);
        config.disks.push(disk);

        self.config_manager.save(&config)
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let mut config = self.config_manager.load()?;
        let original_len = config.disks.len();

        config.disks.retain(|d| d.name != name);

        if config.disks.len() == original_len {
            return Err(Error::DiskNotFound(name.to_string()));
        }

        self.config_manager.save(&config)
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        let config = self.config_manager.load()?;
        Ok(config.disks.iter().any(|d| d.name == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_disk_manager() -> (DiskManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_manager = ConfigManager::with_path(temp_dir.path().join("config.toml"));
        (DiskManager::with_config_manager(config_manager), temp_dir)
    }

    fn disk(name: &str, bucket: &str) -> DiskConfig {
        DiskConfig::new(name, "oss-cn-hangzhou.aliyuncs.com", bucket, "id", "secret")
    }

    #[test]
    fn test_disk_new_defaults_to_oss_driver() {
        let disk = disk("assets", "my-bucket");
        assert_eq!(disk.driver, OSS_DRIVER);
        assert_eq!(disk.prefix(), "");
        assert!(disk.cname.is_none());
        assert!(disk.headers.is_empty());
    }

    #[test]
    fn test_disk_deserialize_minimal_block() {
        let disk: DiskConfig = toml::from_str(
            r#"
            name = "assets"
            access_id = "id"
            access_key = "secret"
            endpoint = "https://oss-cn-hangzhou.aliyuncs.com"
            bucket = "my-bucket"
            prefix = "static"

            [headers]
            Cache-Control = "max-age=3600"
            "#,
        )
        .unwrap();
        assert_eq!(disk.driver, "oss");
        assert_eq!(disk.prefix(), "static");
        assert_eq!(disk.headers["Cache-Control"], "max-age=3600");
    }

    #[test]
    fn test_validate_rejects_incomplete_disk() {
        assert!(disk("assets", "b").validate().is_ok());
        assert!(disk("assets", "").validate().is_err());
        assert!(disk("bad/name", "b").validate().is_err());
    }

    #[test]
    fn test_disk_manager_set_get_list() {
        let (manager, _temp_dir) = temp_disk_manager();

        manager.set(disk("a", "bucket-a")).unwrap();
        manager.set(disk("b", "bucket-b")).unwrap();

        assert_eq!(manager.get("a").unwrap().bucket, "bucket-a");
        assert_eq!(manager.list().unwrap().len(), 2);
    }

    #[test]
    fn test_disk_manager_replaces_by_name() {
        let (manager, _temp_dir) = temp_disk_manager();

        manager.set(disk("a", "old")).unwrap();
        manager.set(disk("a", "new")).unwrap();

        let disks = manager.list().unwrap();
        assert_eq!(disks.len(), 1);
        assert_eq!(disks[0].bucket, "new");
    }

    #[test]
    fn test_disk_manager_remove() {
        let (manager, _temp_dir) = temp_disk_manager();

        manager.set(disk("a", "b")).unwrap();
        assert!(manager.exists("a").unwrap());

        manager.remove("a").unwrap();
        assert!(!manager.exists("a").unwrap());
        assert!(matches!(manager.remove("a"), Err(Error::DiskNotFound(_))));
        assert!(matches!(manager.get("a"), Err(Error::DiskNotFound(_))));
    }
}
