//! Driver registry
//!
//! The hosting application owns a [`StorageRegistry`] and lets each backend
//! crate register a factory under a driver name. Resolving a
//! [`DiskConfig`] runs the factory named by its `driver` field.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::disk::DiskConfig;
use crate::error::{Error, Result};
use crate::traits::FilesystemAdapter;

/// Future produced by a driver factory
pub type AdapterFuture = BoxFuture<'static, Result<Arc<dyn FilesystemAdapter>>>;

type DriverFactory = Box<dyn Fn(DiskConfig) -> AdapterFuture + Send + Sync>;

/// Named filesystem drivers
#[derive(Default)]
pub struct StorageRegistry {
    drivers: HashMap<String, DriverFactory>,
}

impl std::fmt::Debug for StorageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.drivers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("StorageRegistry")
            .field("drivers", &names)
            .finish()
    }
}

impl StorageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `driver`, replacing any previous one
    pub fn extend<F>(&mut self, driver: impl Into<String>, factory: F)
    where
        F: Fn(DiskConfig) -> AdapterFuture + Send + Sync + 'static,
    {
        let driver = driver.into();
        tracing::debug!(driver = %driver, "registering storage driver");
        self.drivers.insert(driver, Box::new(factory));
    }

    pub fn has_driver(&self, driver: &str) -> bool {
        self.drivers.contains_key(driver)
    }

    /// Build the filesystem described by `disk`
    pub async fn resolve(&self, disk: &DiskConfig) -> Result<Arc<dyn FilesystemAdapter>> {
        let factory = self
            .drivers
            .get(&disk.driver)
            .ok_or_else(|| Error::DriverNotFound(disk.driver.clone()))?;

        tracing::debug!(disk = %disk.name, driver = %disk.driver, "resolving disk");
        factory(disk.clone()).await
    }
}
