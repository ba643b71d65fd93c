//! ossfs-core: filesystem projection over object storage
//!
//! This crate provides the SDK-independent part of ossfs:
//! - Path prefix translation between logical paths and object keys
//! - The [`OssAdapter`] facade implementing [`FilesystemAdapter`]
//! - Response normalization and directory listing projection
//! - Public and signed URL composition
//! - Disk configuration and the driver registry
//!
//! Backends plug in by implementing [`OssApi`]. [`MemoryOss`] is an
//! in-memory implementation used by tests and local experiments.

pub mod adapter;
pub mod config;
pub mod disk;
pub mod error;
mod listing;
pub mod memory;
pub mod normalize;
pub mod options;
pub mod path;
pub mod registry;
pub mod traits;
pub mod urls;

pub use adapter::{AdapterOptions, OssAdapter};
pub use config::{Config, ConfigManager};
pub use disk::{DiskConfig, DiskManager, OSS_DRIVER};
pub use error::{Error, FsResult, OperationFailed, Result};
pub use memory::MemoryOss;
pub use options::{ObjectAcl, ObjectOptions, Visibility, WriteConfig};
pub use path::{DiskPath, PathPrefixer, parse_disk_path};
pub use registry::{AdapterFuture, StorageRegistry};
pub use traits::{
    EntryKind, FileContents, FileStream, FilesystemAdapter, HttpMethod, ListObjectsRequest,
    Metadata, ObjectEntry, ObjectListing, ObjectSummary, OssApi, VisibilityRecord,
};
pub use urls::Expiration;
