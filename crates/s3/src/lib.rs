//! ossfs-s3: Aliyun OSS backend for ossfs
//!
//! This crate implements the [`OssApi`](ossfs_core::OssApi) trait on top of
//! aws-sdk-s3, talking to OSS through its S3-compatible API, and registers
//! the `oss` driver with a [`StorageRegistry`](ossfs_core::StorageRegistry).
//! It is the only crate that depends on the AWS SDK.

pub mod client;
pub mod provider;

pub use client::OssClient;
pub use provider::{build_adapter, register};
