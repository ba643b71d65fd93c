//! CLI command definitions and execution
//!
//! Every command addresses objects as `disk/path`. The disk name selects a
//! block from the configuration file, which the driver registry turns into a
//! filesystem; the rest is a logical path on that filesystem.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use ossfs_core::{
    DiskManager, DiskPath, Error, FilesystemAdapter, StorageRegistry, WriteConfig,
    parse_disk_path,
};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod acl;
mod cat;
pub mod completions;
mod cp;
mod disk;
mod ls;
mod mkdir;
mod mv;
mod pipe;
mod put;
mod rm;
mod stat;
mod url;

/// ossfs - filesystem-style access to Aliyun OSS buckets
#[derive(Parser, Debug)]
#[command(name = "ossfs")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configured disks
    #[command(subcommand)]
    Disk(disk::DiskCommands),

    /// List directory contents
    Ls(ls::LsArgs),

    /// Display file contents
    Cat(cat::CatArgs),

    /// Show file metadata
    Stat(stat::StatArgs),

    /// Upload a local file
    Put(put::PutArgs),

    /// Stream stdin to a file
    Pipe(pipe::PipeArgs),

    /// Copy a file
    Cp(cp::CpArgs),

    /// Move a file (copy + delete source)
    Mv(mv::MvArgs),

    /// Remove files or directories
    Rm(rm::RmArgs),

    /// Create a directory marker
    Mkdir(mkdir::MkdirArgs),

    /// Get or set file visibility
    #[command(subcommand)]
    Acl(acl::AclCommands),

    /// Print the public or a signed URL of a file
    Url(url::UrlArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Disk(cmd) => disk::execute(cmd, output_config).await,
        Commands::Ls(args) => ls::execute(args, output_config).await,
        Commands::Cat(args) => cat::execute(args, output_config).await,
        Commands::Stat(args) => stat::execute(args, output_config).await,
        Commands::Put(args) => put::execute(args, output_config).await,
        Commands::Pipe(args) => pipe::execute(args, output_config).await,
        Commands::Cp(args) => cp::execute(args, output_config).await,
        Commands::Mv(args) => mv::execute(args, output_config).await,
        Commands::Rm(args) => rm::execute(args, output_config).await,
        Commands::Mkdir(args) => mkdir::execute(args, output_config).await,
        Commands::Acl(cmd) => acl::execute(cmd, output_config).await,
        Commands::Url(args) => url::execute(args, output_config).await,
        Commands::Completions(args) => completions::execute(args),
    }
}

/// Registry with every driver this binary ships
pub fn registry() -> StorageRegistry {
    let mut registry = StorageRegistry::new();
    ossfs_s3::register(&mut registry);
    registry
}

/// An opened disk and the logical path addressed on it
pub(crate) struct Target {
    pub location: DiskPath,
    pub fs: Arc<dyn FilesystemAdapter>,
}

impl Target {
    pub fn path(&self) -> &str {
        &self.location.path
    }
}

/// Resolve a `disk/path` argument into an opened filesystem
pub(crate) async fn open_target(input: &str, formatter: &Formatter) -> Result<Target, ExitCode> {
    let location = parse_disk_path(input).map_err(|e| {
        formatter.error(&e.to_string());
        ExitCode::UsageError
    })?;

    let manager = DiskManager::new().map_err(|e| {
        formatter.error(&format!("Failed to load disks: {e}"));
        ExitCode::GeneralError
    })?;

    let disk = match manager.get(&location.disk) {
        Ok(disk) => disk,
        Err(Error::DiskNotFound(name)) => {
            formatter.error(&format!("Disk '{name}' not found"));
            return Err(ExitCode::NotFound);
        }
        Err(e) => {
            formatter.error(&format!("Failed to load disks: {e}"));
            return Err(ExitCode::GeneralError);
        }
    };

    let fs = registry().resolve(&disk).await.map_err(|e| {
        formatter.error(&format!("Failed to open disk '{}': {e}", disk.name));
        match e {
            Error::Config(_) | Error::DriverNotFound(_) | Error::InvalidUrl(_) => {
                ExitCode::UsageError
            }
            _ => ExitCode::GeneralError,
        }
    })?;

    Ok(Target { location, fs })
}

/// Report a failed operation on an existing file
///
/// Failures carry no detail, so a missing file is told apart by probing.
pub(crate) async fn read_failure(target: &Target, action: &str, formatter: &Formatter) -> ExitCode {
    if target.fs.has(target.path()).await {
        formatter.error(&format!("Failed to {action} {}", target.location));
        ExitCode::BackendError
    } else {
        formatter.error(&format!("Not found: {}", target.location));
        ExitCode::NotFound
    }
}

/// Report a failed operation that creates or replaces a file
pub(crate) fn write_failure(target: &Target, action: &str, formatter: &Formatter) -> ExitCode {
    formatter.error(&format!("Failed to {action} {}", target.location));
    ExitCode::BackendError
}

/// Parse a `Name: value` or `Name=value` header argument
pub(crate) fn parse_header(input: &str) -> Result<(String, String), String> {
    let (name, value) = input
        .split_once(':')
        .or_else(|| input.split_once('='))
        .ok_or_else(|| format!("invalid header '{input}', expected Name: value"))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("invalid header '{input}', name is empty"));
    }
    if name.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()) {
        return Err(format!("invalid header name '{name}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Per-call write configuration from common upload flags
pub(crate) fn write_config(
    content_type: Option<String>,
    public: bool,
    headers: &[(String, String)],
) -> WriteConfig {
    let mut config = WriteConfig::new();
    if let Some(content_type) = content_type {
        config.set("contentType", content_type);
    }
    if public {
        config.set("visibility", ossfs_core::options::VISIBILITY_PUBLIC);
    }
    if !headers.is_empty() {
        let map: serde_json::Map<String, serde_json::Value> = headers
            .iter()
            .map(|(name, value)| (name.clone(), serde_json::Value::String(value.clone())))
            .collect();
        config.set("headers", map);
    }
    config
}
