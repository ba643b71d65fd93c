//! Disk management commands
//!
//! Disks are named configuration blocks: a bucket, an optional key prefix,
//! and the endpoint and credentials to reach it.

use clap::Subcommand;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use serde::Serialize;

use ossfs_core::{DiskConfig, DiskManager, Error, OSS_DRIVER};

use super::parse_header;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Disk subcommands
#[derive(Subcommand, Debug)]
pub enum DiskCommands {
    /// Add or update a disk
    Set(SetArgs),

    /// List all configured disks
    List(ListArgs),

    /// Remove a disk
    Remove(RemoveArgs),
}

/// Arguments for the `disk set` command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Disk name (e.g., "assets", "backups")
    pub name: String,

    /// OSS endpoint (e.g., "oss-cn-hangzhou.aliyuncs.com")
    pub endpoint: String,

    /// Bucket name
    pub bucket: String,

    /// Access key ID
    pub access_id: String,

    /// Access key secret
    pub access_key: String,

    /// Key prefix every path is rooted at
    #[arg(long)]
    pub prefix: Option<String>,

    /// Custom domain bound to the bucket
    #[arg(long)]
    pub cname: Option<String>,

    /// Region (derived from the endpoint when omitted)
    #[arg(long)]
    pub region: Option<String>,

    /// Header sent with every upload (repeatable, "Name: value")
    #[arg(long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Storage driver
    #[arg(long, default_value = OSS_DRIVER)]
    pub driver: String,
}

/// Arguments for the `disk list` command
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show full details in a table
    #[arg(short, long)]
    pub long: bool,
}

/// Arguments for the `disk remove` command
#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Name of the disk to remove
    pub name: String,
}

/// Disk information for JSON output (without credentials)
#[derive(Debug, Serialize)]
struct DiskInfo {
    name: String,
    driver: String,
    endpoint: String,
    bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<String>,
}

impl From<&DiskConfig> for DiskInfo {
    fn from(disk: &DiskConfig) -> Self {
        Self {
            name: disk.name.clone(),
            driver: disk.driver.clone(),
            endpoint: disk.endpoint.clone(),
            bucket: disk.bucket.clone(),
            prefix: disk.prefix.clone(),
            cname: disk.cname.clone(),
            region: disk.region.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DiskListOutput {
    disks: Vec<DiskInfo>,
}

#[derive(Debug, Serialize)]
struct DiskOperationOutput {
    success: bool,
    disk: String,
    message: String,
}

/// Execute a disk subcommand
pub async fn execute(cmd: DiskCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let manager = match DiskManager::new() {
        Ok(manager) => manager,
        Err(e) => {
            formatter.error(&format!("Failed to load disks: {e}"));
            return ExitCode::GeneralError;
        }
    };

    match cmd {
        DiskCommands::Set(args) => execute_set(args, &manager, &formatter),
        DiskCommands::List(args) => execute_list(args, &manager, &formatter),
        DiskCommands::Remove(args) => execute_remove(args, &manager, &formatter),
    }
}

fn disk_from_args(args: SetArgs) -> DiskConfig {
    let mut disk = DiskConfig::new(
        args.name,
        args.endpoint,
        args.bucket,
        args.access_id,
        args.access_key,
    );
    disk.driver = args.driver;
    disk.prefix = args.prefix.filter(|p| !p.is_empty());
    disk.cname = args.cname.filter(|c| !c.is_empty());
    disk.region = args.region.filter(|r| !r.is_empty());
    disk.headers = args.headers.into_iter().collect();
    disk
}

fn execute_set(args: SetArgs, manager: &DiskManager, formatter: &Formatter) -> ExitCode {
    let disk = disk_from_args(args);
    let name = disk.name.clone();

    match manager.set(disk) {
        Ok(()) => {
            let message = format!("Disk '{name}' configured successfully");
            if formatter.is_json() {
                formatter.json(&DiskOperationOutput {
                    success: true,
                    disk: name,
                    message,
                });
            } else {
                formatter.success(&message);
            }
            ExitCode::Success
        }
        Err(Error::Config(msg)) => {
            formatter.error(&msg);
            ExitCode::UsageError
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::GeneralError
        }
    }
}

fn execute_list(args: ListArgs, manager: &DiskManager, formatter: &Formatter) -> ExitCode {
    let disks = match manager.list() {
        Ok(disks) => disks,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::GeneralError;
        }
    };

    if formatter.is_json() {
        formatter.json(&DiskListOutput {
            disks: disks.iter().map(DiskInfo::from).collect(),
        });
    } else if disks.is_empty() {
        formatter.println("No disks configured.");
    } else if args.long {
        formatter.println(&disk_table(&disks).to_string());
    } else {
        for disk in &disks {
            formatter.println(&format!("{:<12} {}/{}", disk.name, disk.bucket, disk.prefix()));
        }
    }
    ExitCode::Success
}

fn disk_table(disks: &[DiskConfig]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Name", "Driver", "Endpoint", "Bucket", "Prefix", "Domain"]);

    for disk in disks {
        table.add_row(vec![
            disk.name.as_str(),
            disk.driver.as_str(),
            disk.endpoint.as_str(),
            disk.bucket.as_str(),
            disk.prefix(),
            disk.cname.as_deref().unwrap_or("-"),
        ]);
    }
    table
}

fn execute_remove(args: RemoveArgs, manager: &DiskManager, formatter: &Formatter) -> ExitCode {
    match manager.remove(&args.name) {
        Ok(()) => {
            let message = format!("Disk '{}' removed successfully", args.name);
            if formatter.is_json() {
                formatter.json(&DiskOperationOutput {
                    success: true,
                    disk: args.name,
                    message,
                });
            } else {
                formatter.success(&message);
            }
            ExitCode::Success
        }
        Err(Error::DiskNotFound(_)) => {
            formatter.error(&format!("Disk '{}' not found", args.name));
            ExitCode::NotFound
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::GeneralError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_args() -> SetArgs {
        SetArgs {
            name: "assets".to_string(),
            endpoint: "oss-cn-hangzhou.aliyuncs.com".to_string(),
            bucket: "my-bucket".to_string(),
            access_id: "id".to_string(),
            access_key: "secret".to_string(),
            prefix: Some("static".to_string()),
            cname: Some(String::new()),
            region: None,
            headers: vec![("Cache-Control".to_string(), "max-age=60".to_string())],
            driver: OSS_DRIVER.to_string(),
        }
    }

    #[test]
    fn test_disk_from_args() {
        let disk = disk_from_args(set_args());
        assert_eq!(disk.name, "assets");
        assert_eq!(disk.prefix(), "static");
        assert!(disk.cname.is_none());
        assert_eq!(disk.headers["Cache-Control"], "max-age=60");
    }

    #[test]
    fn test_disk_info_hides_credentials() {
        let disk = disk_from_args(set_args());
        let json = serde_json::to_value(DiskInfo::from(&disk)).unwrap();
        insta::assert_json_snapshot!(json, @r#"
        {
          "bucket": "my-bucket",
          "driver": "oss",
          "endpoint": "oss-cn-hangzhou.aliyuncs.com",
          "name": "assets",
          "prefix": "static"
        }
        "#);
    }

    #[test]
    fn test_disk_table_lists_every_disk() {
        let disk = disk_from_args(set_args());
        let rendered = disk_table(&[disk]).to_string();
        assert!(rendered.contains("assets"));
        assert!(rendered.contains("my-bucket"));
        assert!(!rendered.contains("secret"));
    }
}
