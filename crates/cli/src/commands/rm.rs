//! rm command - Remove files or directories
//!
//! Removes single files, or with `--recursive` everything under a directory
//! in one batch delete.

use clap::Args;
use serde::Serialize;

use super::{open_target, read_failure};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Remove files or directories
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Path(s) to remove (disk/path)
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Remove a directory and everything under it
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    status: &'static str,
    deleted: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failed: Vec<String>,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let mut deleted = Vec::new();
    let mut failed = Vec::new();
    let mut exit_code = ExitCode::Success;

    for path in &args.paths {
        let target = match open_target(path, &formatter).await {
            Ok(target) => target,
            Err(code @ ExitCode::UsageError) => return code,
            Err(code) => {
                failed.push(path.clone());
                exit_code = code;
                continue;
            }
        };

        let result = if args.recursive {
            target.fs.delete_dir(target.path()).await
        } else {
            target.fs.delete(target.path()).await
        };

        match result {
            Ok(()) => deleted.push(target.location.to_string()),
            Err(_) if args.recursive => {
                formatter.error(&format!("Failed to remove {}", target.location));
                failed.push(target.location.to_string());
                exit_code = ExitCode::BackendError;
            }
            Err(_) => {
                exit_code = read_failure(&target, "remove", &formatter).await;
                failed.push(target.location.to_string());
            }
        }
    }

    if formatter.is_json() {
        formatter.json(&RmOutput {
            status: if failed.is_empty() { "success" } else { "partial" },
            deleted,
            failed,
        });
    } else if !deleted.is_empty() {
        formatter.success(&format!("Removed {}.", deleted.join(", ")));
    }

    exit_code
}
