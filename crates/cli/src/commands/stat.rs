//! stat command - Show file metadata
//!
//! Prints the normalized metadata record of a file together with its
//! visibility.

use clap::Args;
use jiff::Timestamp;
use ossfs_core::{Metadata, Visibility};
use serde::Serialize;

use super::{open_target, read_failure};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Show file metadata
#[derive(Args, Debug)]
pub struct StatArgs {
    /// File path (disk/path)
    pub path: String,
}

#[derive(Debug, Serialize)]
struct StatOutput {
    #[serde(flatten)]
    metadata: Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    visibility: Option<Visibility>,
}

/// Execute the stat command
pub async fn execute(args: StatArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let target = match open_target(&args.path, &formatter).await {
        Ok(target) => target,
        Err(code) => return code,
    };

    let metadata = match target.fs.get_metadata(target.path()).await {
        Ok(metadata) => metadata,
        Err(_) => return read_failure(&target, "stat", &formatter).await,
    };

    // Reading the ACL can be denied even when the object is readable
    let visibility = target.fs.get_visibility(target.path()).await.ok();

    let output = StatOutput {
        metadata,
        visibility,
    };

    if formatter.is_json() {
        formatter.json(&output);
    } else {
        for line in stat_lines(&output) {
            formatter.println(&line);
        }
    }

    ExitCode::Success
}

fn stat_lines(output: &StatOutput) -> Vec<String> {
    let meta = &output.metadata;
    let mut lines = vec![format!("{:<12}: {}", "Name", meta.path)];

    if let Some(size) = meta.size {
        lines.push(format!(
            "{:<12}: {} ({size} bytes)",
            "Size",
            humansize::format_size(size, humansize::BINARY)
        ));
    }
    if let Some(mimetype) = &meta.mimetype {
        lines.push(format!("{:<12}: {mimetype}", "Type"));
    }
    if let Some(modified) = meta
        .timestamp
        .and_then(|ts| Timestamp::from_second(ts).ok())
    {
        lines.push(format!(
            "{:<12}: {}",
            "Modified",
            modified.strftime("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    if let Some(visibility) = output.visibility {
        lines.push(format!("{:<12}: {visibility}", "Visibility"));
    }
    for (key, value) in &meta.metadata {
        lines.push(format!("{:<12}: {value}", format!("Meta {key}")));
    }
    lines
}
