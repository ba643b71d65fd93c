//! put command - Upload a local file
//!
//! Uploads a file from the local filesystem. The content type is taken from
//! `--content-type` or guessed from the file extension.

use std::path::{Path, PathBuf};

use clap::Args;
use ossfs_core::Metadata;
use serde::Serialize;

use super::{open_target, parse_header, write_config, write_failure};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Upload a local file
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Local file to upload
    pub source: PathBuf,

    /// Destination (disk/path, or disk/dir/ to keep the file name)
    pub target: String,

    /// Content type (guessed from the extension when omitted)
    #[arg(long)]
    pub content_type: Option<String>,

    /// Make the uploaded file publicly readable
    #[arg(long)]
    pub public: bool,

    /// Extra request header (repeatable, "Name: value")
    #[arg(long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Serialize)]
struct PutOutput {
    status: &'static str,
    source: String,
    target: String,
    size_bytes: u64,
    size_human: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
}

/// Execute the put command
pub async fn execute(args: PutArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let size = match tokio::fs::metadata(&args.source).await {
        Ok(meta) if meta.is_file() => meta.len(),
        Ok(_) => {
            formatter.error(&format!("{} is not a file", args.source.display()));
            return ExitCode::UsageError;
        }
        Err(e) => {
            formatter.error(&format!("Cannot read {}: {e}", args.source.display()));
            return ExitCode::NotFound;
        }
    };

    let mut target = match open_target(&args.target, &formatter).await {
        Ok(target) => target,
        Err(code) => return code,
    };
    target.location.path = destination_path(target.path(), &args.source);

    let content_type = args.content_type.clone().or_else(|| guess_content_type(&args.source));
    let config = write_config(content_type, args.public, &args.headers);

    let metadata: Metadata = match target
        .fs
        .write_file(target.path(), &args.source, &config)
        .await
    {
        Ok(metadata) => metadata,
        Err(_) => return write_failure(&target, "upload", &formatter),
    };

    let source = args.source.display().to_string();
    let size_human = humansize::format_size(size, humansize::BINARY);
    if formatter.is_json() {
        formatter.json(&PutOutput {
            status: "success",
            source,
            target: target.location.to_string(),
            size_bytes: size,
            size_human,
            content_type: metadata.mimetype,
        });
    } else {
        formatter.success(&format!("{source} -> {} ({size_human})", target.location));
    }

    ExitCode::Success
}

/// Logical destination; a directory target keeps the source file name
fn destination_path(target: &str, source: &Path) -> String {
    if !target.is_empty() && !target.ends_with('/') {
        return target.to_string();
    }
    let filename = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{target}{filename}")
}

fn guess_content_type(source: &Path) -> Option<String> {
    mime_guess::from_path(source)
        .first()
        .map(|m| m.essence_str().to_string())
}
