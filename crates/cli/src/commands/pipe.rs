//! pipe command - Stream stdin to a file
//!
//! Reads from stdin and uploads it as one file. Useful for piping output
//! from other commands.

use clap::Args;
use serde::Serialize;

use super::{open_target, parse_header, write_config, write_failure};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Stream stdin to a file
#[derive(Args, Debug)]
pub struct PipeArgs {
    /// Destination path (disk/path)
    pub target: String,

    /// Content type for the uploaded file
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
struct PipeOutput {
    status: &'static str,
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
}

/// Execute the pipe command
pub async fn execute(args: PipeArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let target = match open_target(&args.target, &formatter).await {
        Ok(target) => target,
        Err(code) => return code,
    };

    if target.path().is_empty() || target.path().ends_with('/') {
        formatter.error("A file path is required for pipe, e.g. disk/logs/today.txt");
        return ExitCode::UsageError;
    }

    let config = write_config(args.content_type, args.public, &args.headers);
    let stdin = Box::new(tokio::io::stdin());

    match target.fs.write_stream(target.path(), stdin, &config).await {
        Ok(metadata) => {
            if formatter.is_json() {
                formatter.json(&PipeOutput {
                    status: "success",
                    target: target.location.to_string(),
                    size_bytes: metadata.size,
                });
            } else {
                let size = humansize::format_size(metadata.size.unwrap_or(0), humansize::BINARY);
                formatter.success(&format!("Uploaded to {} ({size})", target.location));
            }
            ExitCode::Success
        }
        Err(_) => write_failure(&target, "upload", &formatter),
    }
}
