//! cp command - Copy a file
//!
//! Copies within one disk with a server-side copy. Between disks the source
//! is streamed down and written to the destination.

use clap::Args;
use ossfs_core::WriteConfig;
use ossfs_core::path::path_info;
use serde::Serialize;

use super::{Target, open_target, read_failure, write_failure};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Copy a file
#[derive(Args, Debug)]
pub struct CpArgs {
    /// Source file (disk/path)
    pub source: String,

    /// Destination (disk/path, or disk/dir/ to keep the file name)
    pub target: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TransferOutput {
    pub status: &'static str,
    pub source: String,
    pub target: String,
}

/// Execute the cp command
pub async fn execute(args: CpArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let (source, target) = match open_pair(&args.source, &args.target, &formatter).await {
        Ok(pair) => pair,
        Err(code) => return code,
    };

    if let Err(code) = copy_between(&source, &target, &formatter).await {
        return code;
    }

    report(&source, &target, &formatter);
    ExitCode::Success
}

/// Open source and destination, filling in a directory destination's name
pub(crate) async fn open_pair(
    source: &str,
    target: &str,
    formatter: &Formatter,
) -> Result<(Target, Target), ExitCode> {
    let source = open_target(source, formatter).await?;
    if source.path().is_empty() || source.path().ends_with('/') {
        formatter.error(&format!("{} is not a file path", source.location));
        return Err(ExitCode::UsageError);
    }

    let mut target = open_target(target, formatter).await?;
    target.location.path = destination_path(target.path(), source.path());

    Ok((source, target))
}

/// Copy `source` to `target`, server-side when both are on the same disk
pub(crate) async fn copy_between(
    source: &Target,
    target: &Target,
    formatter: &Formatter,
) -> Result<(), ExitCode> {
    if source.location.disk == target.location.disk {
        return match source.fs.copy(source.path(), target.path()).await {
            Ok(()) => Ok(()),
            Err(_) => Err(read_failure(source, "copy", formatter).await),
        };
    }

    let file = match source.fs.read_stream(source.path()).await {
        Ok(file) => file,
        Err(_) => return Err(read_failure(source, "read", formatter).await),
    };

    match target
        .fs
        .write_stream(target.path(), file.stream, &WriteConfig::new())
        .await
    {
        Ok(_) => Ok(()),
        Err(_) => Err(write_failure(target, "write", formatter)),
    }
}

pub(crate) fn report(source: &Target, target: &Target, formatter: &Formatter) {
    if formatter.is_json() {
        formatter.json(&TransferOutput {
            status: "success",
            source: source.location.to_string(),
            target: target.location.to_string(),
        });
    } else {
        formatter.success(&format!("{} -> {}", source.location, target.location));
    }
}

/// Destination path; a directory destination keeps the source's base name
fn destination_path(target: &str, source: &str) -> String {
    if !target.is_empty() && !target.ends_with('/') {
        return target.to_string();
    }
    format!("{target}{}", path_info(source).basename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_path() {
        assert_eq!(destination_path("b/c.txt", "a/c.txt"), "b/c.txt");
        assert_eq!(destination_path("b/", "a/c.txt"), "b/c.txt");
        assert_eq!(destination_path("", "a/c.txt"), "c.txt");
    }
}
