//! mv command - Move a file
//!
//! A rename within one disk; between disks a copy followed by deleting the
//! source. When the delete fails both copies remain and the move is
//! reported as failed.

use clap::Args;

use super::cp::{copy_between, open_pair, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Move a file
#[derive(Args, Debug)]
pub struct MvArgs {
    /// Source file (disk/path)
    pub source: String,

    /// Destination (disk/path, or disk/dir/ to keep the file name)
    pub target: String,
}

/// Execute the mv command
pub async fn execute(args: MvArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let (source, target) = match open_pair(&args.source, &args.target, &formatter).await {
        Ok(pair) => pair,
        Err(code) => return code,
    };

    if source.location.disk == target.location.disk {
        if source.fs.rename(source.path(), target.path()).await.is_err() {
            if source.fs.has(source.path()).await && target.fs.has(target.path()).await {
                formatter.warning(&format!(
                    "{} was copied to {} but could not be removed",
                    source.location, target.location
                ));
                return ExitCode::BackendError;
            }
            return super::read_failure(&source, "move", &formatter).await;
        }
    } else {
        if let Err(code) = copy_between(&source, &target, &formatter).await {
            return code;
        }
        if source.fs.delete(source.path()).await.is_err() {
            formatter.warning(&format!(
                "{} was copied to {} but could not be removed",
                source.location, target.location
            ));
            return ExitCode::BackendError;
        }
    }

    report(&source, &target, &formatter);
    ExitCode::Success
}
