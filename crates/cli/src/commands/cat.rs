//! cat command - Display file contents
//!
//! Streams the entire content of a file to stdout.

use clap::Args;
use tokio::io::AsyncWriteExt;

use super::{open_target, read_failure};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Display file contents
#[derive(Args, Debug)]
pub struct CatArgs {
    /// File path (disk/path)
    pub path: String,
}

/// Execute the cat command
pub async fn execute(args: CatArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let target = match open_target(&args.path, &formatter).await {
        Ok(target) => target,
        Err(code) => return code,
    };

    if target.path().is_empty() {
        formatter.error("A file path is required, e.g. disk/notes.txt");
        return ExitCode::UsageError;
    }

    let mut file = match target.fs.read_stream(target.path()).await {
        Ok(file) => file,
        Err(_) => return read_failure(&target, "read", &formatter).await,
    };

    // Written directly to stdout to keep binary data intact
    let mut stdout = tokio::io::stdout();
    let copied = tokio::io::copy(&mut file.stream, &mut stdout).await;
    if let Err(e) = match copied {
        Ok(_) => stdout.flush().await,
        Err(e) => Err(e),
    } {
        formatter.error(&format!("Failed to write to stdout: {e}"));
        return ExitCode::GeneralError;
    }

    ExitCode::Success
}
