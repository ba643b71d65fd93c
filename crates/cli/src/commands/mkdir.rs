//! mkdir command - Create a directory marker

use clap::Args;
use ossfs_core::ObjectEntry;

use super::{open_target, write_config, write_failure};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Create a directory marker
#[derive(Args, Debug)]
pub struct MkdirArgs {
    /// Directory path (disk/dir)
    pub path: String,

    /// Make the marker publicly readable
    #[arg(long)]
    pub public: bool,
}

/// Execute the mkdir command
pub async fn execute(args: MkdirArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let target = match open_target(&args.path, &formatter).await {
        Ok(target) => target,
        Err(code) => return code,
    };
    if target.path().trim_matches('/').is_empty() {
        formatter.error("A directory name is required");
        return ExitCode::UsageError;
    }

    let config = write_config(None, args.public, &[]);
    let entry: ObjectEntry = match target.fs.create_dir(target.path(), &config).await {
        Ok(entry) => entry,
        Err(_) => return write_failure(&target, "create directory", &formatter),
    };

    if formatter.is_json() {
        formatter.json(&entry);
    } else {
        formatter.success(&format!("Created {}/{}/", target.location.disk, entry.path));
    }
    ExitCode::Success
}
