//! acl commands - Get or set file visibility
//!
//! Visibility is the two-valued view of an object ACL: `public` maps to
//! public-read, everything else reads back as `private`.

use clap::Subcommand;
use ossfs_core::{Visibility, VisibilityRecord};

use super::{open_target, read_failure};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Visibility subcommands
#[derive(Subcommand, Debug)]
pub enum AclCommands {
    /// Show the visibility of a file
    Get(GetArgs),

    /// Change the visibility of a file
    Set(SetArgs),
}

#[derive(clap::Args, Debug)]
pub struct GetArgs {
    /// File path (disk/path)
    pub path: String,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// File path (disk/path)
    pub path: String,

    /// New visibility ("public" or "private")
    pub visibility: Visibility,
}

/// Execute an acl subcommand
pub async fn execute(cmd: AclCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    match cmd {
        AclCommands::Get(args) => execute_get(args, &formatter).await,
        AclCommands::Set(args) => execute_set(args, &formatter).await,
    }
}

async fn execute_get(args: GetArgs, formatter: &Formatter) -> ExitCode {
    let target = match open_target(&args.path, formatter).await {
        Ok(target) => target,
        Err(code) => return code,
    };

    let visibility = match target.fs.get_visibility(target.path()).await {
        Ok(visibility) => visibility,
        Err(_) => return read_failure(&target, "read visibility of", formatter).await,
    };

    if formatter.is_json() {
        formatter.json(&VisibilityRecord {
            path: target.path().to_string(),
            visibility,
        });
    } else {
        formatter.println(&format!("{} {}", visibility, target.location));
    }
    ExitCode::Success
}

async fn execute_set(args: SetArgs, formatter: &Formatter) -> ExitCode {
    let target = match open_target(&args.path, formatter).await {
        Ok(target) => target,
        Err(code) => return code,
    };

    match target.fs.set_visibility(target.path(), args.visibility).await {
        Ok(record) => {
            if formatter.is_json() {
                formatter.json(&record);
            } else {
                formatter.success(&format!("{} is now {}", target.location, record.visibility));
            }
            ExitCode::Success
        }
        Err(_) => read_failure(&target, "change visibility of", formatter).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(subcommand)]
        cmd: AclCommands,
    }

    #[test]
    fn test_set_parses_visibility() {
        let harness = Harness::try_parse_from(["acl", "set", "assets/a.png", "public"]).unwrap();
        match harness.cmd {
            AclCommands::Set(args) => assert_eq!(args.visibility, Visibility::Public),
            AclCommands::Get(_) => panic!("expected set"),
        }
    }

    #[test]
    fn test_set_rejects_unknown_visibility() {
        assert!(Harness::try_parse_from(["acl", "set", "assets/a.png", "world"]).is_err());
    }
}
