//! url command - Print the public or a signed URL of a file

use clap::Args;
use jiff::Timestamp;
use ossfs_core::Expiration;
use serde::Serialize;

use super::open_target;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Print the public or a signed URL of a file
#[derive(Args, Debug)]
pub struct UrlArgs {
    /// File path (disk/path)
    pub path: String,

    /// Sign the URL for this many seconds
    #[arg(long, conflicts_with = "until")]
    pub expire: Option<u64>,

    /// Sign the URL until this instant (RFC 3339, e.g. 2030-01-01T00:00:00Z)
    #[arg(long)]
    pub until: Option<Timestamp>,
}

#[derive(Debug, Serialize)]
struct UrlOutput {
    path: String,
    url: String,
    signed: bool,
}

impl UrlArgs {
    fn expiration(&self) -> Option<Expiration> {
        self.expire
            .map(Expiration::Seconds)
            .or(self.until.map(Expiration::At))
    }
}

/// Execute the url command
pub async fn execute(args: UrlArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let target = match open_target(&args.path, &formatter).await {
        Ok(target) => target,
        Err(code) => return code,
    };

    let expiration = args.expiration();
    let result = match expiration {
        Some(expiration) => target.fs.temporary_url(target.path(), expiration).await,
        None => target.fs.url(target.path()),
    };

    let url = match result {
        Ok(url) => url,
        Err(_) if expiration.is_some() => {
            formatter.error(&format!(
                "Failed to sign a URL for {}; is the expiry in the future?",
                target.location
            ));
            return ExitCode::BackendError;
        }
        Err(_) => {
            formatter.error(&format!("Failed to build a URL for {}", target.location));
            return ExitCode::GeneralError;
        }
    };

    if formatter.is_json() {
        formatter.json(&UrlOutput {
            path: target.path().to_string(),
            url,
            signed: expiration.is_some(),
        });
    } else {
        formatter.println(&url);
    }
    ExitCode::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: UrlArgs,
    }

    #[test]
    fn test_expire_seconds() {
        let harness = Harness::try_parse_from(["url", "assets/a.png", "--expire", "600"]).unwrap();
        assert_eq!(harness.args.expiration(), Some(Expiration::Seconds(600)));
    }

    #[test]
    fn test_until_timestamp() {
        let harness =
            Harness::try_parse_from(["url", "assets/a.png", "--until", "2030-01-01T00:00:00Z"])
                .unwrap();
        let at: Timestamp = "2030-01-01T00:00:00Z".parse().unwrap();
        assert_eq!(harness.args.expiration(), Some(Expiration::At(at)));
    }

    #[test]
    fn test_public_url_without_expiry() {
        let harness = Harness::try_parse_from(["url", "assets/a.png"]).unwrap();
        assert_eq!(harness.args.expiration(), None);
    }

    #[test]
    fn test_expire_conflicts_with_until() {
        let result = Harness::try_parse_from([
            "url",
            "assets/a.png",
            "--expire",
            "1",
            "--until",
            "2030-01-01T00:00:00Z",
        ]);
        assert!(result.is_err());
    }
}
