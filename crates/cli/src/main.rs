//! ossfs - filesystem-style access to Aliyun OSS buckets
//!
//! Files live on named disks, each a bucket and key prefix configured with
//! `ossfs disk set`.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use ossfs::commands::{self, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // --debug wins over RUST_LOG; otherwise only warnings reach stderr
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let exit_code = commands::execute(cli).await;
    std::process::exit(exit_code.as_i32());
}
