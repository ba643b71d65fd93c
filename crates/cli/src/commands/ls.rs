//! ls command - List directory contents
//!
//! Lists the files and subdirectories under a directory of a disk. With
//! `--recursive` subdirectories are descended depth-first.

use clap::Args;
use jiff::Timestamp;
use ossfs_core::ObjectEntry;
use serde::Serialize;

use super::open_target;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// List directory contents
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Directory path (disk[/dir])
    pub path: String,

    /// List recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Summarize output (show totals only)
    #[arg(long)]
    pub summarize: bool,
}

/// Output structure for ls command (JSON format)
#[derive(Debug, Serialize)]
struct LsOutput {
    items: Vec<ObjectEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
}

#[derive(Debug, Serialize)]
struct Summary {
    total_files: usize,
    total_dirs: usize,
    total_size_bytes: u64,
    total_size_human: String,
}

impl Summary {
    fn of(entries: &[ObjectEntry]) -> Self {
        let total_size_bytes = entries.iter().filter_map(|e| e.size).sum();
        Self {
            total_files: entries.iter().filter(|e| !e.is_dir()).count(),
            total_dirs: entries.iter().filter(|e| e.is_dir()).count(),
            total_size_bytes,
            total_size_human: humansize::format_size(total_size_bytes, humansize::BINARY),
        }
    }
}

/// Execute the ls command
pub async fn execute(args: LsArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let target = match open_target(&args.path, &formatter).await {
        Ok(target) => target,
        Err(code) => return code,
    };

    let entries = match target.fs.list_contents(target.path(), args.recursive).await {
        Ok(entries) => entries,
        Err(_) => {
            formatter.error(&format!("Failed to list {}", target.location));
            return ExitCode::BackendError;
        }
    };

    let summary = args.summarize.then(|| Summary::of(&entries));

    if formatter.is_json() {
        formatter.json(&LsOutput {
            items: entries,
            summary,
        });
        return ExitCode::Success;
    }

    for entry in &entries {
        formatter.println(&entry_line(entry, &formatter));
    }
    if let Some(summary) = summary {
        formatter.println(&format!(
            "\nTotal: {} files, {} directories, {}",
            summary.total_files, summary.total_dirs, summary.total_size_human
        ));
    }

    ExitCode::Success
}

/// Listing date column; blank when the timestamp is unknown
fn format_date(timestamp: i64) -> String {
    if timestamp == 0 {
        return " ".repeat(19);
    }
    Timestamp::from_second(timestamp)
        .map(|t| t.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| " ".repeat(19))
}

fn entry_line(entry: &ObjectEntry, formatter: &Formatter) -> String {
    let date = formatter.dim(&format!("[{}]", format_date(entry.timestamp)));
    if entry.is_dir() {
        format!("{date} {:>10} {}", "DIR", formatter.dir(&format!("{}/", entry.path)))
    } else {
        let size = humansize::format_size(entry.size.unwrap_or(0), humansize::BINARY);
        format!("{date} {size:>10} {}", entry.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> Formatter {
        Formatter::new(OutputConfig {
            no_color: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_entry_line_file() {
        let entry = ObjectEntry::file("d/f.txt", 1_704_164_645, 2048);
        insta::assert_snapshot!(entry_line(&entry, &plain()), @"[2024-01-02 03:04:05]      2 KiB d/f.txt");
    }

    #[test]
    fn test_entry_line_dir_without_timestamp() {
        let entry = ObjectEntry::dir("d/sub", 0);
        insta::assert_snapshot!(entry_line(&entry, &plain()), @"[                   ]        DIR d/sub/");
    }

    #[test]
    fn test_summary_counts() {
        let entries = vec![
            ObjectEntry::file("a.txt", 1, 1024),
            ObjectEntry::dir("d", 0),
            ObjectEntry::file("d/b.txt", 1, 1024),
        ];
        let summary = Summary::of(&entries);
        assert_eq!(summary.total_files, 2);
        assert_eq!(summary.total_dirs, 1);
        assert_eq!(summary.total_size_bytes, 2048);
        assert_eq!(summary.total_size_human, "2 KiB");
    }
}
