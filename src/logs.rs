// ABOUTME: Location of orca's own log files and tail reading for the in-app log panel

use std::io;
use std::path::{Path, PathBuf};

/// Lines the log panel shows unless asked for a different tail.
pub const DEFAULT_TAIL_LINES: usize = 1000;

pub fn log_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("logs")
}

/// One file per run, named after the start time.
pub fn new_log_file(data_dir: &Path) -> PathBuf {
    log_dir(data_dir).join(format!("orca-{}.log", chrono::Local::now().format("%Y%m%d-%H%M%S")))
}

/// Last `tail_lines` lines of the log (default [`DEFAULT_TAIL_LINES`]), joined with newlines.
pub async fn read_app_log(path: &Path, tail_lines: Option<usize>) -> io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(tail_lines.unwrap_or(DEFAULT_TAIL_LINES));
    Ok(lines[start..].join("\n"))
}
