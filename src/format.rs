// ABOUTME: Display formatting helpers for paths, relative timestamps and width-limited text

use std::path::Path;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Replace the home directory prefix with `~`.
pub fn format_path(path: &str, home: Option<&Path>) -> String {
    let Some(home) = home else {
        return path.to_string();
    };
    let home = home.to_string_lossy();
    let home = home.trim_end_matches('/');
    if home.is_empty() {
        return path.to_string();
    }

    if path == home {
        "~".to_string()
    } else if let Some(rest) = path.strip_prefix(home) {
        if rest.starts_with('/') {
            format!("~{}", rest)
        } else {
            // e.g. /home/al vs /home/alice
            path.to_string()
        }
    } else {
        path.to_string()
    }
}

/// `format_path` against the current user's home directory.
pub fn display_path(path: &str) -> String {
    format_path(path, dirs::home_dir().as_deref())
}

/// Keep only the last `max_segments` components of a path.
pub fn shorten_path(path: &str, max_segments: usize) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if max_segments == 0 || segments.len() <= max_segments {
        return path.to_string();
    }
    format!("…/{}", segments[segments.len() - max_segments..].join("/"))
}

/// Human relative time between a unix timestamp and `now` (both in seconds).
pub fn format_relative_time(timestamp: i64, now: i64) -> String {
    if timestamp <= 0 {
        return "never".to_string();
    }
    let seconds = now - timestamp;
    if seconds < 60 {
        return "just now".to_string();
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    let days = hours / 24;
    if days < 30 {
        return format!("{}d ago", days);
    }
    format!("{}mo ago", days / 30)
}

pub fn relative_time_from_now(timestamp: i64) -> String {
    format_relative_time(timestamp, chrono::Utc::now().timestamp())
}

/// Truncate to a display width, ending with `…` when anything was cut.
pub fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_path_replaces_home() {
        let home = PathBuf::from("/Users/alice");
        assert_eq!(format_path("/Users/alice/src/app", Some(&home)), "~/src/app");
        assert_eq!(format_path("/Users/alice", Some(&home)), "~");
        assert_eq!(format_path("/opt/app", Some(&home)), "/opt/app");
    }

    #[test]
    fn test_format_path_does_not_match_sibling_prefix() {
        let home = PathBuf::from("/home/al");
        assert_eq!(format_path("/home/alice/src", Some(&home)), "/home/alice/src");
    }

    #[test]
    fn test_format_path_without_home() {
        assert_eq!(format_path("/a/b", None), "/a/b");
    }

    #[test]
    fn test_shorten_path() {
        assert_eq!(shorten_path("/Users/alice/src/orca/app", 2), "…/orca/app");
        assert_eq!(shorten_path("~/src", 2), "~/src");
        assert_eq!(shorten_path("/a/b/c", 0), "/a/b/c");
    }

    #[test]
    fn test_relative_time_buckets() {
        let now = 1_700_000_000;
        assert_eq!(format_relative_time(now - 5, now), "just now");
        assert_eq!(format_relative_time(now + 30, now), "just now");
        assert_eq!(format_relative_time(now - 60, now), "1m ago");
        assert_eq!(format_relative_time(now - 59 * 60, now), "59m ago");
        assert_eq!(format_relative_time(now - 3 * 3600, now), "3h ago");
        assert_eq!(format_relative_time(now - 2 * 86400, now), "2d ago");
        assert_eq!(format_relative_time(now - 65 * 86400, now), "2mo ago");
        assert_eq!(format_relative_time(0, now), "never");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 6), "hello…");
        assert_eq!(truncate("hello", 0), "");
    }
}
