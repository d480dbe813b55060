// ABOUTME: Parser turning `git diff` unified output into structured files, hunks and numbered lines

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HUNK_HEADER: Regex =
        Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@(.*)$").expect("valid hunk header regex");
    static ref DIFF_GIT_HEADER: Regex = Regex::new(r"^diff --git a/(.+) b/(.+)$").expect("valid diff header regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChange {
    Added,
    Deleted,
    Modified,
    Renamed,
}

impl FileChange {
    pub fn symbol(&self) -> &'static str {
        match self {
            FileChange::Added => "A",
            FileChange::Deleted => "D",
            FileChange::Modified => "M",
            FileChange::Renamed => "R",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLineKind {
    Context,
    Added,
    Removed,
    /// `\ No newline at end of file`
    NoNewline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: DiffLineKind,
    pub content: String,
    pub old_lineno: Option<u32>,
    pub new_lineno: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub header: String,
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    pub lines: Vec<DiffLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub old_path: String,
    pub new_path: String,
    pub status: FileChange,
    pub hunks: Vec<Hunk>,
    pub is_binary: bool,
}

impl FileDiff {
    fn new(old_path: String, new_path: String) -> Self {
        Self {
            old_path,
            new_path,
            status: FileChange::Modified,
            hunks: Vec::new(),
            is_binary: false,
        }
    }

    pub fn additions(&self) -> usize {
        self.count(DiffLineKind::Added)
    }

    pub fn deletions(&self) -> usize {
        self.count(DiffLineKind::Removed)
    }

    fn count(&self, kind: DiffLineKind) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| h.lines.iter())
            .filter(|l| l.kind == kind)
            .count()
    }

    pub fn display_path(&self) -> String {
        match self.status {
            FileChange::Renamed => format!("{} → {}", self.old_path, self.new_path),
            FileChange::Deleted => self.old_path.clone(),
            _ => self.new_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub files: usize,
    pub additions: usize,
    pub deletions: usize,
}

impl DiffStats {
    pub fn from_files(files: &[FileDiff]) -> Self {
        files.iter().fold(DiffStats::default(), |mut acc, f| {
            acc.files += 1;
            acc.additions += f.additions();
            acc.deletions += f.deletions();
            acc
        })
    }
}

/// Parse the full text of a unified diff. Anything before the first
/// `diff --git` line is ignored.
pub fn parse_unified_diff(text: &str) -> Vec<FileDiff> {
    let mut files: Vec<FileDiff> = Vec::new();
    let mut current: Option<FileDiff> = None;
    let mut hunk: Option<Hunk> = None;
    let mut old_line = 0u32;
    let mut new_line = 0u32;

    for line in text.lines() {
        if let Some(caps) = DIFF_GIT_HEADER.captures(line) {
            if let Some(mut file) = current.take() {
                if let Some(h) = hunk.take() {
                    file.hunks.push(h);
                }
                files.push(file);
            }
            current = Some(FileDiff::new(caps[1].to_string(), caps[2].to_string()));
            continue;
        }

        let Some(file) = current.as_mut() else {
            continue;
        };

        if let Some(caps) = HUNK_HEADER.captures(line) {
            if let Some(h) = hunk.take() {
                file.hunks.push(h);
            }
            let number = |idx: usize, default: u32| {
                caps.get(idx)
                    .and_then(|m| m.as_str().parse::<u32>().ok())
                    .unwrap_or(default)
            };
            let old_start = number(1, 0);
            let new_start = number(3, 0);
            old_line = old_start;
            new_line = new_start;
            hunk = Some(Hunk {
                header: line.to_string(),
                old_start,
                old_lines: number(2, 1),
                new_start,
                new_lines: number(4, 1),
                lines: Vec::new(),
            });
            continue;
        }

        if let Some(h) = hunk.as_mut() {
            if let Some(rest) = line.strip_prefix('+') {
                h.lines.push(DiffLine {
                    kind: DiffLineKind::Added,
                    content: rest.to_string(),
                    old_lineno: None,
                    new_lineno: Some(new_line),
                });
                new_line = new_line.saturating_add(1);
                continue;
            }
            if let Some(rest) = line.strip_prefix('-') {
                h.lines.push(DiffLine {
                    kind: DiffLineKind::Removed,
                    content: rest.to_string(),
                    old_lineno: Some(old_line),
                    new_lineno: None,
                });
                old_line = old_line.saturating_add(1);
                continue;
            }
            if let Some(rest) = line.strip_prefix(' ') {
                h.lines.push(DiffLine {
                    kind: DiffLineKind::Context,
                    content: rest.to_string(),
                    old_lineno: Some(old_line),
                    new_lineno: Some(new_line),
                });
                old_line = old_line.saturating_add(1);
                new_line = new_line.saturating_add(1);
                continue;
            }
            if line.starts_with('\\') {
                h.lines.push(DiffLine {
                    kind: DiffLineKind::NoNewline,
                    content: line.trim_start_matches('\\').trim().to_string(),
                    old_lineno: None,
                    new_lineno: None,
                });
                continue;
            }
            if line.is_empty() {
                // Some tools strip the leading space from blank context lines.
                h.lines.push(DiffLine {
                    kind: DiffLineKind::Context,
                    content: String::new(),
                    old_lineno: Some(old_line),
                    new_lineno: Some(new_line),
                });
                old_line = old_line.saturating_add(1);
                new_line = new_line.saturating_add(1);
                continue;
            }
        }

        // Extended header lines between `diff --git` and the first hunk.
        if line.starts_with("--- ") {
            if line == "--- /dev/null" {
                file.status = FileChange::Added;
            }
        } else if line.starts_with("+++ ") {
            if line == "+++ /dev/null" {
                file.status = FileChange::Deleted;
            }
        } else if line.starts_with("new file mode") {
            file.status = FileChange::Added;
        } else if line.starts_with("deleted file mode") {
            file.status = FileChange::Deleted;
        } else if let Some(from) = line.strip_prefix("rename from ") {
            file.old_path = from.to_string();
            file.status = FileChange::Renamed;
        } else if let Some(to) = line.strip_prefix("rename to ") {
            file.new_path = to.to_string();
            file.status = FileChange::Renamed;
        } else if line.starts_with("Binary files ") && line.ends_with(" differ") {
            file.is_binary = true;
        }
    }

    if let Some(mut file) = current.take() {
        if let Some(h) = hunk.take() {
            file.hunks.push(h);
        }
        files.push(file);
    }

    files
}
