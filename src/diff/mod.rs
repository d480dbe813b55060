// ABOUTME: Unified diff parsing into per-file hunks for the diff view

pub mod parser;

pub use parser::{parse_unified_diff, DiffLine, DiffLineKind, DiffStats, FileChange, FileDiff, Hunk};
