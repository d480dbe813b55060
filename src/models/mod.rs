// ABOUTME: Core data models mirrored from the backend: groups, sessions, worktrees, PRs, issues and startup checks

pub mod group;
pub mod issue;
pub mod pr;
pub mod session;
pub mod version;
pub mod worktree;

pub use group::{Group, GroupSettings, MergeWorkflow};
pub use issue::{GitHubIssue, GitHubLabel};
pub use pr::{PrInfo, PrState};
pub use session::{AttentionCounts, AttentionStatus, Session, SessionStatus, SessionSummary};
pub use version::{Prerequisite, VersionCheck, SUPPORTED_AGENT_DECK_VERSION};
pub use worktree::{MergeResult, Worktree, WorktreeStatus};
