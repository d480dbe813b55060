// ABOUTME: Backend collaborator boundary: the command surface the views call and the push-event channel
// All git, tmux, GitHub and persistence work happens behind this trait in a separate process

pub mod client;
pub mod error;
pub mod protocol;

pub use client::RpcClient;
pub use error::BackendError;
pub use protocol::{BackendEvent, Command, CreatePrRequest, CreateSessionRequest};

use async_trait::async_trait;

use crate::models::{
    AttentionCounts, GitHubIssue, Group, GroupSettings, MergeResult, PrInfo, Prerequisite, Session, SessionSummary,
    VersionCheck, Worktree, WorktreeStatus,
};

pub type BackendResult<T> = Result<T, BackendError>;

#[async_trait]
pub trait Backend: Send + Sync {
    // Environment
    async fn check_agent_deck_version(&self) -> BackendResult<VersionCheck>;
    async fn check_prerequisites(&self) -> BackendResult<Vec<Prerequisite>>;

    // Groups
    async fn get_groups(&self) -> BackendResult<Vec<Group>>;
    async fn create_group(&self, name: &str, default_path: &str) -> BackendResult<()>;
    async fn set_group_settings(&self, group_path: &str, settings: GroupSettings) -> BackendResult<()>;

    // Sessions
    async fn get_sessions(&self, group_path: Option<String>) -> BackendResult<Vec<Session>>;
    /// Returns once the backend accepted the request. The outcome arrives as
    /// `SessionCreated` or `SessionCreateFailed` carrying the placeholder id.
    async fn create_session(&self, request: CreateSessionRequest) -> BackendResult<()>;
    /// Background removal; the outcome arrives as a push event.
    async fn remove_session(&self, session_id: &str, remove_worktree: bool) -> BackendResult<()>;
    async fn restart_session(&self, session_id: &str) -> BackendResult<()>;
    async fn rename_session(&self, session_id: &str, new_title: &str) -> BackendResult<()>;
    async fn move_session(&self, session_id: &str, new_group_path: &str) -> BackendResult<()>;
    async fn get_session_summary(&self, session_id: &str) -> BackendResult<SessionSummary>;
    async fn get_attention_counts(&self) -> BackendResult<AttentionCounts>;
    /// Sessions whose status and transcript say they are waiting on the user or failed.
    async fn get_attention_sessions(&self) -> BackendResult<Vec<Session>>;

    // Worktrees and branches
    async fn list_worktrees(&self, repo_path: &str) -> BackendResult<Vec<Worktree>>;
    async fn add_worktree(&self, repo_path: &str, branch: &str) -> BackendResult<String>;
    async fn remove_worktree(&self, repo_path: &str, worktree_path: &str) -> BackendResult<()>;
    async fn check_worktree_status(&self, repo_path: &str, worktree_path: &str, branch: &str)
        -> BackendResult<WorktreeStatus>;
    async fn get_default_branch(&self, repo_path: &str) -> BackendResult<String>;
    async fn get_branch_diff(&self, worktree_path: &str, branch: &str) -> BackendResult<String>;
    async fn rebase_worktree(&self, worktree_path: &str, main_branch: &str) -> BackendResult<()>;
    async fn push_branch(&self, worktree_path: &str, branch: &str) -> BackendResult<()>;
    async fn try_merge_branch(&self, repo_path: &str, branch: &str, main_branch: &str) -> BackendResult<MergeResult>;
    async fn abort_merge(&self, worktree_path: &str) -> BackendResult<()>;

    // Pull requests
    async fn create_pr(&self, request: CreatePrRequest) -> BackendResult<PrInfo>;
    async fn check_pr_status(&self, repo_path: &str, branch: &str) -> BackendResult<PrInfo>;

    // Issues
    async fn list_issues(&self, repo_path: &str) -> BackendResult<Vec<GitHubIssue>>;
    async fn get_issue(&self, repo_path: &str, issue_number: u64) -> BackendResult<GitHubIssue>;
    async fn create_issue(&self, repo_path: &str, title: &str, body: &str) -> BackendResult<GitHubIssue>;
    async fn update_issue(
        &self,
        repo_path: &str,
        issue_number: u64,
        title: &str,
        body: &str,
        labels: Vec<String>,
    ) -> BackendResult<GitHubIssue>;
    /// Assigns the issue to the authenticated GitHub user.
    async fn assign_issue(&self, repo_path: &str, issue_number: u64) -> BackendResult<()>;
    async fn close_issue(&self, repo_path: &str, issue_number: u64) -> BackendResult<()>;

    // Terminal multiplexer
    async fn list_tmux_sessions(&self) -> BackendResult<Vec<String>>;
    /// Output streams back as `TerminalOutput` events for `session_id`.
    async fn attach_terminal(&self, session_id: &str, tmux_session: &str, cols: u16, rows: u16) -> BackendResult<()>;
    async fn write_terminal(&self, session_id: &str, data: &[u8]) -> BackendResult<()>;
    async fn resize_terminal(&self, session_id: &str, cols: u16, rows: u16) -> BackendResult<()>;
    async fn detach_terminal(&self, session_id: &str) -> BackendResult<()>;
    async fn paste_to_tmux_pane(&self, tmux_session: &str, text: &str) -> BackendResult<()>;
}
