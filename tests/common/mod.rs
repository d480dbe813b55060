// ABOUTME: Shared fixtures for integration tests: a mockall backend and sample sessions and groups
#![allow(dead_code)]

use async_trait::async_trait;
use mockall::mock;
use std::sync::Arc;
use tokio::sync::mpsc;

use orca::app::App;
use orca::backend::{Backend, BackendEvent, BackendResult, CreatePrRequest, CreateSessionRequest};
use orca::config::{AppConfig, Preferences};
use orca::models::{
    AttentionCounts, GitHubIssue, Group, GroupSettings, MergeResult, PrInfo, Prerequisite, Session, SessionStatus,
    SessionSummary, VersionCheck, Worktree, WorktreeStatus,
};

mock! {
    pub OrcaBackend {}

    #[async_trait]
    impl Backend for OrcaBackend {
        async fn check_agent_deck_version(&self) -> BackendResult<VersionCheck>;
        async fn check_prerequisites(&self) -> BackendResult<Vec<Prerequisite>>;
        async fn get_groups(&self) -> BackendResult<Vec<Group>>;
        async fn create_group(&self, name: &str, default_path: &str) -> BackendResult<()>;
        async fn set_group_settings(&self, group_path: &str, settings: GroupSettings) -> BackendResult<()>;
        async fn get_sessions(&self, group_path: Option<String>) -> BackendResult<Vec<Session>>;
        async fn create_session(&self, request: CreateSessionRequest) -> BackendResult<()>;
        async fn remove_session(&self, session_id: &str, remove_worktree: bool) -> BackendResult<()>;
        async fn restart_session(&self, session_id: &str) -> BackendResult<()>;
        async fn rename_session(&self, session_id: &str, new_title: &str) -> BackendResult<()>;
        async fn move_session(&self, session_id: &str, new_group_path: &str) -> BackendResult<()>;
        async fn get_session_summary(&self, session_id: &str) -> BackendResult<SessionSummary>;
        async fn get_attention_counts(&self) -> BackendResult<AttentionCounts>;
        async fn get_attention_sessions(&self) -> BackendResult<Vec<Session>>;
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
        async fn create_pr(&self, request: CreatePrRequest) -> BackendResult<PrInfo>;
        async fn check_pr_status(&self, repo_path: &str, branch: &str) -> BackendResult<PrInfo>;
        async fn list_issues(&self, repo_path: &str) -> BackendResult<Vec<GitHubIssue>>;
        async fn get_issue(&self, repo_path: &str, issue_number: u64) -> BackendResult<GitHubIssue>;
        async fn create_issue(&self, repo_path: &str, title: &str, body: &str) -> BackendResult<GitHubIssue>;
        async fn update_issue(&self, repo_path: &str, issue_number: u64, title: &str, body: &str, labels: Vec<String>)
            -> BackendResult<GitHubIssue>;
        async fn assign_issue(&self, repo_path: &str, issue_number: u64) -> BackendResult<()>;
        async fn close_issue(&self, repo_path: &str, issue_number: u64) -> BackendResult<()>;
        async fn list_tmux_sessions(&self) -> BackendResult<Vec<String>>;
        async fn attach_terminal(&self, session_id: &str, tmux_session: &str, cols: u16, rows: u16) -> BackendResult<()>;
        async fn write_terminal(&self, session_id: &str, data: &[u8]) -> BackendResult<()>;
        async fn resize_terminal(&self, session_id: &str, cols: u16, rows: u16) -> BackendResult<()>;
        async fn detach_terminal(&self, session_id: &str) -> BackendResult<()>;
        async fn paste_to_tmux_pane(&self, tmux_session: &str, text: &str) -> BackendResult<()>;
    }
}

/// App wired to the mock, plus the sender standing in for backend push events.
pub fn app_with(backend: MockOrcaBackend) -> (App, mpsc::UnboundedSender<BackendEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = App::new(Arc::new(backend), rx, AppConfig::default(), Preferences::in_memory());
    (app, tx)
}

pub fn group(path: &str, name: &str, default_path: &str) -> Group {
    Group::new(path, name, default_path)
}

pub fn plain_session(id: &str, group_path: &str) -> Session {
    let mut session = Session::new(id, format!("session {}", id), "/src/app", group_path);
    session.status = SessionStatus::Running;
    session.tmux_session = format!("orca_{}", id);
    session
}

pub fn worktree_session(id: &str, group_path: &str, branch: &str) -> Session {
    let mut session = plain_session(id, group_path);
    session.worktree_path = format!("/src/app-worktrees/{}", branch);
    session.worktree_repo = "/src/app".to_string();
    session.worktree_branch = branch.to_string();
    session
}

pub fn issue(number: u64, title: &str) -> GitHubIssue {
    GitHubIssue {
        number,
        title: title.to_string(),
        body: String::new(),
        state: "open".to_string(),
        labels: Vec::new(),
        assignee: None,
        created_at: "2024-05-01T10:00:00Z".to_string(),
        updated_at: "2024-05-02T10:00:00Z".to_string(),
        html_url: format!("https://github.com/acme/app/issues/{}", number),
    }
}

pub fn worktree(path: &str, branch: &str) -> Worktree {
    Worktree {
        path: path.to_string(),
        head: "0123456789abcdef".to_string(),
        branch: if branch.is_empty() {
            String::new()
        } else {
            format!("refs/heads/{}", branch)
        },
        is_bare: false,
    }
}

/// Expectations for the version and tool checks `App::init` runs first.
pub fn expect_startup_checks(backend: &mut MockOrcaBackend, installed: &'static str) {
    backend.expect_check_agent_deck_version().times(1).returning(move || {
        Ok(VersionCheck {
            supported: orca::models::SUPPORTED_AGENT_DECK_VERSION.to_string(),
            installed: installed.to_string(),
        })
    });
    backend.expect_check_prerequisites().times(1).returning(|| {
        Ok(vec![Prerequisite {
            name: "tmux".to_string(),
            found: true,
            required: true,
        }])
    });
}
