// ABOUTME: Session data model representing one agent run bound to a project, optional worktree and tmux handle

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

use super::PrInfo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Starting,
    Running,
    Waiting,
    Idle,
    Stopped,
    Error,
    Unknown(String),
}

impl SessionStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "starting" => SessionStatus::Starting,
            "running" => SessionStatus::Running,
            "waiting" => SessionStatus::Waiting,
            "idle" => SessionStatus::Idle,
            "stopped" => SessionStatus::Stopped,
            "error" => SessionStatus::Error,
            other => SessionStatus::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SessionStatus::Starting => "starting",
            SessionStatus::Running => "running",
            SessionStatus::Waiting => "waiting",
            SessionStatus::Idle => "idle",
            SessionStatus::Stopped => "stopped",
            SessionStatus::Error => "error",
            SessionStatus::Unknown(raw) => raw,
        }
    }

    pub fn indicator(&self) -> &'static str {
        match self {
            SessionStatus::Starting => "◌",
            SessionStatus::Running => "●",
            SessionStatus::Waiting => "◐",
            SessionStatus::Idle => "○",
            SessionStatus::Stopped => "⏸",
            SessionStatus::Error => "✗",
            SessionStatus::Unknown(_) => "?",
        }
    }
}

impl Serialize for SessionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SessionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(SessionStatus::parse(&raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionStatus {
    NeedsInput,
    Error,
    Running,
    Idle,
    Stale,
    Unknown,
}

impl AttentionStatus {
    /// Attention derived from the raw session status when the backend has no
    /// summary for the session. A tmux handle the liveness poll no longer sees
    /// makes the session stale, unless it already errored.
    pub fn fallback(status: &SessionStatus, tmux_alive: Option<bool>) -> Self {
        let attention = match status {
            SessionStatus::Running | SessionStatus::Starting => AttentionStatus::Running,
            SessionStatus::Waiting | SessionStatus::Idle => AttentionStatus::Idle,
            SessionStatus::Error => AttentionStatus::Error,
            SessionStatus::Stopped | SessionStatus::Unknown(_) => AttentionStatus::Unknown,
        };

        match (attention, tmux_alive) {
            (AttentionStatus::Error, _) => AttentionStatus::Error,
            (_, Some(false)) => AttentionStatus::Stale,
            (attention, _) => attention,
        }
    }

    pub fn needs_attention(&self) -> bool {
        matches!(self, AttentionStatus::NeedsInput | AttentionStatus::Error)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AttentionStatus::NeedsInput => "needs input",
            AttentionStatus::Error => "error",
            AttentionStatus::Running => "working",
            AttentionStatus::Idle => "idle",
            AttentionStatus::Stale => "stale",
            AttentionStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub summary: Option<String>,
    pub attention: AttentionStatus,
    pub last_tool: Option<String>,
    pub last_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionCounts {
    pub total: u32,
    #[serde(default)]
    pub groups: HashMap<String, u32>,
}

impl AttentionCounts {
    pub fn for_group(&self, group_path: &str) -> u32 {
        self.groups.get(group_path).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub title: String,
    pub project_path: String,
    pub group_path: String,
    #[serde(default)]
    pub sort_order: i32,
    pub status: SessionStatus,
    #[serde(default)]
    pub tmux_session: String,
    pub created_at: i64,
    pub last_accessed: i64,
    #[serde(default)]
    pub worktree_path: String,
    #[serde(default)]
    pub worktree_repo: String,
    #[serde(default)]
    pub worktree_branch: String,
    #[serde(default)]
    pub claude_session_id: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub pr: Option<PrInfo>,
}

impl Session {
    pub fn new(id: impl Into<String>, title: impl Into<String>, project_path: impl Into<String>, group_path: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: id.into(),
            title: title.into(),
            project_path: project_path.into(),
            group_path: group_path.into(),
            sort_order: 0,
            status: SessionStatus::Starting,
            tmux_session: String::new(),
            created_at: now,
            last_accessed: now,
            worktree_path: String::new(),
            worktree_repo: String::new(),
            worktree_branch: String::new(),
            claude_session_id: None,
            prompt: None,
            pr: None,
        }
    }

    pub fn has_worktree(&self) -> bool {
        !self.worktree_path.is_empty()
    }

    pub fn has_tmux(&self) -> bool {
        !self.tmux_session.is_empty()
    }

    /// Path the agent works in: the worktree when there is one, else the project.
    pub fn working_path(&self) -> &str {
        if self.has_worktree() {
            &self.worktree_path
        } else {
            &self.project_path
        }
    }

    /// Repository root used for worktree and GitHub commands.
    pub fn repo_path(&self) -> &str {
        if self.worktree_repo.is_empty() {
            &self.project_path
        } else {
            &self.worktree_repo
        }
    }

    pub fn branch_label(&self) -> Option<&str> {
        if self.worktree_branch.is_empty() {
            None
        } else {
            Some(&self.worktree_branch)
        }
    }

    pub fn matches_search(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        let needle = needle.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.worktree_branch.to_lowercase().contains(&needle)
            || self.project_path.to_lowercase().contains(&needle)
            || self.prompt.as_deref().map(|p| p.to_lowercase().contains(&needle)).unwrap_or(false)
    }
}
