// ABOUTME: Line-delimited JSON wire protocol spoken with the backend process
// Requests carry an id and a command; responses echo the id; events are unsolicited pushes

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::BackendError;
use crate::models::GroupSettings;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", content = "args", rename_all = "snake_case")]
pub enum Command {
    CheckAgentDeckVersion,
    CheckPrerequisites,
    GetGroups,
    CreateGroup { name: String, default_path: String },
    SetGroupSettings { group_path: String, settings: GroupSettings },
    GetSessions { group_path: Option<String> },
    CreateSession(CreateSessionRequest),
    RemoveSession { session_id: String, remove_worktree: bool },
    RestartSession { session_id: String },
    RenameSession { session_id: String, new_title: String },
    MoveSession { session_id: String, new_group_path: String },
    GetSessionSummary { session_id: String },
    GetAttentionCounts,
    GetAttentionSessions,
    ListWorktrees { repo_path: String },
    AddWorktree { repo_path: String, branch: String },
    RemoveWorktree { repo_path: String, worktree_path: String },
    CheckWorktreeStatus { repo_path: String, worktree_path: String, branch: String },
    GetDefaultBranch { repo_path: String },
    GetBranchDiff { worktree_path: String, branch: String },
    RebaseWorktree { worktree_path: String, main_branch: String },
    PushBranch { worktree_path: String, branch: String },
    TryMergeBranch { repo_path: String, branch: String, main_branch: String },
    AbortMerge { worktree_path: String },
    CreatePr(CreatePrRequest),
    CheckPrStatus { repo_path: String, branch: String },
    ListIssues { repo_path: String },
    GetIssue { repo_path: String, issue_number: u64 },
    CreateIssue { repo_path: String, title: String, body: String },
    UpdateIssue { repo_path: String, issue_number: u64, title: String, body: String, labels: Vec<String> },
    AssignIssue { repo_path: String, issue_number: u64 },
    CloseIssue { repo_path: String, issue_number: u64 },
    ListTmuxSessions,
    /// Bracketed paste into the pane, bypassing the attached PTY.
    PasteToTmuxPane { tmux_session: String, text: String },
    AttachTerminal { session_id: String, tmux_session: String, cols: u16, rows: u16 },
    /// `data` is base64 encoded.
    WriteTerminal { session_id: String, data: String },
    ResizeTerminal { session_id: String, cols: u16, rows: u16 },
    DetachTerminal { session_id: String },
}

impl Command {
    pub fn write_terminal(session_id: &str, bytes: &[u8]) -> Self {
        Command::WriteTerminal {
            session_id: session_id.to_string(),
            data: BASE64.encode(bytes),
        }
    }

    /// Wire name, used in logs and timeout errors.
    pub fn name(&self) -> String {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map
                .get("command")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            _ => "unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// Local id of the card shown while creation is in flight; echoed in events.
    pub placeholder_id: String,
    pub project_path: String,
    pub group_path: String,
    pub title: String,
    pub tool: Option<String>,
    pub worktree_branch: Option<String>,
    pub new_branch: bool,
    pub start: bool,
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePrRequest {
    pub repo_path: String,
    pub branch: String,
    pub base_branch: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct RequestFrame<'a> {
    pub id: u64,
    #[serde(flatten)]
    pub command: &'a Command,
}

/// Asynchronous notifications pushed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BackendEvent {
    SessionCreated { placeholder_id: String, session_id: String },
    SessionCreateFailed { placeholder_id: String, error: String },
    SessionRemoved { session_id: String },
    SessionRemoveFailed { session_id: String, error: String },
    /// `data` is base64 encoded terminal output.
    TerminalOutput { session_id: String, data: String },
    TerminalExited { session_id: String },
    /// Raised locally when the backend's stdout closes.
    BackendDisconnected { reason: String },
}

#[derive(Debug, PartialEq)]
pub enum IncomingFrame {
    Response { id: u64, result: Result<Value, String> },
    Event(BackendEvent),
}

pub fn encode_request(id: u64, command: &Command) -> Result<String, BackendError> {
    Ok(serde_json::to_string(&RequestFrame { id, command })?)
}

pub fn decode_frame(line: &str) -> Result<IncomingFrame, BackendError> {
    let value: Value = serde_json::from_str(line)?;
    let Value::Object(mut map) = value else {
        return Err(BackendError::InvalidFrame(line.to_string()));
    };

    if map.contains_key("event") {
        let event: BackendEvent = serde_json::from_value(Value::Object(map))?;
        return Ok(IncomingFrame::Event(event));
    }

    let id = map
        .get("id")
        .and_then(Value::as_u64)
        .ok_or_else(|| BackendError::InvalidFrame(line.to_string()))?;

    if let Some(error) = map.remove("error") {
        if !error.is_null() {
            let message = match error {
                Value::String(s) => s,
                other => other.to_string(),
            };
            return Ok(IncomingFrame::Response { id, result: Err(message) });
        }
    }

    let ok = map.remove("ok").unwrap_or(Value::Null);
    Ok(IncomingFrame::Response { id, result: Ok(ok) })
}

pub fn decode_terminal_data(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64.decode(data)
}
