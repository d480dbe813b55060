// ABOUTME: RPC client that drives the backend process over stdin/stdout
// Correlates responses to requests by id and forwards push events to the app

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command as ProcessCommand};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, info, warn};

use super::protocol::{decode_frame, encode_request, IncomingFrame};
use super::{Backend, BackendError, BackendEvent, BackendResult, Command, CreatePrRequest, CreateSessionRequest};
use crate::config::BackendConfig;
use crate::models::{
    AttentionCounts, GitHubIssue, Group, GroupSettings, MergeResult, PrInfo, Prerequisite, Session, SessionSummary,
    VersionCheck, Worktree, WorktreeStatus,
};

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, String>>>>>;

pub struct RpcClient {
    next_id: AtomicU64,
    pending: PendingMap,
    /// Set by the reader once the backend's stdout is gone.
    closed: Arc<AtomicBool>,
    outgoing: mpsc::UnboundedSender<String>,
    timeout: Duration,
    /// Held so the backend is killed when the client goes away.
    _child: Option<Child>,
}

impl RpcClient {
    /// Spawn the backend process and connect to its stdio.
    pub fn spawn(config: &BackendConfig) -> BackendResult<(Self, mpsc::UnboundedReceiver<BackendEvent>)> {
        info!("Starting backend: {} {}", config.command, config.args.join(" "));

        let mut child = ProcessCommand::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BackendError::Spawn {
                command: config.command.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(BackendError::Closed)?;
        let stdout = child.stdout.take().ok_or(BackendError::Closed)?;

        let (mut client, events) = Self::from_io(stdout, stdin, config.request_timeout());
        client._child = Some(child);
        Ok((client, events))
    }

    /// Build a client over any reader/writer pair. Must be called inside a tokio runtime.
    pub fn from_io<R, W>(reader: R, writer: W, timeout: Duration) -> (Self, mpsc::UnboundedReceiver<BackendEvent>)
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::write_loop(writer, outgoing_rx));
        tokio::spawn(Self::read_loop(reader, pending.clone(), closed.clone(), events_tx));

        let client = Self {
            next_id: AtomicU64::new(1),
            pending,
            closed,
            outgoing: outgoing_tx,
            timeout,
            _child: None,
        };
        (client, events_rx)
    }

    async fn write_loop<W: AsyncWrite + Unpin>(mut writer: W, mut outgoing: mpsc::UnboundedReceiver<String>) {
        while let Some(line) = outgoing.recv().await {
            if let Err(e) = writer.write_all(line.as_bytes()).await {
                error!("Failed to write to backend: {}", e);
                break;
            }
            if let Err(e) = writer.write_all(b"\n").await {
                error!("Failed to write to backend: {}", e);
                break;
            }
            if let Err(e) = writer.flush().await {
                error!("Failed to flush backend stdin: {}", e);
                break;
            }
        }
        debug!("Backend writer loop finished");
    }

    async fn read_loop<R: AsyncRead + Unpin>(
        reader: R,
        pending: PendingMap,
        closed: Arc<AtomicBool>,
        events: mpsc::UnboundedSender<BackendEvent>,
    ) {
        let mut lines = BufReader::new(reader).lines();
        let reason = loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match decode_frame(&line) {
                        Ok(IncomingFrame::Response { id, result }) => {
                            let sender = pending.lock().await.remove(&id);
                            match sender {
                                Some(sender) => {
                                    let _ = sender.send(result);
                                }
                                None => warn!("Response for unknown or expired request {}", id),
                            }
                        }
                        Ok(IncomingFrame::Event(event)) => {
                            if events.send(event).is_err() {
                                debug!("Event receiver dropped");
                            }
                        }
                        Err(e) => warn!("Ignoring backend frame: {}", e),
                    }
                }
                Ok(None) => break "backend exited".to_string(),
                Err(e) => break format!("read error: {}", e),
            }
        };

        warn!("Backend connection closed: {}", reason);
        {
            // The flag flips under the lock so no call can register after the clear.
            let mut pending = pending.lock().await;
            closed.store(true, Ordering::Release);
            // Dropping the senders fails every in-flight call with Closed.
            pending.clear();
        }
        let _ = events.send(BackendEvent::BackendDisconnected { reason });
    }

    /// True once the backend has gone away; every call fails with `Closed` from then on.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    async fn call<T: DeserializeOwned>(&self, command: Command) -> BackendResult<T> {
        if self.is_closed() {
            return Err(BackendError::Closed);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let name = command.name();
        let line = encode_request(id, &command)?;
        debug!("-> backend #{} {}", id, name);

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            if self.closed.load(Ordering::Acquire) {
                return Err(BackendError::Closed);
            }
            pending.insert(id, tx);
        }

        if self.outgoing.send(line).is_err() {
            self.pending.lock().await.remove(&id);
            return Err(BackendError::Closed);
        }

        let result = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => return Err(BackendError::Closed),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                warn!("Backend call {} (#{}) timed out", name, id);
                return Err(BackendError::Timeout {
                    command: name,
                    secs: self.timeout.as_secs(),
                });
            }
        };

        match result {
            Ok(value) => Ok(serde_json::from_value(value)?),
            Err(message) => {
                debug!("<- backend #{} {} failed: {}", id, name, message);
                Err(BackendError::Remote(message))
            }
        }
    }
}

#[async_trait]
impl Backend for RpcClient {
    async fn check_agent_deck_version(&self) -> BackendResult<VersionCheck> {
        self.call(Command::CheckAgentDeckVersion).await
    }

    async fn check_prerequisites(&self) -> BackendResult<Vec<Prerequisite>> {
        self.call(Command::CheckPrerequisites).await
    }

    async fn get_groups(&self) -> BackendResult<Vec<Group>> {
        self.call(Command::GetGroups).await
    }

    async fn create_group(&self, name: &str, default_path: &str) -> BackendResult<()> {
        self.call(Command::CreateGroup {
            name: name.to_string(),
            default_path: default_path.to_string(),
        })
        .await
    }

    async fn set_group_settings(&self, group_path: &str, settings: GroupSettings) -> BackendResult<()> {
        self.call(Command::SetGroupSettings {
            group_path: group_path.to_string(),
            settings,
        })
        .await
    }

    async fn get_sessions(&self, group_path: Option<String>) -> BackendResult<Vec<Session>> {
        self.call(Command::GetSessions { group_path }).await
    }

    async fn create_session(&self, request: CreateSessionRequest) -> BackendResult<()> {
        self.call(Command::CreateSession(request)).await
    }

    async fn remove_session(&self, session_id: &str, remove_worktree: bool) -> BackendResult<()> {
        self.call(Command::RemoveSession {
            session_id: session_id.to_string(),
            remove_worktree,
        })
        .await
    }

    async fn restart_session(&self, session_id: &str) -> BackendResult<()> {
        self.call(Command::RestartSession {
            session_id: session_id.to_string(),
        })
        .await
    }

    async fn rename_session(&self, session_id: &str, new_title: &str) -> BackendResult<()> {
        self.call(Command::RenameSession {
            session_id: session_id.to_string(),
            new_title: new_title.to_string(),
        })
        .await
    }

    async fn move_session(&self, session_id: &str, new_group_path: &str) -> BackendResult<()> {
        self.call(Command::MoveSession {
            session_id: session_id.to_string(),
            new_group_path: new_group_path.to_string(),
        })
        .await
    }

    async fn get_session_summary(&self, session_id: &str) -> BackendResult<SessionSummary> {
        self.call(Command::GetSessionSummary {
            session_id: session_id.to_string(),
        })
        .await
    }

    async fn get_attention_counts(&self) -> BackendResult<AttentionCounts> {
        self.call(Command::GetAttentionCounts).await
    }

    async fn get_attention_sessions(&self) -> BackendResult<Vec<Session>> {
        self.call(Command::GetAttentionSessions).await
    }

    async fn list_worktrees(&self, repo_path: &str) -> BackendResult<Vec<Worktree>> {
        self.call(Command::ListWorktrees {
            repo_path: repo_path.to_string(),
        })
        .await
    }

    async fn add_worktree(&self, repo_path: &str, branch: &str) -> BackendResult<String> {
        self.call(Command::AddWorktree {
            repo_path: repo_path.to_string(),
            branch: branch.to_string(),
        })
        .await
    }

    async fn remove_worktree(&self, repo_path: &str, worktree_path: &str) -> BackendResult<()> {
        self.call(Command::RemoveWorktree {
            repo_path: repo_path.to_string(),
            worktree_path: worktree_path.to_string(),
        })
        .await
    }

    async fn check_worktree_status(
        &self,
        repo_path: &str,
        worktree_path: &str,
        branch: &str,
    ) -> BackendResult<WorktreeStatus> {
        self.call(Command::CheckWorktreeStatus {
            repo_path: repo_path.to_string(),
            worktree_path: worktree_path.to_string(),
            branch: branch.to_string(),
        })
        .await
    }

    async fn get_default_branch(&self, repo_path: &str) -> BackendResult<String> {
        self.call(Command::GetDefaultBranch {
            repo_path: repo_path.to_string(),
        })
        .await
    }

    async fn get_branch_diff(&self, worktree_path: &str, branch: &str) -> BackendResult<String> {
        self.call(Command::GetBranchDiff {
            worktree_path: worktree_path.to_string(),
            branch: branch.to_string(),
        })
        .await
    }

    async fn rebase_worktree(&self, worktree_path: &str, main_branch: &str) -> BackendResult<()> {
        self.call(Command::RebaseWorktree {
            worktree_path: worktree_path.to_string(),
            main_branch: main_branch.to_string(),
        })
        .await
    }

    async fn push_branch(&self, worktree_path: &str, branch: &str) -> BackendResult<()> {
        self.call(Command::PushBranch {
            worktree_path: worktree_path.to_string(),
            branch: branch.to_string(),
        })
        .await
    }

    async fn try_merge_branch(&self, repo_path: &str, branch: &str, main_branch: &str) -> BackendResult<MergeResult> {
        self.call(Command::TryMergeBranch {
            repo_path: repo_path.to_string(),
            branch: branch.to_string(),
            main_branch: main_branch.to_string(),
        })
        .await
    }

    async fn abort_merge(&self, worktree_path: &str) -> BackendResult<()> {
        self.call(Command::AbortMerge {
            worktree_path: worktree_path.to_string(),
        })
        .await
    }

    async fn create_pr(&self, request: CreatePrRequest) -> BackendResult<PrInfo> {
        self.call(Command::CreatePr(request)).await
    }

    async fn check_pr_status(&self, repo_path: &str, branch: &str) -> BackendResult<PrInfo> {
        self.call(Command::CheckPrStatus {
            repo_path: repo_path.to_string(),
            branch: branch.to_string(),
        })
        .await
    }

    async fn list_issues(&self, repo_path: &str) -> BackendResult<Vec<GitHubIssue>> {
        self.call(Command::ListIssues {
            repo_path: repo_path.to_string(),
        })
        .await
    }

    async fn get_issue(&self, repo_path: &str, issue_number: u64) -> BackendResult<GitHubIssue> {
        self.call(Command::GetIssue {
            repo_path: repo_path.to_string(),
            issue_number,
        })
        .await
    }

    async fn create_issue(&self, repo_path: &str, title: &str, body: &str) -> BackendResult<GitHubIssue> {
        self.call(Command::CreateIssue {
            repo_path: repo_path.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        })
        .await
    }

    async fn update_issue(
        &self,
        repo_path: &str,
        issue_number: u64,
        title: &str,
        body: &str,
        labels: Vec<String>,
    ) -> BackendResult<GitHubIssue> {
        self.call(Command::UpdateIssue {
            repo_path: repo_path.to_string(),
            issue_number,
            title: title.to_string(),
            body: body.to_string(),
            labels,
        })
        .await
    }

    async fn assign_issue(&self, repo_path: &str, issue_number: u64) -> BackendResult<()> {
        self.call(Command::AssignIssue {
            repo_path: repo_path.to_string(),
            issue_number,
        })
        .await
    }

    async fn close_issue(&self, repo_path: &str, issue_number: u64) -> BackendResult<()> {
        self.call(Command::CloseIssue {
            repo_path: repo_path.to_string(),
            issue_number,
        })
        .await
    }

    async fn list_tmux_sessions(&self) -> BackendResult<Vec<String>> {
        self.call(Command::ListTmuxSessions).await
    }

    async fn attach_terminal(&self, session_id: &str, tmux_session: &str, cols: u16, rows: u16) -> BackendResult<()> {
        self.call(Command::AttachTerminal {
            session_id: session_id.to_string(),
            tmux_session: tmux_session.to_string(),
            cols,
            rows,
        })
        .await
    }

    async fn write_terminal(&self, session_id: &str, data: &[u8]) -> BackendResult<()> {
        self.call(Command::write_terminal(session_id, data)).await
    }

    async fn resize_terminal(&self, session_id: &str, cols: u16, rows: u16) -> BackendResult<()> {
        self.call(Command::ResizeTerminal {
            session_id: session_id.to_string(),
            cols,
            rows,
        })
        .await
    }

    async fn detach_terminal(&self, session_id: &str) -> BackendResult<()> {
        self.call(Command::DetachTerminal {
            session_id: session_id.to_string(),
        })
        .await
    }

    async fn paste_to_tmux_pane(&self, tmux_session: &str, text: &str) -> BackendResult<()> {
        self.call(Command::PasteToTmuxPane {
            tmux_session: tmux_session.to_string(),
            text: text.to_string(),
        })
        .await
    }
}
