// ABOUTME: App driver: drains backend events, schedules polls and runs queued async actions against the backend
// Every backend call made by the UI goes through here

use arboard::Clipboard;
use crossterm::event::KeyEvent;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use super::events::EventHandler;
use super::poller::{PollTask, Poller};
use super::pr_flow::{PrStage, PrStep, StepOutcome};
use super::state::{AppState, AsyncAction, Focus, LoadTarget, Modal, Panel};
use crate::backend::{Backend, BackendError, BackendEvent, CreatePrRequest};
use crate::components::layout::terminal_pane_size;
use crate::config::{AppConfig, Preferences};
use crate::diff::parse_unified_diff;
use crate::logs::read_app_log;
use crate::models::{GitHubIssue, PrInfo, PrState};
use crate::terminal::{RetryPolicy, TerminalSession};

pub struct App {
    pub state: AppState,
    backend: Arc<dyn Backend>,
    events: mpsc::UnboundedReceiver<BackendEvent>,
    poller: Poller,
    config: AppConfig,
    /// Full terminal size, used to size the attached pane.
    screen_size: (u16, u16),
    /// This run's log file, shown by the log panel.
    log_file: Option<PathBuf>,
}

impl App {
    pub fn new(
        backend: Arc<dyn Backend>,
        events: mpsc::UnboundedReceiver<BackendEvent>,
        config: AppConfig,
        preferences: Preferences,
    ) -> Self {
        Self {
            state: AppState::new(preferences),
            backend,
            events,
            poller: Poller::new(&config.poll),
            config,
            screen_size: (120, 40),
            log_file: None,
        }
    }

    pub fn with_log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    /// Check the environment, then load groups and sessions before the first frame.
    pub async fn init(&mut self) {
        info!("Loading groups and sessions from backend");
        self.state.queue(AsyncAction::CheckVersion);
        self.state.queue(AsyncAction::CheckPrerequisites);
        self.state.queue(AsyncAction::LoadGroups);
        self.state.queue(AsyncAction::LoadSessions);
        self.process_async_actions().await;
    }

    pub async fn tick(&mut self) -> anyhow::Result<()> {
        self.drain_backend_events();

        let now = Instant::now();
        if self.state.backend_connected {
            for task in self.poller.due(now) {
                self.queue_poll(task);
            }
        }

        if let Some(terminal) = self.state.terminal.as_mut() {
            if terminal.take_due_retry(now) {
                let session_id = terminal.session_id.clone();
                self.state.queue(AsyncAction::AttachTerminal { session_id });
            }
        }

        self.state.notifications.prune(now);
        self.process_async_actions().await;
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if let Some(event) = EventHandler::handle_key_event(key, &mut self.state) {
            EventHandler::process_event(event, &mut self.state);
        }
    }

    pub fn handle_paste(&mut self, text: String) {
        EventHandler::handle_paste(text, &mut self.state);
    }

    /// Track the screen size and resize the attached terminal to match.
    pub async fn resize(&mut self, width: u16, height: u16) {
        self.screen_size = (width, height);
        let (cols, rows) = self.terminal_size();
        let Some(terminal) = self.state.terminal.as_mut() else {
            return;
        };
        if terminal.stream.resize(cols, rows) && terminal.attach.is_attached() {
            let session_id = terminal.session_id.clone();
            if let Err(e) = self.backend.resize_terminal(&session_id, cols, rows).await {
                warn!("Failed to resize terminal for {}: {}", session_id, e);
            }
        }
    }

    fn terminal_size(&self) -> (u16, u16) {
        let (width, height) = self.screen_size;
        terminal_pane_size(width, height, self.config.ui.sidebar_percent)
    }

    pub fn drain_backend_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.state.apply_backend_event(event);
        }
    }

    fn queue_poll(&mut self, task: PollTask) {
        trace!("Poll due: {:?}", task);
        match task {
            PollTask::Sessions => self.state.queue(AsyncAction::LoadSessions),
            PollTask::Liveness => self.state.queue(AsyncAction::CheckLiveness),
            PollTask::GroupsAndAttention => {
                self.state.queue(AsyncAction::LoadGroups);
                self.state.queue(AsyncAction::LoadAttention);
                if self.state.attention_only {
                    self.state.queue(AsyncAction::LoadAttentionSessions);
                }
            }
            PollTask::IssuesAndPrStatus => {
                match self.state.panel {
                    Panel::Issues => self.state.queue(AsyncAction::LoadIssues),
                    Panel::Worktrees => self.state.queue(AsyncAction::LoadWorktrees),
                    _ => {}
                }
                self.state.queue(AsyncAction::RefreshPrStatuses);
            }
        }
    }

    /// Runs the actions queued so far. Actions queued while running wait for
    /// the next tick so each PR step gets a frame.
    pub async fn process_async_actions(&mut self) {
        let count = self.state.pending_async_actions.len();
        for _ in 0..count {
            let Some(action) = self.state.pending_async_actions.pop_front() else {
                break;
            };
            self.run_action(action).await;
        }
    }

    async fn run_action(&mut self, action: AsyncAction) {
        match &action {
            AsyncAction::WriteTerminal { .. } => trace!("Running {:?}", action),
            _ => debug!("Running {:?}", action),
        }

        if !self.state.backend_connected && !action.is_local() {
            self.refuse_offline(action);
            return;
        }

        match action {
            AsyncAction::RefreshAll => {
                info!("Manual refresh");
                self.poller.force_all();
                if self.state.panel == Panel::Log {
                    self.state.queue(AsyncAction::LoadLog);
                }
            }
            AsyncAction::CheckVersion => match self.backend.check_agent_deck_version().await {
                Ok(check) => self.state.apply_version_check(check),
                Err(e) => {
                    warn!("agent-deck version check failed: {}", e);
                    self.state
                        .notifications
                        .error_once("agent-deck-version", format!("Could not check agent-deck version: {}", e));
                    self.note_closed(&e);
                }
            },
            AsyncAction::CheckPrerequisites => match self.backend.check_prerequisites().await {
                Ok(tools) => self.state.apply_prerequisites(tools),
                Err(e) => {
                    warn!("Prerequisite check failed: {}", e);
                    self.note_closed(&e);
                }
            },
            AsyncAction::LoadAttentionSessions => match self.backend.get_attention_sessions().await {
                Ok(sessions) => self.state.apply_attention_sessions(sessions),
                Err(e) => {
                    warn!("Failed to load sessions needing attention: {}", e);
                    if self.state.attention_only {
                        self.state
                            .notifications
                            .error(format!("Could not load sessions needing attention: {}", e));
                    }
                    self.note_closed(&e);
                }
            },
            AsyncAction::LoadWorktrees => self.load_worktrees().await,
            AsyncAction::LoadLog => self.load_log().await,
            AsyncAction::LoadSessions => match self.backend.get_sessions(None).await {
                Ok(sessions) => {
                    self.state.backend_connected = true;
                    self.state.apply_sessions(sessions);
                }
                Err(e) => self.load_failed(LoadTarget::Sessions, e),
            },
            AsyncAction::LoadGroups => match self.backend.get_groups().await {
                Ok(groups) => self.state.apply_groups(groups),
                Err(e) => self.load_failed(LoadTarget::Groups, e),
            },
            AsyncAction::LoadAttention => self.load_attention().await,
            AsyncAction::CheckLiveness => match self.backend.list_tmux_sessions().await {
                Ok(live) => self.state.apply_liveness(live),
                Err(e) => warn!("Liveness check failed: {}", e),
            },
            AsyncAction::LoadIssues => self.load_issues().await,
            AsyncAction::RefreshPrStatuses => self.refresh_pr_statuses().await,
            AsyncAction::CreateSession(request) => {
                let placeholder_id = request.placeholder_id.clone();
                let title = request.title.clone();
                if let Err(e) = self.backend.create_session(request).await {
                    error!("Failed to request session creation: {}", e);
                    self.state.remove_placeholder(&placeholder_id);
                    self.state
                        .notifications
                        .error(format!("Failed to create {}: {}", title, e));
                    self.note_closed(&e);
                }
            }
            AsyncAction::CreateGroup { name, default_path } => {
                match self.backend.create_group(&name, &default_path).await {
                    Ok(()) => {
                        info!("Created group {}", name);
                        self.close_modal_if(|m| matches!(m, Modal::NewGroup(_)));
                        self.state.notifications.success(format!("Created group {}", name));
                        self.state.queue(AsyncAction::LoadGroups);
                    }
                    Err(e) => {
                        if let Some(Modal::NewGroup(form)) = self.state.modal.as_mut() {
                            form.error = Some(e.to_string());
                        }
                    }
                }
            }
            AsyncAction::SaveGroupSettings { group_path, settings } => {
                match self.backend.set_group_settings(&group_path, settings.clone()).await {
                    Ok(()) => {
                        if let Some(group) = self.state.groups.iter_mut().find(|g| g.path == group_path) {
                            group.settings = settings;
                        }
                        self.close_modal_if(|m| matches!(m, Modal::GroupSettings(_)));
                        self.state.notifications.success("Group settings saved");
                    }
                    Err(e) => {
                        if let Some(Modal::GroupSettings(form)) = self.state.modal.as_mut() {
                            form.error = Some(e.to_string());
                        }
                    }
                }
            }
            AsyncAction::CheckWorktreeStatus { session_id } => self.check_worktree_status(&session_id).await,
            AsyncAction::RemoveSession {
                session_id,
                remove_worktree,
            } => {
                info!("Removing session {} (worktree: {})", session_id, remove_worktree);
                if let Err(e) = self.backend.remove_session(&session_id, remove_worktree).await {
                    self.state.removing.remove(&session_id);
                    self.state.notifications.error(format!("Failed to remove session: {}", e));
                    self.note_closed(&e);
                }
            }
            AsyncAction::RestartSession { session_id } => match self.backend.restart_session(&session_id).await {
                Ok(()) => {
                    let title = self.session_title(&session_id);
                    self.state.notifications.success(format!("Restarted {}", title));
                    self.state.queue(AsyncAction::LoadSessions);
                }
                Err(e) => {
                    self.state.notifications.error(format!("Failed to restart session: {}", e));
                    self.note_closed(&e);
                }
            },
            AsyncAction::RenameSession { session_id, title } => {
                match self.backend.rename_session(&session_id, &title).await {
                    Ok(()) => {
                        if let Some(session) = self.state.sessions.iter_mut().find(|s| s.id == session_id) {
                            session.title = title;
                        }
                        self.close_modal_if(|m| matches!(m, Modal::Rename(_)));
                        self.state.queue(AsyncAction::LoadSessions);
                    }
                    Err(e) => {
                        if let Some(Modal::Rename(form)) = self.state.modal.as_mut() {
                            form.error = Some(e.to_string());
                        }
                    }
                }
            }
            AsyncAction::MoveSession { session_id, group_path } => {
                match self.backend.move_session(&session_id, &group_path).await {
                    Ok(()) => {
                        if let Some(session) = self.state.sessions.iter_mut().find(|s| s.id == session_id) {
                            session.group_path = group_path.clone();
                        }
                        self.close_modal_if(|m| matches!(m, Modal::Move(_)));
                        let name = self
                            .state
                            .group(&group_path)
                            .map(|g| g.name.clone())
                            .unwrap_or(group_path);
                        self.state.notifications.success(format!("Moved to {}", name));
                        self.state.queue(AsyncAction::LoadSessions);
                    }
                    Err(e) => {
                        if let Some(Modal::Move(form)) = self.state.modal.as_mut() {
                            form.error = Some(e.to_string());
                        }
                    }
                }
            }
            AsyncAction::AttachTerminal { session_id } => self.attach_terminal(&session_id).await,
            AsyncAction::WriteTerminal { session_id, data } => {
                if let Err(e) = self.backend.write_terminal(&session_id, &data).await {
                    warn!("Failed to write to terminal {}: {}", session_id, e);
                    self.state
                        .notifications
                        .error_once(format!("terminal-write:{}", session_id), format!("Terminal input lost: {}", e));
                }
            }
            AsyncAction::PasteTerminal { session_id, text } => {
                let Some(tmux_session) = self.tmux_session_for(&session_id) else {
                    return;
                };
                if let Err(e) = self.backend.paste_to_tmux_pane(&tmux_session, &text).await {
                    warn!("Failed to paste into {}: {}", tmux_session, e);
                    self.state
                        .notifications
                        .error_once(format!("terminal-write:{}", session_id), format!("Paste failed: {}", e));
                    self.note_closed(&e);
                }
            }
            AsyncAction::DetachTerminal { session_id } => {
                if let Err(e) = self.backend.detach_terminal(&session_id).await {
                    debug!("Detach of {} failed: {}", session_id, e);
                }
            }
            AsyncAction::LoadDiff { session_id } => self.load_diff(&session_id).await,
            AsyncAction::RunPrStep => self.run_pr_step().await,
            AsyncAction::AbortMerge { worktree_path } => match self.backend.abort_merge(&worktree_path).await {
                Ok(()) => {
                    self.close_modal_if(|m| matches!(m, Modal::PrFlow(_)));
                    self.state.notifications.info("Merge aborted");
                }
                Err(e) => {
                    self.state.notifications.error(format!("Failed to abort merge: {}", e));
                }
            },
            AsyncAction::CreateIssue { repo_path, title, body } => {
                match self.backend.create_issue(&repo_path, &title, &body).await {
                    Ok(issue) => {
                        self.close_modal_if(|m| matches!(m, Modal::Issue(_)));
                        self.state
                            .notifications
                            .success(format!("Created issue #{}", issue.number));
                        self.state.issues.issues.insert(0, issue);
                        self.state.issues.selected = 0;
                    }
                    Err(e) => {
                        if let Some(Modal::Issue(form)) = self.state.modal.as_mut() {
                            form.error = Some(e.to_string());
                        }
                    }
                }
            }
            AsyncAction::UpdateIssue {
                repo_path,
                number,
                title,
                body,
                labels,
            } => match self.backend.update_issue(&repo_path, number, &title, &body, labels).await {
                Ok(issue) => {
                    self.close_modal_if(|m| matches!(m, Modal::Issue(_)));
                    self.state.notifications.success(format!("Updated issue #{}", number));
                    self.replace_issue(issue);
                }
                Err(e) => {
                    if let Some(Modal::Issue(form)) = self.state.modal.as_mut() {
                        form.error = Some(e.to_string());
                    }
                }
            },
            AsyncAction::AssignIssue { repo_path, number } => {
                if let Err(e) = self.backend.assign_issue(&repo_path, number).await {
                    self.state
                        .notifications
                        .error(format!("Failed to assign issue #{}: {}", number, e));
                    return;
                }
                self.state.notifications.success(format!("Assigned #{} to you", number));
                match self.backend.get_issue(&repo_path, number).await {
                    Ok(issue) => self.replace_issue(issue),
                    Err(e) => debug!("Could not refresh issue #{}: {}", number, e),
                }
            }
            AsyncAction::CloseIssue { repo_path, number } => match self.backend.close_issue(&repo_path, number).await {
                Ok(()) => {
                    let issues = &mut self.state.issues;
                    issues.issues.retain(|i| i.number != number);
                    issues.selected = issues.selected.min(issues.issues.len().saturating_sub(1));
                    self.state.notifications.success(format!("Closed issue #{}", number));
                }
                Err(e) => {
                    self.state
                        .notifications
                        .error(format!("Failed to close issue #{}: {}", number, e));
                }
            },
            AsyncAction::AddWorktree { repo_path, branch } => {
                match self.backend.add_worktree(&repo_path, &branch).await {
                    Ok(path) => {
                        info!("Added worktree {} for {}", path, branch);
                        self.close_modal_if(|m| matches!(m, Modal::NewWorktree(_)));
                        self.state.notifications.success(format!("Created worktree {}", path));
                        self.state.queue(AsyncAction::LoadWorktrees);
                    }
                    Err(e) => {
                        if let Some(Modal::NewWorktree(form)) = self.state.modal.as_mut() {
                            form.error = Some(e.to_string());
                        }
                    }
                }
            }
            AsyncAction::RemoveWorktree {
                repo_path,
                worktree_path,
            } => match self.backend.remove_worktree(&repo_path, &worktree_path).await {
                Ok(()) => {
                    info!("Removed worktree {}", worktree_path);
                    let panel = &mut self.state.worktrees;
                    panel.worktrees.retain(|w| w.path != worktree_path);
                    panel.selected = panel.selected.min(panel.worktrees.len().saturating_sub(1));
                    self.state.notifications.success("Worktree removed");
                    self.state.queue(AsyncAction::LoadWorktrees);
                }
                Err(e) => {
                    self.state
                        .notifications
                        .error(format!("Failed to remove worktree: {}", e));
                }
            },
            AsyncAction::CopyToClipboard(text) => match Clipboard::new() {
                Ok(mut clipboard) => match clipboard.set_text(text) {
                    Ok(()) => {
                        self.state.notifications.success("Copied to clipboard");
                    }
                    Err(e) => warn!("Failed to copy to clipboard: {}", e),
                },
                Err(e) => warn!("Clipboard unavailable: {}", e),
            },
        }
    }

    /// Drops an action that needs the backend once it is gone, undoing the
    /// optimistic state the UI set when queueing it.
    fn refuse_offline(&mut self, action: AsyncAction) {
        debug!("Backend disconnected, dropping {:?}", action);
        match action {
            AsyncAction::CreateSession(request) => {
                self.state.remove_placeholder(&request.placeholder_id);
            }
            AsyncAction::RemoveSession { session_id, .. } => {
                self.state.removing.remove(&session_id);
            }
            action if action.is_reload() => return,
            _ => {}
        }
        self.state
            .notifications
            .error_once("backend-offline", "Backend disconnected; restart orca to reconnect");
    }

    fn load_failed(&mut self, target: LoadTarget, error: BackendError) {
        warn!("Failed to load {:?}: {}", target, error);
        self.state.set_load_error(target, error.to_string());
        self.note_closed(&error);
    }

    fn note_closed(&mut self, error: &BackendError) {
        if matches!(error, BackendError::Closed) {
            self.state.backend_connected = false;
        }
    }

    fn close_modal_if(&mut self, predicate: impl Fn(&Modal) -> bool) {
        if self.state.modal.as_ref().map(predicate).unwrap_or(false) {
            self.state.modal = None;
        }
    }

    fn tmux_session_for(&self, session_id: &str) -> Option<String> {
        match &self.state.terminal {
            Some(terminal) if terminal.session_id == session_id => Some(terminal.tmux_session.clone()),
            _ => self
                .state
                .session(session_id)
                .filter(|s| s.has_tmux())
                .map(|s| s.tmux_session.clone()),
        }
    }

    fn replace_issue(&mut self, issue: GitHubIssue) {
        if let Some(existing) = self.state.issues.issues.iter_mut().find(|i| i.number == issue.number) {
            *existing = issue;
        }
    }

    fn session_title(&self, session_id: &str) -> String {
        self.state
            .session(session_id)
            .map(|s| s.title.clone())
            .unwrap_or_else(|| session_id.to_string())
    }

    async fn load_attention(&mut self) {
        match self.backend.get_attention_counts().await {
            Ok(counts) => self.state.attention_counts = counts,
            Err(e) => {
                warn!("Failed to load attention counts: {}", e);
                return;
            }
        }

        let ids: Vec<String> = self.state.sessions.iter().map(|s| s.id.clone()).collect();
        for id in ids {
            match self.backend.get_session_summary(&id).await {
                Ok(summary) => {
                    self.state.summaries.insert(id, summary);
                }
                Err(e) => debug!("No summary for {}: {}", id, e),
            }
        }
    }

    async fn load_issues(&mut self) {
        let group = self.state.active_group().map(|g| (g.path.clone(), g.default_path.clone(), g.issues_enabled()));
        let Some((group_path, repo_path, enabled)) = group else {
            return;
        };

        let issues = &mut self.state.issues;
        if issues.group_path.as_deref() != Some(group_path.as_str()) {
            issues.issues.clear();
            issues.selected = 0;
        }
        issues.group_path = Some(group_path);
        if !enabled {
            issues.loading = false;
            issues.error = Some("GitHub issues are not enabled for this group. Press [s] to change.".to_string());
            return;
        }

        issues.loading = true;
        match self.backend.list_issues(&repo_path).await {
            Ok(list) => {
                let issues = &mut self.state.issues;
                issues.selected = issues.selected.min(list.len().saturating_sub(1));
                issues.issues = list;
                issues.loading = false;
                issues.error = None;
                if self.state.load_error.as_ref().map(|e| e.target) == Some(LoadTarget::Issues) {
                    self.state.load_error = None;
                }
            }
            Err(e) => {
                self.state.issues.loading = false;
                self.state.issues.error = Some(e.to_string());
                self.load_failed(LoadTarget::Issues, e);
            }
        }
    }

    async fn load_worktrees(&mut self) {
        let repo = self.state.active_group().map(|g| g.default_path.clone()).filter(|p| !p.is_empty());
        let Some(repo_path) = repo else {
            return;
        };

        let panel = &mut self.state.worktrees;
        if panel.repo_path.as_deref() != Some(repo_path.as_str()) {
            panel.worktrees.clear();
            panel.selected = 0;
        }
        panel.repo_path = Some(repo_path.clone());
        panel.loading = true;

        match self.backend.list_worktrees(&repo_path).await {
            Ok(list) => {
                let panel = &mut self.state.worktrees;
                panel.selected = panel.selected.min(list.len().saturating_sub(1));
                panel.worktrees = list;
                panel.loading = false;
                panel.error = None;
                if self.state.load_error.as_ref().map(|e| e.target) == Some(LoadTarget::Worktrees) {
                    self.state.load_error = None;
                }
            }
            Err(e) => {
                self.state.worktrees.loading = false;
                self.state.worktrees.error = Some(e.to_string());
                self.load_failed(LoadTarget::Worktrees, e);
            }
        }
    }

    async fn load_log(&mut self) {
        let Some(path) = self.log_file.clone() else {
            self.state.log.error = Some("This run is not logging to a file".to_string());
            return;
        };
        self.state.log.loading = true;
        match read_app_log(&path, None).await {
            Ok(text) => self.state.log.set_text(&text),
            Err(e) => {
                warn!("Failed to read log {:?}: {}", path, e);
                self.state.log.loading = false;
                self.state.log.error = Some(format!("Failed to read {}: {}", path.display(), e));
            }
        }
    }

    /// Poll open PRs so merges done on GitHub show up.
    async fn refresh_pr_statuses(&mut self) {
        let targets: Vec<(String, String, String)> = self
            .state
            .sessions
            .iter()
            .filter(|s| matches!(&s.pr, Some(pr) if pr.state == PrState::Open))
            .filter_map(|s| {
                s.branch_label()
                    .map(|b| (s.id.clone(), s.repo_path().to_string(), b.to_string()))
            })
            .collect();

        for (session_id, repo_path, branch) in targets {
            match self.backend.check_pr_status(&repo_path, &branch).await {
                Ok(pr) => self.apply_pr_status(&session_id, pr),
                Err(e) => debug!("PR status for {} unavailable: {}", branch, e),
            }
        }
    }

    fn apply_pr_status(&mut self, session_id: &str, pr: PrInfo) {
        let merged_now = pr.state == PrState::Merged;
        if let Some(session) = self.state.sessions.iter_mut().find(|s| s.id == session_id) {
            let was_open = matches!(&session.pr, Some(old) if old.state == PrState::Open);
            if was_open && merged_now {
                info!("PR #{} for {} merged", pr.number, session.title);
                self.state
                    .notifications
                    .success(format!("PR #{} for {} was merged", pr.number, session.title));
            }
            session.pr = Some(pr.clone());
        }
        if let Some(flow) = self.state.pr_flow_mut() {
            if flow.session_id == session_id {
                flow.on_pr_status(pr);
            }
        }
    }

    async fn check_worktree_status(&mut self, session_id: &str) {
        let Some(session) = self.state.session(session_id) else {
            return;
        };
        let repo_path = session.repo_path().to_string();
        let worktree_path = session.worktree_path.clone();
        let branch = session.worktree_branch.clone();

        let result = self
            .backend
            .check_worktree_status(&repo_path, &worktree_path, &branch)
            .await;

        let Some(Modal::ConfirmRemove(dialog)) = self.state.modal.as_mut() else {
            return;
        };
        if dialog.session_id != session_id {
            return;
        }
        dialog.checking = false;
        match result {
            Ok(status) => dialog.worktree_status = Some(status),
            Err(e) => {
                warn!("Worktree status check failed: {}", e);
                dialog.error = Some(format!("Could not check worktree: {}", e));
            }
        }
    }

    async fn attach_terminal(&mut self, session_id: &str) {
        let Some(session) = self.state.session(session_id) else {
            self.state.notifications.error("Session no longer exists");
            self.state.focus = Focus::Sessions;
            self.state.terminal = None;
            return;
        };

        let (cols, rows) = self.terminal_size();
        let reuse = matches!(&self.state.terminal, Some(t) if t.session_id == session_id);
        if !reuse {
            let terminal = TerminalSession::new(
                session,
                cols,
                rows,
                self.config.terminal.scrollback_lines,
                RetryPolicy::from(&self.config.terminal),
            );
            if let Some(previous) = self.state.terminal.replace(terminal) {
                if let Err(e) = self.backend.detach_terminal(&previous.session_id).await {
                    debug!("Detach of {} failed: {}", previous.session_id, e);
                }
            }
        }

        let Some(terminal) = self.state.terminal.as_mut() else {
            return;
        };
        if terminal.attach.is_attached() {
            return;
        }
        terminal.stream.resize(cols, rows);
        info!(
            "Attaching to {} (attempt {:?})",
            terminal.tmux_session,
            terminal.attempt()
        );

        let tmux_session = terminal.tmux_session.clone();
        let result = self
            .backend
            .attach_terminal(session_id, &tmux_session, cols, rows)
            .await;

        // The user may have detached while the call was in flight.
        let Some(terminal) = self.state.terminal.as_mut() else {
            return;
        };
        if terminal.session_id != session_id {
            return;
        }
        match result {
            Ok(()) => terminal.attach_succeeded(),
            Err(e) => {
                if terminal.attach_failed(&e.to_string(), Instant::now()).is_none() {
                    warn!("Giving up attaching to {}: {}", tmux_session, e);
                }
            }
        }
    }

    async fn load_diff(&mut self, session_id: &str) {
        let Some(session) = self.state.session(session_id) else {
            return;
        };
        let worktree_path = session.working_path().to_string();
        let branch = session.branch_label().unwrap_or_default().to_string();

        let result = self.backend.get_branch_diff(&worktree_path, &branch).await;

        let Some(diff) = self.state.diff.as_mut() else {
            return;
        };
        if diff.session_id != session_id {
            return;
        }
        match result {
            Ok(text) => diff.set_files(parse_unified_diff(&text)),
            Err(e) => {
                diff.loading = false;
                diff.error = Some(e.to_string());
            }
        }
    }

    async fn run_pr_step(&mut self) {
        let Some(flow) = self.state.pr_flow_mut() else {
            return;
        };
        let Some(step) = flow.next_step() else {
            return;
        };
        let flow = flow.clone();
        debug!("PR flow for {}: {:?}", flow.branch, step);

        let base_branch = match flow.base_branch.clone() {
            Some(base) => base,
            None => match self.backend.get_default_branch(&flow.repo_path).await {
                Ok(base) => {
                    if let Some(current) = self.state.pr_flow_mut() {
                        current.base_branch = Some(base.clone());
                    }
                    base
                }
                Err(e) => {
                    if let Some(current) = self.state.pr_flow_mut() {
                        current.on_failure(format!("Could not resolve default branch: {}", e));
                    }
                    return;
                }
            },
        };

        let result = match step {
            PrStep::Rebase => self
                .backend
                .rebase_worktree(&flow.worktree_path, &base_branch)
                .await
                .map(|_| StepOutcome::Done),
            PrStep::Push => self
                .backend
                .push_branch(&flow.worktree_path, &flow.branch)
                .await
                .map(|_| StepOutcome::Done),
            PrStep::CreatePr => self
                .backend
                .create_pr(CreatePrRequest {
                    repo_path: flow.repo_path.clone(),
                    branch: flow.branch.clone(),
                    base_branch: base_branch.clone(),
                    title: flow.title.trim().to_string(),
                    body: flow.body.clone(),
                })
                .await
                .map(StepOutcome::PrCreated),
            PrStep::Merge => self
                .backend
                .try_merge_branch(&flow.repo_path, &flow.branch, &base_branch)
                .await
                .map(StepOutcome::Merge),
        };

        if let Ok(StepOutcome::PrCreated(pr)) = &result {
            if let Some(session) = self.state.sessions.iter_mut().find(|s| s.id == flow.session_id) {
                session.pr = Some(pr.clone());
            }
        }

        let Some(current) = self.state.pr_flow_mut() else {
            info!("PR flow closed while {:?} was running", step);
            return;
        };
        if current.session_id != flow.session_id {
            return;
        }

        match result {
            Ok(outcome) => {
                current.on_success(outcome);
                if current.next_step().is_some() {
                    self.state.queue(AsyncAction::RunPrStep);
                    return;
                }
                let message = match &current.stage {
                    PrStage::Merged => Some(format!("Merged {} into {}", flow.branch, base_branch)),
                    PrStage::PrOpen(pr) => Some(format!("Opened PR #{}", pr.number)),
                    _ => None,
                };
                if let Some(message) = message {
                    self.state.notifications.success(message);
                    self.state.queue(AsyncAction::LoadSessions);
                }
            }
            Err(e) => {
                warn!("PR step {:?} failed: {}", step, e);
                current.on_failure(e.to_string());
            }
        }
    }
}
