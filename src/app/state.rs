// ABOUTME: Application state management and view switching logic
// Holds transient copies of backend data plus local-only selection, modal and panel state

use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info, warn};

use super::forms::{
    ConfirmPrompt, GroupForm, GroupSettingsForm, IssueForm, MoveForm, NewSessionForm, RemoveConfirmation, RenameForm,
    WorktreeForm,
};
use super::notification::Notifications;
use super::pr_flow::PrFlow;
use crate::backend::CreateSessionRequest;
use crate::config::{preferences, Preferences};
use crate::diff::{DiffStats, FileDiff};
use crate::models::{
    AttentionCounts, AttentionStatus, GitHubIssue, Group, GroupSettings, Prerequisite, Session, SessionSummary,
    VersionCheck, Worktree,
};
use crate::terminal::TerminalSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sessions,
    Terminal,
}

/// Content of the main area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Sessions,
    Diff,
    Issues,
    Worktrees,
    Log,
}

#[derive(Debug, Clone)]
pub enum Modal {
    NewSession(NewSessionForm),
    NewGroup(GroupForm),
    Rename(RenameForm),
    Move(MoveForm),
    GroupSettings(GroupSettingsForm),
    Issue(IssueForm),
    NewWorktree(WorktreeForm),
    ConfirmRemove(RemoveConfirmation),
    Confirm(ConfirmPrompt),
    PrFlow(PrFlow),
}

/// Card shown while a session creation is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCreation {
    pub id: String,
    pub title: String,
    pub group_path: String,
    pub project_path: String,
    pub started_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTarget {
    Sessions,
    Groups,
    Issues,
    Worktrees,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub target: LoadTarget,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct DiffView {
    pub session_id: String,
    pub title: String,
    pub branch: String,
    pub files: Vec<FileDiff>,
    pub stats: DiffStats,
    pub selected_file: usize,
    pub scroll: usize,
    pub loading: bool,
    pub error: Option<String>,
}

impl DiffView {
    pub fn loading(session: &Session) -> Self {
        Self {
            session_id: session.id.clone(),
            title: session.title.clone(),
            branch: session.worktree_branch.clone(),
            files: Vec::new(),
            stats: DiffStats::default(),
            selected_file: 0,
            scroll: 0,
            loading: true,
            error: None,
        }
    }

    pub fn set_files(&mut self, files: Vec<FileDiff>) {
        self.stats = DiffStats::from_files(&files);
        self.files = files;
        self.selected_file = 0;
        self.scroll = 0;
        self.loading = false;
        self.error = None;
    }

    pub fn selected(&self) -> Option<&FileDiff> {
        self.files.get(self.selected_file)
    }

    pub fn next_file(&mut self) {
        if !self.files.is_empty() {
            self.selected_file = (self.selected_file + 1) % self.files.len();
            self.scroll = 0;
        }
    }

    pub fn previous_file(&mut self) {
        if !self.files.is_empty() {
            self.selected_file = (self.selected_file + self.files.len() - 1) % self.files.len();
            self.scroll = 0;
        }
    }

    pub fn scroll_down(&mut self, lines: usize) {
        let max = self.selected_line_count().saturating_sub(1);
        self.scroll = (self.scroll + lines).min(max);
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    /// Rendered rows for the selected file: one per hunk header plus its lines.
    pub fn selected_line_count(&self) -> usize {
        self.selected()
            .map(|f| f.hunks.iter().map(|h| h.lines.len() + 1).sum())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct IssuesPanel {
    /// Group the loaded issues belong to.
    pub group_path: Option<String>,
    pub issues: Vec<GitHubIssue>,
    pub selected: usize,
    pub loading: bool,
    pub error: Option<String>,
}

impl IssuesPanel {
    pub fn selected_issue(&self) -> Option<&GitHubIssue> {
        self.issues.get(self.selected)
    }

    pub fn next(&mut self) {
        if !self.issues.is_empty() {
            self.selected = (self.selected + 1).min(self.issues.len() - 1);
        }
    }

    pub fn previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorktreesPanel {
    /// Repository the listing belongs to.
    pub repo_path: Option<String>,
    pub worktrees: Vec<Worktree>,
    pub selected: usize,
    pub loading: bool,
    pub error: Option<String>,
}

impl WorktreesPanel {
    pub fn selected_worktree(&self) -> Option<&Worktree> {
        self.worktrees.get(self.selected)
    }

    pub fn next(&mut self) {
        if !self.worktrees.is_empty() {
            self.selected = (self.selected + 1).min(self.worktrees.len() - 1);
        }
    }

    pub fn previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// The repository's own checkout, which git refuses to remove.
    pub fn is_main_checkout(&self, worktree: &Worktree) -> bool {
        worktree.is_bare
            || self
                .repo_path
                .as_deref()
                .map(|repo| repo.trim_end_matches('/') == worktree.path.trim_end_matches('/'))
                .unwrap_or(false)
    }
}

/// Tail of orca's own log file.
#[derive(Debug, Clone, Default)]
pub struct LogView {
    pub lines: Vec<String>,
    /// Lines scrolled up from the bottom.
    pub scroll: usize,
    pub loading: bool,
    pub error: Option<String>,
}

impl LogView {
    pub fn set_text(&mut self, text: &str) {
        self.lines = text.lines().map(str::to_string).collect();
        self.scroll = self.scroll.min(self.lines.len().saturating_sub(1));
        self.loading = false;
        self.error = None;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll = (self.scroll + lines).min(self.lines.len().saturating_sub(1));
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncAction {
    /// Make every poll task due on the next tick.
    RefreshAll,
    CheckVersion,
    CheckPrerequisites,
    LoadSessions,
    LoadGroups,
    LoadAttention,
    LoadAttentionSessions,
    CheckLiveness,
    LoadIssues,
    LoadWorktrees,
    LoadLog,
    RefreshPrStatuses,
    CreateSession(CreateSessionRequest),
    CreateGroup { name: String, default_path: String },
    SaveGroupSettings { group_path: String, settings: GroupSettings },
    CheckWorktreeStatus { session_id: String },
    RemoveSession { session_id: String, remove_worktree: bool },
    RestartSession { session_id: String },
    RenameSession { session_id: String, title: String },
    MoveSession { session_id: String, group_path: String },
    AttachTerminal { session_id: String },
    WriteTerminal { session_id: String, data: Vec<u8> },
    PasteTerminal { session_id: String, text: String },
    DetachTerminal { session_id: String },
    LoadDiff { session_id: String },
    RunPrStep,
    AbortMerge { worktree_path: String },
    CreateIssue { repo_path: String, title: String, body: String },
    UpdateIssue { repo_path: String, number: u64, title: String, body: String, labels: Vec<String> },
    AssignIssue { repo_path: String, number: u64 },
    CloseIssue { repo_path: String, number: u64 },
    AddWorktree { repo_path: String, branch: String },
    RemoveWorktree { repo_path: String, worktree_path: String },
    CopyToClipboard(String),
}

impl AsyncAction {
    /// Reloads collapse when queued twice.
    pub fn is_reload(&self) -> bool {
        matches!(
            self,
            AsyncAction::RefreshAll
                | AsyncAction::LoadSessions
                | AsyncAction::LoadGroups
                | AsyncAction::LoadAttention
                | AsyncAction::LoadAttentionSessions
                | AsyncAction::CheckLiveness
                | AsyncAction::LoadIssues
                | AsyncAction::LoadWorktrees
                | AsyncAction::LoadLog
                | AsyncAction::RefreshPrStatuses
        )
    }

    /// Actions that work without a backend connection.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            AsyncAction::RefreshAll
                | AsyncAction::LoadLog
                | AsyncAction::DetachTerminal { .. }
                | AsyncAction::CopyToClipboard(_)
        )
    }
}

#[derive(Debug)]
pub struct AppState {
    pub groups: Vec<Group>,
    pub sessions: Vec<Session>,
    pub summaries: HashMap<String, SessionSummary>,
    pub attention_counts: AttentionCounts,
    /// tmux sessions seen by the last liveness poll; `None` until the first one.
    pub live_tmux: Option<HashSet<String>>,
    /// `None` shows every group.
    pub selected_group: Option<String>,
    pub focused_session: Option<String>,
    pub search: String,
    pub search_active: bool,
    /// Show only sessions the backend reports as needing the user.
    pub attention_only: bool,
    /// Ids from the last attention query; `None` until it answers.
    pub attention_sessions: Option<HashSet<String>>,
    pub pending_creations: Vec<PendingCreation>,
    pub removing: HashSet<String>,
    pub notifications: Notifications,
    pub modal: Option<Modal>,
    pub help_visible: bool,
    pub focus: Focus,
    pub panel: Panel,
    pub terminal: Option<TerminalSession>,
    pub diff: Option<DiffView>,
    pub issues: IssuesPanel,
    pub worktrees: WorktreesPanel,
    pub log: LogView,
    pub load_error: Option<LoadError>,
    pub sessions_loaded: bool,
    pub backend_connected: bool,
    pub backend_version: Option<VersionCheck>,
    pub prerequisites: Vec<Prerequisite>,
    pub preferences: Preferences,
    pub pending_async_actions: VecDeque<AsyncAction>,
    pub should_quit: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Preferences::in_memory())
    }
}

impl AppState {
    pub fn new(preferences: Preferences) -> Self {
        Self {
            groups: Vec::new(),
            sessions: Vec::new(),
            summaries: HashMap::new(),
            attention_counts: AttentionCounts::default(),
            live_tmux: None,
            selected_group: None,
            focused_session: None,
            search: String::new(),
            search_active: false,
            attention_only: false,
            attention_sessions: None,
            pending_creations: Vec::new(),
            removing: HashSet::new(),
            notifications: Notifications::default(),
            modal: None,
            help_visible: false,
            focus: Focus::Sessions,
            panel: Panel::Sessions,
            terminal: None,
            diff: None,
            issues: IssuesPanel::default(),
            worktrees: WorktreesPanel::default(),
            log: LogView::default(),
            load_error: None,
            sessions_loaded: false,
            backend_connected: true,
            backend_version: None,
            prerequisites: Vec::new(),
            preferences,
            pending_async_actions: VecDeque::new(),
            should_quit: false,
        }
    }

    pub fn queue(&mut self, action: AsyncAction) {
        if action.is_reload() && self.pending_async_actions.contains(&action) {
            return;
        }
        self.pending_async_actions.push_back(action);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn toggle_help(&mut self) {
        self.help_visible = !self.help_visible;
    }

    // Groups

    pub fn selected_group(&self) -> Option<&Group> {
        let path = self.selected_group.as_deref()?;
        self.groups.iter().find(|g| g.path == path)
    }

    pub fn group(&self, path: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.path == path)
    }

    /// Group new sessions and issues act on: the selected one, else the first.
    pub fn active_group(&self) -> Option<&Group> {
        self.selected_group().or_else(|| self.groups.first())
    }

    fn group_cycle_position(&self) -> usize {
        match &self.selected_group {
            None => 0,
            Some(path) => self.groups.iter().position(|g| g.path == *path).map(|i| i + 1).unwrap_or(0),
        }
    }

    fn select_group_at(&mut self, position: usize) {
        self.selected_group = if position == 0 {
            None
        } else {
            self.groups.get(position - 1).map(|g| g.path.clone())
        };
        self.focused_session = None;
        self.ensure_focus(0);
        match self.panel {
            Panel::Issues => self.queue(AsyncAction::LoadIssues),
            Panel::Worktrees => self.queue(AsyncAction::LoadWorktrees),
            _ => {}
        }
    }

    pub fn select_next_group(&mut self) {
        let len = self.groups.len() + 1;
        let next = (self.group_cycle_position() + 1) % len;
        self.select_group_at(next);
    }

    pub fn select_previous_group(&mut self) {
        let len = self.groups.len() + 1;
        let prev = (self.group_cycle_position() + len - 1) % len;
        self.select_group_at(prev);
    }

    // Sessions

    /// Sessions in the selected group matching the search text, in display order.
    pub fn visible_sessions(&self) -> Vec<&Session> {
        let mut sessions: Vec<&Session> = self
            .sessions
            .iter()
            .filter(|s| match &self.selected_group {
                Some(path) => s.group_path == *path,
                None => true,
            })
            .filter(|s| s.matches_search(&self.search))
            .filter(|s| !self.attention_only || self.needs_attention(&s.id))
            .collect();
        let group_order = |path: &str| {
            self.groups
                .iter()
                .position(|g| g.path == path)
                .unwrap_or(usize::MAX)
        };
        sessions.sort_by(|a, b| {
            group_order(&a.group_path)
                .cmp(&group_order(&b.group_path))
                .then(a.sort_order.cmp(&b.sort_order))
        });
        sessions
    }

    pub fn visible_placeholders(&self) -> Vec<&PendingCreation> {
        self.pending_creations
            .iter()
            .filter(|p| match &self.selected_group {
                Some(path) => p.group_path == *path,
                None => true,
            })
            .collect()
    }

    fn needs_attention(&self, session_id: &str) -> bool {
        self.attention_sessions
            .as_ref()
            .map(|ids| ids.contains(session_id))
            .unwrap_or(false)
    }

    pub fn toggle_attention_filter(&mut self) {
        self.attention_only = !self.attention_only;
        if self.attention_only {
            self.queue(AsyncAction::LoadAttentionSessions);
        }
        self.ensure_focus(0);
    }

    pub fn apply_attention_sessions(&mut self, sessions: Vec<Session>) {
        debug!("{} sessions need attention", sessions.len());
        self.attention_sessions = Some(sessions.into_iter().map(|s| s.id).collect());
        self.ensure_focus(0);
    }

    pub fn session(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn focus_index(&self) -> Option<usize> {
        let id = self.focused_session.as_deref()?;
        self.visible_sessions().iter().position(|s| s.id == id)
    }

    pub fn focused(&self) -> Option<&Session> {
        let id = self.focused_session.as_deref()?;
        self.visible_sessions().into_iter().find(|s| s.id == id)
    }

    fn focus_at(&mut self, index: usize) {
        let id = self.visible_sessions().get(index).map(|s| s.id.clone());
        self.focused_session = id;
    }

    /// Keep the focused id if still visible, else fall back to the nearest index.
    fn ensure_focus(&mut self, fallback_index: usize) {
        if self.focus_index().is_some() {
            return;
        }
        let len = self.visible_sessions().len();
        if len == 0 {
            self.focused_session = None;
        } else {
            self.focus_at(fallback_index.min(len - 1));
        }
    }

    pub fn focus_next(&mut self) {
        let len = self.visible_sessions().len();
        if len == 0 {
            return;
        }
        let next = match self.focus_index() {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        };
        self.focus_at(next);
    }

    pub fn focus_previous(&mut self) {
        let idx = self.focus_index().unwrap_or(0).saturating_sub(1);
        self.focus_at(idx);
    }

    pub fn focus_top(&mut self) {
        self.focus_at(0);
    }

    pub fn focus_bottom(&mut self) {
        let len = self.visible_sessions().len();
        if len > 0 {
            self.focus_at(len - 1);
        }
    }

    pub fn set_search(&mut self, search: String) {
        self.search = search;
        self.ensure_focus(0);
    }

    // Loaded data

    pub fn apply_sessions(&mut self, sessions: Vec<Session>) {
        let previous_index = self.focus_index().unwrap_or(0);
        debug!("Applying {} sessions", sessions.len());
        self.sessions = sessions;
        self.sessions_loaded = true;

        let ids: HashSet<&str> = self.sessions.iter().map(|s| s.id.as_str()).collect();
        self.summaries.retain(|id, _| ids.contains(id.as_str()));
        self.removing.retain(|id| ids.contains(id.as_str()));
        let placeholders: HashSet<&str> = self.pending_creations.iter().map(|p| p.id.as_str()).collect();
        self.notifications
            .forget_dismissed(|subject| ids.contains(subject) || placeholders.contains(subject));

        if self.load_error.as_ref().map(|e| e.target) == Some(LoadTarget::Sessions) {
            self.load_error = None;
        }
        self.ensure_focus(previous_index);
    }

    pub fn apply_groups(&mut self, groups: Vec<Group>) {
        let mut groups = groups;
        groups.sort_by_key(|g| g.sort_order);
        self.groups = groups;
        if self.selected_group.is_some() && self.selected_group().is_none() {
            info!("Selected group disappeared, showing all sessions");
            self.selected_group = None;
        }
        if self.load_error.as_ref().map(|e| e.target) == Some(LoadTarget::Groups) {
            self.load_error = None;
        }
        self.ensure_focus(0);
    }

    pub fn apply_liveness(&mut self, tmux_sessions: Vec<String>) {
        self.live_tmux = Some(tmux_sessions.into_iter().collect());
    }

    pub fn set_load_error(&mut self, target: LoadTarget, message: impl Into<String>) {
        self.load_error = Some(LoadError {
            target,
            message: message.into(),
        });
    }

    /// Queue the reload behind the current load error, clearing it.
    pub fn retry_load(&mut self) -> bool {
        let Some(error) = self.load_error.take() else {
            return false;
        };
        let action = match error.target {
            LoadTarget::Sessions => AsyncAction::LoadSessions,
            LoadTarget::Groups => AsyncAction::LoadGroups,
            LoadTarget::Issues => AsyncAction::LoadIssues,
            LoadTarget::Worktrees => AsyncAction::LoadWorktrees,
        };
        self.queue(action);
        true
    }

    pub fn apply_version_check(&mut self, check: VersionCheck) {
        if check.is_supported() {
            info!("agent-deck {} is supported", check.installed_version());
        } else {
            warn!(
                "agent-deck {} is older than supported {}",
                check.installed_version(),
                check.supported
            );
            self.notifications.error_once(
                "agent-deck-version",
                format!(
                    "agent-deck {} is not supported (need {} or newer); some features may misbehave",
                    check.installed_version(),
                    check.supported
                ),
            );
        }
        self.backend_version = Some(check);
    }

    pub fn apply_prerequisites(&mut self, tools: Vec<Prerequisite>) {
        for tool in tools.iter().filter(|t| !t.found) {
            if tool.required {
                warn!("Required tool {} not found", tool.name);
                self.notifications.error_once(
                    format!("missing-tool:{}", tool.name),
                    format!("{} is required but was not found on PATH", tool.name),
                );
            } else {
                info!("Optional tool {} not found", tool.name);
                self.notifications
                    .info(format!("{} not found; features that need it are unavailable", tool.name));
            }
        }
        self.prerequisites = tools;
    }

    pub fn tmux_alive(&self, session: &Session) -> Option<bool> {
        if !session.has_tmux() {
            return None;
        }
        self.live_tmux.as_ref().map(|live| live.contains(&session.tmux_session))
    }

    /// Summary attention when known, otherwise derived from the raw status.
    pub fn attention_for(&self, session: &Session) -> AttentionStatus {
        let tmux_alive = self.tmux_alive(session);
        match self.summaries.get(&session.id) {
            Some(summary) if tmux_alive != Some(false) || summary.attention == AttentionStatus::Error => {
                summary.attention
            }
            _ => AttentionStatus::fallback(&session.status, tmux_alive),
        }
    }

    // Modals

    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    pub fn open_new_session(&mut self) {
        match self.active_group() {
            Some(group) => {
                self.modal = Some(Modal::NewSession(NewSessionForm::for_group(group)));
            }
            None => {
                self.notifications.info("Create a group first with [N]");
            }
        }
    }

    pub fn open_new_group(&mut self) {
        self.modal = Some(Modal::NewGroup(GroupForm::default()));
    }

    pub fn open_rename(&mut self) {
        if let Some(session) = self.focused() {
            self.modal = Some(Modal::Rename(RenameForm::for_session(session)));
        }
    }

    pub fn open_move(&mut self) {
        if self.groups.len() < 2 {
            self.notifications.info("Only one group exists");
            return;
        }
        if let Some(session) = self.focused() {
            let form = MoveForm::new(session, &self.groups);
            self.modal = Some(Modal::Move(form));
        }
    }

    pub fn open_group_settings(&mut self) {
        if let Some(group) = self.active_group() {
            self.modal = Some(Modal::GroupSettings(GroupSettingsForm::for_group(group)));
        }
    }

    fn issue_repo(&mut self) -> Option<String> {
        let repo = self.active_group().filter(|g| g.issues_enabled()).map(|g| g.default_path.clone());
        if repo.is_none() {
            self.notifications.info("GitHub issues are not enabled for this group");
        }
        repo
    }

    pub fn open_new_issue(&mut self) {
        if let Some(repo_path) = self.issue_repo() {
            self.modal = Some(Modal::Issue(IssueForm::new(repo_path)));
        }
    }

    pub fn open_edit_issue(&mut self) {
        let Some(issue) = self.issues.selected_issue().cloned() else {
            return;
        };
        if let Some(repo_path) = self.issue_repo() {
            self.modal = Some(Modal::Issue(IssueForm::for_issue(repo_path, &issue)));
        }
    }

    pub fn assign_selected_issue(&mut self) {
        let Some(number) = self.issues.selected_issue().map(|i| i.number) else {
            return;
        };
        if let Some(repo_path) = self.issue_repo() {
            self.queue(AsyncAction::AssignIssue { repo_path, number });
        }
    }

    pub fn request_close_issue(&mut self) {
        let Some(issue) = self.issues.selected_issue() else {
            return;
        };
        let number = issue.number;
        let message = format!("Close issue #{} \"{}\" on GitHub?", number, issue.title);
        if let Some(repo_path) = self.issue_repo() {
            self.modal = Some(Modal::Confirm(ConfirmPrompt::new(
                "Close Issue",
                message,
                "Close",
                AsyncAction::CloseIssue { repo_path, number },
            )));
        }
    }

    pub fn open_new_worktree(&mut self) {
        match self.worktrees.repo_path.clone() {
            Some(repo_path) => self.modal = Some(Modal::NewWorktree(WorktreeForm::new(repo_path))),
            None => {
                self.notifications.info("This group has no repository");
            }
        }
    }

    /// Confirms removal, refusing checkouts git or a session still needs.
    pub fn request_remove_worktree(&mut self) {
        let Some(worktree) = self.worktrees.selected_worktree() else {
            return;
        };
        let Some(repo_path) = self.worktrees.repo_path.clone() else {
            return;
        };
        if self.worktrees.is_main_checkout(worktree) {
            self.notifications.info("The main checkout cannot be removed");
            return;
        }
        let path = worktree.path.clone();
        let label = if worktree.is_detached() {
            path.clone()
        } else {
            worktree.branch_name().to_string()
        };
        if let Some(session) = self.sessions.iter().find(|s| s.worktree_path == path) {
            let message = format!("{} is used by session {}; remove the session instead", label, session.title);
            self.notifications.info(message);
            return;
        }
        self.modal = Some(Modal::Confirm(ConfirmPrompt::new(
            "Remove Worktree",
            format!("Remove worktree {}? Uncommitted changes in it are lost.", label),
            "Remove",
            AsyncAction::RemoveWorktree {
                repo_path,
                worktree_path: path,
            },
        )));
    }

    pub fn start_session_on_worktree(&mut self) {
        let panel = &self.worktrees;
        let (Some(repo_path), Some(worktree)) = (&panel.repo_path, panel.selected_worktree()) else {
            return;
        };
        if worktree.is_detached() || panel.is_main_checkout(worktree) {
            self.notifications.info("Pick a worktree with a branch");
            return;
        }
        let form = self
            .active_group()
            .map(|group| NewSessionForm::for_worktree(group, repo_path, worktree));
        if let Some(form) = form {
            self.modal = Some(Modal::NewSession(form));
        }
    }

    /// Queues the confirmed action of a yes/no prompt.
    pub fn confirm_prompt(&mut self) {
        if let Some(Modal::Confirm(prompt)) = self.modal.take() {
            self.queue(prompt.action);
        }
    }

    /// Opens the remove dialog, or removes straight away when the user opted
    /// out of confirmations and there is no worktree to inspect.
    pub fn request_remove(&mut self) {
        let Some(session) = self.focused() else {
            return;
        };
        if self.removing.contains(&session.id) {
            return;
        }
        let session_id = session.id.clone();
        let has_worktree = session.has_worktree();
        let confirm = RemoveConfirmation::for_session(session);

        if self.preferences.flag(preferences::SKIP_REMOVE_CONFIRMATION) && !has_worktree {
            self.begin_remove(session_id, false);
            return;
        }
        self.modal = Some(Modal::ConfirmRemove(confirm));
        if has_worktree {
            self.queue(AsyncAction::CheckWorktreeStatus { session_id });
        }
    }

    pub fn begin_remove(&mut self, session_id: String, remove_worktree: bool) {
        self.removing.insert(session_id.clone());
        self.queue(AsyncAction::RemoveSession {
            session_id,
            remove_worktree,
        });
    }

    pub fn open_pr_flow(&mut self) {
        let Some(session) = self.focused() else {
            return;
        };
        if !session.has_worktree() {
            self.notifications.info("Merging needs a session with a worktree");
            return;
        }
        let workflow = self
            .group(&session.group_path)
            .map(|g| g.settings.merge_workflow)
            .unwrap_or_default();
        let Some(mut flow) = PrFlow::for_session(session, workflow) else {
            return;
        };
        if self.preferences.flag(preferences::SKIP_MERGE_CONFIRMATION) && flow.confirm() {
            self.queue(AsyncAction::RunPrStep);
        }
        self.modal = Some(Modal::PrFlow(flow));
    }

    pub fn pr_flow_mut(&mut self) -> Option<&mut PrFlow> {
        match self.modal.as_mut() {
            Some(Modal::PrFlow(flow)) => Some(flow),
            _ => None,
        }
    }

    pub fn add_placeholder(&mut self, request: &CreateSessionRequest) {
        self.pending_creations.push(PendingCreation {
            id: request.placeholder_id.clone(),
            title: request.title.clone(),
            group_path: request.group_path.clone(),
            project_path: request.project_path.clone(),
            started_at: chrono::Utc::now().timestamp(),
        });
    }

    pub fn remove_placeholder(&mut self, placeholder_id: &str) -> Option<PendingCreation> {
        let pos = self.pending_creations.iter().position(|p| p.id == placeholder_id)?;
        Some(self.pending_creations.remove(pos))
    }

    // Panels

    pub fn show_diff(&mut self) {
        let Some(session) = self.focused() else {
            return;
        };
        if !session.has_worktree() {
            self.notifications.info("Diffs are shown for worktree sessions");
            return;
        }
        let view = DiffView::loading(session);
        let session_id = view.session_id.clone();
        self.diff = Some(view);
        self.panel = Panel::Diff;
        self.queue(AsyncAction::LoadDiff { session_id });
    }

    pub fn toggle_issues(&mut self) {
        self.toggle_panel(Panel::Issues, AsyncAction::LoadIssues);
    }

    pub fn toggle_worktrees(&mut self) {
        let repo = self.active_group().map(|g| g.default_path.clone()).filter(|p| !p.is_empty());
        if self.panel != Panel::Worktrees && repo.is_none() {
            self.notifications.info("This group has no default project path");
            return;
        }
        self.toggle_panel(Panel::Worktrees, AsyncAction::LoadWorktrees);
    }

    pub fn toggle_log(&mut self) {
        self.toggle_panel(Panel::Log, AsyncAction::LoadLog);
    }

    fn toggle_panel(&mut self, panel: Panel, load: AsyncAction) {
        if self.panel == panel {
            self.panel = Panel::Sessions;
            return;
        }
        self.panel = panel;
        self.diff = None;
        self.queue(load);
    }

    pub fn close_panel(&mut self) {
        self.panel = Panel::Sessions;
        self.diff = None;
    }

    pub fn start_session_from_issue(&mut self) {
        let Some(group) = self.active_group() else {
            return;
        };
        let Some(issue) = self.issues.selected_issue() else {
            return;
        };
        self.modal = Some(Modal::NewSession(NewSessionForm::from_issue(group, issue)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionStatus;

    fn session(id: &str, group: &str, order: i32) -> Session {
        let mut s = Session::new(id, format!("session {}", id), "/src/app", group);
        s.sort_order = order;
        s
    }

    fn state_with_sessions() -> AppState {
        let mut state = AppState::default();
        state.apply_groups(vec![Group::new("work", "Work", "/src/work"), Group::new("home", "Home", "")]);
        state.apply_sessions(vec![session("a", "work", 0), session("b", "home", 0), session("c", "work", 1)]);
        state
    }

    #[test]
    fn test_initial_focus_and_navigation() {
        let mut state = state_with_sessions();
        assert_eq!(state.focused_session.as_deref(), Some("a"));
        state.focus_next();
        assert_eq!(state.focused_session.as_deref(), Some("c"));
        state.focus_next();
        assert_eq!(state.focused_session.as_deref(), Some("b"));
        state.focus_next();
        assert_eq!(state.focused_session.as_deref(), Some("b"));
        state.focus_top();
        assert_eq!(state.focus_index(), Some(0));
        state.focus_previous();
        assert_eq!(state.focus_index(), Some(0));
        state.focus_bottom();
        assert_eq!(state.focus_index(), Some(2));
    }

    #[test]
    fn test_group_cycle_filters_sessions() {
        let mut state = state_with_sessions();
        state.select_next_group();
        assert_eq!(state.selected_group.as_deref(), Some("work"));
        let ids: Vec<&str> = state.visible_sessions().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        state.select_next_group();
        assert_eq!(state.selected_group.as_deref(), Some("home"));
        assert_eq!(state.focused_session.as_deref(), Some("b"));
        state.select_next_group();
        assert_eq!(state.selected_group, None);
        state.select_previous_group();
        assert_eq!(state.selected_group.as_deref(), Some("home"));
    }

    #[test]
    fn test_reload_keeps_focus_by_id() {
        let mut state = state_with_sessions();
        state.focus_next();
        assert_eq!(state.focused_session.as_deref(), Some("c"));
        state.apply_sessions(vec![session("z", "work", -1), session("a", "work", 0), session("c", "work", 1)]);
        assert_eq!(state.focused_session.as_deref(), Some("c"));

        // Focused session removed elsewhere: nearest index takes over.
        state.apply_sessions(vec![session("z", "work", -1), session("a", "work", 0)]);
        assert_eq!(state.focused_session.as_deref(), Some("a"));
    }

    #[test]
    fn test_search_narrows_and_refocuses() {
        let mut state = state_with_sessions();
        state.set_search("session c".to_string());
        assert_eq!(state.visible_sessions().len(), 1);
        assert_eq!(state.focused_session.as_deref(), Some("c"));
        state.set_search("nothing".to_string());
        assert!(state.focused_session.is_none());
    }

    #[test]
    fn test_attention_uses_summary_then_fallback() {
        let mut state = state_with_sessions();
        let mut s = session("t", "work", 5);
        s.status = SessionStatus::Running;
        s.tmux_session = "orca_t".to_string();
        state.apply_sessions(vec![s.clone()]);

        assert_eq!(state.attention_for(&s), AttentionStatus::Running);
        state.summaries.insert(
            "t".to_string(),
            SessionSummary {
                summary: None,
                attention: AttentionStatus::NeedsInput,
                last_tool: None,
                last_text: None,
            },
        );
        assert_eq!(state.attention_for(&s), AttentionStatus::NeedsInput);

        state.apply_liveness(vec!["other".to_string()]);
        assert_eq!(state.attention_for(&s), AttentionStatus::Stale);
    }

    #[test]
    fn test_reload_actions_collapse() {
        let mut state = AppState::default();
        state.queue(AsyncAction::LoadSessions);
        state.queue(AsyncAction::LoadSessions);
        let write = AsyncAction::WriteTerminal {
            session_id: "s".to_string(),
            data: b"a".to_vec(),
        };
        state.queue(write.clone());
        state.queue(write);
        assert_eq!(state.pending_async_actions.len(), 3);
    }

    #[test]
    fn test_retry_load_queues_matching_reload_once() {
        let mut state = AppState::default();
        assert!(!state.retry_load());
        state.set_load_error(LoadTarget::Groups, "backend timed out");
        assert!(state.retry_load());
        assert!(state.load_error.is_none());
        assert_eq!(state.pending_async_actions.pop_front(), Some(AsyncAction::LoadGroups));
    }

    #[test]
    fn test_remove_respects_skip_preference() {
        let mut state = state_with_sessions();
        state.request_remove();
        assert!(matches!(state.modal, Some(Modal::ConfirmRemove(_))));

        let mut state = state_with_sessions();
        state
            .preferences
            .set_flag(preferences::SKIP_REMOVE_CONFIRMATION, true)
            .unwrap();
        state.request_remove();
        assert!(state.modal.is_none());
        assert!(state.removing.contains("a"));
        assert_eq!(
            state.pending_async_actions.pop_front(),
            Some(AsyncAction::RemoveSession {
                session_id: "a".to_string(),
                remove_worktree: false
            })
        );
    }

    #[test]
    fn test_new_session_needs_a_group() {
        let mut state = AppState::default();
        state.open_new_session();
        assert!(state.modal.is_none());
        assert_eq!(state.notifications.visible().len(), 1);
    }

    #[test]
    fn test_reload_forgets_dismissals_of_gone_sessions() {
        let mut state = state_with_sessions();
        let gone = state.notifications.error_once("terminal-write:b", "Terminal input lost").unwrap();
        let kept = state.notifications.error_once("terminal-write:a", "Terminal input lost").unwrap();
        let global = state.notifications.error_once("backend-offline", "Backend disconnected").unwrap();
        state.notifications.dismiss(gone);
        state.notifications.dismiss(kept);
        state.notifications.dismiss(global);

        state.apply_sessions(vec![session("a", "work", 0), session("c", "work", 1)]);

        assert!(!state.notifications.is_dismissed("terminal-write:b"));
        assert!(state.notifications.is_dismissed("terminal-write:a"));
        assert!(state.notifications.is_dismissed("backend-offline"));
    }

    #[test]
    fn test_attention_filter_hides_others_until_loaded() {
        let mut state = state_with_sessions();
        state.toggle_attention_filter();
        assert_eq!(state.pending_async_actions.pop_front(), Some(AsyncAction::LoadAttentionSessions));
        assert!(state.visible_sessions().is_empty());

        state.apply_attention_sessions(vec![session("c", "work", 1)]);
        let ids: Vec<&str> = state.visible_sessions().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);
        assert_eq!(state.focused_session.as_deref(), Some("c"));

        state.toggle_attention_filter();
        assert_eq!(state.visible_sessions().len(), 3);
        assert!(state.pending_async_actions.is_empty());
    }

    #[test]
    fn test_close_issue_asks_first() {
        let mut state = state_with_sessions();
        state.issues.issues = vec![GitHubIssue {
            number: 9,
            title: "Crash on start".to_string(),
            body: String::new(),
            state: "open".to_string(),
            labels: Vec::new(),
            assignee: None,
            created_at: String::new(),
            updated_at: String::new(),
            html_url: String::new(),
        }];
        state.request_close_issue();
        assert!(state.pending_async_actions.is_empty());
        assert!(matches!(&state.modal, Some(Modal::Confirm(prompt)) if prompt.message.contains("#9")));

        state.confirm_prompt();
        assert!(state.modal.is_none());
        assert_eq!(
            state.pending_async_actions.pop_front(),
            Some(AsyncAction::CloseIssue {
                repo_path: "/src/work".to_string(),
                number: 9
            })
        );
    }

    fn worktree(path: &str, branch: &str) -> Worktree {
        Worktree {
            path: path.to_string(),
            head: "abc1234".to_string(),
            branch: branch.to_string(),
            is_bare: false,
        }
    }

    #[test]
    fn test_worktree_removal_guards() {
        let mut state = state_with_sessions();
        let mut used = session("u", "work", 2);
        used.worktree_path = "/src/work-feature".to_string();
        state.apply_sessions(vec![used]);
        state.worktrees.repo_path = Some("/src/work".to_string());
        state.worktrees.worktrees = vec![
            worktree("/src/work", "refs/heads/main"),
            worktree("/src/work-feature", "refs/heads/feature"),
            worktree("/src/work-spike", "refs/heads/spike"),
        ];

        state.request_remove_worktree();
        assert!(state.modal.is_none());
        state.worktrees.next();
        state.request_remove_worktree();
        assert!(state.modal.is_none());
        assert_eq!(state.notifications.visible().len(), 2);

        state.worktrees.next();
        state.request_remove_worktree();
        state.confirm_prompt();
        assert_eq!(
            state.pending_async_actions.pop_front(),
            Some(AsyncAction::RemoveWorktree {
                repo_path: "/src/work".to_string(),
                worktree_path: "/src/work-spike".to_string()
            })
        );
    }

    #[test]
    fn test_log_scroll_is_bounded() {
        let mut log = LogView::default();
        log.set_text("one\ntwo\nthree");
        log.scroll_up(10);
        assert_eq!(log.scroll, 2);
        log.scroll_down(5);
        assert_eq!(log.scroll, 0);
        log.scroll_up(1);
        log.set_text("only");
        assert_eq!(log.scroll, 0);
    }

}
