// ABOUTME: Event handling system for keyboard input and app actions
// Keys are routed by priority: confirmation dialog, help, modal forms, terminal focus, then the list

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, warn};
use uuid::Uuid;

use super::forms::NewSessionField;
use super::pr_flow::PrStage;
use super::state::{AppState, AsyncAction, Focus, Modal, Panel};
use crate::config::preferences;
use crate::terminal::{encode_key, is_detach_chord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Quit,
    ToggleHelp,
    Refresh,
    RetryLoad,
    DismissNotification,
    // Session list
    NextSession,
    PreviousSession,
    GoToTop,
    GoToBottom,
    NextGroup,
    PreviousGroup,
    StartSearch,
    SearchInput(char),
    SearchBackspace,
    EndSearch,
    ClearSearch,
    NewSession,
    NewGroup,
    RenameSession,
    MoveSession,
    RemoveSession,
    RestartSession,
    GroupSettings,
    StartMergeFlow,
    ShowDiff,
    ToggleIssues,
    ToggleWorktrees,
    ToggleLog,
    ToggleAttentionFilter,
    ClosePanel,
    // Terminal
    AttachTerminal,
    DetachTerminal,
    TerminalInput(Vec<u8>),
    TerminalPaste(String),
    TerminalRetry,
    TerminalScrollUp,
    TerminalScrollDown,
    // Diff panel
    DiffNextFile,
    DiffPreviousFile,
    DiffScrollDown,
    DiffScrollUp,
    // Issues panel
    IssueNext,
    IssuePrevious,
    IssueStartSession,
    NewIssue,
    EditIssue,
    AssignIssue,
    CloseIssue,
    // Worktrees panel
    WorktreeNext,
    WorktreePrevious,
    NewWorktree,
    RemoveWorktree,
    WorktreeStartSession,
    // Log panel
    LogScrollUp,
    LogScrollDown,
    LogBottom,
    ReloadLog,
    // Modal forms
    ModalInput(char),
    ModalBackspace,
    ModalNextField,
    ModalPreviousField,
    ModalSubmit,
    ModalCancel,
    PromptConfirm,
    // Remove confirmation
    ConfirmationToggle,
    ConfirmationToggleWorktree,
    ConfirmationToggleDontShow,
    ConfirmationConfirm,
    ConfirmationCancel,
    // Merge flow
    PrFlowConfirm,
    PrFlowToggleDontAsk,
    PrFlowRetry,
    PrFlowCopyUrl,
    PrFlowAbortMerge,
}

pub struct EventHandler;

impl EventHandler {
    pub fn handle_key_event(key_event: KeyEvent, state: &mut AppState) -> Option<AppEvent> {
        // Handle confirmation dialog first (highest priority)
        if let Some(Modal::ConfirmRemove(dialog)) = &state.modal {
            return match key_event.code {
                KeyCode::Left | KeyCode::Right | KeyCode::Tab => Some(AppEvent::ConfirmationToggle),
                KeyCode::Char('w') => Some(AppEvent::ConfirmationToggleWorktree),
                KeyCode::Char('d') => Some(AppEvent::ConfirmationToggleDontShow),
                KeyCode::Char('y') => Some(AppEvent::ConfirmationConfirm),
                KeyCode::Enter if dialog.confirm_selected => Some(AppEvent::ConfirmationConfirm),
                KeyCode::Enter => Some(AppEvent::ConfirmationCancel),
                KeyCode::Esc | KeyCode::Char('n') => Some(AppEvent::ConfirmationCancel),
                _ => None,
            };
        }

        if state.help_visible {
            return match key_event.code {
                KeyCode::Char('?') | KeyCode::Esc => Some(AppEvent::ToggleHelp),
                _ => None,
            };
        }

        if let Some(modal) = &state.modal {
            return Self::handle_modal_keys(key_event, modal);
        }

        if state.focus == Focus::Terminal {
            return Self::handle_terminal_keys(key_event, state);
        }

        if state.search_active {
            return match key_event.code {
                KeyCode::Esc => Some(AppEvent::ClearSearch),
                KeyCode::Enter => Some(AppEvent::EndSearch),
                KeyCode::Backspace => Some(AppEvent::SearchBackspace),
                KeyCode::Char(ch) => Some(AppEvent::SearchInput(ch)),
                _ => None,
            };
        }

        if key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(AppEvent::Quit);
        }

        // Keys shared by every panel
        match key_event.code {
            KeyCode::Char('?') => return Some(AppEvent::ToggleHelp),
            KeyCode::Char('q') => return Some(AppEvent::Quit),
            KeyCode::Char('f') => return Some(AppEvent::Refresh),
            KeyCode::Char('r') if state.load_error.is_some() => return Some(AppEvent::RetryLoad),
            KeyCode::Char('c') => return Some(AppEvent::DismissNotification),
            KeyCode::Char('h') | KeyCode::Left => return Some(AppEvent::PreviousGroup),
            KeyCode::Char('l') | KeyCode::Right => return Some(AppEvent::NextGroup),
            KeyCode::Char('i') => return Some(AppEvent::ToggleIssues),
            KeyCode::Char('w') => return Some(AppEvent::ToggleWorktrees),
            KeyCode::Char('L') => return Some(AppEvent::ToggleLog),
            _ => {}
        }

        match state.panel {
            Panel::Diff => Self::handle_diff_keys(key_event),
            Panel::Issues => Self::handle_issue_keys(key_event),
            Panel::Worktrees => Self::handle_worktree_keys(key_event),
            Panel::Log => Self::handle_log_keys(key_event),
            Panel::Sessions => Self::handle_session_keys(key_event),
        }
    }

    fn handle_session_keys(key_event: KeyEvent) -> Option<AppEvent> {
        match key_event.code {
            KeyCode::Char('j') | KeyCode::Down => Some(AppEvent::NextSession),
            KeyCode::Char('k') | KeyCode::Up => Some(AppEvent::PreviousSession),
            KeyCode::Char('g') => Some(AppEvent::GoToTop),
            KeyCode::Char('G') => Some(AppEvent::GoToBottom),
            KeyCode::Char('/') => Some(AppEvent::StartSearch),
            KeyCode::Esc => Some(AppEvent::ClearSearch),
            KeyCode::Char('n') => Some(AppEvent::NewSession),
            KeyCode::Char('N') => Some(AppEvent::NewGroup),
            KeyCode::Char('e') => Some(AppEvent::RenameSession),
            KeyCode::Char('m') => Some(AppEvent::MoveSession),
            KeyCode::Char('d') => Some(AppEvent::RemoveSession),
            KeyCode::Char('x') => Some(AppEvent::RestartSession),
            KeyCode::Char('s') => Some(AppEvent::GroupSettings),
            KeyCode::Char('p') => Some(AppEvent::StartMergeFlow),
            KeyCode::Char('v') => Some(AppEvent::ShowDiff),
            KeyCode::Char('!') => Some(AppEvent::ToggleAttentionFilter),
            KeyCode::Enter | KeyCode::Char('a') => Some(AppEvent::AttachTerminal),
            _ => None,
        }
    }

    fn handle_diff_keys(key_event: KeyEvent) -> Option<AppEvent> {
        match key_event.code {
            KeyCode::Esc | KeyCode::Char('v') => Some(AppEvent::ClosePanel),
            KeyCode::Tab | KeyCode::Char('n') => Some(AppEvent::DiffNextFile),
            KeyCode::BackTab | KeyCode::Char('N') => Some(AppEvent::DiffPreviousFile),
            KeyCode::Char('j') | KeyCode::Down => Some(AppEvent::DiffScrollDown),
            KeyCode::Char('k') | KeyCode::Up => Some(AppEvent::DiffScrollUp),
            _ => None,
        }
    }

    fn handle_issue_keys(key_event: KeyEvent) -> Option<AppEvent> {
        match key_event.code {
            KeyCode::Esc => Some(AppEvent::ClosePanel),
            KeyCode::Char('j') | KeyCode::Down => Some(AppEvent::IssueNext),
            KeyCode::Char('k') | KeyCode::Up => Some(AppEvent::IssuePrevious),
            KeyCode::Enter => Some(AppEvent::IssueStartSession),
            KeyCode::Char('n') => Some(AppEvent::NewIssue),
            KeyCode::Char('e') => Some(AppEvent::EditIssue),
            KeyCode::Char('a') => Some(AppEvent::AssignIssue),
            KeyCode::Char('x') => Some(AppEvent::CloseIssue),
            KeyCode::Char('s') => Some(AppEvent::GroupSettings),
            _ => None,
        }
    }

    fn handle_worktree_keys(key_event: KeyEvent) -> Option<AppEvent> {
        match key_event.code {
            KeyCode::Esc => Some(AppEvent::ClosePanel),
            KeyCode::Char('j') | KeyCode::Down => Some(AppEvent::WorktreeNext),
            KeyCode::Char('k') | KeyCode::Up => Some(AppEvent::WorktreePrevious),
            KeyCode::Char('a') => Some(AppEvent::NewWorktree),
            KeyCode::Char('d') => Some(AppEvent::RemoveWorktree),
            KeyCode::Enter | KeyCode::Char('n') => Some(AppEvent::WorktreeStartSession),
            _ => None,
        }
    }

    fn handle_log_keys(key_event: KeyEvent) -> Option<AppEvent> {
        match key_event.code {
            KeyCode::Esc => Some(AppEvent::ClosePanel),
            KeyCode::Char('k') | KeyCode::Up => Some(AppEvent::LogScrollUp),
            KeyCode::Char('j') | KeyCode::Down => Some(AppEvent::LogScrollDown),
            KeyCode::Char('G') | KeyCode::End => Some(AppEvent::LogBottom),
            KeyCode::Char('r') => Some(AppEvent::ReloadLog),
            _ => None,
        }
    }

    fn handle_terminal_keys(key_event: KeyEvent, state: &AppState) -> Option<AppEvent> {
        if is_detach_chord(&key_event) {
            return Some(AppEvent::DetachTerminal);
        }

        let Some(terminal) = &state.terminal else {
            return Some(AppEvent::DetachTerminal);
        };

        if !terminal.attach.is_attached() {
            // Nothing to type into until attached.
            return match key_event.code {
                KeyCode::Char('r') => Some(AppEvent::TerminalRetry),
                KeyCode::Esc => Some(AppEvent::DetachTerminal),
                _ => None,
            };
        }

        if key_event.modifiers.contains(KeyModifiers::SHIFT) {
            match key_event.code {
                KeyCode::PageUp => return Some(AppEvent::TerminalScrollUp),
                KeyCode::PageDown => return Some(AppEvent::TerminalScrollDown),
                // A pasted newline reaches the agent's prompt without submitting it.
                KeyCode::Enter => return Some(AppEvent::TerminalPaste("\n".to_string())),
                _ => {}
            }
        }

        encode_key(&key_event).map(AppEvent::TerminalInput)
    }

    fn handle_modal_keys(key_event: KeyEvent, modal: &Modal) -> Option<AppEvent> {
        let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);
        match modal {
            Modal::PrFlow(flow) => Self::handle_pr_flow_keys(key_event, &flow.stage),
            Modal::Move(_) | Modal::GroupSettings(_) => match key_event.code {
                KeyCode::Esc => Some(AppEvent::ModalCancel),
                KeyCode::Enter => Some(AppEvent::ModalSubmit),
                KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => Some(AppEvent::ModalNextField),
                KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => Some(AppEvent::ModalPreviousField),
                KeyCode::Char(' ') => Some(AppEvent::ModalInput(' ')),
                _ => None,
            },
            Modal::Issue(_) => match key_event.code {
                KeyCode::Char('s') if ctrl => Some(AppEvent::ModalSubmit),
                KeyCode::Esc => Some(AppEvent::ModalCancel),
                KeyCode::Tab | KeyCode::BackTab => Some(AppEvent::ModalNextField),
                KeyCode::Enter => Some(AppEvent::ModalInput('\n')),
                KeyCode::Backspace => Some(AppEvent::ModalBackspace),
                KeyCode::Char(ch) => Some(AppEvent::ModalInput(ch)),
                _ => None,
            },
            Modal::Confirm(_) => match key_event.code {
                KeyCode::Char('y') | KeyCode::Enter => Some(AppEvent::PromptConfirm),
                KeyCode::Char('n') | KeyCode::Esc => Some(AppEvent::ModalCancel),
                _ => None,
            },
            Modal::NewSession(_) | Modal::NewGroup(_) | Modal::Rename(_) | Modal::NewWorktree(_) => match key_event.code {
                KeyCode::Esc => Some(AppEvent::ModalCancel),
                KeyCode::Enter => Some(AppEvent::ModalSubmit),
                KeyCode::Tab | KeyCode::Down => Some(AppEvent::ModalNextField),
                KeyCode::BackTab | KeyCode::Up => Some(AppEvent::ModalPreviousField),
                KeyCode::Backspace => Some(AppEvent::ModalBackspace),
                KeyCode::Char(ch) if !ctrl => Some(AppEvent::ModalInput(ch)),
                _ => None,
            },
            Modal::ConfirmRemove(_) => None,
        }
    }

    fn handle_pr_flow_keys(key_event: KeyEvent, stage: &PrStage) -> Option<AppEvent> {
        let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);
        match stage {
            PrStage::Confirming => match key_event.code {
                KeyCode::Enter | KeyCode::Char('y') => Some(AppEvent::PrFlowConfirm),
                KeyCode::Char('d') => Some(AppEvent::PrFlowToggleDontAsk),
                KeyCode::Esc | KeyCode::Char('n') => Some(AppEvent::ModalCancel),
                _ => None,
            },
            PrStage::EditingPr => match key_event.code {
                KeyCode::Char('s') if ctrl => Some(AppEvent::ModalSubmit),
                KeyCode::Esc => Some(AppEvent::ModalCancel),
                KeyCode::Tab | KeyCode::BackTab => Some(AppEvent::ModalNextField),
                KeyCode::Enter => Some(AppEvent::ModalInput('\n')),
                KeyCode::Backspace => Some(AppEvent::ModalBackspace),
                KeyCode::Char(ch) => Some(AppEvent::ModalInput(ch)),
                _ => None,
            },
            PrStage::Failed { .. } => match key_event.code {
                KeyCode::Char('r') => Some(AppEvent::PrFlowRetry),
                KeyCode::Esc => Some(AppEvent::ModalCancel),
                _ => None,
            },
            PrStage::PrOpen(_) | PrStage::PrMerged(_) => match key_event.code {
                KeyCode::Char('y') => Some(AppEvent::PrFlowCopyUrl),
                KeyCode::Esc | KeyCode::Enter => Some(AppEvent::ModalCancel),
                _ => None,
            },
            PrStage::Conflict { .. } => match key_event.code {
                KeyCode::Char('a') => Some(AppEvent::PrFlowAbortMerge),
                KeyCode::Esc => Some(AppEvent::ModalCancel),
                _ => None,
            },
            _ => match key_event.code {
                KeyCode::Esc | KeyCode::Enter => Some(AppEvent::ModalCancel),
                _ => None,
            },
        }
    }

    pub fn process_event(event: AppEvent, state: &mut AppState) {
        debug!("Processing {:?}", event);
        match event {
            AppEvent::Quit => state.quit(),
            AppEvent::ToggleHelp => state.toggle_help(),
            AppEvent::Refresh => state.queue(AsyncAction::RefreshAll),
            AppEvent::RetryLoad => {
                state.retry_load();
            }
            AppEvent::DismissNotification => {
                if !state.notifications.dismiss_latest() {
                    state.load_error = None;
                }
            }
            AppEvent::NextSession => state.focus_next(),
            AppEvent::PreviousSession => state.focus_previous(),
            AppEvent::GoToTop => state.focus_top(),
            AppEvent::GoToBottom => state.focus_bottom(),
            AppEvent::NextGroup => state.select_next_group(),
            AppEvent::PreviousGroup => state.select_previous_group(),
            AppEvent::StartSearch => state.search_active = true,
            AppEvent::SearchInput(ch) => {
                let mut search = state.search.clone();
                search.push(ch);
                state.set_search(search);
            }
            AppEvent::SearchBackspace => {
                let mut search = state.search.clone();
                search.pop();
                state.set_search(search);
            }
            AppEvent::EndSearch => state.search_active = false,
            AppEvent::ClearSearch => {
                state.search_active = false;
                state.set_search(String::new());
            }
            AppEvent::NewSession => state.open_new_session(),
            AppEvent::NewGroup => state.open_new_group(),
            AppEvent::RenameSession => state.open_rename(),
            AppEvent::MoveSession => state.open_move(),
            AppEvent::RemoveSession => state.request_remove(),
            AppEvent::RestartSession => {
                if let Some(session) = state.focused() {
                    let session_id = session.id.clone();
                    state.queue(AsyncAction::RestartSession { session_id });
                }
            }
            AppEvent::GroupSettings => state.open_group_settings(),
            AppEvent::StartMergeFlow => state.open_pr_flow(),
            AppEvent::ShowDiff => state.show_diff(),
            AppEvent::ToggleIssues => state.toggle_issues(),
            AppEvent::ToggleWorktrees => state.toggle_worktrees(),
            AppEvent::ToggleLog => state.toggle_log(),
            AppEvent::ToggleAttentionFilter => state.toggle_attention_filter(),
            AppEvent::ClosePanel => state.close_panel(),
            AppEvent::AttachTerminal => {
                let Some(session) = state.focused() else {
                    return;
                };
                if !session.has_tmux() {
                    state.notifications.info("This session has no terminal to attach to");
                    return;
                }
                let session_id = session.id.clone();
                state.focus = Focus::Terminal;
                state.queue(AsyncAction::AttachTerminal { session_id });
            }
            AppEvent::DetachTerminal => {
                state.focus = Focus::Sessions;
                if let Some(terminal) = state.terminal.take() {
                    state.queue(AsyncAction::DetachTerminal {
                        session_id: terminal.session_id,
                    });
                }
            }
            AppEvent::TerminalInput(data) => {
                if let Some(terminal) = &state.terminal {
                    let session_id = terminal.session_id.clone();
                    state.queue(AsyncAction::WriteTerminal { session_id, data });
                }
            }
            AppEvent::TerminalPaste(text) => {
                if let Some(terminal) = state.terminal.as_ref().filter(|t| t.attach.is_attached()) {
                    let session_id = terminal.session_id.clone();
                    state.queue(AsyncAction::PasteTerminal { session_id, text });
                }
            }
            AppEvent::TerminalRetry => {
                if let Some(terminal) = state.terminal.as_mut() {
                    if terminal.manual_retry() {
                        let session_id = terminal.session_id.clone();
                        state.queue(AsyncAction::AttachTerminal { session_id });
                    }
                }
            }
            AppEvent::TerminalScrollUp => {
                if let Some(terminal) = state.terminal.as_mut() {
                    terminal.stream.scroll_up(10);
                }
            }
            AppEvent::TerminalScrollDown => {
                if let Some(terminal) = state.terminal.as_mut() {
                    terminal.stream.scroll_down(10);
                }
            }
            AppEvent::DiffNextFile => {
                if let Some(diff) = state.diff.as_mut() {
                    diff.next_file();
                }
            }
            AppEvent::DiffPreviousFile => {
                if let Some(diff) = state.diff.as_mut() {
                    diff.previous_file();
                }
            }
            AppEvent::DiffScrollDown => {
                if let Some(diff) = state.diff.as_mut() {
                    diff.scroll_down(1);
                }
            }
            AppEvent::DiffScrollUp => {
                if let Some(diff) = state.diff.as_mut() {
                    diff.scroll_up(1);
                }
            }
            AppEvent::IssueNext => state.issues.next(),
            AppEvent::IssuePrevious => state.issues.previous(),
            AppEvent::IssueStartSession => state.start_session_from_issue(),
            AppEvent::NewIssue => state.open_new_issue(),
            AppEvent::EditIssue => state.open_edit_issue(),
            AppEvent::AssignIssue => state.assign_selected_issue(),
            AppEvent::CloseIssue => state.request_close_issue(),
            AppEvent::WorktreeNext => state.worktrees.next(),
            AppEvent::WorktreePrevious => state.worktrees.previous(),
            AppEvent::NewWorktree => state.open_new_worktree(),
            AppEvent::RemoveWorktree => state.request_remove_worktree(),
            AppEvent::WorktreeStartSession => state.start_session_on_worktree(),
            AppEvent::LogScrollUp => state.log.scroll_up(1),
            AppEvent::LogScrollDown => state.log.scroll_down(1),
            AppEvent::LogBottom => state.log.scroll = 0,
            AppEvent::ReloadLog => state.queue(AsyncAction::LoadLog),
            AppEvent::ModalInput(ch) => Self::modal_input(state, ch),
            AppEvent::ModalBackspace => Self::modal_backspace(state),
            AppEvent::ModalNextField => Self::modal_next_field(state, true),
            AppEvent::ModalPreviousField => Self::modal_next_field(state, false),
            AppEvent::ModalSubmit => Self::modal_submit(state),
            AppEvent::ModalCancel => state.close_modal(),
            AppEvent::PromptConfirm => state.confirm_prompt(),
            AppEvent::ConfirmationToggle => {
                if let Some(Modal::ConfirmRemove(dialog)) = state.modal.as_mut() {
                    dialog.confirm_selected = !dialog.confirm_selected;
                }
            }
            AppEvent::ConfirmationToggleWorktree => {
                if let Some(Modal::ConfirmRemove(dialog)) = state.modal.as_mut() {
                    if dialog.has_worktree {
                        dialog.remove_worktree = !dialog.remove_worktree;
                    }
                }
            }
            AppEvent::ConfirmationToggleDontShow => {
                if let Some(Modal::ConfirmRemove(dialog)) = state.modal.as_mut() {
                    dialog.dont_show_again = !dialog.dont_show_again;
                }
            }
            AppEvent::ConfirmationConfirm => {
                let Some(Modal::ConfirmRemove(dialog)) = state.modal.take() else {
                    return;
                };
                if dialog.dont_show_again {
                    if let Err(e) = state.preferences.set_flag(preferences::SKIP_REMOVE_CONFIRMATION, true) {
                        warn!("Failed to save preference: {}", e);
                    }
                }
                state.begin_remove(dialog.session_id, dialog.remove_worktree);
            }
            AppEvent::ConfirmationCancel => state.close_modal(),
            AppEvent::PrFlowConfirm => {
                let mut remember = false;
                if let Some(flow) = state.pr_flow_mut() {
                    remember = flow.skip_confirmation;
                    if !flow.confirm() {
                        return;
                    }
                }
                if remember {
                    if let Err(e) = state.preferences.set_flag(preferences::SKIP_MERGE_CONFIRMATION, true) {
                        warn!("Failed to save preference: {}", e);
                    }
                }
                state.queue(AsyncAction::RunPrStep);
            }
            AppEvent::PrFlowToggleDontAsk => {
                if let Some(flow) = state.pr_flow_mut() {
                    flow.skip_confirmation = !flow.skip_confirmation;
                }
            }
            AppEvent::PrFlowRetry => {
                if state.pr_flow_mut().map(|flow| flow.retry()).unwrap_or(false) {
                    state.queue(AsyncAction::RunPrStep);
                }
            }
            AppEvent::PrFlowCopyUrl => {
                let url = state.pr_flow_mut().and_then(|flow| flow.pr().map(|pr| pr.url.clone()));
                if let Some(url) = url {
                    state.queue(AsyncAction::CopyToClipboard(url));
                }
            }
            AppEvent::PrFlowAbortMerge => {
                let worktree_path = state.pr_flow_mut().and_then(|flow| match &flow.stage {
                    PrStage::Conflict {
                        main_worktree_path, ..
                    } => Some(main_worktree_path.clone()),
                    _ => None,
                });
                if let Some(worktree_path) = worktree_path {
                    state.queue(AsyncAction::AbortMerge { worktree_path });
                }
            }
        }
    }

    /// Bracketed paste: straight to the attached pane, or typed into a text form.
    pub fn handle_paste(text: String, state: &mut AppState) {
        if state.help_visible {
            return;
        }
        let multiline = match &state.modal {
            None if state.focus == Focus::Terminal => {
                Self::process_event(AppEvent::TerminalPaste(text), state);
                return;
            }
            Some(Modal::Issue(_) | Modal::PrFlow(_)) => true,
            Some(Modal::NewSession(_) | Modal::NewGroup(_) | Modal::Rename(_) | Modal::NewWorktree(_)) => false,
            _ => return,
        };
        for ch in text.chars().filter(|c| *c != '\r') {
            if ch == '\n' && !multiline {
                continue;
            }
            Self::modal_input(state, ch);
        }
    }

    fn modal_input(state: &mut AppState, ch: char) {
        match state.modal.as_mut() {
            Some(Modal::NewSession(form)) => form.input_char(ch),
            Some(Modal::NewGroup(form)) => form.input_char(ch),
            Some(Modal::Rename(form)) => {
                form.title.push(ch);
                form.error = None;
            }
            Some(Modal::Issue(form)) => form.input_char(ch),
            Some(Modal::NewWorktree(form)) => {
                form.branch.push(ch);
                form.error = None;
            }
            Some(Modal::GroupSettings(form)) => form.toggle_selected(),
            Some(Modal::PrFlow(flow)) => flow.input_char(ch),
            _ => {}
        }
    }

    fn modal_backspace(state: &mut AppState) {
        match state.modal.as_mut() {
            Some(Modal::NewSession(form)) => form.backspace(),
            Some(Modal::NewGroup(form)) => form.backspace(),
            Some(Modal::Rename(form)) => {
                form.title.pop();
            }
            Some(Modal::Issue(form)) => form.backspace(),
            Some(Modal::NewWorktree(form)) => {
                form.branch.pop();
            }
            Some(Modal::PrFlow(flow)) => flow.backspace(),
            _ => {}
        }
    }

    fn modal_next_field(state: &mut AppState, forward: bool) {
        match state.modal.as_mut() {
            Some(Modal::NewSession(form)) => {
                if forward {
                    form.next_field()
                } else {
                    form.prev_field()
                }
            }
            Some(Modal::NewGroup(form)) => form.toggle_field(),
            Some(Modal::Issue(form)) => form.toggle_field(),
            Some(Modal::PrFlow(flow)) => flow.toggle_field(),
            Some(Modal::GroupSettings(form)) => form.move_selection(),
            Some(Modal::Move(form)) => {
                if forward {
                    form.next()
                } else {
                    form.previous()
                }
            }
            _ => {}
        }
    }

    fn modal_submit(state: &mut AppState) {
        let Some(modal) = state.modal.take() else {
            return;
        };
        match modal {
            Modal::NewSession(mut form) => {
                // Enter on a toggle flips it instead of submitting.
                if form.field.is_toggle() && form.field != NewSessionField::Start {
                    form.toggle();
                    state.modal = Some(Modal::NewSession(form));
                    return;
                }
                let placeholder_id = format!("pending-{}", Uuid::new_v4());
                match form.to_request(&placeholder_id) {
                    Ok(request) => {
                        state.add_placeholder(&request);
                        state.queue(AsyncAction::CreateSession(request));
                        if let (Some(repo_path), Some(number)) = (form.issue_repo, form.issue_number) {
                            state.queue(AsyncAction::AssignIssue { repo_path, number });
                        }
                    }
                    Err(message) => {
                        form.error = Some(message);
                        state.modal = Some(Modal::NewSession(form));
                    }
                }
            }
            // These stay open until the backend call succeeds so a failure
            // can be shown inline.
            Modal::NewGroup(mut form) => {
                match form.validate() {
                    Ok((name, default_path)) => {
                        form.error = None;
                        state.queue(AsyncAction::CreateGroup { name, default_path });
                    }
                    Err(message) => form.error = Some(message),
                }
                state.modal = Some(Modal::NewGroup(form));
            }
            Modal::Rename(mut form) => {
                match form.validate() {
                    Ok(title) => {
                        form.error = None;
                        state.queue(AsyncAction::RenameSession {
                            session_id: form.session_id.clone(),
                            title,
                        });
                    }
                    Err(message) => form.error = Some(message),
                }
                state.modal = Some(Modal::Rename(form));
            }
            Modal::Move(form) => {
                if let Some(group_path) = form.target() {
                    state.queue(AsyncAction::MoveSession {
                        session_id: form.session_id.clone(),
                        group_path: group_path.to_string(),
                    });
                }
                state.modal = Some(Modal::Move(form));
            }
            Modal::GroupSettings(form) => {
                state.queue(AsyncAction::SaveGroupSettings {
                    group_path: form.group_path.clone(),
                    settings: form.settings.clone(),
                });
                state.modal = Some(Modal::GroupSettings(form));
            }
            Modal::Issue(mut form) => {
                match form.submit_action() {
                    Ok(action) => {
                        form.error = None;
                        state.queue(action);
                    }
                    Err(message) => form.error = Some(message),
                }
                state.modal = Some(Modal::Issue(form));
            }
            Modal::NewWorktree(mut form) => {
                match form.validate() {
                    Ok(branch) => {
                        form.error = None;
                        state.queue(AsyncAction::AddWorktree {
                            repo_path: form.repo_path.clone(),
                            branch,
                        });
                    }
                    Err(message) => form.error = Some(message),
                }
                state.modal = Some(Modal::NewWorktree(form));
            }
            Modal::PrFlow(mut flow) => {
                let submitted = flow.submit_pr();
                state.modal = Some(Modal::PrFlow(flow));
                if submitted {
                    state.queue(AsyncAction::RunPrStep);
                }
            }
            other => state.modal = Some(other),
        }
    }
}
