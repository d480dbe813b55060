// ABOUTME: Main layout component handling sidebar/main split, overlays and bottom menu bar

use ratatui::{
    prelude::*,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};

use super::{
    ConfirmationDialogComponent, DiffViewComponent, FormDialogComponent, HelpComponent, IssuesPanelComponent,
    LogViewerComponent, NewSessionComponent, NotificationComponent, PrFlowComponent, SessionListComponent,
    SidebarComponent, TerminalPaneComponent, WorktreesPanelComponent,
};
use crate::app::state::{Focus, Modal, Panel};
use crate::app::AppState;

pub const DEFAULT_SIDEBAR_PERCENT: u16 = 25;

/// Splits the screen into sidebar, main area and menu bar.
pub fn split_screen(area: Rect, sidebar_percent: u16) -> (Rect, Rect, Rect) {
    let sidebar_percent = sidebar_percent.clamp(10, 60);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Bottom menu bar
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(sidebar_percent),
            Constraint::Percentage(100 - sidebar_percent),
        ])
        .split(rows[0]);

    (columns[0], columns[1], rows[1])
}

/// Inner size (cols, rows) of the terminal pane for a screen of the given size.
pub fn terminal_pane_size(width: u16, height: u16, sidebar_percent: u16) -> (u16, u16) {
    let (_, main, _) = split_screen(Rect::new(0, 0, width, height), sidebar_percent);
    (main.width.saturating_sub(2).max(1), main.height.saturating_sub(2).max(1))
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

pub struct LayoutComponent {
    sidebar_percent: u16,
    sidebar: SidebarComponent,
    session_list: SessionListComponent,
    terminal_pane: TerminalPaneComponent,
    diff_view: DiffViewComponent,
    issues: IssuesPanelComponent,
    worktrees: WorktreesPanelComponent,
    log_viewer: LogViewerComponent,
    help: HelpComponent,
    new_session: NewSessionComponent,
    form_dialog: FormDialogComponent,
    confirmation_dialog: ConfirmationDialogComponent,
    pr_flow: PrFlowComponent,
    notifications: NotificationComponent,
}

impl LayoutComponent {
    pub fn new() -> Self {
        Self::with_sidebar_percent(DEFAULT_SIDEBAR_PERCENT)
    }

    pub fn with_sidebar_percent(sidebar_percent: u16) -> Self {
        Self {
            sidebar_percent,
            sidebar: SidebarComponent::new(),
            session_list: SessionListComponent::new(),
            terminal_pane: TerminalPaneComponent::new(),
            diff_view: DiffViewComponent::new(),
            issues: IssuesPanelComponent::new(),
            worktrees: WorktreesPanelComponent::new(),
            log_viewer: LogViewerComponent::new(),
            help: HelpComponent::new(),
            new_session: NewSessionComponent::new(),
            form_dialog: FormDialogComponent::new(),
            confirmation_dialog: ConfirmationDialogComponent::new(),
            pr_flow: PrFlowComponent::new(),
            notifications: NotificationComponent::new(),
        }
    }

    pub fn render(&mut self, frame: &mut Frame, state: &AppState) {
        let (sidebar, main, menu) = split_screen(frame.size(), self.sidebar_percent);

        self.sidebar.render(frame, sidebar, state);

        if state.focus == Focus::Terminal {
            self.terminal_pane.render(frame, main, state);
        } else {
            match state.panel {
                Panel::Sessions => self.session_list.render(frame, main, state),
                Panel::Diff => self.diff_view.render(frame, main, state),
                Panel::Issues => self.issues.render(frame, main, state),
                Panel::Worktrees => self.worktrees.render(frame, main, state),
                Panel::Log => self.log_viewer.render(frame, main, state),
            }
        }

        self.render_menu_bar(frame, menu, state);

        match &state.modal {
            Some(Modal::NewSession(form)) => self.new_session.render(frame, frame.size(), form),
            Some(Modal::ConfirmRemove(dialog)) => self.confirmation_dialog.render(frame, frame.size(), dialog),
            Some(Modal::Confirm(prompt)) => self.confirmation_dialog.render_prompt(frame, frame.size(), prompt),
            Some(Modal::PrFlow(flow)) => self.pr_flow.render(frame, frame.size(), flow),
            Some(modal) => self.form_dialog.render(frame, frame.size(), modal),
            None => {}
        }

        if state.help_visible {
            self.help.render(frame, frame.size(), state);
        }

        // Notifications stay on top of everything
        self.notifications.render(frame, frame.size(), state);
    }

    fn render_menu_bar(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let (menu_text, color) = if !state.backend_connected {
            ("Backend disconnected - restart orca to reconnect  [q]uit".to_string(), Color::Red)
        } else if state.focus == Focus::Terminal {
            ("Attached - Ctrl+] detach  Shift+PgUp/PgDn scroll  Shift+Enter newline".to_string(), Color::Yellow)
        } else if state.search_active {
            (format!("Search: {}_  [Enter] keep  [Esc] clear", state.search), Color::Yellow)
        } else {
            let text = match state.panel {
                Panel::Sessions => "[n]ew [N]group [a]ttach [v]diff [p]merge [e]rename [m]ove [d]elete [x]restart [i]ssues [w]orktrees [!]attention [/]search [?]help [q]uit",
                Panel::Diff => "[Tab] next file [j/k] scroll [Esc] back [?]help [q]uit",
                Panel::Issues => "[Enter] start session [n]ew [e]dit [a]ssign [x] close [s]ettings [Esc] back [?]help [q]uit",
                Panel::Worktrees => "[Enter] new session [a]dd [d]elete [j/k] select [Esc] back [?]help [q]uit",
                Panel::Log => "[j/k] scroll [G] bottom [r]eload [Esc] back [?]help [q]uit",
            };
            (text.to_string(), Color::Yellow)
        };

        let menu = Paragraph::new(menu_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .style(Style::default().fg(color))
            .alignment(Alignment::Center);

        frame.render_widget(menu, area);
    }
}

impl Default for LayoutComponent {
    fn default() -> Self {
        Self::new()
    }
}
