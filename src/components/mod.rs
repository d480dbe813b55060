// ABOUTME: UI components for the TUI: sidebar, session cards, terminal pane, diff, issues, worktrees and log panels, modals

pub mod confirmation_dialog;
pub mod diff_view;
pub mod form_dialog;
pub mod help;
pub mod issues;
pub mod layout;
pub mod log_viewer;
pub mod new_session;
pub mod notifications;
pub mod pr_flow;
pub mod session_list;
pub mod sidebar;
pub mod terminal_pane;
pub mod worktrees;

pub use confirmation_dialog::ConfirmationDialogComponent;
pub use diff_view::DiffViewComponent;
pub use form_dialog::FormDialogComponent;
pub use help::HelpComponent;
pub use issues::IssuesPanelComponent;
pub use layout::LayoutComponent;
pub use log_viewer::LogViewerComponent;
pub use new_session::NewSessionComponent;
pub use notifications::NotificationComponent;
pub use pr_flow::PrFlowComponent;
pub use session_list::SessionListComponent;
pub use sidebar::SidebarComponent;
pub use terminal_pane::TerminalPaneComponent;
pub use worktrees::WorktreesPanelComponent;
