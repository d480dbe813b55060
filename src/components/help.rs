// ABOUTME: Help overlay component displaying keyboard shortcuts and commands

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{
        block::{Position, Title},
        Block, Borders, Clear, List, ListItem,
    },
};

use super::layout::centered_rect;
use crate::app::AppState;

pub struct HelpComponent;

impl HelpComponent {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let popup_area = centered_rect(60, 96, area);

        frame.render_widget(Clear, popup_area);

        let heading = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
        let help_items = vec![
            ListItem::new("Navigation:").style(heading),
            ListItem::new("  j/↓ k/↑    Move between sessions"),
            ListItem::new("  h/← l/→    Previous / next group"),
            ListItem::new("  g / G      Go to top / bottom"),
            ListItem::new("  /          Search sessions"),
            ListItem::new("  !          Show only sessions needing attention"),
            ListItem::new(""),
            ListItem::new("Sessions:").style(heading),
            ListItem::new("  n          New session"),
            ListItem::new("  Enter/a    Attach terminal"),
            ListItem::new("  e          Rename"),
            ListItem::new("  m          Move to another group"),
            ListItem::new("  x          Restart"),
            ListItem::new("  d          Remove"),
            ListItem::new("  v          Show branch diff"),
            ListItem::new("  p          Merge or open pull request"),
            ListItem::new(""),
            ListItem::new("Groups & Issues:").style(heading),
            ListItem::new("  N          New group"),
            ListItem::new("  s          Group settings"),
            ListItem::new("  i          Toggle issues panel"),
            ListItem::new("  Enter      Start a session on the selected issue"),
            ListItem::new("  e / a      Edit / assign issue to yourself"),
            ListItem::new("  x          Close issue (asks first)"),
            ListItem::new(""),
            ListItem::new("Worktrees:").style(heading),
            ListItem::new("  w          Toggle worktrees panel"),
            ListItem::new("  a / d      Add / remove worktree"),
            ListItem::new("  Enter/n    New session on worktree"),
            ListItem::new(""),
            ListItem::new("Terminal:").style(heading),
            ListItem::new("  Ctrl+]     Detach"),
            ListItem::new("  Shift+PgUp/PgDn  Scroll history"),
            ListItem::new("  Shift+Enter      Insert newline without submitting"),
            ListItem::new("  r          Retry a failed attach"),
            ListItem::new(""),
            ListItem::new("General:").style(heading),
            ListItem::new("  f          Refresh everything"),
            ListItem::new("  L          Toggle orca log"),
            ListItem::new("  r          Retry a failed load"),
            ListItem::new("  c          Dismiss latest notification"),
            ListItem::new("  ?          Toggle this help"),
            ListItem::new("  q/Ctrl+C   Quit application"),
        ];

        let help_list = List::new(help_items).block(
            Block::default()
                .title("Help - Press ? or Esc to close")
                .title(
                    Title::from(Self::version_line(state))
                        .position(Position::Bottom)
                        .alignment(Alignment::Center),
                )
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );

        frame.render_widget(help_list, popup_area);
    }

    fn version_line(state: &AppState) -> Line<'static> {
        match &state.backend_version {
            Some(check) if check.is_supported() => Line::styled(
                format!(" agent-deck {} ", check.installed_version()),
                Style::default().fg(Color::DarkGray),
            ),
            Some(check) => Line::styled(
                format!(
                    " agent-deck {} is older than supported {} ",
                    check.installed_version(),
                    check.supported
                ),
                Style::default().fg(Color::Red),
            ),
            None => Line::styled(" agent-deck version unknown ", Style::default().fg(Color::DarkGray)),
        }
    }
}

impl Default for HelpComponent {
    fn default() -> Self {
        Self::new()
    }
}
