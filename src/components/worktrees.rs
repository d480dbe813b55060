// ABOUTME: Worktrees panel listing the active group's git worktrees and which session uses each

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::app::state::LoadTarget;
use crate::app::AppState;
use crate::format::shorten_path;
use crate::models::Worktree;

#[derive(Default)]
pub struct WorktreesPanelComponent {
    list_state: ListState,
}

impl WorktreesPanelComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        let panel = &state.worktrees;
        let repo = panel.repo_path.as_deref().map(|p| shorten_path(p, 2)).unwrap_or_default();
        let title = if panel.loading {
            format!("Worktrees · {} · loading…", repo)
        } else {
            format!("Worktrees · {} · {}", repo, panel.worktrees.len())
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title_style(Style::default().fg(Color::Yellow));

        if let Some(error) = &panel.error {
            let hint = if state.load_error.as_ref().map(|e| e.target) == Some(LoadTarget::Worktrees) {
                "[r] Retry  [Esc] Back"
            } else {
                "[Esc] Back"
            };
            let lines = vec![
                Line::from(Span::styled(error.as_str(), Style::default().fg(Color::Red))),
                Line::from(""),
                Line::from(Span::styled(hint, Style::default().fg(Color::Yellow))),
            ];
            frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
            return;
        }

        if panel.worktrees.is_empty() {
            let message = if panel.loading { "Loading worktrees…" } else { "No worktrees. Press [a] to add one." };
            frame.render_widget(
                Paragraph::new(message).block(block).style(Style::default().fg(Color::Gray)),
                area,
            );
            return;
        }

        let items: Vec<ListItem> = panel
            .worktrees
            .iter()
            .map(|worktree| {
                let used_by = state
                    .sessions
                    .iter()
                    .find(|s| s.worktree_path == worktree.path)
                    .map(|s| s.title.as_str());
                Self::worktree_item(worktree, panel.is_main_checkout(worktree), used_by)
            })
            .collect();
        self.list_state.select(Some(panel.selected));
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn worktree_item(worktree: &Worktree, main: bool, used_by: Option<&str>) -> ListItem<'static> {
        let branch = if worktree.is_detached() {
            format!("detached at {}", worktree.head.chars().take(7).collect::<String>())
        } else {
            worktree.branch_name().to_string()
        };
        let mut first = vec![Span::styled(
            format!("⎇ {}", branch),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )];
        if main {
            first.push(Span::styled("  [main checkout]", Style::default().fg(Color::Blue)));
        }
        if let Some(title) = used_by {
            first.push(Span::styled(format!("  ● {}", title), Style::default().fg(Color::Green)));
        }
        let second = Line::from(Span::styled(
            format!("  {}", shorten_path(&worktree.path, 3)),
            Style::default().fg(Color::DarkGray),
        ));
        ListItem::new(vec![Line::from(first), second])
    }
}
