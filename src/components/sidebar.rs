// ABOUTME: Sidebar listing groups with session counts and attention badges

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState},
};

use crate::app::AppState;
use crate::format::shorten_path;

pub struct SidebarComponent {
    list_state: ListState,
}

impl Default for SidebarComponent {
    fn default() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self { list_state }
    }
}

impl SidebarComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        let items = Self::build_items(state);

        let selected = match &state.selected_group {
            None => 0,
            Some(path) => state.groups.iter().position(|g| g.path == *path).map(|i| i + 1).unwrap_or(0),
        };
        self.list_state.select(Some(selected));

        let title = if state.attention_counts.total > 0 {
            format!("Groups ({} need you)", state.attention_counts.total)
        } else {
            "Groups".to_string()
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title_style(Style::default().fg(Color::Yellow)),
            )
            .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
            .highlight_symbol("▶ ");

        frame.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn build_items(state: &AppState) -> Vec<ListItem<'static>> {
        let mut items = Vec::with_capacity(state.groups.len() + 1);

        items.push(ListItem::new(Line::from(vec![
            Span::styled("All sessions", Style::default().fg(Color::White)),
            Span::styled(format!(" ·{}", state.sessions.len()), Style::default().fg(Color::Gray)),
            Self::badge(state.attention_counts.total),
        ])));

        for group in &state.groups {
            let count = state.sessions.iter().filter(|s| s.group_path == group.path).count();
            let mut spans = vec![
                Span::styled(group.name.clone(), Style::default().fg(Color::White)),
                Span::styled(format!(" ·{}", count), Style::default().fg(Color::Gray)),
                Self::badge(state.attention_counts.for_group(&group.path)),
            ];
            if !group.default_path.is_empty() {
                spans.push(Span::styled(
                    format!("  {}", shorten_path(&group.default_path, 2)),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            items.push(ListItem::new(Line::from(spans)));
        }

        items
    }

    fn badge(count: u32) -> Span<'static> {
        if count == 0 {
            Span::raw("")
        } else {
            Span::styled(
                format!(" ●{}", count),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )
        }
    }
}
