// ABOUTME: Issues panel listing the active group's GitHub issues with labels and a body preview

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use chrono::DateTime;

use crate::app::state::LoadTarget;
use crate::app::AppState;
use crate::format::{relative_time_from_now, truncate};
use crate::models::GitHubIssue;

#[derive(Default)]
pub struct IssuesPanelComponent {
    list_state: ListState,
}

impl IssuesPanelComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        let group_name = state.active_group().map(|g| g.name.as_str()).unwrap_or("no group");
        let panel = &state.issues;
        let title = if panel.loading {
            format!("Issues · {} · loading…", group_name)
        } else {
            format!("Issues · {} · {} open", group_name, panel.issues.len())
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title_style(Style::default().fg(Color::Yellow));

        if let Some(error) = &panel.error {
            // Retry only applies to a failed issues load, not to a disabled group.
            let can_retry = state.load_error.as_ref().map(|e| e.target) == Some(LoadTarget::Issues);
            let hint = if can_retry {
                "[r] Retry  [Esc] Back"
            } else {
                "[s] Settings  [Esc] Back"
            };
            let lines = vec![
                Line::from(Span::styled(error.as_str(), Style::default().fg(Color::Red))),
                Line::from(""),
                Line::from(Span::styled(hint, Style::default().fg(Color::Yellow))),
            ];
            frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
            return;
        }

        if panel.issues.is_empty() {
            let message = if panel.loading { "Loading issues…" } else { "No open issues. Press [n] to create one." };
            frame.render_widget(
                Paragraph::new(message).block(block).style(Style::default().fg(Color::Gray)),
                area,
            );
            return;
        }

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(inner);

        let width = chunks[0].width.saturating_sub(12) as usize;
        let items: Vec<ListItem> = panel.issues.iter().map(|issue| Self::issue_item(issue, width)).collect();
        self.list_state.select(Some(panel.selected));
        let list = List::new(items)
            .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, chunks[0], &mut self.list_state);

        if let Some(issue) = panel.selected_issue() {
            let preview = Paragraph::new(issue.body.as_str())
                .block(
                    Block::default()
                        .title(format!("#{} · {}", issue.number, issue.branch_name()))
                        .borders(Borders::TOP)
                        .border_style(Style::default().fg(Color::DarkGray)),
                )
                .style(Style::default().fg(Color::Gray))
                .wrap(Wrap { trim: true });
            frame.render_widget(preview, chunks[1]);
        }
    }

    fn issue_item(issue: &GitHubIssue, width: usize) -> ListItem<'static> {
        let mut spans = vec![
            Span::styled(format!("#{:<5}", issue.number), Style::default().fg(Color::Green)),
            Span::raw(truncate(&issue.title, width.max(10))),
        ];
        for label in &issue.labels {
            spans.push(Span::styled(format!(" [{}]", label.name), Style::default().fg(Color::Magenta)));
        }
        if let Some(assignee) = &issue.assignee {
            spans.push(Span::styled(format!(" @{}", assignee), Style::default().fg(Color::Blue)));
        }
        if let Ok(updated) = DateTime::parse_from_rfc3339(&issue.updated_at) {
            spans.push(Span::styled(
                format!(" · {}", relative_time_from_now(updated.timestamp())),
                Style::default().fg(Color::DarkGray),
            ));
        }
        ListItem::new(Line::from(spans))
    }
}
