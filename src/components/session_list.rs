// ABOUTME: Session list component rendering one card per session plus in-flight placeholders
// Cards show title, branch, status glyph, attention, last activity, PR badge and project path

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::app::AppState;
use crate::format::{relative_time_from_now, shorten_path};
use crate::models::{AttentionStatus, PrState, Session};

#[derive(Default)]
pub struct SessionListComponent {
    list_state: ListState,
}

impl SessionListComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        let mut title = match state.selected_group() {
            Some(group) => format!("Sessions · {}", group.name),
            None => "Sessions".to_string(),
        };
        if state.attention_only {
            title.push_str(" · needs attention");
        }
        if state.load_error.is_some() && state.sessions_loaded {
            title.push_str(" · load failed, [r] retry");
        }
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title_style(Style::default().fg(Color::Yellow));

        if let (Some(error), false) = (&state.load_error, state.sessions_loaded) {
            let text = vec![
                Line::from(Span::styled(
                    format!("Failed to load: {}", error.message),
                    Style::default().fg(Color::Red),
                )),
                Line::from(""),
                Line::from(Span::styled("[r] Retry  [c] Dismiss", Style::default().fg(Color::Yellow))),
            ];
            let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }

        if !state.sessions_loaded {
            let paragraph = Paragraph::new("Loading sessions…")
                .block(block)
                .style(Style::default().fg(Color::Gray));
            frame.render_widget(paragraph, area);
            return;
        }

        let placeholders = state.visible_placeholders();
        let sessions = state.visible_sessions();
        let mut items: Vec<ListItem> = Vec::with_capacity(placeholders.len() + sessions.len());

        for placeholder in &placeholders {
            items.push(ListItem::new(vec![
                Line::from(vec![
                    Span::styled("◌ ", Style::default().fg(Color::Yellow)),
                    Span::styled(
                        placeholder.title.clone(),
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
                    ),
                ]),
                Line::from(Span::styled(
                    format!("  creating… {}", shorten_path(&placeholder.project_path, 2)),
                    Style::default().fg(Color::DarkGray),
                )),
            ]));
        }

        for session in &sessions {
            items.push(Self::card(session, state));
        }

        if items.is_empty() {
            let message = if state.attention_only && state.attention_sessions.is_none() {
                "Loading sessions needing attention…"
            } else if state.attention_only {
                "Nothing needs attention. Press [!] to show all."
            } else if state.search.is_empty() {
                "No sessions yet. Press [n] to create one."
            } else {
                "No sessions match the search."
            };
            let paragraph = Paragraph::new(message)
                .block(block)
                .style(Style::default().fg(Color::Gray));
            frame.render_widget(paragraph, area);
            return;
        }

        let selected = state.focus_index().map(|i| i + placeholders.len());
        self.list_state.select(selected);

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
            .highlight_symbol("▶ ");

        frame.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn card<'a>(session: &'a Session, state: &AppState) -> ListItem<'a> {
        let attention = state.attention_for(session);
        let removing = state.removing.contains(&session.id);

        let title_style = if removing {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
        } else {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        };

        let mut first = vec![
            Span::styled(format!("{} ", session.status.indicator()), attention_style(attention)),
            Span::styled(session.title.as_str(), title_style),
        ];
        if let Some(branch) = session.branch_label() {
            first.push(Span::styled(format!("  ⎇ {}", branch), Style::default().fg(Color::Magenta)));
        }
        if let Some(pr) = &session.pr {
            let color = match pr.state {
                PrState::Open => Color::Green,
                PrState::Merged => Color::Magenta,
                PrState::Closed => Color::Red,
            };
            first.push(Span::styled(format!("  [{}]", pr.badge()), Style::default().fg(color)));
        }

        let status_text = if removing {
            "removing…".to_string()
        } else {
            attention.label().to_string()
        };
        let mut second = vec![
            Span::raw("  "),
            Span::styled(status_text, attention_style(attention)),
            Span::styled(
                format!(" · {}", relative_time_from_now(session.last_accessed)),
                Style::default().fg(Color::Gray),
            ),
            Span::styled(
                format!(" · {}", shorten_path(session.working_path(), 3)),
                Style::default().fg(Color::DarkGray),
            ),
        ];
        if let Some(summary) = state.summaries.get(&session.id).and_then(|s| s.summary.as_deref()) {
            second.push(Span::styled(format!(" · {}", summary), Style::default().fg(Color::Gray)));
        }

        ListItem::new(vec![Line::from(first), Line::from(second)])
    }
}

pub fn attention_style(attention: AttentionStatus) -> Style {
    match attention {
        AttentionStatus::NeedsInput => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        AttentionStatus::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        AttentionStatus::Running => Style::default().fg(Color::Green),
        AttentionStatus::Idle => Style::default().fg(Color::Blue),
        AttentionStatus::Stale => Style::default().fg(Color::DarkGray),
        AttentionStatus::Unknown => Style::default().fg(Color::Gray),
    }
}
