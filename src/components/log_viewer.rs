// ABOUTME: Log panel showing the tail of orca's own log file for this run

use ratatui::{
    prelude::*,
    style::{Color, Style},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use crate::app::AppState;

pub struct LogViewerComponent;

impl LogViewerComponent {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let log = &state.log;
        let title = if log.scroll > 0 {
            format!("Orca Log · {} lines · ↑{}", log.lines.len(), log.scroll)
        } else {
            format!("Orca Log · {} lines", log.lines.len())
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title_style(Style::default().fg(Color::Yellow));

        if let Some(error) = &log.error {
            let lines = vec![
                Line::from(Span::styled(error.as_str(), Style::default().fg(Color::Red))),
                Line::from(""),
                Line::from(Span::styled("[r] Reload  [Esc] Back", Style::default().fg(Color::Yellow))),
            ];
            frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
            return;
        }

        if log.lines.is_empty() {
            let message = if log.loading { "Loading log…" } else { "Log is empty" };
            frame.render_widget(
                Paragraph::new(message)
                    .block(block)
                    .style(Style::default().fg(Color::Gray))
                    .alignment(Alignment::Center),
                area,
            );
            return;
        }

        let height = block.inner(area).height as usize;
        let end = log.lines.len().saturating_sub(log.scroll);
        let start = end.saturating_sub(height);
        let items: Vec<ListItem> = log.lines[start..end]
            .iter()
            .map(|line| ListItem::new(line.as_str()).style(Self::level_style(line)))
            .collect();
        frame.render_widget(List::new(items).block(block), area);
    }

    fn level_style(line: &str) -> Style {
        if line.contains("ERROR") {
            Style::default().fg(Color::Red)
        } else if line.contains("WARN") {
            Style::default().fg(Color::Yellow)
        } else if line.contains("DEBUG") || line.contains("TRACE") {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        }
    }
}

impl Default for LogViewerComponent {
    fn default() -> Self {
        Self::new()
    }
}
