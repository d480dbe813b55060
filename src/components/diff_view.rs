// ABOUTME: Diff view showing a session branch's changed files and the hunks of the selected file

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::state::DiffView;
use crate::app::AppState;
use crate::diff::{DiffLineKind, FileChange, FileDiff};

#[derive(Default)]
pub struct DiffViewComponent {
    file_state: ListState,
}

impl DiffViewComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        let Some(diff) = &state.diff else {
            return;
        };

        let title = format!(
            "Diff · {} ⎇ {} · {} files +{} -{}",
            diff.title, diff.branch, diff.stats.files, diff.stats.additions, diff.stats.deletions
        );
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title_style(Style::default().fg(Color::Yellow));

        if diff.loading || diff.error.is_some() || diff.files.is_empty() {
            let (text, color) = match &diff.error {
                Some(error) => (format!("Failed to load diff: {}", error), Color::Red),
                None if diff.loading => ("Loading diff…".to_string(), Color::Gray),
                None => ("No changes on this branch.".to_string(), Color::Gray),
            };
            frame.render_widget(Paragraph::new(text).block(block).style(Style::default().fg(color)), area);
            return;
        }

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(inner);

        self.render_files(frame, chunks[0], diff);
        Self::render_hunks(frame, chunks[1], diff);
    }

    fn render_files(&mut self, frame: &mut Frame, area: Rect, diff: &DiffView) {
        let items: Vec<ListItem> = diff
            .files
            .iter()
            .map(|file| {
                let color = match file.status {
                    FileChange::Added => Color::Green,
                    FileChange::Deleted => Color::Red,
                    FileChange::Renamed => Color::Blue,
                    FileChange::Modified => Color::Yellow,
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{} ", file.status.symbol()), Style::default().fg(color)),
                    Span::raw(file.display_path()),
                    Span::styled(format!(" +{}", file.additions()), Style::default().fg(Color::Green)),
                    Span::styled(format!(" -{}", file.deletions()), Style::default().fg(Color::Red)),
                ]))
            })
            .collect();

        self.file_state.select(Some(diff.selected_file));
        let list = List::new(items)
            .block(Block::default().borders(Borders::RIGHT).border_style(Style::default().fg(Color::DarkGray)))
            .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
        frame.render_stateful_widget(list, area, &mut self.file_state);
    }

    fn render_hunks(frame: &mut Frame, area: Rect, diff: &DiffView) {
        let Some(file) = diff.selected() else {
            return;
        };
        let lines = Self::file_lines(file);
        let paragraph = Paragraph::new(lines).scroll((diff.scroll.min(u16::MAX as usize) as u16, 0));
        frame.render_widget(paragraph, area);
    }

    fn file_lines(file: &FileDiff) -> Vec<Line<'_>> {
        if file.is_binary {
            return vec![Line::from(Span::styled(
                "Binary file differs",
                Style::default().fg(Color::Gray),
            ))];
        }

        let mut lines = Vec::new();
        for hunk in &file.hunks {
            lines.push(Line::from(Span::styled(
                hunk.header.as_str(),
                Style::default().fg(Color::Cyan),
            )));
            for line in &hunk.lines {
                let (prefix, style) = match line.kind {
                    DiffLineKind::Added => ("+", Style::default().fg(Color::Green)),
                    DiffLineKind::Removed => ("-", Style::default().fg(Color::Red)),
                    DiffLineKind::Context => (" ", Style::default().fg(Color::White)),
                    DiffLineKind::NoNewline => ("\\", Style::default().fg(Color::DarkGray)),
                };
                let number = line
                    .new_lineno
                    .or(line.old_lineno)
                    .map(|n| format!("{:>5} ", n))
                    .unwrap_or_else(|| "      ".to_string());
                lines.push(Line::from(vec![
                    Span::styled(number, Style::default().fg(Color::DarkGray)),
                    Span::styled(format!("{}{}", prefix, line.content), style),
                ]));
            }
        }
        lines
    }
}
