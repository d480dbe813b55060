// ABOUTME: Confirmation dialogs: remove-session with worktree warnings, and yes/no prompts for other destructive actions

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::layout::centered_rect;
use crate::app::forms::{ConfirmPrompt, RemoveConfirmation};

pub struct ConfirmationDialogComponent;

impl ConfirmationDialogComponent {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, dialog: &RemoveConfirmation) {
        let dialog_area = centered_rect(50, 40, area);
        frame.render_widget(Clear, dialog_area);

        let border_color = if dialog.is_risky() { Color::Red } else { Color::Yellow };
        let block = Block::default()
            .title("Remove Session")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color));
        let inner = block.inner(dialog_area);
        frame.render_widget(block, dialog_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // Message and warnings
                Constraint::Length(2), // Checkboxes
                Constraint::Length(1), // Buttons
            ])
            .margin(1)
            .split(inner);

        let mut lines = vec![Line::from(vec![
            Span::raw("Remove "),
            Span::styled(dialog.title.as_str(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("?"),
        ])];
        if dialog.has_worktree {
            if dialog.checking {
                lines.push(Line::from(Span::styled(
                    "Checking worktree…",
                    Style::default().fg(Color::Gray),
                )));
            }
            for warning in dialog.warnings() {
                lines.push(Line::from(Span::styled(
                    format!("⚠ {}", warning),
                    Style::default().fg(Color::Red),
                )));
            }
        }
        if let Some(error) = &dialog.error {
            lines.push(Line::from(Span::styled(error.as_str(), Style::default().fg(Color::Red))));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), chunks[0]);

        let mut checkboxes = Vec::new();
        if dialog.has_worktree {
            checkboxes.push(Line::from(format!(
                "{} [w] Also remove the worktree",
                if dialog.remove_worktree { "[x]" } else { "[ ]" }
            )));
        }
        checkboxes.push(Line::from(format!(
            "{} [d] Don't show this again",
            if dialog.dont_show_again { "[x]" } else { "[ ]" }
        )));
        frame.render_widget(Paragraph::new(checkboxes).style(Style::default().fg(Color::Gray)), chunks[1]);

        let selected = Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD);
        let normal = Style::default().fg(Color::White);
        let (yes_style, no_style) = if dialog.confirm_selected {
            (selected, normal)
        } else {
            (normal, selected)
        };
        let buttons = Line::from(vec![
            Span::styled(" Remove ", yes_style),
            Span::raw("   "),
            Span::styled(" Cancel ", no_style),
        ]);
        frame.render_widget(Paragraph::new(buttons).alignment(Alignment::Center), chunks[2]);
    }
}

impl ConfirmationDialogComponent {
    pub fn render_prompt(&self, frame: &mut Frame, area: Rect, prompt: &ConfirmPrompt) {
        let dialog_area = centered_rect(50, 25, area);
        frame.render_widget(Clear, dialog_area);

        let block = Block::default()
            .title(prompt.title.as_str())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow));
        let inner = block.inner(dialog_area);
        frame.render_widget(block, dialog_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .margin(1)
            .split(inner);

        frame.render_widget(Paragraph::new(prompt.message.as_str()).wrap(Wrap { trim: true }), chunks[0]);
        let buttons = Line::from(vec![
            Span::styled(
                format!(" [y] {} ", prompt.confirm_label),
                Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
            Span::styled(" [n] Cancel ", Style::default().fg(Color::White)),
        ]);
        frame.render_widget(Paragraph::new(buttons).alignment(Alignment::Center), chunks[1]);
    }
}

impl Default for ConfirmationDialogComponent {
    fn default() -> Self {
        Self::new()
    }
}
