// ABOUTME: New session modal with title, project path, branch, new-branch toggle, prompt and start toggle

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::layout::centered_rect;
use crate::app::forms::{NewSessionField, NewSessionForm};

pub struct NewSessionComponent;

impl NewSessionComponent {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, form: &NewSessionForm) {
        let popup_area = centered_rect(70, 80, area);
        frame.render_widget(Clear, popup_area);

        let title = match form.issue_number {
            Some(number) => format!("New Session · issue #{}", number),
            None => "New Session".to_string(),
        };
        let outer = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title_style(Style::default().fg(Color::Yellow));
        let inner = outer.inner(popup_area);
        frame.render_widget(outer, popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(3), // Project path
                Constraint::Length(3), // Branch
                Constraint::Length(1), // New branch toggle
                Constraint::Min(3),    // Prompt
                Constraint::Length(1), // Start toggle
                Constraint::Length(2), // Error / instructions
            ])
            .split(inner);

        let title_placeholder = form.effective_title();
        let title_value = if form.title.is_empty() {
            Span::styled(title_placeholder, Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(form.title.as_str())
        };
        Self::render_input(frame, chunks[0], "Title", title_value, form.field == NewSessionField::Title);
        Self::render_input(
            frame,
            chunks[1],
            "Project path",
            Span::raw(form.project_path.as_str()),
            form.field == NewSessionField::ProjectPath,
        );
        let branch_value = if form.branch.is_empty() {
            Span::styled("(none: run in the project directory)", Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(form.branch.as_str())
        };
        Self::render_input(frame, chunks[2], "Worktree branch", branch_value, form.field == NewSessionField::Branch);

        Self::render_toggle(
            frame,
            chunks[3],
            "Create new branch",
            form.new_branch,
            form.field == NewSessionField::NewBranch,
        );

        let prompt_style = Self::border_style(form.field == NewSessionField::Prompt);
        let prompt = Paragraph::new(form.prompt.as_str())
            .block(
                Block::default()
                    .title("Initial prompt")
                    .borders(Borders::ALL)
                    .border_style(prompt_style),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(prompt, chunks[4]);

        Self::render_toggle(
            frame,
            chunks[5],
            "Start immediately",
            form.start,
            form.field == NewSessionField::Start,
        );

        let footer = match &form.error {
            Some(error) => Line::from(Span::styled(error.as_str(), Style::default().fg(Color::Red))),
            None => Line::from(Span::styled(
                "Tab: next field • Space: toggle • Enter: create • Esc: cancel",
                Style::default().fg(Color::Gray),
            )),
        };
        frame.render_widget(Paragraph::new(footer).alignment(Alignment::Center), chunks[6]);
    }

    fn border_style(focused: bool) -> Style {
        if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        }
    }

    fn render_input(frame: &mut Frame, area: Rect, label: &str, value: Span, focused: bool) {
        let mut spans = vec![value];
        if focused {
            spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
        }
        let input = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .title(label.to_string())
                .borders(Borders::ALL)
                .border_style(Self::border_style(focused)),
        );
        frame.render_widget(input, area);
    }

    fn render_toggle(frame: &mut Frame, area: Rect, label: &str, value: bool, focused: bool) {
        let mark = if value { "[x]" } else { "[ ]" };
        let style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        frame.render_widget(Paragraph::new(format!(" {} {}", mark, label)).style(style), area);
    }
}

impl Default for NewSessionComponent {
    fn default() -> Self {
        Self::new()
    }
}
