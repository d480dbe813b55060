// ABOUTME: Small modal dialogs: new group, rename, move to group, group settings, issue editing and new worktree

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use super::layout::centered_rect;
use crate::app::forms::{GroupField, GroupForm, GroupSettingsForm, IssueField, IssueForm, MoveForm, RenameForm, WorktreeForm};
use crate::format::shorten_path;
use crate::app::state::Modal;

pub struct FormDialogComponent;

impl FormDialogComponent {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, modal: &Modal) {
        match modal {
            Modal::NewGroup(form) => self.render_group(frame, area, form),
            Modal::Rename(form) => self.render_rename(frame, area, form),
            Modal::Move(form) => self.render_move(frame, area, form),
            Modal::GroupSettings(form) => self.render_settings(frame, area, form),
            Modal::Issue(form) => self.render_issue(frame, area, form),
            Modal::NewWorktree(form) => self.render_worktree(frame, area, form),
            _ => {}
        }
    }

    fn frame_popup(frame: &mut Frame, area: Rect, title: &str, percent_x: u16, percent_y: u16) -> Rect {
        let popup = centered_rect(percent_x, percent_y, area);
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title_style(Style::default().fg(Color::Yellow));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);
        inner
    }

    fn input<'a>(label: &'a str, value: &'a str, focused: bool) -> Paragraph<'a> {
        let border = if focused { Color::Yellow } else { Color::White };
        let mut spans = vec![Span::raw(value)];
        if focused {
            spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
        }
        Paragraph::new(Line::from(spans)).block(
            Block::default()
                .title(label)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        )
    }

    fn footer<'a>(error: &'a Option<String>, hint: &'a str) -> Paragraph<'a> {
        let line = match error {
            Some(error) => Line::from(Span::styled(error.as_str(), Style::default().fg(Color::Red))),
            None => Line::from(Span::styled(hint, Style::default().fg(Color::Gray))),
        };
        Paragraph::new(line).alignment(Alignment::Center).wrap(Wrap { trim: true })
    }

    fn render_group(&self, frame: &mut Frame, area: Rect, form: &GroupForm) {
        let inner = Self::frame_popup(frame, area, "New Group", 60, 40);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(1)])
            .split(inner);
        frame.render_widget(Self::input("Name", &form.name, form.field == GroupField::Name), chunks[0]);
        frame.render_widget(
            Self::input("Default project path", &form.default_path, form.field == GroupField::DefaultPath),
            chunks[1],
        );
        frame.render_widget(Self::footer(&form.error, "Tab: next field • Enter: create • Esc: cancel"), chunks[2]);
    }

    fn render_rename(&self, frame: &mut Frame, area: Rect, form: &RenameForm) {
        let inner = Self::frame_popup(frame, area, "Rename Session", 50, 25);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(inner);
        frame.render_widget(Self::input("Title", &form.title, true), chunks[0]);
        frame.render_widget(Self::footer(&form.error, "Enter: save • Esc: cancel"), chunks[1]);
    }

    fn render_move(&self, frame: &mut Frame, area: Rect, form: &MoveForm) {
        let title = format!("Move \"{}\"", form.session_title);
        let inner = Self::frame_popup(frame, area, &title, 50, 50);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(2)])
            .split(inner);

        let items: Vec<ListItem> = form
            .groups
            .iter()
            .enumerate()
            .map(|(idx, (_, name))| {
                if idx == form.selected {
                    ListItem::new(format!("▶ {}", name))
                        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
                } else {
                    ListItem::new(format!("  {}", name)).style(Style::default().fg(Color::White))
                }
            })
            .collect();
        frame.render_widget(List::new(items), chunks[0]);
        frame.render_widget(Self::footer(&form.error, "j/k: choose group • Enter: move • Esc: cancel"), chunks[1]);
    }

    fn render_settings(&self, frame: &mut Frame, area: Rect, form: &GroupSettingsForm) {
        let title = format!("Settings · {}", form.group_name);
        let inner = Self::frame_popup(frame, area, &title, 50, 30);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(1)])
            .split(inner);

        let row = |selected: bool, text: String| {
            let style = if selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Paragraph::new(format!("{} {}", if selected { "▶" } else { " " }, text)).style(style)
        };

        frame.render_widget(
            row(form.selected == 0, format!("Merge workflow: {}", form.workflow().label())),
            chunks[0],
        );
        let issues = if form.settings.github_issues_enabled { "[x]" } else { "[ ]" };
        frame.render_widget(row(form.selected == 1, format!("{} GitHub issues", issues)), chunks[1]);
        frame.render_widget(
            Self::footer(&form.error, "j/k: select • Space: change • Enter: save • Esc: cancel"),
            chunks[2],
        );
    }

    fn render_issue(&self, frame: &mut Frame, area: Rect, form: &IssueForm) {
        let title = match form.number {
            Some(number) => format!("Edit Issue #{}", number),
            None => "New Issue".to_string(),
        };
        let inner = Self::frame_popup(frame, area, &title, 70, 60);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(2)])
            .split(inner);
        frame.render_widget(Self::input("Title", &form.title, form.field == IssueField::Title), chunks[0]);

        let body_border = if form.field == IssueField::Body { Color::Yellow } else { Color::White };
        let body = Paragraph::new(form.body.as_str())
            .block(
                Block::default()
                    .title("Body")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(body_border)),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(body, chunks[1]);
        let hint = if form.is_edit() {
            "Tab: next field • Ctrl+S: save • Esc: cancel"
        } else {
            "Tab: next field • Ctrl+S: create • Esc: cancel"
        };
        frame.render_widget(Self::footer(&form.error, hint), chunks[2]);
    }

    fn render_worktree(&self, frame: &mut Frame, area: Rect, form: &WorktreeForm) {
        let title = format!("New Worktree · {}", shorten_path(&form.repo_path, 2));
        let inner = Self::frame_popup(frame, area, &title, 50, 25);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(inner);
        frame.render_widget(Self::input("Branch", &form.branch, true), chunks[0]);
        frame.render_widget(Self::footer(&form.error, "Enter: add • Esc: cancel"), chunks[1]);
    }
}

impl Default for FormDialogComponent {
    fn default() -> Self {
        Self::new()
    }
}
