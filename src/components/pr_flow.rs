// ABOUTME: Merge/PR flow modal showing stage progress, the PR editor, results and failures

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::layout::centered_rect;
use crate::app::pr_flow::{PrField, PrFlow, PrStage};

pub struct PrFlowComponent;

impl PrFlowComponent {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, flow: &PrFlow) {
        let popup = centered_rect(70, 70, area);
        frame.render_widget(Clear, popup);

        let border = match flow.stage {
            PrStage::Failed { .. } | PrStage::Conflict { .. } => Color::Red,
            PrStage::Merged | PrStage::PrMerged(_) => Color::Green,
            _ => Color::Cyan,
        };
        let block = Block::default()
            .title(format!("{} · {} ⎇ {}", flow.workflow.label(), flow.session_title, flow.branch))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title_style(Style::default().fg(Color::Yellow));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Stage track
                Constraint::Min(3),    // Body
                Constraint::Length(1), // Keys
            ])
            .split(inner);

        frame.render_widget(Paragraph::new(Self::track_line(flow)), chunks[0]);

        if flow.stage == PrStage::EditingPr {
            self.render_editor(frame, chunks[1], flow);
        } else {
            frame.render_widget(
                Paragraph::new(Self::body_lines(flow)).wrap(Wrap { trim: true }),
                chunks[1],
            );
        }

        frame.render_widget(
            Paragraph::new(Self::keys_hint(flow))
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center),
            chunks[2],
        );
    }

    fn track_line(flow: &PrFlow) -> Line<'static> {
        let position = flow.track_position();
        let failed = matches!(flow.stage, PrStage::Failed { .. });
        let mut spans = Vec::new();
        for (idx, name) in flow.stage_track().iter().enumerate() {
            if idx > 0 {
                spans.push(Span::styled(" → ", Style::default().fg(Color::DarkGray)));
            }
            let style = if idx < position {
                Style::default().fg(Color::Green)
            } else if idx == position && failed {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            } else if idx == position {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(name.to_string(), style));
        }
        Line::from(spans)
    }

    fn body_lines(flow: &PrFlow) -> Vec<Line<'_>> {
        let base = flow.base_branch.as_deref().unwrap_or("the default branch");
        match &flow.stage {
            PrStage::Confirming => vec![
                Line::from(format!("Rebase {} onto {} and continue?", flow.branch, base)),
                Line::from(""),
                Line::from(format!(
                    "{} Don't ask again",
                    if flow.skip_confirmation { "[x]" } else { "[ ]" }
                )),
            ],
            PrStage::Failed { during, error } => vec![
                Line::from(Span::styled(
                    format!("{} failed", during.label()),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                Line::from(error.as_str()),
            ],
            PrStage::Conflict { message, main_worktree_path } => vec![
                Line::from(Span::styled(
                    "Merge conflict",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                Line::from(message.as_str()),
                Line::from(""),
                Line::from(format!("Resolve in {} or abort the merge.", main_worktree_path)),
            ],
            PrStage::PrOpen(pr) => vec![
                Line::from(Span::styled(
                    format!("PR #{} is open", pr.number),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )),
                Line::from(pr.url.as_str()),
                Line::from(""),
                Line::from(Span::styled(
                    "Waiting for it to be merged on GitHub…",
                    Style::default().fg(Color::Gray),
                )),
            ],
            PrStage::PrMerged(pr) => vec![
                Line::from(Span::styled(
                    format!("PR #{} merged", pr.number),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )),
                Line::from(pr.url.as_str()),
            ],
            PrStage::Merged => vec![Line::from(Span::styled(
                format!("Merged {} into {}", flow.branch, base),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ))],
            busy => vec![Line::from(Span::styled(
                format!("{}…", busy.label()),
                Style::default().fg(Color::Yellow),
            ))],
        }
    }

    fn render_editor(&self, frame: &mut Frame, area: Rect, flow: &PrFlow) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        let focus = |field: PrField| {
            if flow.field == field {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            }
        };

        let title = Paragraph::new(flow.title.as_str()).block(
            Block::default()
                .title("PR title")
                .borders(Borders::ALL)
                .border_style(focus(PrField::Title)),
        );
        frame.render_widget(title, chunks[0]);

        let body = Paragraph::new(flow.body.as_str())
            .block(
                Block::default()
                    .title("Description")
                    .borders(Borders::ALL)
                    .border_style(focus(PrField::Body)),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(body, chunks[1]);
    }

    fn keys_hint(flow: &PrFlow) -> &'static str {
        match flow.stage {
            PrStage::Confirming => "Enter/y: continue • d: don't ask again • Esc: cancel",
            PrStage::EditingPr => "Tab: switch field • Ctrl+S: create PR • Esc: cancel",
            PrStage::Failed { .. } => "r: retry • Esc: close",
            PrStage::PrOpen(_) | PrStage::PrMerged(_) => "y: copy URL • Esc: close",
            PrStage::Conflict { .. } => "a: abort merge • Esc: close",
            PrStage::Merged => "Esc: close",
            _ => "Working… Esc: close",
        }
    }
}

impl Default for PrFlowComponent {
    fn default() -> Self {
        Self::new()
    }
}
