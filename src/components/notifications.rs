// ABOUTME: Notification stack drawn in the top-right corner above everything else

use ratatui::{
    prelude::*,
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::{AppState, NotificationType};

const WIDTH: u16 = 48;
const HEIGHT: u16 = 3;
const MAX_VISIBLE: usize = 4;

pub struct NotificationComponent;

impl NotificationComponent {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let width = WIDTH.min(area.width);
        let x = area.x + area.width.saturating_sub(width + 1);

        // Newest first
        for (slot, notification) in state.notifications.visible().iter().rev().take(MAX_VISIBLE).enumerate() {
            let y = area.y + 1 + slot as u16 * HEIGHT;
            if y + HEIGHT > area.y + area.height {
                break;
            }
            let rect = Rect::new(x, y, width, HEIGHT);
            let (color, label) = match notification.notification_type {
                NotificationType::Success => (Color::Green, "✓"),
                NotificationType::Error => (Color::Red, "✗"),
                NotificationType::Info => (Color::Blue, "ℹ"),
            };
            frame.render_widget(Clear, rect);
            let paragraph = Paragraph::new(format!("{} {}", label, notification.message))
                .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color)))
                .style(Style::default().fg(color))
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, rect);
        }
    }
}

impl Default for NotificationComponent {
    fn default() -> Self {
        Self::new()
    }
}
