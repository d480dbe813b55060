// ABOUTME: Terminal pane rendering the attached session's vt100 screen with attach status and retry hint

use ratatui::{
    buffer::Buffer,
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use super::layout::centered_rect;
use crate::app::AppState;
use crate::terminal::{AttachState, TerminalSession};

pub struct TerminalPaneComponent;

impl TerminalPaneComponent {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let Some(terminal) = &state.terminal else {
            let block = Block::default().title("Terminal").borders(Borders::ALL);
            frame.render_widget(Paragraph::new("Not attached").block(block), area);
            return;
        };

        let mut title = format!("Terminal · {} · {}", terminal.title, terminal.attach.status_line());
        if terminal.stream.scroll_offset() > 0 {
            title.push_str(&format!(" · scrolled {}", terminal.stream.scroll_offset()));
        }
        let border_color = match terminal.attach {
            AttachState::Attached => Color::Green,
            AttachState::Failed { .. } => Color::Red,
            _ => Color::Yellow,
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        frame.render_widget(TerminalScreen::new(terminal.stream.screen()), inner);

        match &terminal.attach {
            AttachState::Attached => {
                let screen = terminal.stream.screen();
                if !screen.hide_cursor() && terminal.stream.scroll_offset() == 0 {
                    let (row, col) = screen.cursor_position();
                    if col < inner.width && row < inner.height {
                        frame.set_cursor(inner.x + col, inner.y + row);
                    }
                }
            }
            _ => Self::render_status_overlay(frame, inner, terminal),
        }
    }

    fn render_status_overlay(frame: &mut Frame, area: Rect, terminal: &TerminalSession) {
        let (lines, color) = match &terminal.attach {
            AttachState::Failed { error, attempts } => (
                vec![
                    Line::from(format!("Could not attach after {} attempts", attempts)),
                    Line::from(error.clone()),
                    Line::from(""),
                    Line::from("[r] Retry  [Esc] Back"),
                ],
                Color::Red,
            ),
            AttachState::Attaching { attempt } => (
                vec![Line::from(format!("Attaching to {} (attempt {})…", terminal.tmux_session, attempt))],
                Color::Yellow,
            ),
            AttachState::Detached if terminal.exited => (
                vec![
                    Line::from("The session's terminal exited"),
                    Line::from("[Ctrl+]] Back"),
                ],
                Color::Gray,
            ),
            _ => return,
        };

        let popup = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup);
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color)))
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup);
    }
}

impl Default for TerminalPaneComponent {
    fn default() -> Self {
        Self::new()
    }
}

/// Draws a vt100 screen cell by cell.
pub struct TerminalScreen<'a> {
    screen: &'a vt100::Screen,
}

impl<'a> TerminalScreen<'a> {
    pub fn new(screen: &'a vt100::Screen) -> Self {
        Self { screen }
    }

    fn cell_to_style(cell: &vt100::Cell) -> Style {
        let mut style = Style::default();

        style = match cell.fgcolor() {
            vt100::Color::Default => style,
            vt100::Color::Idx(n) => style.fg(ansi_to_ratatui_color(n)),
            vt100::Color::Rgb(r, g, b) => style.fg(Color::Rgb(r, g, b)),
        };

        style = match cell.bgcolor() {
            vt100::Color::Default => style,
            vt100::Color::Idx(n) => style.bg(ansi_to_ratatui_color(n)),
            vt100::Color::Rgb(r, g, b) => style.bg(Color::Rgb(r, g, b)),
        };

        if cell.bold() {
            style = style.add_modifier(Modifier::BOLD);
        }
        if cell.italic() {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if cell.underline() {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        if cell.inverse() {
            style = style.add_modifier(Modifier::REVERSED);
        }

        style
    }
}

impl Widget for TerminalScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (rows, cols) = self.screen.size();
        for row in 0..rows.min(area.height) {
            for col in 0..cols.min(area.width) {
                let Some(cell) = self.screen.cell(row, col) else {
                    continue;
                };
                if cell.is_wide_continuation() {
                    continue;
                }
                let contents = cell.contents();
                let target = buf.get_mut(area.x + col, area.y + row);
                if contents.is_empty() {
                    target.set_symbol(" ");
                } else {
                    target.set_symbol(&contents);
                }
                target.set_style(Self::cell_to_style(cell));
            }
        }
    }
}

/// Map the 16 ANSI palette indices; 256-colour indices pass through.
pub fn ansi_to_ratatui_color(idx: u8) -> Color {
    match idx {
        0 => Color::Black,
        1 => Color::Red,
        2 => Color::Green,
        3 => Color::Yellow,
        4 => Color::Blue,
        5 => Color::Magenta,
        6 => Color::Cyan,
        7 => Color::Gray,
        8 => Color::DarkGray,
        9 => Color::LightRed,
        10 => Color::LightGreen,
        11 => Color::LightYellow,
        12 => Color::LightBlue,
        13 => Color::LightMagenta,
        14 => Color::LightCyan,
        15 => Color::White,
        n => Color::Indexed(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_renders_text_and_colors() {
        let mut parser = vt100::Parser::new(3, 10, 0);
        parser.process(b"\x1b[31mred\x1b[0m ok");
        let area = Rect::new(0, 0, 10, 3);
        let mut buf = Buffer::empty(area);
        TerminalScreen::new(parser.screen()).render(area, &mut buf);

        assert_eq!(buf.get(0, 0).symbol(), "r");
        assert_eq!(buf.get(0, 0).fg, Color::Red);
        assert_eq!(buf.get(4, 0).symbol(), "o");
        assert_eq!(buf.get(4, 0).fg, Color::Reset);
    }

    fn row_text(buf: &Buffer, row: u16) -> String {
        (0..buf.area.width).map(|col| buf.get(col, row).symbol()).collect::<String>().trim_end().to_string()
    }

    #[test]
    fn test_scrolled_stream_renders_history() {
        let mut stream = crate::terminal::TerminalStream::new(20, 5, 100);
        for i in 0..50 {
            stream.feed(format!("line {}\r\n", i).as_bytes());
        }
        stream.scroll_up(10);
        stream.scroll_up(10);

        let area = Rect::new(0, 0, 20, 5);
        let mut buf = Buffer::empty(area);
        TerminalScreen::new(stream.screen()).render(area, &mut buf);

        assert_eq!(stream.scroll_offset(), 5);
        assert_eq!(row_text(&buf, 0), "line 41");
        assert_eq!(row_text(&buf, 4), "line 45");
    }

    #[test]
    fn test_extended_palette_passes_through() {
        assert_eq!(ansi_to_ratatui_color(9), Color::LightRed);
        assert_eq!(ansi_to_ratatui_color(208), Color::Indexed(208));
    }
}
