// ABOUTME: Terminal output stream decoding base64 chunks from the backend into a vt100 screen
// The pane widget renders from the parser held here

use tracing::{trace, warn};

use crate::backend::protocol::decode_terminal_data;

pub struct TerminalStream {
    parser: vt100::Parser,
    cols: u16,
    rows: u16,
    bytes_received: usize,
    scroll_offset: usize,
}

impl std::fmt::Debug for TerminalStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalStream")
            .field("cols", &self.cols)
            .field("rows", &self.rows)
            .field("bytes_received", &self.bytes_received)
            .field("scroll_offset", &self.scroll_offset)
            .finish_non_exhaustive()
    }
}

impl TerminalStream {
    pub fn new(cols: u16, rows: u16, scrollback_lines: usize) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            parser: vt100::Parser::new(rows, cols, scrollback_lines),
            cols,
            rows,
            bytes_received: 0,
            scroll_offset: 0,
        }
    }

    /// Decode one base64 chunk and feed it to the screen. Malformed chunks are
    /// logged and dropped; returns whether anything was applied.
    pub fn feed_base64(&mut self, data: &str) -> bool {
        match decode_terminal_data(data) {
            Ok(bytes) => {
                self.feed(&bytes);
                true
            }
            Err(e) => {
                warn!("Dropping terminal chunk with invalid base64: {}", e);
                false
            }
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        trace!("Terminal stream processing {} bytes", bytes.len());
        self.parser.process(bytes);
        self.bytes_received += bytes.len();
        // New output snaps the view back to the live screen.
        if self.scroll_offset > 0 {
            self.scroll_offset = 0;
            self.parser.set_scrollback(0);
        }
    }

    /// Returns true when the size actually changed and the backend should be told.
    pub fn resize(&mut self, cols: u16, rows: u16) -> bool {
        let cols = cols.max(1);
        let rows = rows.max(1);
        if cols == self.cols && rows == self.rows {
            return false;
        }
        self.cols = cols;
        self.rows = rows;
        self.parser.set_size(rows, cols);
        if self.scroll_offset > usize::from(rows) {
            self.scroll_offset = usize::from(rows);
            self.parser.set_scrollback(self.scroll_offset);
        }
        true
    }

    /// Scroll into history. vt100 can only show history one screen deep, so
    /// the offset stops at the row count as well as at the available history.
    pub fn scroll_up(&mut self, lines: usize) {
        self.parser.set_scrollback(self.scroll_offset.saturating_add(lines));
        let offset = self.parser.screen().scrollback().min(usize::from(self.rows));
        self.parser.set_scrollback(offset);
        self.scroll_offset = offset;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
        self.parser.set_scrollback(self.scroll_offset);
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn screen(&self) -> &vt100::Screen {
        self.parser.screen()
    }

    pub fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    pub fn bytes_received(&self) -> usize {
        self.bytes_received
    }

    /// Visible text, one line per row with trailing blanks trimmed.
    pub fn contents(&self) -> String {
        self.parser.screen().contents()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_base64_updates_screen() {
        let mut stream = TerminalStream::new(40, 5, 100);
        // "hello\r\nworld"
        assert!(stream.feed_base64("aGVsbG8NCndvcmxk"));
        assert_eq!(stream.contents(), "hello\nworld");
        assert_eq!(stream.bytes_received(), 12);
    }

    #[test]
    fn test_invalid_base64_is_dropped() {
        let mut stream = TerminalStream::new(40, 5, 100);
        assert!(!stream.feed_base64("%%% not base64"));
        assert_eq!(stream.bytes_received(), 0);
        assert_eq!(stream.contents(), "");
    }

    #[test]
    fn test_resize_reports_changes_only() {
        let mut stream = TerminalStream::new(80, 24, 100);
        assert!(!stream.resize(80, 24));
        assert!(stream.resize(100, 30));
        assert_eq!(stream.size(), (100, 30));
        assert_eq!(stream.screen().size(), (30, 100));
    }

    #[test]
    fn test_scrollback_clamps_and_resets_on_output() {
        let mut stream = TerminalStream::new(20, 2, 100);
        for i in 0..10 {
            stream.feed(format!("line {}\r\n", i).as_bytes());
        }
        stream.scroll_up(1000);
        assert_eq!(stream.scroll_offset(), 2);
        stream.feed(b"more");
        assert_eq!(stream.scroll_offset(), 0);
    }

    #[test]
    fn test_scroll_stops_at_history_depth() {
        let mut stream = TerminalStream::new(20, 5, 100);
        stream.feed(b"one\r\ntwo\r\nthree\r\nfour\r\nfive\r\nsix\r\nseven");
        stream.scroll_up(10);
        assert_eq!(stream.scroll_offset(), 2);
        stream.scroll_down(1);
        assert_eq!(stream.scroll_offset(), 1);
    }

    #[test]
    fn test_shrinking_rows_clamps_scroll() {
        let mut stream = TerminalStream::new(20, 10, 100);
        for i in 0..50 {
            stream.feed(format!("line {}\r\n", i).as_bytes());
        }
        stream.scroll_up(10);
        assert_eq!(stream.scroll_offset(), 10);
        assert!(stream.resize(20, 4));
        assert_eq!(stream.scroll_offset(), 4);
        assert_eq!(stream.screen().scrollback(), 4);
    }
}
