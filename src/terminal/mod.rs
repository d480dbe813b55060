// ABOUTME: Terminal pane plumbing: output stream decoding, attach retry lifecycle and key encoding
// Bytes travel base64-framed through the backend; tmux does the actual multiplexing

pub mod attach;
pub mod keys;
pub mod session;
pub mod stream;

pub use attach::{AttachState, RetryPolicy};
pub use keys::{encode_key, is_detach_chord};
pub use session::{Routed, TerminalSession};
pub use stream::TerminalStream;
