// ABOUTME: Translation of crossterm key events into the byte sequences a terminal program expects

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// `Ctrl+]` hands focus back to the session list. Some terminals report it as `Ctrl+5`.
pub fn is_detach_chord(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char(']') | KeyCode::Char('5'))
}

/// Bytes to write to the attached terminal for `key`, or `None` when the key
/// has no terminal encoding.
pub fn encode_key(key: &KeyEvent) -> Option<Vec<u8>> {
    let data = match key.code {
        KeyCode::Char(c) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                if !c.is_ascii_alphabetic() {
                    return match c {
                        ' ' | '@' => Some(vec![0x00]),
                        '\\' => Some(vec![0x1c]),
                        _ => None,
                    };
                }
                vec![(c.to_ascii_lowercase() as u8) & 0x1f]
            } else if key.modifiers.contains(KeyModifiers::ALT) {
                let mut data = vec![0x1b];
                data.extend_from_slice(c.to_string().as_bytes());
                data
            } else {
                c.to_string().into_bytes()
            }
        }
        KeyCode::Enter => vec![b'\r'],
        KeyCode::Tab => vec![b'\t'],
        KeyCode::BackTab => b"\x1b[Z".to_vec(),
        KeyCode::Backspace => vec![0x7f],
        KeyCode::Esc => vec![0x1b],
        KeyCode::Up => b"\x1b[A".to_vec(),
        KeyCode::Down => b"\x1b[B".to_vec(),
        KeyCode::Right => b"\x1b[C".to_vec(),
        KeyCode::Left => b"\x1b[D".to_vec(),
        KeyCode::Home => b"\x1b[H".to_vec(),
        KeyCode::End => b"\x1b[F".to_vec(),
        KeyCode::PageUp => b"\x1b[5~".to_vec(),
        KeyCode::PageDown => b"\x1b[6~".to_vec(),
        KeyCode::Delete => b"\x1b[3~".to_vec(),
        KeyCode::Insert => b"\x1b[2~".to_vec(),
        KeyCode::F(n) => match n {
            1 => b"\x1bOP".to_vec(),
            2 => b"\x1bOQ".to_vec(),
            3 => b"\x1bOR".to_vec(),
            4 => b"\x1bOS".to_vec(),
            5 => b"\x1b[15~".to_vec(),
            6 => b"\x1b[17~".to_vec(),
            7 => b"\x1b[18~".to_vec(),
            8 => b"\x1b[19~".to_vec(),
            9 => b"\x1b[20~".to_vec(),
            10 => b"\x1b[21~".to_vec(),
            11 => b"\x1b[23~".to_vec(),
            12 => b"\x1b[24~".to_vec(),
            _ => return None,
        },
        _ => return None,
    };
    Some(data)
}
