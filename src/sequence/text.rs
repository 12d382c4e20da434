//! Text cleanup for sign-bound messages
//!
//! The sign only renders 7-bit ASCII and each text file holds at most
//! [`MAX_TEXT_LEN`] characters.

use super::types::{Message, Mode, Speed};

/// Size of one text file on the sign
pub const MAX_TEXT_LEN: usize = 125;

/// Width of the spacer appended by [`interleave_pauses`]
const INTERLEAVE_PAUSE_WIDTH: usize = 15;

/// Replace typographic characters with their ASCII lookalikes.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' => out.push(' '),
            '\u{00E1}' | '\u{00E0}' | '\u{00E2}' | '\u{00E4}' => out.push('a'),
            '\u{00E9}' | '\u{00E8}' | '\u{00EA}' | '\u{00EB}' => out.push('e'),
            _ => out.push(ch),
        }
    }
    out
}

/// True when the sign can show the message text as-is.
pub fn is_displayable(message: &Message) -> bool {
    message.text.len() <= MAX_TEXT_LEN && message.text.is_ascii()
}

/// Blank spacer message used to separate content on the sign
pub fn pause(width: usize, mode: Mode) -> Message {
    Message::new(" ".repeat(width))
        .with_mode(mode)
        .with_speed(Speed::Speed1)
}

/// Follow every message with a short rotating spacer.
pub fn interleave_pauses(messages: Vec<Message>) -> Vec<Message> {
    let spacer = pause(INTERLEAVE_PAUSE_WIDTH, Mode::Rotate);
    let mut out = Vec::with_capacity(messages.len() * 2);
    for message in messages {
        out.push(message);
        out.push(spacer.clone());
    }
    out
}
