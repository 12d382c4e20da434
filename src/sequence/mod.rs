//! Sequence data model
//!
//! A sequence is what a module hands to the sign loop: a display duration in
//! seconds plus an ordered list of messages. Messages carry their text and a
//! few optional display attributes (mode, color, speed).

pub mod text;
pub mod types;

#[cfg(test)]
mod proptests;

pub use text::{interleave_pauses, is_displayable, normalize, pause, MAX_TEXT_LEN};
pub use types::{
    Color, Message, Mode, Sequence, SequenceError, Speed, DEFAULT_DURATION_SECS,
};
