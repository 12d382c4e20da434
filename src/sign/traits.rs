//! Sign Device Trait Abstractions
//!
//! The sign loop talks to hardware only through [`SignDevice`], so tests and
//! dry runs can swap in [`super::MockSign`].

use crate::sequence::{Color, Message, Mode, Speed};
use async_trait::async_trait;
use std::fmt;

/// Number of distinct text file labels the sign accepts
pub const MAX_TEXT_FILES: usize = 93;

/// Bytes reserved on the sign for each text file
pub const TEXT_FILE_SIZE: usize = 125;

/// Text file label (one printable ASCII byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u8);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 as char)
    }
}

/// First `count` valid labels, in protocol order.
///
/// Valid labels are 0x20..=0x7E except `0` (reserved for priority text) and
/// `?` (reserved wildcard).
pub fn labels(count: usize) -> SignResult<Vec<Label>> {
    if count > MAX_TEXT_FILES {
        return Err(SignError::Device(format!(
            "Requested {} text files but the sign only has {} labels",
            count, MAX_TEXT_FILES
        )));
    }

    Ok((0x20u8..=0x7E)
        .filter(|b| *b != b'0' && *b != b'?')
        .take(count)
        .map(Label)
        .collect())
}

/// One text file slot as it should appear on the sign
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFile {
    pub label: Label,
    pub mode: Mode,
    pub color: Option<Color>,
    pub speed: Option<Speed>,
    pub text: String,
    pub size: usize,
}

impl TextFile {
    /// Empty `HOLD` file, the state every slot starts in
    pub fn blank(label: Label) -> Self {
        Self {
            label,
            mode: Mode::Hold,
            color: None,
            speed: None,
            text: String::new(),
            size: TEXT_FILE_SIZE,
        }
    }

    /// Same slot showing `message`
    pub fn showing(&self, message: &Message) -> Self {
        Self {
            label: self.label,
            mode: message.effective_mode(),
            color: message.color,
            speed: message.speed,
            text: message.text.clone(),
            size: self.size,
        }
    }

    /// Same slot, same mode, no text
    pub fn cleared(&self) -> Self {
        Self {
            label: self.label,
            mode: self.mode,
            color: None,
            speed: None,
            text: String::new(),
            size: self.size,
        }
    }
}

/// Result type for sign operations
pub type SignResult<T> = Result<T, SignError>;

/// Sign device errors
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Device closed")]
    Closed,
}

/// LED sign abstraction
///
/// Mirrors the handful of operations the loop needs from the sign protocol.
#[async_trait]
pub trait SignDevice: Send + Sync {
    /// Wipe every file from the sign's memory
    async fn clear_memory(&self) -> SignResult<()>;

    /// Reserve memory for the given text files
    async fn allocate(&self, files: &[TextFile]) -> SignResult<()>;

    /// Set which text files the sign cycles through, in order
    async fn set_run_sequence(&self, labels: &[Label]) -> SignResult<()>;

    /// Write the contents of one text file
    async fn write_text(&self, file: &TextFile) -> SignResult<()>;

    /// Human readable description for logs
    fn describe(&self) -> String;
}
