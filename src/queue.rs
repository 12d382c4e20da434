//! Queues between the web server and the sign loop
//!
//! Two channels:
//! - sequences: shown as soon as possible, ahead of the module
//! - messages: picked up by a module's message pool on its next run

use crate::sequence::{Message, Sequence};
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::info;

/// Submissions kept for the front page
pub const HISTORY_LEN: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Sign loop is no longer accepting submissions")]
    Closed,
}

/// What kind of thing was submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    Message,
    Sequence,
}

/// A past submission, as listed on the front page
#[derive(Debug, Clone)]
pub struct Submission {
    pub kind: SubmissionKind,
    pub text: String,
    pub at: DateTime<Local>,
}

/// Sending side, shared by the web handlers
#[derive(Clone)]
pub struct QueueHandle {
    sequences: UnboundedSender<Sequence>,
    messages: UnboundedSender<Message>,
    history: Arc<Mutex<VecDeque<Submission>>>,
}

/// Receiving side for high-priority sequences
pub struct SequenceReceiver(UnboundedReceiver<Sequence>);

/// Receiving side for pooled user messages
pub struct MessageReceiver(UnboundedReceiver<Message>);

/// Create connected queue endpoints
pub fn channel() -> (QueueHandle, SequenceReceiver, MessageReceiver) {
    let (seq_tx, seq_rx) = mpsc::unbounded_channel();
    let (msg_tx, msg_rx) = mpsc::unbounded_channel();

    let handle = QueueHandle {
        sequences: seq_tx,
        messages: msg_tx,
        history: Arc::new(Mutex::new(VecDeque::with_capacity(HISTORY_LEN))),
    };

    (handle, SequenceReceiver(seq_rx), MessageReceiver(msg_rx))
}

impl QueueHandle {
    /// Queue a sequence to pre-empt the module on the next refresh
    pub fn enqueue_sequence(&self, sequence: Sequence) -> Result<(), QueueError> {
        let summary = sequence.texts().join(", ");
        info!("Queuing sequence containing messages: {}", summary);
        self.sequences
            .send(sequence)
            .map_err(|_| QueueError::Closed)?;
        self.remember(SubmissionKind::Sequence, summary);
        Ok(())
    }

    /// Queue a single message for the module's pool
    pub fn enqueue_message(&self, message: Message) -> Result<(), QueueError> {
        info!("Queuing message: {}", message.text);
        let text = message.text.clone();
        self.messages.send(message).map_err(|_| QueueError::Closed)?;
        self.remember(SubmissionKind::Message, text);
        Ok(())
    }

    /// Most recent submissions, newest first
    pub fn recent(&self) -> Vec<Submission> {
        match self.history.lock() {
            Ok(history) => history.iter().rev().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    fn remember(&self, kind: SubmissionKind, text: String) {
        if let Ok(mut history) = self.history.lock() {
            if history.len() == HISTORY_LEN {
                history.pop_front();
            }
            history.push_back(Submission {
                kind,
                text,
                at: Local::now(),
            });
        }
    }
}

impl SequenceReceiver {
    /// Wait for the next queued sequence; `None` once every sender is gone
    pub async fn recv(&mut self) -> Option<Sequence> {
        self.0.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Sequence> {
        self.0.try_recv().ok()
    }

    /// True when a sequence is waiting
    pub fn has_pending(&self) -> bool {
        !self.0.is_empty()
    }
}

impl MessageReceiver {
    /// Take every message queued so far without waiting
    pub fn drain(&mut self) -> Vec<Message> {
        let mut out = Vec::new();
        loop {
            match self.0.try_recv() {
                Ok(message) => out.push(message),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sequence_round_trip() {
        let (handle, mut sequences, _messages) = channel();
        let seq = Sequence::new(30, vec![Message::new("urgent")]).unwrap();

        handle.enqueue_sequence(seq.clone()).unwrap();
        assert!(sequences.has_pending());
        assert_eq!(sequences.recv().await, Some(seq));
        assert!(!sequences.has_pending());
    }

    #[test]
    fn test_drain_messages_in_order() {
        let (handle, _sequences, mut messages) = channel();
        handle.enqueue_message(Message::new("one")).unwrap();
        handle.enqueue_message(Message::new("two")).unwrap();

        let drained: Vec<_> = messages.drain().into_iter().map(|m| m.text).collect();
        assert_eq!(drained, vec!["one", "two"]);
        assert!(messages.drain().is_empty());
    }

    #[test]
    fn test_enqueue_after_receiver_dropped() {
        let (handle, sequences, messages) = channel();
        drop(sequences);
        drop(messages);

        assert!(handle.enqueue_message(Message::new("late")).is_err());
        assert!(handle
            .enqueue_sequence(Sequence::new(5, vec![]).unwrap())
            .is_err());
        assert!(handle.recent().is_empty());
    }

    #[test]
    fn test_history_is_bounded_newest_first() {
        let (handle, _sequences, _messages) = channel();
        for i in 0..(HISTORY_LEN + 5) {
            handle.enqueue_message(Message::new(format!("m{}", i))).unwrap();
        }

        let recent = handle.recent();
        assert_eq!(recent.len(), HISTORY_LEN);
        assert_eq!(recent[0].text, format!("m{}", HISTORY_LEN + 4));
        assert_eq!(recent[0].kind, SubmissionKind::Message);
    }
}
