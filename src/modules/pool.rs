//! Fixed-size pool of user-submitted messages
//!
//! Newer messages bump older ones out; anything older than `max_age` expires.

use crate::sequence::Message;
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::time::Duration;

pub const DEFAULT_POOL_SIZE: usize = 4;
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(2 * 60 * 60);

#[derive(Debug, Clone)]
pub struct MessagePool {
    entries: VecDeque<(DateTime<Local>, Message)>,
    size: usize,
    max_age: Duration,
}

impl MessagePool {
    pub fn new(size: usize, max_age: Duration) -> Self {
        Self {
            entries: VecDeque::with_capacity(size),
            size,
            max_age,
        }
    }

    /// Expire, absorb `incoming`, trim to size, and return the pooled messages
    /// oldest first.
    pub fn refresh(&mut self, incoming: Vec<Message>, now: DateTime<Local>) -> Vec<Message> {
        let max_age = chrono::Duration::from_std(self.max_age)
            .unwrap_or_else(|_| chrono::Duration::weeks(52 * 100));
        self.entries.retain(|(added, _)| now - *added < max_age);

        for message in incoming {
            self.entries.push_back((now, message));
        }

        while self.entries.len() > self.size {
            self.entries.pop_front();
        }

        self.messages()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.entries.iter().map(|(_, m)| m.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MessagePool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE, DEFAULT_MAX_AGE)
    }
}
