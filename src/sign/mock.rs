//! Mock Sign for Testing
//!
//! Records every call so tests can assert on what reached the sign. Also
//! backs `run --dry-run`, where writes are logged instead of sent.

use super::traits::*;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Mock sign device
#[derive(Clone, Default)]
pub struct MockSign {
    state: Arc<Mutex<MockState>>,
    log_writes: bool,
}

#[derive(Default)]
struct MockState {
    calls: Vec<SignCall>,
    memory: BTreeMap<Label, TextFile>,
    run_sequence: Vec<Label>,
    fail_writes: bool,
}

/// One recorded device call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignCall {
    ClearMemory,
    Allocate(Vec<Label>),
    SetRunSequence(Vec<Label>),
    WriteText(TextFile),
}

impl MockSign {
    /// Create new mock sign
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that logs each text write (dry runs)
    pub fn logging() -> Self {
        Self {
            log_writes: true,
            ..Self::default()
        }
    }

    /// Make subsequent text writes fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    /// Every call in order
    pub fn calls(&self) -> Vec<SignCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Text files written, in order
    pub fn writes(&self) -> Vec<TextFile> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter_map(|call| match call {
                SignCall::WriteText(file) => Some(file.clone()),
                _ => None,
            })
            .collect()
    }

    /// Current content of a text file
    pub fn file(&self, label: Label) -> Option<TextFile> {
        self.state.lock().unwrap().memory.get(&label).cloned()
    }

    /// Texts of the files in the current run sequence, in display order
    pub fn displayed_texts(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .run_sequence
            .iter()
            .map(|label| {
                state
                    .memory
                    .get(label)
                    .map(|f| f.text.clone())
                    .unwrap_or_default()
            })
            .collect()
    }

    pub fn run_sequence(&self) -> Vec<Label> {
        self.state.lock().unwrap().run_sequence.clone()
    }

    /// Forget recorded calls, keep memory contents
    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }
}

#[async_trait]
impl SignDevice for MockSign {
    async fn clear_memory(&self) -> SignResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(SignCall::ClearMemory);
        state.memory.clear();
        state.run_sequence.clear();
        Ok(())
    }

    async fn allocate(&self, files: &[TextFile]) -> SignResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(SignCall::Allocate(files.iter().map(|f| f.label).collect()));
        for file in files {
            state.memory.insert(file.label, file.clone());
        }
        Ok(())
    }

    async fn set_run_sequence(&self, labels: &[Label]) -> SignResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(SignCall::SetRunSequence(labels.to_vec()));
        state.run_sequence = labels.to_vec();
        if self.log_writes {
            info!("[dry-run] run sequence has {} file(s)", labels.len());
        }
        Ok(())
    }

    async fn write_text(&self, file: &TextFile) -> SignResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(SignError::Device("simulated write failure".to_string()));
        }
        state.calls.push(SignCall::WriteText(file.clone()));
        state.memory.insert(file.label, file.clone());
        if self.log_writes && !file.text.is_empty() {
            info!("[dry-run] file '{}' ({}): {}", file.label, file.mode, file.text);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        if self.log_writes {
            "dry-run sign".to_string()
        } else {
            "mock sign".to_string()
        }
    }
}
