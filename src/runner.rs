//! Sign loop
//!
//! Repeatedly asks the module (or the sequence queue) what to show, writes it
//! to the sign and holds it for the sequence duration. Everything is best
//! effort: failures are logged and the loop carries on.

use crate::modules::{ModuleContext, SequenceModule};
use crate::queue::{MessageReceiver, SequenceReceiver};
use crate::sequence::Sequence;
use crate::sign::{labels, SignDevice, SignError, TextFile, MAX_TEXT_FILES};
use chrono::{DateTime, Local};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Text files allocated on the sign
pub const DEFAULT_TEXT_FILES: usize = 60;

/// How long a refresh waits for a queued sequence before asking the module
const QUEUE_WAIT: Duration = Duration::from_secs(1);

/// Poll interval while the module is inactive
const INACTIVE_POLL: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Sign setup failed: {0}")]
    Setup(#[from] SignError),

    #[error("Invalid sign loop configuration: {0}")]
    Config(String),
}

/// Drives one sign from one module
pub struct SignRunner<D: SignDevice> {
    device: D,
    module: Box<dyn SequenceModule>,
    sequences: SequenceReceiver,
    messages: MessageReceiver,
    /// What each text file currently holds on the sign
    files: Vec<TextFile>,
    run_sequence_len: usize,
    active: bool,
    pending: Option<Sequence>,
    sequences_open: bool,
}

impl<D: SignDevice> SignRunner<D> {
    pub fn new(
        device: D,
        module: Box<dyn SequenceModule>,
        sequences: SequenceReceiver,
        messages: MessageReceiver,
        text_files: usize,
    ) -> Result<Self, RunnerError> {
        if text_files == 0 || text_files > MAX_TEXT_FILES {
            return Err(RunnerError::Config(format!(
                "text_files must be between 1 and {}, got {}",
                MAX_TEXT_FILES, text_files
            )));
        }

        let files = labels(text_files)?.into_iter().map(TextFile::blank).collect();

        Ok(Self {
            device,
            module,
            sequences,
            messages,
            files,
            run_sequence_len: 0,
            active: true,
            pending: None,
            sequences_open: true,
        })
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Wipe the sign, allocate the text files and blank them
    pub async fn initialize(&mut self) -> Result<(), RunnerError> {
        info!("Initializing {}...", self.device.describe());
        self.device.clear_memory().await?;
        self.device.allocate(&self.files).await?;

        self.device.set_run_sequence(&[self.files[0].label]).await?;
        self.run_sequence_len = 1;

        for file in &self.files {
            self.device.write_text(file).await?;
        }
        Ok(())
    }

    /// Run until `shutdown` flips to true (or its sender goes away)
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), RunnerError> {
        self.initialize().await?;
        info!("Sign loop running with module '{}'", self.module.name());

        loop {
            if *shutdown.borrow() {
                break;
            }

            let stop = match self.refresh(Local::now()).await {
                Some(duration) => self.hold(duration, &mut shutdown).await,
                None => wait_or_shutdown(INACTIVE_POLL, &mut shutdown).await,
            };
            if stop {
                break;
            }
        }

        info!("Exiting sign loop");
        Ok(())
    }

    /// One pass of the loop: update the sign and return how long to hold it,
    /// or `None` while the module is inactive.
    pub async fn refresh(&mut self, now: DateTime<Local>) -> Option<Duration> {
        if !self.module.accepts_messages() {
            let dropped = self.messages.drain().len();
            if dropped > 0 {
                warn!(
                    "Module '{}' does not show submitted messages, discarding {}",
                    self.module.name(),
                    dropped
                );
            }
        }

        if !self.check_active(&now).await {
            return None;
        }

        let sequence = self.next_sequence(now).await;
        self.display(&sequence).await;
        Some(Duration::from_secs(u64::from(sequence.duration)))
    }

    async fn check_active(&mut self, now: &DateTime<Local>) -> bool {
        let active = self.module.is_active(now);

        if !active && self.active {
            info!("Going into inactive mode, sleeping...");
            for i in 0..self.files.len() {
                let cleared = self.files[i].cleared();
                self.write_if_changed(i, cleared).await;
            }
        } else if active && !self.active {
            info!("Waking up from inactive mode.");
        }

        self.active = active;
        active
    }

    async fn next_sequence(&mut self, now: DateTime<Local>) -> Sequence {
        if let Some(sequence) = self.pending.take() {
            return sequence;
        }

        if self.sequences_open {
            match tokio::time::timeout(QUEUE_WAIT, self.sequences.recv()).await {
                Ok(Some(sequence)) => return sequence,
                Ok(None) => self.sequences_open = false,
                Err(_) => {}
            }
        }

        let mut ctx = ModuleContext::at(&mut self.messages, now);
        match self.module.sign_sequence(&mut ctx).await {
            Ok(Some(sequence)) => sequence,
            Ok(None) => Sequence::empty(),
            Err(e) => {
                error!("Error running sign_sequence(): {}", e);
                Sequence::empty()
            }
        }
    }

    async fn display(&mut self, sequence: &Sequence) {
        let capacity = self.files.len();
        let mut messages = sequence.messages.as_slice();
        if messages.len() > capacity {
            warn!(
                "Got {} messages, which exceeds limit of {}. Truncating.",
                messages.len(),
                capacity
            );
            messages = &messages[..capacity];
        }

        if messages.len() != self.run_sequence_len {
            debug!("Re-setting run sequence");
            let run: Vec<_> = self.files[..messages.len()].iter().map(|f| f.label).collect();
            match self.device.set_run_sequence(&run).await {
                Ok(()) => self.run_sequence_len = run.len(),
                Err(e) => error!("Failed to set run sequence: {}", e),
            }
        }

        for i in 0..capacity {
            let target = match messages.get(i) {
                Some(message) => {
                    info!("Displaying msg: {}", message.text);
                    self.files[i].showing(message)
                }
                None => TextFile::blank(self.files[i].label),
            };
            self.write_if_changed(i, target).await;
        }
    }

    async fn write_if_changed(&mut self, index: usize, target: TextFile) {
        if self.files[index] == target {
            return;
        }

        debug!("Text file '{}' changed, writing to sign", target.label);
        match self.device.write_text(&target).await {
            Ok(()) => self.files[index] = target,
            Err(e) => error!("Failed to write text file '{}': {}", target.label, e),
        }
    }

    /// Leave the sign alone for `duration`. Returns true on shutdown.
    async fn hold(&mut self, duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
        info!("Sleeping for {} secs...", duration.as_secs());
        let sleep = tokio::time::sleep(duration);
        tokio::pin!(sleep);

        let stop = loop {
            tokio::select! {
                _ = &mut sleep => break false,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break true;
                    }
                }
                queued = self.sequences.recv(), if self.sequences_open => match queued {
                    Some(sequence) => {
                        debug!("Queued sequence arrived, cutting sleep short");
                        self.pending = Some(sequence);
                        break false;
                    }
                    None => self.sequences_open = false,
                },
            }
        };

        info!("Woke up!");
        stop
    }
}

/// Sleep for `duration` unless shutdown is requested first. Returns true on
/// shutdown.
async fn wait_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => *shutdown.borrow(),
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
    }
}
