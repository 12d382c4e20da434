//! Serial-attached sign
//!
//! Packets are written on tokio's blocking pool since the serial port API is
//! synchronous.

use super::alpha;
use super::traits::*;
use async_trait::async_trait;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Default line speed for Alpha signs
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Write timeout on the serial line
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// The sign needs a moment after a memory wipe before it accepts commands
const CLEAR_SETTLE: Duration = Duration::from_secs(1);

/// Sign attached to a local serial or USB-serial device
#[derive(Clone)]
pub struct SerialSign {
    port: Arc<Mutex<Box<dyn serialport::SerialPort>>>,
    path: String,
}

impl SerialSign {
    /// Open the serial device at `path`
    pub fn open(path: &str, baud_rate: u32) -> SignResult<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(WRITE_TIMEOUT)
            .open()
            .map_err(|e| SignError::Device(format!("Failed to open '{}': {}", path, e)))?;

        Ok(Self {
            port: Arc::new(Mutex::new(port)),
            path: path.to_string(),
        })
    }

    async fn send(&self, packet: Vec<u8>) -> SignResult<()> {
        debug!("Writing {} bytes to {}", packet.len(), self.path);
        let port = Arc::clone(&self.port);

        tokio::task::spawn_blocking(move || -> SignResult<()> {
            let mut port = port.lock().map_err(|_| SignError::Closed)?;
            port.write_all(&packet)?;
            port.flush()?;
            Ok(())
        })
        .await
        .map_err(|e| SignError::Device(format!("Serial write task failed: {}", e)))?
    }
}

#[async_trait]
impl SignDevice for SerialSign {
    async fn clear_memory(&self) -> SignResult<()> {
        self.send(alpha::clear_memory()).await?;
        tokio::time::sleep(CLEAR_SETTLE).await;
        Ok(())
    }

    async fn allocate(&self, files: &[TextFile]) -> SignResult<()> {
        self.send(alpha::allocate(files)).await
    }

    async fn set_run_sequence(&self, labels: &[Label]) -> SignResult<()> {
        self.send(alpha::run_sequence(labels)).await
    }

    async fn write_text(&self, file: &TextFile) -> SignResult<()> {
        self.send(alpha::write_text(file)).await
    }

    fn describe(&self) -> String {
        format!("serial sign at {}", self.path)
    }
}
