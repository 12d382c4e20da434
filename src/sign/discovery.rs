//! Serial device discovery

use std::fs;
use std::path::{Path, PathBuf};

/// Well-known device names checked before scanning
const KNOWN_DEVICES: &[&str] = &["ttyS0", "tty.usbserial"];

/// Prefix of the device nodes created by the PL2303 USB-serial driver on macOS
const PL2303_PREFIX: &str = "tty.PL2303";

/// Best candidate serial device for the sign, if any.
pub fn guess_device() -> Option<PathBuf> {
    guess_device_in(Path::new("/dev"))
}

/// Same as [`guess_device`] but looking under `dev_dir`.
pub fn guess_device_in(dev_dir: &Path) -> Option<PathBuf> {
    for name in KNOWN_DEVICES {
        let path = dev_dir.join(name);
        if path.exists() {
            return Some(path);
        }
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(dev_dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(PL2303_PREFIX))
        .map(|entry| entry.path())
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

/// Serial ports the operating system reports.
pub fn available_devices() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            tracing::warn!("Could not enumerate serial ports: {}", e);
            Vec::new()
        }
    }
}
