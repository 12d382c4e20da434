//! LED Sign Integration Module
//!
//! Device seam between the sign loop and the hardware:
//! - `SignDevice` trait with the four operations the loop uses
//! - Alpha packet encoding for the serial adapter
//! - `MockSign` for tests and dry runs

pub mod alpha;
pub mod discovery;
pub mod mock;
pub mod serial;
pub mod traits;

pub use discovery::{available_devices, guess_device};
pub use mock::{MockSign, SignCall};
pub use serial::{SerialSign, DEFAULT_BAUD_RATE};
pub use traits::{
    labels, Label, SignDevice, SignError, SignResult, TextFile, MAX_TEXT_FILES, TEXT_FILE_SIZE,
};
