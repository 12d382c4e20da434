//! simplesign - LED signboard driver
//!
//! Periodically asks a module what an Alpha/BetaBrite LED sign should show
//! and writes it over a serial link. A small web server lets people queue
//! their own messages and high-priority sequences.
//!
//! Layout:
//! - [`sequence`]: messages, display attributes, text cleanup
//! - [`sign`]: the device seam plus the serial and mock devices
//! - [`modules`]: sequence providers (built-in and module files)
//! - [`queue`]: web server to sign loop hand-off
//! - [`runner`]: the sign loop
//! - [`server`]: HTTP front end

pub mod logging;
pub mod modules;
pub mod queue;
pub mod runner;
pub mod sequence;
pub mod server;
pub mod sign;
