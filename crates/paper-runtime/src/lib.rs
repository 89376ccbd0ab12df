//! PaperTracker runtime - Wiring for hosts and tools
//!
//! This crate contains:
//! - The OSC manager: eye/face channel routing, command dispatch, ERROR
//!   state and config-driven listener restarts
//! - The tracking module facade (`initialize` / `update` / `teardown`)
//! - Tracing subscriber setup for the binaries

pub mod module;
pub mod osc;
pub mod telemetry;

pub use module::*;
pub use osc::*;
pub use telemetry::*;
