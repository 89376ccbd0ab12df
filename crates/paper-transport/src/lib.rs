//! PaperTracker transport - UDP listeners
//!
//! This crate contains:
//! - The per-port listener registry (bind, receive loop, teardown)
//! - The [`OscHandler`] seam through which decoded messages leave the loop

pub mod listener;

pub use listener::*;
