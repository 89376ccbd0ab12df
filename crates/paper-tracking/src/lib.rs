//! PaperTracker tracking - Signal mapping
//!
//! This crate contains:
//! - The eye mapping engine with its two wire dialects (V1, V2)
//! - Widen, squint and eyebrow emulation
//! - The face expression table and router
//!
//! Both sides expose a message entry point, called from the receive loop,
//! and a per-tick pull that writes into [`paper_core::UnifiedTrackingData`].

pub mod eye;
pub mod face;

pub use eye::*;
pub use face::*;
