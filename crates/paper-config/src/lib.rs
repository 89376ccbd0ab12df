//! PaperTracker configuration - Live configuration ownership
//!
//! This crate contains:
//! - The `/command/set/<field>` dispatch table and value coercion
//! - The configuration manager: immutable snapshots, listeners, persistence
//! - Storage backends (JSON files on disk, in-memory) and legacy migration

pub mod command;
pub mod manager;
pub mod store;

pub use command::*;
pub use manager::*;
pub use store::*;
