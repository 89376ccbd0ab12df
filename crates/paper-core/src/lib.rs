//! PaperTracker Core - Fundamental types shared by every crate
//!
//! This crate defines:
//! - The error taxonomy (wire, transport, configuration)
//! - Configuration snapshots with clamped threshold setters
//! - The unified expression enumeration and host-facing output data
//! - Easing math used by the eye mappers

pub mod config;
pub mod data;
pub mod error;
pub mod expression;
pub mod math;

pub use config::*;
pub use data::*;
pub use error::*;
pub use expression::*;
pub use math::*;
