//! PaperTracker signal filters
//!
//! This crate contains:
//! - An exponential low-pass filter with first-sample passthrough
//! - The One-Euro adaptive filter built from two low-pass stages
//!
//! Every tracked signal owns its own filter instance. Filters are never
//! shared and only reset by reconstruction.

pub mod lowpass;
pub mod one_euro;

pub use lowpass::*;
pub use one_euro::*;
