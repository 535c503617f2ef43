//! Core copy module
//!
//! Provides the chunked single-file copier and the observer interface it
//! reports progress through.

mod copier;
mod sink;

pub use copier::*;
pub use sink::*;
