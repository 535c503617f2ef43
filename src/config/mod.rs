//! Configuration module for blastcp
//!
//! CLI arguments and the validated runtime settings built from them.

mod settings;

pub use settings::*;
