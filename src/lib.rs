//! # blastcp - single file copy with live progress
//!
//! blastcp copies one regular file to a destination path while a render
//! loop shows a spinner and a percentage bar.
//!
//! ## Features
//!
//! - **Chunked copy**: fixed-size read/write cycles with exact byte accounting
//! - **Progress observer**: monotonic fractions from 0.0 to 1.0
//! - **Message-driven UI**: one ordered inbox, owned state, spinner ticks
//! - **Two frontends**: inline terminal display or an indicatif line bar
//! - **Cancellation**: quit from the keyboard, partial files left in place
//!
//! ## Quick Start
//!
//! ```no_run
//! use blastcp::core::{Copier, CopyRequest, RecordingSink};
//!
//! let copier = Copier::new(4096);
//! let mut sink = RecordingSink::new();
//! let stats = copier
//!     .copy(&CopyRequest::new("disk.img", "backup.img"), &mut sink)
//!     .unwrap();
//!
//! println!("Copied {} bytes in {} chunks", stats.bytes_copied, stats.chunks);
//! assert_eq!(sink.last(), Some(1.0));
//! ```
//!
//! ## With a display
//!
//! ```no_run
//! use blastcp::app;
//! use blastcp::config::{CopyConfig, DisplayMode};
//! use blastcp::progress::ExitReason;
//! use std::path::PathBuf;
//!
//! let config = CopyConfig {
//!     source: PathBuf::from("disk.img"),
//!     destination: PathBuf::from("backup.img"),
//!     display: DisplayMode::Plain,
//!     ..Default::default()
//! };
//!
//! match app::run(&config).unwrap() {
//!     ExitReason::Completed(stats) => println!("{} bytes", stats.bytes_copied),
//!     ExitReason::Failed(e) => eprintln!("{}", e),
//!     ExitReason::UserQuit { .. } => eprintln!("stopped"),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod app;
pub mod config;
pub mod core;
pub mod error;
pub mod progress;

// Re-export commonly used types
pub use config::CopyConfig;
pub use core::{Copier, CopyRequest, CopyStats};
pub use error::{BlastError, CopyError, Result};
pub use progress::{ExitReason, Reporter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
