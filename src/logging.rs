//! Logging prelude module for convenient access to tracing macros.
//!
//! # Usage
//!
//! ```ignore
//! use crate::logging::*;
//!
//! info!("Session started");
//! debug!("Pushing {}", path);
//! ```

pub use tracing::{debug, error, info, trace, warn};

/// Initialize the tracing subscriber.
///
/// `default_level` is used unless `RUST_LOG` is set:
///
/// ```bash
/// RUST_LOG=debug treesync initiate ./dir
/// RUST_LOG=treesync::protocol=trace treesync respond ./dir 10.0.0.2
/// ```
pub fn init_tracing(default_level: &str) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
	// A second call (tests, embedding applications) keeps the first subscriber
	let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

// vim: ts=4
