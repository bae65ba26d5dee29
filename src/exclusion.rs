//! Entry-name exclusion applied while taking a snapshot
//!
//! `desktop.ini` is always skipped. Extra glob patterns from the
//! configuration are matched against the bare entry name, not the full path.

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::SyncError;

/// Names that never enter a snapshot
pub const ALWAYS_EXCLUDED: &[&str] = &["desktop.ini"];

#[derive(Debug, Clone)]
pub struct NameFilter {
	patterns: GlobSet,
}

impl NameFilter {
	/// Compile the configured patterns
	pub fn new(patterns: &[String]) -> Result<Self, SyncError> {
		let mut builder = GlobSetBuilder::new();
		for pattern in patterns {
			let glob = Glob::new(pattern).map_err(|e| SyncError::InvalidConfig {
				message: format!("bad exclude pattern {:?}: {}", pattern, e),
			})?;
			builder.add(glob);
		}
		let patterns =
			builder.build().map_err(|e| SyncError::InvalidConfig { message: e.to_string() })?;
		Ok(Self { patterns })
	}

	pub fn is_excluded(&self, name: &str) -> bool {
		ALWAYS_EXCLUDED.contains(&name) || self.patterns.is_match(name)
	}
}

impl Default for NameFilter {
	fn default() -> Self {
		Self { patterns: GlobSet::empty() }
	}
}


// vim: ts=4
