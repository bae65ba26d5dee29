//! Path joining and wire path resolution
//!
//! Wire paths always use `/`. `join` is purely textual; `resolve` maps a wire
//! path onto a local root and refuses anything that would leave it.

use std::path::{Component, Path, PathBuf};

use crate::error::{SyncError, SyncResult};

pub const SEPARATOR: char = '/';

fn is_separator(c: char) -> bool {
	c == '/' || c == '\\'
}

/// Join path segments into one `/`-separated path.
///
/// Empty segments are skipped, backslashes become `/`, every segment but the
/// last ends in exactly one separator, non-first segments lose their leading
/// separators and the last segment is treated as a bare file name (all of its
/// separators are removed). No filesystem access.
pub fn join<S: AsRef<str>>(segments: &[S]) -> String {
	let (last, init) = match segments.split_last() {
		Some(parts) => parts,
		None => return String::new(),
	};

	let mut out = String::new();
	for (i, segment) in init.iter().enumerate() {
		let segment = segment.as_ref();
		if segment.is_empty() {
			continue;
		}
		let normalized = segment.replace('\\', "/");
		let mut trimmed = normalized.trim_end_matches(SEPARATOR);
		if i != 0 {
			trimmed = trimmed.trim_start_matches(SEPARATOR);
			if trimmed.is_empty() {
				continue;
			}
		}
		out.push_str(trimmed);
		out.push(SEPARATOR);
	}
	out.extend(last.as_ref().chars().filter(|c| !is_separator(*c)));
	out
}

/// Non-empty segments of a wire path, `.` dropped. Only `/` separates: a
/// backslash is part of the name.
pub fn wire_segments(wire_path: &str) -> Vec<&str> {
	wire_path.split(SEPARATOR).filter(|s| !s.is_empty() && *s != ".").collect()
}

/// Resolve a wire path to an absolute location under `root`.
///
/// Every segment must be a plain name: `..`, drive prefixes and an empty path
/// are rejected with `UnsafePath`.
pub fn resolve(root: &Path, wire_path: &str) -> SyncResult<PathBuf> {
	let segments = wire_segments(wire_path);
	if segments.is_empty() {
		return Err(SyncError::UnsafePath { path: wire_path.to_string() });
	}

	let mut path = root.to_path_buf();
	for segment in segments {
		let mut components = Path::new(segment).components();
		match (components.next(), components.next()) {
			(Some(Component::Normal(_)), None) => path.push(segment),
			_ => return Err(SyncError::UnsafePath { path: wire_path.to_string() }),
		}
	}
	Ok(path)
}


// vim: ts=4
