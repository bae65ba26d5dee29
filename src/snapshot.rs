//! Directory snapshots
//!
//! A snapshot is an immutable tree of `FileNode`s captured once at session
//! start. Children are ordered so that entries without children come first,
//! then by name; that order is also the order in which files are synchronized.

use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{with_path, SyncError, SyncResult};
use crate::exclusion::NameFilter;
use crate::logging::*;
use crate::path::SEPARATOR;

pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
	File,
	Directory,
}

/// One filesystem entry as it was when the snapshot was taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
	/// Base name, no separators
	pub name: String,
	/// Absolute path of the containing directory
	pub parent_path: PathBuf,
	/// `parent_path` joined with `name`
	pub path: PathBuf,
	pub kind: NodeKind,
	/// Sorted children, empty for anything but a non-empty directory
	pub children: Vec<FileNode>,
}

impl FileNode {
	pub fn is_dir(&self) -> bool {
		self.kind == NodeKind::Directory
	}

	/// Path of this node relative to `root`, as sent on the wire: `/`
	/// separated with a leading `/`, e.g. `/notes/readme.md`.
	pub fn relative_path(&self, root: &FileNode) -> String {
		let rel = self.path.strip_prefix(&root.path).unwrap_or(&self.path);
		let mut wire = String::new();
		for component in rel.components() {
			if let Component::Normal(name) = component {
				wire.push(SEPARATOR);
				wire.push_str(&name.to_string_lossy());
			}
		}
		wire
	}

	/// Last modification time in seconds since the Unix epoch
	pub fn last_modified(&self) -> SyncResult<f64> {
		let metadata = fs::metadata(&self.path).map_err(|e| with_path(e, &self.path))?;
		Ok(system_time_secs(metadata.modified()?))
	}

	/// Regular files of the subtree in synchronization order
	pub fn files(&self) -> Files<'_> {
		Files { stack: self.children.iter().rev().collect() }
	}

	fn render(&self, f: &mut fmt::Formatter<'_>, prefix: &str) -> fmt::Result {
		let count = self.children.len();
		for (i, child) in self.children.iter().enumerate() {
			let last = i + 1 == count;
			write!(f, "\n{}{}{}", prefix, if last { "`-- " } else { "|-- " }, child.name)?;
			let nested = format!("{}{}", prefix, if last { "    " } else { "|   " });
			child.render(f, &nested)?;
		}
		Ok(())
	}
}

/// ASCII tree, one line per node
impl fmt::Display for FileNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.name)?;
		self.render(f, "")
	}
}

/// Depth-first iterator over regular files, see [`FileNode::files`]
pub struct Files<'a> {
	stack: Vec<&'a FileNode>,
}

impl<'a> Iterator for Files<'a> {
	type Item = &'a FileNode;

	fn next(&mut self) -> Option<Self::Item> {
		while let Some(node) = self.stack.pop() {
			if node.is_dir() {
				self.stack.extend(node.children.iter().rev());
			} else {
				return Some(node);
			}
		}
		None
	}
}

/// Convert a timestamp to fractional seconds since the Unix epoch
pub fn system_time_secs(time: SystemTime) -> f64 {
	match time.duration_since(UNIX_EPOCH) {
		Ok(d) => d.as_secs_f64(),
		Err(e) => -e.duration().as_secs_f64(),
	}
}

fn child_order(a: &FileNode, b: &FileNode) -> Ordering {
	(!a.children.is_empty(), &a.name).cmp(&(!b.children.is_empty(), &b.name))
}

/// Directory whose entries are still being visited
struct Pending {
	node: FileNode,
	entries: Vec<String>,
	depth: usize,
}

/// Builds snapshots with a name filter and a nesting limit
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
	filter: NameFilter,
	max_depth: usize,
}

impl Default for SnapshotBuilder {
	fn default() -> Self {
		Self { filter: NameFilter::default(), max_depth: DEFAULT_MAX_DEPTH }
	}
}

impl SnapshotBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn filter(mut self, filter: NameFilter) -> Self {
		self.filter = filter;
		self
	}

	pub fn max_depth(mut self, max_depth: usize) -> Self {
		self.max_depth = max_depth;
		self
	}

	/// Snapshot the entry at `path`, which must exist
	pub fn from_path(&self, path: &Path) -> SyncResult<FileNode> {
		let path = fs::canonicalize(path).map_err(|e| with_path(e, path))?;
		match (path.file_name(), path.parent()) {
			(Some(name), Some(parent)) => {
				let name = name.to_string_lossy().into_owned();
				self.build(&name, parent)
			}
			_ => self.build("", &path),
		}
	}

	/// Snapshot the entry `name` inside directory `location`.
	///
	/// Walks with an explicit stack, so deep trees cost heap rather than call
	/// stack; nesting beyond `max_depth` fails with `TooDeep`.
	pub fn build(&self, name: &str, location: &Path) -> SyncResult<FileNode> {
		let root = self.node(name, location)?;
		if !root.is_dir() {
			return Ok(root);
		}

		let mut stack: Vec<Pending> = Vec::new();
		let mut current = self.open(root, 0)?;
		loop {
			if let Some(entry) = current.entries.pop() {
				if let Some(child) = self.child(&entry, &current.node.path)? {
					if child.is_dir() {
						let next = self.open(child, current.depth + 1)?;
						stack.push(std::mem::replace(&mut current, next));
					} else {
						current.node.children.push(child);
					}
				}
				continue;
			}

			let mut node = current.node;
			node.children.sort_by(child_order);
			match stack.pop() {
				Some(parent) => {
					current = parent;
					current.node.children.push(node);
				}
				None => return Ok(node),
			}
		}
	}

	fn node(&self, name: &str, location: &Path) -> SyncResult<FileNode> {
		let path = location.join(name);
		let metadata = fs::metadata(&path).map_err(|e| with_path(e, &path))?;
		let kind = if metadata.is_dir() { NodeKind::Directory } else { NodeKind::File };
		Ok(FileNode {
			name: name.to_string(),
			parent_path: location.to_path_buf(),
			path,
			kind,
			children: Vec::new(),
		})
	}

	/// Like `node`, but an entry that vanished or is a dangling link is skipped
	fn child(&self, name: &str, location: &Path) -> SyncResult<Option<FileNode>> {
		match self.node(name, location) {
			Ok(node) => Ok(Some(node)),
			Err(SyncError::NotFound { path }) => {
				warn!("Skipping unreadable entry {}", path.display());
				Ok(None)
			}
			Err(e) => Err(e),
		}
	}

	fn open(&self, node: FileNode, depth: usize) -> SyncResult<Pending> {
		if depth > self.max_depth {
			return Err(SyncError::TooDeep { path: node.path, limit: self.max_depth });
		}

		let mut entries = Vec::new();
		for entry in fs::read_dir(&node.path).map_err(|e| with_path(e, &node.path))? {
			let entry = entry?;
			match entry.file_name().into_string() {
				Ok(name) if self.filter.is_excluded(&name) => {
					debug!("Excluding {}", node.path.join(&name).display());
				}
				Ok(name) => entries.push(name),
				Err(raw) => {
					warn!("Skipping non UTF-8 name {:?} in {}", raw, node.path.display());
				}
			}
		}
		Ok(Pending { node, entries, depth })
	}
}


// vim: ts=4
