//! Initiator side: snapshot-driven reconciliation
//!
//! For every file in the snapshot, in depth-first order, the Initiator asks
//! the Responder whether its copy is newer (`PEEK`). A newer remote copy is
//! pulled with `GET`; otherwise the local copy is pushed with `FILE`. Files
//! that exist only on the Responder are never touched.

use tokio::fs as afs;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::Config;
use crate::connection::PeerListener;
use crate::error::{with_path, SyncResult};
use crate::logging::*;
use crate::protocol::{Channel, Message, ProtocolError};
use crate::serve::write_file;
use crate::snapshot::FileNode;

/// What an Initiator did during one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
	pub files: usize,
	pub pushed: usize,
	pub pulled: usize,
	pub bytes_sent: u64,
	pub bytes_received: u64,
}

/// Direction chosen for one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
	Push,
	Pull,
}

pub struct Initiator<S> {
	root: FileNode,
	session: Session<S>,
}

struct Session<S> {
	channel: Channel<S>,
	summary: SyncSummary,
}

impl<S> Initiator<S>
where
	S: AsyncRead + AsyncWrite + Unpin,
{
	pub fn new(root: FileNode, stream: S) -> Self {
		Self { root, session: Session { channel: Channel::new(stream), summary: SyncSummary::default() } }
	}

	/// Reconcile every file of the snapshot, then send `CLOSE` and shut the
	/// connection down
	pub async fn sync(mut self) -> SyncResult<SyncSummary> {
		for node in self.root.files() {
			let wire_path = node.relative_path(&self.root);
			let transfer = self.session.sync_file(node, &wire_path).await?;
			debug!("{:?} {}", transfer, wire_path);
		}

		self.session.channel.send(Message::Close).await?;
		self.session.channel.close().await?;
		Ok(self.session.summary)
	}
}

impl<S> Session<S>
where
	S: AsyncRead + AsyncWrite + Unpin,
{
	async fn sync_file(&mut self, node: &FileNode, wire_path: &str) -> SyncResult<Transfer> {
		let mtime = node.last_modified()?;
		self.channel.send(Message::Peek { path: wire_path.to_string(), mtime }).await?;
		self.summary.files += 1;

		let remote_newer = match self.channel.recv().await? {
			Message::Response { affirmative } => affirmative,
			other => return Err(unexpected("RESPONSE", &other).into()),
		};

		if remote_newer {
			self.channel.send(Message::Get { path: wire_path.to_string() }).await?;
			let contents = match self.channel.recv().await? {
				Message::File { contents, .. } => contents,
				other => return Err(unexpected("FILE", &other).into()),
			};
			write_file(&node.path, &contents).await?;
			self.summary.pulled += 1;
			self.summary.bytes_received += contents.len() as u64;
			Ok(Transfer::Pull)
		} else {
			let contents = afs::read(&node.path).await.map_err(|e| with_path(e, &node.path))?;
			let size = contents.len() as u64;
			self.channel.send(Message::File { path: wire_path.to_string(), contents }).await?;
			match self.channel.recv().await? {
				Message::Response { .. } => {}
				other => return Err(unexpected("RESPONSE", &other).into()),
			}
			self.summary.pushed += 1;
			self.summary.bytes_sent += size;
			Ok(Transfer::Push)
		}
	}
}

fn unexpected(expected: &str, got: &Message) -> ProtocolError {
	ProtocolError::ProtocolViolation(format!("expected {}, got {}", expected, got.command()))
}

/// Snapshot `root`, wait for one Responder and reconcile against it
pub async fn initiate(root: &std::path::Path, config: &Config) -> SyncResult<SyncSummary> {
	let snapshot = config.snapshot_builder()?.from_path(root)?;
	debug!("Snapshot of {}:\n{}", snapshot.path.display(), snapshot);

	let listener = PeerListener::bind(&config.bind_endpoint()).await?;
	let stream = listener.accept().await?;

	let summary = Initiator::new(snapshot, stream).sync().await?;
	info!(
		"Sync complete: {} files, {} pushed, {} pulled",
		summary.files, summary.pushed, summary.pulled
	);
	Ok(summary)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::snapshot::SnapshotBuilder;
	use std::fs;
	use tempfile::TempDir;

	#[tokio::test]
	async fn test_push_sequence() {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
		let snapshot = SnapshotBuilder::new().from_path(dir.path()).unwrap();

		let (ours, theirs) = tokio::io::duplex(64);
		let task = tokio::spawn(Initiator::new(snapshot, ours).sync());
		let mut peer = Channel::new(theirs);

		match peer.recv().await.unwrap() {
			Message::Peek { path, .. } => assert_eq!(path, "/a.txt"),
			other => panic!("unexpected message: {:?}", other),
		}
		peer.send(Message::Response { affirmative: false }).await.unwrap();
		assert_eq!(
			peer.recv().await.unwrap(),
			Message::File { path: "/a.txt".into(), contents: b"alpha".to_vec() }
		);
		peer.send(Message::Response { affirmative: true }).await.unwrap();
		assert_eq!(peer.recv().await.unwrap(), Message::Close);

		let summary = task.await.unwrap().unwrap();
		assert_eq!(summary, SyncSummary { files: 1, pushed: 1, pulled: 0, bytes_sent: 5, bytes_received: 0 });
		assert!(matches!(peer.recv().await, Err(ProtocolError::ConnectionClosed)));
	}

	#[tokio::test]
	async fn test_pull_overwrites_local() {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("a.txt"), b"old").unwrap();
		let snapshot = SnapshotBuilder::new().from_path(dir.path()).unwrap();

		let (ours, theirs) = tokio::io::duplex(64);
		let task = tokio::spawn(Initiator::new(snapshot, ours).sync());
		let mut peer = Channel::new(theirs);

		assert!(matches!(peer.recv().await.unwrap(), Message::Peek { .. }));
		peer.send(Message::Response { affirmative: true }).await.unwrap();
		assert_eq!(peer.recv().await.unwrap(), Message::Get { path: "/a.txt".into() });
		peer.send(Message::File { path: "/a.txt".into(), contents: b"newer".to_vec() }).await.unwrap();
		assert_eq!(peer.recv().await.unwrap(), Message::Close);

		let summary = task.await.unwrap().unwrap();
		assert_eq!(summary.pulled, 1);
		assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"newer");
	}

	#[tokio::test]
	async fn test_empty_tree_only_closes() {
		let dir = TempDir::new().unwrap();
		fs::create_dir(dir.path().join("empty")).unwrap();
		let snapshot = SnapshotBuilder::new().from_path(dir.path()).unwrap();

		let (ours, theirs) = tokio::io::duplex(64);
		let task = tokio::spawn(Initiator::new(snapshot, ours).sync());
		let mut peer = Channel::new(theirs);

		assert_eq!(peer.recv().await.unwrap(), Message::Close);
		assert_eq!(task.await.unwrap().unwrap(), SyncSummary::default());
	}

	#[tokio::test]
	async fn test_unexpected_reply_is_a_violation() {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
		let snapshot = SnapshotBuilder::new().from_path(dir.path()).unwrap();

		let (ours, theirs) = tokio::io::duplex(64);
		let task = tokio::spawn(Initiator::new(snapshot, ours).sync());
		let mut peer = Channel::new(theirs);

		assert!(matches!(peer.recv().await.unwrap(), Message::Peek { .. }));
		peer.send(Message::Close).await.unwrap();

		let result = task.await.unwrap();
		assert!(matches!(
			result,
			Err(crate::error::SyncError::Protocol(ProtocolError::ProtocolViolation(_)))
		));
	}
}

// vim: ts=4
