//! Responder side: command dispatcher
//!
//! The Responder connects to the Initiator and then answers one message at a
//! time against its own root directory until it receives `CLOSE`.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs as afs;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::Config;
use crate::connection;
use crate::error::{with_path, SyncError, SyncResult};
use crate::logging::*;
use crate::path;
use crate::protocol::{Channel, Message, ProtocolError};
use crate::snapshot::system_time_secs;

/// Responder lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	/// Waiting for the connection to be established
	Listening,
	/// Waiting for the next message
	Connected,
	/// Handling a message
	Processing,
	/// `CLOSE` handled, connection shut down
	Closed,
}

/// What a Responder did during one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServeSummary {
	pub files_received: usize,
	pub files_sent: usize,
	pub peeks_answered: usize,
	pub ignored: usize,
	pub bytes_received: u64,
	pub bytes_sent: u64,
}

pub struct Responder<S> {
	root: PathBuf,
	channel: Channel<S>,
	state: SessionState,
	summary: ServeSummary,
}

impl<S> Responder<S>
where
	S: AsyncRead + AsyncWrite + Unpin,
{
	/// Serve `root` over an established stream
	pub fn new(root: PathBuf, stream: S) -> Self {
		Self {
			root,
			channel: Channel::new(stream),
			state: SessionState::Connected,
			summary: ServeSummary::default(),
		}
	}

	pub fn state(&self) -> SessionState {
		self.state
	}

	pub fn summary(&self) -> &ServeSummary {
		&self.summary
	}

	/// Handle messages until `CLOSE`. Unknown commands are skipped; any other
	/// failure ends the session.
	pub async fn run(&mut self) -> SyncResult<ServeSummary> {
		while self.state != SessionState::Closed {
			let message = match self.channel.recv().await {
				Ok(message) => message,
				Err(ProtocolError::MalformedHeader(header)) => {
					warn!("Ignoring frame with unknown command: {:?}", header);
					self.summary.ignored += 1;
					continue;
				}
				Err(e) => return Err(e.into()),
			};

			self.state = SessionState::Processing;
			self.dispatch(message).await?;
			if self.state == SessionState::Processing {
				self.state = SessionState::Connected;
			}
		}
		Ok(self.summary.clone())
	}

	async fn dispatch(&mut self, message: Message) -> SyncResult<()> {
		match message {
			Message::File { path, contents } => self.handle_file(&path, contents).await,
			Message::Get { path } => self.handle_get(path).await,
			Message::Peek { path, mtime } => self.handle_peek(&path, mtime).await,
			Message::Close => self.handle_close().await,
			Message::Response { .. } => {
				// Nothing is ever outstanding on this side
				warn!("Ignoring unsolicited RESPONSE");
				self.summary.ignored += 1;
				Ok(())
			}
		}
	}

	async fn handle_file(&mut self, wire_path: &str, contents: Vec<u8>) -> SyncResult<()> {
		let target = path::resolve(&self.root, wire_path)?;
		write_file(&target, &contents).await?;
		debug!("Received {} ({} bytes)", wire_path, contents.len());

		self.summary.files_received += 1;
		self.summary.bytes_received += contents.len() as u64;
		self.channel.send(Message::Response { affirmative: true }).await?;
		Ok(())
	}

	async fn handle_get(&mut self, wire_path: String) -> SyncResult<()> {
		let source = path::resolve(&self.root, &wire_path)?;
		let contents = afs::read(&source).await.map_err(|e| with_path(e, &source))?;
		debug!("Sending {} ({} bytes)", wire_path, contents.len());

		self.summary.files_sent += 1;
		self.summary.bytes_sent += contents.len() as u64;
		self.channel.send(Message::File { path: wire_path, contents }).await?;
		Ok(())
	}

	async fn handle_peek(&mut self, wire_path: &str, their_mtime: f64) -> SyncResult<()> {
		let target = path::resolve(&self.root, wire_path)?;
		let newer = match local_mtime(&target).await? {
			Some(ours) => ours > their_mtime,
			None => false,
		};
		debug!("Peek {}: ours newer = {}", wire_path, newer);

		self.summary.peeks_answered += 1;
		self.channel.send(Message::Response { affirmative: newer }).await?;
		Ok(())
	}

	async fn handle_close(&mut self) -> SyncResult<()> {
		self.channel.close().await?;
		self.state = SessionState::Closed;
		Ok(())
	}
}

/// Write `contents` to `target`, creating missing parent directories
pub(crate) async fn write_file(target: &Path, contents: &[u8]) -> SyncResult<()> {
	if let Some(parent) = target.parent() {
		afs::create_dir_all(parent).await?;
	}
	afs::write(target, contents).await?;
	Ok(())
}

/// Modification time of a regular file, `None` when there is none
async fn local_mtime(target: &Path) -> SyncResult<Option<f64>> {
	match afs::metadata(target).await {
		Ok(metadata) if metadata.is_file() => Ok(Some(system_time_secs(metadata.modified()?))),
		Ok(_) => Ok(None),
		Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
			Ok(None)
		}
		Err(e) => Err(SyncError::Io(e)),
	}
}

/// Connect to the Initiator at `peer` and serve `root` until `CLOSE`
pub async fn respond(root: &Path, peer: &str, config: &Config) -> SyncResult<ServeSummary> {
	let root = afs::canonicalize(root).await.map_err(|e| with_path(e, root))?;
	if !afs::metadata(&root).await?.is_dir() {
		return Err(SyncError::NotFound { path: root });
	}

	let address = config.peer_endpoint(peer);
	debug!("Responder {:?}: connecting to {}", SessionState::Listening, address);
	let stream = connection::connect(&address).await?;

	let mut responder = Responder::new(root, stream);
	let summary = responder.run().await?;
	info!(
		"Folder sync complete: {} received, {} sent, {} peeks",
		summary.files_received, summary.files_sent, summary.peeks_answered
	);
	Ok(summary)
}


// vim: ts=4
