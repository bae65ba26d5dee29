//! TCP endpoints for the two roles
//!
//! The Initiator accepts exactly one connection; the Responder connects to it.
//! These transport roles are fixed and independent of who drives the sync.

use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};

use crate::error::SyncResult;
use crate::logging::*;

/// A bound listener that can hand out a single connection
pub struct PeerListener {
	listener: TcpListener,
}

impl PeerListener {
	pub async fn bind(address: &str) -> SyncResult<Self> {
		let listener = TcpListener::bind(address).await?;
		info!("Listening on {}", listener.local_addr()?);
		Ok(Self { listener })
	}

	pub fn local_addr(&self) -> SyncResult<SocketAddr> {
		Ok(self.listener.local_addr()?)
	}

	/// Wait for the peer. Consumes the listener: one connection per session.
	pub async fn accept(self) -> SyncResult<TcpStream> {
		let (stream, peer) = self.listener.accept().await?;
		stream.set_nodelay(true)?;
		info!("Connected to {}", peer);
		Ok(stream)
	}
}

/// Connect to a listening Initiator
pub async fn connect(address: &str) -> SyncResult<TcpStream> {
	let stream = TcpStream::connect(address).await?;
	stream.set_nodelay(true)?;
	info!("Connected to {}", stream.peer_addr()?);
	Ok(stream)
}


// vim: ts=4
