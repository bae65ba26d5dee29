//! Typed message channel over one byte stream
//!
//! Wraps any bidirectional async stream (a `TcpStream` in production, an
//! in-memory duplex pipe in tests) and speaks whole messages.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufStream};
use tracing::trace;

use super::error::ProtocolError;
use super::frame::{read_frame, write_frame, Frame};
use super::message::Message;

pub struct Channel<S> {
	stream: BufStream<S>,
	closed: bool,
}

impl<S> Channel<S>
where
	S: AsyncRead + AsyncWrite + Unpin,
{
	pub fn new(stream: S) -> Self {
		Self { stream: BufStream::new(stream), closed: false }
	}

	/// Send one message and flush it to the peer
	pub async fn send(&mut self, message: Message) -> Result<(), ProtocolError> {
		if self.closed {
			return Err(ProtocolError::ConnectionClosed);
		}
		let frame = message.into_frame();
		trace!(
			"-> {} ({} byte payload)",
			String::from_utf8_lossy(&frame.header),
			frame.payload.len()
		);
		write_frame(&mut self.stream, &frame).await
	}

	/// Receive the next raw frame
	pub async fn recv_frame(&mut self) -> Result<Frame, ProtocolError> {
		if self.closed {
			return Err(ProtocolError::ConnectionClosed);
		}
		let frame = read_frame(&mut self.stream).await?;
		trace!(
			"<- {} ({} byte payload)",
			String::from_utf8_lossy(&frame.header),
			frame.payload.len()
		);
		Ok(frame)
	}

	/// Receive and decode the next message
	pub async fn recv(&mut self) -> Result<Message, ProtocolError> {
		Message::from_frame(self.recv_frame().await?)
	}

	/// Shut down the write half. Idempotent; dropping the channel releases the
	/// stream on every other exit path.
	pub async fn close(&mut self) -> Result<(), ProtocolError> {
		if self.closed {
			return Ok(());
		}
		self.closed = true;
		self.stream.shutdown().await?;
		Ok(())
	}

	pub fn is_closed(&self) -> bool {
		self.closed
	}
}


// vim: ts=4
