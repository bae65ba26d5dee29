//! Protocol error types
//!
//! Errors raised while reading, writing or interpreting frames. The command
//! dispatcher tolerates `MalformedHeader`; everything else ends the session.

use std::fmt;
use std::io;

/// Protocol error type
#[derive(Debug)]
pub enum ProtocolError {
	/// I/O error from the underlying stream
	Io(io::Error),
	/// The peer closed the stream before a full frame arrived
	ConnectionClosed,
	/// Header is not UTF-8 or names no known command
	MalformedHeader(String),
	/// Well-formed frame that makes no sense at this point of the dialogue
	ProtocolViolation(String),
}

impl fmt::Display for ProtocolError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ProtocolError::Io(e) => write!(f, "I/O error: {}", e),
			ProtocolError::ConnectionClosed => write!(f, "Connection closed by peer"),
			ProtocolError::MalformedHeader(header) => write!(f, "Malformed header: {:?}", header),
			ProtocolError::ProtocolViolation(msg) => write!(f, "Protocol violation: {}", msg),
		}
	}
}

impl std::error::Error for ProtocolError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			ProtocolError::Io(e) => Some(e),
			_ => None,
		}
	}
}

impl From<io::Error> for ProtocolError {
	fn from(e: io::Error) -> Self {
		match e.kind() {
			io::ErrorKind::UnexpectedEof => ProtocolError::ConnectionClosed,
			_ => ProtocolError::Io(e),
		}
	}
}

// vim: ts=4
