//! Error types for treesync sessions

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::protocol::ProtocolError;

/// Main error type for a sync session
#[derive(Debug)]
pub enum SyncError {
	/// A path that must exist does not (sync root, or a file requested by the peer)
	NotFound { path: PathBuf },

	/// A wire path tried to leave the session root
	UnsafePath { path: String },

	/// Directory nesting exceeded the configured snapshot depth
	TooDeep { path: PathBuf, limit: usize },

	/// Invalid configuration
	InvalidConfig { message: String },

	/// Wire-level failure (nested)
	Protocol(ProtocolError),

	/// Local filesystem or socket error
	Io(io::Error),
}

impl fmt::Display for SyncError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SyncError::NotFound { path } => write!(f, "No such file or directory: {}", path.display()),
			SyncError::UnsafePath { path } => {
				write!(f, "Refusing path outside of sync root: {}", path)
			}
			SyncError::TooDeep { path, limit } => {
				write!(f, "Directory nesting deeper than {} levels at {}", limit, path.display())
			}
			SyncError::InvalidConfig { message } => {
				write!(f, "Invalid configuration: {}", message)
			}
			SyncError::Protocol(e) => write!(f, "Protocol error: {}", e),
			SyncError::Io(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl Error for SyncError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			SyncError::Protocol(e) => Some(e),
			SyncError::Io(e) => Some(e),
			_ => None,
		}
	}
}

impl From<io::Error> for SyncError {
	fn from(e: io::Error) -> Self {
		SyncError::Io(e)
	}
}

impl From<ProtocolError> for SyncError {
	fn from(e: ProtocolError) -> Self {
		SyncError::Protocol(e)
	}
}

/// Result alias used across the session layer
pub type SyncResult<T> = Result<T, SyncError>;

/// Attach the offending path to a `NotFound` I/O error, pass the rest through
pub(crate) fn with_path(e: io::Error, path: &std::path::Path) -> SyncError {
	if e.kind() == io::ErrorKind::NotFound {
		SyncError::NotFound { path: path.to_path_buf() }
	} else {
		SyncError::Io(e)
	}
}


// vim: ts=4
