//! # treesync - one-way directory reconciliation over TCP
//!
//! Two peers take part in a session. The *Initiator* snapshots its directory,
//! listens for a single connection and then walks the snapshot file by file:
//! whichever side has the newer copy of a file wins, ties going to the
//! Initiator. The *Responder* connects to it and answers commands against its
//! own root directory until told to close.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use treesync::{config::Config, serve, sync};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     // On one machine
//!     let summary = sync::initiate("./notes".as_ref(), &config).await?;
//!     println!("{} pushed, {} pulled", summary.pushed, summary.pulled);
//!     // On the other one: serve::respond("./notes".as_ref(), "10.0.0.1", &config)
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod exclusion;
pub mod logging;
pub mod path;
pub mod protocol;
pub mod serve;
pub mod snapshot;
pub mod sync;

// Re-export commonly used types and functions
pub use config::Config;
pub use error::{SyncError, SyncResult};
pub use protocol::{Message, ProtocolError};
pub use serve::{respond, Responder, ServeSummary, SessionState};
pub use snapshot::{FileNode, NodeKind, SnapshotBuilder};
pub use sync::{initiate, Initiator, SyncSummary};

// vim: ts=4
