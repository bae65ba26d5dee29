//! Wire protocol
//!
//! Frames (`frame`) carry a text header and a binary payload; `message` maps
//! them onto the closed set of commands; `channel` speaks messages over a
//! stream.
//!
//! # Example Usage
//!
//! ```ignore
//! use treesync::protocol::{Channel, Message};
//!
//! let mut channel = Channel::new(stream);
//! channel.send(Message::Peek { path: "/a.txt".into(), mtime: 100.0 }).await?;
//! let reply = channel.recv().await?;
//! ```

pub mod channel;
pub mod error;
pub mod frame;
pub mod message;

pub use channel::Channel;
pub use error::ProtocolError;
pub use frame::{read_frame, write_frame, Frame};
pub use message::{Command, Message};

// vim: ts=4
