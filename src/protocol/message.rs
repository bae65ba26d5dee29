//! Typed protocol messages
//!
//! Every frame header is `COMMAND` or `COMMAND ARGUMENT`. The set of commands
//! is closed, so decoding yields one `Message` variant or a `MalformedHeader`
//! error that the dispatcher may choose to skip.

use std::fmt;

use super::error::ProtocolError;
use super::frame::Frame;

const STATUS_TRUE: &[u8] = b"t";
const STATUS_FALSE: &[u8] = b"f";

/// Command tokens, case-sensitive on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
	File,
	Get,
	Peek,
	Close,
	Response,
}

impl Command {
	pub fn as_str(self) -> &'static str {
		match self {
			Command::File => "FILE",
			Command::Get => "GET",
			Command::Peek => "PEEK",
			Command::Close => "CLOSE",
			Command::Response => "RESPONSE",
		}
	}

	pub fn parse(token: &str) -> Option<Self> {
		match token {
			"FILE" => Some(Command::File),
			"GET" => Some(Command::Get),
			"PEEK" => Some(Command::Peek),
			"CLOSE" => Some(Command::Close),
			"RESPONSE" => Some(Command::Response),
			_ => None,
		}
	}
}

impl fmt::Display for Command {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One request or reply exchanged between Initiator and Responder
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
	/// Full contents of the file at a wire path
	File { path: String, contents: Vec<u8> },
	/// Ask the peer to send the file at a wire path
	Get { path: String },
	/// Ask whether the peer's copy is strictly newer than `mtime`
	Peek { path: String, mtime: f64 },
	/// End of session
	Close,
	/// Reply to `FILE` (always affirmative) or `PEEK`
	Response { affirmative: bool },
}

impl Message {
	pub fn command(&self) -> Command {
		match self {
			Message::File { .. } => Command::File,
			Message::Get { .. } => Command::Get,
			Message::Peek { .. } => Command::Peek,
			Message::Close => Command::Close,
			Message::Response { .. } => Command::Response,
		}
	}

	fn argument(&self) -> &str {
		match self {
			Message::File { path, .. } | Message::Get { path } | Message::Peek { path, .. } => path,
			Message::Close | Message::Response { .. } => "",
		}
	}

	/// Encode into a frame, moving file contents into the payload
	pub fn into_frame(self) -> Frame {
		let header = encode_header(self.command(), self.argument());
		let payload = match self {
			Message::File { contents, .. } => contents,
			Message::Peek { mtime, .. } => mtime.to_string().into_bytes(),
			Message::Response { affirmative: true } => STATUS_TRUE.to_vec(),
			Message::Response { affirmative: false } => STATUS_FALSE.to_vec(),
			Message::Get { .. } | Message::Close => Vec::new(),
		};
		Frame::new(header, payload)
	}

	pub fn to_frame(&self) -> Frame {
		self.clone().into_frame()
	}

	/// Decode a frame into a message
	pub fn from_frame(frame: Frame) -> Result<Self, ProtocolError> {
		let header = String::from_utf8(frame.header).map_err(|e| {
			ProtocolError::MalformedHeader(String::from_utf8_lossy(e.as_bytes()).into_owned())
		})?;
		let (token, argument) = split_header(&header);
		let command =
			Command::parse(token).ok_or_else(|| ProtocolError::MalformedHeader(header.clone()))?;
		let path = argument.to_string();

		let message = match command {
			Command::File => Message::File { path, contents: frame.payload },
			Command::Get => Message::Get { path },
			Command::Peek => Message::Peek { path, mtime: parse_mtime(&frame.payload)? },
			Command::Close => Message::Close,
			Command::Response => Message::Response { affirmative: frame.payload == STATUS_TRUE },
		};
		Ok(message)
	}
}

/// `COMMAND ARGUMENT`, or just `COMMAND` when the argument is empty
pub fn encode_header(command: Command, argument: &str) -> String {
	if argument.is_empty() {
		command.as_str().to_string()
	} else {
		format!("{} {}", command.as_str(), argument)
	}
}

/// Split on the first space; no space means an empty argument
pub fn split_header(header: &str) -> (&str, &str) {
	header.split_once(' ').unwrap_or((header, ""))
}

fn parse_mtime(payload: &[u8]) -> Result<f64, ProtocolError> {
	std::str::from_utf8(payload)
		.ok()
		.and_then(|text| text.trim().parse::<f64>().ok())
		.ok_or_else(|| {
			ProtocolError::ProtocolViolation(format!(
				"PEEK payload is not a timestamp: {:?}",
				String::from_utf8_lossy(payload)
			))
		})
}


// vim: ts=4
