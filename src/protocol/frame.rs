//! Length-prefixed frame codec
//!
//! A frame on the wire is
//! `[u64 BE header length][u64 BE payload length][header bytes][payload bytes]`.
//! Both lengths precede their data, so any payload size is admissible and the
//! receiver never depends on transport packet boundaries.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::error::ProtocolError;

/// Size of each length prefix in bytes
pub const LENGTH_PREFIX: usize = 8;

/// Payloads are written in blocks of this size
pub const BLOCK_SIZE: usize = 1024;

/// Upper bound for a single read; buffers grow by at most this much per read
const READ_CHUNK: usize = 64 * 1024;

/// One undecoded unit on the wire
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
	pub header: Vec<u8>,
	pub payload: Vec<u8>,
}

impl Frame {
	pub fn new(header: impl Into<Vec<u8>>, payload: impl Into<Vec<u8>>) -> Self {
		Self { header: header.into(), payload: payload.into() }
	}
}

/// Write one frame and flush the writer
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<(), ProtocolError>
where
	W: AsyncWrite + Unpin,
{
	writer.write_all(&(frame.header.len() as u64).to_be_bytes()).await?;
	writer.write_all(&(frame.payload.len() as u64).to_be_bytes()).await?;
	writer.write_all(&frame.header).await?;
	for block in frame.payload.chunks(BLOCK_SIZE) {
		writer.write_all(block).await?;
	}
	writer.flush().await?;
	Ok(())
}

/// Read one complete frame, blocking until every byte has arrived
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame, ProtocolError>
where
	R: AsyncRead + Unpin,
{
	let header_len = read_length(reader).await?;
	let payload_len = read_length(reader).await?;
	let header = read_counted(reader, header_len).await?;
	let payload = read_counted(reader, payload_len).await?;
	Ok(Frame { header, payload })
}

async fn read_length<R>(reader: &mut R) -> Result<u64, ProtocolError>
where
	R: AsyncRead + Unpin,
{
	let bytes = read_counted(reader, LENGTH_PREFIX as u64).await?;
	let mut raw = [0u8; LENGTH_PREFIX];
	raw.copy_from_slice(&bytes);
	Ok(u64::from_be_bytes(raw))
}

/// Accumulate exactly `len` bytes across partial reads.
///
/// A zero-length read means the peer closed the stream; that is reported as
/// `ConnectionClosed` instead of being retried. The buffer grows with the data
/// actually received, so a bogus length prefix cannot force a huge allocation.
async fn read_counted<R>(reader: &mut R, len: u64) -> Result<Vec<u8>, ProtocolError>
where
	R: AsyncRead + Unpin,
{
	let mut buf = Vec::with_capacity(len.min(READ_CHUNK as u64) as usize);
	let mut remaining = len;

	while remaining > 0 {
		let want = remaining.min(READ_CHUNK as u64) as usize;
		let start = buf.len();
		buf.resize(start + want, 0);
		let n = reader.read(&mut buf[start..]).await?;
		buf.truncate(start + n);
		if n == 0 {
			return Err(ProtocolError::ConnectionClosed);
		}
		remaining -= n as u64;
	}

	Ok(buf)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn pattern(len: usize) -> Vec<u8> {
		(0..len).map(|i| (i % 251) as u8).collect()
	}

	#[tokio::test]
	async fn test_wire_layout() {
		let mut out: Vec<u8> = Vec::new();
		write_frame(&mut out, &Frame::new("PEEK /a.txt", "100.5")).await.unwrap();

		assert_eq!(&out[0..8], &11u64.to_be_bytes());
		assert_eq!(&out[8..16], &5u64.to_be_bytes());
		assert_eq!(&out[16..27], b"PEEK /a.txt");
		assert_eq!(&out[27..], b"100.5");
	}

	#[tokio::test]
	async fn test_partial_reads_and_writes() {
		// A 7 byte pipe forces every frame through many short reads and writes
		for size in [0usize, 1, 1024, 1500, 4097] {
			let (mut tx, mut rx) = tokio::io::duplex(7);
			let frame = Frame::new(format!("FILE /dir/f{}.bin", size), pattern(size));
			let sent = frame.clone();

			let writer = tokio::spawn(async move {
				write_frame(&mut tx, &sent).await.unwrap();
			});
			let received = read_frame(&mut rx).await.unwrap();
			writer.await.unwrap();

			assert_eq!(received, frame, "payload of {} bytes", size);
		}
	}

	#[tokio::test]
	async fn test_back_to_back_frames() {
		let mut out: Vec<u8> = Vec::new();
		write_frame(&mut out, &Frame::new("GET /x", Vec::new())).await.unwrap();
		write_frame(&mut out, &Frame::new("CLOSE", Vec::new())).await.unwrap();

		let mut input = out.as_slice();
		assert_eq!(read_frame(&mut input).await.unwrap().header, b"GET /x");
		assert_eq!(read_frame(&mut input).await.unwrap().header, b"CLOSE");
	}

	#[tokio::test]
	async fn test_closed_before_prefix() {
		let mut input: &[u8] = &[0, 0, 0];
		assert!(matches!(read_frame(&mut input).await, Err(ProtocolError::ConnectionClosed)));
	}

	#[tokio::test]
	async fn test_closed_mid_payload() {
		let mut out: Vec<u8> = Vec::new();
		write_frame(&mut out, &Frame::new("FILE /big", pattern(3000))).await.unwrap();
		out.truncate(out.len() - 10);

		let mut input = out.as_slice();
		assert!(matches!(read_frame(&mut input).await, Err(ProtocolError::ConnectionClosed)));
	}

	#[tokio::test]
	async fn test_closed_pipe() {
		let (tx, mut rx) = tokio::io::duplex(64);
		drop(tx);
		assert!(matches!(read_frame(&mut rx).await, Err(ProtocolError::ConnectionClosed)));
	}
}

// vim: ts=4
