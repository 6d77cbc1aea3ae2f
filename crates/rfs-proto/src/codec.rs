//! Newline-delimited JSON framing
//!
//! A frame is the compact JSON text of one message followed by a single
//! `\n`. JSON escapes newlines inside strings, so the delimiter can only
//! appear at the end of a frame.
//!
//! Socket reads do not line up with frames: one read may carry half a frame
//! or several of them. [`decode`] works on an accumulated buffer and hands
//! back whatever follows the first frame, and [`FrameCodec`] plugs the same
//! rules into `tokio_util::codec::Framed`.

use bytes::{BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

pub const DELIMITER: u8 = b'\n';

/// Largest frame accepted before the delimiter shows up.
pub const DEFAULT_MAX_FRAME_LEN: usize = 8 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("failed to serialize message: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("frame exceeds {max} bytes")]
    FrameTooLong { max: usize },

    #[error("connection closed in the middle of a frame")]
    Truncated,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of looking for one frame at the start of a buffer.
#[derive(Debug)]
pub enum Decoded<'a, T> {
    /// A complete frame and the bytes that follow it.
    Frame { message: T, remainder: &'a [u8] },
    /// No delimiter yet; more input is needed.
    Incomplete,
    /// The bytes up to the delimiter are not a valid message.
    Malformed(CodecError),
}

/// Serialize `message` into a complete frame.
pub fn encode<T: Serialize + ?Sized>(message: &T) -> Result<Vec<u8>, CodecError> {
    let mut frame = serde_json::to_vec(message).map_err(CodecError::Serialize)?;
    frame.push(DELIMITER);
    Ok(frame)
}

/// Decode the first frame in `buffer`.
pub fn decode<T: DeserializeOwned>(buffer: &[u8]) -> Decoded<'_, T> {
    let Some(end) = buffer.iter().position(|&b| b == DELIMITER) else {
        return Decoded::Incomplete;
    };

    match parse_line(&buffer[..end]) {
        Ok(message) => Decoded::Frame {
            message,
            remainder: &buffer[end + 1..],
        },
        Err(err) => Decoded::Malformed(err),
    }
}

fn parse_line<T: DeserializeOwned>(line: &[u8]) -> Result<T, CodecError> {
    // Tolerate CRLF from line-oriented tools such as telnet.
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    serde_json::from_slice(line).map_err(CodecError::Malformed)
}

/// `Decoder`/`Encoder` pair for newline-delimited JSON frames.
///
/// `T` is the type produced by decoding. Any `Serialize` value can be
/// encoded.
#[derive(Debug)]
pub struct FrameCodec<T> {
    max_length: usize,
    // Bytes before this index are already known not to contain a delimiter.
    next_index: usize,
    _item: PhantomData<fn() -> T>,
}

impl<T> FrameCodec<T> {
    pub fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_FRAME_LEN)
    }

    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            _item: PhantomData,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl<T> Default for FrameCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for FrameCodec<T> {
    fn clone(&self) -> Self {
        Self::with_max_length(self.max_length)
    }
}

impl<T: DeserializeOwned> Decoder for FrameCodec<T> {
    type Item = T;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<T>, CodecError> {
        let start = self.next_index.min(src.len());
        let Some(offset) = src[start..].iter().position(|&b| b == DELIMITER) else {
            if src.len() > self.max_length {
                return Err(CodecError::FrameTooLong {
                    max: self.max_length,
                });
            }
            self.next_index = src.len();
            return Ok(None);
        };

        let end = start + offset;
        self.next_index = 0;
        if end > self.max_length {
            return Err(CodecError::FrameTooLong {
                max: self.max_length,
            });
        }

        let frame = src.split_to(end + 1);
        parse_line(&frame[..end]).map(Some)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<T>, CodecError> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if src.is_empty() => Ok(None),
            None => Err(CodecError::Truncated),
        }
    }
}

impl<T, M: Serialize> Encoder<M> for FrameCodec<T> {
    type Error = CodecError;

    fn encode(&mut self, item: M, dst: &mut BytesMut) -> Result<(), CodecError> {
        serde_json::to_writer(dst.writer(), &item).map_err(CodecError::Serialize)?;
        dst.put_u8(DELIMITER);
        Ok(())
    }
}
