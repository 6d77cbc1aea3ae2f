//! RFS protocol: wire types, framing and target validation
//!
//! This crate defines the request/response messages exchanged between the
//! remote file server and its clients, the newline-delimited JSON framing used
//! on the socket, and the path grammar both sides use to decide which targets
//! are legal.

pub mod codec;
pub mod messages;
pub mod validation;

// Re-export key types
pub use codec::{decode, encode, CodecError, Decoded, FrameCodec, DEFAULT_MAX_FRAME_LEN};
pub use messages::{Operation, ProtocolError, Request, Response, StatusCode};
pub use validation::{classify, segments, PathKind};
