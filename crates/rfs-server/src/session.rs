//! Per-connection request loop.
//!
//! A session reads one frame, answers it, and only then reads the next one.
//! It ends on DISCONNECT, when the peer hangs up, or on the first framing or
//! socket error.

use crate::operations::{process_request, Sandbox};
use futures::{SinkExt, StreamExt};
use rfs_proto::{CodecError, FrameCodec, Request, Response};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Framed;
use tracing::debug;

/// Why a session stopped.
#[derive(Debug)]
pub enum SessionEnd {
    /// The client sent DISCONNECT.
    Disconnected,
    /// The client closed the connection between requests.
    PeerClosed,
    /// Framing or socket failure.
    Failed(CodecError),
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEnd::Disconnected => f.write_str("client disconnected"),
            SessionEnd::PeerClosed => f.write_str("connection closed by peer"),
            SessionEnd::Failed(err) => write!(f, "session failed: {err}"),
        }
    }
}

pub struct Session<S> {
    framed: Framed<S, FrameCodec<Value>>,
    peer: String,
    sandbox: Arc<Sandbox>,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        peer: impl Into<String>,
        sandbox: Arc<Sandbox>,
        max_frame_len: usize,
    ) -> Self {
        Self {
            framed: Framed::new(stream, FrameCodec::with_max_length(max_frame_len)),
            peer: peer.into(),
            sandbox,
        }
    }

    pub async fn run(mut self) -> SessionEnd {
        debug!("Handling new client connection from {}", self.peer);

        loop {
            let frame = match self.framed.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(err)) => return SessionEnd::Failed(err),
                None => return SessionEnd::PeerClosed,
            };

            let response = match Request::from_value(&frame) {
                Ok(Request::Disconnect) => {
                    self.close().await;
                    return SessionEnd::Disconnected;
                }
                Ok(request) => process_request(&self.sandbox, request).await,
                Err(err) => {
                    debug!("Bad request from {}: {}", self.peer, err);
                    Response::bad_request()
                }
            };

            debug!("Responding to {} with {}", self.peer, response.code);
            if let Err(err) = self.framed.send(response).await {
                return SessionEnd::Failed(err);
            }
        }
    }

    async fn close(self) {
        let mut stream = self.framed.into_inner();
        if let Err(err) = stream.shutdown().await {
            debug!("Error closing connection to {}: {}", self.peer, err);
        }
    }
}
