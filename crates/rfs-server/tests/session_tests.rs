//! Session loop driven by scripted reads and writes.

use rfs_proto::{CodecError, DEFAULT_MAX_FRAME_LEN};
use rfs_server::operations::Sandbox;
use rfs_server::session::{Session, SessionEnd};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_test::io::Builder;

const BAD_REQUEST: &[u8] = b"{\"message\":\"response\",\"code\":\"401\",\"content\":\"Bad Request\"}\n";
const NOT_FOUND: &[u8] = b"{\"message\":\"response\",\"code\":\"400\",\"content\":\"Not Found\"}\n";

fn sandbox() -> (TempDir, Arc<Sandbox>) {
    let dir = TempDir::new().unwrap();
    let sandbox = Sandbox::open(dir.path().join("www")).unwrap();
    (dir, Arc::new(sandbox))
}

#[tokio::test]
async fn test_frames_spanning_reads() {
    let (_dir, sandbox) = sandbox();
    let stream = Builder::new()
        .read(b"{\"message\":\"request\",")
        .read(b"\"type\":\"GET\"}\n{\"message\":\"request\",\"type\":\"DISCONNECT\"}\n")
        .write(BAD_REQUEST)
        .build();

    let end = Session::new(stream, "mock", sandbox, DEFAULT_MAX_FRAME_LEN)
        .run()
        .await;
    assert!(matches!(end, SessionEnd::Disconnected));
}

#[tokio::test]
async fn test_peer_closes_between_requests() {
    let (_dir, sandbox) = sandbox();
    let stream = Builder::new()
        .read(b"{\"message\":\"request\",\"type\":\"GET\",\"target\":\"/missing.txt\"}\n")
        .write(NOT_FOUND)
        .build();

    let end = Session::new(stream, "mock", sandbox, DEFAULT_MAX_FRAME_LEN)
        .run()
        .await;
    assert!(matches!(end, SessionEnd::PeerClosed));
}

#[tokio::test]
async fn test_one_request_at_a_time() {
    let (_dir, sandbox) = sandbox();
    let stream = Builder::new()
        .read(b"{\"message\":\"request\",\"type\":\"PUT\",\"target\":\"/n.txt\",\"content\":\"1\"}\n")
        .write(b"{\"message\":\"response\",\"code\":\"201\",\"content\":\"Ok\"}\n")
        .read(b"{\"message\":\"request\",\"type\":\"GET\",\"target\":\"/n.txt\"}\n")
        .write(b"{\"message\":\"response\",\"code\":\"200\",\"content\":\"1\"}\n")
        .build();

    let end = Session::new(stream, "mock", Arc::clone(&sandbox), DEFAULT_MAX_FRAME_LEN)
        .run()
        .await;
    assert!(matches!(end, SessionEnd::PeerClosed));
    assert!(sandbox.root().join("n.txt").is_file());
}

#[tokio::test]
async fn test_malformed_frame_ends_session() {
    let (_dir, sandbox) = sandbox();
    let stream = Builder::new().read(b"garbage\n").build();

    let end = Session::new(stream, "mock", sandbox, DEFAULT_MAX_FRAME_LEN)
        .run()
        .await;
    assert!(matches!(end, SessionEnd::Failed(CodecError::Malformed(_))));
}

#[tokio::test]
async fn test_truncated_frame_ends_session() {
    let (_dir, sandbox) = sandbox();
    let stream = Builder::new().read(b"{\"message\":\"req").build();

    let end = Session::new(stream, "mock", sandbox, DEFAULT_MAX_FRAME_LEN)
        .run()
        .await;
    assert!(matches!(end, SessionEnd::Failed(CodecError::Truncated)));
}

#[tokio::test]
async fn test_oversized_frame_ends_session() {
    let (_dir, sandbox) = sandbox();
    let stream = Builder::new()
        .read(b"{\"message\":\"request\",\"type\":\"PUT\",\"content\":\"")
        .build();

    let end = Session::new(stream, "mock", sandbox, 16).run().await;
    assert!(matches!(
        end,
        SessionEnd::Failed(CodecError::FrameTooLong { max: 16 })
    ));
}
