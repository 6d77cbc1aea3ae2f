use rfs_proto::DEFAULT_MAX_FRAME_LEN;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Sandbox directory used when none is configured.
pub const DEFAULT_ROOT: &str = "www";

/// Runtime configuration for [`crate::server::FileServer`].
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub bind: SocketAddr,
    /// Sandbox root. Created on startup if it does not exist.
    pub root: PathBuf,
    /// Largest request frame accepted from a client.
    pub max_frame_len: usize,
}

impl ServerConfig {
    /// Loopback listener on `port` serving the default root.
    pub fn new(port: u16) -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, port)),
            root: PathBuf::from(DEFAULT_ROOT),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }
}
