use rfs_proto::DEFAULT_MAX_FRAME_LEN;
use std::path::PathBuf;
use std::time::Duration;

/// Default bound on connecting and on waiting for each response.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Applies to the connect attempt and to every request/response exchange.
    pub timeout: Duration,
    /// Directory PUT sources are read from and `list` shows.
    pub local_root: PathBuf,
    pub max_frame_len: usize,
}

impl ClientConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_local_root(mut self, local_root: impl Into<PathBuf>) -> Self {
        self.local_root = local_root.into();
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            local_root: PathBuf::from("."),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}
