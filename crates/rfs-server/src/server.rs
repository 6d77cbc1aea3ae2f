use crate::config::ServerConfig;
use crate::operations::Sandbox;
use crate::session::{Session, SessionEnd};
use anyhow::{Context, Result};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Pause after an accept error that will not clear by itself, such as
/// running out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub struct FileServer {
    listener: TcpListener,
    sandbox: Arc<Sandbox>,
    max_frame_len: usize,
}

impl FileServer {
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let sandbox = Sandbox::open(&config.root).with_context(|| {
            format!("failed to create sandbox root {}", config.root.display())
        })?;

        let listener = TcpListener::bind(config.bind)
            .await
            .with_context(|| format!("failed to bind {}", config.bind))?;

        info!(
            "File server listening on {}, serving {}",
            listener.local_addr()?,
            sandbox.root().display()
        );

        Ok(Self {
            listener,
            sandbox: Arc::new(sandbox),
            max_frame_len: config.max_frame_len,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Each connection runs in its own task; the accept loop never waits for
    /// a session. Sessions still open at shutdown are aborted, which closes
    /// their sockets.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut sessions = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((socket, peer)) => {
                        info!(
                            "Accepted connection from {} ({} open)",
                            peer,
                            sessions.len() + 1
                        );
                        let session = Session::new(
                            socket,
                            peer.to_string(),
                            Arc::clone(&self.sandbox),
                            self.max_frame_len,
                        );
                        sessions.spawn(async move {
                            match session.run().await {
                                SessionEnd::Failed(err) => {
                                    warn!("Session with {} ended: {}", peer, err)
                                }
                                end => info!("Session with {} ended: {}", peer, end),
                            }
                        });
                    }
                    Err(e) => {
                        warn!("Error accepting connection: {}", e);
                        if let Some(delay) = accept_backoff(&e) {
                            tokio::time::sleep(delay).await;
                        }
                    }
                },
                Some(finished) = sessions.join_next(), if !sessions.is_empty() => {
                    if let Err(e) = finished {
                        if e.is_panic() {
                            error!("Session task panicked: {}", e);
                        }
                    }
                    debug!("{} session(s) still open", sessions.len());
                }
            }
        }

        info!("Shutting down, closing {} open session(s)", sessions.len());
        sessions.shutdown().await;
        debug!("All sessions closed");

        Ok(())
    }
}

// Errors tied to one half-open connection are retried at once.
fn accept_backoff(err: &io::Error) -> Option<Duration> {
    match err.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::Interrupted
        | io::ErrorKind::WouldBlock => None,
        _ => Some(ACCEPT_BACKOFF),
    }
}
