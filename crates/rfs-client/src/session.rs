//! Client connection state machine.
//!
//! A session is either disconnected or holds one open connection. Every
//! command is validated locally first; only well-formed requests reach the
//! server, and each one waits for exactly one response.

use crate::commands::Command;
use crate::config::ClientConfig;
use crate::error::ClientError;
use futures::{SinkExt, StreamExt};
use rfs_proto::{classify, FrameCodec, PathKind, Request, Response};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

struct Connection {
    framed: Framed<TcpStream, FrameCodec<Response>>,
    peer: SocketAddr,
}

impl Connection {
    async fn exchange(
        &mut self,
        request: &Request,
        limit: std::time::Duration,
    ) -> Result<Response, ClientError> {
        timeout(limit, self.framed.send(request))
            .await
            .map_err(|_| ClientError::Timeout)??;

        match timeout(limit, self.framed.next()).await {
            Err(_) => Err(ClientError::Timeout),
            Ok(None) => Err(ClientError::Closed),
            Ok(Some(Err(err))) => Err(ClientError::Transport(err)),
            Ok(Some(Ok(response))) => Ok(response),
        }
    }

    async fn close(self, limit: std::time::Duration) {
        let mut framed = self.framed;
        match timeout(limit, framed.send(&Request::disconnect())).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => debug!("Failed to send DISCONNECT to {}: {}", self.peer, err),
            Err(_) => debug!("Timed out sending DISCONNECT to {}", self.peer),
        }
        if let Err(err) = framed.into_inner().shutdown().await {
            debug!("Error closing connection to {}: {}", self.peer, err);
        }
    }
}

enum ConnectionState {
    Disconnected,
    Connected(Connection),
}

pub struct ClientSession {
    config: ClientConfig,
    state: ConnectionState,
}

impl ClientSession {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        match &self.state {
            ConnectionState::Connected(conn) => Some(conn.peer),
            ConnectionState::Disconnected => None,
        }
    }

    /// Run one command and return the text to show for it.
    pub async fn execute(&mut self, command: Command) -> Result<String, ClientError> {
        match command {
            Command::Connect { host, port } => {
                self.connect(&host, &port).await?;
                Ok("Successfully Connected".to_string())
            }
            Command::Get { target } => Ok(self.get(&target).await?.content),
            Command::Put { source, target } => Ok(self.put(&source, &target).await?.to_string()),
            Command::Delete { target } => Ok(self.delete(&target).await?.to_string()),
            Command::Disconnect | Command::Exit => {
                self.disconnect().await;
                Ok("Successfully Disconnected".to_string())
            }
            Command::List => Ok(self.list_local().await?.join("\n")),
        }
    }

    /// Validate `host` and `port`, then open a connection.
    ///
    /// An existing connection is closed first.
    pub async fn connect(&mut self, host: &str, port: &str) -> Result<SocketAddr, ClientError> {
        let host = validate_host(host)?;
        let port = validate_port(port)?;

        self.disconnect().await;

        let addr = format!("{host}:{port}");
        let connect = TcpStream::connect((host.as_str(), port));
        let stream = match timeout(self.config.timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(ClientError::Unreachable { addr, source }),
            Err(_) => {
                return Err(ClientError::Unreachable {
                    addr,
                    source: io::Error::new(io::ErrorKind::TimedOut, "connect timed out"),
                })
            }
        };

        let peer = stream.peer_addr()?;
        info!("Connected to {}", peer);
        self.state = ConnectionState::Connected(Connection {
            framed: Framed::new(stream, FrameCodec::with_max_length(self.config.max_frame_len)),
            peer,
        });
        Ok(peer)
    }

    pub async fn get(&mut self, target: &str) -> Result<Response, ClientError> {
        self.require_connection()?;
        require_kind(target, |kind| kind == PathKind::File)?;
        self.exchange(Request::get(target)).await
    }

    /// Upload `source`, resolved under the local root, to `target`.
    pub async fn put(&mut self, source: &str, target: &str) -> Result<Response, ClientError> {
        self.require_connection()?;
        require_kind(source, |kind| kind == PathKind::File)?;
        require_kind(target, |kind| kind == PathKind::File)?;

        let path = self.local_path(source);
        if !tokio::fs::metadata(&path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
        {
            return Err(ClientError::SourceNotFound(path));
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ClientError::SourceUnreadable { path, source })?;

        self.exchange(Request::put(target, content)).await
    }

    pub async fn delete(&mut self, target: &str) -> Result<Response, ClientError> {
        self.require_connection()?;
        require_kind(target, PathKind::is_valid)?;
        self.exchange(Request::delete(target)).await
    }

    /// Send DISCONNECT and close the socket. Returns whether a connection was
    /// open.
    pub async fn disconnect(&mut self) -> bool {
        match std::mem::replace(&mut self.state, ConnectionState::Disconnected) {
            ConnectionState::Connected(conn) => {
                info!("Disconnecting from {}", conn.peer);
                conn.close(self.config.timeout).await;
                true
            }
            ConnectionState::Disconnected => false,
        }
    }

    /// Names of the regular files in the local root, sorted.
    pub async fn list_local(&self) -> Result<Vec<String>, ClientError> {
        let mut entries = tokio::fs::read_dir(&self.config.local_root).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn local_path(&self, source: &str) -> PathBuf {
        rfs_proto::segments(source).fold(self.config.local_root.clone(), |path, segment| {
            path.join(segment)
        })
    }

    fn require_connection(&self) -> Result<(), ClientError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(ClientError::NotConnected)
        }
    }

    async fn exchange(&mut self, request: Request) -> Result<Response, ClientError> {
        let ConnectionState::Connected(conn) = &mut self.state else {
            return Err(ClientError::NotConnected);
        };

        debug!("Sending {} request to {}", request.operation(), conn.peer);
        let result = conn.exchange(&request, self.config.timeout).await;

        match &result {
            Ok(response) => debug!("Received {} from {}", response.code, conn.peer),
            Err(err) => {
                warn!("Dropping connection to {}: {}", conn.peer, err);
                // Dropping the connection closes the socket.
                self.state = ConnectionState::Disconnected;
            }
        }
        result
    }
}

fn validate_host(host: &str) -> Result<String, ClientError> {
    if host == "localhost" {
        return Ok(host.to_string());
    }
    host.parse::<IpAddr>()
        .map(|ip| ip.to_string())
        .map_err(|_| ClientError::invalid_input("Invalid Host"))
}

fn validate_port(port: &str) -> Result<u16, ClientError> {
    match port.parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ClientError::invalid_input("Invalid Port Number")),
    }
}

fn require_kind(target: &str, accept: impl Fn(PathKind) -> bool) -> Result<(), ClientError> {
    if accept(classify(target)) {
        Ok(())
    } else {
        Err(ClientError::invalid_input(format!("Invalid target: {target}")))
    }
}
