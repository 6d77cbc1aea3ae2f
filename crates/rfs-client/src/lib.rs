//! RFS Client
//!
//! Interactive client for the remote file service: a command table, a
//! connection state machine that validates every command before it touches
//! the network, and the prompt loop that ties them to stdin.

pub mod commands;
pub mod config;
pub mod error;
pub mod repl;
pub mod session;

pub use commands::{parse_line, Command, Parsed};
pub use config::ClientConfig;
pub use error::ClientError;
pub use session::ClientSession;
