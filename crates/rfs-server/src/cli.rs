use crate::config::{ServerConfig, DEFAULT_ROOT};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rfs-server")]
#[command(about = "Serve a sandboxed directory over the remote file protocol")]
#[command(author, version, long_about = None)]
pub struct Args {
    /// Port to listen on (loopback interface only)
    #[arg(short = 'p', long, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// Sandbox root directory, created if absent
    #[arg(long, default_value = DEFAULT_ROOT)]
    pub root: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn config(&self) -> ServerConfig {
        ServerConfig::new(self.port).with_root(self.root.clone())
    }

    pub fn level(&self) -> tracing::Level {
        match self.log_level.as_str() {
            "error" => tracing::Level::ERROR,
            "warn" => tracing::Level::WARN,
            "info" => tracing::Level::INFO,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        }
    }
}
