use anyhow::Result;
use rfs_client::config::ClientConfig;
use rfs_client::repl;
use rfs_client::session::ClientSession;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    repl::run(ClientSession::new(ClientConfig::default())).await
}
