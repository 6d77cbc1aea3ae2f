use anyhow::Result;
use clap::Parser;
use rfs_server::cli::Args;
use rfs_server::server::FileServer;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt().with_max_level(args.level()).init();

    info!("Starting remote file server");

    let server = FileServer::bind(&args.config()).await?;

    // Set up signal handlers for graceful shutdown
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let shutdown = async move {
        tokio::select! {
            _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    };

    if let Err(e) = server.run(shutdown).await {
        error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}
