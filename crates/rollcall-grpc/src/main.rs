//! Rollcall gRPC Server
//!
//! Serves an in-memory person directory over gRPC. The directory lives as
//! long as the process; stopping the server with Ctrl+C or SIGTERM lets
//! in-flight calls finish and then drops every record.

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use rollcall_grpc::{DirectoryGrpcServer, DirectoryService};

/// Rollcall gRPC Server - in-memory person directory
#[derive(Parser, Debug)]
#[command(name = "rollcall-server")]
#[command(about = "gRPC server for the Rollcall person directory")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "[::1]:50001")]
    addr: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();
    let service = DirectoryService::new();

    tracing::info!("Directory listening on {}", args.addr);

    tonic::transport::Server::builder()
        .add_service(DirectoryGrpcServer::new(service.clone()))
        .serve_with_shutdown(args.addr, stop_requested())
        .await
        .with_context(|| format!("directory server on {} failed", args.addr))?;

    tracing::info!(
        records = service.directory().len(),
        "Directory stopped, records discarded"
    );
    Ok(())
}

/// Resolves on the first Ctrl+C or SIGTERM.
async fn stop_requested() {
    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};

        let Ok(mut term) = signal(SignalKind::terminate()) else {
            tracing::warn!("SIGTERM handler unavailable, stopping on Ctrl+C only");
            return std::future::pending::<()>().await;
        };
        term.recv().await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => tracing::info!("Ctrl+C received, draining directory calls"),
            Err(e) => tracing::warn!("Ctrl+C handler failed ({}), stopping", e),
        },
        _ = sigterm => tracing::info!("SIGTERM received, draining directory calls"),
    }
}
