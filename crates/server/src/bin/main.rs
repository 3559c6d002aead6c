//! Binary entry point for the boxfs-mcp server.

use std::path::PathBuf;

use boxfs_mcp::FsServer;
use clap::Parser;
use rmcp::ServiceExt;

/// Boxfs MCP Filesystem Server — filesystem tools confined to a root directory.
#[derive(Parser)]
#[command(name = "boxfs-mcp", version, about)]
struct Cli {
    /// Root directory the server is confined to. Falls back to $BOXFS_ROOT,
    /// then the current working directory.
    root: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }
    let cli = Cli::parse();
    let root = cli
        .root
        .or_else(|| std::env::var_os("BOXFS_ROOT").map(PathBuf::from))
        .unwrap_or_else(|| std::env::current_dir().expect("cannot determine working directory"));
    let server = FsServer::new(&root).expect("root must be an existing directory");
    tracing::info!(root = %server.root().display(), "starting boxfs-mcp");
    let transport = rmcp::transport::stdio();
    server
        .serve(transport)
        .await
        .expect("failed to start server")
        .waiting()
        .await
        .expect("server error");
}
