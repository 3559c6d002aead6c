//! MCP server exposing sandboxed filesystem tools.
//!
//! All operations are confined to a single root directory fixed at server
//! startup. Every caller-supplied path is resolved and checked against the
//! root before any I/O happens.

use std::path::Path;

use boxfs_core::sandbox::Sandbox;
use rmcp::{
    ServerHandler,
    handler::server::router::tool::ToolRouter,
    model::{Implementation, ServerCapabilities, ServerInfo},
    tool_handler,
};

pub mod tools;

/// MCP filesystem server confined to a single root directory.
#[derive(Debug, Clone)]
pub struct FsServer {
    pub(crate) sandbox: Sandbox,
    pub(crate) tool_router: ToolRouter<Self>,
}

impl FsServer {
    /// The root directory this server is confined to.
    pub fn root(&self) -> &Path {
        self.sandbox.root()
    }
}

#[tool_handler]
impl ServerHandler for FsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "boxfs-mcp".into(),
                title: Some("Boxfs MCP Filesystem Server".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Filesystem server providing file and directory operations confined to a single root directory.".into(),
            ),
        }
    }
}
