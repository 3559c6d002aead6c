//! Tool implementations for the boxfs MCP server.
//!
//! Each tool resolves its path arguments through the sandbox, applies
//! parameter defaults, runs the matching executor from [`boxfs_core::ops`]
//! and returns a uniform success/failure envelope. Optional fields default
//! per tool: `ls` lists the root, `mkdir` is recursive, `rm` is not.

use std::path::PathBuf;

use boxfs_core::ops::{self, Encoding};
use boxfs_core::sandbox::Sandbox;
use boxfs_core::FsError;
use rmcp::{
    handler::server::wrapper::Parameters,
    schemars::{self, JsonSchema},
    tool, tool_router,
};
use serde::Deserialize;

use crate::FsServer;

/// Parameters for listing a directory.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct LsParams {
    /// Directory to list, relative to the root. Defaults to the root itself.
    pub path: Option<String>,
}

/// Parameters for reading a file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadFileParams {
    /// Path to the file to read.
    pub path: String,
    /// Content encoding: "utf8" (default) or "base64".
    pub encoding: Option<String>,
}

/// Parameters for writing a file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct WriteFileParams {
    /// Path to the file to write.
    pub path: String,
    /// Content to write. Defaults to empty.
    pub data: Option<String>,
    /// Encoding of `data`: "utf8" (default) or "base64".
    pub encoding: Option<String>,
    /// If true, append to the file instead of replacing its content.
    pub append: Option<bool>,
}

/// Parameters for creating a directory.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MkdirParams {
    /// Path of the directory to create.
    pub path: String,
    /// Create missing parent directories as well. Defaults to true.
    pub recursive: Option<bool>,
}

/// Parameters for renaming a file or directory.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RenameParams {
    /// Source path.
    pub from: String,
    /// Destination path.
    pub to: String,
}

/// Parameters for removing a file or directory.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RmParams {
    /// Path to remove.
    pub path: String,
    /// If true, delete a directory together with its contents. Defaults to false.
    pub recursive: Option<bool>,
}

/// Parameters for getting file metadata.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct StatParams {
    /// Path to the file or directory.
    pub path: String,
}

/// Parameters for searching files.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Base directory to search in, relative to the root.
    pub path: String,
    /// Glob pattern to match (e.g. "**/*.rs").
    pub pattern: String,
    /// Glob patterns to exclude from results.
    pub exclude_patterns: Option<Vec<String>>,
}

#[tool_router]
impl FsServer {
    /// Create a new server confined to `root`, which must be an existing
    /// directory.
    pub fn new(root: impl AsRef<std::path::Path>) -> Result<Self, FsError> {
        Ok(Self {
            sandbox: Sandbox::new(root)?,
            tool_router: Self::tool_router(),
        })
    }

    fn resolve(&self, raw: &str) -> Result<PathBuf, String> {
        self.sandbox.resolve(raw).map_err(|e| e.to_string())
    }

    /// List the direct entries of a directory.
    #[tool(
        description = "List the entries of a directory with their type, size and modification time"
    )]
    async fn ls(&self, Parameters(params): Parameters<LsParams>) -> Result<String, String> {
        let path = self.resolve(params.path.as_deref().unwrap_or("."))?;
        let entries = ops::list(&path).await.map_err(|e| e.to_string())?;
        serde_json::to_string_pretty(&entries).map_err(|e| e.to_string())
    }

    /// Read a file's contents.
    #[tool(description = "Read a file and return its contents as utf8 text or base64")]
    async fn read_file(
        &self,
        Parameters(params): Parameters<ReadFileParams>,
    ) -> Result<String, String> {
        let encoding = Encoding::parse(params.encoding.as_deref()).map_err(|e| e.to_string())?;
        let path = self.resolve(&params.path)?;
        ops::read(&path, encoding).await.map_err(|e| e.to_string())
    }

    /// Create or extend a file.
    #[tool(
        description = "Write data to a file, replacing its content or appending to it. Data may be utf8 text or base64"
    )]
    async fn write_file(
        &self,
        Parameters(params): Parameters<WriteFileParams>,
    ) -> Result<String, String> {
        let encoding = Encoding::parse(params.encoding.as_deref()).map_err(|e| e.to_string())?;
        let path = self.resolve(&params.path)?;
        ops::write(
            &path,
            params.data.as_deref().unwrap_or(""),
            encoding,
            params.append.unwrap_or(false),
        )
        .await
        .map_err(|e| e.to_string())?;
        Ok("ok".into())
    }

    /// Create a directory.
    #[tool(
        description = "Create a directory, by default creating missing parent directories as well"
    )]
    async fn mkdir(&self, Parameters(params): Parameters<MkdirParams>) -> Result<String, String> {
        let path = self.resolve(&params.path)?;
        ops::mkdir(&path, params.recursive.unwrap_or(true))
            .await
            .map_err(|e| e.to_string())?;
        Ok("ok".into())
    }

    /// Move or rename a file or directory.
    #[tool(description = "Move or rename a file or directory")]
    async fn rename(
        &self,
        Parameters(params): Parameters<RenameParams>,
    ) -> Result<String, String> {
        let from = self.resolve(&params.from)?;
        let to = self.resolve(&params.to)?;
        ops::rename(&from, &to).await.map_err(|e| e.to_string())?;
        Ok("ok".into())
    }

    /// Delete a file or directory.
    #[tool(
        description = "Delete a file, or a directory. Directories with contents require recursive"
    )]
    async fn rm(&self, Parameters(params): Parameters<RmParams>) -> Result<String, String> {
        let path = self.resolve(&params.path)?;
        ops::remove(&path, params.recursive.unwrap_or(false))
            .await
            .map_err(|e| e.to_string())?;
        Ok("ok".into())
    }

    /// Get detailed metadata about a file or directory.
    #[tool(description = "Get detailed metadata about a file or directory")]
    async fn stat(&self, Parameters(params): Parameters<StatParams>) -> Result<String, String> {
        let path = self.resolve(&params.path)?;
        let info = ops::stat(&path).await.map_err(|e| e.to_string())?;
        serde_json::to_string_pretty(&info).map_err(|e| e.to_string())
    }

    /// Search for files matching a glob pattern.
    #[tool(description = "Search for files matching a glob pattern within a directory")]
    async fn search(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<String, String> {
        let base = self.resolve(&params.path)?;
        let excludes = params.exclude_patterns.unwrap_or_default();
        let hits = ops::search(self.sandbox.root(), &base, &params.pattern, &excludes)
            .map_err(|e| e.to_string())?;
        Ok(hits.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use crate::FsServer;
    use crate::tools::{
        LsParams, MkdirParams, ReadFileParams, RenameParams, RmParams, SearchParams, StatParams,
        WriteFileParams,
    };
    use rmcp::handler::server::wrapper::Parameters;

    fn server() -> (tempfile::TempDir, FsServer) {
        let dir = tempfile::tempdir().unwrap();
        let server = FsServer::new(dir.path()).unwrap();
        (dir, server)
    }

    fn write_params(path: &str, data: &str) -> Parameters<WriteFileParams> {
        Parameters(WriteFileParams {
            path: path.into(),
            data: Some(data.into()),
            encoding: None,
            append: None,
        })
    }

    fn read_params(path: &str, encoding: Option<&str>) -> Parameters<ReadFileParams> {
        Parameters(ReadFileParams {
            path: path.into(),
            encoding: encoding.map(Into::into),
        })
    }

    #[tokio::test]
    async fn full_file_lifecycle() {
        let (_dir, server) = server();

        server
            .mkdir(Parameters(MkdirParams {
                path: "a/b".into(),
                recursive: None,
            }))
            .await
            .expect("mkdir should succeed");

        server
            .write_file(write_params("a/b/f.txt", "hello"))
            .await
            .expect("write should succeed");

        let listing = server
            .ls(Parameters(LsParams {
                path: Some("a/b".into()),
            }))
            .await
            .expect("ls should succeed");
        assert!(listing.contains("\"name\": \"f.txt\""));
        assert!(listing.contains("\"type\": \"file\""));
        assert!(listing.contains("\"size\": 5"));

        let content = server
            .read_file(read_params("a/b/f.txt", Some("utf8")))
            .await
            .expect("read should succeed");
        assert_eq!(content, "hello");

        server
            .rename(Parameters(RenameParams {
                from: "a/b/f.txt".into(),
                to: "a/b/g.txt".into(),
            }))
            .await
            .expect("rename should succeed");

        let listing = server
            .ls(Parameters(LsParams {
                path: Some("a/b".into()),
            }))
            .await
            .unwrap();
        assert!(listing.contains("g.txt"));
        assert!(!listing.contains("f.txt"));

        server
            .rm(Parameters(RmParams {
                path: "a".into(),
                recursive: Some(true),
            }))
            .await
            .expect("recursive rm should succeed");

        let err = server
            .ls(Parameters(LsParams {
                path: Some("a".into()),
            }))
            .await
            .unwrap_err();
        assert!(err.contains("not found"));
    }

    #[tokio::test]
    async fn read_outside_root_is_rejected_even_if_missing() {
        let (_dir, server) = server();
        let err = server
            .read_file(read_params("../outside.txt", Some("utf8")))
            .await
            .unwrap_err();
        assert!(err.contains("path escape"));
    }

    #[tokio::test]
    async fn rename_destination_outside_root_is_rejected() {
        let (_dir, server) = server();
        server.write_file(write_params("inside.txt", "x")).await.unwrap();
        let err = server
            .rename(Parameters(RenameParams {
                from: "inside.txt".into(),
                to: "../smuggled.txt".into(),
            }))
            .await
            .unwrap_err();
        assert!(err.contains("path escape"));
    }

    #[tokio::test]
    async fn base64_content_roundtrips() {
        let (_dir, server) = server();
        server
            .write_file(Parameters(WriteFileParams {
                path: "x.bin".into(),
                data: Some("aGVsbG8=".into()),
                encoding: Some("base64".into()),
                append: Some(false),
            }))
            .await
            .unwrap();

        let b64 = server
            .read_file(read_params("x.bin", Some("base64")))
            .await
            .unwrap();
        assert_eq!(b64, "aGVsbG8=");
        let text = server
            .read_file(read_params("x.bin", Some("utf8")))
            .await
            .unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn utf8_alias_is_accepted_and_unknown_encoding_is_not() {
        let (_dir, server) = server();
        server.write_file(write_params("f.txt", "héllo")).await.unwrap();

        let content = server
            .read_file(read_params("f.txt", Some("utf-8")))
            .await
            .unwrap();
        assert_eq!(content, "héllo");

        let err = server
            .read_file(read_params("f.txt", Some("latin1")))
            .await
            .unwrap_err();
        assert!(err.contains("invalid argument"));
    }

    #[tokio::test]
    async fn mkdir_defaults_to_recursive_and_strict_mode_reports_existing() {
        let (_dir, server) = server();
        let params = || {
            Parameters(MkdirParams {
                path: "nested/dir".into(),
                recursive: None,
            })
        };
        server.mkdir(params()).await.unwrap();
        server.mkdir(params()).await.expect("recursive mkdir is idempotent");

        let err = server
            .mkdir(Parameters(MkdirParams {
                path: "nested/dir".into(),
                recursive: Some(false),
            }))
            .await
            .unwrap_err();
        assert!(err.contains("already exists"));
    }

    #[tokio::test]
    async fn rm_refuses_nonempty_directory_by_default() {
        let (_dir, server) = server();
        server
            .mkdir(Parameters(MkdirParams {
                path: "full".into(),
                recursive: None,
            }))
            .await
            .unwrap();
        server.write_file(write_params("full/f.txt", "x")).await.unwrap();

        let err = server
            .rm(Parameters(RmParams {
                path: "full".into(),
                recursive: None,
            }))
            .await
            .unwrap_err();
        assert!(err.contains("not empty"));

        let content = server
            .read_file(read_params("full/f.txt", None))
            .await
            .unwrap();
        assert_eq!(content, "x");
    }

    #[tokio::test]
    async fn ls_defaults_to_root() {
        let (_dir, server) = server();
        server.write_file(write_params("top.txt", "x")).await.unwrap();
        let listing = server.ls(Parameters(LsParams { path: None })).await.unwrap();
        assert!(listing.contains("top.txt"));
    }

    #[tokio::test]
    async fn stat_reports_metadata_and_search_finds_matches() {
        let (_dir, server) = server();
        server
            .mkdir(Parameters(MkdirParams {
                path: "src".into(),
                recursive: None,
            }))
            .await
            .unwrap();
        server.write_file(write_params("src/main.rs", "fn main() {}")).await.unwrap();
        server.write_file(write_params("notes.txt", "n")).await.unwrap();

        let info = server
            .stat(Parameters(StatParams {
                path: "src/main.rs".into(),
            }))
            .await
            .unwrap();
        assert!(info.contains("\"is_file\": true"));

        let hits = server
            .search(Parameters(SearchParams {
                path: ".".into(),
                pattern: "**/*.rs".into(),
                exclude_patterns: None,
            }))
            .await
            .unwrap();
        assert_eq!(hits, "src/main.rs");
    }
}
