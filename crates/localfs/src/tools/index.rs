//! Tools that build, refresh, and inspect the index, plus duplicate
//! detection (the one query that reads file contents).
//!
//! The scanning tools run on a blocking worker. Each holds a
//! [`DropGuard`](tokio_util::sync::DropGuard) for its cancellation token, so
//! when the [`ToolSet`](super::ToolSet) timeout drops the future the scan
//! stops at its next entry instead of running on unobserved.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::core::{Tool, ToolFuture, parse_tool_args, render};
use super::names;
use super::spec::ToolSpec;
use crate::ToolDef;
use crate::dupes::find_duplicates_async;
use crate::query::IndexSummary;
use crate::session::FsSession;

/// Typed arguments for `build_file_index`.
#[derive(Deserialize, JsonSchema)]
pub struct BuildFileIndexArgs {
    /// Directories to scan, each inside the configured roots (e.g.
    /// ['/home/me/Documents']). Omit to scan every configured root.
    #[serde(default)]
    pub roots: Option<Vec<String>>,
}

/// Typed arguments for `refresh_index`.
#[derive(Deserialize, JsonSchema)]
pub struct RefreshIndexArgs {
    /// Directories to rescan. Omit to rescan whatever the current index
    /// covers.
    #[serde(default)]
    pub roots: Option<Vec<String>>,
}

/// Arguments for tools that take none.
#[derive(Deserialize, JsonSchema)]
pub struct NoArgs {}

// ── BuildFileIndex ──────────────────────────────────────────────────

pub struct BuildFileIndex {
    session: FsSession,
}

impl BuildFileIndex {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for BuildFileIndex {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(
            names::BUILD_FILE_INDEX,
            "Scan directories recursively and replace the in-memory file index",
        )
        .when_to_use(
            "At the start of a session, before any search or listing tool, or to \
             switch the index to a different set of folders",
        )
        .when_not_to_use(
            "When the index already covers the right folders and you only need it \
             up to date after changes. Use refresh_index for that",
        )
        .parameters_for::<BuildFileIndexArgs>()
        .example(
            "build_file_index()",
            "Indexes every configured root and reports the file count",
        )
        .example(
            "build_file_index(roots=['/data/photos'])",
            "Indexes only the photos folder",
        )
        .output_format("JSON {generation, count, skipped, roots, elapsed_ms}")
        .to_tool_def()
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let args: BuildFileIndexArgs = match parse_tool_args(&arguments) {
                Ok(a) => a,
                Err(e) => return e,
            };
            let cancel = CancellationToken::new();
            let _guard = cancel.clone().drop_guard();
            let roots = args.roots.unwrap_or_default();
            render(self.session.refresh(&roots, cancel).await)
        })
    }
}

// ── RefreshIndex ────────────────────────────────────────────────────

pub struct RefreshIndex {
    session: FsSession,
}

impl RefreshIndex {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for RefreshIndex {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(
            names::REFRESH_INDEX,
            "Rescan the indexed folders so queries see recent changes",
        )
        .when_to_use(
            "After writing, moving, copying, renaming, or deleting files, before \
             searching again. Index queries do not see changes until a refresh",
        )
        .when_not_to_use("Before any index exists with a specific scope. Use build_file_index")
        .parameters_for::<RefreshIndexArgs>()
        .example("refresh_index()", "Rescans the folders of the current index")
        .output_format("JSON {generation, count, skipped, roots, elapsed_ms}")
        .disambiguate(
            "Need to index a different folder than before",
            names::BUILD_FILE_INDEX,
            "build_file_index chooses the scope; refresh_index keeps it",
        )
        .to_tool_def()
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let args: RefreshIndexArgs = match parse_tool_args(&arguments) {
                Ok(a) => a,
                Err(e) => return e,
            };
            let cancel = CancellationToken::new();
            let _guard = cancel.clone().drop_guard();
            let result = match args.roots {
                Some(roots) if !roots.is_empty() => self.session.refresh(&roots, cancel).await,
                _ => self.session.rescan(cancel).await,
            };
            render(result)
        })
    }
}

// ── IndexStatus ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct IndexStatusReport {
    #[serde(flatten)]
    summary: IndexSummary,
    configured_roots: Vec<std::path::PathBuf>,
}

pub struct IndexStatus {
    session: FsSession,
}

impl IndexStatus {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for IndexStatus {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(
            names::INDEX_STATUS,
            "Report the state of the file index without changing it",
        )
        .when_to_use(
            "To check whether an index exists, what it covers, and when it was built",
        )
        .when_not_to_use("To list files. Use a search or listing tool")
        .parameters_for::<NoArgs>()
        .output_format(
            "JSON {generation, files, total_bytes, skipped, roots, built_at, configured_roots}. \
             generation 0 means nothing has been indexed yet",
        )
        .to_tool_def()
    }

    fn execute(&self, _arguments: &str) -> ToolFuture<'_> {
        Box::pin(async move {
            let report = IndexStatusReport {
                summary: self.session.snapshot().summary(),
                configured_roots: self.session.roots().to_vec(),
            };
            render(Ok(report))
        })
    }
}

// ── FindDuplicates ──────────────────────────────────────────────────

pub struct FindDuplicates {
    session: FsSession,
}

impl FindDuplicates {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for FindDuplicates {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(
            names::FIND_DUPLICATES,
            "Find indexed files with byte-identical content",
        )
        .when_to_use("To find wasted space or redundant copies before cleaning up")
        .when_not_to_use(
            "To find files that merely share a name. Use search_file_by_name",
        )
        .parameters_for::<NoArgs>()
        .example(
            "find_duplicates()",
            "Three identical files give two pairs, both naming the first copy as canonical",
        )
        .output_format(
            "JSON {pairs: [{canonical, duplicate, hash, size}], files_hashed, bytes_hashed, \
             skipped, wasted_bytes}",
        )
        .to_tool_def()
    }

    fn execute(&self, _arguments: &str) -> ToolFuture<'_> {
        Box::pin(async move {
            let cancel = CancellationToken::new();
            let _guard = cancel.clone().drop_guard();
            render(find_duplicates_async(self.session.snapshot(), cancel).await)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn session() -> (tempfile::TempDir, FsSession) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/a.txt"), "same").unwrap();
        fs::write(dir.path().join("b.txt"), "same").unwrap();
        let session = FsSession::new([dir.path()]).unwrap();
        (dir, session)
    }

    #[tokio::test]
    async fn build_then_status() {
        let (_dir, session) = session();
        let status = IndexStatus::new(session.clone()).execute("{}").await;
        let value: serde_json::Value = serde_json::from_str(&status).unwrap();
        assert_eq!(value["generation"], 0);

        let built = BuildFileIndex::new(session.clone()).execute("{}").await;
        let value: serde_json::Value = serde_json::from_str(&built).unwrap();
        assert_eq!(value["count"], 2);

        let status = IndexStatus::new(session).execute("").await;
        let value: serde_json::Value = serde_json::from_str(&status).unwrap();
        assert_eq!(value["generation"], 1);
        assert_eq!(value["files"], 2);
    }

    #[tokio::test]
    async fn build_rejects_root_outside_session() {
        let (_dir, session) = session();
        let other = tempfile::tempdir().unwrap();
        let args = serde_json::json!({"roots": [other.path()]}).to_string();
        let result = BuildFileIndex::new(session).execute(&args).await;
        assert!(result.starts_with("Error [access_denied]"), "{result}");
    }

    #[tokio::test]
    async fn refresh_without_roots_keeps_scope() {
        let (dir, session) = session();
        let docs = dir.path().join("docs");
        let args = serde_json::json!({"roots": [docs]}).to_string();
        BuildFileIndex::new(session.clone()).execute(&args).await;

        fs::write(docs.join("c.txt"), "c").unwrap();
        let refreshed = RefreshIndex::new(session).execute("{}").await;
        let value: serde_json::Value = serde_json::from_str(&refreshed).unwrap();
        assert_eq!(value["generation"], 2);
        assert_eq!(value["count"], 2);
    }

    #[tokio::test]
    async fn duplicates_tool_reports_pairs() {
        let (_dir, session) = session();
        BuildFileIndex::new(session.clone()).execute("{}").await;
        let result = FindDuplicates::new(session).execute("{}").await;
        let value: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(value["pairs"].as_array().unwrap().len(), 1);
        assert_eq!(value["wasted_bytes"], 4);
    }
}
