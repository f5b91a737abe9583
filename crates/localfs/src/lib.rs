//! Root-confined local filesystem tools for LLM agents.
//!
//! `localfs` indexes one or more directory trees into memory, answers
//! metadata queries against that index, detects byte-identical files, and
//! performs guarded file mutations. Every operation is exposed as a
//! [`Tool`](tools::Tool) with a JSON Schema definition so an agent can call
//! it by name with JSON arguments.
//!
//! # Getting started
//!
//! ```ignore
//! use localfs::{FsSession, ToolSet, FsToolsExt};
//!
//! #[tokio::main]
//! async fn main() -> localfs::Result<()> {
//!     let session = FsSession::new(["/home/me/Documents"])?;
//!     let tools = ToolSet::new()
//!         .with_arg_validation(true)
//!         .with_fs_tools(&session);
//!
//!     println!("{}", tools.execute("build_file_index", "{}").await);
//!     println!("{}", tools.execute("find_by_extension", r#"{"ext": "pdf"}"#).await);
//!     Ok(())
//! }
//! ```
//!
//! # Where to find things
//!
//! - **Path confinement:** [`RootGuard`](guard::RootGuard). Every path any
//!   tool touches is canonicalized and checked against the configured roots.
//!
//! - **The index:** [`index::build_index`] walks roots into
//!   [`FileRecord`](index::FileRecord)s; [`IndexStore`](index::IndexStore)
//!   publishes each scan as an immutable [`Snapshot`](index::Snapshot) with a
//!   single atomic swap, so readers never see a half-built index.
//!
//! - **Queries:** methods on [`Snapshot`](index::Snapshot) in [`query`].
//!
//! - **Duplicates:** [`dupes::find_duplicates`] buckets by size, then hashes
//!   candidates with BLAKE3 on the rayon pool.
//!
//! - **Mutations:** [`ops`]. None of them touch the index; call
//!   `refresh_index` afterwards.
//!
//! - **Agent surface:** [`tools`] and [`config`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`guard`] | Root confinement and path resolution |
//! | [`index`] | File records, snapshots, the walker, and the swap store |
//! | [`query`] | Name, extension, type, time, size, and folder queries |
//! | [`dupes`] | Content-identical file detection |
//! | [`ops`] | Read, write, append, delete, create, move, copy, rename |
//! | [`session`] | A guard and its index, shared by every tool |
//! | [`tools`] | [`Tool`](tools::Tool), [`ToolSet`](tools::ToolSet), and the 24 filesystem tools |
//! | [`config`] | Session and tool-set configuration |
//! | [`error`] | [`FsError`] and the `Error [kind]: message` rendering |

pub mod config;
pub mod dupes;
pub mod error;
pub mod guard;
pub mod index;
pub mod ops;
pub mod query;
pub mod session;
pub mod tools;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use config::FsConfig;
pub use error::{EntryKind, FsError, Result};
pub use guard::RootGuard;
pub use session::FsSession;
pub use tools::{FsToolsConfig, FsToolsExt, Tool, ToolSet};

// Re-export schemars for downstream crates implementing their own tools.
pub use schemars;

// ── Schema generation ──────────────────────────────────────────────

/// Generate a JSON Schema `serde_json::Value` from a type that implements
/// `schemars::JsonSchema`.
///
/// # Example
///
/// ```
/// use localfs::json_schema_for;
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct ReadArgs {
///     path: String,
///     #[serde(default)]
///     max_bytes: Option<usize>,
/// }
///
/// let schema = json_schema_for::<ReadArgs>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"path".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

// ── Tool types ─────────────────────────────────────────────────────

/// The type of a tool definition. Currently always `Function`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ToolType {
    #[serde(rename = "function")]
    Function,
}

/// Tool definition in the OpenAI function-calling format.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ToolDef {
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    pub function: FunctionDef,
}

impl ToolDef {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: ToolType::Function,
            function: FunctionDef {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}
