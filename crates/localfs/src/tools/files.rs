//! File content and mutation tools.
//!
//! Thin wrappers over [`crate::ops`]: parse the typed arguments, run the
//! guarded operation, render the outcome. Everything except `read_file` is a
//! mutation and is replaced by a [`DisabledTool`](super::DisabledTool) in
//! read-only sessions.

use schemars::JsonSchema;
use serde::Deserialize;

use super::core::{Tool, ToolFuture, parse_tool_args, render};
use super::names;
use super::spec::ToolSpec;
use crate::ToolDef;
use crate::ops::{self, DEFAULT_READ_MAX_BYTES};
use crate::session::FsSession;

const STALE_INDEX_HINT: &str =
    "The index is not updated automatically; call refresh_index before searching again";

// ── Typed argument structs ──────────────────────────────────────────

/// Typed arguments for `read_file`.
#[derive(Deserialize, JsonSchema)]
pub struct ReadFileArgs {
    /// File path, absolute or relative to the first root (e.g. 'notes/todo.txt').
    pub path: String,
    /// Maximum bytes to read from the start of the file (default 5000).
    #[serde(default)]
    pub max_bytes: Option<usize>,
}

/// Typed arguments for `write_file`.
#[derive(Deserialize, JsonSchema)]
pub struct WriteFileArgs {
    /// File path, absolute or relative to the first root.
    pub path: String,
    /// Text to write.
    pub content: String,
    /// Replace an existing file (default false).
    #[serde(default)]
    pub overwrite: bool,
    /// Append to an existing file (default false). Takes precedence over overwrite.
    #[serde(default)]
    pub append: bool,
}

/// Typed arguments for `append_to_file`.
#[derive(Deserialize, JsonSchema)]
pub struct AppendToFileArgs {
    /// File path, absolute or relative to the first root. Created if missing.
    pub path: String,
    /// Text to append.
    pub content: String,
}

/// Typed arguments for tools that take a single path.
#[derive(Deserialize, JsonSchema)]
pub struct PathArgs {
    /// Path, absolute or relative to the first root.
    pub path: String,
}

/// Typed arguments for `move_file` and `copy_file`.
#[derive(Deserialize, JsonSchema)]
pub struct TransferArgs {
    /// Source file.
    pub src: String,
    /// Destination file path, or an existing folder to place the file in.
    pub dst: String,
    /// Replace an existing destination file (default false).
    #[serde(default)]
    pub overwrite: bool,
}

/// Typed arguments for `rename_file`.
#[derive(Deserialize, JsonSchema)]
pub struct RenameFileArgs {
    /// File or folder to rename.
    pub path: String,
    /// New bare name in the same folder (e.g. 'final.txt'). No slashes.
    pub new_name: String,
    /// Replace an existing entry with that name (default false).
    #[serde(default)]
    pub overwrite: bool,
}

// ── ReadFile ────────────────────────────────────────────────────────

pub struct ReadFile {
    session: FsSession,
    max_bytes: usize,
}

impl ReadFile {
    pub fn new(session: FsSession) -> Self {
        Self {
            session,
            max_bytes: DEFAULT_READ_MAX_BYTES,
        }
    }

    /// Default byte budget when the call does not pass `max_bytes`.
    pub fn max_bytes(mut self, max: usize) -> Self {
        self.max_bytes = max;
        self
    }
}

impl Tool for ReadFile {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(names::READ_FILE, "Read the beginning of a text file")
            .when_to_use("When you need to look inside a file whose path you know")
            .when_not_to_use(
                "To find files. Use search_file_by_name or files_in_folder first",
            )
            .parameters_for::<ReadFileArgs>()
            .example(
                "read_file(path='notes/todo.txt', max_bytes=200)",
                "The first 200 bytes as text, with truncated=true if the file is longer",
            )
            .output_format("JSON {path, content, bytes_read, total_bytes, truncated}")
            .to_tool_def()
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let args: ReadFileArgs = match parse_tool_args(&arguments) {
                Ok(a) => a,
                Err(e) => return e,
            };
            let max = args.max_bytes.unwrap_or(self.max_bytes);
            render(ops::read_file(self.session.guard(), &args.path, max).await)
        })
    }
}

// ── WriteFile ───────────────────────────────────────────────────────

pub struct WriteFile {
    session: FsSession,
}

impl WriteFile {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for WriteFile {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(names::WRITE_FILE, "Create or replace a text file")
            .when_to_use("To create a new file, or replace one with overwrite=true")
            .when_not_to_use("To add to the end of a file. Use append_to_file")
            .parameters_for::<WriteFileArgs>()
            .example(
                "write_file(path='notes/new.txt', content='hello')",
                "Creates the file; fails with already_exists if it exists",
            )
            .example(
                "write_file(path='notes/new.txt', content='hi', overwrite=true)",
                "Replaces the file contents",
            )
            .output_format(format!(
                "JSON {{path, action: created|overwritten|appended, bytes_written}}. {STALE_INDEX_HINT}"
            ))
            .to_tool_def()
    }

    fn is_mutation(&self) -> bool {
        true
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let args: WriteFileArgs = match parse_tool_args(&arguments) {
                Ok(a) => a,
                Err(e) => return e,
            };
            render(
                ops::write_file(
                    self.session.guard(),
                    &args.path,
                    &args.content,
                    args.overwrite,
                    args.append,
                )
                .await,
            )
        })
    }
}

// ── AppendToFile ────────────────────────────────────────────────────

pub struct AppendToFile {
    session: FsSession,
}

impl AppendToFile {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for AppendToFile {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(names::APPEND_TO_FILE, "Append text to a file, creating it if needed")
            .when_to_use("To add lines to a log, list, or notes file")
            .when_not_to_use("To replace a file's contents. Use write_file with overwrite=true")
            .parameters_for::<AppendToFileArgs>()
            .output_format("JSON {path, action: created|appended, bytes_written}")
            .to_tool_def()
    }

    fn is_mutation(&self) -> bool {
        true
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let args: AppendToFileArgs = match parse_tool_args(&arguments) {
                Ok(a) => a,
                Err(e) => return e,
            };
            render(ops::append_to_file(self.session.guard(), &args.path, &args.content).await)
        })
    }
}

// ── DeleteFile ──────────────────────────────────────────────────────

pub struct DeleteFile {
    session: FsSession,
}

impl DeleteFile {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for DeleteFile {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(
            names::DELETE_FILE,
            "Delete one file permanently. A symlink is removed, not its target",
        )
            .when_to_use("To remove a single file, for example a duplicate")
            .when_not_to_use("For folders. Use delete_folder")
            .parameters_for::<PathArgs>()
            .output_format("JSON {path, kind}")
            .to_tool_def()
    }

    fn is_mutation(&self) -> bool {
        true
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let args: PathArgs = match parse_tool_args(&arguments) {
                Ok(a) => a,
                Err(e) => return e,
            };
            render(ops::delete_file(self.session.guard(), &args.path).await)
        })
    }
}

// ── DeleteFolder ────────────────────────────────────────────────────

pub struct DeleteFolder {
    session: FsSession,
}

impl DeleteFolder {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for DeleteFolder {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(
            names::DELETE_FOLDER,
            "Delete a folder and everything inside it permanently",
        )
        .when_to_use("To remove an entire folder tree")
        .when_not_to_use("For single files. Use delete_file. The configured roots cannot be deleted")
        .parameters_for::<PathArgs>()
        .output_format("JSON {path, kind}")
        .to_tool_def()
    }

    fn is_mutation(&self) -> bool {
        true
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let args: PathArgs = match parse_tool_args(&arguments) {
                Ok(a) => a,
                Err(e) => return e,
            };
            render(ops::delete_folder(self.session.guard(), &args.path).await)
        })
    }
}

// ── CreateFolder ────────────────────────────────────────────────────

pub struct CreateFolder {
    session: FsSession,
}

impl CreateFolder {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for CreateFolder {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(
            names::CREATE_FOLDER,
            "Create a folder, including any missing parent folders",
        )
        .when_to_use("Before writing or moving files into a folder that does not exist yet")
        .when_not_to_use("To create files. Use write_file")
        .parameters_for::<PathArgs>()
        .example(
            "create_folder(path='archive/2024')",
            "Creates archive and archive/2024; succeeds with created=false if it exists",
        )
        .output_format("JSON {path, created}")
        .to_tool_def()
    }

    fn is_mutation(&self) -> bool {
        true
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let args: PathArgs = match parse_tool_args(&arguments) {
                Ok(a) => a,
                Err(e) => return e,
            };
            render(ops::create_folder(self.session.guard(), &args.path).await)
        })
    }
}

// ── MoveFile ────────────────────────────────────────────────────────

pub struct MoveFile {
    session: FsSession,
}

impl MoveFile {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for MoveFile {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(names::MOVE_FILE, "Move a file to another path or folder")
            .when_to_use("To reorganize files between folders")
            .when_not_to_use("To keep the original. Use copy_file")
            .parameters_for::<TransferArgs>()
            .example(
                "move_file(src='Downloads/a.pdf', dst='Documents')",
                "Moves to Documents/a.pdf",
            )
            .example(
                "move_file(src='a.txt', dst='b.txt')",
                "Fails with overwrite_denied if b.txt exists, unless overwrite=true",
            )
            .output_format("JSON {source, destination, replaced}")
            .disambiguate(
                "Only the name changes, the folder stays",
                names::RENAME_FILE,
                "rename_file takes just the new name",
            )
            .to_tool_def()
    }

    fn is_mutation(&self) -> bool {
        true
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let args: TransferArgs = match parse_tool_args(&arguments) {
                Ok(a) => a,
                Err(e) => return e,
            };
            render(
                ops::move_file(self.session.guard(), &args.src, &args.dst, args.overwrite).await,
            )
        })
    }
}

// ── CopyFile ────────────────────────────────────────────────────────

pub struct CopyFile {
    session: FsSession,
}

impl CopyFile {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for CopyFile {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(
            names::COPY_FILE,
            "Copy a file, keeping its modification time",
        )
        .when_to_use("To back up or duplicate a file")
        .when_not_to_use("To relocate a file. Use move_file")
        .parameters_for::<TransferArgs>()
        .example(
            "copy_file(src='report.pdf', dst='backup')",
            "Creates backup/report.pdf",
        )
        .output_format("JSON {source, destination, replaced}")
        .to_tool_def()
    }

    fn is_mutation(&self) -> bool {
        true
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let args: TransferArgs = match parse_tool_args(&arguments) {
                Ok(a) => a,
                Err(e) => return e,
            };
            render(
                ops::copy_file(self.session.guard(), &args.src, &args.dst, args.overwrite).await,
            )
        })
    }
}

// ── RenameFile ──────────────────────────────────────────────────────

pub struct RenameFile {
    session: FsSession,
}

impl RenameFile {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for RenameFile {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(names::RENAME_FILE, "Rename a file or folder in place")
            .when_to_use("To change a name without moving it to another folder")
            .when_not_to_use("To move it elsewhere. Use move_file")
            .parameters_for::<RenameFileArgs>()
            .example(
                "rename_file(path='draft.txt', new_name='final.txt')",
                "draft.txt becomes final.txt in the same folder",
            )
            .output_format("JSON {source, destination, replaced}")
            .to_tool_def()
    }

    fn is_mutation(&self) -> bool {
        true
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let args: RenameFileArgs = match parse_tool_args(&arguments) {
                Ok(a) => a,
                Err(e) => return e,
            };
            render(
                ops::rename_file(
                    self.session.guard(),
                    &args.path,
                    &args.new_name,
                    args.overwrite,
                )
                .await,
            )
        })
    }
}
