//! Read-only tools over the current index snapshot.
//!
//! | Tool | Query |
//! |------|-------|
//! | [`SearchFileByName`] | case-insensitive name substring |
//! | [`FindByExtension`] | one extension |
//! | [`FindByType`] | any of several extensions |
//! | [`RecentFiles`] | newest `n` by modification time |
//! | [`FilesModifiedAfter`] | modified after a Unix timestamp |
//! | [`FilesModifiedToday`] | modified since local midnight |
//! | [`LargeFiles`] / [`SmallFiles`] | size thresholds |
//! | [`FilesInFolder`] | everything below a folder |
//! | [`GroupByExtension`] / [`TopExtensions`] | extension statistics |
//!
//! None of these touch the disk except `files_in_folder`, which resolves its
//! folder through the root guard. Results reflect the index as of its last
//! build or refresh.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::core::{Tool, ToolFuture, parse_tool_args, render};
use super::index::NoArgs;
use super::names;
use super::spec::ToolSpec;
use crate::ToolDef;
use crate::error::FsError;
use crate::index::{FileRecord, Snapshot};
use crate::query::{ExtensionCount, ExtensionGroup, timestamp_to_utc};
use crate::session::FsSession;

const DEFAULT_TOP_N: usize = 5;

const EMPTY_INDEX_NOTE: &str = "the index is empty; call build_file_index first";

/// Envelope for every file-list result.
#[derive(Serialize)]
struct FileList<'a> {
    generation: u64,
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'static str>,
    files: Vec<&'a FileRecord>,
}

fn file_list(snapshot: &Snapshot, files: Vec<&FileRecord>) -> String {
    render(Ok(FileList {
        generation: snapshot.generation,
        count: files.len(),
        note: empty_note(snapshot),
        files,
    }))
}

fn empty_note(snapshot: &Snapshot) -> Option<&'static str> {
    (snapshot.generation == 0).then_some(EMPTY_INDEX_NOTE)
}

fn non_negative(name: &str, value: f64) -> Result<f64, String> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(FsError::InvalidArgument(format!(
            "'{name}' must be a non-negative number, got {value}"
        ))
        .to_tool_error())
    }
}

// ── Typed argument structs ──────────────────────────────────────────

/// Typed arguments for `search_file_by_name`.
#[derive(Deserialize, JsonSchema)]
pub struct SearchFileByNameArgs {
    /// Part of the file name, matched case-insensitively (e.g. 'report').
    pub name: String,
}

/// Typed arguments for `find_by_extension`.
#[derive(Deserialize, JsonSchema)]
pub struct FindByExtensionArgs {
    /// Extension with or without the dot, any case (e.g. 'pdf', '.PDF').
    /// An empty string matches files without an extension.
    pub ext: String,
}

/// Typed arguments for `find_by_type`.
#[derive(Deserialize, JsonSchema)]
pub struct FindByTypeArgs {
    /// Extensions to match (e.g. ['.jpg', 'png', 'GIF']).
    pub types: Vec<String>,
}

/// Typed arguments for `recent_files` and `top_extensions`.
#[derive(Deserialize, JsonSchema)]
pub struct TopNArgs {
    /// How many entries to return (default 5).
    #[serde(default)]
    pub n: Option<usize>,
}

/// Typed arguments for `files_modified_after`.
#[derive(Deserialize, JsonSchema)]
pub struct FilesModifiedAfterArgs {
    /// Unix timestamp in seconds, fractions allowed (e.g. 1717171717.5).
    /// Only files modified strictly later are returned.
    pub timestamp: f64,
}

/// Typed arguments for `large_files`.
#[derive(Deserialize, JsonSchema)]
pub struct LargeFilesArgs {
    /// Minimum size in MiB, inclusive (e.g. 100 or 0.5).
    pub min_size_mb: f64,
}

/// Typed arguments for `small_files`.
#[derive(Deserialize, JsonSchema)]
pub struct SmallFilesArgs {
    /// Maximum size in KiB, inclusive (e.g. 4).
    pub max_size_kb: f64,
}

/// Typed arguments for `files_in_folder`.
#[derive(Deserialize, JsonSchema)]
pub struct FilesInFolderArgs {
    /// Folder path, absolute or relative to the first root (e.g. 'Documents/taxes').
    pub folder: String,
}

// ── SearchFileByName ────────────────────────────────────────────────

pub struct SearchFileByName {
    session: FsSession,
}

impl SearchFileByName {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for SearchFileByName {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(
            names::SEARCH_FILE_BY_NAME,
            "Find indexed files whose name contains a substring",
        )
        .when_to_use("When you know part of a file's name")
        .when_not_to_use(
            "When you only know the file type. Use find_by_extension or find_by_type",
        )
        .parameters_for::<SearchFileByNameArgs>()
        .example(
            "search_file_by_name(name='report')",
            "Matches Report_Final.PDF and q3-report.docx",
        )
        .output_format("JSON {generation, count, files: [{name, path, size, modified, extension, root}]}")
        .to_tool_def()
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let args: SearchFileByNameArgs = match parse_tool_args(&arguments) {
                Ok(a) => a,
                Err(e) => return e,
            };
            let snapshot = self.session.snapshot();
            file_list(&snapshot, snapshot.search_by_name(&args.name))
        })
    }
}

// ── FindByExtension ─────────────────────────────────────────────────

pub struct FindByExtension {
    session: FsSession,
}

impl FindByExtension {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for FindByExtension {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(names::FIND_BY_EXTENSION, "Find indexed files with one extension")
            .when_to_use("When you want every file of exactly one type")
            .when_not_to_use("For several types at once. Use find_by_type")
            .parameters_for::<FindByExtensionArgs>()
            .example("find_by_extension(ext='PDF')", "Same result as ext='.pdf'")
            .example("find_by_extension(ext='')", "Files with no extension, like Makefile")
            .output_format("JSON {generation, count, files}")
            .disambiguate(
                "Looking for all images (jpg, png, gif)",
                names::FIND_BY_TYPE,
                "find_by_type takes a list of extensions",
            )
            .to_tool_def()
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let args: FindByExtensionArgs = match parse_tool_args(&arguments) {
                Ok(a) => a,
                Err(e) => return e,
            };
            let snapshot = self.session.snapshot();
            file_list(&snapshot, snapshot.find_by_extension(&args.ext))
        })
    }
}

// ── FindByType ──────────────────────────────────────────────────────

pub struct FindByType {
    session: FsSession,
}

impl FindByType {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for FindByType {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(
            names::FIND_BY_TYPE,
            "Find indexed files matching any extension in a list",
        )
        .when_to_use("When a category spans several extensions (images, documents, archives)")
        .when_not_to_use("For a single extension. find_by_extension is simpler")
        .parameters_for::<FindByTypeArgs>()
        .example(
            "find_by_type(types=['jpg', 'jpeg', 'png'])",
            "Every JPEG and PNG, in index order, each listed once",
        )
        .output_format("JSON {generation, count, files}")
        .to_tool_def()
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let args: FindByTypeArgs = match parse_tool_args(&arguments) {
                Ok(a) => a,
                Err(e) => return e,
            };
            let snapshot = self.session.snapshot();
            file_list(&snapshot, snapshot.find_by_type(&args.types))
        })
    }
}

// ── RecentFiles ─────────────────────────────────────────────────────

pub struct RecentFiles {
    session: FsSession,
}

impl RecentFiles {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for RecentFiles {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(
            names::RECENT_FILES,
            "List the most recently modified indexed files, newest first",
        )
        .when_to_use("To see what changed last, without a specific cutoff time")
        .when_not_to_use(
            "When you have a cutoff time. Use files_modified_after or files_modified_today",
        )
        .parameters_for::<TopNArgs>()
        .example("recent_files(n=10)", "The ten newest files")
        .output_format("JSON {generation, count, files} sorted by modified, descending")
        .to_tool_def()
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let args: TopNArgs = match parse_tool_args(&arguments) {
                Ok(a) => a,
                Err(e) => return e,
            };
            let snapshot = self.session.snapshot();
            file_list(&snapshot, snapshot.recent(args.n.unwrap_or(DEFAULT_TOP_N)))
        })
    }
}

// ── FilesModifiedAfter ──────────────────────────────────────────────

pub struct FilesModifiedAfter {
    session: FsSession,
}

impl FilesModifiedAfter {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for FilesModifiedAfter {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(
            names::FILES_MODIFIED_AFTER,
            "List indexed files modified after a Unix timestamp",
        )
        .when_to_use("When you have a specific cutoff time")
        .when_not_to_use("For 'today'. files_modified_today computes local midnight for you")
        .parameters_for::<FilesModifiedAfterArgs>()
        .example(
            "files_modified_after(timestamp=1700000000)",
            "Files modified after 2023-11-14T22:13:20Z",
        )
        .output_format("JSON {generation, count, files}")
        .to_tool_def()
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let args: FilesModifiedAfterArgs = match parse_tool_args(&arguments) {
                Ok(a) => a,
                Err(e) => return e,
            };
            let Some(after) = timestamp_to_utc(args.timestamp) else {
                return FsError::InvalidArgument(format!(
                    "timestamp {} is out of range",
                    args.timestamp
                ))
                .to_tool_error();
            };
            let snapshot = self.session.snapshot();
            file_list(&snapshot, snapshot.modified_after(after))
        })
    }
}

// ── FilesModifiedToday ──────────────────────────────────────────────

pub struct FilesModifiedToday {
    session: FsSession,
}

impl FilesModifiedToday {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for FilesModifiedToday {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(
            names::FILES_MODIFIED_TODAY,
            "List indexed files modified since local midnight",
        )
        .when_to_use("To answer 'what did I work on today'")
        .when_not_to_use("For any other cutoff. Use files_modified_after")
        .parameters_for::<NoArgs>()
        .output_format("JSON {generation, count, files}")
        .to_tool_def()
    }

    fn execute(&self, _arguments: &str) -> ToolFuture<'_> {
        Box::pin(async move {
            let snapshot = self.session.snapshot();
            file_list(&snapshot, snapshot.modified_today())
        })
    }
}

// ── LargeFiles ──────────────────────────────────────────────────────

pub struct LargeFiles {
    session: FsSession,
}

impl LargeFiles {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for LargeFiles {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(names::LARGE_FILES, "List indexed files at or above a size in MiB")
            .when_to_use("To find what is taking up disk space")
            .when_not_to_use("To find tiny or empty files. Use small_files")
            .parameters_for::<LargeFilesArgs>()
            .example(
                "large_files(min_size_mb=1)",
                "Includes a file of exactly 1048576 bytes, excludes 1048575",
            )
            .output_format("JSON {generation, count, files}")
            .to_tool_def()
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let args: LargeFilesArgs = match parse_tool_args(&arguments) {
                Ok(a) => a,
                Err(e) => return e,
            };
            let min = match non_negative("min_size_mb", args.min_size_mb) {
                Ok(v) => v,
                Err(e) => return e,
            };
            let snapshot = self.session.snapshot();
            file_list(&snapshot, snapshot.large_files(min))
        })
    }
}

// ── SmallFiles ──────────────────────────────────────────────────────

pub struct SmallFiles {
    session: FsSession,
}

impl SmallFiles {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for SmallFiles {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(names::SMALL_FILES, "List indexed files at or below a size in KiB")
            .when_to_use("To find empty or near-empty files")
            .when_not_to_use("To find big files. Use large_files")
            .parameters_for::<SmallFilesArgs>()
            .example("small_files(max_size_kb=0)", "Only empty files")
            .output_format("JSON {generation, count, files}")
            .to_tool_def()
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let args: SmallFilesArgs = match parse_tool_args(&arguments) {
                Ok(a) => a,
                Err(e) => return e,
            };
            let max = match non_negative("max_size_kb", args.max_size_kb) {
                Ok(v) => v,
                Err(e) => return e,
            };
            let snapshot = self.session.snapshot();
            file_list(&snapshot, snapshot.small_files(max))
        })
    }
}

// ── FilesInFolder ───────────────────────────────────────────────────

pub struct FilesInFolder {
    session: FsSession,
}

impl FilesInFolder {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for FilesInFolder {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(
            names::FILES_IN_FOLDER,
            "List indexed files anywhere below a folder",
        )
        .when_to_use("To see everything inside one folder, including subfolders")
        .when_not_to_use(
            "To filter by name or type across all folders. Use the search tools",
        )
        .parameters_for::<FilesInFolderArgs>()
        .example(
            "files_in_folder(folder='Documents')",
            "Every indexed file under <first root>/Documents",
        )
        .output_format("JSON {generation, count, files}")
        .to_tool_def()
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let args: FilesInFolderArgs = match parse_tool_args(&arguments) {
                Ok(a) => a,
                Err(e) => return e,
            };
            let folder = match self.session.guard().resolve(&args.folder) {
                Ok(f) => f,
                Err(e) => return e.to_tool_error(),
            };
            let snapshot = self.session.snapshot();
            file_list(&snapshot, snapshot.files_in_folder(&folder))
        })
    }
}

// ── GroupByExtension ────────────────────────────────────────────────

#[derive(Serialize)]
struct GroupList<'a> {
    generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'static str>,
    groups: Vec<ExtensionGroup<'a>>,
}

pub struct GroupByExtension {
    session: FsSession,
}

impl GroupByExtension {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for GroupByExtension {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(
            names::GROUP_BY_EXTENSION,
            "Group every indexed file by extension",
        )
        .when_to_use("When you need the full file lists per type, e.g. to plan a reorganization")
        .when_not_to_use("When counts are enough. top_extensions is much smaller")
        .parameters_for::<NoArgs>()
        .output_format(
            "JSON {generation, groups: [{extension, count, files}]}, groups in first-seen order. \
             Files without an extension are grouped under ''",
        )
        .to_tool_def()
    }

    fn execute(&self, _arguments: &str) -> ToolFuture<'_> {
        Box::pin(async move {
            let snapshot = self.session.snapshot();
            render(Ok(GroupList {
                generation: snapshot.generation,
                note: empty_note(&snapshot),
                groups: snapshot.group_by_extension(),
            }))
        })
    }
}

// ── TopExtensions ───────────────────────────────────────────────────

#[derive(Serialize)]
struct ExtensionRanking {
    generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'static str>,
    extensions: Vec<ExtensionCount>,
}

pub struct TopExtensions {
    session: FsSession,
}

impl TopExtensions {
    pub fn new(session: FsSession) -> Self {
        Self { session }
    }
}

impl Tool for TopExtensions {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(names::TOP_EXTENSIONS, "Rank extensions by number of indexed files")
            .when_to_use("For a quick overview of what kinds of files exist")
            .when_not_to_use("When you need the files themselves. Use group_by_extension")
            .parameters_for::<TopNArgs>()
            .example(
                "top_extensions(n=3)",
                "[{'extension': '.jpg', 'count': 812}, ...]. Ties keep first-seen order",
            )
            .output_format("JSON {generation, extensions: [{extension, count}]}")
            .to_tool_def()
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let args: TopNArgs = match parse_tool_args(&arguments) {
                Ok(a) => a,
                Err(e) => return e,
            };
            let snapshot = self.session.snapshot();
            render(Ok(ExtensionRanking {
                generation: snapshot.generation,
                note: empty_note(&snapshot),
                extensions: snapshot.top_extensions(args.n.unwrap_or(DEFAULT_TOP_N)),
            }))
        })
    }
}
