//! The filesystem toolset as agent-callable tools.
//!
//! Every index, query, and mutation operation is a [`Tool`] implementor.
//! Tools are collected into a [`ToolSet`] which handles dispatch, validation,
//! truncation, and timeouts.
//!
//! # Submodules
//!
//! - [`core`]: [`Tool`] trait, [`ToolSet`], [`DisabledTool`], and the
//!   argument/result helpers.
//! - [`spec`]: [`ToolSpec`](spec::ToolSpec) builder for structured tool
//!   descriptions with `when_to_use` / `when_not_to_use` guidance.
//! - [`names`]: tool name constants.
//! - [`index`]: `build_file_index`, `refresh_index`, `index_status`,
//!   `find_duplicates`.
//! - [`search`]: read-only queries over the index snapshot.
//! - [`files`]: `read_file` and the mutation tools.

pub mod core;
pub mod files;
pub mod index;
pub mod names;
pub mod search;
pub mod spec;

pub use core::{
    DEFAULT_MAX_RESULT_BYTES, DEFAULT_TOOL_TIMEOUT, DisabledTool, Tool, ToolFuture, ToolSet,
    parse_tool_args, render, truncate_result, validate_tool_arguments,
};
pub use files::{
    AppendToFile, CopyFile, CreateFolder, DeleteFile, DeleteFolder, MoveFile, ReadFile,
    RenameFile, WriteFile,
};
pub use index::{BuildFileIndex, FindDuplicates, IndexStatus, RefreshIndex};
pub use search::{
    FilesInFolder, FilesModifiedAfter, FilesModifiedToday, FindByExtension, FindByType,
    GroupByExtension, LargeFiles, RecentFiles, SearchFileByName, SmallFiles, TopExtensions,
};

use crate::ops::DEFAULT_READ_MAX_BYTES;
use crate::session::FsSession;

/// Per-tool settings for [`FsToolsExt::with_fs_tools_configured`].
#[derive(Debug, Clone)]
pub struct FsToolsConfig {
    /// Default `read_file` byte budget. Default: 5000.
    pub read_max_bytes: usize,
    /// Register mutation tools as [`DisabledTool`]s. Default: `false`.
    pub read_only: bool,
}

impl Default for FsToolsConfig {
    fn default() -> Self {
        Self {
            read_max_bytes: DEFAULT_READ_MAX_BYTES,
            read_only: false,
        }
    }
}

impl FsToolsConfig {
    pub fn read_max_bytes(mut self, max: usize) -> Self {
        self.read_max_bytes = max;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}

/// Extension trait for registering the filesystem tools on a [`ToolSet`].
///
/// # Example
///
/// ```ignore
/// let session = FsSession::new(["/home/me/Documents"])?;
/// let tools = ToolSet::new()
///     .with_arg_validation(true)
///     .with_fs_tools(&session);
/// ```
pub trait FsToolsExt {
    fn with_fs_tools(self, session: &FsSession) -> Self;
    fn with_fs_tools_configured(self, session: &FsSession, config: &FsToolsConfig) -> Self;
}

impl FsToolsExt for ToolSet {
    fn with_fs_tools(self, session: &FsSession) -> Self {
        self.with_fs_tools_configured(session, &FsToolsConfig::default())
    }

    fn with_fs_tools_configured(self, session: &FsSession, config: &FsToolsConfig) -> Self {
        let s = session;
        let mut set = self
            .with(BuildFileIndex::new(s.clone()))
            .with(RefreshIndex::new(s.clone()))
            .with(IndexStatus::new(s.clone()))
            .with(SearchFileByName::new(s.clone()))
            .with(FindByExtension::new(s.clone()))
            .with(FindByType::new(s.clone()))
            .with(RecentFiles::new(s.clone()))
            .with(FilesModifiedAfter::new(s.clone()))
            .with(FilesModifiedToday::new(s.clone()))
            .with(LargeFiles::new(s.clone()))
            .with(SmallFiles::new(s.clone()))
            .with(FilesInFolder::new(s.clone()))
            .with(GroupByExtension::new(s.clone()))
            .with(TopExtensions::new(s.clone()))
            .with(FindDuplicates::new(s.clone()))
            .with(ReadFile::new(s.clone()).max_bytes(config.read_max_bytes));

        register_mutation(&mut set, config, WriteFile::new(s.clone()));
        register_mutation(&mut set, config, AppendToFile::new(s.clone()));
        register_mutation(&mut set, config, DeleteFile::new(s.clone()));
        register_mutation(&mut set, config, DeleteFolder::new(s.clone()));
        register_mutation(&mut set, config, CreateFolder::new(s.clone()));
        register_mutation(&mut set, config, MoveFile::new(s.clone()));
        register_mutation(&mut set, config, CopyFile::new(s.clone()));
        register_mutation(&mut set, config, RenameFile::new(s.clone()));
        set
    }
}

fn register_mutation(set: &mut ToolSet, config: &FsToolsConfig, tool: impl Tool + 'static) {
    if config.read_only {
        set.register(DisabledTool::from_tool(
            &tool,
            "this session is read-only; the filesystem cannot be modified",
        ));
    } else {
        set.register(tool);
    }
}
