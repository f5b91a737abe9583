//! Session configuration with sensible defaults.
//!
//! [`FsConfig`] captures the settings an agent host needs and converts them
//! into a validated [`FsSession`] via [`build_session`](FsConfig::build_session)
//! and a ready [`ToolSet`] via [`build_tool_set`](FsConfig::build_tool_set).

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{FsError, Result};
use crate::ops::DEFAULT_READ_MAX_BYTES;
use crate::session::FsSession;
use crate::tools::{
    DEFAULT_MAX_RESULT_BYTES, DEFAULT_TOOL_TIMEOUT, FsToolsConfig, FsToolsExt, ToolSet,
};

/// OS path list of roots (`:`-separated on Unix, `;` on Windows).
pub const ENV_ROOTS: &str = "LOCALFS_ROOTS";
/// `true`/`1`/`yes` to disable mutation tools.
pub const ENV_READ_ONLY: &str = "LOCALFS_READ_ONLY";
/// Per-call timeout in seconds; `0` disables it.
pub const ENV_TIMEOUT_SECS: &str = "LOCALFS_TIMEOUT_SECS";

/// Configuration for a filesystem tool session.
#[derive(Debug, Clone)]
pub struct FsConfig {
    /// Directories the agent may touch. Must be non-empty to build a session.
    pub roots: Vec<PathBuf>,
    /// Tool results longer than this are truncated. Default: `30000`.
    pub max_result_bytes: usize,
    /// Default `read_file` byte budget. Default: `5000`.
    pub read_max_bytes: usize,
    /// Per-call timeout. Default: 60 seconds.
    pub tool_timeout: Option<Duration>,
    /// Validate arguments against each tool's schema. Default: `true`.
    pub validate_args: bool,
    /// Disable every mutation tool. Default: `false`.
    pub read_only: bool,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            max_result_bytes: DEFAULT_MAX_RESULT_BYTES,
            read_max_bytes: DEFAULT_READ_MAX_BYTES,
            tool_timeout: Some(DEFAULT_TOOL_TIMEOUT),
            validate_args: true,
            read_only: false,
        }
    }
}

impl FsConfig {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Defaults overridden by `LOCALFS_ROOTS`, `LOCALFS_READ_ONLY`, and
    /// `LOCALFS_TIMEOUT_SECS` where set.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var_os(key))
    }

    fn from_vars(get: impl Fn(&str) -> Option<OsString>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(roots) = get(ENV_ROOTS) {
            config.roots = env::split_paths(&roots)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }
        if let Some(value) = get(ENV_READ_ONLY) {
            config.read_only = parse_flag(ENV_READ_ONLY, &value.to_string_lossy())?;
        }
        if let Some(value) = get(ENV_TIMEOUT_SECS) {
            let value = value.to_string_lossy();
            let secs: u64 = value.trim().parse().map_err(|_| {
                FsError::InvalidArgument(format!(
                    "{ENV_TIMEOUT_SECS} must be a whole number of seconds, got '{value}'"
                ))
            })?;
            config.tool_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        Ok(config)
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    pub fn with_max_result_bytes(mut self, max: usize) -> Self {
        self.max_result_bytes = max;
        self
    }

    pub fn with_read_max_bytes(mut self, max: usize) -> Self {
        self.read_max_bytes = max;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_arg_validation(mut self, enabled: bool) -> Self {
        self.validate_args = enabled;
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Validate the roots and start a session with an empty index.
    pub fn build_session(&self) -> Result<FsSession> {
        FsSession::new(&self.roots)
    }

    /// Build a [`ToolSet`] with every filesystem tool bound to `session`.
    pub fn build_tool_set(&self, session: &FsSession) -> ToolSet {
        let tools_config = FsToolsConfig::default()
            .read_max_bytes(self.read_max_bytes)
            .read_only(self.read_only);
        ToolSet::new()
            .with_max_result_bytes(self.max_result_bytes)
            .with_arg_validation(self.validate_args)
            .with_default_timeout(self.tool_timeout)
            .with_fs_tools_configured(session, &tools_config)
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(FsError::InvalidArgument(format!(
            "{name} must be true or false, got '{other}'"
        ))),
    }
}
