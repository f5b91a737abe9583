//! In-memory file index.
//!
//! - [`walker`]: recursive, best-effort scan of the roots into
//!   [`FileRecord`]s.
//! - [`store`]: [`IndexStore`], the atomically swapped current [`Snapshot`].

pub mod store;
pub mod walker;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

pub use store::{IndexStore, RefreshReport};
pub use walker::{IndexScan, build_index};

/// Metadata for one indexed regular file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub name: String,
    /// Absolute canonical path.
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
    /// Lowercased, with a leading dot; empty when the name has no extension.
    pub extension: String,
    /// The configured root this file was found under.
    pub root: PathBuf,
}

impl FileRecord {
    pub fn is_within(&self, folder: &Path) -> bool {
        self.path.starts_with(folder)
    }
}

/// Lowercased extension with a leading dot, or an empty string.
///
/// Follows the usual suffix rules: `archive.tar.gz` is `.gz`, while a
/// dotfile such as `.bashrc` has no extension.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// One immutable generation of the index.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub generation: u64,
    pub roots: Vec<PathBuf>,
    pub records: Vec<FileRecord>,
    /// Entries the scan had to omit (unreadable, broken links, escapes).
    pub skipped: usize,
    pub built_at: Option<DateTime<Local>>,
}

impl Snapshot {
    /// The generation-0 snapshot served before the first refresh.
    pub fn empty() -> Self {
        Self {
            generation: 0,
            roots: Vec::new(),
            records: Vec::new(),
            skipped: 0,
            built_at: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.size).sum()
    }
}
