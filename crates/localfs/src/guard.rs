//! Root confinement for every path-accepting operation.
//!
//! A [`RootGuard`] owns the canonical allow-list of directories for one
//! session. Paths handed in by the agent are canonicalized (symlinks and `..`
//! resolved by the OS) and then checked component-wise against the roots, so
//! `/data2` never passes as a child of `/data` and a symlink pointing outside
//! the roots is denied like any other foreign path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{EntryKind, FsError, Result};

#[derive(Debug, Clone)]
pub struct RootGuard {
    roots: Vec<PathBuf>,
}

impl RootGuard {
    /// Canonicalize and validate the configured roots.
    ///
    /// Each root must exist and be a directory. Roots nested inside another
    /// root are dropped so every file has exactly one owning root.
    pub fn new<I, P>(roots: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut canonical = Vec::new();
        for root in roots {
            let root = root.as_ref();
            let resolved = fs::canonicalize(root).map_err(|e| FsError::from_io(root, e))?;
            let meta = fs::metadata(&resolved).map_err(|e| FsError::from_io(&resolved, e))?;
            if !meta.is_dir() {
                return Err(FsError::wrong_type(
                    resolved,
                    EntryKind::Directory,
                    EntryKind::of(&meta),
                ));
            }
            canonical.push(resolved);
        }
        if canonical.is_empty() {
            return Err(FsError::InvalidArgument(
                "at least one root directory is required".into(),
            ));
        }
        let roots = non_overlapping_roots(canonical);
        debug!("Root guard confined to {:?}", roots);
        Ok(Self { roots })
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Whether an already-canonical path is equal to or nested under a root.
    pub fn contains(&self, canonical: &Path) -> bool {
        self.owning_root(canonical).is_some()
    }

    /// The root a canonical path belongs to.
    pub fn owning_root(&self, canonical: &Path) -> Option<&Path> {
        self.roots
            .iter()
            .find(|root| canonical.starts_with(root))
            .map(PathBuf::as_path)
    }

    /// Whether `canonical` is one of the roots itself.
    pub fn is_root(&self, canonical: &Path) -> bool {
        self.roots.iter().any(|root| root == canonical)
    }

    /// Resolve an existing path to its canonical form inside the roots.
    ///
    /// A missing path that would land inside the roots is `NotFound`; one
    /// that would land outside is `AccessDenied`, so callers cannot test
    /// for the existence of files they are not allowed to see.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let joined = self.absolutize(path.as_ref())?;
        match fs::canonicalize(&joined) {
            Ok(canonical) => self.confine(canonical),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let would_be = self.resolve_for_create(&joined)?;
                Err(FsError::NotFound(would_be))
            }
            Err(e) => Err(FsError::from_io(&joined, e)),
        }
    }

    /// Resolve an existing directory entry without following a symlink in the
    /// final position.
    ///
    /// The parent is canonicalized and the last component is re-attached, so
    /// the result names the link itself rather than its target. Dangling
    /// links resolve too. Used by operations that remove or relocate the
    /// entry at `path`.
    pub fn resolve_entry(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let joined = self.absolutize(path.as_ref())?;
        let (Some(parent), Some(name)) = (joined.parent(), joined.file_name()) else {
            // `/` or a trailing `..`: nothing to keep unresolved.
            return self.resolve(&joined);
        };
        let parent = match fs::canonicalize(parent) {
            Ok(canonical) => canonical,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let would_be = self.resolve_for_create(&joined)?;
                return Err(FsError::NotFound(would_be));
            }
            Err(e) => return Err(FsError::from_io(parent, e)),
        };
        let entry = self.confine(parent.join(name))?;
        match fs::symlink_metadata(&entry) {
            Ok(_) => Ok(entry),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(FsError::NotFound(entry)),
            Err(e) => Err(FsError::from_io(&entry, e)),
        }
    }

    /// Resolve a path that may not exist yet (a write or move destination).
    ///
    /// The deepest existing ancestor is canonicalized and the missing
    /// components are re-appended. A missing tail may not contain `..`, and
    /// a dangling symlink in the final position is refused because writing
    /// through it would follow the link target.
    pub fn resolve_for_create(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let joined = self.absolutize(path.as_ref())?;
        let mut base = joined.clone();
        let mut tail = Vec::new();
        let canonical_base = loop {
            match fs::canonicalize(&base) {
                Ok(canonical) => break canonical,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    // `file_name` is None for a trailing `..`.
                    let Some(name) = base.file_name() else {
                        return Err(FsError::AccessDenied(joined));
                    };
                    tail.push(name.to_os_string());
                    if !base.pop() {
                        return Err(FsError::AccessDenied(joined));
                    }
                }
                Err(e) => return Err(FsError::from_io(&base, e)),
            }
        };

        let mut resolved = canonical_base;
        for name in tail.iter().rev() {
            resolved.push(name);
        }
        let resolved = self.confine(resolved)?;

        if !tail.is_empty() && fs::symlink_metadata(&resolved).is_ok() {
            return Err(FsError::AccessDenied(resolved));
        }
        Ok(resolved)
    }

    fn confine(&self, canonical: PathBuf) -> Result<PathBuf> {
        if self.contains(&canonical) {
            Ok(canonical)
        } else {
            debug!("Denied path outside roots: {}", canonical.display());
            Err(FsError::AccessDenied(canonical))
        }
    }

    fn absolutize(&self, path: &Path) -> Result<PathBuf> {
        if path.as_os_str().is_empty() {
            return Err(FsError::InvalidArgument("path must not be empty".into()));
        }
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(self.roots[0].join(path))
        }
    }
}

/// Drop roots nested inside another root, keeping the configured order.
pub(crate) fn non_overlapping_roots(roots: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();
    for root in &roots {
        let covered = roots
            .iter()
            .any(|other| other != root && root.starts_with(other));
        if !covered && !result.contains(root) {
            result.push(root.clone());
        }
    }
    result
}
