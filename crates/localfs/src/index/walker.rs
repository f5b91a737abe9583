//! Recursive scan of the roots into [`FileRecord`]s.
//!
//! The scan is best-effort: an entry whose metadata cannot be read is counted
//! in [`IndexScan::skipped`] and the walk moves on. Symlinks are neither
//! followed nor indexed, which keeps every recorded path canonical and inside
//! its root without a second resolution pass. Broken links and links whose
//! target escapes the roots are counted as skipped; links to paths inside the
//! roots are passed over silently since their targets are indexed directly. Roots are walked in parallel on
//! the rayon pool; the output keeps the order of `roots`, and traversal order
//! within each root.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use super::{FileRecord, extension_of};
use crate::error::{FsError, Result};
use crate::guard::RootGuard;

/// Result of one full scan.
#[derive(Debug)]
pub struct IndexScan {
    pub roots: Vec<PathBuf>,
    pub records: Vec<FileRecord>,
    pub skipped: usize,
    pub elapsed: Duration,
}

/// Walk every directory in `roots` and collect regular files.
///
/// `roots` must already be canonical and confined by `guard`; the guard
/// supplies each record's owning root. Returns [`FsError::Cancelled`] as soon
/// as `cancel` fires, discarding partial results.
pub fn build_index(
    guard: &RootGuard,
    roots: &[PathBuf],
    cancel: &CancellationToken,
) -> Result<IndexScan> {
    let start = Instant::now();

    let per_root: Vec<(Vec<FileRecord>, usize)> = roots
        .par_iter()
        .map(|root| scan_root(guard, root, cancel))
        .collect::<Result<_>>()?;

    let mut records = Vec::new();
    let mut skipped = 0;
    for (root_records, root_skipped) in per_root {
        records.extend(root_records);
        skipped += root_skipped;
    }

    let elapsed = start.elapsed();
    debug!(
        "Indexed {} files under {} root(s) in {:.0}ms ({} skipped)",
        records.len(),
        roots.len(),
        elapsed.as_secs_f64() * 1000.0,
        skipped,
    );

    Ok(IndexScan {
        roots: roots.to_vec(),
        records,
        skipped,
        elapsed,
    })
}

fn scan_root(
    guard: &RootGuard,
    dir: &Path,
    cancel: &CancellationToken,
) -> Result<(Vec<FileRecord>, usize)> {
    let Some(root) = guard.owning_root(dir) else {
        return Err(FsError::AccessDenied(dir.to_path_buf()));
    };

    let mut records = Vec::new();
    let mut skipped = 0;

    for entry in WalkDir::new(dir).follow_links(false) {
        if cancel.is_cancelled() {
            debug!("Scan of {} cancelled", dir.display());
            return Err(FsError::Cancelled);
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry under {}: {err}", dir.display());
                skipped += 1;
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_symlink() {
            if let Err(reason) = check_link(guard, entry.path()) {
                warn!("Skipping symlink {}: {reason}", entry.path().display());
                skipped += 1;
            } else {
                trace!("Not following symlink {}", entry.path().display());
            }
            continue;
        }
        if !file_type.is_file() {
            continue;
        }

        match record_for(entry.path(), root) {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!("Skipping {}: {err}", entry.path().display());
                skipped += 1;
            }
        }
    }

    Ok((records, skipped))
}

/// A link is fine to pass over when its target exists inside the roots.
fn check_link(guard: &RootGuard, link: &Path) -> std::result::Result<(), String> {
    let target = std::fs::canonicalize(link).map_err(|e| format!("broken link ({e})"))?;
    if guard.contains(&target) {
        Ok(())
    } else {
        Err(format!("target {} is outside the roots", target.display()))
    }
}

fn record_for(path: &Path, root: &Path) -> std::io::Result<FileRecord> {
    let meta = std::fs::metadata(path)?;
    let modified: DateTime<Utc> = meta.modified()?.into();
    Ok(FileRecord {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path.to_path_buf(),
        size: meta.len(),
        modified,
        extension: extension_of(path),
        root: root.to_path_buf(),
    })
}
