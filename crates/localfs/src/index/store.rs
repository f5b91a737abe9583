//! The current index, swapped wholesale on every refresh.
//!
//! Readers take an `Arc<Snapshot>` and keep it for as long as they need; a
//! refresh builds the next generation off to the side and publishes it with a
//! single atomic pointer store. A query that started before the swap finishes
//! against the old generation, one that starts after sees the new one, and
//! nobody ever observes a half-built index.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use chrono::Local;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::walker::{IndexScan, build_index};
use super::Snapshot;
use crate::error::{EntryKind, FsError, Result};
use crate::guard::{RootGuard, non_overlapping_roots};

/// Outcome of one refresh.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub generation: u64,
    pub count: usize,
    pub skipped: usize,
    pub roots: Vec<PathBuf>,
    pub elapsed_ms: u64,
}

pub struct IndexStore {
    guard: Arc<RootGuard>,
    current: ArcSwap<Snapshot>,
    /// Serializes publishers so generations increase in swap order.
    publish: Mutex<()>,
}

impl std::fmt::Debug for IndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snap = self.current.load();
        f.debug_struct("IndexStore")
            .field("roots", &self.guard.roots())
            .field("generation", &snap.generation)
            .field("files", &snap.len())
            .finish()
    }
}

impl IndexStore {
    pub fn new(guard: Arc<RootGuard>) -> Self {
        Self {
            guard,
            current: ArcSwap::from_pointee(Snapshot::empty()),
            publish: Mutex::new(()),
        }
    }

    /// The latest published snapshot (generation 0 and empty before the
    /// first refresh).
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Rebuild the index on a blocking worker and publish it.
    ///
    /// An empty `roots` slice scans every configured root; otherwise each
    /// entry must be a directory inside the roots. On cancellation the old
    /// snapshot stays in place.
    pub async fn refresh<P: AsRef<Path>>(
        &self,
        roots: &[P],
        cancel: CancellationToken,
    ) -> Result<RefreshReport> {
        let scan_roots = self.scan_roots(roots)?;
        let guard = Arc::clone(&self.guard);
        let scan =
            tokio::task::spawn_blocking(move || build_index(&guard, &scan_roots, &cancel))
                .await
                .map_err(FsError::worker)??;
        Ok(self.publish(scan))
    }

    /// Synchronous variant of [`refresh`](Self::refresh) for callers that
    /// already run on a blocking thread.
    pub fn refresh_blocking<P: AsRef<Path>>(
        &self,
        roots: &[P],
        cancel: &CancellationToken,
    ) -> Result<RefreshReport> {
        let scan_roots = self.scan_roots(roots)?;
        let scan = build_index(&self.guard, &scan_roots, cancel)?;
        Ok(self.publish(scan))
    }

    fn scan_roots<P: AsRef<Path>>(&self, roots: &[P]) -> Result<Vec<PathBuf>> {
        if roots.is_empty() {
            return Ok(self.guard.roots().to_vec());
        }
        let mut resolved = Vec::with_capacity(roots.len());
        for root in roots {
            let path = self.guard.resolve(root)?;
            let meta = std::fs::metadata(&path).map_err(|e| FsError::from_io(&path, e))?;
            if !meta.is_dir() {
                return Err(FsError::wrong_type(
                    path,
                    EntryKind::Directory,
                    EntryKind::of(&meta),
                ));
            }
            resolved.push(path);
        }
        Ok(non_overlapping_roots(resolved))
    }

    fn publish(&self, scan: IndexScan) -> RefreshReport {
        let _lock = self.publish.lock().unwrap_or_else(|e| e.into_inner());
        let generation = self.current.load().generation + 1;
        let report = RefreshReport {
            generation,
            count: scan.records.len(),
            skipped: scan.skipped,
            roots: scan.roots.clone(),
            elapsed_ms: scan.elapsed.as_millis() as u64,
        };
        self.current.store(Arc::new(Snapshot {
            generation,
            roots: scan.roots,
            records: scan.records,
            skipped: scan.skipped,
            built_at: Some(Local::now()),
        }));
        info!(
            "Index generation {generation}: {} files ({} skipped) in {}ms",
            report.count, report.skipped, report.elapsed_ms,
        );
        report
    }
}
