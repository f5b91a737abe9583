//! Content-identical file detection over a snapshot.
//!
//! Only files of equal size can share content, so records are bucketed by
//! size first and only multi-member buckets are read. Those files are hashed
//! in full with BLAKE3 on the rayon pool. A final pass in snapshot order picks
//! the first file seen for each hash as the canonical copy and pairs every
//! later match with it.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{FsError, Result};
use crate::index::{FileRecord, Snapshot};

#[derive(Debug, Clone, Serialize)]
pub struct DuplicatePair {
    pub canonical: FileRecord,
    pub duplicate: FileRecord,
    /// Hex BLAKE3 digest shared by both files.
    pub hash: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DuplicateReport {
    pub pairs: Vec<DuplicatePair>,
    pub files_hashed: usize,
    pub bytes_hashed: u64,
    /// Candidates that could not be read.
    pub skipped: usize,
    /// Bytes that removing every duplicate would free.
    pub wasted_bytes: u64,
}

/// Find duplicate files in `snapshot`.
///
/// Identical groups of `k` files produce `k - 1` pairs that all reference the
/// same canonical record. Nothing is cached between calls, so edits made since
/// the last call are always seen.
pub fn find_duplicates(
    snapshot: &Snapshot,
    cancel: &CancellationToken,
) -> Result<DuplicateReport> {
    let start = Instant::now();

    let mut by_size: HashMap<u64, Vec<usize>> = HashMap::new();
    for (i, record) in snapshot.records.iter().enumerate() {
        by_size.entry(record.size).or_default().push(i);
    }
    let mut candidates: Vec<usize> = by_size
        .into_values()
        .filter(|bucket| bucket.len() > 1)
        .flatten()
        .collect();
    candidates.sort_unstable();

    let hashed: Vec<(usize, Option<(blake3::Hash, u64)>)> = candidates
        .par_iter()
        .map(|&i| {
            if cancel.is_cancelled() {
                return Err(FsError::Cancelled);
            }
            let record = &snapshot.records[i];
            match hash_file(&record.path) {
                Ok(digest) => Ok((i, Some(digest))),
                Err(err) => {
                    warn!("Skipping {} for duplicate check: {err}", record.path.display());
                    Ok((i, None))
                }
            }
        })
        .collect::<Result<_>>()?;

    let mut report = DuplicateReport::default();
    let mut first_seen: HashMap<blake3::Hash, usize> = HashMap::new();
    for (i, digest) in hashed {
        let Some((hash, bytes)) = digest else {
            report.skipped += 1;
            continue;
        };
        report.files_hashed += 1;
        report.bytes_hashed += bytes;

        match first_seen.get(&hash) {
            Some(&canonical) => {
                report.wasted_bytes += bytes;
                report.pairs.push(DuplicatePair {
                    canonical: snapshot.records[canonical].clone(),
                    duplicate: snapshot.records[i].clone(),
                    hash: hash.to_hex().to_string(),
                    size: bytes,
                });
            }
            None => {
                first_seen.insert(hash, i);
            }
        }
    }

    debug!(
        "Hashed {} files ({} bytes) in {:.0}ms: {} duplicate pairs",
        report.files_hashed,
        report.bytes_hashed,
        start.elapsed().as_secs_f64() * 1000.0,
        report.pairs.len(),
    );
    Ok(report)
}

/// Run [`find_duplicates`] on a blocking worker.
pub async fn find_duplicates_async(
    snapshot: Arc<Snapshot>,
    cancel: CancellationToken,
) -> Result<DuplicateReport> {
    tokio::task::spawn_blocking(move || find_duplicates(&snapshot, &cancel))
        .await
        .map_err(FsError::worker)?
}

/// Hash a recorded file, refusing it if the path no longer resolves to
/// itself. Recorded paths are canonical, so a mismatch means the file or a
/// parent directory was swapped for a symlink after indexing.
fn hash_file(path: &Path) -> io::Result<(blake3::Hash, u64)> {
    if std::fs::canonicalize(path)? != path {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "path now resolves through a symlink",
        ));
    }
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let bytes = io::copy(&mut file, &mut hasher)?;
    Ok((hasher.finalize(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::RootGuard;
    use crate::index::build_index;
    use std::fs;

    fn snapshot_of(files: &[(&str, &str)]) -> (tempfile::TempDir, Snapshot) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let guard = RootGuard::new([dir.path()]).unwrap();
        let scan = build_index(&guard, guard.roots(), &CancellationToken::new()).unwrap();
        let snapshot = Snapshot {
            generation: 1,
            roots: scan.roots,
            records: scan.records,
            skipped: scan.skipped,
            built_at: None,
        };
        (dir, snapshot)
    }

    #[test]
    fn three_identical_files_yield_two_pairs() {
        let (_dir, snap) = snapshot_of(&[
            ("a.txt", "same content"),
            ("sub/b.txt", "same content"),
            ("sub/deep/c.txt", "same content"),
            ("d.txt", "different!!!"),
        ]);
        let report = find_duplicates(&snap, &CancellationToken::new()).unwrap();

        assert_eq!(report.pairs.len(), 2);
        let canonical = &report.pairs[0].canonical;
        assert!(report.pairs.iter().all(|p| &p.canonical == canonical));

        // The canonical is whichever of the three the snapshot lists first.
        let first = snap
            .records
            .iter()
            .find(|r| fs::read_to_string(&r.path).unwrap() == "same content")
            .unwrap();
        assert_eq!(canonical, first);
        assert_eq!(report.wasted_bytes, 2 * "same content".len() as u64);
    }

    #[test]
    fn same_size_different_content_is_not_a_duplicate() {
        let (_dir, snap) = snapshot_of(&[("a.txt", "aaaa"), ("b.txt", "bbbb")]);
        let report = find_duplicates(&snap, &CancellationToken::new()).unwrap();
        assert!(report.pairs.is_empty());
        assert_eq!(report.files_hashed, 2);
    }

    #[test]
    fn unique_sizes_are_never_read() {
        let (_dir, snap) = snapshot_of(&[("a.txt", "a"), ("b.txt", "bb"), ("c.txt", "ccc")]);
        let report = find_duplicates(&snap, &CancellationToken::new()).unwrap();
        assert_eq!(report.files_hashed, 0);
        assert_eq!(report.bytes_hashed, 0);
    }

    #[test]
    fn vanished_file_is_skipped() {
        let (dir, snap) = snapshot_of(&[("a.txt", "dup"), ("b.txt", "dup"), ("c.txt", "dup")]);
        fs::remove_file(dir.path().join("b.txt")).unwrap();
        let report = find_duplicates(&snap, &CancellationToken::new()).unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.pairs.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn file_replaced_by_symlink_is_skipped() {
        let (dir, snap) = snapshot_of(&[("a.txt", "dup"), ("b.txt", "dup")]);
        let outside = tempfile::tempdir().unwrap();
        let secret = outside.path().join("secret.txt");
        fs::write(&secret, "dup").unwrap();
        fs::remove_file(dir.path().join("b.txt")).unwrap();
        std::os::unix::fs::symlink(&secret, dir.path().join("b.txt")).unwrap();

        let report = find_duplicates(&snap, &CancellationToken::new()).unwrap();
        assert!(report.pairs.is_empty());
        assert_eq!(report.skipped, 1);
        assert_eq!(report.files_hashed, 1);
    }

    #[test]
    fn cancelled_detection_returns_cancelled() {
        let (_dir, snap) = snapshot_of(&[("a.txt", "dup"), ("b.txt", "dup")]);
        let token = CancellationToken::new();
        token.cancel();
        let err = find_duplicates(&snap, &token).unwrap_err();
        assert!(matches!(err, FsError::Cancelled));
    }

    #[tokio::test]
    async fn async_wrapper_runs_on_blocking_pool() {
        let (_dir, snap) = snapshot_of(&[("x.bin", "payload"), ("y.bin", "payload")]);
        let snap = Arc::new(snap);
        let report = find_duplicates_async(Arc::clone(&snap), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.pairs.len(), 1);
        assert_eq!(report.pairs[0].hash.len(), 64);
    }
}
