//! Read-only queries over one index [`Snapshot`].
//!
//! Everything here works on metadata captured at index time: no query touches
//! the filesystem. Results borrow from the snapshot, which the caller keeps
//! alive through its `Arc`. Path arguments (`files_in_folder`) must already be
//! resolved by the [`RootGuard`](crate::guard::RootGuard).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;

use crate::index::{FileRecord, Snapshot};

const MIB: f64 = 1024.0 * 1024.0;
const KIB: f64 = 1024.0;

/// Files sharing one extension, in snapshot order.
#[derive(Debug, Serialize)]
pub struct ExtensionGroup<'a> {
    pub extension: &'a str,
    pub count: usize,
    pub files: Vec<&'a FileRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionCount {
    pub extension: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexSummary {
    pub generation: u64,
    pub files: usize,
    pub total_bytes: u64,
    pub skipped: usize,
    pub roots: Vec<PathBuf>,
    pub built_at: Option<DateTime<Local>>,
}

/// Normalize a user-supplied extension to the indexed form.
///
/// `"PDF"`, `".pdf"` and `"*.pdf"` all become `".pdf"`. An empty string (or a
/// bare dot) selects files without an extension.
pub fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim().trim_start_matches('*').trim_start_matches('.');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(".{}", trimmed.to_lowercase())
    }
}

/// Convert fractional Unix seconds into a UTC timestamp.
pub fn timestamp_to_utc(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

/// Midnight of `now`'s local calendar day, as UTC.
pub fn start_of_local_day(now: DateTime<Local>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_hms_opt(0, 0, 0).unwrap_or_default();
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        // Midnight falls in a DST gap in a few zones; treat it as UTC there.
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

impl Snapshot {
    /// Case-insensitive substring match on the file name.
    pub fn search_by_name(&self, needle: &str) -> Vec<&FileRecord> {
        let needle = needle.to_lowercase();
        self.records
            .iter()
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn find_by_extension(&self, ext: &str) -> Vec<&FileRecord> {
        let ext = normalize_extension(ext);
        self.records.iter().filter(|r| r.extension == ext).collect()
    }

    /// Union of [`find_by_extension`](Self::find_by_extension) over `exts`,
    /// in snapshot order.
    pub fn find_by_type<S: AsRef<str>>(&self, exts: &[S]) -> Vec<&FileRecord> {
        let wanted: Vec<String> = exts.iter().map(|e| normalize_extension(e.as_ref())).collect();
        self.records
            .iter()
            .filter(|r| wanted.contains(&r.extension))
            .collect()
    }

    /// The `n` most recently modified files, newest first. Ties keep
    /// snapshot order.
    pub fn recent(&self, n: usize) -> Vec<&FileRecord> {
        let mut sorted: Vec<&FileRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| b.modified.cmp(&a.modified));
        sorted.truncate(n);
        sorted
    }

    /// Files modified strictly after `after`.
    pub fn modified_after(&self, after: DateTime<Utc>) -> Vec<&FileRecord> {
        self.records.iter().filter(|r| r.modified > after).collect()
    }

    /// Files modified since local midnight of `now`.
    pub fn modified_since_day_start(&self, now: DateTime<Local>) -> Vec<&FileRecord> {
        self.modified_after(start_of_local_day(now))
    }

    pub fn modified_today(&self) -> Vec<&FileRecord> {
        self.modified_since_day_start(Local::now())
    }

    /// Files of at least `min_mb` MiB.
    pub fn large_files(&self, min_mb: f64) -> Vec<&FileRecord> {
        let threshold = min_mb * MIB;
        self.records
            .iter()
            .filter(|r| r.size as f64 >= threshold)
            .collect()
    }

    /// Files of at most `max_kb` KiB.
    pub fn small_files(&self, max_kb: f64) -> Vec<&FileRecord> {
        let threshold = max_kb * KIB;
        self.records
            .iter()
            .filter(|r| r.size as f64 <= threshold)
            .collect()
    }

    /// Files anywhere below `folder` (a canonical path).
    pub fn files_in_folder(&self, folder: &Path) -> Vec<&FileRecord> {
        self.records.iter().filter(|r| r.is_within(folder)).collect()
    }

    /// Groups in first-seen extension order, files in snapshot order.
    pub fn group_by_extension(&self) -> Vec<ExtensionGroup<'_>> {
        let mut groups: Vec<ExtensionGroup<'_>> = Vec::new();
        let mut slots: HashMap<&str, usize> = HashMap::new();
        for record in &self.records {
            let slot = *slots.entry(record.extension.as_str()).or_insert_with(|| {
                groups.push(ExtensionGroup {
                    extension: record.extension.as_str(),
                    count: 0,
                    files: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].count += 1;
            groups[slot].files.push(record);
        }
        groups
    }

    /// The `n` most common extensions. Equal counts rank by first appearance
    /// in the snapshot.
    pub fn top_extensions(&self, n: usize) -> Vec<ExtensionCount> {
        let mut counts: Vec<ExtensionCount> = self
            .group_by_extension()
            .into_iter()
            .map(|g| ExtensionCount {
                extension: g.extension.to_string(),
                count: g.count,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts.truncate(n);
        counts
    }

    pub fn summary(&self) -> IndexSummary {
        IndexSummary {
            generation: self.generation,
            files: self.len(),
            total_bytes: self.total_bytes(),
            skipped: self.skipped,
            roots: self.roots.clone(),
            built_at: self.built_at,
        }
    }
}
