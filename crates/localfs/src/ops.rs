//! Guarded filesystem mutations and reads.
//!
//! Every operation is a single filesystem step. Paths go through the
//! [`RootGuard`] before anything touches the disk: files that are read or
//! copied with [`resolve`](RootGuard::resolve), entries that are deleted,
//! moved, or renamed with [`resolve_entry`](RootGuard::resolve_entry) so a
//! symlink is acted on as a link and never through to its target, and
//! destinations that may not exist yet with
//! [`resolve_for_create`](RootGuard::resolve_for_create). Nothing here updates
//! the index; callers refresh when they want the changes to show up in
//! queries.

use std::fs::Metadata;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info};

use crate::error::{EntryKind, FsError, Result};
use crate::guard::RootGuard;

/// Default byte budget for [`read_file`].
pub const DEFAULT_READ_MAX_BYTES: usize = 5000;

#[derive(Debug, Clone, Serialize)]
pub struct ReadOutcome {
    pub path: PathBuf,
    pub content: String,
    pub bytes_read: usize,
    pub total_bytes: u64,
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteAction {
    Created,
    Overwritten,
    Appended,
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteOutcome {
    pub path: PathBuf,
    pub action: WriteAction,
    pub bytes_written: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveOutcome {
    pub path: PathBuf,
    pub kind: EntryKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct FolderOutcome {
    pub path: PathBuf,
    /// False when the folder already existed.
    pub created: bool,
}

/// Result of a move, copy, or rename.
#[derive(Debug, Clone, Serialize)]
pub struct TransferOutcome {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Whether an existing file at the destination was replaced.
    pub replaced: bool,
}

/// Read up to `max_bytes` from the start of a file as text.
///
/// Invalid UTF-8 is replaced lossily. When the cut lands inside a multi-byte
/// character, the partial character is dropped rather than mangled.
pub async fn read_file(
    guard: &RootGuard,
    path: impl AsRef<Path>,
    max_bytes: usize,
) -> Result<ReadOutcome> {
    let path = guard.resolve(path)?;
    let meta = require_file(&path).await?;

    let file = fs::File::open(&path)
        .await
        .map_err(|e| FsError::from_io(&path, e))?;
    let mut buf = Vec::with_capacity(max_bytes.min(meta.len() as usize));
    file.take(max_bytes as u64)
        .read_to_end(&mut buf)
        .await
        .map_err(|e| FsError::from_io(&path, e))?;

    let truncated = (buf.len() as u64) < meta.len();
    let text = if truncated {
        trim_partial_char(&buf)
    } else {
        &buf[..]
    };
    Ok(ReadOutcome {
        content: String::from_utf8_lossy(text).into_owned(),
        bytes_read: text.len(),
        total_bytes: meta.len(),
        truncated,
        path,
    })
}

/// Write `content` to a file.
///
/// An existing file is appended to when `append` is set (even if `overwrite`
/// is set too), replaced when only `overwrite` is set, and left untouched with
/// [`FsError::AlreadyExists`] otherwise. A missing file is created either way.
pub async fn write_file(
    guard: &RootGuard,
    path: impl AsRef<Path>,
    content: &str,
    overwrite: bool,
    append: bool,
) -> Result<WriteOutcome> {
    let path = guard.resolve_for_create(path)?;
    require_parent_dir(&path).await?;

    let action = match existing(&path).await? {
        Some(meta) if meta.is_dir() => {
            return Err(FsError::wrong_type(path, EntryKind::File, EntryKind::Directory));
        }
        Some(_) if append => {
            append_bytes(&path, content).await?;
            WriteAction::Appended
        }
        Some(_) if overwrite => {
            fs::write(&path, content)
                .await
                .map_err(|e| FsError::from_io(&path, e))?;
            WriteAction::Overwritten
        }
        Some(_) => return Err(FsError::AlreadyExists(path)),
        None => {
            // create_new closes the gap between the existence check and the open.
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
                .map_err(|e| FsError::from_io(&path, e))?;
            file.write_all(content.as_bytes())
                .await
                .map_err(|e| FsError::from_io(&path, e))?;
            file.flush().await.map_err(|e| FsError::from_io(&path, e))?;
            WriteAction::Created
        }
    };

    info!("{:?} {} ({} bytes)", action, path.display(), content.len());
    Ok(WriteOutcome {
        path,
        action,
        bytes_written: content.len(),
    })
}

/// Append to a file, creating it if absent.
pub async fn append_to_file(
    guard: &RootGuard,
    path: impl AsRef<Path>,
    content: &str,
) -> Result<WriteOutcome> {
    let path = guard.resolve_for_create(path)?;
    require_parent_dir(&path).await?;

    let action = match existing(&path).await? {
        Some(meta) if meta.is_dir() => {
            return Err(FsError::wrong_type(path, EntryKind::File, EntryKind::Directory));
        }
        Some(_) => WriteAction::Appended,
        None => WriteAction::Created,
    };
    append_bytes(&path, content).await?;

    info!("Appended {} bytes to {}", content.len(), path.display());
    Ok(WriteOutcome {
        path,
        action,
        bytes_written: content.len(),
    })
}

/// Delete a file. A symlink is unlinked; its target is left alone.
pub async fn delete_file(guard: &RootGuard, path: impl AsRef<Path>) -> Result<RemoveOutcome> {
    let path = guard.resolve_entry(path)?;
    let kind = EntryKind::of(&require_file_or_link(&path).await?);
    fs::remove_file(&path)
        .await
        .map_err(|e| FsError::from_io(&path, e))?;
    info!("Deleted {} {}", kind, path.display());
    Ok(RemoveOutcome { path, kind })
}

/// Recursively delete a folder. The configured roots themselves are off
/// limits, and a symlink to a directory is refused rather than emptied.
pub async fn delete_folder(guard: &RootGuard, path: impl AsRef<Path>) -> Result<RemoveOutcome> {
    let path = guard.resolve_entry(path)?;
    if guard.is_root(&path) {
        return Err(FsError::AccessDenied(path));
    }
    let meta = entry_metadata(&path).await?;
    if !meta.is_dir() {
        return Err(FsError::wrong_type(
            path,
            EntryKind::Directory,
            EntryKind::of(&meta),
        ));
    }
    fs::remove_dir_all(&path)
        .await
        .map_err(|e| FsError::from_io(&path, e))?;
    info!("Deleted folder {}", path.display());
    Ok(RemoveOutcome {
        path,
        kind: EntryKind::Directory,
    })
}

/// Create a folder and any missing parents. Succeeds if it already exists.
pub async fn create_folder(guard: &RootGuard, path: impl AsRef<Path>) -> Result<FolderOutcome> {
    let path = guard.resolve_for_create(path)?;
    match existing(&path).await? {
        Some(meta) if meta.is_dir() => Ok(FolderOutcome {
            path,
            created: false,
        }),
        Some(meta) => Err(FsError::wrong_type(
            path,
            EntryKind::Directory,
            EntryKind::of(&meta),
        )),
        None => {
            fs::create_dir_all(&path)
                .await
                .map_err(|e| FsError::from_io(&path, e))?;
            info!("Created folder {}", path.display());
            Ok(FolderOutcome {
                path,
                created: true,
            })
        }
    }
}

/// Move a file. If `dst` is an existing directory the file moves into it
/// under its current name. A symlink source moves as a link.
pub async fn move_file(
    guard: &RootGuard,
    src: impl AsRef<Path>,
    dst: impl AsRef<Path>,
    overwrite: bool,
) -> Result<TransferOutcome> {
    let source = guard.resolve_entry(src)?;
    let meta = require_file_or_link(&source).await?;
    let (destination, replaced) =
        transfer_target(guard, &source, dst.as_ref(), overwrite).await?;

    match fs::rename(&source, &destination).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices && meta.is_file() => {
            debug!("Rename across devices, copying {}", source.display());
            copy_preserving_mtime(&source, &destination, &meta).await?;
            fs::remove_file(&source)
                .await
                .map_err(|e| FsError::from_io(&source, e))?;
        }
        Err(e) => return Err(FsError::from_io(&source, e)),
    }

    info!("Moved {} -> {}", source.display(), destination.display());
    Ok(TransferOutcome {
        source,
        destination,
        replaced,
    })
}

/// Copy a file, keeping its modification time. Directory targets work as in
/// [`move_file`].
pub async fn copy_file(
    guard: &RootGuard,
    src: impl AsRef<Path>,
    dst: impl AsRef<Path>,
    overwrite: bool,
) -> Result<TransferOutcome> {
    let source = guard.resolve(src)?;
    let meta = require_file(&source).await?;
    let (destination, replaced) =
        transfer_target(guard, &source, dst.as_ref(), overwrite).await?;

    if replaced && entry_metadata(&destination).await?.file_type().is_symlink() {
        // fs::copy writes through a link; replace the link instead.
        fs::remove_file(&destination)
            .await
            .map_err(|e| FsError::from_io(&destination, e))?;
    }
    copy_preserving_mtime(&source, &destination, &meta).await?;

    info!("Copied {} -> {}", source.display(), destination.display());
    Ok(TransferOutcome {
        source,
        destination,
        replaced,
    })
}

/// Rename a file, folder, or symlink within its parent directory.
pub async fn rename_file(
    guard: &RootGuard,
    path: impl AsRef<Path>,
    new_name: &str,
    overwrite: bool,
) -> Result<TransferOutcome> {
    validate_file_name(new_name)?;
    let source = guard.resolve_entry(path)?;
    if guard.is_root(&source) {
        return Err(FsError::AccessDenied(source));
    }
    let source_meta = entry_metadata(&source).await?;
    let Some(parent) = source.parent() else {
        return Err(FsError::AccessDenied(source));
    };
    // The parent is canonical and inside a root; a bare name keeps it there.
    let destination = parent.join(new_name);
    if destination == source {
        return Err(FsError::InvalidArgument(format!(
            "'{new_name}' is already the current name"
        )));
    }

    let replaced = match existing_entry(&destination).await? {
        Some(_) if !overwrite => return Err(FsError::OverwriteDenied(destination)),
        Some(meta) if meta.is_dir() != source_meta.is_dir() => {
            return Err(FsError::wrong_type(
                destination,
                EntryKind::of(&source_meta),
                EntryKind::of(&meta),
            ));
        }
        Some(_) => true,
        None => false,
    };

    fs::rename(&source, &destination)
        .await
        .map_err(|e| FsError::from_io(&source, e))?;
    info!("Renamed {} -> {}", source.display(), destination.display());
    Ok(TransferOutcome {
        source,
        destination,
        replaced,
    })
}

// ── Helpers ────────────────────────────────────────────────────────

/// Metadata if the path exists, `None` if it does not.
async fn existing(path: &Path) -> Result<Option<Metadata>> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(FsError::from_io(path, e)),
    }
}

/// Like [`existing`] but describes a symlink itself.
async fn existing_entry(path: &Path) -> Result<Option<Metadata>> {
    match fs::symlink_metadata(path).await {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(FsError::from_io(path, e)),
    }
}

async fn entry_metadata(path: &Path) -> Result<Metadata> {
    fs::symlink_metadata(path)
        .await
        .map_err(|e| FsError::from_io(path, e))
}

async fn require_file_or_link(path: &Path) -> Result<Metadata> {
    let meta = entry_metadata(path).await?;
    if meta.is_file() || meta.file_type().is_symlink() {
        Ok(meta)
    } else {
        Err(FsError::wrong_type(path, EntryKind::File, EntryKind::of(&meta)))
    }
}

async fn require_file(path: &Path) -> Result<Metadata> {
    let meta = fs::metadata(path)
        .await
        .map_err(|e| FsError::from_io(path, e))?;
    if meta.is_file() {
        Ok(meta)
    } else {
        Err(FsError::wrong_type(path, EntryKind::File, EntryKind::of(&meta)))
    }
}

async fn require_dir(path: &Path) -> Result<Metadata> {
    let meta = fs::metadata(path)
        .await
        .map_err(|e| FsError::from_io(path, e))?;
    if meta.is_dir() {
        Ok(meta)
    } else {
        Err(FsError::wrong_type(path, EntryKind::Directory, EntryKind::of(&meta)))
    }
}

async fn require_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) => require_dir(parent).await.map(|_| ()),
        None => Err(FsError::InvalidArgument(format!(
            "{} has no parent directory",
            path.display()
        ))),
    }
}

async fn append_bytes(path: &Path, content: &str) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .await
        .map_err(|e| FsError::from_io(path, e))?;
    file.write_all(content.as_bytes())
        .await
        .map_err(|e| FsError::from_io(path, e))?;
    file.flush().await.map_err(|e| FsError::from_io(path, e))
}

/// Work out where a move or copy of `source` lands and whether it replaces
/// something.
async fn transfer_target(
    guard: &RootGuard,
    source: &Path,
    dst: &Path,
    overwrite: bool,
) -> Result<(PathBuf, bool)> {
    let mut target = match guard.resolve_entry(dst) {
        Ok(entry) => entry,
        Err(FsError::NotFound(_)) => guard.resolve_for_create(dst)?,
        Err(e) => return Err(e),
    };
    if let Some(meta) = existing(&target).await?
        && meta.is_dir()
    {
        let Some(name) = source.file_name() else {
            return Err(FsError::InvalidArgument(format!(
                "{} has no file name",
                source.display()
            )));
        };
        target = guard.resolve(&target)?.join(name);
    }

    if target == source {
        return Err(FsError::InvalidArgument(
            "source and destination are the same file".into(),
        ));
    }
    require_parent_dir(&target).await?;

    let replaced = match existing_entry(&target).await? {
        Some(meta) if meta.is_dir() => {
            return Err(FsError::wrong_type(target, EntryKind::File, EntryKind::Directory));
        }
        Some(_) if !overwrite => return Err(FsError::OverwriteDenied(target)),
        Some(_) => true,
        None => false,
    };
    Ok((target, replaced))
}

async fn copy_preserving_mtime(source: &Path, target: &Path, meta: &Metadata) -> Result<()> {
    fs::copy(source, target)
        .await
        .map_err(|e| FsError::from_io(source, e))?;
    let Ok(modified) = meta.modified() else {
        return Ok(());
    };
    set_modified(target.to_path_buf(), modified).await
}

async fn set_modified(path: PathBuf, modified: SystemTime) -> Result<()> {
    tokio::task::spawn_blocking(move || {
        std::fs::File::options()
            .write(true)
            .open(&path)
            .and_then(|file| file.set_modified(modified))
            .map_err(|e| FsError::from_io(&path, e))
    })
    .await
    .map_err(FsError::worker)?
}

/// A bare file name: one normal component, no separators.
fn validate_file_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if name.is_empty() || name.chars().any(std::path::is_separator) || !single_normal {
        return Err(FsError::InvalidArgument(format!(
            "'{name}' is not a bare file name"
        )));
    }
    Ok(())
}

/// Drop an incomplete UTF-8 sequence from the end of `bytes`.
fn trim_partial_char(bytes: &[u8]) -> &[u8] {
    let len = bytes.len();
    for back in 1..=len.min(4) {
        let byte = bytes[len - back];
        if byte & 0xC0 == 0x80 {
            continue;
        }
        let width = match byte {
            0x00..=0x7F => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if width > back { &bytes[..len - back] } else { bytes };
    }
    bytes
}
