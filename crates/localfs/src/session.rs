//! One agent session: the root guard plus the index built under it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::Result;
use crate::guard::RootGuard;
use crate::index::{IndexStore, RefreshReport, Snapshot};

/// Shared handle to a session's guard and index.
///
/// Cloning is cheap; every tool holds its own clone. The session is
/// `Send + Sync`, so one refresh can run while any number of queries read the
/// previous snapshot.
#[derive(Debug, Clone)]
pub struct FsSession {
    guard: Arc<RootGuard>,
    store: Arc<IndexStore>,
}

impl FsSession {
    /// Validate `roots` and start with an empty (generation 0) index.
    pub fn new<I, P>(roots: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let guard = Arc::new(RootGuard::new(roots)?);
        info!("Session roots: {:?}", guard.roots());
        let store = Arc::new(IndexStore::new(Arc::clone(&guard)));
        Ok(Self { guard, store })
    }

    pub fn guard(&self) -> &RootGuard {
        &self.guard
    }

    pub fn roots(&self) -> &[PathBuf] {
        self.guard.roots()
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// The current snapshot. Holding it pins that generation.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.current()
    }

    /// Rebuild the index. An empty `roots` slice rescans every root.
    pub async fn refresh<P: AsRef<Path> + Sync>(
        &self,
        roots: &[P],
        cancel: CancellationToken,
    ) -> Result<RefreshReport> {
        self.store.refresh(roots, cancel).await
    }

    /// Rescan whatever the current snapshot covers, or every root before the
    /// first build.
    pub async fn rescan(&self, cancel: CancellationToken) -> Result<RefreshReport> {
        let previous = self.snapshot();
        if previous.generation == 0 {
            self.refresh::<PathBuf>(&[], cancel).await
        } else {
            self.refresh(&previous.roots, cancel).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn rescan_keeps_subfolder_scope() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("top.txt"), "t").unwrap();
        fs::write(dir.path().join("docs/a.txt"), "a").unwrap();

        let session = FsSession::new([dir.path()]).unwrap();
        let docs = session.roots()[0].join("docs");
        let first = session
            .refresh(&[docs.clone()], CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(first.count, 1);

        fs::write(docs.join("b.txt"), "b").unwrap();
        let second = session.rescan(CancellationToken::new()).await.unwrap();
        assert_eq!(second.count, 2);
        assert_eq!(second.roots, vec![docs]);
    }

    #[tokio::test]
    async fn first_rescan_covers_every_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.txt"), "x").unwrap();
        let session = FsSession::new([dir.path()]).unwrap();
        let report = session.rescan(CancellationToken::new()).await.unwrap();
        assert_eq!(report.generation, 1);
        assert_eq!(report.count, 1);
    }

    #[test]
    fn clones_share_the_store() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.txt"), "x").unwrap();
        let session = FsSession::new([dir.path()]).unwrap();
        let clone = session.clone();
        session
            .store()
            .refresh_blocking::<PathBuf>(&[], &CancellationToken::new())
            .unwrap();
        assert_eq!(clone.snapshot().generation, 1);
    }
}
