//! Persistence boundary for layer content.

use log::debug;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Named-text-blob persistence used to make layers durable across restarts.
///
/// The core treats this as a synchronous, short-lived collaborator invoked
/// while the manager's write lock is held. File naming within a blob name
/// is the caller's concern; the medium is the implementation's.
pub trait BlobStore: Send + Sync {
    /// Durably write one named blob, replacing any previous contents.
    fn put(&self, name: &str, contents: &str) -> io::Result<()>;
    /// Read every stored blob, sorted by name.
    fn read_all(&self) -> io::Result<Vec<(String, String)>>;
}

/// Blob store backed by a flat directory of text files.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }
}

impl BlobStore for DirStore {
    fn put(&self, name: &str, contents: &str) -> io::Result<()> {
        let path = self.root.join(name);
        debug!("writing blob (path={})", path.display());
        fs::write(path, contents)
    }

    fn read_all(&self) -> io::Result<Vec<(String, String)>> {
        let mut blobs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = match path.file_name().and_then(|name| name.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            let contents = fs::read_to_string(&path)?;
            blobs.push((name, contents));
        }
        blobs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(blobs)
    }
}

/// In-memory blob store for tests and ephemeral daemons, with optional
/// write-failure injection to exercise rollback paths.
#[derive(Default)]
pub struct MemStore {
    blobs: Mutex<BTreeMap<String, String>>,
    fail_puts: AtomicBool,
}

impl MemStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail until reset.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }
}

impl BlobStore for MemStore {
    fn put(&self, name: &str, contents: &str) -> io::Result<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(io::Error::other("injected blob store failure"));
        }
        self.blobs
            .lock()
            .insert(name.to_string(), contents.to_string());
        Ok(())
    }

    fn read_all(&self) -> io::Result<Vec<(String, String)>> {
        Ok(self
            .blobs
            .lock()
            .iter()
            .map(|(name, contents)| (name.clone(), contents.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{BlobStore, DirStore, MemStore};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn dir_store_round_trips_blobs_sorted_by_name() {
        let temp = tempdir().expect("tempdir");
        let store = DirStore::new(temp.path()).expect("store");
        store.put("002-late.yaml", "late").expect("put");
        store.put("001-early.yaml", "early").expect("put");

        let blobs = store.read_all().expect("read");
        assert_eq!(
            blobs,
            vec![
                ("001-early.yaml".to_string(), "early".to_string()),
                ("002-late.yaml".to_string(), "late".to_string()),
            ]
        );
    }

    #[test]
    fn dir_store_overwrites_existing_blob() {
        let temp = tempdir().expect("tempdir");
        let store = DirStore::new(temp.path()).expect("store");
        store.put("001-base.yaml", "first").expect("put");
        store.put("001-base.yaml", "second").expect("put");

        let blobs = store.read_all().expect("read");
        assert_eq!(blobs, vec![("001-base.yaml".to_string(), "second".to_string())]);
    }

    #[test]
    fn mem_store_injects_put_failures() {
        let store = MemStore::new();
        store.put("001-base.yaml", "ok").expect("put");
        store.fail_puts(true);
        assert!(store.put("002-next.yaml", "fails").is_err());
        store.fail_puts(false);

        let blobs = store.read_all().expect("read");
        assert_eq!(blobs.len(), 1);
    }
}
