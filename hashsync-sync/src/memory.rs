//! In-memory [`RemoteStore`] for tests and offline runs.
//!
//! Clones share state, so a test can hand one clone to the engine and keep
//! another to inspect the result. Failures can be injected per path.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::sync::{Arc, Mutex, MutexGuard};

use hashsync_core::types::{ancestors, parent};

use crate::remote::{EntryKind, RemoteError, RemoteStore};

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    fail_put: BTreeSet<String>,
    fail_remove: BTreeSet<String>,
    refuse_remove: BTreeSet<String>,
    ops: Vec<String>,
    closed: usize,
}

impl State {
    fn parent_exists(&self, path: &str) -> bool {
        parent(path).map_or(true, |p| self.dirs.contains(p))
    }

    fn has_children(&self, dir: &str) -> bool {
        let prefix = format!("{dir}/");
        self.files.keys().any(|k| k.starts_with(&prefix))
            || self.dirs.iter().any(|d| d.starts_with(&prefix))
    }
}

/// Shared in-memory remote tree. The deploy root is the empty path.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed a file, creating its ancestor directories.
    pub fn with_file(self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        {
            let mut state = self.lock();
            for dir in ancestors(path) {
                state.dirs.insert(dir.to_string());
            }
            state.files.insert(path.to_string(), content.into());
        }
        self
    }

    /// Seed an empty directory and its ancestors.
    pub fn with_dir(self, path: &str) -> Self {
        {
            let mut state = self.lock();
            for dir in ancestors(path) {
                state.dirs.insert(dir.to_string());
            }
            state.dirs.insert(path.to_string());
        }
        self
    }

    /// Make every `put` to `path` fail with a transport error.
    pub fn fail_put_on(self, path: &str) -> Self {
        self.lock().fail_put.insert(path.to_string());
        self
    }

    /// Make `remove_file` / `remove_dir` on `path` fail with a transport error.
    pub fn fail_remove_on(self, path: &str) -> Self {
        self.lock().fail_remove.insert(path.to_string());
        self
    }

    /// Make `remove_file` / `remove_dir` on `path` report "not found" while
    /// leaving the entry in place, like a server folding a refusal into 550.
    pub fn refuse_remove_on(self, path: &str) -> Self {
        self.lock().refuse_remove.insert(path.to_string());
        self
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().files.get(path).cloned()
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.lock().files.contains_key(path)
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.lock().dirs.contains(path)
    }

    pub fn file_paths(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }

    /// Mutating operations in the order they were applied, e.g. `"RMD a/b"`.
    pub fn ops(&self) -> Vec<String> {
        self.lock().ops.clone()
    }

    /// Number of times the session was closed.
    pub fn close_count(&self) -> usize {
        self.lock().closed
    }
}

impl RemoteStore for MemoryStore {
    fn kind_of(&mut self, path: &str) -> Result<EntryKind, RemoteError> {
        let state = self.lock();
        Ok(if state.files.contains_key(path) {
            EntryKind::File
        } else if path.is_empty() || state.dirs.contains(path) {
            EntryKind::Directory
        } else {
            EntryKind::Missing
        })
    }

    fn make_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        let mut state = self.lock();
        if state.dirs.contains(path) || state.files.contains_key(path) {
            return Err(RemoteError::AlreadyExists { path: path.to_string() });
        }
        if !state.parent_exists(path) {
            return Err(RemoteError::NotFound { path: path.to_string() });
        }
        state.dirs.insert(path.to_string());
        state.ops.push(format!("MKD {path}"));
        Ok(())
    }

    fn remove_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        let mut state = self.lock();
        if state.fail_remove.contains(path) {
            return Err(RemoteError::transport(format!("550 permission denied: {path}")));
        }
        if state.refuse_remove.contains(path) {
            return Err(RemoteError::NotFound { path: path.to_string() });
        }
        if !state.dirs.contains(path) {
            return Err(RemoteError::NotFound { path: path.to_string() });
        }
        if state.has_children(path) {
            return Err(RemoteError::NotEmpty { path: path.to_string() });
        }
        state.dirs.remove(path);
        state.ops.push(format!("RMD {path}"));
        Ok(())
    }

    fn remove_file(&mut self, path: &str) -> Result<(), RemoteError> {
        let mut state = self.lock();
        if state.fail_remove.contains(path) {
            return Err(RemoteError::transport(format!("550 permission denied: {path}")));
        }
        if state.refuse_remove.contains(path) {
            return Err(RemoteError::NotFound { path: path.to_string() });
        }
        if state.dirs.contains(path) {
            return Err(RemoteError::transport(format!("550 not a plain file: {path}")));
        }
        if state.files.remove(path).is_none() {
            return Err(RemoteError::NotFound { path: path.to_string() });
        }
        state.ops.push(format!("DELE {path}"));
        Ok(())
    }

    fn list_dir(&mut self, path: &str) -> Result<Vec<String>, RemoteError> {
        let state = self.lock();
        if !path.is_empty() && !state.dirs.contains(path) {
            return Err(RemoteError::NotFound { path: path.to_string() });
        }
        let names = state
            .files
            .keys()
            .chain(state.dirs.iter())
            .filter(|entry| parent(entry).unwrap_or("") == path)
            .filter_map(|entry| entry.rsplit('/').next())
            .map(str::to_string)
            .collect::<BTreeSet<_>>();
        Ok(names.into_iter().collect())
    }

    fn put(&mut self, path: &str, reader: &mut dyn Read) -> Result<u64, RemoteError> {
        let mut state = self.lock();
        if state.fail_put.contains(path) {
            return Err(RemoteError::transport(format!("426 transfer aborted: {path}")));
        }
        if !state.parent_exists(path) {
            return Err(RemoteError::NotFound { path: path.to_string() });
        }
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        let len = buf.len() as u64;
        state.files.insert(path.to_string(), buf);
        state.ops.push(format!("STOR {path}"));
        Ok(len)
    }

    fn get(&mut self, path: &str) -> Result<Vec<u8>, RemoteError> {
        self.lock()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound { path: path.to_string() })
    }

    fn close(&mut self) -> Result<(), RemoteError> {
        self.lock().closed += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_requires_existing_parent() {
        let mut store = MemoryStore::new();
        let err = store.put("a/b.txt", &mut &b"x"[..]).unwrap_err();
        assert!(err.is_not_found());

        store.make_dir("a").unwrap();
        assert_eq!(store.put("a/b.txt", &mut &b"xyz"[..]).unwrap(), 3);
        assert_eq!(store.file("a/b.txt").as_deref(), Some(&b"xyz"[..]));
    }

    #[test]
    fn remove_dir_refuses_non_empty() {
        let mut store = MemoryStore::new().with_file("a/b.txt", "x");
        assert!(matches!(
            store.remove_dir("a").unwrap_err(),
            RemoteError::NotEmpty { .. }
        ));
    }

    #[test]
    fn list_dir_returns_direct_children_only() {
        let mut store = MemoryStore::new()
            .with_file("a/one.txt", "1")
            .with_file("a/sub/two.txt", "2")
            .with_file("top.txt", "t");
        assert_eq!(store.list_dir("a").unwrap(), vec!["one.txt", "sub"]);
        assert_eq!(store.list_dir("").unwrap(), vec!["a", "top.txt"]);
    }

    #[test]
    fn clones_share_state() {
        let observer = MemoryStore::new();
        let mut session = observer.clone();
        session.make_dir("shared").unwrap();
        assert!(observer.has_dir("shared"));
    }
}
