//! In-memory file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::string::String;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::vec::Vec;

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
}

/// An in-memory file system implementation.
///
/// Files live in a `BTreeMap` and directories in a `BTreeSet`, which makes
/// it suitable for tests. Clones share the same storage.
///
/// A memory file system can be switched to read-only to simulate permission
/// failures.
///
/// # Example
/// ```
/// use kiln_vfs::{MemoryFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new();
/// fs.write_file(Path::new("/test.txt"), b"hello").unwrap();
/// let content = fs.read_file(Path::new("/test.txt")).unwrap();
/// assert_eq!(content, b"hello");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    state: Arc<RwLock<MemoryState>>,
    read_only: Arc<AtomicBool>,
}

impl MemoryFileSystem {
    /// Create a new empty memory file system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new memory file system pre-populated with files.
    pub fn with_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        let fs = Self::new();
        if let Ok(mut state) = fs.state.write() {
            for (path, content) in files {
                state.files.insert(path.as_ref().replace('\\', "/"), content);
            }
        }
        fs
    }

    /// Reject every mutating operation with `PermissionDenied`
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::Relaxed);
    }

    /// All file paths currently stored, in sorted order
    pub fn file_paths(&self) -> Vec<String> {
        match self.state.read() {
            Ok(state) => state.files.keys().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Normalize a path string for internal storage.
    /// Uses forward slashes consistently for cross-platform compatibility.
    fn normalize_path(&self, path: &Path) -> String {
        let normalized = path.to_string_lossy().replace('\\', "/");
        match normalized.strip_suffix('/') {
            Some(stripped) if !stripped.is_empty() => stripped.to_string(),
            _ => normalized,
        }
    }

    fn check_writable(&self, path: &str) -> VfsResult<()> {
        if self.read_only.load(Ordering::Relaxed) {
            return Err(VfsError::PermissionDenied {
                path: path.to_string(),
            });
        }
        Ok(())
    }

    fn poisoned() -> VfsError {
        VfsError::Io {
            message: String::from("Lock poisoned"),
        }
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let normalized = self.normalize_path(path);
        let state = self.state.read().map_err(|_| Self::poisoned())?;

        state
            .files
            .get(&normalized)
            .cloned()
            .ok_or(VfsError::NotFound { path: normalized })
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let normalized = self.normalize_path(path);
        self.check_writable(&normalized)?;
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        if state.dirs.contains(&normalized) {
            return Err(VfsError::InvalidPath {
                path: normalized,
                reason: String::from("is a directory"),
            });
        }
        state.files.insert(normalized, content.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        let normalized = self.normalize_path(path);
        self.check_writable(&normalized)?;
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;

        let mut current = String::new();
        for (i, segment) in normalized.split('/').enumerate() {
            if i > 0 {
                current.push('/');
            }
            current.push_str(segment);
            if current.is_empty() || current == "/" {
                continue;
            }
            if state.files.contains_key(&current) {
                return Err(VfsError::InvalidPath {
                    path: current,
                    reason: String::from("is a file"),
                });
            }
            state.dirs.insert(current.clone());
        }
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()> {
        let from = self.normalize_path(from);
        let to = self.normalize_path(to);
        self.check_writable(&to)?;
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;

        let content = state
            .files
            .remove(&from)
            .ok_or(VfsError::NotFound { path: from })?;
        state.files.insert(to, content);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> VfsResult<()> {
        let normalized = self.normalize_path(path);
        self.check_writable(&normalized)?;
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        state
            .files
            .remove(&normalized)
            .map(drop)
            .ok_or(VfsError::NotFound { path: normalized })
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let normalized = self.normalize_path(path);
        match self.state.read() {
            Ok(state) => state.files.contains_key(&normalized),
            Err(_) => false,
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        let normalized = self.normalize_path(path);
        match self.state.read() {
            Ok(state) => state.dirs.contains(&normalized),
            Err(_) => false,
        }
    }
}
