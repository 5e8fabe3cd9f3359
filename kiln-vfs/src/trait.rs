//! VirtualFileSystem trait definition

use crate::error::VfsResult;
use std::path::Path;
use std::vec::Vec;

/// Virtual File System trait
///
/// Provides a unified interface for file operations, decoupling the module
/// store from specific file system implementations.
///
/// # Implementations
/// - `MemoryFileSystem`: In-memory file system
/// - `NativeFileSystem`: Native OS file system
pub trait VirtualFileSystem: Send + Sync {
    /// Read file contents
    ///
    /// # Returns
    /// File contents as bytes, or `VfsError::NotFound` if the file is missing
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Write file contents
    ///
    /// Creates the file if it doesn't exist, truncates it if it does.
    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()>;

    /// Create a directory and all missing parents
    fn create_dir_all(&self, path: &Path) -> VfsResult<()>;

    /// Atomically move `from` to `to`, replacing `to` if it exists
    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()>;

    /// Remove a file
    fn remove_file(&self, path: &Path) -> VfsResult<()>;

    /// Check if path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Check if path is a directory
    fn is_dir(&self, path: &Path) -> bool;
}
