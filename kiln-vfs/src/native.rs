//! Native file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::path::{Path, PathBuf};
use std::vec::Vec;

/// A native OS file system implementation.
///
/// This wraps `std::fs` operations and provides the `VirtualFileSystem`
/// interface for local file access. Relative paths are resolved against the
/// optional base directory.
///
/// # Example
/// ```
/// use kiln_vfs::{NativeFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = NativeFileSystem::new();
/// assert!(!fs.exists(Path::new("/definitely/not/here.kmod")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct NativeFileSystem {
    base: Option<PathBuf>,
}

impl NativeFileSystem {
    /// Create a new native file system.
    pub fn new() -> Self {
        Self { base: None }
    }

    /// Create a new native file system with a base directory.
    ///
    /// Relative paths passed to any operation are joined onto `base`;
    /// absolute paths are used as given.
    pub fn with_base(base: &Path) -> Self {
        Self {
            base: Some(base.to_path_buf()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl VirtualFileSystem for NativeFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let path = self.resolve(path);
        std::fs::read(&path).map_err(|e| VfsError::from_io(e, &path))
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let path = self.resolve(path);
        std::fs::write(&path, content).map_err(|e| VfsError::from_io(e, &path))
    }

    fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        let path = self.resolve(path);
        std::fs::create_dir_all(&path).map_err(|e| VfsError::from_io(e, &path))
    }

    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()> {
        let from = self.resolve(from);
        let to = self.resolve(to);
        std::fs::rename(&from, &to).map_err(|e| VfsError::from_io(e, &to))
    }

    fn remove_file(&self, path: &Path) -> VfsResult<()> {
        let path = self.resolve(path);
        std::fs::remove_file(&path).map_err(|e| VfsError::from_io(e, &path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.resolve(path).is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("kiln_vfs_{}_{}", name, std::process::id()))
    }

    #[test]
    fn test_native_read_write() {
        let fs = NativeFileSystem::new();
        let path = temp_path("rw");
        let _ = std::fs::remove_file(&path);

        fs.write_file(&path, b"hello native").unwrap();
        assert_eq!(fs.read_file(&path).unwrap(), b"hello native");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_native_read_nonexistent() {
        let fs = NativeFileSystem::new();
        let path = temp_path("nonexistent");
        let _ = std::fs::remove_file(&path);

        let result = fs.read_file(&path);
        assert!(matches!(result, Err(VfsError::NotFound { .. })));
    }

    #[test]
    fn test_native_create_dir_all_and_rename() {
        let fs = NativeFileSystem::new();
        let root = temp_path("nested");
        let _ = std::fs::remove_dir_all(&root);

        let dir = root.join("com").join("lee");
        fs.create_dir_all(&dir).unwrap();
        assert!(fs.is_dir(&dir));

        let tmp = dir.join("Foo.kmod.tmp");
        let dst = dir.join("Foo.kmod");
        fs.write_file(&tmp, b"first").unwrap();
        fs.rename(&tmp, &dst).unwrap();
        assert!(!fs.exists(&tmp));
        assert_eq!(fs.read_file(&dst).unwrap(), b"first");

        // 覆盖已存在的目标
        fs.write_file(&tmp, b"second").unwrap();
        fs.rename(&tmp, &dst).unwrap();
        assert_eq!(fs.read_file(&dst).unwrap(), b"second");
        assert!(fs.is_file(&dst));

        fs.remove_file(&dst).unwrap();
        assert!(!fs.exists(&dst));

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_native_with_base() {
        let root = temp_path("base");
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(&root).unwrap();

        let fs = NativeFileSystem::with_base(&root);
        fs.write_file(Path::new("relative.bin"), b"abc").unwrap();
        assert!(root.join("relative.bin").is_file());
        assert_eq!(fs.read_file(Path::new("relative.bin")).unwrap(), b"abc");

        std::fs::remove_dir_all(&root).unwrap();
    }
}
