//! Kiln Virtual File System
//!
//! A virtual file system abstraction with two backends. The module writer and
//! loader only ever talk to [`VirtualFileSystem`], so the whole pipeline can run
//! against memory in tests and against disk in production.
//!
//! # Features
//! - `std` (default): Enable standard library support
//!
//! # Usage
//! ```rust,ignore
//! use kiln_vfs::{VirtualFileSystem, MemoryFileSystem};
//! use std::path::Path;
//!
//! let fs = MemoryFileSystem::new();
//! fs.create_dir_all(Path::new("/out/com/lee")).unwrap();
//! fs.write_file(Path::new("/out/com/lee/Foo.kmod.tmp"), b"KILN").unwrap();
//! fs.rename(Path::new("/out/com/lee/Foo.kmod.tmp"), Path::new("/out/com/lee/Foo.kmod")).unwrap();
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

mod error;
mod memory;
mod native;
mod r#trait;

pub use error::{VfsError, VfsResult};
pub use memory::MemoryFileSystem;
pub use native::NativeFileSystem;
pub use r#trait::VirtualFileSystem;

/// Create a new memory-based file system.
pub fn memory_fs() -> MemoryFileSystem {
    MemoryFileSystem::new()
}

/// Create a new native file system.
pub fn native_fs() -> NativeFileSystem {
    NativeFileSystem::new()
}
