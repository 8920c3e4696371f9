//! Filesystem abstraction module.
//!
//! This module provides the `FileSystem` trait the exporter writes through,
//! so export output can be checked in memory by tests and written to disk by
//! [`RealFileSystem`] everywhere else.

#[cfg(not(target_arch = "wasm32"))]
mod native;

#[cfg(not(target_arch = "wasm32"))]
pub use native::RealFileSystem;

use std::io::Result;
use std::path::Path;

/// Abstraction over the filesystem operations used by the exporter.
pub trait FileSystem {
    /// Creates or overwrites a file
    fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Creates a directory and all parent directories
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Checks if a path is a directory
    fn is_dir(&self, path: &Path) -> bool;
}

// Blanket implementation for references to FileSystem
impl<T: FileSystem + ?Sized> FileSystem for &T {
    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        (**self).write_file(path, content)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        (**self).create_dir_all(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        (**self).is_dir(path)
    }
}
