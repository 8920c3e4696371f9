//! Native filesystem implementation.
//!
//! Only available on non-WASM targets.

use std::fs;
use std::io::Result;
use std::path::Path;

use super::FileSystem;

/// Maps straight onto `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        fs::write(path, content)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_nested_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("players");
        RealFileSystem.create_dir_all(&nested).unwrap();
        RealFileSystem
            .write_file(&nested.join("Thorne.md"), "# Thorne\n")
            .unwrap();

        assert!(RealFileSystem.is_dir(&nested));
        assert!(!RealFileSystem.is_dir(&nested.join("Thorne.md")));
        assert_eq!(
            fs::read_to_string(nested.join("Thorne.md")).unwrap(),
            "# Thorne\n"
        );
    }
}
