//! Where assets and their import constraints come from

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{QuadError, QuadResult};
use crate::textures::ImportConstraint;

/// Supplies the max-size clamp an asset will be imported with
pub trait ConstraintSource {
    fn constraint_for(&self, path: &Path) -> Option<ImportConstraint>;
}

/// The same constraint (or none) for every asset
impl ConstraintSource for Option<ImportConstraint> {
    fn constraint_for(&self, _path: &Path) -> Option<ImportConstraint> {
        *self
    }
}

/// Reads and writes asset bytes
pub trait AssetStore {
    fn read(&self, path: &Path) -> QuadResult<Vec<u8>>;

    /// Replace the asset's bytes; must not leave a half-written file behind
    fn write(&self, path: &Path, bytes: &[u8]) -> QuadResult<()>;
}

/// Local filesystem store with atomic replace on write
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl AssetStore for FsStore {
    fn read(&self, path: &Path) -> QuadResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| QuadError::io(path, e))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> QuadResult<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        // Temp file in the same directory so the final rename stays on one filesystem
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| QuadError::io(dir, e))?;
        tmp.write_all(bytes).map_err(|e| QuadError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| QuadError::io(tmp.path(), e))?;
        tmp.persist(path).map_err(|e| QuadError::io(path, e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_uniform_constraint() {
        let none: Option<ImportConstraint> = None;
        assert_eq!(none.constraint_for(Path::new("x.png")), None);

        let some = Some(ImportConstraint::new(256));
        assert_eq!(
            some.constraint_for(Path::new("x.png")),
            Some(ImportConstraint::new(256))
        );
    }

    #[test]
    fn test_fs_store_overwrites() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("a.png");
        std::fs::write(&path, b"old")?;

        FsStore.write(&path, b"new bytes")?;
        assert_eq!(FsStore.read(&path)?, b"new bytes");

        // Only the target file remains, no temp leftovers
        assert_eq!(std::fs::read_dir(dir.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn test_fs_store_read_missing() {
        let err = FsStore.read(Path::new("/nope/missing.png")).unwrap_err();
        assert_eq!(err.kind(), "io");
    }
}
