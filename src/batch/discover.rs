//! Finding image assets on disk

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::paths;
use crate::textures::OutputFormat;

/// Options for [`discover_assets`]
#[derive(Debug, Clone, Default)]
pub struct DiscoverOptions {
    /// Descend into subfolders
    pub recursive: bool,
    /// Case-insensitive substrings of the path relative to the scanned folder
    pub exclude: Vec<String>,
}

/// List image files under `folder` that this build can re-encode
///
/// Only extensions the encoder supports are returned, since an asset we
/// cannot write back is not worth scanning. Unreadable directory entries are
/// logged and skipped. Results are sorted.
pub fn discover_assets(folder: &Path, options: &DiscoverOptions) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        bail!("Not a directory: {}", folder.display());
    }

    let extensions = OutputFormat::available_extensions();
    let max_depth = if options.recursive { usize::MAX } else { 1 };

    let mut files = Vec::new();
    for entry in WalkDir::new(folder).max_depth(max_depth) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let ext = paths::extension_of(path);
        if !extensions.contains(&ext.trim_start_matches('.')) {
            continue;
        }

        // Rules apply below the scanned folder, not to the folder's own path
        let relative = path.strip_prefix(folder).unwrap_or(path);
        if paths::matches_any(relative, &options.exclude) {
            debug!("Excluded: {}", path.display());
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    debug!("Found {} image files in {}", files.len(), folder.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, b"")?;
        Ok(())
    }

    #[test]
    fn test_top_level_only() -> Result<()> {
        let dir = tempdir()?;
        touch(&dir.path().join("a.png"))?;
        touch(&dir.path().join("b.JPG"))?;
        touch(&dir.path().join("notes.txt"))?;
        touch(&dir.path().join("sub/c.jpeg"))?;

        let files = discover_assets(dir.path(), &DiscoverOptions::default())?;
        let names: Vec<_> = files.iter().map(|p| paths::display_name(p)).collect();
        assert_eq!(names, vec!["a.png", "b.JPG"]);
        Ok(())
    }

    #[test]
    fn test_recursive_with_excludes() -> Result<()> {
        let dir = tempdir()?;
        touch(&dir.path().join("a.png"))?;
        touch(&dir.path().join("sub/c.jpeg"))?;
        touch(&dir.path().join("Plugins/vendor.png"))?;
        touch(&dir.path().join("backup~/old.png"))?;

        let options = DiscoverOptions {
            recursive: true,
            exclude: vec!["plugins/".to_string(), "~".to_string()],
        };
        let files = discover_assets(dir.path(), &options)?;
        let names: Vec<_> = files.iter().map(|p| paths::display_name(p)).collect();
        assert_eq!(names, vec!["a.png", "c.jpeg"]);
        Ok(())
    }

    #[test]
    fn test_excludes_ignore_the_folder_itself() -> Result<()> {
        let dir = tempdir()?;
        let folder = dir.path().join("PROJEC~1");
        touch(&folder.join("a.png"))?;
        touch(&folder.join("old~/b.png"))?;

        let options = DiscoverOptions {
            recursive: true,
            exclude: crate::config::ImportSettings::default().exclude,
        };
        let files = discover_assets(&folder, &options)?;
        assert_eq!(files, vec![folder.join("a.png")]);
        Ok(())
    }

    #[test]
    fn test_missing_folder() {
        let result = discover_assets(Path::new("/definitely/not/here"), &DiscoverOptions::default());
        assert!(result.is_err());
    }
}
