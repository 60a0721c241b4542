//! Path helpers shared by discovery, config matching and reporting
//!
//! Matching is done on a normalized form (lowercase, forward slashes) so
//! that exclude rules and per-folder overrides written on one OS keep
//! working on another.

use std::path::Path;

/// Normalize a path for comparisons (lowercase, forward slashes, trimmed)
pub fn normalize_for_lookup(path: &str) -> String {
    path.to_lowercase()
        .replace('\\', "/")
        .trim_matches('/')
        .to_string()
}

/// Normalized form of a filesystem path
pub fn normalize_path(path: &Path) -> String {
    normalize_for_lookup(&path.to_string_lossy())
}

/// Case-insensitive substring match of any pattern against a path
///
/// Patterns are normalized the same way as paths, so `Assets\Plugins` and
/// `assets/plugins/` both match `Assets/Plugins/foo.png`.
pub fn matches_any(path: &Path, patterns: &[String]) -> bool {
    let normalized = normalize_path(path);
    patterns.iter().any(|pattern| {
        let pattern = normalize_pattern(pattern);
        !pattern.is_empty() && normalized.contains(&pattern)
    })
}

/// Normalize a match pattern without trimming a trailing slash, which
/// anchors the pattern to a directory name
pub fn normalize_pattern(pattern: &str) -> String {
    pattern.to_lowercase().replace('\\', "/")
}

/// Lowercase extension with a leading dot, or empty if there is none
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// File name for progress display, falling back to the full path
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_normalize_for_lookup() {
        assert_eq!(
            normalize_for_lookup("\\Assets\\Textures\\UI.PNG"),
            "assets/textures/ui.png"
        );
        assert_eq!(normalize_for_lookup("/a/b/"), "a/b");
    }

    #[test]
    fn test_matches_any() {
        let path = PathBuf::from("Assets/Plugins/Vendor/icon.png");
        assert!(matches_any(&path, &["assets\\plugins".to_string()]));
        assert!(matches_any(&path, &["PLUGINS/".to_string()]));
        assert!(!matches_any(&path, &["samples".to_string()]));
        assert!(!matches_any(&path, &["".to_string()]));
    }

    #[test]
    fn test_matches_tilde() {
        let path = PathBuf::from("Assets/Backup~/icon.png");
        assert!(matches_any(&path, &["~".to_string()]));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("a/b.PNG")), ".png");
        assert_eq!(extension_of(Path::new("a/b.jpeg")), ".jpeg");
        assert_eq!(extension_of(Path::new("a/noext")), "");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("a/b/c.png")), "c.png");
    }
}
