//! Import settings
//!
//! Stands in for per-asset importer settings: which max-size clamp applies
//! to which assets, and which paths discovery should ignore. Stored as JSON,
//! by default `quadfit.json` in the scanned folder.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::batch::ConstraintSource;
use crate::paths;
use crate::textures::ImportConstraint;

/// Default settings file name looked up in the scanned folder
pub const SETTINGS_FILE_NAME: &str = "quadfit.json";

/// Paths skipped by default: third-party plugin, sample and editor folders,
/// plus anything with `~` in its path (backup and hidden folders)
pub const DEFAULT_EXCLUDES: [&str; 4] = ["assets/plugins", "assets/samples", "assets/editor", "~"];

/// A max-size rule for assets whose path contains `pattern`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintOverride {
    pub pattern: String,

    /// `None` means matching assets are not clamped at all
    #[serde(default)]
    pub max_size: Option<u32>,
}

/// Import settings for a folder of assets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSettings {
    /// Clamp applied to every asset without a matching override
    #[serde(default)]
    pub default_max_size: Option<u32>,

    /// Checked in order; the first matching pattern wins
    #[serde(default)]
    pub overrides: Vec<ConstraintOverride>,

    /// Case-insensitive path substrings skipped by discovery
    #[serde(default = "default_excludes")]
    pub exclude: Vec<String>,

    /// Folder override patterns are matched relative to
    #[serde(skip)]
    pub root: Option<PathBuf>,
}

fn default_excludes() -> Vec<String> {
    DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect()
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            default_max_size: None,
            overrides: Vec::new(),
            exclude: default_excludes(),
            root: None,
        }
    }
}

impl ImportSettings {
    /// Load and validate a settings file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let settings: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Load `explicit` if given, else `folder/quadfit.json` if it exists,
    /// else defaults; overrides are matched relative to `folder`
    pub fn resolve(explicit: Option<&Path>, folder: &Path) -> Result<Self, ConfigError> {
        let candidate = folder.join(SETTINGS_FILE_NAME);
        let settings = match explicit {
            Some(path) => Self::load(path)?,
            None if candidate.is_file() => {
                tracing::debug!("Using import settings from {}", candidate.display());
                Self::load(&candidate)?
            }
            None => Self::default(),
        };
        Ok(settings.with_root(folder))
    }

    /// Reject zero max sizes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_max_size == Some(0) {
            return Err(ConfigError::InvalidMaxSize {
                pattern: "default_max_size".to_string(),
            });
        }

        if let Some(rule) = self.overrides.iter().find(|o| o.max_size == Some(0)) {
            return Err(ConfigError::InvalidMaxSize {
                pattern: rule.pattern.clone(),
            });
        }

        Ok(())
    }

    /// Match override patterns against paths relative to `root`
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Replace the default clamp, keeping overrides
    pub fn with_default_max_size(mut self, max_size: Option<u32>) -> Self {
        self.default_max_size = max_size;
        self
    }

    /// Drop every clamp (default and overrides)
    pub fn without_constraints(mut self) -> Self {
        self.default_max_size = None;
        self.overrides.clear();
        self
    }
}

impl ConstraintSource for ImportSettings {
    fn constraint_for(&self, path: &Path) -> Option<ImportConstraint> {
        let relative = match &self.root {
            Some(root) => path.strip_prefix(root).unwrap_or(path),
            None => path,
        };
        let normalized = paths::normalize_path(relative);
        let max_size = self
            .overrides
            .iter()
            .find(|o| {
                let pattern = paths::normalize_pattern(&o.pattern);
                !pattern.is_empty() && normalized.contains(&pattern)
            })
            .map(|o| o.max_size)
            .unwrap_or(self.default_max_size);

        // A zero set through the builders skips validate(); treat it as no clamp
        max_size.filter(|&size| size > 0).map(ImportConstraint::new)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read settings {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("max size must be greater than zero ({pattern})")]
    InvalidMaxSize { pattern: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = ImportSettings::default();
        assert_eq!(settings.default_max_size, None);
        assert_eq!(settings.exclude.len(), DEFAULT_EXCLUDES.len());
        assert_eq!(settings.constraint_for(Path::new("a.png")), None);
    }

    #[test]
    fn test_parse_and_match() -> Result<()> {
        let json = r#"{
            "default_max_size": 2048,
            "overrides": [
                { "pattern": "UI\\", "max_size": 512 },
                { "pattern": "raw/", "max_size": null }
            ]
        }"#;
        let settings: ImportSettings = serde_json::from_str(json)?;
        settings.validate()?;

        // Missing exclude list falls back to the defaults
        assert_eq!(settings.exclude, default_excludes());

        assert_eq!(
            settings.constraint_for(Path::new("Assets/ui/button.png")),
            Some(ImportConstraint::new(512))
        );
        assert_eq!(settings.constraint_for(Path::new("Assets/Raw/photo.jpg")), None);
        assert_eq!(
            settings.constraint_for(Path::new("Assets/env/rock.png")),
            Some(ImportConstraint::new(2048))
        );
        Ok(())
    }

    #[test]
    fn test_first_override_wins() {
        let settings = ImportSettings {
            default_max_size: None,
            overrides: vec![
                ConstraintOverride {
                    pattern: "icons".into(),
                    max_size: Some(64),
                },
                ConstraintOverride {
                    pattern: "ui".into(),
                    max_size: Some(256),
                },
            ],
            exclude: Vec::new(),
            root: None,
        };
        assert_eq!(
            settings.constraint_for(Path::new("ui/icons/x.png")),
            Some(ImportConstraint::new(64))
        );
    }

    #[test]
    fn test_zero_max_size_rejected() {
        let settings = ImportSettings::default().with_default_max_size(Some(0));
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidMaxSize { .. })
        ));
    }

    #[test]
    fn test_resolve_from_folder() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(
            ImportSettings::resolve(None, dir.path())?,
            ImportSettings::default().with_root(dir.path())
        );

        let settings = ImportSettings::default().with_default_max_size(Some(1024));
        std::fs::write(
            dir.path().join(SETTINGS_FILE_NAME),
            serde_json::to_string_pretty(&settings)?,
        )?;
        assert_eq!(
            ImportSettings::resolve(None, dir.path())?,
            settings.with_root(dir.path())
        );
        Ok(())
    }

    #[test]
    fn test_overrides_ignore_folders_above_root() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path().join("ui");
        let json = r#"{
            "default_max_size": 2048,
            "overrides": [ { "pattern": "ui/", "max_size": 64 } ]
        }"#;
        std::fs::create_dir_all(&root)?;
        std::fs::write(root.join(SETTINGS_FILE_NAME), json)?;

        let settings = ImportSettings::resolve(None, &root)?;
        assert_eq!(
            settings.constraint_for(&root.join("game/rock.png")),
            Some(ImportConstraint::new(2048))
        );
        assert_eq!(
            settings.constraint_for(&root.join("UI/button.png")),
            Some(ImportConstraint::new(64))
        );
        Ok(())
    }

    #[test]
    fn test_zero_from_builder_means_unconstrained() {
        let settings = ImportSettings::default().with_default_max_size(Some(0));
        assert_eq!(settings.constraint_for(Path::new("a.png")), None);
    }

    #[test]
    fn test_load_reports_parse_errors() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json")?;
        assert!(matches!(
            ImportSettings::load(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            ImportSettings::load(&dir.path().join("missing.json")),
            Err(ConfigError::Read { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_without_constraints() {
        let settings = ImportSettings {
            default_max_size: Some(128),
            overrides: vec![ConstraintOverride {
                pattern: "a".into(),
                max_size: Some(64),
            }],
            exclude: Vec::new(),
            root: None,
        }
        .without_constraints();
        assert_eq!(settings.constraint_for(Path::new("a/b.png")), None);
    }
}
