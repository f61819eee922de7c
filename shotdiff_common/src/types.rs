use crate::{Result, ShotDiffError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata for a file or directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub is_dir: bool,
}

/// The three files of one comparison and the public URLs they are served under.
///
/// Field order matches the order callers describe a comparison in:
/// actual, original, diff; filesystem paths first, then URL paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonTargets {
    /// Freshly generated file
    pub actual_path: PathBuf,
    /// Previously accepted baseline
    pub original_path: PathBuf,
    /// Where the unified diff is written when the two differ
    pub diff_path: PathBuf,
    pub actual_url: String,
    pub original_url: String,
    pub diff_url: String,
}

impl ComparisonTargets {
    pub fn new(
        actual_path: impl Into<PathBuf>,
        original_path: impl Into<PathBuf>,
        diff_path: impl Into<PathBuf>,
        actual_url: impl Into<String>,
        original_url: impl Into<String>,
        diff_url: impl Into<String>,
    ) -> Self {
        Self {
            actual_path: actual_path.into(),
            original_path: original_path.into(),
            diff_path: diff_path.into(),
            actual_url: actual_url.into(),
            original_url: original_url.into(),
            diff_url: diff_url.into(),
        }
    }

    /// Reject empty fields. Paths are not checked for existence.
    pub fn validate(&self) -> Result<()> {
        let paths = [
            ("actual_path", &self.actual_path),
            ("original_path", &self.original_path),
            ("diff_path", &self.diff_path),
        ];
        for (name, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(ShotDiffError::Config(format!("{name} must not be empty")));
            }
        }

        let urls = [
            ("actual_url", &self.actual_url),
            ("original_url", &self.original_url),
            ("diff_url", &self.diff_url),
        ];
        for (name, url) in urls {
            if url.trim().is_empty() {
                return Err(ShotDiffError::Config(format!("{name} must not be empty")));
            }
        }

        Ok(())
    }
}

/// Line diff algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffAlgorithm {
    #[default]
    Myers,
    Patience,
}

/// Settings for computing and rendering line diffs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffSettings {
    pub algorithm: DiffAlgorithm,
    /// Unchanged lines shown around each change
    pub context_lines: usize,
    /// Treat CRLF and CR line endings as LF before comparing
    pub normalize_line_endings: bool,
    pub original_label: String,
    pub new_label: String,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            algorithm: DiffAlgorithm::Myers,
            context_lines: 3,
            normalize_line_endings: false,
            original_label: "Original".to_string(),
            new_label: "New".to_string(),
        }
    }
}

/// A named comparison stored in the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonProfile {
    pub name: String,
    #[serde(flatten)]
    pub targets: ComparisonTargets,
}

pub const DEFAULT_CACHE_BUST_PARAM: &str = "bust";

fn default_cache_bust_param() -> String {
    DEFAULT_CACHE_BUST_PARAM.to_string()
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Query parameter used for cache busting (`?bust=...`)
    #[serde(default = "default_cache_bust_param")]
    pub cache_bust_param: String,

    #[serde(default)]
    pub diff: DiffSettings,

    /// Comparisons processed by `shotdiff run`
    #[serde(default)]
    pub comparisons: Vec<ComparisonProfile>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_bust_param: default_cache_bust_param(),
            diff: DiffSettings::default(),
            comparisons: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets() -> ComparisonTargets {
        ComparisonTargets::new(
            "/docs/actual.rst.txt",
            "/docs/original.rst.txt",
            "/docs/diff.txt",
            "/actual.rst.txt",
            "/original.rst.txt",
            "/diff.txt",
        )
    }

    #[test]
    fn test_validate_accepts_complete_targets() {
        assert!(targets().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_path() {
        let mut t = targets();
        t.diff_path = PathBuf::new();
        let err = t.validate().unwrap_err();
        assert!(err.to_string().contains("diff_path"));
    }

    #[test]
    fn test_validate_rejects_blank_url() {
        let mut t = targets();
        t.original_url = "  ".to_string();
        let err = t.validate().unwrap_err();
        assert!(err.to_string().contains("original_url"));
    }

    #[test]
    fn test_app_config_defaults_from_empty_toml() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.cache_bust_param, "bust");
        assert_eq!(config.diff.context_lines, 3);
        assert_eq!(config.diff.original_label, "Original");
    }

    #[test]
    fn test_app_config_parses_comparisons() {
        let data = r#"
cache_bust_param = "v"

[diff]
algorithm = "patience"
context_lines = 1

[[comparisons]]
name = "login"
actual_path = "/a.txt"
original_path = "/o.txt"
diff_path = "/d.txt"
actual_url = "/a.txt"
original_url = "/o.txt"
diff_url = "/d.txt"
"#;
        let config: AppConfig = toml::from_str(data).unwrap();
        assert_eq!(config.cache_bust_param, "v");
        assert_eq!(config.diff.algorithm, DiffAlgorithm::Patience);
        assert_eq!(config.diff.context_lines, 1);
        assert!(!config.diff.normalize_line_endings);
        assert_eq!(config.comparisons.len(), 1);
        assert_eq!(config.comparisons[0].name, "login");
        assert_eq!(config.comparisons[0].targets.diff_path, PathBuf::from("/d.txt"));
    }
}
