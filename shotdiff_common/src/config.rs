use crate::{AppConfig, ShotDiffError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "shotdiff.toml";

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
    pub exists: bool,
}

/// Load configuration, falling back to defaults when no file is present.
///
/// An explicit path always wins. Otherwise a portable `shotdiff.toml` next to
/// the executable is used if it exists, then the platform config directory.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, ShotDiffError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => resolve_config_path()?,
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<LoadedConfig, ShotDiffError> {
    let exists = path.is_file();

    let config = if exists {
        let data = fs::read_to_string(path)?;
        toml::from_str(&data).map_err(|e| ShotDiffError::Serialization(e.to_string()))?
    } else {
        AppConfig::default()
    };

    Ok(LoadedConfig {
        config,
        path: path.to_path_buf(),
        exists,
    })
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ShotDiffError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = toml::to_string_pretty(config)
        .map_err(|e| ShotDiffError::Serialization(e.to_string()))?;
    fs::write(path, data)?;
    Ok(())
}

fn resolve_config_path() -> Result<PathBuf, ShotDiffError> {
    if let Some(portable_path) = portable_config_path() {
        if portable_path.exists() {
            return Ok(portable_path);
        }
    }

    let dirs = ProjectDirs::from("", "", "shotdiff")
        .ok_or_else(|| ShotDiffError::Config("Unable to determine config directory".to_string()))?;
    Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn portable_config_path() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComparisonProfile, ComparisonTargets, DiffAlgorithm};
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_config_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nope.toml");

        let loaded = load_config(Some(&path)).unwrap();
        assert!(!loaded.exists);
        assert_eq!(loaded.path, path);
        assert_eq!(loaded.config, AppConfig::default());
    }

    #[test]
    fn test_save_then_load_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = AppConfig::default();
        config.cache_bust_param = "rev".to_string();
        config.diff.algorithm = DiffAlgorithm::Patience;
        config.comparisons.push(ComparisonProfile {
            name: "install-tool".to_string(),
            targets: ComparisonTargets::new(
                "/out/install.rst.txt",
                "/docs/install.rst.txt",
                "/out/install.diff.txt",
                "/out/install.rst.txt",
                "/docs/install.rst.txt",
                "/out/install.diff.txt",
            ),
        });

        save_config(&path, &config).unwrap();
        let loaded = load_config(Some(&path)).unwrap();

        assert!(loaded.exists);
        assert_eq!(loaded.config, config);
    }

    #[test]
    fn test_load_invalid_config_is_serialization_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "cache_bust_param = [").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ShotDiffError::Serialization(_)));
    }
}
