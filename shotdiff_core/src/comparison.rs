use crate::cache_bust::{decorate_with_cache_bust, CacheBust};
use crate::text_diff::{LineStats, TextDiffEngine};
use crate::vfs::LocalVfs;
use serde::Serialize;
use shotdiff_common::{
    AppConfig, ComparisonTargets, DiffSettings, Result, ShotDiffError, Vfs, VfsError,
    DEFAULT_CACHE_BUST_PARAM,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One of the three files taking part in a comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    path: PathBuf,
    url_path: String,
    exists: bool,
    cache_bust: Option<CacheBust>,
}

impl FileDescriptor {
    fn new(path: PathBuf, url_path: String) -> Self {
        Self {
            path,
            url_path,
            exists: false,
            cache_bust: None,
        }
    }

    /// Whether the file was on disk after the last `process` call
    pub fn is_existing(&self) -> bool {
        self.exists
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url_path(&self) -> &str {
        &self.url_path
    }

    pub fn cache_bust(&self) -> Option<&CacheBust> {
        self.cache_bust.as_ref()
    }

    /// URL with `?bust=<token>` appended when the file is fresh, bare otherwise
    pub fn uri_with_cache_bust(&self) -> String {
        decorate_with_cache_bust(&self.url_path, self.cache_bust.as_ref())
    }

    fn report(&self) -> FileReport {
        FileReport {
            path: self.path.to_string_lossy().to_string(),
            url: self.url_path.clone(),
            exists: self.exists,
            url_with_cache_bust: self.uri_with_cache_bust(),
        }
    }
}

/// Settings applied to a single comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonOptions {
    pub diff: DiffSettings,
    pub cache_bust_param: String,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            diff: DiffSettings::default(),
            cache_bust_param: DEFAULT_CACHE_BUST_PARAM.to_string(),
        }
    }
}

impl From<&AppConfig> for ComparisonOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            diff: config.diff.clone(),
            cache_bust_param: config.cache_bust_param.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub url: String,
    pub exists: bool,
    pub url_with_cache_bust: String,
}

/// Serializable snapshot of a processed comparison
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub difference: f64,
    pub stats: LineStats,
    pub actual: FileReport,
    pub original: FileReport,
    pub diff: FileReport,
}

/// Compares a freshly generated text file with its accepted original.
///
/// `process` reads both inputs (a missing file counts as empty), computes the
/// difference ratio, writes a unified diff when they differ and removes a
/// stale one when they do not. Afterwards the three [`FileDescriptor`]s report
/// existence and cache-busted URLs.
pub struct TextFileComparison {
    vfs: Box<dyn Vfs>,
    options: ComparisonOptions,
    actual: FileDescriptor,
    original: FileDescriptor,
    diff: FileDescriptor,
    difference: f64,
    stats: LineStats,
}

impl TextFileComparison {
    pub fn new(targets: ComparisonTargets) -> Result<Self> {
        targets.validate()?;

        Ok(Self {
            vfs: Box::new(LocalVfs::default()),
            options: ComparisonOptions::default(),
            actual: FileDescriptor::new(targets.actual_path, targets.actual_url),
            original: FileDescriptor::new(targets.original_path, targets.original_url),
            diff: FileDescriptor::new(targets.diff_path, targets.diff_url),
            difference: 0.0,
            stats: LineStats::default(),
        })
    }

    pub fn with_vfs(mut self, vfs: Box<dyn Vfs>) -> Self {
        self.vfs = vfs;
        self
    }

    pub fn with_options(mut self, options: ComparisonOptions) -> Self {
        self.options = options;
        self
    }

    pub fn process(&mut self) -> Result<()> {
        debug!(
            "Comparing {} against {} using {}",
            self.actual.path.display(),
            self.original.path.display(),
            self.vfs.instance_id()
        );

        let actual_content = self.read_optional(&self.actual.path)?;
        let original_content = self.read_optional(&self.original.path)?;

        let engine = TextDiffEngine::with_settings(self.options.diff.clone());
        let comparison = engine.compare_text(
            original_content.as_deref().unwrap_or(""),
            actual_content.as_deref().unwrap_or(""),
        );
        debug!(
            "Line stats: {} equal, {} inserted, {} deleted",
            comparison.stats.equal, comparison.stats.inserted, comparison.stats.deleted
        );

        let diff_bust = match &comparison.unified {
            Some(unified) => {
                self.write_atomic(&self.diff.path, unified.as_bytes())?;
                info!(
                    "Wrote diff {} (difference {:.3})",
                    self.diff.path.display(),
                    comparison.difference
                );
                Some(self.bust_for(unified.as_bytes()))
            }
            None => {
                self.remove_stale_diff()?;
                None
            }
        };

        self.actual.exists = self.exists_now(&self.actual.path)?;
        self.original.exists = self.exists_now(&self.original.path)?;
        self.diff.exists = self.exists_now(&self.diff.path)?;

        self.actual.cache_bust = self.content_bust(self.actual.exists, actual_content.as_deref());
        self.original.cache_bust =
            self.content_bust(self.original.exists, original_content.as_deref());
        self.diff.cache_bust = diff_bust.filter(|_| self.diff.exists);

        self.difference = comparison.difference;
        self.stats = comparison.stats;

        info!(
            "Compared {}: difference {:.3}",
            self.actual.path.display(),
            self.difference
        );
        Ok(())
    }

    /// Normalized difference in `[0, 1]`; 0 until `process` has run
    pub fn difference(&self) -> f64 {
        self.difference
    }

    pub fn stats(&self) -> &LineStats {
        &self.stats
    }

    pub fn file_actual(&self) -> &FileDescriptor {
        &self.actual
    }

    pub fn file_original(&self) -> &FileDescriptor {
        &self.original
    }

    pub fn file_diff(&self) -> &FileDescriptor {
        &self.diff
    }

    pub fn report(&self) -> ComparisonReport {
        ComparisonReport {
            difference: self.difference,
            stats: self.stats,
            actual: self.actual.report(),
            original: self.original.report(),
            diff: self.diff.report(),
        }
    }

    /// Missing files read as `None`; present but unreadable files are errors.
    ///
    /// Only a not-found answer from the VFS counts as missing. A failure to
    /// even look at the path is a read error, never an empty input.
    fn read_optional(&self, path: &Path) -> Result<Option<String>> {
        let read_error = |source| ShotDiffError::Read {
            path: path.to_path_buf(),
            source,
        };

        let meta = match self.vfs.try_metadata(path).map_err(read_error)? {
            Some(meta) => meta,
            None => {
                debug!("{} does not exist, comparing as empty", path.display());
                return Ok(None);
            }
        };
        if meta.is_dir {
            return Err(read_error(VfsError::NotAFile(path.display().to_string())));
        }

        self.vfs.read_to_string(path).map(Some).map_err(read_error)
    }

    fn exists_now(&self, path: &Path) -> Result<bool> {
        self.vfs
            .try_exists(path)
            .map_err(|source| ShotDiffError::Read {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Replace the diff artifact in one step; nothing else on disk is touched.
    fn write_atomic(&self, path: &Path, content: &[u8]) -> Result<()> {
        self.vfs
            .persist_file(path, content)
            .map_err(|source| ShotDiffError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    fn remove_stale_diff(&self) -> Result<()> {
        let write_error = |source| ShotDiffError::Write {
            path: self.diff.path.clone(),
            source,
        };

        if !self.vfs.try_exists(&self.diff.path).map_err(write_error)? {
            return Ok(());
        }

        self.vfs.remove_file(&self.diff.path).map_err(write_error)?;
        warn!("Removed stale diff {}", self.diff.path.display());
        Ok(())
    }

    fn content_bust(&self, exists: bool, content: Option<&str>) -> Option<CacheBust> {
        exists.then(|| self.bust_for(content.unwrap_or("").as_bytes()))
    }

    fn bust_for(&self, content: &[u8]) -> CacheBust {
        CacheBust::for_content(self.options.cache_bust_param.clone(), content)
    }
}
