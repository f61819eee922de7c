use shotdiff_common::{FileMetadata, Vfs, VfsError};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Local filesystem VFS implementation
///
/// Paths are joined onto `root`. With an empty root (the default) paths are
/// used exactly as given, and absolute paths always resolve to themselves.
#[derive(Debug)]
pub struct LocalVfs {
    instance_id: String,
    root: PathBuf,
}

impl LocalVfs {
    pub fn new(root: PathBuf) -> Self {
        let instance_id = format!("local:{}", root.display());
        Self { instance_id, root }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl Default for LocalVfs {
    fn default() -> Self {
        Self::new(PathBuf::new())
    }
}

impl Vfs for LocalVfs {
    fn instance_id(&self) -> &str {
        &self.instance_id
    }

    fn metadata(&self, path: &Path) -> Result<FileMetadata, VfsError> {
        let full_path = self.resolve(path);
        let meta = fs::metadata(&full_path).map_err(|e| map_io_error(e, &full_path))?;

        Ok(FileMetadata {
            is_dir: meta.is_dir(),
        })
    }

    fn open_file(&self, path: &Path) -> Result<Box<dyn Read + Send>, VfsError> {
        let full_path = self.resolve(path);

        if !full_path.is_file() {
            return Err(VfsError::NotAFile(full_path.display().to_string()));
        }

        let file = fs::File::open(&full_path).map_err(|e| map_io_error(e, &full_path))?;
        Ok(Box::new(file))
    }

    fn remove_file(&self, path: &Path) -> Result<(), VfsError> {
        let full_path = self.resolve(path);
        fs::remove_file(&full_path).map_err(|e| map_io_error(e, &full_path))?;
        Ok(())
    }

    fn create_file(&self, path: &Path) -> Result<Box<dyn Write + Send>, VfsError> {
        let full_path = self.resolve(path);

        // Ensure parent directory exists
        if let Some(parent) = full_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = fs::File::create(&full_path).map_err(|e| map_io_error(e, &full_path))?;
        Ok(Box::new(file))
    }

    /// Writes into a temp file in the target's directory and renames it over
    /// the target. The temp file is uniquely named and removed on failure.
    fn persist_file(&self, path: &Path, content: &[u8]) -> Result<(), VfsError> {
        let full_path = self.resolve(path);
        let parent = match full_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.exists() {
            fs::create_dir_all(&parent)?;
        }

        let mut temp = NamedTempFile::new_in(&parent).map_err(|e| map_io_error(e, &parent))?;
        temp.write_all(content)?;
        temp.flush()?;
        temp.persist(&full_path).map_err(|e| map_io_error(e.error, &full_path))?;
        Ok(())
    }
}

fn map_io_error(error: std::io::Error, path: &Path) -> VfsError {
    match error.kind() {
        std::io::ErrorKind::NotFound => VfsError::NotFound(path.display().to_string()),
        std::io::ErrorKind::PermissionDenied => {
            VfsError::PermissionDenied(path.display().to_string())
        }
        _ => VfsError::Io(error),
    }
}
