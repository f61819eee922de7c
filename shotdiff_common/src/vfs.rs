use crate::{FileMetadata, VfsError};
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

/// Virtual File System trait for abstracting filesystem operations
///
/// Comparisons only ever touch three files: two inputs that are read and one
/// diff artifact that is written or removed. Keeping these operations behind a
/// trait lets callers point a comparison at something other than the local
/// disk (and lets tests inject failures).
pub trait Vfs: Send + Sync {
    /// Uniquely identifies the VFS instance (e.g., "local:/srv/docs")
    fn instance_id(&self) -> &str;

    /// Returns the metadata for a specific path
    fn metadata(&self, path: &Path) -> Result<FileMetadata, VfsError>;

    /// Opens a file for reading (returns a Read trait object)
    fn open_file(&self, path: &Path) -> Result<Box<dyn Read + Send>, VfsError>;

    /// Removes a file
    fn remove_file(&self, path: &Path) -> Result<(), VfsError>;

    /// Metadata for `path`, or `None` when nothing is there.
    ///
    /// Only a not-found condition means absent. Any other failure (permission
    /// denied on a parent directory, I/O faults) is returned as an error.
    fn try_metadata(&self, path: &Path) -> Result<Option<FileMetadata>, VfsError> {
        match self.metadata(path) {
            Ok(meta) => Ok(Some(meta)),
            Err(VfsError::NotFound(_)) => Ok(None),
            Err(VfsError::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Checks if a path exists, see [`Vfs::try_metadata`]
    fn try_exists(&self, path: &Path) -> Result<bool, VfsError> {
        self.try_metadata(path).map(|meta| meta.is_some())
    }

    /// Create a new file and return a writer
    /// Returns Unsupported error if not writable
    fn create_file(&self, _path: &Path) -> Result<Box<dyn Write + Send>, VfsError> {
        Err(VfsError::Unsupported("Write operations not supported".to_string()))
    }

    /// Write file content from bytes
    fn write_file(&self, path: &Path, content: &[u8]) -> Result<(), VfsError> {
        let mut writer = self.create_file(path)?;
        writer.write_all(content).map_err(VfsError::Io)?;
        writer.flush().map_err(VfsError::Io)?;
        Ok(())
    }

    /// Replace `path` with `content` so readers see either the old or the new file.
    ///
    /// The default writes in place; backends that can do better override it.
    fn persist_file(&self, path: &Path, content: &[u8]) -> Result<(), VfsError> {
        self.write_file(path, content)
    }

    /// Read a whole file as UTF-8 text
    ///
    /// Content that is not valid UTF-8 is reported as an `InvalidData` I/O
    /// error rather than being lossily converted.
    fn read_to_string(&self, path: &Path) -> Result<String, VfsError> {
        let mut reader = self.open_file(path)?;
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        String::from_utf8(bytes).map_err(|e| {
            VfsError::Io(std::io::Error::new(ErrorKind::InvalidData, e))
        })
    }
}
