//! Local-disk capabilities backed by `std::fs`

use super::{DirHandle, DirectoryCapability, Entry, FileCapability};
use crate::error::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Revocation token shared by every handle derived from one grant.
#[derive(Debug, Clone, Default)]
pub struct Grant {
    revoked: Arc<AtomicBool>,
}

impl Grant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke access for every handle sharing this grant.
    pub fn revoke(&self) {
        self.revoked.store(true, Ordering::SeqCst);
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::SeqCst)
    }

    fn check(&self, path: &Path) -> Result<()> {
        if self.is_revoked() {
            return Err(Error::CapabilityRevoked(path.display().to_string()));
        }
        Ok(())
    }
}

/// A directory on local disk, scoped to the subtree it was opened at.
///
/// Symbolic links are never followed, and lookups only ever match names
/// that appear as immediate children, so a handle cannot reach outside its
/// granted subtree.
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    path: PathBuf,
    name: String,
    grant: Grant,
}

impl LocalDirectory {
    /// Open a directory with a fresh grant.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_grant(path, Grant::new())
    }

    /// Open a directory under an existing grant.
    pub fn with_grant(path: impl Into<PathBuf>, grant: Grant) -> Result<Self> {
        let path = path.into();
        let metadata = fs::metadata(&path)?;
        if !metadata.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("{} is not a directory", path.display()),
            )));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self { path, name, grant })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn grant(&self) -> &Grant {
        &self.grant
    }

    pub fn into_handle(self) -> DirHandle {
        Arc::new(self)
    }

    fn make_entry(&self, name: String, file_type: fs::FileType) -> Option<Entry> {
        let path = self.path.join(&name);
        if file_type.is_dir() {
            Some(Entry::Directory(Arc::new(LocalDirectory {
                path,
                name,
                grant: self.grant.clone(),
            })))
        } else if file_type.is_file() {
            Some(Entry::File(Arc::new(LocalFile {
                path,
                name,
                grant: self.grant.clone(),
            })))
        } else {
            None
        }
    }
}

/// Whether `name` can only ever denote an immediate child.
fn is_plain_segment(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(|c| c == '/' || c == '\\')
}

impl DirectoryCapability for LocalDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn entries(&self) -> Result<Vec<Entry>> {
        self.grant.check(&self.path)?;

        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(&self.path)? {
            let dir_entry = dir_entry?;
            // DirEntry::file_type does not follow symlinks
            let file_type = dir_entry.file_type()?;
            let Ok(name) = dir_entry.file_name().into_string() else {
                tracing::debug!(
                    dir = %self.path.display(),
                    "Skipping entry with non UTF-8 name"
                );
                continue;
            };
            if let Some(entry) = self.make_entry(name, file_type) {
                entries.push(entry);
            }
        }

        entries.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(entries)
    }

    fn child(&self, name: &str) -> Result<Option<Entry>> {
        self.grant.check(&self.path)?;

        if !is_plain_segment(name) {
            return Ok(None);
        }

        match fs::symlink_metadata(self.path.join(name)) {
            Ok(metadata) => Ok(self.make_entry(name.to_string(), metadata.file_type())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

/// A file on local disk.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    grant: Grant,
}

impl LocalFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileCapability for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> Result<Vec<u8>> {
        self.grant.check(&self.path)?;
        Ok(fs::read(&self.path)?)
    }
}
