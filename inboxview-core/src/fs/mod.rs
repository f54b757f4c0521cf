//! Capability-scoped virtual filesystem
//!
//! The core never touches ambient filesystem paths. Everything it reads is
//! reached through a [`DirectoryCapability`] granted by the host, which can
//! only list its own immediate children. Paths inside the archive are
//! resolved by walking those capabilities one segment at a time.
//!
//! ## Not found vs. unreadable
//!
//! Traversal distinguishes two outcomes that look alike to a naive caller:
//!
//! - `Ok(None)`: the path legitimately does not exist (a segment is absent,
//!   or a file sits where a directory was expected)
//! - `Err(_)`: the capability was revoked or the host hit an I/O fault
//!
//! Only the second is fatal for a browsing session.

mod local;

pub use local::{Grant, LocalDirectory, LocalFile};

use crate::error::Result;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a directory capability.
pub type DirHandle = Arc<dyn DirectoryCapability>;

/// Shared handle to a file capability.
pub type FileHandle = Arc<dyn FileCapability>;

/// Read access to one file.
pub trait FileCapability: Send + Sync + fmt::Debug {
    /// File name within its parent directory
    fn name(&self) -> &str;

    /// Read the full byte content of the file.
    fn read(&self) -> Result<Vec<u8>>;
}

/// Listing access to one directory subtree.
pub trait DirectoryCapability: Send + Sync + fmt::Debug {
    /// Directory name within its parent (or the granted folder's own name)
    fn name(&self) -> &str;

    /// List immediate children, ordered by name.
    fn entries(&self) -> Result<Vec<Entry>>;

    /// Look up a single immediate child by exact name.
    ///
    /// The default implementation scans [`Self::entries`]; implementations
    /// backed by a real filesystem can do a direct lookup instead.
    fn child(&self, name: &str) -> Result<Option<Entry>> {
        Ok(self.entries()?.into_iter().find(|entry| entry.name() == name))
    }
}

/// A child of a directory capability.
#[derive(Debug, Clone)]
pub enum Entry {
    Directory(DirHandle),
    File(FileHandle),
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::Directory(dir) => dir.name(),
            Entry::File(file) => file.name(),
        }
    }

    pub fn into_directory(self) -> Option<DirHandle> {
        match self {
            Entry::Directory(dir) => Some(dir),
            Entry::File(_) => None,
        }
    }

    pub fn into_file(self) -> Option<FileHandle> {
        match self {
            Entry::File(file) => Some(file),
            Entry::Directory(_) => None,
        }
    }
}

/// Split an archive-relative path into its non-empty segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Resolve a slash-separated relative path to a file under `root`.
///
/// Every segment but the last must name a directory; the last must name a
/// file. Returns `Ok(None)` when any of that fails to hold, including for a
/// path with no segments at all.
pub fn resolve(root: &dyn DirectoryCapability, path: &str) -> Result<Option<FileHandle>> {
    let parts: Vec<&str> = segments(path).collect();
    let Some((last, parents)) = parts.split_last() else {
        return Ok(None);
    };

    let mut current: Option<DirHandle> = None;
    for segment in parents {
        let next = {
            let dir: &dyn DirectoryCapability = match &current {
                Some(dir) => dir.as_ref(),
                None => root,
            };
            dir.child(segment)?
        };

        match next {
            Some(Entry::Directory(dir)) => current = Some(dir),
            Some(Entry::File(_)) | None => {
                tracing::trace!(path, segment, "Path segment is not a directory");
                return Ok(None);
            }
        }
    }

    let dir: &dyn DirectoryCapability = match &current {
        Some(dir) => dir.as_ref(),
        None => root,
    };
    Ok(dir.child(last)?.and_then(Entry::into_file))
}

/// Resolve a slash-separated relative path to a directory under `root`.
///
/// An empty path resolves to `root` itself.
pub fn resolve_dir(root: &DirHandle, path: &str) -> Result<Option<DirHandle>> {
    let mut current = Arc::clone(root);
    for segment in segments(path) {
        match current.child(segment)? {
            Some(Entry::Directory(dir)) => current = dir,
            Some(Entry::File(_)) | None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Immediate child directories of `dir`, ordered by name.
pub fn subdirectories(dir: &dyn DirectoryCapability) -> Result<Vec<DirHandle>> {
    Ok(dir
        .entries()?
        .into_iter()
        .filter_map(Entry::into_directory)
        .collect())
}
