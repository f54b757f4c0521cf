//! Attachment resolution and binary handle lifecycle
//!
//! Attachment URIs in the archive look like
//! `messages/inbox/alice_123/photos/cat.jpg`. The resolver strips the
//! configured prefix and walks the rest through the virtual filesystem.
//!
//! A [`BinaryHandle`] owns the loaded bytes until it is released. Callers
//! that show the same media repeatedly can go through a [`HandlePool`],
//! which reuses handles and releases the least recently used one once it
//! holds more than its capacity.

use crate::config::ArchiveConfig;
use crate::error::Result;
use crate::fs::{self, DirectoryCapability};
use crate::locator::ArchiveLayout;
use crate::types::Attachment;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Loaded attachment bytes with an explicit release.
///
/// Clones share the same underlying data; releasing any clone releases
/// them all.
#[derive(Debug, Clone)]
pub struct BinaryHandle {
    inner: Arc<HandleInner>,
}

#[derive(Debug)]
struct HandleInner {
    id: Uuid,
    path: String,
    mime: &'static str,
    bytes: RwLock<Option<Arc<[u8]>>>,
    released: AtomicBool,
}

impl BinaryHandle {
    pub fn new(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        let path = path.into();
        Self {
            inner: Arc::new(HandleInner {
                id: Uuid::new_v4(),
                mime: guess_mime(&path),
                path,
                bytes: RwLock::new(Some(Arc::from(bytes))),
                released: AtomicBool::new(false),
            }),
        }
    }

    /// Unique id of this handle (shared by its clones).
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Archive-relative path the bytes were read from
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    pub fn mime(&self) -> &'static str {
        self.inner.mime
    }

    /// The loaded bytes, or `None` once released.
    pub fn bytes(&self) -> Option<Arc<[u8]>> {
        self.inner
            .bytes
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(Arc::clone))
    }

    pub fn len(&self) -> usize {
        self.bytes().map_or(0, |b| b.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the loaded bytes. Releasing twice is a no-op.
    pub fn release(&self) {
        if self.inner.released.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Ok(mut guard) = self.inner.bytes.write() {
            *guard = None;
        }
        tracing::trace!(id = %self.inner.id, path = %self.inner.path, "Released attachment handle");
    }

    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::SeqCst)
    }
}

/// MIME type from a file extension, for the formats exports contain.
pub fn guess_mime(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "m4a" | "aac" => "audio/aac",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Turns attachment URIs into binary handles.
///
/// The resolver keeps no record of the handles it hands out.
#[derive(Debug, Clone)]
pub struct AttachmentResolver {
    prefix: String,
}

impl Default for AttachmentResolver {
    fn default() -> Self {
        Self::new(&ArchiveConfig::default())
    }
}

impl AttachmentResolver {
    pub fn new(config: &ArchiveConfig) -> Self {
        Self {
            prefix: config.attachment_prefix.clone(),
        }
    }

    /// Resolver for URIs relative to `layout.attachments_root`.
    pub fn for_layout(layout: &ArchiveLayout) -> Self {
        Self {
            prefix: layout.attachment_prefix.clone(),
        }
    }

    /// Path of `attachment` relative to the attachments root.
    ///
    /// The prefix is matched ignoring ASCII case, since the conversations
    /// folder may be named `Inbox` on disk.
    pub fn relative_path<'a>(&self, attachment: &'a Attachment) -> &'a str {
        let uri = attachment.uri.as_str();
        match uri.get(..self.prefix.len()) {
            Some(head) if head.eq_ignore_ascii_case(&self.prefix) => &uri[self.prefix.len()..],
            _ => uri,
        }
    }

    /// Load an attachment from under `root`.
    ///
    /// Returns `Ok(None)` when the file is not in the archive.
    pub fn resolve(
        &self,
        root: &dyn DirectoryCapability,
        attachment: &Attachment,
    ) -> Result<Option<BinaryHandle>> {
        let path = self.relative_path(attachment);
        let Some(file) = fs::resolve(root, path)? else {
            tracing::debug!(uri = %attachment.uri, "Attachment not found in archive");
            return Ok(None);
        };

        let bytes = file.read()?;
        tracing::trace!(path, size = bytes.len(), "Loaded attachment");
        Ok(Some(BinaryHandle::new(path, bytes)))
    }
}

/// Caller-owned pool of live attachment handles, bounded by LRU eviction.
#[derive(Debug)]
pub struct HandlePool {
    resolver: AttachmentResolver,
    capacity: usize,
    handles: HashMap<String, BinaryHandle>,
    // Least recently used at the front
    order: VecDeque<String>,
}

impl HandlePool {
    pub fn new(resolver: AttachmentResolver, capacity: usize) -> Self {
        Self {
            resolver,
            capacity: capacity.max(1),
            handles: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.handles.contains_key(uri)
    }

    /// Return the pooled handle for `attachment`, resolving it if needed.
    pub fn get_or_resolve(
        &mut self,
        root: &dyn DirectoryCapability,
        attachment: &Attachment,
    ) -> Result<Option<BinaryHandle>> {
        if let Some(handle) = self.handles.get(&attachment.uri) {
            let handle = handle.clone();
            self.touch(&attachment.uri);
            return Ok(Some(handle));
        }

        let Some(handle) = self.resolver.resolve(root, attachment)? else {
            return Ok(None);
        };

        self.handles.insert(attachment.uri.clone(), handle.clone());
        self.order.push_back(attachment.uri.clone());
        self.evict();
        Ok(Some(handle))
    }

    /// Release and forget the handle for `uri`, if pooled.
    pub fn release(&mut self, uri: &str) -> bool {
        match self.handles.remove(uri) {
            Some(handle) => {
                handle.release();
                self.order.retain(|k| k != uri);
                true
            }
            None => false,
        }
    }

    /// Release every pooled handle.
    pub fn clear(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.release();
        }
        self.order.clear();
    }

    fn touch(&mut self, uri: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == uri) {
            if let Some(key) = self.order.remove(pos) {
                self.order.push_back(key);
            }
        }
    }

    fn evict(&mut self) {
        while self.handles.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(handle) = self.handles.remove(&oldest) {
                tracing::debug!(uri = %oldest, "Evicting attachment handle");
                handle.release();
            }
        }
    }
}

impl Drop for HandlePool {
    fn drop(&mut self) {
        self.clear();
    }
}
