//! Locating the conversations root inside a granted folder
//!
//! Users grant whatever folder they think holds their export: the export
//! root, the `messages` folder inside it, the inbox itself, or a wrapper
//! folder around all of that. The locator searches breadth-first, a bounded
//! number of levels deep, for a folder whose name matches the configured
//! label (`inbox` by default, compared case-insensitively).

use crate::config::ArchiveConfig;
use crate::error::Result;
use crate::fs::{self, DirHandle};
use crate::repair::repair;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;

/// Relative location of the owner's profile within an export root.
const PROFILE_PATH: &str = "profile_information/profile_information.json";

/// Where the pieces of an archive live.
#[derive(Debug, Clone)]
pub struct ArchiveLayout {
    /// Folder holding one subfolder per conversation
    pub conversations_root: DirHandle,
    /// Folder that attachment URIs are relative to, once their prefix is stripped
    pub attachments_root: DirHandle,
    /// Leading part of attachment URIs that `attachments_root` stands for
    pub attachment_prefix: String,
}

/// Finds the conversations root of an archive.
#[derive(Debug, Clone)]
pub struct ArchiveLocator {
    label: String,
    max_depth: usize,
    attachment_prefix: String,
}

impl Default for ArchiveLocator {
    fn default() -> Self {
        Self::new(&ArchiveConfig::default())
    }
}

impl ArchiveLocator {
    pub fn new(config: &ArchiveConfig) -> Self {
        Self {
            label: config.conversations_label.clone(),
            max_depth: config.max_search_depth,
            attachment_prefix: config.attachment_prefix.clone(),
        }
    }

    fn is_target(&self, dir: &DirHandle) -> bool {
        dir.name().eq_ignore_ascii_case(&self.label)
    }

    /// Find the conversations root.
    ///
    /// Returns `Ok(None)` when nothing matches within the depth bound, which
    /// means the granted folder is not an archive. Errors are only returned
    /// when the granted folder itself cannot be read.
    pub fn find_root(&self, granted: &DirHandle) -> Result<Option<DirHandle>> {
        Ok(self.locate(granted)?.map(|layout| layout.conversations_root))
    }

    /// Find the conversations root along with the attachments root.
    ///
    /// The attachments root is the parent of the conversations root, which
    /// attachment URIs address as `messages/`. When the conversations root
    /// was granted directly its parent is out of reach, so the inbox itself
    /// is used and URIs must also drop their `inbox/` segment.
    pub fn locate(&self, granted: &DirHandle) -> Result<Option<ArchiveLayout>> {
        if self.is_target(granted) {
            tracing::debug!(name = granted.name(), "Granted folder is the conversations root");
            return Ok(Some(ArchiveLayout {
                conversations_root: Arc::clone(granted),
                attachments_root: Arc::clone(granted),
                attachment_prefix: format!("{}{}/", self.attachment_prefix, self.label),
            }));
        }

        // (directory, its parent, depth below the granted folder)
        let mut queue: VecDeque<(DirHandle, DirHandle, usize)> = VecDeque::new();
        for child in fs::subdirectories(granted.as_ref())? {
            queue.push_back((child, Arc::clone(granted), 1));
        }

        while let Some((dir, parent, depth)) = queue.pop_front() {
            if self.is_target(&dir) {
                tracing::debug!(name = dir.name(), depth, "Found conversations root");
                return Ok(Some(ArchiveLayout {
                    conversations_root: dir,
                    attachments_root: parent,
                    attachment_prefix: self.attachment_prefix.clone(),
                }));
            }

            if depth < self.max_depth {
                for child in fs::subdirectories(dir.as_ref())? {
                    queue.push_back((child, Arc::clone(&dir), depth + 1));
                }
            }
        }

        tracing::info!(
            granted = granted.name(),
            label = %self.label,
            max_depth = self.max_depth,
            "No conversations root found"
        );
        Ok(None)
    }

    /// Display name of the archive owner, if the export includes a profile.
    ///
    /// Looks for the profile file at the same nesting levels the
    /// conversations root may sit at. A missing or undecodable profile is
    /// not an error.
    pub fn owner_name(&self, granted: &DirHandle) -> Result<Option<String>> {
        let mut level = vec![Arc::clone(granted)];
        for depth in 0..=self.max_depth {
            let mut next = Vec::new();
            for dir in &level {
                if let Some(file) = fs::resolve(dir.as_ref(), PROFILE_PATH)? {
                    let bytes = file.read()?;
                    return Ok(parse_owner_name(&bytes));
                }
                if depth < self.max_depth {
                    next.extend(fs::subdirectories(dir.as_ref())?);
                }
            }
            level = next;
        }
        Ok(None)
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawProfileFile {
    profile: Option<RawProfile>,
    profile_v2: Option<RawProfile>,
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    name: RawProfileName,
}

#[derive(Debug, Deserialize)]
struct RawProfileName {
    full_name: String,
}

fn parse_owner_name(bytes: &[u8]) -> Option<String> {
    let raw: RawProfileFile = match serde_json::from_slice(bytes) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "Could not decode profile information");
            return None;
        }
    };

    raw.profile
        .or(raw.profile_v2)
        .map(|profile| repair(&profile.name.full_name))
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalDirectory;
    use std::fs as stdfs;
    use std::path::Path;
    use tempfile::TempDir;

    fn open(path: &Path) -> DirHandle {
        LocalDirectory::open(path).unwrap().into_handle()
    }

    #[test]
    fn test_granted_folder_is_inbox() {
        let temp = TempDir::new().unwrap();
        stdfs::create_dir_all(temp.path().join("inbox/alice_1")).unwrap();

        let root = ArchiveLocator::default()
            .find_root(&open(&temp.path().join("inbox")))
            .unwrap()
            .unwrap();
        assert_eq!(root.name(), "inbox");
    }

    #[test]
    fn test_inbox_nested_in_export() {
        let temp = TempDir::new().unwrap();
        stdfs::create_dir_all(temp.path().join("export/messages/inbox/alice_1")).unwrap();
        stdfs::create_dir_all(temp.path().join("export/photos")).unwrap();

        let layout = ArchiveLocator::default()
            .locate(&open(temp.path()))
            .unwrap()
            .unwrap();
        assert_eq!(layout.conversations_root.name(), "inbox");
        assert_eq!(layout.attachments_root.name(), "messages");
    }

    #[test]
    fn test_attachment_prefix_follows_layout() {
        let temp = TempDir::new().unwrap();
        stdfs::create_dir_all(temp.path().join("messages/inbox/alice_1")).unwrap();
        let locator = ArchiveLocator::default();

        let nested = locator.locate(&open(temp.path())).unwrap().unwrap();
        assert_eq!(nested.attachment_prefix, "messages/");

        let direct = locator
            .locate(&open(&temp.path().join("messages/inbox")))
            .unwrap()
            .unwrap();
        assert_eq!(direct.attachments_root.name(), "inbox");
        assert_eq!(direct.attachment_prefix, "messages/inbox/");
    }

    #[test]
    fn test_label_is_case_insensitive() {
        let temp = TempDir::new().unwrap();
        stdfs::create_dir_all(temp.path().join("messages/Inbox")).unwrap();

        let root = ArchiveLocator::default()
            .find_root(&open(temp.path()))
            .unwrap()
            .unwrap();
        assert_eq!(root.name(), "Inbox");
    }

    #[test]
    fn test_breadth_first_prefers_shallow_match() {
        let temp = TempDir::new().unwrap();
        stdfs::create_dir_all(temp.path().join("a/b/inbox")).unwrap();
        stdfs::create_dir_all(temp.path().join("z/inbox")).unwrap();

        let layout = ArchiveLocator::default()
            .locate(&open(temp.path()))
            .unwrap()
            .unwrap();
        assert_eq!(layout.attachments_root.name(), "z");
    }

    #[test]
    fn test_depth_bound() {
        let temp = TempDir::new().unwrap();
        stdfs::create_dir_all(temp.path().join("a/b/c/inbox")).unwrap();
        let locator = ArchiveLocator::default();
        assert!(locator.find_root(&open(temp.path())).unwrap().is_none());

        stdfs::create_dir_all(temp.path().join("x/y/inbox")).unwrap();
        assert!(locator.find_root(&open(temp.path())).unwrap().is_some());
    }

    #[test]
    fn test_file_named_inbox_is_ignored() {
        let temp = TempDir::new().unwrap();
        stdfs::write(temp.path().join("inbox"), b"not a folder").unwrap();
        assert!(ArchiveLocator::default()
            .find_root(&open(temp.path()))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_owner_name_from_nested_profile() {
        let temp = TempDir::new().unwrap();
        let profile_dir = temp.path().join("export/profile_information");
        stdfs::create_dir_all(&profile_dir).unwrap();
        stdfs::write(
            profile_dir.join("profile_information.json"),
            r#"{"profile": {"name": {"full_name": "ZoÃ« Smith"}}}"#,
        )
        .unwrap();

        let name = ArchiveLocator::default()
            .owner_name(&open(temp.path()))
            .unwrap();
        assert_eq!(name.as_deref(), Some("Zoë Smith"));
    }

    #[test]
    fn test_owner_name_v2_and_missing() {
        let temp = TempDir::new().unwrap();
        let locator = ArchiveLocator::default();
        assert!(locator.owner_name(&open(temp.path())).unwrap().is_none());

        let profile_dir = temp.path().join("profile_information");
        stdfs::create_dir_all(&profile_dir).unwrap();
        stdfs::write(
            profile_dir.join("profile_information.json"),
            r#"{"profile_v2": {"name": {"full_name": "Bob"}}}"#,
        )
        .unwrap();
        assert_eq!(
            locator.owner_name(&open(temp.path())).unwrap().as_deref(),
            Some("Bob")
        );
    }

    #[test]
    fn test_owner_name_garbage_profile() {
        let temp = TempDir::new().unwrap();
        let profile_dir = temp.path().join("profile_information");
        stdfs::create_dir_all(&profile_dir).unwrap();
        stdfs::write(profile_dir.join("profile_information.json"), b"{ nope").unwrap();
        assert!(ArchiveLocator::default()
            .owner_name(&open(temp.path()))
            .unwrap()
            .is_none());
    }
}
