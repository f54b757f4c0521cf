//! Ingestion of conversation folders
//!
//! This module turns the folders under the conversations root into
//! normalized [`Conversation`] records.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌────────────────────┐     ┌──────────────────────┐
//! │ inbox/<folder>/ │ ──► │ ConversationLoader │ ──► │ ConversationSummary  │
//! │ message_N.json  │     │                    │     │ Conversation         │
//! └─────────────────┘     └────────────────────┘     └──────────────────────┘
//!                               │
//!                               ▼
//!                    ┌──────────────────────┐
//!                    │  ConversationPart    │
//!                    │  (decode + repair)   │
//!                    └──────────────────────┘
//! ```
//!
//! ## Failure isolation
//!
//! A folder whose parts cannot be decoded fails with
//! [`Error::MalformedArchive`] and only that conversation is affected:
//! [`ConversationLoader::list_summaries`] records it as skipped and moves
//! on. Revoked capabilities and I/O faults are fatal and always propagate.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use inboxview_core::ingest::ConversationLoader;
//!
//! let loader = ConversationLoader::default();
//! let index = loader.list_summaries(&inbox)?;
//! for summary in index.sorted() {
//!     println!("{} ({})", summary.title, summary.dir_name);
//! }
//! let conversation = loader.load_full(&inbox, &index.summaries[0].dir_name)?;
//! ```

mod part;

pub use part::{ConversationPart, PartHeader};

use crate::config::ArchiveConfig;
use crate::error::{Error, Result};
use crate::fs::{self, DirHandle, Entry, FileHandle};
use crate::types::{Conversation, ConversationSummary, Participant};
use std::collections::{HashMap, HashSet};

/// A conversation folder that could not be listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedConversation {
    pub dir_name: String,
    pub reason: String,
}

/// Result of listing every conversation under a conversations root.
#[derive(Debug, Default)]
pub struct ConversationIndex {
    /// Summaries of readable conversations, in folder-name order
    pub summaries: Vec<ConversationSummary>,
    /// Folders that were skipped because they are malformed
    pub skipped: Vec<SkippedConversation>,
}

impl ConversationIndex {
    /// Summaries ordered most recent first.
    pub fn sorted(&self) -> Vec<ConversationSummary> {
        search(&self.summaries, "")
    }
}

/// Lazily computed summaries, one per conversation folder.
///
/// The folder list is read once, up front; each call to `next` reads the
/// first part file of one folder. Not restartable.
pub struct Summaries<'a> {
    loader: &'a ConversationLoader,
    folders: std::vec::IntoIter<DirHandle>,
}

impl Iterator for Summaries<'_> {
    type Item = Result<ConversationSummary>;

    fn next(&mut self) -> Option<Self::Item> {
        let folder = self.folders.next()?;
        Some(self.loader.summarize(&folder))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.folders.size_hint()
    }
}

/// Loads conversations from a conversations root.
///
/// The loader holds only naming conventions; every call reads from the
/// capability it is given and returns freshly built values.
#[derive(Debug, Clone, Default)]
pub struct ConversationLoader {
    archive: ArchiveConfig,
}

impl ConversationLoader {
    pub fn new(config: &ArchiveConfig) -> Self {
        Self {
            archive: config.clone(),
        }
    }

    /// Enumerate conversation folders and summarize them lazily.
    pub fn summaries(&self, root: &DirHandle) -> Result<Summaries<'_>> {
        let folders = fs::subdirectories(root.as_ref())?;
        tracing::debug!(count = folders.len(), "Enumerated conversation folders");
        Ok(Summaries {
            loader: self,
            folders: folders.into_iter(),
        })
    }

    /// Summarize every conversation, skipping malformed folders.
    pub fn list_summaries(&self, root: &DirHandle) -> Result<ConversationIndex> {
        let mut index = ConversationIndex::default();

        for outcome in self.summaries(root)? {
            match outcome {
                Ok(summary) => index.summaries.push(summary),
                Err(Error::MalformedArchive { dir, message }) => {
                    tracing::warn!(dir = %dir, reason = %message, "Skipping conversation");
                    index.skipped.push(SkippedConversation {
                        dir_name: dir,
                        reason: message,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            conversations = index.summaries.len(),
            skipped = index.skipped.len(),
            "Conversation index built"
        );
        Ok(index)
    }

    /// Summarize one folder from its first part file.
    pub fn summarize(&self, folder: &DirHandle) -> Result<ConversationSummary> {
        let dir_name = folder.name();
        let first_name = self.archive.part_file_name(1);
        let first = folder
            .child(&first_name)?
            .and_then(Entry::into_file)
            .ok_or_else(|| Error::malformed(dir_name, format!("{first_name} is missing")))?;

        let header = PartHeader::from_slice(dir_name, &first_name, &first.read()?)?;
        Ok(ConversationSummary {
            dir_name: dir_name.to_string(),
            title: header.title,
            last_sent: header.last_sent,
        })
    }

    /// Load and merge every part of the conversation in folder `dir_name`.
    pub fn load_full(&self, root: &DirHandle, dir_name: &str) -> Result<Conversation> {
        let folder = root
            .child(dir_name)?
            .and_then(Entry::into_directory)
            .ok_or_else(|| Error::ConversationNotFound(dir_name.to_string()))?;
        self.load_folder(&folder)
    }

    /// Load and merge every part of the conversation in `folder`.
    pub fn load_folder(&self, folder: &DirHandle) -> Result<Conversation> {
        let dir_name = folder.name();
        let parts = self.part_files(folder)?;
        if parts.is_empty() {
            return Err(Error::malformed(
                dir_name,
                format!("{} is missing", self.archive.part_file_name(1)),
            ));
        }

        let mut title: Option<String> = None;
        let mut participants: Vec<Participant> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut messages = Vec::new();

        for file in &parts {
            let part = ConversationPart::from_slice(dir_name, file.name(), &file.read()?)?;

            title.get_or_insert(part.title);
            for participant in part.participants {
                if seen.insert(participant.name.clone()) {
                    participants.push(participant);
                }
            }
            messages.extend(part.messages);
        }

        // Parts are not guaranteed to be ordered relative to each other
        messages.sort_by_key(|m| m.timestamp_ms);
        let last_sent = messages.last().map(|m| m.timestamp_ms).unwrap_or(0);

        tracing::debug!(
            dir = dir_name,
            parts = parts.len(),
            messages = messages.len(),
            participants = participants.len(),
            "Loaded conversation"
        );

        Ok(Conversation {
            dir_name: dir_name.to_string(),
            title: title.unwrap_or_default(),
            participants,
            messages,
            last_sent,
        })
    }

    /// Part files of a folder, in order, stopping at the first missing index.
    fn part_files(&self, folder: &DirHandle) -> Result<Vec<FileHandle>> {
        let mut files: HashMap<String, FileHandle> = folder
            .entries()?
            .into_iter()
            .filter_map(Entry::into_file)
            .map(|file| (file.name().to_string(), file))
            .collect();

        let mut parts = Vec::new();
        while let Some(file) = files.remove(&self.archive.part_file_name(parts.len() + 1)) {
            parts.push(file);
        }

        let stranded: Vec<usize> = files
            .keys()
            .filter_map(|name| self.part_index(name))
            .collect();
        if !stranded.is_empty() {
            tracing::warn!(
                dir = folder.name(),
                contiguous = parts.len(),
                ignored = ?stranded,
                "Ignoring part files after a gap in numbering"
            );
        }

        Ok(parts)
    }

    /// Index of a part file name such as `message_3.json`.
    fn part_index(&self, name: &str) -> Option<usize> {
        name.strip_prefix(&self.archive.part_prefix)?
            .strip_suffix(".json")?
            .parse()
            .ok()
    }
}

/// Order summaries most recent first and keep those matching `query`.
///
/// Matching is a plain substring test on title or folder name; an empty
/// query keeps everything.
pub fn search(summaries: &[ConversationSummary], query: &str) -> Vec<ConversationSummary> {
    let mut found: Vec<ConversationSummary> = summaries
        .iter()
        .filter(|s| s.matches(query))
        .cloned()
        .collect();
    found.sort_by(|a, b| {
        b.last_sent
            .cmp(&a.last_sent)
            .then_with(|| a.dir_name.cmp(&b.dir_name))
    });
    found
}
