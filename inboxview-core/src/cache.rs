//! Caller-owned caches for a browsing session
//!
//! The core itself never remembers anything between calls. A presentation
//! layer that wants to avoid reloading a conversation, or to return to the
//! same place in it, keeps one of these objects for the session.

use crate::error::Result;
use crate::fs::DirHandle;
use crate::ingest::ConversationLoader;
use crate::types::Conversation;
use std::collections::HashMap;
use std::sync::Arc;

/// Loaded conversations keyed by folder name.
#[derive(Debug, Default)]
pub struct ConversationCache {
    entries: HashMap<String, Arc<Conversation>>,
}

impl ConversationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dir_name: &str) -> Option<Arc<Conversation>> {
        self.entries.get(dir_name).cloned()
    }

    /// Return the cached conversation, loading it on first access.
    ///
    /// Failed loads are not cached.
    pub fn get_or_load(
        &mut self,
        loader: &ConversationLoader,
        root: &DirHandle,
        dir_name: &str,
    ) -> Result<Arc<Conversation>> {
        if let Some(conversation) = self.entries.get(dir_name) {
            return Ok(Arc::clone(conversation));
        }

        let conversation = Arc::new(loader.load_full(root, dir_name)?);
        self.entries
            .insert(dir_name.to_string(), Arc::clone(&conversation));
        Ok(conversation)
    }

    pub fn insert(&mut self, conversation: Conversation) -> Arc<Conversation> {
        let conversation = Arc::new(conversation);
        self.entries
            .insert(conversation.dir_name.clone(), Arc::clone(&conversation));
        conversation
    }

    pub fn invalidate(&mut self, dir_name: &str) -> bool {
        self.entries.remove(dir_name).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Last viewed burst index per conversation.
#[derive(Debug, Default, Clone)]
pub struct ScrollPositions {
    positions: HashMap<String, usize>,
}

impl ScrollPositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dir_name: &str) -> Option<usize> {
        self.positions.get(dir_name).copied()
    }

    pub fn set(&mut self, dir_name: impl Into<String>, burst_index: usize) {
        self.positions.insert(dir_name.into(), burst_index);
    }

    /// Saved position clamped to `burst_count`, or the last burst when none
    /// was saved. Returns 0 for a conversation without bursts.
    pub fn position_or_last(&self, dir_name: &str, burst_count: usize) -> usize {
        let last = burst_count.saturating_sub(1);
        self.get(dir_name).map_or(last, |pos| pos.min(last))
    }

    pub fn forget(&mut self, dir_name: &str) {
        self.positions.remove(dir_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::fs::LocalDirectory;
    use tempfile::TempDir;

    const PART: &str = r#"{"title": "Alice", "participants": [{"name": "Alice"}],
        "messages": [{"sender_name": "Alice", "timestamp_ms": 1, "content": "hi"}]}"#;

    #[test]
    fn test_get_or_load_caches() {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("alice_1");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("message_1.json"), PART).unwrap();
        let root = LocalDirectory::open(temp.path()).unwrap().into_handle();

        let loader = ConversationLoader::default();
        let mut cache = ConversationCache::new();
        let first = cache.get_or_load(&loader, &root, "alice_1").unwrap();

        // Served from the cache even after the folder is gone
        std::fs::remove_dir_all(&folder).unwrap();
        let second = cache.get_or_load(&loader, &root, "alice_1").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        assert!(cache.invalidate("alice_1"));
        let err = cache.get_or_load(&loader, &root, "alice_1").unwrap_err();
        assert!(matches!(err, Error::ConversationNotFound(_)));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_and_clear() {
        let mut cache = ConversationCache::new();
        cache.insert(Conversation {
            dir_name: "bob_2".to_string(),
            title: "Bob".to_string(),
            participants: Vec::new(),
            messages: Vec::new(),
            last_sent: 0,
        });
        assert_eq!(cache.get("bob_2").unwrap().title, "Bob");
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.get("bob_2").is_none());
    }

    #[test]
    fn test_scroll_positions() {
        let mut positions = ScrollPositions::new();
        assert_eq!(positions.position_or_last("a", 10), 9);
        assert_eq!(positions.position_or_last("a", 0), 0);

        positions.set("a", 4);
        assert_eq!(positions.position_or_last("a", 10), 4);
        // Clamped when the conversation shrank
        assert_eq!(positions.position_or_last("a", 3), 2);

        positions.forget("a");
        assert_eq!(positions.get("a"), None);
    }
}
