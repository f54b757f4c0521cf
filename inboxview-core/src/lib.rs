//! # inboxview-core
//!
//! Core library for inboxview - a browser for exported chat archives.
//!
//! This library provides:
//! - A capability-scoped virtual filesystem over the granted archive
//! - Repair of the Latin-1-over-UTF-8 mis-encoding found in exports
//! - Discovery of the conversations root and multi-part conversation loading
//! - Sender bursts, reaction groups and per-conversation statistics
//! - Attachment handles with an explicit release lifecycle
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows in one direction:
//! - **Archive:** JSON part files and media on disk, read only through
//!   [`fs::DirectoryCapability`] handles
//! - **Normalized:** [`ConversationSummary`] for listing and a merged,
//!   repaired [`Conversation`] on demand
//! - **Derived:** [`grouping`] and [`analytics`] views, recomputed from a
//!   conversation whenever they are needed
//!
//! The core holds no state between calls. Caching lives in the
//! caller-owned objects of [`cache`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use inboxview_core::{ArchiveLocator, ConversationLoader, LocalDirectory};
//!
//! let granted = LocalDirectory::open("/path/to/export").unwrap().into_handle();
//! let layout = ArchiveLocator::default()
//!     .locate(&granted)
//!     .expect("archive unreadable")
//!     .expect("not an archive");
//!
//! let loader = ConversationLoader::default();
//! let index = loader.list_summaries(&layout.conversations_root).unwrap();
//! let conversation = loader
//!     .load_full(&layout.conversations_root, &index.summaries[0].dir_name)
//!     .unwrap();
//! println!("{} messages", conversation.messages.len());
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{ConversationStatistics, SenderShare};
pub use attachments::{AttachmentResolver, BinaryHandle, HandlePool};
pub use cache::{ConversationCache, ScrollPositions};
pub use config::Config;
pub use error::{Error, Result};
pub use fs::{DirHandle, DirectoryCapability, FileCapability, FileHandle, Grant, LocalDirectory};
pub use grouping::{group, group_reactions, MessageBurst, ReactionGroup};
pub use ingest::{search, ConversationIndex, ConversationLoader, SkippedConversation};
pub use locator::{ArchiveLayout, ArchiveLocator};
pub use repair::repair;
pub use types::*;

// Public modules
pub mod analytics;
pub mod attachments;
pub mod cache;
pub mod config;
pub mod error;
pub mod fs;
pub mod grouping;
pub mod ingest;
pub mod locator;
pub mod logging;
pub mod repair;
pub mod types;
