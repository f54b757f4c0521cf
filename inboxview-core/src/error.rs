//! Error types for inboxview-core

use thiserror::Error;

/// Main error type for the inboxview-core library
///
/// "Not found" is never an error here: lookups that can legitimately miss
/// return `Ok(None)`. What remains splits into two classes, see
/// [`Error::is_fatal`].
#[derive(Error, Debug)]
pub enum Error {
    /// IO error while reading the archive
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The granted directory capability was revoked by the host
    #[error("capability revoked: {0}")]
    CapabilityRevoked(String),

    /// A conversation folder could not be decoded
    #[error("malformed archive in {dir}: {message}")]
    MalformedArchive { dir: String, message: String },

    /// No conversation folder with this name exists
    #[error("conversation not found: {0}")]
    ConversationNotFound(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn malformed(dir: impl Into<String>, message: impl Into<String>) -> Self {
        Error::MalformedArchive {
            dir: dir.into(),
            message: message.into(),
        }
    }

    /// Whether this error means the archive as a whole became unreadable.
    ///
    /// Fatal errors halt the session and require the user to grant access
    /// again. Everything else is scoped to a single conversation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Io(_) | Error::CapabilityRevoked(_))
    }
}

/// Result type alias for inboxview-core
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Error::CapabilityRevoked("archive".into()).is_fatal());
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        assert!(Error::Io(io).is_fatal());
        assert!(!Error::malformed("alice_1", "bad json").is_fatal());
        assert!(!Error::ConversationNotFound("bob_2".into()).is_fatal());
    }

    #[test]
    fn test_malformed_display() {
        let err = Error::malformed("alice_1", "missing field `title`");
        assert_eq!(
            err.to_string(),
            "malformed archive in alice_1: missing field `title`"
        );
    }
}
