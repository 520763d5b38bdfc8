//! Shared data model for crawling and scraping
//!
//! # Components
//!
//! - `PageKind`: The layout label assigned to a raw page at classification time
//! - `Statute` / `Subdivision`: The structured form of a statute page
//! - `Chunk`: The smallest retrievable text unit derived from a statute
//! - `QueueMessage`: A single delivery from a durable queue

mod page_kind;
mod statute;

pub use page_kind::PageKind;
pub use statute::{Chunk, Statute, Subdivision};

/// A message received from a durable queue
///
/// `handle` is the acknowledgement token needed to delete the message. An empty
/// poll is represented by `is_empty == true` rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueMessage {
    /// Message payload (a URL for the frontier, a raw key for raw events)
    pub body: String,

    /// Opaque receipt handle used to acknowledge the message
    pub handle: String,

    /// True when the poll returned no message
    pub is_empty: bool,
}

impl QueueMessage {
    /// Creates a message for sending; the handle is assigned on receipt
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            handle: String::new(),
            is_empty: false,
        }
    }

    /// A received message carrying its receipt handle
    pub fn received(body: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            handle: handle.into(),
            is_empty: false,
        }
    }

    /// The result of a poll that found nothing to deliver
    pub fn empty() -> Self {
        Self {
            is_empty: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_message() {
        let msg = QueueMessage::empty();
        assert!(msg.is_empty);
        assert!(msg.body.is_empty());
        assert!(msg.handle.is_empty());
    }

    #[test]
    fn test_received_message() {
        let msg = QueueMessage::received("https://example.com/", "h-1");
        assert!(!msg.is_empty);
        assert_eq!(msg.handle, "h-1");
    }
}
