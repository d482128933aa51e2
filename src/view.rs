//! Chat display collaborator
//!
//! The conversation only ever appends `(sender, message, category)` entries;
//! rendering them is up to the view.

use chrono::{DateTime, Utc};

/// Category of a chat entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Something the user said
    User,
    /// Something the assistant said
    Ai,
    /// Status notification
    System,
}

impl Category {
    /// Display label for the sender of this category
    #[must_use]
    pub const fn sender(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Ai => "AI",
            Self::System => "System",
        }
    }
}

/// One appended chat entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    /// Sender label
    pub sender: String,

    /// Message text
    pub message: String,

    /// Entry category
    pub category: Category,

    /// When the entry was produced
    pub at: DateTime<Utc>,
}

impl ChatEntry {
    /// Create an entry with the default sender label for its category
    #[must_use]
    pub fn new(category: Category, message: impl Into<String>) -> Self {
        Self {
            sender: category.sender().to_string(),
            message: message.into(),
            category,
            at: Utc::now(),
        }
    }

    /// User entry
    #[must_use]
    pub fn user(message: impl Into<String>) -> Self {
        Self::new(Category::User, message)
    }

    /// Assistant entry
    #[must_use]
    pub fn ai(message: impl Into<String>) -> Self {
        Self::new(Category::Ai, message)
    }

    /// Status entry
    #[must_use]
    pub fn system(message: impl Into<String>) -> Self {
        Self::new(Category::System, message)
    }
}

/// Append-only chat display
pub trait ChatView: Send {
    /// Append an entry
    fn append(&mut self, entry: ChatEntry);
}

/// Writes chat entries to stdout
#[derive(Debug, Default)]
pub struct ConsoleView;

impl ChatView for ConsoleView {
    fn append(&mut self, entry: ChatEntry) {
        let stamp = entry.at.format("%H:%M:%S");
        println!("[{stamp}] {}: {}", entry.sender, entry.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_sender_labels() {
        assert_eq!(ChatEntry::user("hi").sender, "User");
        assert_eq!(ChatEntry::ai("hello").sender, "AI");
        assert_eq!(ChatEntry::system("ok").sender, "System");
    }

    #[test]
    fn test_entry_category() {
        let entry = ChatEntry::system("Connection established.");
        assert_eq!(entry.category, Category::System);
        assert_eq!(entry.message, "Connection established.");
    }
}
