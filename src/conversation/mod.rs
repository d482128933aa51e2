//! Conversation orchestration
//!
//! Decides when the system is dormant, listening or speaking, filters echoed
//! and repeated text, and keeps microphone capture and reply playback apart.

mod arbiter;
mod event;
mod normalize;
mod runtime;
mod session;
mod timer;

use std::time::Duration;

pub use arbiter::{Arbiter, ArbiterSettings};
pub use event::{Action, CloseReason, Event, SpeechId};
pub use normalize::{is_similar, normalize};
pub use runtime::{Runtime, SpeechRequest};
pub use session::{ConversationState, Session, Utterance};
pub use timer::InactivityTimer;

/// Phrases that wake a dormant session (case-insensitive substrings)
pub const WAKE_PHRASES: &[&str] = &["hey jarvis", "jarvis"];

/// Acknowledgements spoken on activation
pub const ACTIVATION_RESPONSES: &[&str] = &[
    "Hello, how may I help you?",
    "I'm listening. How can I assist you?",
    "What can I do for you today?",
];

/// Idle period after which an awake session goes dormant
pub const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed delay before reconnecting to the assistant
pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Fixed delay before restarting a failed recognition session
pub const CAPTURE_RESTART_DELAY: Duration = Duration::from_secs(1);
