//! Conversational session state

use chrono::{DateTime, Utc};

use super::normalize::normalize;

/// One finalized unit of user speech
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// Transcript as recognized
    pub text: String,

    /// Canonical form used for duplicate detection
    pub normalized: String,

    /// When the utterance was accepted
    pub at: DateTime<Utc>,
}

impl Utterance {
    /// Create an utterance stamped with the current time
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let normalized = normalize(&text);

        Self {
            text,
            normalized,
            at: Utc::now(),
        }
    }
}

/// Observable conversation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    /// Waiting for a wake phrase
    Dormant,
    /// Awake, microphone open
    Listening,
    /// Awake, speaking a reply with the microphone suspended
    Speaking,
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dormant => write!(f, "dormant"),
            Self::Listening => write!(f, "listening"),
            Self::Speaking => write!(f, "speaking"),
        }
    }
}

/// The single conversational session, owned by the arbiter
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Whether a wake phrase has been heard and the session has not timed out
    pub awake: bool,

    /// Whether a reply is being synthesized
    pub speaking: bool,

    /// Last utterance accepted from the user
    pub last_user_utterance: Option<Utterance>,

    /// Last text the system spoke (reply or acknowledgement)
    pub last_system_reply: Option<String>,
}

impl Session {
    /// Derive the observable state from the session flags
    ///
    /// A session that timed out mid-reply reports `Dormant`.
    #[must_use]
    pub const fn state(&self) -> ConversationState {
        match (self.awake, self.speaking) {
            (false, _) => ConversationState::Dormant,
            (true, false) => ConversationState::Listening,
            (true, true) => ConversationState::Speaking,
        }
    }

    /// Text of the last accepted user utterance, or empty
    #[must_use]
    pub fn last_user_text(&self) -> &str {
        self.last_user_utterance
            .as_ref()
            .map_or("", |u| u.text.as_str())
    }

    /// Whether `text` repeats the last accepted utterance
    ///
    /// Compares canonical forms; never true before the first utterance.
    #[must_use]
    pub fn repeats_last_utterance(&self, text: &str) -> bool {
        self.last_user_utterance.as_ref().is_some_and(|last| {
            !text.is_empty() && !last.text.is_empty() && last.normalized == normalize(text)
        })
    }

    /// Text of the last system reply, or empty
    #[must_use]
    pub fn last_reply_text(&self) -> &str {
        self.last_system_reply.as_deref().unwrap_or_default()
    }
}
