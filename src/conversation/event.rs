//! Events consumed and actions produced by the arbiter

use std::time::Duration;

use crate::view::ChatEntry;

/// Identifies one synthesis request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpeechId(pub u64);

impl std::fmt::Display for SpeechId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "speech-{}", self.0)
    }
}

/// Why the transport went away
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Connect attempt or established link failed
    Error(String),
    /// Remote end closed the link
    Closed,
}

/// Input to the conversation state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Transport to the assistant is open
    TransportOpened,
    /// Transport to the assistant is gone; a reconnect is scheduled
    TransportClosed(CloseReason),
    /// A wake phrase was spotted by a dedicated detector
    WakePhraseDetected(String),
    /// A final transcript from the speech capture collaborator
    UtteranceRecognized(String),
    /// A reply from the assistant
    ReplyReceived(String),
    /// The synthesizer finished (or gave up on) a request
    SynthesisCompleted(SpeechId),
    /// An inactivity deadline elapsed
    TimerExpired {
        /// Arm generation that produced this expiry
        generation: u64,
    },
    /// The recognition session failed; the capture supervisor restarts it
    CaptureFailed(String),
}

/// Side effect requested by the arbiter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Open the microphone
    StartCapture,
    /// Close the microphone
    StopCapture,
    /// Speak text
    Speak {
        /// Request id echoed by `Event::SynthesisCompleted`
        id: SpeechId,
        /// Text to speak
        text: String,
        /// Wait for the microphone to close before speaking
        exclusive: bool,
    },
    /// Forward an utterance to the assistant
    Send(String),
    /// Append an entry to the chat view
    Show(ChatEntry),
    /// Cancel any pending inactivity deadline and schedule a new one
    ArmTimer(Duration),
}
