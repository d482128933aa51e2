//! Capture/playback arbiter - the conversation state machine
//!
//! Consumes one [`Event`] at a time and returns the [`Action`]s the runtime
//! must perform. The arbiter itself does no I/O, which keeps every transition
//! testable without audio hardware or a network.
//!
//! ```text
//!            wake phrase                 reply received
//!  Dormant ─────────────────▶ Listening ───────────────▶ Speaking
//!     ▲                          │  ▲                        │
//!     │      inactivity expiry   │  └── synthesis complete ──┘
//!     └──────────────────────────┘
//! ```
//!
//! Capture and reply playback never overlap: capture is stopped before a
//! reply is spoken and only restarted once that reply's synthesis completes.

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::event::{Action, CloseReason, Event, SpeechId};
use super::normalize::is_similar;
use super::session::{ConversationState, Session, Utterance};
use super::{ACTIVATION_RESPONSES, INACTIVITY_TIMEOUT, WAKE_PHRASES};
use crate::view::ChatEntry;

/// Fallback acknowledgement if the pool is empty
const FALLBACK_ACKNOWLEDGEMENT: &str = "Yes?";

/// Fixed conversation parameters
#[derive(Debug, Clone)]
pub struct ArbiterSettings {
    /// Lowercased wake phrases, matched as substrings
    pub wake_phrases: Vec<String>,

    /// Pool of activation acknowledgements
    pub acknowledgements: Vec<String>,

    /// Inactivity period before going dormant
    pub inactivity_timeout: Duration,
}

impl Default for ArbiterSettings {
    fn default() -> Self {
        Self {
            wake_phrases: WAKE_PHRASES.iter().map(ToString::to_string).collect(),
            acknowledgements: ACTIVATION_RESPONSES
                .iter()
                .map(ToString::to_string)
                .collect(),
            inactivity_timeout: INACTIVITY_TIMEOUT,
        }
    }
}

/// The conversation state machine
#[derive(Debug)]
pub struct Arbiter {
    session: Session,
    settings: ArbiterSettings,
    rng: StdRng,
    transport_open: bool,
    capture_active: bool,
    pending_reply: Option<SpeechId>,
    next_speech_id: u64,
}

impl Arbiter {
    /// Create an arbiter with the fixed conversation parameters
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(ArbiterSettings::default(), StdRng::from_entropy())
    }

    /// Create an arbiter with explicit parameters and random source
    #[must_use]
    pub fn with_settings(settings: ArbiterSettings, rng: StdRng) -> Self {
        let settings = ArbiterSettings {
            wake_phrases: settings
                .wake_phrases
                .into_iter()
                .map(|w| w.to_lowercase().trim().to_string())
                .filter(|w| !w.is_empty())
                .collect(),
            ..settings
        };

        tracing::debug!(wake_phrases = ?settings.wake_phrases, "arbiter initialized");

        Self {
            session: Session::default(),
            settings,
            rng,
            transport_open: false,
            capture_active: false,
            pending_reply: None,
            next_speech_id: 0,
        }
    }

    /// Current conversation state
    #[must_use]
    pub const fn state(&self) -> ConversationState {
        self.session.state()
    }

    /// Session snapshot
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Whether the arbiter last asked for the microphone to be open
    #[must_use]
    pub const fn capture_active(&self) -> bool {
        self.capture_active
    }

    /// Whether the transport is believed to be open
    #[must_use]
    pub const fn transport_open(&self) -> bool {
        self.transport_open
    }

    /// Check if a transcript contains a configured wake phrase
    #[must_use]
    pub fn contains_wake_phrase(&self, transcript: &str) -> bool {
        let lowered = transcript.to_lowercase();
        self.settings
            .wake_phrases
            .iter()
            .any(|phrase| lowered.contains(phrase.as_str()))
    }

    /// Apply one event and return the resulting actions, in order
    pub fn handle(&mut self, event: Event) -> Vec<Action> {
        let mut actions = Vec::new();

        match event {
            Event::TransportOpened => self.on_transport_opened(&mut actions),
            Event::TransportClosed(reason) => self.on_transport_closed(&reason, &mut actions),
            Event::WakePhraseDetected(text) => {
                if self.session.awake {
                    self.on_transcript(&text, &mut actions);
                } else if !self.session.speaking {
                    self.activate(&text, &mut actions);
                }
            }
            Event::UtteranceRecognized(text) => self.on_transcript(&text, &mut actions),
            Event::ReplyReceived(text) => self.on_reply(text, &mut actions),
            Event::SynthesisCompleted(id) => self.on_synthesis_completed(id, &mut actions),
            Event::TimerExpired { .. } => self.on_timer_expired(&mut actions),
            Event::CaptureFailed(reason) => {
                tracing::warn!(%reason, "speech recognition failed");
                actions.push(Action::Show(ChatEntry::system(
                    "Speech recognition error. Restarting...",
                )));
            }
        }

        actions
    }

    fn on_transport_opened(&mut self, actions: &mut Vec<Action>) {
        tracing::info!("assistant transport open");
        self.transport_open = true;
        actions.push(Action::Show(ChatEntry::system(
            "Connection established. Say 'Hey Jarvis' to activate.",
        )));

        if !self.session.speaking {
            self.start_capture(actions);
        }
    }

    fn on_transport_closed(&mut self, reason: &CloseReason, actions: &mut Vec<Action>) {
        self.transport_open = false;

        let message = match reason {
            CloseReason::Error(e) => {
                tracing::warn!(error = %e, "assistant transport error");
                "Connection error. Reconnecting..."
            }
            CloseReason::Closed => {
                tracing::warn!("assistant transport closed");
                "Connection closed. Reconnecting..."
            }
        };
        actions.push(Action::Show(ChatEntry::system(message)));
    }

    fn on_transcript(&mut self, text: &str, actions: &mut Vec<Action>) {
        let transcript = text.trim();
        if transcript.is_empty() {
            return;
        }

        // Capture is suspended while speaking; this result raced the stop
        if self.session.speaking {
            tracing::debug!(transcript, "dropping transcript received while speaking");
            return;
        }

        if !self.session.awake {
            if self.contains_wake_phrase(transcript) {
                self.activate(transcript, actions);
            } else {
                tracing::trace!(transcript, "no wake phrase, ignoring");
            }
            return;
        }

        if self.session.repeats_last_utterance(transcript) {
            tracing::debug!(transcript, "duplicate utterance ignored");
            actions.push(Action::Show(ChatEntry::system("Duplicate input ignored.")));
            return;
        }

        self.session.last_user_utterance = Some(Utterance::new(transcript));
        actions.push(Action::Show(ChatEntry::user(transcript)));

        if self.transport_open {
            tracing::info!(utterance = transcript, "forwarding utterance");
            actions.push(Action::Send(transcript.to_string()));
        } else {
            tracing::warn!(utterance = transcript, "transport not open, utterance not sent");
        }

        actions.push(Action::ArmTimer(self.settings.inactivity_timeout));
    }

    fn activate(&mut self, transcript: &str, actions: &mut Vec<Action>) {
        tracing::info!(transcript, "wake phrase detected");
        self.session.awake = true;
        actions.push(Action::Show(ChatEntry::user(transcript)));

        let acknowledgement = self
            .settings
            .acknowledgements
            .choose(&mut self.rng)
            .map_or(FALLBACK_ACKNOWLEDGEMENT, String::as_str)
            .to_string();

        self.session.last_system_reply = Some(acknowledgement.clone());
        actions.push(Action::Show(ChatEntry::ai(acknowledgement.clone())));

        // The greeting is short and best-effort: spoken without suspending capture
        let id = self.next_id();
        actions.push(Action::Speak {
            id,
            text: acknowledgement,
            exclusive: false,
        });
        actions.push(Action::ArmTimer(self.settings.inactivity_timeout));
    }

    fn on_reply(&mut self, reply: String, actions: &mut Vec<Action>) {
        if is_similar(&reply, self.session.last_reply_text())
            || is_similar(&reply, self.session.last_user_text())
        {
            tracing::debug!(reply = %reply, "redundant reply skipped");
            actions.push(Action::Show(ChatEntry::system("Skipping redundant response.")));
            return;
        }

        self.stop_capture(actions);
        self.session.speaking = true;
        self.session.last_system_reply = Some(reply.clone());
        actions.push(Action::Show(ChatEntry::ai(reply.clone())));

        let id = self.next_id();
        self.pending_reply = Some(id);
        tracing::debug!(%id, "speaking reply");
        actions.push(Action::Speak {
            id,
            text: reply,
            exclusive: true,
        });

        // A reply counts as activity
        if self.session.awake {
            actions.push(Action::ArmTimer(self.settings.inactivity_timeout));
        }
    }

    fn on_synthesis_completed(&mut self, id: SpeechId, actions: &mut Vec<Action>) {
        if self.pending_reply != Some(id) {
            tracing::trace!(%id, "synthesis completed for greeting or superseded reply");
            return;
        }

        self.pending_reply = None;
        self.session.speaking = false;

        // The microphone always re-opens; it is how the wake phrase is heard
        self.start_capture(actions);

        if self.session.awake {
            actions.push(Action::ArmTimer(self.settings.inactivity_timeout));
        } else {
            tracing::debug!("session went dormant while speaking, staying dormant");
        }
    }

    fn on_timer_expired(&mut self, actions: &mut Vec<Action>) {
        if !self.session.awake {
            return;
        }

        tracing::info!("inactivity timeout, going dormant");
        self.session.awake = false;
        actions.push(Action::Show(ChatEntry::system(
            "Going into sleep mode. Say 'Hey Jarvis' to wake up.",
        )));
    }

    fn start_capture(&mut self, actions: &mut Vec<Action>) {
        if !self.capture_active {
            self.capture_active = true;
            actions.push(Action::StartCapture);
        }
    }

    fn stop_capture(&mut self, actions: &mut Vec<Action>) {
        if self.capture_active {
            self.capture_active = false;
            actions.push(Action::StopCapture);
        }
    }

    const fn next_id(&mut self) -> SpeechId {
        self.next_speech_id += 1;
        SpeechId(self.next_speech_id)
    }
}

impl Default for Arbiter {
    fn default() -> Self {
        Self::new()
    }
}
