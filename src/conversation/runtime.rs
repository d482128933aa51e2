//! Conversation runtime
//!
//! Single consumer of the event channel. Feeds each event to the arbiter and
//! carries out the returned actions against the collaborators. Performing an
//! action never waits on a collaborator.

use tokio::sync::{mpsc, watch};

use super::arbiter::Arbiter;
use super::event::{Action, Event, SpeechId};
use super::timer::InactivityTimer;
use crate::connection::TransportHandle;
use crate::view::ChatView;

/// A request for the speech synthesis loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    /// Id echoed back in `Event::SynthesisCompleted`
    pub id: SpeechId,
    /// Text to speak
    pub text: String,
    /// Hold playback until the recognizer has actually stopped
    pub exclusive: bool,
}

/// Drives the arbiter from the event channel
pub struct Runtime<V: ChatView> {
    arbiter: Arbiter,
    view: V,
    transport: TransportHandle,
    capture: watch::Sender<bool>,
    speech: mpsc::UnboundedSender<SpeechRequest>,
    timer: InactivityTimer,
    events: mpsc::Receiver<Event>,
}

impl<V: ChatView> Runtime<V> {
    /// Create a runtime
    ///
    /// `capture` publishes the desired microphone state to the capture
    /// supervisor; `speech` is the synthesis loop's unbounded queue; `events`
    /// is the channel every collaborator reports into (`events_tx` is its
    /// sender, used by the inactivity timer).
    #[must_use]
    pub fn new(
        arbiter: Arbiter,
        view: V,
        transport: TransportHandle,
        capture: watch::Sender<bool>,
        speech: mpsc::UnboundedSender<SpeechRequest>,
        (events_tx, events): (mpsc::Sender<Event>, mpsc::Receiver<Event>),
    ) -> Self {
        Self {
            arbiter,
            view,
            transport,
            capture,
            speech,
            timer: InactivityTimer::new(events_tx),
            events,
        }
    }

    /// Current arbiter
    #[must_use]
    pub const fn arbiter(&self) -> &Arbiter {
        &self.arbiter
    }

    /// Process events until the task is cancelled or the channel closes
    pub async fn run(mut self) {
        tracing::debug!("conversation runtime started");

        while let Some(event) = self.events.recv().await {
            self.dispatch(event);
        }

        self.timer.cancel();
        tracing::debug!("conversation runtime stopped");
    }

    /// Process a single event
    pub fn dispatch(&mut self, event: Event) {
        if let Event::TimerExpired { generation } = event {
            if !self.timer.take_expiry(generation) {
                return;
            }
        }

        tracing::trace!(?event, state = %self.arbiter.state(), "dispatching event");

        for action in self.arbiter.handle(event) {
            self.perform(action);
        }
    }

    fn perform(&mut self, action: Action) {
        match action {
            Action::StartCapture => {
                self.capture.send_replace(true);
            }
            Action::StopCapture => {
                self.capture.send_replace(false);
            }
            Action::Speak {
                id,
                text,
                exclusive,
            } => {
                let request = SpeechRequest {
                    id,
                    text,
                    exclusive,
                };
                if self.speech.send(request).is_err() {
                    tracing::warn!(%id, "speech loop gone, request dropped");
                }
            }
            Action::Send(text) => {
                if !self.transport.send(text) {
                    tracing::warn!("transport closed before utterance could be sent");
                }
            }
            Action::Show(entry) => self.view.append(entry),
            Action::ArmTimer(duration) => self.timer.arm(duration),
        }
    }
}
