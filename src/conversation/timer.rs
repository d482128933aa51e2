//! Inactivity timer
//!
//! At most one deadline is live. Each arm bumps a generation counter; the
//! expiry event carries the generation so a deadline that was already queued
//! when the timer got re-armed can be told apart from the live one.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::event::Event;

/// Restartable countdown that posts `Event::TimerExpired` on expiry
#[derive(Debug)]
pub struct InactivityTimer {
    events: mpsc::Sender<Event>,
    generation: u64,
    armed: bool,
    handle: Option<JoinHandle<()>>,
}

impl InactivityTimer {
    /// Create a timer that reports expiry on `events`
    #[must_use]
    pub const fn new(events: mpsc::Sender<Event>) -> Self {
        Self {
            events,
            generation: 0,
            armed: false,
            handle: None,
        }
    }

    /// Cancel any pending deadline and schedule a new one
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm(&mut self, duration: Duration) {
        self.abort();
        self.generation += 1;
        self.armed = true;

        let generation = self.generation;
        let events = self.events.clone();

        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            // Receiver gone means the conversation is shutting down
            let _ = events.send(Event::TimerExpired { generation }).await;
        }));

        tracing::trace!(generation, ?duration, "inactivity timer armed");
    }

    /// Clear the pending deadline; no effect if none is pending
    pub fn cancel(&mut self) {
        if self.armed {
            tracing::trace!(generation = self.generation, "inactivity timer cancelled");
        }
        self.abort();
        self.generation += 1;
        self.armed = false;
    }

    /// Whether a deadline is pending
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// Accept an expiry event if it belongs to the live deadline
    ///
    /// Returns `true` at most once per `arm`.
    pub fn take_expiry(&mut self, generation: u64) -> bool {
        if self.armed && generation == self.generation {
            self.armed = false;
            self.handle = None;
            true
        } else {
            tracing::trace!(
                generation,
                current = self.generation,
                "ignoring stale timer expiry"
            );
            false
        }
    }

    fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for InactivityTimer {
    fn drop(&mut self) {
        self.abort();
    }
}
