//! Connection to the remote assistant
//!
//! The manager owns the transport. It reconnects after any error or closure
//! with a fixed delay, forever, and reports what happens as conversation
//! events. Everyone else only gets a [`TransportHandle`] that can send text.

mod websocket;

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{Sink, SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

pub use websocket::WebSocketConnector;

use crate::Result;
use crate::conversation::{CloseReason, Event, RECONNECT_DELAY};

/// Outbound queue depth per link
const OUTBOUND_BUFFER: usize = 32;

/// Transport lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connect attempt in progress
    Connecting,
    /// Text can be sent
    Open,
    /// Waiting to reconnect
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Outgoing half of a link
pub type TextSink = Pin<Box<dyn Sink<String, Error = crate::Error> + Send>>;

/// One established message-oriented link carrying raw text payloads
pub struct Link {
    /// Received payloads; the stream ends when the remote closes
    pub incoming: BoxStream<'static, Result<String>>,
    /// Payloads to send
    pub outgoing: TextSink,
}

/// Opens links to the assistant
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Human readable endpoint, for logs
    fn endpoint(&self) -> String;

    /// Open a new link
    async fn connect(&self) -> Result<Link>;
}

/// Capability to send text to the assistant
#[derive(Debug, Clone)]
pub struct TransportHandle {
    outbound: mpsc::Sender<String>,
    state: watch::Receiver<ConnectionState>,
}

impl TransportHandle {
    /// Current transport state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Whether text can currently be sent
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Queue text for the open link
    ///
    /// Returns `false` and drops the text if the transport is not open.
    pub fn send(&self, text: String) -> bool {
        if !self.is_open() {
            tracing::debug!(state = %self.state(), "transport not open, dropping text");
            return false;
        }

        match self.outbound.try_send(text) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "outbound queue unavailable, dropping text");
                false
            }
        }
    }
}

/// Why a link's pump returned
enum PumpExit {
    Lost(CloseReason),
    Shutdown,
}

/// Owns the transport and reconnects it
pub struct ConnectionManager<C: Connector> {
    connector: C,
    events: mpsc::Sender<Event>,
    outbound: mpsc::Receiver<String>,
    state: watch::Sender<ConnectionState>,
    reconnect_delay: Duration,
}

impl<C: Connector> ConnectionManager<C> {
    /// Create a manager reporting into `events`
    #[must_use]
    pub fn new(connector: C, events: mpsc::Sender<Event>) -> (Self, TransportHandle) {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Closed);

        let manager = Self {
            connector,
            events,
            outbound: outbound_rx,
            state: state_tx,
            reconnect_delay: RECONNECT_DELAY,
        };
        let handle = TransportHandle {
            outbound: outbound_tx,
            state: state_rx,
        };

        (manager, handle)
    }

    /// Create a manager and start it on the runtime
    #[must_use]
    pub fn spawn(connector: C, events: mpsc::Sender<Event>) -> (TransportHandle, JoinHandle<()>) {
        let (manager, handle) = Self::new(connector, events);
        let task = tokio::spawn(manager.run());
        (handle, task)
    }

    /// Connect, pump, and reconnect until the conversation goes away
    pub async fn run(mut self) {
        let endpoint = self.connector.endpoint();
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;
            self.state.send_replace(ConnectionState::Connecting);
            tracing::debug!(%endpoint, attempt, "connecting to assistant");

            let reason = match self.connector.connect().await {
                Ok(link) => {
                    attempt = 0;
                    self.state.send_replace(ConnectionState::Open);
                    tracing::info!(%endpoint, "connected to assistant");

                    if self.events.send(Event::TransportOpened).await.is_err() {
                        break;
                    }

                    match self.pump(link).await {
                        PumpExit::Lost(reason) => reason,
                        PumpExit::Shutdown => break,
                    }
                }
                Err(e) => {
                    tracing::warn!(%endpoint, attempt, error = %e, "connect failed");
                    CloseReason::Error(e.to_string())
                }
            };

            self.state.send_replace(ConnectionState::Closed);
            self.discard_queued();

            if self.events.send(Event::TransportClosed(reason)).await.is_err() {
                break;
            }

            tokio::time::sleep(self.reconnect_delay).await;
        }

        self.state.send_replace(ConnectionState::Closed);
        tracing::debug!(%endpoint, "connection manager stopped");
    }

    async fn pump(&mut self, mut link: Link) -> PumpExit {
        loop {
            tokio::select! {
                incoming = link.incoming.next() => match incoming {
                    Some(Ok(text)) => {
                        tracing::debug!(bytes = text.len(), "reply received");
                        if self.events.send(Event::ReplyReceived(text)).await.is_err() {
                            return PumpExit::Shutdown;
                        }
                    }
                    Some(Err(e)) => return PumpExit::Lost(CloseReason::Error(e.to_string())),
                    None => return PumpExit::Lost(CloseReason::Closed),
                },
                outgoing = self.outbound.recv() => match outgoing {
                    Some(text) => {
                        if let Err(e) = link.outgoing.send(text).await {
                            return PumpExit::Lost(CloseReason::Error(e.to_string()));
                        }
                    }
                    None => {
                        let _ = link.outgoing.close().await;
                        return PumpExit::Shutdown;
                    }
                },
            }
        }
    }

    fn discard_queued(&mut self) {
        let mut dropped = 0_usize;
        while self.outbound.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            tracing::debug!(dropped, "discarded text queued for closed link");
        }
    }
}
