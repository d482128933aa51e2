//! Shared test utilities

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::channel::mpsc as fmpsc;
use futures::{SinkExt, StreamExt};
use hey_jarvis::connection::{Connector, Link};
use hey_jarvis::view::{ChatEntry, ChatView};
use hey_jarvis::{Error, Result};
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Chat view that records every entry
#[derive(Debug, Clone, Default)]
pub struct RecordingView {
    entries: Arc<Mutex<Vec<ChatEntry>>>,
}

impl RecordingView {
    pub fn entries(&self) -> Vec<ChatEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.message).collect()
    }

    pub fn count(&self, message: &str) -> usize {
        self.entries().iter().filter(|e| e.message == message).count()
    }
}

impl ChatView for RecordingView {
    fn append(&mut self, entry: ChatEntry) {
        self.entries.lock().unwrap().push(entry);
    }
}

/// Server side of one fake link
pub struct FakeServer {
    /// Push replies (or a transport error) to the client
    pub to_client: fmpsc::UnboundedSender<Result<String>>,
    /// Text the client sent
    pub from_client: fmpsc::UnboundedReceiver<String>,
}

impl FakeServer {
    pub fn reply(&self, text: &str) {
        self.to_client.unbounded_send(Ok(text.to_string())).unwrap();
    }

    pub fn fail(&self, reason: &str) {
        self.to_client
            .unbounded_send(Err(Error::Transport(reason.to_string())))
            .unwrap();
    }

    pub async fn next_sent(&mut self) -> Option<String> {
        self.from_client.next().await
    }
}

/// In-memory connector; every successful connect hands a [`FakeServer`] to the test
#[derive(Clone)]
pub struct FakeConnector {
    refuse: Arc<AtomicBool>,
    attempts: Arc<Mutex<Vec<Instant>>>,
    servers: mpsc::UnboundedSender<FakeServer>,
}

impl FakeConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FakeServer>) {
        let (servers, accepted) = mpsc::unbounded_channel();
        let connector = Self {
            refuse: Arc::new(AtomicBool::new(false)),
            attempts: Arc::new(Mutex::new(Vec::new())),
            servers,
        };
        (connector, accepted)
    }

    /// Make subsequent connect attempts fail
    pub fn set_refusing(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// When each connect attempt started
    pub fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    fn endpoint(&self) -> String {
        "fake://assistant".to_string()
    }

    async fn connect(&self) -> Result<Link> {
        self.attempts.lock().unwrap().push(Instant::now());

        if self.refuse.load(Ordering::SeqCst) {
            return Err(Error::Transport("connection refused".to_string()));
        }

        let (to_client, incoming) = fmpsc::unbounded();
        let (outgoing, from_client) = fmpsc::unbounded::<String>();

        self.servers
            .send(FakeServer {
                to_client,
                from_client,
            })
            .map_err(|_| Error::Transport("test dropped the server side".to_string()))?;

        Ok(Link {
            incoming: incoming.boxed(),
            outgoing: Box::pin(outgoing.sink_map_err(|e| Error::Transport(e.to_string()))),
        })
    }
}
