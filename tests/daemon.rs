//! End-to-end daemon tests
//!
//! Runs `converse` against an in-memory transport, a microphone that records
//! whether it is open, and a speaker that checks the microphone while a reply
//! plays.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hey_jarvis::Result;
use hey_jarvis::conversation::ACTIVATION_RESPONSES;
use hey_jarvis::daemon::converse;
use hey_jarvis::voice::{Recognizer, Synthesizer};

mod common;
use common::FakeConnector;

/// Microphone that hears a fixed script, then silence
struct Microphone {
    open: Arc<AtomicBool>,
    script: VecDeque<String>,
}

impl Microphone {
    fn hearing(lines: &[&str]) -> Self {
        Self {
            open: Arc::new(AtomicBool::new(false)),
            script: lines.iter().map(ToString::to_string).collect(),
        }
    }
}

#[async_trait(?Send)]
impl Recognizer for Microphone {
    async fn start(&mut self) -> Result<()> {
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&mut self) {
        self.open.store(false, Ordering::SeqCst);
    }

    async fn recognize(&mut self) -> Result<String> {
        match self.script.pop_front() {
            Some(line) => Ok(line),
            None => std::future::pending().await,
        }
    }
}

/// Speaker that counts replies played while the microphone was open
#[derive(Clone)]
struct Speaker {
    microphone: Arc<AtomicBool>,
    delay: Duration,
    spoken: Arc<Mutex<Vec<String>>>,
    overlapping: Arc<AtomicUsize>,
}

impl Speaker {
    fn new(microphone: &Arc<AtomicBool>, delay: Duration) -> Self {
        Self {
            microphone: Arc::clone(microphone),
            delay,
            spoken: Arc::new(Mutex::new(Vec::new())),
            overlapping: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    fn overlapping(&self) -> usize {
        self.overlapping.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Synthesizer for Speaker {
    async fn speak(&self, text: &str) -> Result<()> {
        let greeting = ACTIVATION_RESPONSES.contains(&text);

        let open_at_start = self.microphone.load(Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let open_at_end = self.microphone.load(Ordering::SeqCst);

        if !greeting && (open_at_start || open_at_end) {
            self.overlapping.fetch_add(1, Ordering::SeqCst);
        }

        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

fn facts(count: usize) -> Vec<String> {
    (1..=count).map(|n| format!("Fact number {n}.")).collect()
}

/// Wake the assistant, ask once, and stream `replies` back
async fn run_conversation(replies: usize, synthesis_delay: Duration) -> (Speaker, Arc<AtomicBool>) {
    let (connector, mut servers) = FakeConnector::new();
    let mut microphone = Microphone::hearing(&["hey jarvis", "tell me everything"]);
    let microphone_open = Arc::clone(&microphone.open);
    let speaker = Speaker::new(&microphone_open, synthesis_delay);

    let driver = {
        let speaker = speaker.clone();
        let microphone_open = Arc::clone(&microphone_open);
        async move {
            let mut server = servers.recv().await.unwrap();
            assert_eq!(server.next_sent().await.as_deref(), Some("tell me everything"));

            for fact in facts(replies) {
                server.reply(&fact);
            }

            tokio::time::timeout(Duration::from_secs(60), async {
                while speaker.spoken().len() < replies + 1
                    || !microphone_open.load(Ordering::SeqCst)
                {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            })
            .await
            .expect("conversation stalled");
        }
    };

    tokio::select! {
        outcome = converse(connector, &mut microphone, speaker.clone()) => {
            panic!("conversation ended early: {outcome:?}");
        }
        () = driver => {}
    }

    (speaker, microphone_open)
}

#[tokio::test(start_paused = true)]
async fn test_reply_never_plays_into_open_microphone() {
    let (speaker, microphone_open) = run_conversation(1, Duration::from_millis(500)).await;

    let spoken = speaker.spoken();
    assert!(ACTIVATION_RESPONSES.contains(&spoken[0].as_str()));
    assert_eq!(spoken[1..], facts(1));
    assert_eq!(speaker.overlapping(), 0);

    // Listening again once the reply is done
    assert!(microphone_open.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_instant_replies_wait_for_microphone() {
    let (speaker, _) = run_conversation(20, Duration::ZERO).await;

    assert_eq!(speaker.spoken()[1..], facts(20));
    assert_eq!(speaker.overlapping(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_reply_burst_is_spoken_in_full() {
    let (speaker, _) = run_conversation(120, Duration::from_millis(20)).await;

    let spoken = speaker.spoken();
    assert_eq!(spoken.len(), 121);
    assert_eq!(spoken[1..], facts(120));
    assert_eq!(speaker.overlapping(), 0);
}
