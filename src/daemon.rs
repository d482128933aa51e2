//! Daemon - wires the conversation together and runs it
//!
//! Connection manager, speaker loop and conversation runtime run as tasks;
//! the capture supervisor runs on the calling task because audio streams
//! cannot move between threads.

use tokio::sync::{mpsc, watch};

use crate::connection::{ConnectionManager, Connector, WebSocketConnector};
use crate::conversation::{Arbiter, CAPTURE_RESTART_DELAY, Runtime};
use crate::view::ConsoleView;
use crate::voice::{
    ConsoleSynthesizer, MicrophoneRecognizer, Recognizer, SpeechPlayer, SpeechToText,
    StdinRecognizer, Synthesizer, TextToSpeech, run_capture, run_speaker,
};
use crate::{Config, Result};

/// Capacity of the event channel every collaborator reports into
const EVENT_BUFFER: usize = 64;

/// The Jarvis daemon
pub struct Daemon {
    config: Config,
    text_mode: bool,
}

impl Daemon {
    /// Create a daemon; `text_mode` replaces microphone and speaker with the terminal
    #[must_use]
    pub const fn new(config: Config, text_mode: bool) -> Self {
        Self { config, text_mode }
    }

    /// Whether the daemon will use the microphone and speaker
    #[must_use]
    pub const fn voice_enabled(&self) -> bool {
        self.config.voice.enabled && !self.text_mode
    }

    /// Run until interrupted
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint is invalid or audio/API setup fails
    #[allow(clippy::future_not_send)]
    pub async fn run(self) -> Result<()> {
        let connector = WebSocketConnector::new(&self.config.endpoint)?;

        if self.voice_enabled() {
            let stt = SpeechToText::from_config(&self.config.voice, &self.config.api_keys)?;
            let tts = TextToSpeech::from_config(&self.config.voice, &self.config.api_keys)?;
            let mut recognizer = MicrophoneRecognizer::new(stt)?;

            tracing::info!(endpoint = %self.config.endpoint, "jarvis ready (voice)");
            converse(connector, &mut recognizer, SpeechPlayer::new(tts)).await
        } else {
            let mut recognizer = StdinRecognizer::new();

            tracing::info!(endpoint = %self.config.endpoint, "jarvis ready (text)");
            converse(connector, &mut recognizer, ConsoleSynthesizer).await
        }
    }
}

/// Run one conversation until ctrl-c or a supervisor stops
#[allow(clippy::future_not_send)]
pub async fn converse<C, R, S>(connector: C, recognizer: &mut R, synthesizer: S) -> Result<()>
where
    C: Connector,
    R: Recognizer,
    S: Synthesizer + 'static,
{
    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let (capture_tx, capture_rx) = watch::channel(false);
    let (live_tx, live_rx) = watch::channel(false);
    let (speech_tx, speech_rx) = mpsc::unbounded_channel();

    let (transport, connection) = ConnectionManager::spawn(connector, events_tx.clone());

    let speaker = {
        let events = events_tx.clone();
        tokio::spawn(async move { run_speaker(&synthesizer, speech_rx, live_rx, events).await })
    };

    let runtime = Runtime::new(
        Arbiter::new(),
        ConsoleView,
        transport,
        capture_tx,
        speech_tx,
        (events_tx.clone(), events_rx),
    );
    let runtime = tokio::spawn(runtime.run());

    let outcome = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested");
            signal.map_err(Into::into)
        }
        () = run_capture(recognizer, capture_rx, live_tx, events_tx, CAPTURE_RESTART_DELAY) => {
            tracing::warn!("capture supervisor stopped");
            Ok(())
        }
    };

    runtime.abort();
    speaker.abort();
    connection.abort();

    outcome
}
