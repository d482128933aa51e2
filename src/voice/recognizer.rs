//! Speech recognizers: turn captured audio (or typed lines) into utterances

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use super::capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
use super::segmenter::SpeechSegmenter;
use super::stt::SpeechToText;
use crate::{Error, Result};

/// How often the microphone buffer is drained into the segmenter
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A source of recognized utterances
///
/// Not `Send`: audio streams are tied to the thread that opened them.
#[async_trait(?Send)]
pub trait Recognizer {
    /// Begin listening
    ///
    /// # Errors
    ///
    /// Returns error if the input device cannot be opened
    async fn start(&mut self) -> Result<()>;

    /// Stop listening and release the input device
    async fn stop(&mut self);

    /// Wait for the next non-empty utterance
    ///
    /// Must be cancel safe: the supervisor drops this future when capture is
    /// turned off.
    ///
    /// # Errors
    ///
    /// Returns error if capture or transcription fails
    async fn recognize(&mut self) -> Result<String>;
}

/// Recognizes speech from the default microphone
pub struct MicrophoneRecognizer {
    capture: AudioCapture,
    segmenter: SpeechSegmenter,
    stt: SpeechToText,
}

impl MicrophoneRecognizer {
    /// Create a recognizer on the default input device
    ///
    /// # Errors
    ///
    /// Returns error if no suitable input device exists
    pub fn new(stt: SpeechToText) -> Result<Self> {
        Ok(Self {
            capture: AudioCapture::new()?,
            segmenter: SpeechSegmenter::new(),
            stt,
        })
    }

    async fn next_segment(&mut self) -> Result<Vec<f32>> {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        loop {
            interval.tick().await;

            if !self.capture.is_capturing() {
                return Err(Error::Capture("microphone is not open".to_string()));
            }

            let samples = self.capture.take_buffer();
            if let Some(segment) = self.segmenter.process(&samples) {
                return Ok(segment);
            }
        }
    }
}

#[async_trait(?Send)]
impl Recognizer for MicrophoneRecognizer {
    async fn start(&mut self) -> Result<()> {
        self.segmenter.reset();
        self.capture.start()
    }

    async fn stop(&mut self) {
        self.capture.stop();
        self.segmenter.reset();
    }

    async fn recognize(&mut self) -> Result<String> {
        loop {
            let segment = self.next_segment().await?;
            tracing::debug!(samples = segment.len(), "speech segment captured");

            let wav = samples_to_wav(&segment, SAMPLE_RATE)?;
            let text = self.stt.transcribe(&wav).await?;
            if !text.is_empty() {
                return Ok(text);
            }
        }
    }
}

/// Reads utterances as lines from standard input
///
/// Lines typed while capture is stopped are still buffered by the terminal
/// and delivered once capture resumes.
pub struct StdinRecognizer {
    lines: Lines<BufReader<Stdin>>,
    listening: bool,
    eof: bool,
}

impl StdinRecognizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            listening: false,
            eof: false,
        }
    }
}

impl Default for StdinRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Recognizer for StdinRecognizer {
    async fn start(&mut self) -> Result<()> {
        self.listening = true;
        Ok(())
    }

    async fn stop(&mut self) {
        self.listening = false;
    }

    async fn recognize(&mut self) -> Result<String> {
        loop {
            if self.eof || !self.listening {
                return std::future::pending().await;
            }

            match self.lines.next_line().await? {
                Some(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        return Ok(line.to_string());
                    }
                }
                None => {
                    tracing::info!("stdin closed");
                    self.eof = true;
                }
            }
        }
    }
}
