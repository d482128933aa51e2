//! Utterance segmentation
//!
//! Splits the microphone stream into utterances with a simple energy gate:
//! speech starts when a chunk is loud enough and ends after a stretch of
//! silence. Each completed segment is one candidate transcript.

/// Minimum audio energy threshold to consider speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum duration of speech for a segment (in samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Silence duration that ends an utterance (in samples)
const SILENCE_SAMPLES: usize = 8000; // 0.5 seconds

/// Upper bound on one segment (in samples)
const MAX_SEGMENT_SAMPLES: usize = 16000 * 30;

/// Segmenter state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// Waiting for speech
    Idle,
    /// Accumulating an utterance
    Speech,
}

/// Energy-gated utterance segmenter
#[derive(Debug)]
pub struct SpeechSegmenter {
    state: SegmenterState,
    buffer: Vec<f32>,
    speech_samples: usize,
    silence_counter: usize,
}

impl Default for SpeechSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechSegmenter {
    /// Create an idle segmenter
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SegmenterState::Idle,
            buffer: Vec::new(),
            speech_samples: 0,
            silence_counter: 0,
        }
    }

    /// Feed a chunk of samples
    ///
    /// Returns the completed utterance once enough speech has been followed by
    /// enough silence. The segmenter is idle again afterwards.
    pub fn process(&mut self, samples: &[f32]) -> Option<Vec<f32>> {
        if samples.is_empty() {
            return None;
        }

        let energy = calculate_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            SegmenterState::Idle => {
                if is_speech {
                    self.state = SegmenterState::Speech;
                    self.buffer.clear();
                    self.buffer.extend_from_slice(samples);
                    self.speech_samples = samples.len();
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech started");
                }
                None
            }
            SegmenterState::Speech => {
                self.buffer.extend_from_slice(samples);

                if is_speech {
                    self.speech_samples += samples.len();
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                let complete = self.silence_counter > SILENCE_SAMPLES
                    && self.speech_samples > MIN_SPEECH_SAMPLES;

                if complete || self.buffer.len() >= MAX_SEGMENT_SAMPLES {
                    tracing::debug!(samples = self.buffer.len(), "utterance segment complete");
                    return Some(self.take());
                }

                // Too much silence without enough speech: it was noise
                if self.silence_counter > SILENCE_SAMPLES * 2 {
                    tracing::trace!("speech too short, resetting");
                    self.reset();
                }

                None
            }
        }
    }

    /// Discard any partial utterance
    pub fn reset(&mut self) {
        self.state = SegmenterState::Idle;
        self.buffer.clear();
        self.speech_samples = 0;
        self.silence_counter = 0;
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SegmenterState {
        self.state
    }

    /// Samples accumulated for the current utterance
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn take(&mut self) -> Vec<f32> {
        let segment = std::mem::take(&mut self.buffer);
        self.reset();
        segment
    }
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
