//! Speech synthesizers

use async_trait::async_trait;

use super::playback;
use super::tts::TextToSpeech;
use crate::Result;

/// Speaks text aloud, returning once playback has finished
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Speak `text`
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn speak(&self, text: &str) -> Result<()>;
}

/// Synthesizes with a hosted TTS API and plays on the default speaker
pub struct SpeechPlayer {
    tts: TextToSpeech,
}

impl SpeechPlayer {
    #[must_use]
    pub const fn new(tts: TextToSpeech) -> Self {
        Self { tts }
    }
}

#[async_trait]
impl Synthesizer for SpeechPlayer {
    async fn speak(&self, text: &str) -> Result<()> {
        let audio = self.tts.synthesize(text).await?;
        tracing::debug!(bytes = audio.len(), "speech synthesized");
        playback::play_mp3(audio).await
    }
}

/// Text mode: replies are already shown in the chat view, so speaking is instant
#[derive(Debug, Default)]
pub struct ConsoleSynthesizer;

#[async_trait]
impl Synthesizer for ConsoleSynthesizer {
    async fn speak(&self, text: &str) -> Result<()> {
        tracing::trace!(%text, "speak (text mode)");
        Ok(())
    }
}
