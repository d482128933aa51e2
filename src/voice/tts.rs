//! Text-to-speech (TTS) over hosted APIs

use crate::config::{ApiKeys, TtsProvider, VoiceConfig};
use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};

const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";
const ELEVENLABS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

/// Synthesizes speech from text, returning MP3 bytes
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    voice: String,
    speed: f32,
    model: String,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// Create a TTS client for the configured provider
    ///
    /// # Errors
    ///
    /// Returns error if the provider's API key is missing
    pub fn from_config(voice: &VoiceConfig, keys: &ApiKeys) -> Result<Self> {
        let (key, name) = match voice.tts_provider {
            TtsProvider::OpenAi => (&keys.openai, "OpenAI"),
            TtsProvider::ElevenLabs => (&keys.elevenlabs, "ElevenLabs"),
        };

        let api_key = key
            .as_ref()
            .filter(|k| !k.expose_secret().is_empty())
            .cloned()
            .ok_or_else(|| Error::Config(format!("{name} API key required for TTS")))?;

        tracing::debug!(
            provider = ?voice.tts_provider,
            model = %voice.tts_model,
            voice = %voice.tts_voice,
            "TTS ready"
        );

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice: voice.tts_voice.clone(),
            speed: voice.tts_speed,
            model: voice.tts_model.clone(),
            provider: voice.tts_provider,
        })
    }

    /// Synthesize text to MP3 audio
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        match self.provider {
            TtsProvider::OpenAi => self.synthesize_openai(text).await,
            TtsProvider::ElevenLabs => self.synthesize_elevenlabs(text).await,
        }
    }

    async fn synthesize_openai(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
            response_format: &'a str,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(OPENAI_SPEECH_URL)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn synthesize_elevenlabs(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
        };

        let response = self
            .client
            .post(format!("{ELEVENLABS_URL}/{}", self.voice))
            .header("xi-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("ElevenLabs TTS error {status}: {body}")));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
