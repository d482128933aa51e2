//! Speech-to-text (STT) over hosted APIs

use crate::config::{ApiKeys, SttProvider, VoiceConfig};
use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};

const WHISPER_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
const DEEPGRAM_URL: &str = "https://api.deepgram.com/v1/listen";

/// Response from `OpenAI` Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Response from Deepgram transcription API
#[derive(serde::Deserialize)]
struct DeepgramResponse {
    results: DeepgramResults,
}

#[derive(serde::Deserialize)]
struct DeepgramResults {
    channels: Vec<DeepgramChannel>,
}

#[derive(serde::Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(serde::Deserialize)]
struct DeepgramAlternative {
    transcript: String,
}

impl DeepgramResponse {
    fn into_transcript(self) -> String {
        self.results
            .channels
            .into_iter()
            .next()
            .and_then(|c| c.alternatives.into_iter().next())
            .map(|a| a.transcript)
            .unwrap_or_default()
    }
}

/// Transcribes WAV audio to text
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    provider: SttProvider,
}

impl SpeechToText {
    /// Create an STT client for the configured provider
    ///
    /// # Errors
    ///
    /// Returns error if the provider's API key is missing
    pub fn from_config(voice: &VoiceConfig, keys: &ApiKeys) -> Result<Self> {
        let (key, name) = match voice.stt_provider {
            SttProvider::Whisper => (&keys.openai, "OpenAI"),
            SttProvider::Deepgram => (&keys.deepgram, "Deepgram"),
        };

        let api_key = key
            .as_ref()
            .filter(|k| !k.expose_secret().is_empty())
            .cloned()
            .ok_or_else(|| Error::Config(format!("{name} API key required for STT")))?;

        tracing::debug!(provider = ?voice.stt_provider, model = %voice.stt_model, "STT ready");

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: voice.stt_model.clone(),
            provider: voice.stt_provider,
        })
    }

    /// Transcribe WAV audio to text
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects it
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        let transcript = match self.provider {
            SttProvider::Whisper => self.transcribe_whisper(audio).await?,
            SttProvider::Deepgram => self.transcribe_deepgram(audio).await?,
        };

        let transcript = transcript.trim().to_string();
        tracing::debug!(%transcript, "transcription complete");
        Ok(transcript)
    }

    async fn transcribe_whisper(&self, audio: &[u8]) -> Result<String> {
        tracing::trace!(audio_bytes = audio.len(), "starting Whisper transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone())
            .text("language", "en");

        let response = self
            .client
            .post(WHISPER_URL)
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await?;
        Ok(result.text)
    }

    async fn transcribe_deepgram(&self, audio: &[u8]) -> Result<String> {
        tracing::trace!(audio_bytes = audio.len(), "starting Deepgram transcription");

        let response = self
            .client
            .post(DEEPGRAM_URL)
            .query(&[("model", self.model.as_str()), ("punctuate", "true")])
            .header(
                "Authorization",
                format!("Token {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "audio/wav")
            .body(audio.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Stt(format!("Deepgram API error {status}: {body}")));
        }

        let body = response.bytes().await?;
        let result: DeepgramResponse = serde_json::from_slice(&body)?;
        Ok(result.into_transcript())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_rejected() {
        let voice = VoiceConfig::default();
        let result = SpeechToText::from_config(&voice, &ApiKeys::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_deepgram_uses_its_own_key() {
        let voice = VoiceConfig {
            stt_provider: SttProvider::Deepgram,
            ..VoiceConfig::default()
        };
        let keys = ApiKeys {
            openai: Some(SecretString::from("sk-test")),
            ..ApiKeys::default()
        };
        assert!(SpeechToText::from_config(&voice, &keys).is_err());

        let keys = ApiKeys {
            deepgram: Some(SecretString::from("dg-test")),
            ..ApiKeys::default()
        };
        assert!(SpeechToText::from_config(&voice, &keys).is_ok());
    }

    #[test]
    fn test_deepgram_response_parsing() {
        let body = r#"{"results":{"channels":[{"alternatives":[{"transcript":"turn on the lights"}]}]}}"#;
        let response: DeepgramResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.into_transcript(), "turn on the lights");

        let empty = r#"{"results":{"channels":[]}}"#;
        let response: DeepgramResponse = serde_json::from_str(empty).unwrap();
        assert_eq!(response.into_transcript(), "");
    }
}
