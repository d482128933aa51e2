//! Configuration management for the Jarvis voice front end
//!
//! Sources, lowest to highest precedence: built-in defaults, the TOML config
//! file, environment variables, command-line flags (applied by the caller).
//! Conversation constants (wake phrases, timeouts) are fixed and
//! live in [`crate::conversation`].

pub mod file;

use secrecy::SecretString;

use crate::{Error, Result};

/// Default assistant endpoint
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8000/ws";

/// Default TTS speed (slightly slower than normal for clarity)
pub const DEFAULT_TTS_SPEED: f32 = 0.9;

/// Jarvis configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Assistant WebSocket endpoint
    pub endpoint: String,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Speech-to-text backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SttProvider {
    /// `OpenAI` Whisper
    #[default]
    Whisper,
    /// Deepgram
    Deepgram,
}

impl std::str::FromStr for SttProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "whisper" | "openai" => Ok(Self::Whisper),
            "deepgram" => Ok(Self::Deepgram),
            other => Err(Error::Config(format!("unknown STT provider: {other}"))),
        }
    }
}

/// Text-to-speech backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtsProvider {
    /// `OpenAI` speech API
    #[default]
    OpenAi,
    /// `ElevenLabs`
    ElevenLabs,
}

impl std::str::FromStr for TtsProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "elevenlabs" => Ok(Self::ElevenLabs),
            other => Err(Error::Config(format!("unknown TTS provider: {other}"))),
        }
    }
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Use microphone and speaker (otherwise stdin/stdout text mode)
    pub enabled: bool,

    /// STT backend
    pub stt_provider: SttProvider,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    /// TTS backend
    pub tts_provider: TtsProvider,

    /// TTS model (e.g. "tts-1", "eleven_monolingual_v1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stt_provider: SttProvider::default(),
            stt_model: "whisper-1".to_string(),
            tts_provider: TtsProvider::default(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: DEFAULT_TTS_SPEED,
        }
    }
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (Whisper and TTS)
    pub openai: Option<SecretString>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<SecretString>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<SecretString>,
}

impl Config {
    /// Load configuration from the config file and process environment
    ///
    /// # Errors
    ///
    /// Returns error if a value is invalid
    pub fn load() -> Result<Self> {
        Self::from_sources(file::load_config_file(), |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed config file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a provider name or numeric value is invalid
    pub fn from_sources(
        fc: file::JarvisConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let defaults = VoiceConfig::default();

        let endpoint = env("JARVIS_ENDPOINT")
            .or(fc.endpoint)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let stt_provider = env("JARVIS_STT_PROVIDER")
            .or(fc.voice.stt_provider)
            .map(|p| p.parse())
            .transpose()?
            .unwrap_or(defaults.stt_provider);

        let tts_provider = env("JARVIS_TTS_PROVIDER")
            .or(fc.voice.tts_provider)
            .map(|p| p.parse())
            .transpose()?
            .unwrap_or(defaults.tts_provider);

        let tts_speed = match env("JARVIS_TTS_SPEED") {
            Some(raw) => raw
                .parse::<f32>()
                .map_err(|e| Error::Config(format!("invalid JARVIS_TTS_SPEED {raw:?}: {e}")))?,
            None => fc.voice.tts_speed.unwrap_or(defaults.tts_speed),
        };

        if !(0.25..=4.0).contains(&tts_speed) {
            return Err(Error::Config(format!(
                "TTS speed must be between 0.25 and 4.0, got {tts_speed}"
            )));
        }

        let voice = VoiceConfig {
            enabled: fc.voice.enabled.unwrap_or(defaults.enabled),
            stt_provider,
            stt_model: env("JARVIS_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or(defaults.stt_model),
            tts_provider,
            tts_model: env("JARVIS_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or(defaults.tts_model),
            tts_voice: env("JARVIS_TTS_VOICE")
                .or(fc.voice.tts_voice)
                .unwrap_or(defaults.tts_voice),
            tts_speed,
        };

        let api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY")
                .or(fc.api_keys.openai)
                .map(SecretString::from),
            deepgram: env("DEEPGRAM_API_KEY")
                .or(fc.api_keys.deepgram)
                .map(SecretString::from),
            elevenlabs: env("ELEVENLABS_API_KEY")
                .or(fc.api_keys.elevenlabs)
                .map(SecretString::from),
        };

        Ok(Self {
            endpoint,
            voice,
            api_keys,
        })
    }
}
