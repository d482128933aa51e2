//! Voice processing module
//!
//! Handles microphone capture, utterance segmentation, speech-to-text,
//! text-to-speech and playback, plus the supervisors that drive them on
//! behalf of the conversation runtime.

mod capture;
mod playback;
mod recognizer;
mod segmenter;
mod stt;
pub mod supervisor;
mod synthesizer;
mod tts;

pub use capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
pub use playback::{AudioPlayback, DecodedAudio, PLAYBACK_SAMPLE_RATE, decode_mp3, play_mp3};
pub use recognizer::{MicrophoneRecognizer, Recognizer, StdinRecognizer};
pub use segmenter::{SegmenterState, SpeechSegmenter, calculate_energy};
pub use stt::SpeechToText;
pub use supervisor::{run_capture, run_speaker};
pub use synthesizer::{ConsoleSynthesizer, SpeechPlayer, Synthesizer};
pub use tts::TextToSpeech;
