//! Hey Jarvis - hands-free voice front end for a remote AI assistant
//!
//! Listens for a wake phrase, forwards what the user says to an assistant
//! over a persistent WebSocket, and speaks the assistant's replies back.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ UtteranceRecognized ┌─────────────────────┐   Send    ┌──────────────────┐
//! │  Microphone  │────────────────────▶│                     │──────────▶│                  │
//! │  supervisor  │◀── desired state ───│  Runtime + Arbiter  │           │    Connection    │
//! └──────────────┘                     │   (state machine)   │◀──────────│     manager      │
//! ┌──────────────┐◀── SpeechRequest ───│                     │  Reply /  │ (auto-reconnect) │
//! │   Speaker    │                     └──────────▲──────────┘  Opened / └──────────────────┘
//! │  supervisor  │── SynthesisCompleted ──────────┘             Closed
//! └──────────────┘
//! ```
//!
//! The microphone supervisor also publishes whether the recognizer is live;
//! the speaker holds each reply until it reads `false`.

pub mod config;
pub mod connection;
pub mod conversation;
pub mod daemon;
pub mod error;
pub mod view;
pub mod voice;

pub use config::Config;
pub use daemon::Daemon;
pub use error::{Error, Result};
