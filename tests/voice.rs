//! Voice pipeline integration tests
//!
//! Tests voice components and supervisors without requiring audio hardware

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hey_jarvis::conversation::{Event, SpeechId, SpeechRequest};
use hey_jarvis::voice::{
    Recognizer, SAMPLE_RATE, SegmenterState, SpeechSegmenter, Synthesizer, run_capture,
    run_speaker, samples_to_wav,
};
use hey_jarvis::{Error, Result};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

mod common;

/// 100ms at 16kHz
const CHUNK: usize = 1600;

/// Generate sine wave audio samples
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

/// Feed audio in 100ms chunks, returning the first completed segment
fn feed(segmenter: &mut SpeechSegmenter, samples: &[f32]) -> Option<Vec<f32>> {
    samples
        .chunks(CHUNK)
        .find_map(|chunk| segmenter.process(chunk))
}

#[test]
fn test_silence_never_starts_a_segment() {
    let mut segmenter = SpeechSegmenter::new();

    assert!(feed(&mut segmenter, &generate_silence(2.0)).is_none());
    assert_eq!(segmenter.state(), SegmenterState::Idle);
    assert_eq!(segmenter.buffered(), 0);
}

#[test]
fn test_speech_then_silence_completes_segment() {
    let mut segmenter = SpeechSegmenter::new();

    assert!(feed(&mut segmenter, &generate_sine_samples(440.0, 0.5, 0.3)).is_none());
    assert_eq!(segmenter.state(), SegmenterState::Speech);

    let segment = feed(&mut segmenter, &generate_silence(1.0)).expect("segment should complete");

    // 0.5s of speech plus the 0.6s of silence that closed it
    assert_eq!(segment.len(), 8000 + 6 * CHUNK);
    assert_eq!(segmenter.state(), SegmenterState::Idle);
    assert_eq!(segmenter.buffered(), 0);
}

#[test]
fn test_short_noise_is_discarded() {
    let mut segmenter = SpeechSegmenter::new();

    assert!(feed(&mut segmenter, &generate_sine_samples(440.0, 0.1, 0.3)).is_none());
    assert_eq!(segmenter.state(), SegmenterState::Speech);

    assert!(feed(&mut segmenter, &generate_silence(1.2)).is_none());
    assert_eq!(segmenter.state(), SegmenterState::Idle);
}

#[test]
fn test_long_speech_is_capped() {
    let mut segmenter = SpeechSegmenter::new();

    let segment = feed(&mut segmenter, &generate_sine_samples(440.0, 31.0, 0.3))
        .expect("segment should be cut at the cap");
    assert_eq!(segment.len(), SAMPLE_RATE as usize * 30);
}

#[test]
fn test_reset_discards_partial_segment() {
    let mut segmenter = SpeechSegmenter::new();
    feed(&mut segmenter, &generate_sine_samples(440.0, 0.2, 0.3));
    assert!(segmenter.buffered() > 0);

    segmenter.reset();
    assert_eq!(segmenter.state(), SegmenterState::Idle);
    assert_eq!(segmenter.buffered(), 0);
}

#[test]
fn test_samples_to_wav() {
    let samples = generate_sine_samples(440.0, 0.1, 0.5);
    let wav_data = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    // Check WAV header magic
    assert_eq!(&wav_data[0..4], b"RIFF");
    assert_eq!(&wav_data[8..12], b"WAVE");
    assert!(wav_data.len() > 44);
}

#[test]
fn test_wav_readback() {
    let original_samples: Vec<f32> = vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25];
    let wav_data = samples_to_wav(&original_samples, SAMPLE_RATE).unwrap();

    let mut reader = hound::WavReader::new(Cursor::new(wav_data)).unwrap();

    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);

    let read_samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read_samples, vec![0, 16383, -16383, 32767, -32767, 8191]);
}

// Supervisors

/// Recognizer that replays a script of results, then waits forever
struct ScriptedRecognizer {
    script: VecDeque<Result<String>>,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl ScriptedRecognizer {
    fn new(script: Vec<Result<String>>) -> Self {
        Self {
            script: script.into(),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn log(&self) -> Arc<Mutex<Vec<&'static str>>> {
        Arc::clone(&self.log)
    }
}

#[async_trait(?Send)]
impl Recognizer for ScriptedRecognizer {
    async fn start(&mut self) -> Result<()> {
        self.log.lock().unwrap().push("start");
        Ok(())
    }

    async fn stop(&mut self) {
        self.log.lock().unwrap().push("stop");
    }

    async fn recognize(&mut self) -> Result<String> {
        match self.script.pop_front() {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }
}

fn calls(log: &Arc<Mutex<Vec<&'static str>>>) -> Vec<&'static str> {
    log.lock().unwrap().clone()
}

async fn next_event(events: &mut mpsc::Receiver<Event>) -> Event {
    tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

#[tokio::test(start_paused = true)]
async fn test_capture_follows_desired_state() {
    let (desired_tx, desired_rx) = watch::channel(false);
    let (events_tx, mut events) = mpsc::channel(8);
    let mut recognizer = ScriptedRecognizer::new(vec![Ok("hey jarvis".to_string())]);
    let log = recognizer.log();

    let (live_tx, live_rx) = watch::channel(false);

    let supervisor = run_capture(
        &mut recognizer,
        desired_rx,
        live_tx,
        events_tx,
        Duration::from_secs(1),
    );
    let driver = async {
        tokio::task::yield_now().await;
        assert!(calls(&log).is_empty());
        assert!(!*live_rx.borrow());

        desired_tx.send_replace(true);
        assert_eq!(
            next_event(&mut events).await,
            Event::UtteranceRecognized("hey jarvis".to_string())
        );
        assert!(*live_rx.borrow());

        desired_tx.send_replace(false);
        wait_until(|| !*live_rx.borrow()).await;
        assert_eq!(calls(&log), ["start", "stop"]);

        drop(desired_tx);
    };

    tokio::join!(supervisor, driver);
    assert_eq!(calls(&log), ["start", "stop"]);
}

#[tokio::test(start_paused = true)]
async fn test_capture_failure_restarts_after_delay() {
    let (desired_tx, desired_rx) = watch::channel(true);
    let (events_tx, mut events) = mpsc::channel(8);
    let mut recognizer = ScriptedRecognizer::new(vec![
        Err(Error::Capture("microphone unplugged".to_string())),
        Ok("hello".to_string()),
    ]);
    let log = recognizer.log();
    let (live_tx, _live_rx) = watch::channel(false);

    let supervisor = run_capture(
        &mut recognizer,
        desired_rx,
        live_tx,
        events_tx,
        Duration::from_secs(1),
    );
    let driver = async {
        assert!(matches!(next_event(&mut events).await, Event::CaptureFailed(_)));
        let failed_at = Instant::now();

        assert_eq!(
            next_event(&mut events).await,
            Event::UtteranceRecognized("hello".to_string())
        );
        assert_eq!(failed_at.elapsed(), Duration::from_secs(1));

        drop(desired_tx);
    };

    tokio::join!(supervisor, driver);
    assert_eq!(calls(&log), ["start", "stop", "start", "stop"]);
}

#[tokio::test(start_paused = true)]
async fn test_capture_not_restarted_when_no_longer_desired() {
    let (desired_tx, desired_rx) = watch::channel(true);
    let (events_tx, mut events) = mpsc::channel(8);
    let mut recognizer =
        ScriptedRecognizer::new(vec![Err(Error::Capture("device busy".to_string()))]);
    let log = recognizer.log();
    let (live_tx, live_rx) = watch::channel(false);

    let supervisor = run_capture(
        &mut recognizer,
        desired_rx,
        live_tx,
        events_tx,
        Duration::from_secs(1),
    );
    let driver = async {
        assert!(matches!(next_event(&mut events).await, Event::CaptureFailed(_)));
        desired_tx.send_replace(false);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(calls(&log), ["start", "stop"]);
        assert!(!*live_rx.borrow());

        drop(desired_tx);
    };

    tokio::join!(supervisor, driver);
}

/// Synthesizer that records what it spoke and fails on demand
#[derive(Default)]
struct RecordingSynthesizer {
    spoken: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Synthesizer for RecordingSynthesizer {
    async fn speak(&self, text: &str) -> Result<()> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        self.spoken.lock().unwrap().push(text.to_string());
        if text == "fail" {
            return Err(Error::Tts("quota exceeded".to_string()));
        }
        Ok(())
    }
}

fn request(id: u64, text: &str, exclusive: bool) -> SpeechRequest {
    SpeechRequest {
        id: SpeechId(id),
        text: text.to_string(),
        exclusive,
    }
}

#[tokio::test(start_paused = true)]
async fn test_speaker_reports_every_completion_in_order() {
    let synthesizer = RecordingSynthesizer::default();
    let spoken = Arc::clone(&synthesizer.spoken);
    let (requests_tx, requests_rx) = mpsc::unbounded_channel();
    let (_live_tx, live_rx) = watch::channel(false);
    let (events_tx, mut events) = mpsc::channel(8);

    let speaker = tokio::spawn(async move {
        run_speaker(&synthesizer, requests_rx, live_rx, events_tx).await;
    });

    requests_tx
        .send(request(1, "Hello, how may I help you?", false))
        .unwrap();
    requests_tx.send(request(2, "fail", true)).unwrap();
    requests_tx.send(request(3, "Done.", true)).unwrap();

    for id in 1..=3 {
        assert_eq!(
            next_event(&mut events).await,
            Event::SynthesisCompleted(SpeechId(id))
        );
    }
    assert_eq!(
        *spoken.lock().unwrap(),
        ["Hello, how may I help you?", "fail", "Done."]
    );

    drop(requests_tx);
    speaker.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_speaker_holds_reply_until_microphone_closed() {
    let synthesizer = RecordingSynthesizer::default();
    let spoken = Arc::clone(&synthesizer.spoken);
    let (requests_tx, requests_rx) = mpsc::unbounded_channel();
    let (live_tx, live_rx) = watch::channel(true);
    let (events_tx, mut events) = mpsc::channel(8);

    let speaker = tokio::spawn(async move {
        run_speaker(&synthesizer, requests_rx, live_rx, events_tx).await;
    });

    // The greeting does not wait for the microphone
    requests_tx.send(request(1, "I'm listening.", false)).unwrap();
    assert_eq!(
        next_event(&mut events).await,
        Event::SynthesisCompleted(SpeechId(1))
    );

    requests_tx.send(request(2, "It is noon.", true)).unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(events.try_recv().is_err());
    assert_eq!(*spoken.lock().unwrap(), ["I'm listening."]);

    live_tx.send_replace(false);
    assert_eq!(
        next_event(&mut events).await,
        Event::SynthesisCompleted(SpeechId(2))
    );
    assert_eq!(*spoken.lock().unwrap(), ["I'm listening.", "It is noon."]);

    drop(requests_tx);
    speaker.await.unwrap();
}
