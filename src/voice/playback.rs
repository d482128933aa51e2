//! Speaker playback
//!
//! Playback blocks the calling thread until the samples have been played, so
//! async callers go through [`play_mp3`], which runs it on the blocking pool.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use crate::{Error, Result};

/// Default playback sample rate (matches `OpenAI` TTS output)
pub const PLAYBACK_SAMPLE_RATE: u32 = 24000;

/// Grace period after the last sample before the stream is dropped
const DRAIN_DELAY: Duration = Duration::from_millis(100);

/// Plays audio to the default output device
pub struct AudioPlayback {
    device: cpal::Device,
    config: StreamConfig,
}

impl AudioPlayback {
    /// Open the default output device at 24kHz, mono or stereo
    ///
    /// # Errors
    ///
    /// Returns error if no suitable output device exists
    pub fn new() -> Result<Self> {
        Self::with_rate(PLAYBACK_SAMPLE_RATE)
    }

    /// Open the default output device at `sample_rate`, mono or stereo
    ///
    /// # Errors
    ///
    /// Returns error if no suitable output device exists
    pub fn with_rate(sample_rate: u32) -> Result<Self> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let rate = SampleRate(sample_rate);
        let supports = |channels: u16| {
            device.supported_output_configs().ok()?.find(|c| {
                c.channels() == channels && c.min_sample_rate() <= rate && c.max_sample_rate() >= rate
            })
        };

        let supported_config = supports(1)
            .or_else(|| supports(2))
            .ok_or_else(|| Error::Audio(format!("no {sample_rate} Hz output config found")))?;

        let config = supported_config.with_sample_rate(rate).config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            channels = config.channels,
            sample_rate,
            "speaker opened"
        );

        Ok(Self { device, config })
    }

    /// Play mono samples, blocking until done
    ///
    /// # Errors
    ///
    /// Returns error if the output stream fails
    pub fn play_blocking(&self, samples: Vec<f32>) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let channels = usize::from(self.config.channels);
        let sample_count = samples.len();
        let samples = Arc::new(samples);
        let position = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let stream = {
            let samples = Arc::clone(&samples);
            let position = Arc::clone(&position);
            let finished = Arc::clone(&finished);

            self.device
                .build_output_stream(
                    &self.config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        for frame in data.chunks_mut(channels) {
                            let pos = position.load(Ordering::Relaxed);
                            let sample = samples.get(pos).copied().unwrap_or_else(|| {
                                finished.store(true, Ordering::Release);
                                0.0
                            });
                            frame.fill(sample);
                            if pos < samples.len() {
                                position.store(pos + 1, Ordering::Relaxed);
                            }
                        }
                    },
                    |err| {
                        tracing::error!(error = %err, "speaker stream error");
                    },
                    None,
                )
                .map_err(|e| Error::Audio(e.to_string()))?
        };

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        let duration_ms = (sample_count as u64 * 1000) / u64::from(self.config.sample_rate.0);
        let timeout = Duration::from_millis(duration_ms + 500);
        let start = Instant::now();

        while !finished.load(Ordering::Acquire) && start.elapsed() < timeout {
            std::thread::sleep(Duration::from_millis(50));
        }

        std::thread::sleep(DRAIN_DELAY);
        drop(stream);
        tracing::debug!(samples = sample_count, "playback complete");

        Ok(())
    }
}

/// Mono samples decoded from an MP3 stream
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Samples in `-1.0..=1.0`
    pub samples: Vec<f32>,

    /// Rate of the first decoded frame
    pub sample_rate: u32,
}

/// Decode MP3 and play it on the default output device
///
/// The output stream is opened at the rate the audio was encoded with.
///
/// # Errors
///
/// Returns error if decoding or playback fails
pub async fn play_mp3(mp3_data: Vec<u8>) -> Result<()> {
    tokio::task::spawn_blocking(move || {
        let audio = decode_mp3(&mp3_data)?;
        if audio.samples.is_empty() {
            return Ok(());
        }
        AudioPlayback::with_rate(audio.sample_rate)?.play_blocking(audio.samples)
    })
    .await
    .map_err(|e| Error::Audio(format!("playback task failed: {e}")))?
}

/// Decode MP3 bytes to mono f32 samples
///
/// Empty input decodes to no samples at [`PLAYBACK_SAMPLE_RATE`].
///
/// # Errors
///
/// Returns error if the data is not valid MP3
pub fn decode_mp3(mp3_data: &[u8]) -> Result<DecodedAudio> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();
    let mut sample_rate = None;

    loop {
        let frame = match decoder.next_frame() {
            Ok(frame) => frame,
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        };

        if sample_rate.is_none() {
            sample_rate = u32::try_from(frame.sample_rate).ok();
        }

        if frame.channels == 2 {
            samples.extend(frame.data.chunks(2).map(|pair| {
                let left = f32::from(pair[0]) / 32768.0;
                let right = f32::from(pair.get(1).copied().unwrap_or(pair[0])) / 32768.0;
                f32::midpoint(left, right)
            }));
        } else {
            samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
        }
    }

    Ok(DecodedAudio {
        samples,
        sample_rate: sample_rate.unwrap_or(PLAYBACK_SAMPLE_RATE),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Silent MPEG-1 Layer III mono frames at 128 kbps
    fn silent_frames(sample_rate_bits: u8, frame_len: usize, count: usize) -> Vec<u8> {
        let mut frame = vec![0u8; frame_len];
        frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x90 | (sample_rate_bits << 2), 0xC0]);
        frame.repeat(count)
    }

    #[test]
    fn test_decode_empty_input() {
        let audio = decode_mp3(&[]).unwrap();
        assert!(audio.samples.is_empty());
        assert_eq!(audio.sample_rate, PLAYBACK_SAMPLE_RATE);
    }

    #[test]
    fn test_decode_reports_encoded_rate() {
        // 44.1 kHz, as ElevenLabs returns by default
        let audio = decode_mp3(&silent_frames(0b00, 417, 20)).unwrap();
        assert_eq!(audio.sample_rate, 44100);
        assert!(!audio.samples.is_empty());
        assert!(audio.samples.iter().all(|s| s.abs() < f32::EPSILON));

        let audio = decode_mp3(&silent_frames(0b01, 384, 20)).unwrap();
        assert_eq!(audio.sample_rate, 48000);
    }
}
