//! Capture and playback supervisors
//!
//! Both loops translate between the conversation runtime (which only posts
//! intentions) and the audio collaborators (which do the slow work).

use std::time::Duration;

use tokio::sync::{mpsc, watch};

use super::recognizer::Recognizer;
use super::synthesizer::Synthesizer;
use crate::conversation::{Event, SpeechRequest};

/// Keep the recognizer running whenever `desired` is true
///
/// `live` mirrors the recognizer itself: it turns true before `start` is
/// called and false only once `stop` has returned, so a reader that sees
/// `false` knows the microphone is closed. Returns when the desired-state
/// sender or the event receiver is dropped.
pub async fn run_capture<R: Recognizer + ?Sized>(
    recognizer: &mut R,
    mut desired: watch::Receiver<bool>,
    live: watch::Sender<bool>,
    events: mpsc::Sender<Event>,
    restart_delay: Duration,
) {
    let mut running = false;

    loop {
        let want = *desired.borrow_and_update();

        if want && !running {
            live.send_replace(true);
            match recognizer.start().await {
                Ok(()) => {
                    tracing::debug!("capture started");
                    running = true;
                }
                Err(e) => {
                    live.send_replace(false);
                    if !report_failure(&events, e.to_string()).await {
                        return;
                    }
                    if !retry_after(&mut desired, restart_delay).await {
                        return;
                    }
                    continue;
                }
            }
        } else if !want && running {
            shut_down(recognizer, &live).await;
            tracing::debug!("capture stopped");
            running = false;
        }

        if !running {
            if desired.changed().await.is_err() {
                return;
            }
            continue;
        }

        tokio::select! {
            changed = desired.changed() => {
                if changed.is_err() {
                    shut_down(recognizer, &live).await;
                    return;
                }
            }
            result = recognizer.recognize() => match result {
                Ok(text) => {
                    tracing::debug!(transcript = %text, "utterance recognized");
                    if events.send(Event::UtteranceRecognized(text)).await.is_err() {
                        shut_down(recognizer, &live).await;
                        return;
                    }
                }
                Err(e) => {
                    shut_down(recognizer, &live).await;
                    running = false;
                    if !report_failure(&events, e.to_string()).await {
                        return;
                    }
                    if !retry_after(&mut desired, restart_delay).await {
                        return;
                    }
                }
            },
        }
    }
}

async fn shut_down<R: Recognizer + ?Sized>(recognizer: &mut R, live: &watch::Sender<bool>) {
    recognizer.stop().await;
    live.send_replace(false);
}

async fn report_failure(events: &mpsc::Sender<Event>, reason: String) -> bool {
    tracing::warn!(error = %reason, "capture failed");
    events.send(Event::CaptureFailed(reason)).await.is_ok()
}

/// Wait out the restart delay; a change of desired state cuts it short
async fn retry_after(desired: &mut watch::Receiver<bool>, delay: Duration) -> bool {
    tokio::select! {
        () = tokio::time::sleep(delay) => true,
        changed = desired.changed() => changed.is_ok(),
    }
}

/// Speak queued requests in order, reporting each completion
///
/// Exclusive requests (replies) wait until `capture_live` reports the
/// microphone closed. A completion is posted even when synthesis fails so
/// the microphone is re-opened. Returns when the request queue closes.
pub async fn run_speaker<S: Synthesizer + ?Sized>(
    synthesizer: &S,
    mut requests: mpsc::UnboundedReceiver<SpeechRequest>,
    mut capture_live: watch::Receiver<bool>,
    events: mpsc::Sender<Event>,
) {
    while let Some(SpeechRequest {
        id,
        text,
        exclusive,
    }) = requests.recv().await
    {
        if exclusive && capture_live.wait_for(|live| !*live).await.is_err() {
            tracing::debug!(%id, "capture supervisor gone, dropping request");
            break;
        }

        tracing::debug!(%id, exclusive, "synthesis started");

        if let Err(e) = synthesizer.speak(&text).await {
            tracing::warn!(%id, error = %e, "speech synthesis failed");
        }

        if events.send(Event::SynthesisCompleted(id)).await.is_err() {
            break;
        }
    }

    tracing::debug!("speaker stopped");
}
