use crate::tone::Tone;
use crate::tts::{SpeechAudio, SpeechRequest, SpeechSynthesizer, TtsError};
use tokio::sync::Mutex;

const LOG_TARGET: &str = "tts::player";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
}

#[derive(Debug)]
struct Slot {
    state: PlaybackState,
    clip: Option<SpeechAudio>,
}

/// Speaks one analysed text in the voice of its tone. The clip is synthesized
/// on the first `toggle` and reused afterwards until `release`.
pub struct TonePlayer<S> {
    synthesizer: S,
    text: String,
    tone: Tone,
    slot: Mutex<Slot>,
}

impl<S: SpeechSynthesizer> TonePlayer<S> {
    pub fn new<T: Into<String>>(synthesizer: S, text: T, tone: Tone) -> Self {
        Self {
            synthesizer,
            text: text.into(),
            tone,
            slot: Mutex::new(Slot {
                state: PlaybackState::Idle,
                clip: None,
            }),
        }
    }

    pub fn tone(&self) -> Tone {
        self.tone
    }

    pub async fn state(&self) -> PlaybackState {
        self.slot.lock().await.state
    }

    /// Play/pause. Synthesis failures leave the player idle with nothing cached.
    pub async fn toggle(&self) -> Result<PlaybackState, TtsError> {
        let mut slot = self.slot.lock().await;

        if slot.clip.is_some() {
            slot.state = match slot.state {
                PlaybackState::Playing => PlaybackState::Paused,
                PlaybackState::Paused | PlaybackState::Idle => PlaybackState::Playing,
            };
            return Ok(slot.state);
        }

        let voice = *self.tone.voice();
        tracing::info!(target: LOG_TARGET, tone = %self.tone, voice = voice.name, "generating speech");
        let audio = self
            .synthesizer
            .synthesize(SpeechRequest {
                text: self.text.clone(),
                voice,
            })
            .await
            .map_err(|e| {
                tracing::warn!(target: LOG_TARGET, error = %e, "speech generation failed");
                e
            })?;

        slot.clip = Some(audio);
        slot.state = PlaybackState::Playing;
        Ok(slot.state)
    }

    /// Playback reached the end; the clip stays cached for replay.
    pub async fn finished(&self) {
        let mut slot = self.slot.lock().await;
        if slot.state == PlaybackState::Playing {
            slot.state = PlaybackState::Paused;
        }
    }

    pub async fn clip(&self) -> Option<SpeechAudio> {
        self.slot.lock().await.clip.clone()
    }

    /// Drops the cached clip. Returns whether there was one.
    pub async fn release(&self) -> bool {
        let mut slot = self.slot.lock().await;
        slot.state = PlaybackState::Idle;
        slot.clip.take().is_some()
    }
}
