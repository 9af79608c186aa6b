mod elevenlabs;
mod player;

use crate::tone::VoiceConfig;
use bytes::Bytes;
use futures::future::BoxFuture;

pub use elevenlabs::ElevenLabsClient;
pub use player::{PlaybackState, TonePlayer};

pub const AUDIO_MPEG: &str = "audio/mpeg";

#[derive(Clone, Debug, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: VoiceConfig,
}

/// Encoded audio as returned by the synthesis service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpeechAudio {
    pub mime: &'static str,
    pub data: Bytes,
}

#[derive(thiserror::Error, Debug)]
pub enum TtsError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("speech quota exhausted")]
    QuotaExhausted,

    #[error("speech api error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("nothing to synthesize")]
    EmptyText,
}

pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize(&self, request: SpeechRequest) -> BoxFuture<'_, Result<SpeechAudio, TtsError>>;
}
