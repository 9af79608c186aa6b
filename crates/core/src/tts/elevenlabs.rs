use crate::config::{ApiKey, SpeechConfig};
use crate::tone::VoiceSettings;
use crate::tts::{SpeechAudio, SpeechRequest, SpeechSynthesizer, TtsError, AUDIO_MPEG};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;

const LOG_TARGET: &str = "tts::elevenlabs";

#[derive(Clone)]
pub struct ElevenLabsClient {
    client: Client,
    api_key: ApiKey,
    config: SpeechConfig,
}

impl ElevenLabsClient {
    pub fn new(api_key: ApiKey, config: SpeechConfig) -> Self {
        Self {
            client: Client::new(),
            api_key,
            config,
        }
    }
}

#[derive(Serialize)]
struct ElevenLabsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// Best human-readable message from an error body, which may be JSON with a
/// `message`, `error` or `detail.message` field, or not JSON at all.
fn api_error_message(body: &str, fallback: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return fallback.to_owned();
    };
    let message = [
        json.get("message"),
        json.get("error"),
        json.pointer("/detail/message"),
        json.get("detail"),
    ]
    .into_iter()
    .flatten()
    .find_map(Value::as_str)
    .unwrap_or(fallback)
    .to_owned();
    message
}

fn is_quota_error(status: StatusCode, body: &str) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || body.contains("quota_exceeded")
}

impl SpeechSynthesizer for ElevenLabsClient {
    fn synthesize(&self, request: SpeechRequest) -> BoxFuture<'_, Result<SpeechAudio, TtsError>> {
        let this = self.clone();
        async move {
            if request.text.trim().is_empty() {
                return Err(TtsError::EmptyText);
            }

            let url = this.config.base_url.join(&format!(
                "text-to-speech/{}",
                urlencoding::encode(request.voice.voice_id)
            ));

            let body = ElevenLabsRequest {
                text: &request.text,
                model_id: &this.config.model_id,
                voice_settings: request.voice.settings,
            };

            tracing::debug!(target: LOG_TARGET, voice = request.voice.name, chars = request.text.chars().count(), "requesting speech");

            let response = this
                .client
                .post(&url)
                .header("xi-api-key", this.api_key.expose())
                .header("Accept", AUDIO_MPEG)
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                if is_quota_error(status, &text) {
                    tracing::warn!(target: LOG_TARGET, "ElevenLabs quota exhausted");
                    return Err(TtsError::QuotaExhausted);
                }
                let fallback = status.canonical_reason().unwrap_or("Unknown error");
                return Err(TtsError::Api {
                    status: status.as_u16(),
                    message: api_error_message(&text, fallback),
                });
            }

            let data = response.bytes().await?;
            Ok(SpeechAudio {
                mime: AUDIO_MPEG,
                data,
            })
        }
        .boxed()
    }
}
