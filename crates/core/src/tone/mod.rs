mod voice;

use crate::analysis::Sentiment;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::LazyLock};

pub use voice::{resolve_voice_config, VoiceConfig, VoiceSettings, VOICE_TABLE};

const LOG_TARGET: &str = "tone";

/// Voice register used to pick a speech-synthesis style.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Friendly,
    Formal,
    Excited,
    Calm,
}

impl Tone {
    pub const ALL: [Tone; 4] = [Tone::Friendly, Tone::Formal, Tone::Excited, Tone::Calm];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Friendly => "friendly",
            Tone::Formal => "formal",
            Tone::Excited => "excited",
            Tone::Calm => "calm",
        }
    }

    pub fn voice(&self) -> &'static VoiceConfig {
        voice::voice_for(*self)
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("not a canonical tone: {0:?}")]
pub struct UnknownTone(pub String);

impl FromStr for Tone {
    type Err = UnknownTone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "friendly" => Ok(Tone::Friendly),
            "formal" => Ok(Tone::Formal),
            "excited" => Ok(Tone::Excited),
            "calm" => Ok(Tone::Calm),
            _ => Err(UnknownTone(s.to_owned())),
        }
    }
}

const FRIENDLY_WORDS: &str = "friendly|warm|kind|casual|conversational";
const FORMAL_WORDS: &str = "formal|professional|serious|businesslike|assertive";
const EXCITED_WORDS: &str = "excited|enthusiastic|energetic|passionate|upbeat";
const CALM_WORDS: &str = "calm|peaceful|relaxed|soothing|tranquil";

// Order matters: the first matching row wins. Negative-register adjectives
// only count in the "tone is X" form and are routed to formal / calm.
static TONE_PHRASES: LazyLock<Result<Vec<(Regex, Tone)>, regex::Error>> = LazyLock::new(|| {
    let rows = [
        (format!("tone is ({FRIENDLY_WORDS})"), Tone::Friendly),
        (format!("tone is ({FORMAL_WORDS})"), Tone::Formal),
        (format!("tone is ({EXCITED_WORDS})"), Tone::Excited),
        (format!("tone is ({CALM_WORDS})"), Tone::Calm),
        (format!("({FRIENDLY_WORDS}) tone"), Tone::Friendly),
        (format!("({FORMAL_WORDS}) tone"), Tone::Formal),
        (format!("({EXCITED_WORDS}) tone"), Tone::Excited),
        (format!("({CALM_WORDS}) tone"), Tone::Calm),
        ("tone is (aggressive|angry|impatient)".to_owned(), Tone::Formal),
        ("tone is (sad|melancholic|depressed)".to_owned(), Tone::Calm),
    ];

    rows.into_iter()
        .map(|(pattern, tone)| Regex::new(&format!("(?i){pattern}")).map(|re| (re, tone)))
        .collect()
});

pub(crate) fn tone_phrases() -> Result<&'static [(Regex, Tone)], regex::Error> {
    TONE_PHRASES.as_ref().map(Vec::as_slice).map_err(Clone::clone)
}

/// Looks for a tone-describing phrase ("tone is warm", "upbeat tone") in free
/// text and returns the tone of the first matching row of the phrase table.
pub fn resolve_tone_from_text(text: &str) -> Option<Tone> {
    match try_resolve_tone_from_text(text) {
        Ok(tone) => tone,
        Err(e) => {
            tracing::warn!(target: LOG_TARGET, error = %e, "tone phrase table unavailable");
            None
        }
    }
}

pub(crate) fn try_resolve_tone_from_text(text: &str) -> Result<Option<Tone>, regex::Error> {
    Ok(tone_phrases()?
        .iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map(|(_, tone)| *tone))
}

fn tone_for_emotion(emotion: &str) -> Option<Tone> {
    let tone = match emotion.to_lowercase().as_str() {
        "happy" | "joy" | "enthusiasm" | "excitement" | "energetic" | "optimistic" => {
            Tone::Excited
        }
        "grateful" | "relief" | "empathy" | "compassion" | "warmth" => Tone::Friendly,
        "calm" | "peaceful" | "relaxed" | "thoughtful" | "serene" | "satisfied"
        | "disappointment" | "sadness" | "concern" | "anxiety" | "worry" => Tone::Calm,
        "confident" | "serious" | "professional" | "determined" | "frustrated"
        | "irritation" | "annoyance" | "anger" | "stress" | "rage" | "impatience" => Tone::Formal,
        _ => return None,
    };
    Some(tone)
}

/// Derives a tone from the first recognised emotion label, falling back to the
/// overall sentiment when none of the labels is known.
pub fn resolve_tone_from_emotions(emotions: &[String], sentiment: Sentiment) -> Tone {
    emotions
        .iter()
        .find_map(|e| tone_for_emotion(e))
        .unwrap_or(match sentiment {
            Sentiment::Positive => Tone::Friendly,
            Sentiment::Negative => Tone::Formal,
            Sentiment::Neutral => Tone::Calm,
        })
}
