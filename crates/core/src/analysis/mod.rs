//! Analysis result model and the normalizer that coerces a model completion
//! into it.
//!
//! The model is asked for strict JSON but regularly wraps it in prose, leaves
//! quotes unescaped or drops fields. [`normalize`] never fails: it degrades
//! from a fully parsed object, to field-by-field recovery, to plain-text
//! fallback, to a fixed safe default.

mod normalize;
mod recover;

use crate::tone::Tone;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub use normalize::{normalize, try_normalize, NormalizeError};

pub const DEFAULT_CONFIDENCE: u8 = 50;
pub const MAX_CONFIDENCE: u8 = 100;
pub const FALLBACK_ANALYSIS: &str =
    "We encountered an error analyzing your text. Please try again with different wording.";

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("not a sentiment: {0:?}")]
pub struct UnknownSentiment(pub String);

impl FromStr for Sentiment {
    type Err = UnknownSentiment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            _ => Err(UnknownSentiment(s.to_owned())),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisResult {
    pub sentiment: Sentiment,
    /// 0..=100
    pub confidence: u8,
    pub emotions: Vec<String>,
    pub analysis: String,
    pub potentially_confusing_elements: Vec<String>,
    pub tone: Tone,
}

impl AnalysisResult {
    /// Result handed out when the completion could not be processed at all.
    pub fn fallback() -> Self {
        Self {
            sentiment: Sentiment::Neutral,
            confidence: DEFAULT_CONFIDENCE,
            emotions: Vec::new(),
            analysis: FALLBACK_ANALYSIS.to_owned(),
            potentially_confusing_elements: Vec::new(),
            tone: Tone::Formal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_neutral_formal_with_canned_message() {
        let r = AnalysisResult::fallback();
        assert_eq!(r.sentiment, Sentiment::Neutral);
        assert_eq!(r.confidence, 50);
        assert!(r.emotions.is_empty());
        assert!(r.potentially_confusing_elements.is_empty());
        assert_eq!(r.analysis, FALLBACK_ANALYSIS);
        assert_eq!(r.tone, Tone::Formal);
    }

    #[test]
    fn serializes_with_lowercase_enums() {
        let json = serde_json::to_value(AnalysisResult::fallback()).expect("serializable");
        assert_eq!(json["sentiment"], "neutral");
        assert_eq!(json["tone"], "formal");
        assert_eq!(json["potentially_confusing_elements"], serde_json::json!([]));
    }

    #[test]
    fn sentiment_parses_loosely() {
        assert_eq!(" Positive ".parse::<Sentiment>(), Ok(Sentiment::Positive));
        assert!("mixed".parse::<Sentiment>().is_err());
    }
}
