use crate::analysis::recover::{self, Draft};
use crate::analysis::{AnalysisResult, DEFAULT_CONFIDENCE};
use crate::tone::{resolve_tone_from_emotions, try_resolve_tone_from_text};

const LOG_TARGET: &str = "analysis::normalize";

#[derive(thiserror::Error, Debug, Clone)]
pub enum NormalizeError {
    #[error("recovery pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    StrictJson,
    FieldRecovery,
    PlainText,
}

/// Turns a raw model completion into a fully populated [`AnalysisResult`].
/// Never fails; anything unprocessable yields [`AnalysisResult::fallback`].
pub fn normalize(raw: &str) -> AnalysisResult {
    or_fallback(try_normalize(raw))
}

fn or_fallback(outcome: Result<AnalysisResult, NormalizeError>) -> AnalysisResult {
    outcome.unwrap_or_else(|e| {
        tracing::error!(target: LOG_TARGET, error = %e, "completion could not be processed, using safe default");
        AnalysisResult::fallback()
    })
}

pub fn try_normalize(raw: &str) -> Result<AnalysisResult, NormalizeError> {
    let (stage, draft) = match recover::json_span(raw) {
        Some(span) => match recover::strict_json(span) {
            Some(draft) => (Stage::StrictJson, draft),
            None => {
                tracing::warn!(target: LOG_TARGET, "json span did not parse, recovering fields");
                (Stage::FieldRecovery, recover::field_recovery(raw)?)
            }
        },
        None => {
            tracing::warn!(target: LOG_TARGET, "no json structure in completion, using raw text");
            (Stage::PlainText, recover::plain_text(raw)?)
        }
    };

    let explicit_tone = draft.tone.is_some();
    let result = finish(draft, raw)?;

    tracing::debug!(
        target: LOG_TARGET,
        ?stage,
        explicit_tone,
        sentiment = %result.sentiment,
        tone = %result.tone,
        "completion normalized"
    );
    Ok(result)
}

/// Applies the shared defaults and fills in a missing tone: first from tone
/// phrases in the analysis text, then from emotions and sentiment.
///
/// Phrase matching only sees text the draft supplied as its analysis. A parsed
/// object without an `analysis` field goes straight to emotions and sentiment.
fn finish(draft: Draft, raw: &str) -> Result<AnalysisResult, NormalizeError> {
    let sentiment = draft.sentiment.unwrap_or_default();

    let from_text = match draft.tone {
        Some(_) => None,
        None => match draft.analysis.as_deref() {
            Some(analysis) => try_resolve_tone_from_text(analysis)?,
            None => None,
        },
    };
    let tone = draft
        .tone
        .or(from_text)
        .unwrap_or_else(|| resolve_tone_from_emotions(&draft.emotions, sentiment));
    let analysis = draft.analysis.unwrap_or_else(|| raw.to_owned());

    Ok(AnalysisResult {
        sentiment,
        confidence: draft.confidence.unwrap_or(DEFAULT_CONFIDENCE),
        emotions: draft.emotions,
        analysis,
        potentially_confusing_elements: draft.confusing,
        tone,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Sentiment;
    use crate::tone::Tone;

    #[test]
    fn well_formed_json_with_tone_is_taken_verbatim() {
        let raw = r#"Here you go:
{
  "sentiment": "positive",
  "confidence": 92,
  "emotions": ["joy", "gratitude"],
  "tone": "calm",
  "analysis": "The writer thanks the team warmly.",
  "potentially_confusing_elements": ["\"as usual\" may read as sarcasm"]
}
Hope that helps."#;
        let r = normalize(raw);
        assert_eq!(r.sentiment, Sentiment::Positive);
        assert_eq!(r.confidence, 92);
        assert_eq!(r.emotions, vec!["joy", "gratitude"]);
        assert_eq!(r.tone, Tone::Calm);
        assert_eq!(r.analysis, "The writer thanks the team warmly.");
        assert_eq!(
            r.potentially_confusing_elements,
            vec!["\"as usual\" may read as sarcasm"]
        );
    }

    #[test]
    fn missing_tone_taken_from_analysis_phrase() {
        let raw = r#"{"sentiment": "neutral", "confidence": 70, "emotions": ["anger"],
            "analysis": "Overall the tone is friendly and relaxed.",
            "potentially_confusing_elements": []}"#;
        assert_eq!(normalize(raw).tone, Tone::Friendly);
    }

    #[test]
    fn missing_tone_derived_from_emotions_then_sentiment() {
        let grateful = r#"{"sentiment": "negative", "confidence": 60, "emotions": ["grateful"],
            "analysis": "Thanks for nothing.", "potentially_confusing_elements": []}"#;
        assert_eq!(normalize(grateful).tone, Tone::Friendly);

        let empty = r#"{"sentiment": "negative", "confidence": 60, "emotions": [],
            "analysis": "Short reply.", "potentially_confusing_elements": []}"#;
        assert_eq!(normalize(empty).tone, Tone::Formal);
    }

    #[test]
    fn empty_or_braceless_text_uses_defaults() {
        for raw in ["", "just some prose without structure"] {
            let r = normalize(raw);
            assert_eq!(r.confidence, 50);
            assert_eq!(r.sentiment, Sentiment::Neutral);
            assert!(r.emotions.is_empty());
            assert!(r.potentially_confusing_elements.is_empty());
            assert_eq!(r.analysis, raw);
            assert_eq!(r.tone, Tone::Calm);
        }
    }

    #[test]
    fn aggressive_prose_maps_to_formal() {
        let r = normalize("The tone is aggressive and rude.");
        assert_eq!(r.tone, Tone::Formal);
        assert_eq!(r.analysis, "The tone is aggressive and rude.");
    }

    #[test]
    fn unescaped_quote_recovers_fields() {
        let raw = r#"{"sentiment": "positive", "confidence": 87, "emotions": ["joy", "hope"], "analysis": "Text contains a "quote" that breaks parsing.", "potentially_confusing_elements": []}"#;
        let r = normalize(raw);
        assert_eq!(r.sentiment, Sentiment::Positive);
        assert_eq!(r.confidence, 87);
        assert!(r.emotions.iter().any(|e| e == "joy"));
        assert_eq!(r.analysis, raw);
        assert!(r.potentially_confusing_elements.is_empty());
        // joy is the first known emotion
        assert_eq!(r.tone, Tone::Excited);
    }

    #[test]
    fn recovery_prefers_explicit_tone_over_phrases() {
        let raw = r#"{"sentiment": "negative", "tone": "friendly", "analysis": "the tone is "sad""}"#;
        assert_eq!(normalize(raw).tone, Tone::Friendly);
    }

    #[test]
    fn recovery_uses_tone_phrase_in_raw_text() {
        let raw = r#"{"sentiment": "positive", "analysis": "an upbeat tone with "air quotes""}"#;
        let r = normalize(raw);
        assert_eq!(r.tone, Tone::Excited);
        assert_eq!(r.confidence, 50);
    }

    #[test]
    fn non_canonical_tone_is_resolved_like_a_missing_one() {
        let raw = r#"{"sentiment": "positive", "confidence": 80, "emotions": [],
            "tone": "cheerful", "analysis": "Nice.", "potentially_confusing_elements": []}"#;
        assert_eq!(normalize(raw).tone, Tone::Friendly);
    }

    #[test]
    fn parsed_object_without_analysis_ignores_phrases_elsewhere() {
        let raw = r#"{"sentiment":"positive","note":"the tone is sad"}"#;
        let r = normalize(raw);
        assert_eq!(r.tone, Tone::Friendly);
        assert_eq!(r.analysis, raw);

        let with_emotion = r#"{"sentiment":"negative","emotions":["calm"],"note":"an upbeat tone"}"#;
        assert_eq!(normalize(with_emotion).tone, Tone::Calm);
    }

    #[test]
    fn processing_error_yields_safe_default() {
        let err = regex::Regex::new("(").expect_err("unbalanced group");
        assert_eq!(
            or_fallback(Err(NormalizeError::Pattern(err))),
            AnalysisResult::fallback()
        );

        let ok = normalize(r#"{"sentiment":"positive","tone":"excited"}"#);
        assert_eq!(or_fallback(Ok(ok.clone())), ok);
    }

    #[test]
    fn pattern_tables_compile() {
        assert!(crate::tone::tone_phrases().is_ok());
        assert!(try_normalize("the tone is warm").is_ok());
        assert!(try_normalize(r#"{"sentiment": "positive", "broken"}"#).is_ok());
    }

    #[test]
    fn parsed_object_without_analysis_keeps_raw_text() {
        let raw = r#"{"sentiment": "positive"}"#;
        let r = normalize(raw);
        assert_eq!(r.analysis, raw);
        assert_eq!(r.confidence, 50);
        assert_eq!(r.tone, Tone::Friendly);
    }
}
