use crate::analysis::{Sentiment, MAX_CONFIDENCE};
use crate::tone::Tone;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Partially recovered result. Fields left `None` are filled from the shared
/// defaults when the draft is finished.
#[derive(Debug, Default, PartialEq)]
pub(super) struct Draft {
    pub sentiment: Option<Sentiment>,
    pub confidence: Option<u8>,
    pub emotions: Vec<String>,
    pub analysis: Option<String>,
    pub confusing: Vec<String>,
    pub tone: Option<Tone>,
}

struct FieldPatterns {
    sentiment: Regex,
    confidence: Regex,
    emotions: Regex,
    quoted: Regex,
    tone: Regex,
}

static FIELD_PATTERNS: LazyLock<Result<FieldPatterns, regex::Error>> =
    LazyLock::new(compile_field_patterns);

fn compile_field_patterns() -> Result<FieldPatterns, regex::Error> {
    Ok(FieldPatterns {
        sentiment: Regex::new(r#"(?i)"sentiment"\s*:\s*"(positive|negative)""#)?,
        confidence: Regex::new(r#""confidence"\s*:\s*(\d+)"#)?,
        emotions: Regex::new(r#"(?s)"emotions"\s*:\s*\[(.*?)\]"#)?,
        quoted: Regex::new(r#""([^"]*)""#)?,
        tone: Regex::new(r#"(?i)"tone"\s*:\s*"(friendly|formal|excited|calm)""#)?,
    })
}

fn field_patterns() -> Result<&'static FieldPatterns, regex::Error> {
    FIELD_PATTERNS.as_ref().map_err(Clone::clone)
}

/// Greedy `{ ... }` span: first opening brace to last closing brace.
pub(super) fn json_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Parses the span as JSON. Fields that are missing or outside their domain
/// are left for the defaults instead of rejecting the whole object.
pub(super) fn strict_json(span: &str) -> Option<Draft> {
    let value: Value = serde_json::from_str(span).ok()?;
    let obj = value.as_object()?;

    Some(Draft {
        sentiment: str_field(obj, "sentiment").and_then(|s| s.parse().ok()),
        confidence: obj.get("confidence").and_then(confidence_value),
        emotions: string_list(obj, "emotions"),
        analysis: str_field(obj, "analysis").map(str::to_owned),
        confusing: string_list(obj, "potentially_confusing_elements"),
        tone: str_field(obj, "tone").and_then(|s| s.trim().parse().ok()),
    })
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

fn string_list(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

fn confidence_value(value: &Value) -> Option<u8> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    Some(n.round().clamp(0.0, f64::from(MAX_CONFIDENCE)) as u8)
}

/// Pulls individual fields out of a span that is JSON-shaped but does not
/// parse, typically because of unescaped quotes inside the free text. The
/// whole completion becomes the analysis text.
pub(super) fn field_recovery(raw: &str) -> Result<Draft, regex::Error> {
    let p = field_patterns()?;

    Ok(Draft {
        sentiment: recover_sentiment(p, raw),
        confidence: recover_confidence(p, raw),
        emotions: recover_emotions(p, raw),
        analysis: Some(raw.to_owned()),
        confusing: Vec::new(),
        tone: recover_tone(p, raw),
    })
}

/// No JSON structure at all: only an explicitly spelled-out tone is taken.
pub(super) fn plain_text(raw: &str) -> Result<Draft, regex::Error> {
    let p = field_patterns()?;

    Ok(Draft {
        analysis: Some(raw.to_owned()),
        tone: recover_tone(p, raw),
        ..Draft::default()
    })
}

fn recover_sentiment(p: &FieldPatterns, raw: &str) -> Option<Sentiment> {
    let found: Vec<Sentiment> = p
        .sentiment
        .captures_iter(raw)
        .filter_map(|c| c[1].parse().ok())
        .collect();

    [Sentiment::Positive, Sentiment::Negative]
        .into_iter()
        .find(|s| found.contains(s))
}

fn recover_confidence(p: &FieldPatterns, raw: &str) -> Option<u8> {
    let digits = p.confidence.captures(raw)?.get(1)?.as_str();
    let n: u64 = digits.parse().ok()?;
    Some(n.min(u64::from(MAX_CONFIDENCE)) as u8)
}

fn recover_emotions(p: &FieldPatterns, raw: &str) -> Vec<String> {
    let Some(inner) = p.emotions.captures(raw).and_then(|c| c.get(1)) else {
        return Vec::new();
    };
    let inner = inner.as_str();

    if let Ok(list) = serde_json::from_str::<Vec<String>>(&format!("[{inner}]")) {
        return list;
    }

    p.quoted
        .captures_iter(inner)
        .map(|c| c[1].to_owned())
        .collect()
}

fn recover_tone(p: &FieldPatterns, raw: &str) -> Option<Tone> {
    p.tone.captures(raw).and_then(|c| c[1].parse().ok())
}
