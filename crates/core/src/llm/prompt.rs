use crate::tone::Tone;

/// Prompt asking the model for the analysis JSON. The allowed tone values are
/// spelled out so the normalizer rarely has to derive one.
pub fn build_analysis_prompt(text: &str) -> String {
    let tones = Tone::ALL.map(|t| t.as_str());
    let tone_list = tones.join(", ");
    let tone_alternatives = tones.join("|");

    format!(
        r#"Analyze the sentiment, tone, and emotional content of the following text for neurodiverse readers.
Be detailed and specific about the emotions you detect, and state whether the overall sentiment is positive, negative, or neutral.
Give a confidence score from 0-100 for your analysis.
Point out anything that could be confusing or ambiguous for neurodiverse readers: underlying social cues, subtext and likely misreadings (for example "this phrasing sounds polite but could come across as dismissive", "the trailing '...' may signal hesitation", or "this looks like sarcasm"). Put that context into the analysis text, since these readers may miss such nuances.

IMPORTANT: the tone field MUST be exactly one of: {tone_list}.

Reply with JSON ONLY, in EXACTLY this structure:
{{
  "sentiment": "positive|negative|neutral",
  "confidence": number from 0-100,
  "emotions": ["emotion1", "emotion2", ...],
  "tone": "{tone_alternatives}",
  "analysis": "detailed explanation",
  "potentially_confusing_elements": ["element1", "element2", ...]
}}

Text to analyze: {text}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_every_tone_and_embeds_text() {
        let prompt = build_analysis_prompt("see you tomorrow...");
        assert!(prompt.contains("friendly, formal, excited, calm"));
        assert!(prompt.contains(r#""tone": "friendly|formal|excited|calm""#));
        assert!(prompt.contains("\"potentially_confusing_elements\""));
        assert!(prompt.ends_with("Text to analyze: see you tomorrow..."));
    }
}
