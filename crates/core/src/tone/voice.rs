use crate::tone::Tone;
use serde::Serialize;

/// Tuning knobs sent alongside a synthesis request.
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl VoiceSettings {
    const BASE: VoiceSettings = VoiceSettings {
        stability: 0.5,
        similarity_boost: 0.75,
        style: 0.0,
        use_speaker_boost: true,
    };

    const fn tuned(stability: f32, style: f32) -> Self {
        Self {
            stability,
            style,
            ..Self::BASE
        }
    }
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self::BASE
    }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct VoiceConfig {
    pub voice_id: &'static str,
    pub name: &'static str,
    pub settings: VoiceSettings,
}

/// One voice per canonical tone, in `Tone::ALL` order.
pub static VOICE_TABLE: [(Tone, VoiceConfig); 4] = [
    (
        Tone::Friendly,
        VoiceConfig {
            voice_id: "21m00Tcm4TlvDq8ikWAM",
            name: "Rachel",
            settings: VoiceSettings::tuned(0.7, 0.3),
        },
    ),
    (
        Tone::Formal,
        VoiceConfig {
            voice_id: "AZnzlk1XvdvUeBnXmlld",
            name: "Adam",
            settings: VoiceSettings::tuned(0.8, 0.1),
        },
    ),
    (
        Tone::Excited,
        VoiceConfig {
            voice_id: "EXAVITQu4vr4xnSDxMaL",
            name: "Bella",
            settings: VoiceSettings::tuned(0.4, 0.6),
        },
    ),
    (
        Tone::Calm,
        VoiceConfig {
            voice_id: "MF3mGyEYCl7XYWbV9V6O",
            name: "Elli",
            settings: VoiceSettings::tuned(0.9, 0.2),
        },
    ),
];

pub(crate) fn voice_for(tone: Tone) -> &'static VoiceConfig {
    let idx = match tone {
        Tone::Friendly => 0,
        Tone::Formal => 1,
        Tone::Excited => 2,
        Tone::Calm => 3,
    };
    &VOICE_TABLE[idx].1
}

/// Voice for a tone label as it arrives from outside; anything that is not a
/// canonical tone name gets the formal voice.
pub fn resolve_voice_config(tone: &str) -> &'static VoiceConfig {
    let tone = tone.trim().parse().unwrap_or(Tone::Formal);
    voice_for(tone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_in_canonical_order() {
        for (tone, (row_tone, cfg)) in Tone::ALL.iter().zip(VOICE_TABLE.iter()) {
            assert_eq!(tone, row_tone);
            assert_eq!(tone.voice(), cfg);
        }
    }

    #[test]
    fn unknown_tone_uses_formal_voice() {
        assert_eq!(resolve_voice_config("unknown-tone"), resolve_voice_config("formal"));
        assert_eq!(resolve_voice_config("").name, "Adam");
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let excited = resolve_voice_config("EXCITED");
        assert_eq!(excited.name, "Bella");
        assert_eq!(excited.voice_id, "EXAVITQu4vr4xnSDxMaL");
    }

    #[test]
    fn tuned_settings_keep_shared_defaults() {
        let calm = Tone::Calm.voice().settings;
        assert_eq!(calm.stability, 0.9);
        assert_eq!(calm.style, 0.2);
        assert_eq!(calm.similarity_boost, 0.75);
        assert!(calm.use_speaker_boost);
    }
}
