//! Acceptance policy for the curated catalog
//!
//! The policy is a pure function over a normalized, validated record. It
//! never touches status or score and performs no I/O, so the reprocessing
//! job can re-run it against quarantined records and trust the outcome.

use crate::models::{PolicyDecision, StreamRecord};

/// Identifier stamped on every rejection, so a later policy upgrade can be
/// told apart from a data change when auditing quarantine entries.
pub const POLICY_VERSION: &str = "pt-first-vod@1.0.0";

const REJECT_REASON: &str = "no PT audio or subtitles";

/// Declared-audio languages that count as Portuguese.
const PT_AUDIO_LANGS: [&str; 3] = ["pt", "pt-pt", "pt-br"];

/// Subtitle languages that count as Portuguese. Providers report both
/// BCP 47 tags and the ISO 639-2 codes `por`/`pob`.
const PT_SUBTITLE_LANGS: [&str; 5] = ["pt", "pt-pt", "pt-br", "por", "pob"];

pub fn is_pt_lang(lang: &str) -> bool {
    PT_SUBTITLE_LANGS.contains(&lang.to_lowercase().as_str())
}

/// Accepts a record when its declared language is a Portuguese variant, or
/// when any subtitle entry is in Portuguese. Deterministic: equal inputs
/// always yield equal decisions.
pub fn evaluate(record: &StreamRecord) -> PolicyDecision {
    if has_pt_audio(record) {
        return PolicyDecision {
            accept: true,
            reason: "PT audio".to_string(),
        };
    }

    if has_pt_subtitles(record) {
        return PolicyDecision {
            accept: true,
            reason: "PT subtitles".to_string(),
        };
    }

    PolicyDecision {
        accept: false,
        reason: REJECT_REASON.to_string(),
    }
}

fn has_pt_audio(record: &StreamRecord) -> bool {
    record
        .language
        .as_deref()
        .map(|lang| PT_AUDIO_LANGS.contains(&lang.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn has_pt_subtitles(record: &StreamRecord) -> bool {
    record.subtitles.iter().any(|sub| is_pt_lang(&sub.lang))
}
