//! Final shape check before persistence
//!
//! Records that reach the persistence stage have been through the
//! normalizer, so failures here mean a bug upstream or an adapter
//! emitting garbage. Failing records are counted and dropped by the
//! caller, this module only states what is wrong.

use crate::models::StreamRecord;

/// Validates the invariants the datastore relies on. Returns the
/// first violation found.
pub fn validate_stream_schema(stream: &StreamRecord) -> Result<(), String> {
    if stream.id.trim().is_empty() {
        return Err("missing id".to_string());
    }
    if stream.name.trim().is_empty() {
        return Err("missing name".to_string());
    }
    if stream.canonical_url.trim().is_empty() {
        return Err("missing canonical URL".to_string());
    }
    if !(0..=100).contains(&stream.score) {
        return Err(format!("score {} out of range", stream.score));
    }
    for (index, entry) in stream.subtitles.iter().enumerate() {
        if entry.lang.trim().is_empty() {
            return Err(format!("subtitle {} missing language", index));
        }
        if entry.url.trim().is_empty() {
            return Err(format!("subtitle {} missing url", index));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StreamStatus, StreamType, SubtitleEntry};
    use chrono::Utc;

    fn valid_record() -> StreamRecord {
        StreamRecord {
            id: "s1".into(),
            name: "Canal Um".into(),
            stream_type: StreamType::Iptv,
            url: "http://ex/live.m3u8".into(),
            canonical_url: "http://ex/live.m3u8".into(),
            country: Some("pt".into()),
            language: Some("pt".into()),
            category: "unknown".into(),
            media: serde_json::json!({}),
            subtitles: vec![SubtitleEntry {
                lang: "pt".into(),
                url: "http://subs/pt.srt".into(),
                source: Some("opensubtitles".into()),
                label: None,
                translated: false,
                synced: true,
            }],
            status: StreamStatus::Online,
            score: 100,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn well_formed_records_pass() {
        assert!(validate_stream_schema(&valid_record()).is_ok());
    }

    #[test]
    fn blank_identity_fields_fail() {
        let mut record = valid_record();
        record.id = "  ".into();
        assert_eq!(validate_stream_schema(&record), Err("missing id".to_string()));

        let mut record = valid_record();
        record.canonical_url.clear();
        assert_eq!(
            validate_stream_schema(&record),
            Err("missing canonical URL".to_string())
        );
    }

    #[test]
    fn score_must_stay_within_bounds() {
        let mut record = valid_record();
        record.score = 101;
        assert!(validate_stream_schema(&record).is_err());

        record.score = -1;
        assert!(validate_stream_schema(&record).is_err());

        record.score = 0;
        assert!(validate_stream_schema(&record).is_ok());
    }

    #[test]
    fn subtitle_entries_need_language_and_url() {
        let mut record = valid_record();
        record.subtitles[0].url.clear();
        assert_eq!(
            validate_stream_schema(&record),
            Err("subtitle 0 missing url".to_string())
        );
    }
}
