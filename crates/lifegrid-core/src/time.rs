//! Timeline beats and timestamp label handling.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::BeatId;

/// Render and parse format for fully specified beat timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One discrete time point of the input timeline.
///
/// Beats never merge; phase clustering only groups them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    /// Sequence position within the timeline, 0-based.
    pub id: BeatId,
    /// Raw label the beat was loaded with (a date, a year, or free text).
    pub label: String,
    /// Parsed timestamp when the label was recognizable as one.
    pub timestamp: Option<NaiveDateTime>,
}

impl Beat {
    /// Creates a beat, parsing the label into a timestamp when possible.
    pub fn new(id: BeatId, label: impl Into<String>) -> Self {
        let label = label.into();
        let timestamp = parse_beat_label(&label);
        Self {
            id,
            label,
            timestamp,
        }
    }

    /// Creates a beat with an already parsed timestamp.
    pub fn with_timestamp(id: BeatId, label: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            id,
            label: label.into(),
            timestamp: Some(timestamp),
        }
    }

    /// Returns the timestamp rendered as `%Y-%m-%d %H:%M:%S`, falling back
    /// to the raw label when the beat carries no parsed timestamp.
    pub fn timestamp_text(&self) -> String {
        match self.timestamp {
            Some(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
            None => self.label.clone(),
        }
    }
}

/// Parses a beat label into a timestamp.
///
/// Bare four digit labels are read as years pinned to January 1st midnight;
/// labels matching [`TIMESTAMP_FORMAT`] parse directly; anything else yields
/// `None` and the label is kept verbatim.
pub fn parse_beat_label(label: &str) -> Option<NaiveDateTime> {
    let trimmed = label.trim();
    if trimmed.len() == 4 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let expanded = format!("{trimmed}-01-01 00:00:00");
        return NaiveDateTime::parse_from_str(&expanded, TIMESTAMP_FORMAT).ok();
    }
    NaiveDateTime::parse_from_str(trimmed, TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_labels_expand_to_january_first() {
        let beat = Beat::new(BeatId::from_raw(0), "1997");
        assert_eq!(beat.timestamp_text(), "1997-01-01 00:00:00");
    }

    #[test]
    fn unparsable_labels_stay_verbatim() {
        let beat = Beat::new(BeatId::from_raw(3), "snapshot-3");
        assert!(beat.timestamp.is_none());
        assert_eq!(beat.timestamp_text(), "snapshot-3");
    }

    #[test]
    fn full_timestamps_round_trip() {
        let beat = Beat::new(BeatId::from_raw(1), "2004-06-15 10:30:00");
        assert_eq!(beat.timestamp_text(), "2004-06-15 10:30:00");
    }
}
