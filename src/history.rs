use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::types::{NowPlaying, Scrobble};

/// Maximum number of entries kept in the local history
pub const MAX_HISTORY_ENTRIES: usize = 50;

/// What kind of submission a history entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    Scrobble,
    NowPlaying,
}

impl std::fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryKind::Scrobble => write!(f, "scrobble"),
            HistoryKind::NowPlaying => write!(f, "now playing"),
        }
    }
}

/// One successful submission, as remembered on this device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub kind: HistoryKind,
    pub artist: String,
    pub track: String,
    pub album: Option<String>,
    /// Unix timestamp that was submitted (play start for scrobbles, submission time otherwise)
    pub timestamp: i64,
    /// When the entry was recorded locally
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn from_scrobble(scrobble: &Scrobble, created_at: DateTime<Utc>) -> Self {
        Self {
            kind: HistoryKind::Scrobble,
            artist: scrobble.artist.clone(),
            track: scrobble.track.clone(),
            album: scrobble.album.clone(),
            timestamp: scrobble.timestamp,
            created_at,
        }
    }

    pub fn from_now_playing(now_playing: &NowPlaying, created_at: DateTime<Utc>) -> Self {
        Self {
            kind: HistoryKind::NowPlaying,
            artist: now_playing.artist.clone(),
            track: now_playing.track.clone(),
            album: now_playing.album.clone(),
            timestamp: created_at.timestamp(),
            created_at,
        }
    }
}

/// Newest-first list of recent submissions, capped at [`MAX_HISTORY_ENTRIES`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "VecDeque<HistoryEntry>", into = "VecDeque<HistoryEntry>")]
pub struct ScrobbleHistory {
    entries: VecDeque<HistoryEntry>,
}

impl From<VecDeque<HistoryEntry>> for ScrobbleHistory {
    fn from(mut entries: VecDeque<HistoryEntry>) -> Self {
        entries.truncate(MAX_HISTORY_ENTRIES);
        Self { entries }
    }
}

impl From<ScrobbleHistory> for VecDeque<HistoryEntry> {
    fn from(history: ScrobbleHistory) -> Self {
        history.entries
    }
}

impl ScrobbleHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry at the front, dropping the oldest ones past the cap.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(MAX_HISTORY_ENTRIES);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(n: i64) -> HistoryEntry {
        let scrobble = Scrobble::new("Artist", format!("Track {n}"), 1_700_000_000 + n);
        HistoryEntry::from_scrobble(&scrobble, Utc.timestamp_opt(1_700_000_000 + n, 0).unwrap())
    }

    #[test]
    fn test_history_is_newest_first() {
        let mut history = ScrobbleHistory::new();
        history.record(entry(1));
        history.record(entry(2));

        let tracks: Vec<&str> = history.iter().map(|e| e.track.as_str()).collect();
        assert_eq!(tracks, vec!["Track 2", "Track 1"]);
        assert_eq!(history.latest().map(|e| e.timestamp), Some(1_700_000_002));
    }

    #[test]
    fn test_history_is_capped() {
        let mut history = ScrobbleHistory::new();
        for n in 0..(MAX_HISTORY_ENTRIES as i64 + 10) {
            history.record(entry(n));
        }

        assert_eq!(history.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(history.latest().unwrap().track, "Track 59");
        assert_eq!(history.iter().last().unwrap().track, "Track 10");
    }

    #[test]
    fn test_now_playing_entry_uses_creation_time() {
        let at = Utc.timestamp_opt(1_650_000_000, 0).unwrap();
        let now_playing = NowPlaying::new("Wilco", "Jesus, Etc.").with_album("Yankee Hotel Foxtrot");
        let entry = HistoryEntry::from_now_playing(&now_playing, at);

        assert_eq!(entry.kind, HistoryKind::NowPlaying);
        assert_eq!(entry.timestamp, 1_650_000_000);
        assert_eq!(entry.album.as_deref(), Some("Yankee Hotel Foxtrot"));
    }

    #[test]
    fn test_history_serializes_as_plain_list() {
        let mut history = ScrobbleHistory::new();
        history.record(entry(1));

        let json = serde_json::to_string(&history).unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("\"kind\":\"scrobble\""));

        let restored: ScrobbleHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, history);
    }

    #[test]
    fn test_oversized_history_is_capped_on_load() {
        let entries: Vec<HistoryEntry> = (0..60).rev().map(entry).collect();
        let json = serde_json::to_string(&entries).unwrap();

        let history: ScrobbleHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(history.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(history.latest().unwrap().track, "Track 59");
        assert_eq!(history.iter().last().unwrap().track, "Track 10");
    }
}
