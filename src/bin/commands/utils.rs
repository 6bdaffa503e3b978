use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use lastfm_scrobble::{HistoryEntry, LastFmError, LastFmSession, Result, SessionStore};

/// Load the stored session or explain how to create one.
pub fn require_session(store: &impl SessionStore) -> Result<LastFmSession> {
    store.load_session()?.ok_or_else(|| {
        LastFmError::Auth("not connected; run `lastfm-scrobble auth` first".to_string())
    })
}

/// Drop the stored session when Last.fm no longer accepts its key.
pub fn forget_rejected_session(store: &impl SessionStore, error: &LastFmError) {
    if error.is_invalid_session() {
        println!("🔑 Last.fm no longer accepts the stored session; removing it.");
        println!("   Run `lastfm-scrobble auth` to connect again.");
        if let Err(e) = store.clear_session() {
            println!("⚠️  Warning: Failed to remove session: {e}");
        }
    }
}

/// Add a submission to the local history. Failures only warn; the
/// submission itself already went through.
pub fn record_history(store: &impl SessionStore, entry: HistoryEntry) {
    let result = store.load_history().and_then(|mut history| {
        history.record(entry);
        store.save_history(&history)
    });
    if let Err(e) = result {
        println!("⚠️  Warning: Failed to update history: {e}");
    }
}

/// Pick the scrobble timestamp from the command line options, defaulting to now.
pub fn resolve_timestamp(timestamp: Option<i64>, at: Option<&str>) -> Result<i64> {
    if let Some(timestamp) = timestamp {
        return Ok(timestamp);
    }
    match at {
        Some(at) => parse_local_datetime(at),
        None => Ok(Utc::now().timestamp()),
    }
}

/// Parse a local `YYYY-MM-DDTHH:MM` date and time into a Unix timestamp.
pub fn parse_local_datetime(value: &str) -> Result<i64> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%dT%H:%M").map_err(|_| {
        LastFmError::InvalidInput(format!(
            "Invalid date '{value}', expected YYYY-MM-DDTHH:MM"
        ))
    })?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp())
        .ok_or_else(|| {
            LastFmError::InvalidInput(format!("'{value}' does not exist in the local time zone"))
        })
}

/// Format a Unix timestamp relative to now, falling back to a date for old ones.
pub fn format_timestamp(timestamp: i64) -> String {
    let now = Utc::now().timestamp();

    if timestamp > now {
        return format!("{timestamp} (future timestamp)");
    }

    let ago = now.saturating_sub(timestamp);
    if ago < 60 {
        format!("{ago} seconds ago")
    } else if ago < 3600 {
        format!("{} minutes ago", ago / 60)
    } else if ago < 86400 {
        format!("{} hours ago", ago / 3600)
    } else {
        DateTime::<Utc>::from_timestamp(timestamp, 0)
            .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| timestamp.to_string())
    }
}
