use super::utils::format_timestamp;
use lastfm_scrobble::{HistoryKind, Result, ScrobbleHistory, SessionStore};

pub fn handle_history(store: &impl SessionStore, limit: usize, clear: bool) -> Result<()> {
    if clear {
        store.save_history(&ScrobbleHistory::new())?;
        println!("🧹 History cleared.");
        return Ok(());
    }

    let history = store.load_history()?;
    if history.is_empty() {
        println!("No submissions yet.");
        return Ok(());
    }

    let shown = if limit == 0 { history.len() } else { limit };
    for entry in history.iter().take(shown) {
        let icon = match entry.kind {
            HistoryKind::Scrobble => "✅",
            HistoryKind::NowPlaying => "🎵",
        };
        let album = entry
            .album
            .as_deref()
            .map(|album| format!(" [{album}]"))
            .unwrap_or_default();
        println!(
            "{icon} {} - {}{album} ({}, {})",
            entry.artist,
            entry.track,
            entry.kind,
            format_timestamp(entry.timestamp)
        );
    }

    if shown < history.len() {
        println!("... and {} more", history.len() - shown);
    }
    Ok(())
}
