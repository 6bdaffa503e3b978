use super::utils::{forget_rejected_session, format_timestamp, record_history, require_session};
use chrono::Utc;
use lastfm_scrobble::{
    HistoryEntry, LastFmApiClientImpl, LastFmScrobbler, NowPlaying, Result, Scrobble,
    SessionStore,
};

pub async fn handle_now_playing(
    client: &LastFmApiClientImpl,
    store: &impl SessionStore,
    artist: String,
    track: String,
    album: Option<String>,
    duration: Option<u32>,
) -> Result<()> {
    let session = require_session(store)?;

    let mut now_playing = NowPlaying::new(artist, track);
    if let Some(album) = album {
        now_playing = now_playing.with_album(album);
    }
    now_playing.duration = duration;

    let ack = client
        .update_now_playing(&session.key, &now_playing)
        .await
        .inspect_err(|e| forget_rejected_session(store, e))?;

    record_history(store, HistoryEntry::from_now_playing(&now_playing, Utc::now()));

    if ack.is_ignored() {
        println!(
            "⚠️  Last.fm ignored the update for '{}' by '{}' (code {})",
            now_playing.track, now_playing.artist, ack.ignored_code
        );
    } else {
        println!(
            "🎵 Now playing '{}' by '{}'",
            now_playing.track, now_playing.artist
        );
    }
    Ok(())
}

pub async fn handle_scrobble(
    client: &LastFmApiClientImpl,
    store: &impl SessionStore,
    scrobble: Scrobble,
) -> Result<()> {
    let session = require_session(store)?;

    let ack = client
        .scrobble(&session.key, &scrobble)
        .await
        .inspect_err(|e| forget_rejected_session(store, e))?;

    record_history(store, HistoryEntry::from_scrobble(&scrobble, Utc::now()));

    if ack.is_accepted() {
        println!(
            "✅ Scrobbled '{}' by '{}' ({})",
            scrobble.track,
            scrobble.artist,
            format_timestamp(scrobble.timestamp)
        );
    } else {
        println!(
            "⚠️  Last.fm ignored the scrobble of '{}' by '{}' ({} accepted, {} ignored)",
            scrobble.track, scrobble.artist, ack.accepted, ack.ignored
        );
    }
    Ok(())
}
