pub mod auth;
pub mod history;
pub mod submit;
pub mod utils;

use clap::Subcommand;
use lastfm_scrobble::{LastFmApiClientImpl, Result, SessionStore};

#[derive(Subcommand)]
pub enum Commands {
    /// Connect this device to a Last.fm account
    ///
    /// Requests a token, prints the page where you approve access, waits for
    /// you to confirm, then stores the resulting session key.
    ///
    /// Usage examples:
    /// # Connect interactively
    /// lastfm-scrobble auth
    Auth,

    /// Show which account is connected
    Status,

    /// Forget the stored session on this device
    ///
    /// Nothing is sent to Last.fm; the session key is simply deleted.
    Logout,

    /// Tell Last.fm what is playing right now
    ///
    /// Usage examples:
    /// # Minimal update
    /// lastfm-scrobble now-playing --artist "Radiohead" --track "Reckoner"
    ///
    /// # With album and duration in seconds
    /// lastfm-scrobble now-playing --artist "Radiohead" --track "Reckoner" --album "In Rainbows" --duration 290
    NowPlaying {
        /// Artist name
        #[arg(long)]
        artist: String,

        /// Track name
        #[arg(long)]
        track: String,

        /// Album name (optional)
        #[arg(long)]
        album: Option<String>,

        /// Track length in seconds (optional)
        #[arg(long)]
        duration: Option<u32>,
    },

    /// Record a play
    ///
    /// The play is timestamped now unless --timestamp or --at is given.
    ///
    /// Usage examples:
    /// # Scrobble a play that just started
    /// lastfm-scrobble scrobble --artist "Wilco" --track "Impossible Germany"
    ///
    /// # Scrobble with full details at a Unix timestamp
    /// lastfm-scrobble scrobble --artist "Wilco" --track "Impossible Germany" --album "Sky Blue Sky" --track-number 4 --duration 358 --timestamp 1640995200
    ///
    /// # Scrobble at a local date and time
    /// lastfm-scrobble scrobble --artist "Wilco" --track "Impossible Germany" --at 2024-03-01T21:30
    Scrobble {
        /// Artist name
        #[arg(long)]
        artist: String,

        /// Track name
        #[arg(long)]
        track: String,

        /// Album name (optional)
        #[arg(long)]
        album: Option<String>,

        /// Track length in seconds (optional)
        #[arg(long)]
        duration: Option<u32>,

        /// Position of the track on the album (optional)
        #[arg(long)]
        track_number: Option<u32>,

        /// Unix timestamp in seconds when the play started
        #[arg(long, conflicts_with = "at")]
        timestamp: Option<i64>,

        /// Local date and time when the play started (YYYY-MM-DDTHH:MM)
        #[arg(long)]
        at: Option<String>,
    },

    /// Show recent submissions made from this device
    History {
        /// Maximum number of entries to show (0 for no limit)
        #[arg(long, default_value = "0")]
        limit: usize,

        /// Delete the local history instead of showing it
        #[arg(long)]
        clear: bool,
    },
}

pub async fn execute_command(
    command: Commands,
    client: &LastFmApiClientImpl,
    store: &impl SessionStore,
) -> Result<()> {
    match command {
        Commands::Auth => auth::handle_auth(client, store).await,
        Commands::Status => auth::handle_status(store),
        Commands::Logout => auth::handle_logout(store),
        Commands::NowPlaying {
            artist,
            track,
            album,
            duration,
        } => submit::handle_now_playing(client, store, artist, track, album, duration).await,
        Commands::Scrobble {
            artist,
            track,
            album,
            duration,
            track_number,
            timestamp,
            at,
        } => {
            let timestamp = utils::resolve_timestamp(timestamp, at.as_deref())?;
            let mut scrobble = lastfm_scrobble::Scrobble::new(artist, track, timestamp);
            if let Some(album) = album {
                scrobble = scrobble.with_album(album);
            }
            scrobble.duration = duration;
            scrobble.track_number = track_number;
            submit::handle_scrobble(client, store, scrobble).await
        }
        Commands::History { limit, clear } => history::handle_history(store, limit, clear),
    }
}
