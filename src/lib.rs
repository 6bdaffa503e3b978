//! Scrobble plays to Last.fm through its signed web service API.
//!
//! - [`LastFmApiClientImpl`] signs and sends `auth.getToken`, `auth.getSession`,
//!   `track.updateNowPlaying` and `track.scrobble` calls.
//! - [`AuthFlow`] walks a user through the token approval handshake.
//! - [`SessionStore`] keeps the session key and local history between runs.
//!
//! # Environment Variables
//!
//! - `LASTFM_API_KEY`: API key (required)
//! - `LASTFM_SHARED_SECRET`: shared secret used for signatures (required)

pub mod api;
pub mod auth;
pub mod history;
pub mod scrobbler;
pub mod session_persistence;
pub mod signature;
pub mod types;

pub use api::{HttpMethod, LastFmApiClientImpl};
pub use auth::{AuthFlow, AuthState, PendingAuthorization};
pub use history::{HistoryEntry, HistoryKind, ScrobbleHistory, MAX_HISTORY_ENTRIES};
pub use scrobbler::LastFmScrobbler;
#[cfg(feature = "mock")]
pub use scrobbler::MockLastFmScrobbler;
pub use session_persistence::{FileSessionStore, MemorySessionStore, SessionStore};
pub use signature::{sign, ApiParams};
pub use types::{
    Authorization, ClientConfig, ClientEvent, ClientEventReceiver, ErrorKind,
    LastFmError, LastFmSession, NowPlaying, NowPlayingAck, RequestInfo, Scrobble, ScrobbleAck,
    SharedEventBroadcaster, DEFAULT_API_URL, DEFAULT_AUTH_URL, INVALID_SESSION_KEY,
};

pub type Result<T> = std::result::Result<T, LastFmError>;
