//! Data types for Last.fm scrobbling.
//!
//! This module contains the core data structures used throughout the crate,
//! including scrobble and now-playing payloads, session state, error types,
//! client configuration, and event handling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, watch};

// ================================================================================================
// TRACK PAYLOADS
// ================================================================================================

/// A single play submitted to Last.fm with `track.scrobble`.
///
/// Optional fields that are `None` are left out of the request entirely;
/// Last.fm treats the presence of a key as meaningful, so empty values are
/// never sent.
///
/// # Examples
///
/// ```rust
/// use lastfm_scrobble::Scrobble;
///
/// let scrobble = Scrobble::new("Radiohead", "Paranoid Android", 1640995200)
///     .with_album("OK Computer")
///     .with_track_number(2)
///     .with_duration(383);
///
/// assert_eq!(scrobble.album.as_deref(), Some("OK Computer"));
/// assert_eq!(scrobble.timestamp, 1640995200);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scrobble {
    /// The artist name
    pub artist: String,
    /// The track name
    pub track: String,
    /// Unix timestamp (seconds) of when the track started playing
    pub timestamp: i64,
    /// Optional album name
    pub album: Option<String>,
    /// Optional position of the track on its album
    pub track_number: Option<u32>,
    /// Optional track length in seconds
    pub duration: Option<u32>,
}

impl Scrobble {
    pub fn new(artist: impl Into<String>, track: impl Into<String>, timestamp: i64) -> Self {
        Self {
            artist: artist.into(),
            track: track.into(),
            timestamp,
            album: None,
            track_number: None,
            duration: None,
        }
    }

    /// Set the album. Blank names are treated as absent.
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = normalize_optional(Some(album.into()));
        self
    }

    pub fn with_track_number(mut self, track_number: u32) -> Self {
        self.track_number = Some(track_number);
        self
    }

    pub fn with_duration(mut self, duration: u32) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// A "now playing" notification sent with `track.updateNowPlaying`.
///
/// Unlike [`Scrobble`] it carries no timestamp; Last.fm overwrites it with the
/// next call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NowPlaying {
    /// The artist name
    pub artist: String,
    /// The track name
    pub track: String,
    /// Optional album name
    pub album: Option<String>,
    /// Optional track length in seconds
    pub duration: Option<u32>,
}

impl NowPlaying {
    pub fn new(artist: impl Into<String>, track: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            track: track.into(),
            album: None,
            duration: None,
        }
    }

    /// Set the album. Blank names are treated as absent.
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = normalize_optional(Some(album.into()));
        self
    }

    pub fn with_duration(mut self, duration: u32) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Trim a required text field, rejecting it when nothing is left.
pub(crate) fn normalize_required(field: &str, value: &str) -> Result<String, LastFmError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LastFmError::InvalidInput(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field; blank values collapse to `None`.
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ================================================================================================
// API RESPONSES
// ================================================================================================

/// Result of the first half of the authorization handshake.
///
/// The user must visit `url` and approve the application before the token
/// can be exchanged for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    /// Request token returned by `auth.getToken`
    pub token: String,
    /// Page the user has to open to approve the token
    pub url: String,
}

/// Acknowledgement returned by `track.scrobble`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrobbleAck {
    /// Number of scrobbles Last.fm accepted
    pub accepted: u32,
    /// Number of scrobbles Last.fm ignored (filtered, too old, ...)
    pub ignored: u32,
}

impl ScrobbleAck {
    pub fn is_accepted(&self) -> bool {
        self.accepted > 0 && self.ignored == 0
    }
}

/// Acknowledgement returned by `track.updateNowPlaying`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowPlayingAck {
    /// Last.fm's `ignoredMessage` code, `0` when the update was taken as-is
    pub ignored_code: u32,
}

impl NowPlayingAck {
    pub fn is_ignored(&self) -> bool {
        self.ignored_code != 0
    }
}

// ================================================================================================
// ERROR TYPES
// ================================================================================================

/// Error types for Last.fm operations.
///
/// Every remote failure falls into one of three kinds, see [`ErrorKind`]:
/// missing configuration, a transport failure, or an error reported by the
/// Last.fm API inside an otherwise successful response.
///
/// # Error Handling Examples
///
/// ```rust,no_run
/// use lastfm_scrobble::{ClientConfig, LastFmApiClientImpl, LastFmError, LastFmScrobbler};
///
/// #[tokio::main]
/// async fn main() {
///     let http_client = http_client::native::NativeClient::new();
///     let client = LastFmApiClientImpl::new(Box::new(http_client), ClientConfig::from_env());
///
///     match client.request_token().await {
///         Ok(token) => println!("Got token {token}"),
///         Err(LastFmError::Config(msg)) => eprintln!("Not configured: {msg}"),
///         Err(LastFmError::Api { code, message }) => {
///             eprintln!("Last.fm rejected the call ({code}): {message}");
///         }
///         Err(e) => eprintln!("Other error: {e}"),
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum LastFmError {
    /// Required configuration is missing.
    ///
    /// Raised the first time a call needs the API key or shared secret and
    /// one of them is not set. Not retryable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network related errors.
    ///
    /// The transport produced no response at all: connection failures, DNS
    /// errors, TLS problems and the like.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The transport answered with a non-success status code.
    #[error("Last.fm request failed with {status}")]
    Transport {
        /// HTTP status code of the response
        status: u16,
    },

    /// Last.fm reported an error inside the response body.
    ///
    /// The API signals application errors with HTTP 200 and an `error` field,
    /// so this is checked on every response.
    ///
    /// # Common Codes
    /// - 4: authentication failed (usually a bad signature)
    /// - 9: invalid session key
    /// - 14: token has not been authorized
    /// - 15: token has expired
    #[error("Last.fm error {code}: {message}")]
    Api {
        /// Numeric Last.fm error code
        code: u32,
        /// Message supplied by Last.fm
        message: String,
    },

    /// Failed to parse Last.fm's response.
    ///
    /// The body was not JSON or did not have the expected shape.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// A request was rejected locally before being sent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The authorization flow was driven out of order.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The session store could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// File system I/O errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`LastFmError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing credentials
    Config,
    /// No response, or a non-success HTTP status
    Transport,
    /// Error code embedded in a successful HTTP response
    RemoteApi,
    /// Everything raised locally: parsing, validation, flow and storage
    Local,
}

/// Last.fm's code for a session key it no longer accepts.
pub const INVALID_SESSION_KEY: u32 = 9;

impl LastFmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LastFmError::Config(_) => ErrorKind::Config,
            LastFmError::Http(_) | LastFmError::Transport { .. } => ErrorKind::Transport,
            LastFmError::Api { .. } => ErrorKind::RemoteApi,
            LastFmError::Parse(_)
            | LastFmError::InvalidInput(_)
            | LastFmError::Auth(_)
            | LastFmError::Storage(_)
            | LastFmError::Io(_) => ErrorKind::Local,
        }
    }

    /// Whether Last.fm rejected the session key used for the call.
    ///
    /// Sessions carry no expiry on the client side, so this is the only
    /// signal that the user has to authorize again.
    pub fn is_invalid_session(&self) -> bool {
        matches!(self, LastFmError::Api { code, .. } if *code == INVALID_SESSION_KEY)
    }
}

// ================================================================================================
// SESSION MANAGEMENT
// ================================================================================================

/// Serializable session state that can be persisted and restored.
///
/// The key is a long-lived bearer credential for write calls. It has no
/// modeled expiry; it stays valid until the user disconnects or Last.fm
/// rejects it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastFmSession {
    /// The session key returned by `auth.getSession`
    pub key: String,
    /// The authenticated username
    pub username: String,
}

impl LastFmSession {
    pub fn new(key: String, username: String) -> Self {
        Self { key, username }
    }

    /// Check if this session appears to be usable
    ///
    /// This doesn't guarantee Last.fm still accepts the key.
    pub fn is_valid(&self) -> bool {
        !self.key.trim().is_empty() && !self.username.trim().is_empty()
    }

    /// Serialize session to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize session from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Debug for LastFmSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LastFmSession")
            .field("key", &"[REDACTED]")
            .field("username", &self.username)
            .finish()
    }
}

// ================================================================================================
// CLIENT CONFIGURATION
// ================================================================================================

/// Default Last.fm web service endpoint
pub const DEFAULT_API_URL: &str = "https://ws.audioscrobbler.com/2.0/";

/// Default page where users approve request tokens
pub const DEFAULT_AUTH_URL: &str = "https://www.last.fm/api/auth/";

/// Credentials and endpoints used by the API client.
///
/// Missing credentials are not an error until a call needs them, at which
/// point [`LastFmError::Config`] is returned.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Application API key
    pub api_key: Option<String>,
    /// Shared secret used for request signatures
    pub shared_secret: Option<String>,
    /// Web service endpoint
    pub api_url: String,
    /// Token approval page
    pub auth_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            shared_secret: None,
            api_url: DEFAULT_API_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new config with default endpoints and no credentials
    pub fn new() -> Self {
        Self::default()
    }

    /// Read configuration from the environment.
    ///
    /// - `LASTFM_API_KEY`: API key (required at first use)
    /// - `LASTFM_SHARED_SECRET`: shared secret (required at first use)
    /// - `LASTFM_API_URL`: optional endpoint override
    /// - `LASTFM_AUTH_URL`: optional approval page override
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let mut config = Self {
            api_key: var("LASTFM_API_KEY"),
            shared_secret: var("LASTFM_SHARED_SECRET"),
            ..Self::default()
        };
        if let Some(api_url) = var("LASTFM_API_URL") {
            config.api_url = api_url;
        }
        if let Some(auth_url) = var("LASTFM_AUTH_URL") {
            config.auth_url = auth_url;
        }
        config
    }

    /// Set the API key and shared secret
    pub fn with_credentials(
        mut self,
        api_key: impl Into<String>,
        shared_secret: impl Into<String>,
    ) -> Self {
        self.api_key = Some(api_key.into());
        self.shared_secret = Some(shared_secret.into());
        self
    }

    /// Set a custom web service endpoint
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Set a custom approval page
    pub fn with_auth_url(mut self, auth_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into();
        self
    }

    pub fn api_key(&self) -> Result<&str, LastFmError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| LastFmError::Config("LASTFM_API_KEY is not configured".to_string()))
    }

    pub fn shared_secret(&self) -> Result<&str, LastFmError> {
        self.shared_secret.as_deref().ok_or_else(|| {
            LastFmError::Config("LASTFM_SHARED_SECRET is not configured".to_string())
        })
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("ClientConfig")
            .field("api_key", &redact(&self.api_key))
            .field("shared_secret", &redact(&self.shared_secret))
            .field("api_url", &self.api_url)
            .field("auth_url", &self.auth_url)
            .finish()
    }
}

// ================================================================================================
// EVENT SYSTEM
// ================================================================================================

/// Request information for client events
///
/// Only the HTTP verb, the Last.fm method name and the endpoint are kept;
/// parameter values (session keys, signatures) never end up in events.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestInfo {
    /// The HTTP method (GET or POST)
    pub method: String,
    /// The Last.fm API method, e.g. `track.scrobble`
    pub api_method: String,
    /// The endpoint the request was sent to
    pub endpoint: String,
}

impl RequestInfo {
    pub fn new(method: &str, api_method: &str, endpoint: &str) -> Self {
        Self {
            method: method.to_string(),
            api_method: api_method.to_string(),
            endpoint: endpoint.to_string(),
        }
    }

    /// Get a short description of the request for logging
    pub fn short_description(&self) -> String {
        format!("{} {}", self.method, self.api_method)
    }
}

/// Event type to describe internal HTTP client activity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ClientEvent {
    /// Request started
    RequestStarted {
        /// Request details
        request: RequestInfo,
    },
    /// Response received from the transport
    RequestCompleted {
        /// Request details
        request: RequestInfo,
        /// HTTP status code
        status_code: u16,
        /// Duration of the request in milliseconds
        duration_ms: u64,
    },
    /// Last.fm reported an error in the response body
    ApiError {
        /// Request details
        request: RequestInfo,
        /// Last.fm error code
        code: u32,
        /// Last.fm error message
        message: String,
    },
    /// A play was submitted successfully
    Submitted {
        /// What kind of submission it was
        kind: crate::history::HistoryKind,
        /// The artist name
        artist: String,
        /// The track name
        track: String,
        /// When the submission was acknowledged
        at: DateTime<Utc>,
    },
}

/// Type alias for the broadcast receiver
pub type ClientEventReceiver = broadcast::Receiver<ClientEvent>;

/// Shared event broadcasting state that persists across client clones
#[derive(Clone)]
pub struct SharedEventBroadcaster {
    event_tx: broadcast::Sender<ClientEvent>,
    last_event_tx: watch::Sender<Option<ClientEvent>>,
}

impl SharedEventBroadcaster {
    /// Create a new shared event broadcaster
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let (last_event_tx, _) = watch::channel(None);

        Self {
            event_tx,
            last_event_tx,
        }
    }

    /// Broadcast an event to all subscribers
    pub fn broadcast_event(&self, event: ClientEvent) {
        let _ = self.event_tx.send(event.clone());
        let _ = self.last_event_tx.send(Some(event));
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> ClientEventReceiver {
        self.event_tx.subscribe()
    }

    /// Get the latest event
    pub fn latest_event(&self) -> Option<ClientEvent> {
        self.last_event_tx.borrow().clone()
    }
}

impl Default for SharedEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SharedEventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedEventBroadcaster")
            .field("subscribers", &self.event_tx.receiver_count())
            .finish()
    }
}

// ================================================================================================
// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_validity() {
        let valid_session =
            LastFmSession::new("d580d57f32848f5dcf574d1ce18d78b2".to_string(), "rj".to_string());
        assert!(valid_session.is_valid());

        let invalid_session = LastFmSession::new("  ".to_string(), "rj".to_string());
        assert!(!invalid_session.is_valid());
    }

    #[test]
    fn test_session_serialization() {
        let session = LastFmSession::new("key123".to_string(), "testuser".to_string());

        let json = session.to_json().unwrap();
        let restored_session = LastFmSession::from_json(&json).unwrap();

        assert_eq!(session, restored_session);
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let session = LastFmSession::new("supersecretkey".to_string(), "testuser".to_string());
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("supersecretkey"));
        assert!(rendered.contains("testuser"));

        let config = ClientConfig::new().with_credentials("my-api-key", "my-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("my-api-key"));
        assert!(!rendered.contains("my-secret"));
    }

    #[test]
    fn test_missing_credentials_are_config_errors() {
        let config = ClientConfig::new();
        let err = config.api_key().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("LASTFM_API_KEY"));

        let err = config.shared_secret().unwrap_err();
        assert!(err.to_string().contains("LASTFM_SHARED_SECRET"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(LastFmError::Transport { status: 500 }.kind(), ErrorKind::Transport);
        assert_eq!(LastFmError::Http("refused".into()).kind(), ErrorKind::Transport);
        let api = LastFmError::Api {
            code: 9,
            message: "Invalid session key".into(),
        };
        assert_eq!(api.kind(), ErrorKind::RemoteApi);
        assert!(api.is_invalid_session());
        assert_eq!(LastFmError::Parse("bad".into()).kind(), ErrorKind::Local);
    }

    #[test]
    fn test_optional_fields_are_normalized() {
        let scrobble = Scrobble::new("Artist", "Track", 1).with_album("   ");
        assert_eq!(scrobble.album, None);

        let now_playing = NowPlaying::new("Artist", "Track").with_album(" Album ");
        assert_eq!(now_playing.album.as_deref(), Some("Album"));

        assert!(normalize_required("artist", " \t").is_err());
        assert_eq!(normalize_required("artist", " Wilco ").unwrap(), "Wilco");
    }
}
