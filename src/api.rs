use crate::history::HistoryKind;
use crate::scrobbler::LastFmScrobbler;
use crate::signature::{sign, ApiParams};
use crate::types::{
    normalize_optional, normalize_required, ClientConfig, ClientEvent, ClientEventReceiver,
    LastFmSession, NowPlaying, NowPlayingAck, RequestInfo, Scrobble, ScrobbleAck,
    SharedEventBroadcaster,
};
use crate::Result;
use async_trait::async_trait;
use http_client::{HttpClient, Request};
use http_types::{Method, Url};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;

use crate::types::LastFmError;

/// User agent sent with every request
const USER_AGENT: &str = concat!("lastfm-scrobble/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// LastFmApiClientImpl: signed requests against the Last.fm web service
// =============================================================================

/// HTTP verb used for an API call.
///
/// Read methods go out as GET with a query string, write methods as POST with
/// a form-encoded body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// Client for the Last.fm web service API.
///
/// The transport is any [`HttpClient`], which keeps the client testable and
/// lets callers pick the HTTP backend.
///
/// # Examples
///
/// ```rust,no_run
/// use lastfm_scrobble::{ClientConfig, LastFmApiClientImpl, LastFmScrobbler, Scrobble};
///
/// # tokio_test::block_on(async {
/// let http_client = http_client::native::NativeClient::new();
/// let client = LastFmApiClientImpl::new(Box::new(http_client), ClientConfig::from_env());
///
/// let scrobble = Scrobble::new("Wilco", "Impossible Germany", 1640995200);
/// let ack = client.scrobble("session-key", &scrobble).await?;
/// println!("accepted: {}", ack.accepted);
/// # Ok::<(), lastfm_scrobble::LastFmError>(())
/// # });
/// ```
#[derive(Clone)]
pub struct LastFmApiClientImpl {
    client: Arc<dyn HttpClient + Send + Sync>,
    config: ClientConfig,
    broadcaster: Arc<SharedEventBroadcaster>,
}

impl LastFmApiClientImpl {
    pub fn new(client: Box<dyn HttpClient + Send + Sync>, config: ClientConfig) -> Self {
        Self {
            client: Arc::from(client),
            config,
            broadcaster: Arc::new(SharedEventBroadcaster::new()),
        }
    }

    /// Create a client on a different transport that reports to the same
    /// event subscribers as this one.
    pub fn with_shared_broadcaster(&self, client: Box<dyn HttpClient + Send + Sync>) -> Self {
        Self {
            client: Arc::from(client),
            config: self.config.clone(),
            broadcaster: self.broadcaster.clone(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn subscribe(&self) -> ClientEventReceiver {
        self.broadcaster.subscribe()
    }

    pub fn latest_event(&self) -> Option<ClientEvent> {
        self.broadcaster.latest_event()
    }

    /// Execute a single API call.
    ///
    /// `api_key` and `format=json` are added to `params`; when `signed` is
    /// set the `api_sig` is computed over that complete set. Any `error`
    /// field in the decoded body is reported as [`LastFmError::Api`], even
    /// when the HTTP status was a success.
    pub async fn execute(
        &self,
        http_method: HttpMethod,
        params: ApiParams,
        signed: bool,
    ) -> Result<Value> {
        let api_key = self.config.api_key()?;
        let shared_secret = self.config.shared_secret()?;

        let mut all_params = ApiParams::new();
        all_params.insert("api_key", api_key);
        all_params.insert("format", "json");
        all_params.extend(params);

        if signed {
            let api_sig = sign(&all_params, shared_secret);
            all_params.insert("api_sig", api_sig);
        }

        let request_info = RequestInfo::new(
            http_method.as_str(),
            all_params.method().unwrap_or_default(),
            &self.config.api_url,
        );
        let request = self.build_request(http_method, &all_params)?;

        log::debug!("Sending {}", request_info.short_description());
        let request_start = std::time::Instant::now();

        self.broadcaster
            .broadcast_event(ClientEvent::RequestStarted {
                request: request_info.clone(),
            });

        let mut response = self
            .client
            .send(request)
            .await
            .map_err(|e| LastFmError::Http(e.to_string()))?;

        let status_code: u16 = response.status().into();
        self.broadcaster
            .broadcast_event(ClientEvent::RequestCompleted {
                request: request_info.clone(),
                status_code,
                duration_ms: request_start.elapsed().as_millis() as u64,
            });
        log::debug!(
            "{} responded with status {status_code}",
            request_info.short_description()
        );

        if !response.status().is_success() {
            return Err(LastFmError::Transport {
                status: status_code,
            });
        }

        let body = response
            .body_string()
            .await
            .map_err(|e| LastFmError::Http(e.to_string()))?;

        let data: Value = serde_json::from_str(&body)
            .map_err(|e| LastFmError::Parse(format!("response is not valid JSON: {e}")))?;

        if let Err(error) = ensure_no_error(&data) {
            if let LastFmError::Api { code, message } = &error {
                log::debug!(
                    "{} returned Last.fm error {code}: {message}",
                    request_info.short_description()
                );
                self.broadcaster.broadcast_event(ClientEvent::ApiError {
                    request: request_info,
                    code: *code,
                    message: message.clone(),
                });
            }
            return Err(error);
        }

        Ok(data)
    }

    fn build_request(&self, http_method: HttpMethod, params: &ApiParams) -> Result<Request> {
        let mut url = self.config.api_url.parse::<Url>().map_err(|e| {
            LastFmError::Config(format!("Invalid API URL '{}': {e}", self.config.api_url))
        })?;

        let mut request = match http_method {
            HttpMethod::Get => {
                url.set_query(Some(&params.to_form_string()));
                Request::new(Method::Get, url)
            }
            HttpMethod::Post => {
                let mut request = Request::new(Method::Post, url);
                request.set_body(params.to_form_string());
                let _ = request.insert_header("Content-Type", "application/x-www-form-urlencoded");
                request
            }
        };
        let _ = request.insert_header("User-Agent", USER_AGENT);
        let _ = request.insert_header("Accept", "application/json");
        Ok(request)
    }

    fn broadcast_submission(&self, kind: HistoryKind, artist: &str, track: &str) {
        self.broadcaster.broadcast_event(ClientEvent::Submitted {
            kind,
            artist: artist.to_string(),
            track: track.to_string(),
            at: chrono::Utc::now(),
        });
    }
}

impl std::fmt::Debug for LastFmApiClientImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LastFmApiClientImpl")
            .field("config", &self.config)
            .field("broadcaster", &self.broadcaster)
            .finish()
    }
}

#[async_trait(?Send)]
impl LastFmScrobbler for LastFmApiClientImpl {
    async fn request_token(&self) -> Result<String> {
        let data = self
            .execute(HttpMethod::Get, ApiParams::for_method("auth.getToken"), false)
            .await?;
        parse_token_response(data)
    }

    fn authorization_url(&self, token: &str) -> Result<String> {
        let api_key = self.config.api_key()?;
        Ok(format!(
            "{}?api_key={}&token={}",
            self.config.auth_url,
            urlencoding::encode(api_key),
            urlencoding::encode(token)
        ))
    }

    async fn get_session(&self, token: &str) -> Result<LastFmSession> {
        let mut params = ApiParams::for_method("auth.getSession");
        params.insert("token", normalize_required("token", token)?);

        let data = self.execute(HttpMethod::Get, params, true).await?;
        let session = parse_session_response(data)?;
        log::debug!("Obtained Last.fm session for {}", session.username);
        Ok(session)
    }

    async fn update_now_playing(
        &self,
        session_key: &str,
        now_playing: &NowPlaying,
    ) -> Result<NowPlayingAck> {
        let params = now_playing_params(session_key, now_playing)?;
        let data = self.execute(HttpMethod::Post, params, true).await?;
        let ack = parse_now_playing_response(data)?;

        if ack.is_ignored() {
            log::warn!(
                "Last.fm ignored now playing update for '{}' by '{}' (code {})",
                now_playing.track,
                now_playing.artist,
                ack.ignored_code
            );
        }
        self.broadcast_submission(HistoryKind::NowPlaying, &now_playing.artist, &now_playing.track);
        Ok(ack)
    }

    async fn scrobble(&self, session_key: &str, scrobble: &Scrobble) -> Result<ScrobbleAck> {
        let params = scrobble_params(session_key, scrobble)?;
        let data = self.execute(HttpMethod::Post, params, true).await?;
        let ack = parse_scrobble_response(data)?;

        log::debug!(
            "Scrobble of '{}' by '{}': {} accepted, {} ignored",
            scrobble.track,
            scrobble.artist,
            ack.accepted,
            ack.ignored
        );
        self.broadcast_submission(HistoryKind::Scrobble, &scrobble.artist, &scrobble.track);
        Ok(ack)
    }
}

// =============================================================================
// Parameter building
// =============================================================================

/// Parameters for `track.updateNowPlaying`, before `api_key`/`format`/`api_sig`.
pub fn now_playing_params(session_key: &str, now_playing: &NowPlaying) -> Result<ApiParams> {
    let mut params = ApiParams::for_method("track.updateNowPlaying");
    params.insert("artist", normalize_required("artist", &now_playing.artist)?);
    params.insert("track", normalize_required("track", &now_playing.track)?);
    params.insert("sk", normalize_required("session key", session_key)?);
    params.insert_opt("album", normalize_optional(now_playing.album.clone()));
    params.insert_opt("duration", now_playing.duration);
    Ok(params)
}

/// Parameters for `track.scrobble`, before `api_key`/`format`/`api_sig`.
pub fn scrobble_params(session_key: &str, scrobble: &Scrobble) -> Result<ApiParams> {
    let mut params = ApiParams::for_method("track.scrobble");
    params.insert("artist", normalize_required("artist", &scrobble.artist)?);
    params.insert("track", normalize_required("track", &scrobble.track)?);
    params.insert("timestamp", scrobble.timestamp.to_string());
    params.insert("sk", normalize_required("session key", session_key)?);
    params.insert_opt("album", normalize_optional(scrobble.album.clone()));
    params.insert_opt("trackNumber", scrobble.track_number);
    params.insert_opt("duration", scrobble.duration);
    Ok(params)
}

// =============================================================================
// Response parsing
// =============================================================================

/// Fail with [`LastFmError::Api`] if the body carries a non-null `error` field.
pub fn ensure_no_error(data: &Value) -> Result<()> {
    let Some(error) = data.get("error").filter(|e| !e.is_null()) else {
        return Ok(());
    };

    let code = match error {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .unwrap_or(0);

    let message = data
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Unknown Last.fm error")
        .to_string();

    Err(LastFmError::Api { code, message })
}

/// Last.fm renders numbers inconsistently, sometimes as JSON strings.
fn lenient_u32<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u32),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Deserialize)]
pub struct ApiTokenResponse {
    pub token: String,
}

#[derive(Deserialize)]
pub struct ApiSessionResponse {
    pub session: ApiSession,
}

#[derive(Deserialize)]
pub struct ApiSession {
    pub key: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct ApiScrobbleResponse {
    pub scrobbles: ApiScrobbles,
}

#[derive(Deserialize)]
pub struct ApiScrobbles {
    #[serde(rename = "@attr")]
    pub attr: ApiScrobblesAttr,
}

#[derive(Deserialize)]
pub struct ApiScrobblesAttr {
    #[serde(deserialize_with = "lenient_u32")]
    pub accepted: u32,
    #[serde(deserialize_with = "lenient_u32")]
    pub ignored: u32,
}

#[derive(Deserialize)]
pub struct ApiNowPlayingResponse {
    pub nowplaying: ApiNowPlaying,
}

#[derive(Deserialize)]
pub struct ApiNowPlaying {
    #[serde(rename = "ignoredMessage")]
    pub ignored_message: Option<ApiIgnoredMessage>,
}

#[derive(Deserialize)]
pub struct ApiIgnoredMessage {
    #[serde(deserialize_with = "lenient_u32")]
    pub code: u32,
}

fn parse_shape<T: for<'de> Deserialize<'de>>(what: &str, data: Value) -> Result<T> {
    serde_json::from_value(data)
        .map_err(|e| LastFmError::Parse(format!("unexpected {what} response: {e}")))
}

pub fn parse_token_response(data: Value) -> Result<String> {
    let response: ApiTokenResponse = parse_shape("auth.getToken", data)?;
    if response.token.trim().is_empty() {
        return Err(LastFmError::Parse("auth.getToken returned an empty token".to_string()));
    }
    Ok(response.token)
}

pub fn parse_session_response(data: Value) -> Result<LastFmSession> {
    let response: ApiSessionResponse = parse_shape("auth.getSession", data)?;
    let session = LastFmSession::new(response.session.key, response.session.name);
    if !session.is_valid() {
        return Err(LastFmError::Parse(
            "auth.getSession returned an empty session key or username".to_string(),
        ));
    }
    Ok(session)
}

pub fn parse_scrobble_response(data: Value) -> Result<ScrobbleAck> {
    let response: ApiScrobbleResponse = parse_shape("track.scrobble", data)?;
    Ok(ScrobbleAck {
        accepted: response.scrobbles.attr.accepted,
        ignored: response.scrobbles.attr.ignored,
    })
}

pub fn parse_now_playing_response(data: Value) -> Result<NowPlayingAck> {
    let response: ApiNowPlayingResponse = parse_shape("track.updateNowPlaying", data)?;
    Ok(NowPlayingAck {
        ignored_code: response
            .nowplaying
            .ignored_message
            .map(|m| m.code)
            .unwrap_or(0),
    })
}
