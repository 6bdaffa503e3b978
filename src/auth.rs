use crate::scrobbler::LastFmScrobbler;
use crate::types::{Authorization, LastFmError, LastFmSession};
use crate::Result;
use chrono::{DateTime, Utc};

/// A request token waiting for the user to approve it on last.fm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAuthorization {
    pub token: String,
    pub url: String,
    pub issued_at: DateTime<Utc>,
}

/// Where a client stands in Last.fm's token handshake.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    TokenIssued(PendingAuthorization),
    Authenticated(LastFmSession),
}

/// Drives the two-step handshake: request a token, have the user approve it,
/// then exchange it for a session key.
///
/// # Examples
///
/// ```rust,no_run
/// use lastfm_scrobble::{AuthFlow, ClientConfig, LastFmApiClientImpl};
///
/// # tokio_test::block_on(async {
/// let http_client = http_client::native::NativeClient::new();
/// let client = LastFmApiClientImpl::new(Box::new(http_client), ClientConfig::from_env());
/// let mut flow = AuthFlow::new(client);
///
/// let pending = flow.begin().await?;
/// println!("Approve access at {}", pending.url);
///
/// // ... once the user has approved the token ...
/// let session = flow.complete().await?;
/// println!("Connected as {}", session.username);
/// # Ok::<(), lastfm_scrobble::LastFmError>(())
/// # });
/// ```
pub struct AuthFlow<C> {
    client: C,
    state: AuthState,
}

impl<C: LastFmScrobbler> AuthFlow<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            state: AuthState::Unauthenticated,
        }
    }

    /// Start out authenticated with a previously stored session.
    pub fn from_session(client: C, session: LastFmSession) -> Self {
        Self {
            client,
            state: AuthState::Authenticated(session),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn session(&self) -> Option<&LastFmSession> {
        match &self.state {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    /// Request a fresh token and its approval URL.
    ///
    /// Calling this again while a token is pending replaces it. An
    /// authenticated flow must be disconnected first.
    pub async fn begin(&mut self) -> Result<PendingAuthorization> {
        if let AuthState::Authenticated(session) = &self.state {
            return Err(LastFmError::Auth(format!(
                "already connected as {}; disconnect first",
                session.username
            )));
        }

        let Authorization { token, url } = self.client.request_authorization().await?;
        let pending = PendingAuthorization {
            token,
            url,
            issued_at: Utc::now(),
        };
        self.state = AuthState::TokenIssued(pending.clone());
        Ok(pending)
    }

    /// Exchange the pending token for a session.
    ///
    /// If Last.fm refuses (token not approved yet, or expired) the token
    /// stays pending so the call can be repeated.
    pub async fn complete(&mut self) -> Result<LastFmSession> {
        let token = match &self.state {
            AuthState::TokenIssued(pending) => pending.token.clone(),
            AuthState::Unauthenticated => {
                return Err(LastFmError::Auth(
                    "no request token has been issued".to_string(),
                ))
            }
            AuthState::Authenticated(_) => {
                return Err(LastFmError::Auth("already connected".to_string()))
            }
        };

        let session = self.client.get_session(&token).await?;
        log::debug!("Authorization completed for {}", session.username);
        self.state = AuthState::Authenticated(session.clone());
        Ok(session)
    }

    /// Forget any token or session. Nothing is sent to Last.fm.
    pub fn disconnect(&mut self) -> Option<LastFmSession> {
        match std::mem::take(&mut self.state) {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}
