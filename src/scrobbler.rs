use crate::types::{Authorization, LastFmSession, NowPlaying, NowPlayingAck, Scrobble, ScrobbleAck};
use crate::Result;
use async_trait::async_trait;

/// Trait for Last.fm scrobbling operations that can be mocked for testing.
///
/// This is the surface front ends consume: issuing a request token and its
/// approval URL, exchanging an approved token for a session, and submitting
/// now-playing updates and scrobbles with that session's key.
///
/// # Mocking Support
///
/// When the `mock` feature is enabled, this crate provides `MockLastFmScrobbler`
/// that implements this trait using the `mockall` library.
///
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait(?Send)]
pub trait LastFmScrobbler {
    /// Request an unauthorized token with `auth.getToken`.
    async fn request_token(&self) -> Result<String>;

    /// Build the page the user must visit to approve `token`.
    fn authorization_url(&self, token: &str) -> Result<String>;

    /// Request a token and build its approval URL in one step.
    async fn request_authorization(&self) -> Result<Authorization> {
        let token = self.request_token().await?;
        let url = self.authorization_url(&token)?;
        log::debug!("Issued request token, awaiting user approval");
        Ok(Authorization { token, url })
    }

    /// Exchange an approved token for a session with `auth.getSession`.
    async fn get_session(&self, token: &str) -> Result<LastFmSession>;

    /// Tell Last.fm what is playing right now.
    async fn update_now_playing(
        &self,
        session_key: &str,
        now_playing: &NowPlaying,
    ) -> Result<NowPlayingAck>;

    /// Record a finished play.
    async fn scrobble(&self, session_key: &str, scrobble: &Scrobble) -> Result<ScrobbleAck>;
}
