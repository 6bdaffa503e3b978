#[cfg(feature = "mock")]
mod mock_tests {
    use lastfm_scrobble::{
        AuthFlow, Authorization, LastFmError, LastFmScrobbler, LastFmSession,
        MockLastFmScrobbler, NowPlaying, NowPlayingAck, Result, Scrobble, ScrobbleAck,
    };
    use mockall::predicate::*;

    #[tokio::test]
    async fn test_mock_scrobble() -> Result<()> {
        let mut mock_client = MockLastFmScrobbler::new();

        let scrobble = Scrobble::new("Radiohead", "Reckoner", 1640995200).with_album("In Rainbows");

        mock_client
            .expect_scrobble()
            .with(eq("sessionkey"), eq(scrobble.clone()))
            .times(1)
            .returning(|_, _| {
                Ok(ScrobbleAck {
                    accepted: 1,
                    ignored: 0,
                })
            });

        let client: &dyn LastFmScrobbler = &mock_client;
        let ack = client.scrobble("sessionkey", &scrobble).await?;
        assert!(ack.is_accepted());

        Ok(())
    }

    #[tokio::test]
    async fn test_mock_now_playing_error() {
        let mut mock_client = MockLastFmScrobbler::new();

        mock_client
            .expect_update_now_playing()
            .times(1)
            .returning(|_, _| {
                Err(LastFmError::Api {
                    code: 9,
                    message: "Invalid session key - Please re-authenticate".to_string(),
                })
            });

        let err = mock_client
            .update_now_playing("stale", &NowPlaying::new("Artist", "Track"))
            .await
            .unwrap_err();
        assert!(err.is_invalid_session());
    }

    #[tokio::test]
    async fn test_auth_flow_with_mock() -> Result<()> {
        let mut mock_client = MockLastFmScrobbler::new();

        mock_client
            .expect_request_authorization()
            .times(1)
            .returning(|| {
                Ok(Authorization {
                    token: "abc".to_string(),
                    url: "https://www.last.fm/api/auth/?api_key=KEY&token=abc".to_string(),
                })
            });

        mock_client
            .expect_get_session()
            .with(eq("abc"))
            .times(1)
            .returning(|_| Ok(LastFmSession::new("key".to_string(), "rj".to_string())));

        let mut flow = AuthFlow::new(mock_client);
        let pending = flow.begin().await?;
        assert_eq!(pending.token, "abc");

        let session = flow.complete().await?;
        assert_eq!(session.username, "rj");

        Ok(())
    }

    #[tokio::test]
    async fn test_mock_now_playing_ack() -> Result<()> {
        let mut mock_client = MockLastFmScrobbler::new();

        mock_client
            .expect_update_now_playing()
            .returning(|_, _| Ok(NowPlayingAck { ignored_code: 0 }));

        let ack = mock_client
            .update_now_playing("sk", &NowPlaying::new("Artist", "Track"))
            .await?;
        assert!(!ack.is_ignored());

        Ok(())
    }
}
