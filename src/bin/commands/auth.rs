use lastfm_scrobble::{AuthFlow, LastFmApiClientImpl, LastFmError, Result, SessionStore};
use std::io::{self, BufRead, Write};

/// Last.fm's code for a token the user has not approved yet.
const TOKEN_NOT_AUTHORIZED: u32 = 14;

/// Run the token handshake and store the resulting session.
pub async fn handle_auth(client: &LastFmApiClientImpl, store: &impl SessionStore) -> Result<()> {
    if let Some(session) = store.load_session()? {
        println!("✅ Already connected as {}", session.username);
        println!("   Run `lastfm-scrobble logout` first to connect another account.");
        return Ok(());
    }

    let mut flow = AuthFlow::new(client.clone());

    println!("🔐 Requesting a Last.fm token...");
    let pending = flow.begin().await?;

    println!();
    println!("Open this page and allow access:");
    println!("  {}", pending.url);
    println!();

    loop {
        wait_for_enter("Press Enter once you have approved access...")?;

        match flow.complete().await {
            Ok(session) => {
                store.save_session(&session)?;
                println!("✅ Connected to Last.fm as {}", session.username);
                return Ok(());
            }
            Err(LastFmError::Api { code, .. }) if code == TOKEN_NOT_AUTHORIZED => {
                println!("⏳ The token has not been approved yet.");
            }
            Err(e) => return Err(e),
        }
    }
}

pub fn handle_status(store: &impl SessionStore) -> Result<()> {
    match store.load_session()? {
        Some(session) => println!("✅ Connected as {}", session.username),
        None => println!("❌ Not connected. Run `lastfm-scrobble auth` to connect."),
    }
    Ok(())
}

pub fn handle_logout(store: &impl SessionStore) -> Result<()> {
    match store.load_session()? {
        Some(session) => {
            store.clear_session()?;
            println!("👋 Disconnected {} from this device.", session.username);
        }
        None => println!("Not connected."),
    }
    Ok(())
}

fn wait_for_enter(prompt: &str) -> Result<()> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Err(LastFmError::Auth(
            "input closed before the token was approved".to_string(),
        ));
    }
    Ok(())
}
