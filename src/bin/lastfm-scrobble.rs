mod commands;

use clap::Parser;
use commands::{execute_command, Commands};
use lastfm_scrobble::{ClientConfig, FileSessionStore, LastFmApiClientImpl, LastFmError};

/// Scrobble plays to Last.fm from the command line
#[derive(Parser)]
#[command(
    name = "lastfm-scrobble",
    about = "Scrobble plays to Last.fm",
    long_about = None
)]
struct Cli {
    /// Show detailed debug information
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let store = match FileSessionStore::xdg() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("❌ Error: {e}");
            std::process::exit(1);
        }
    };
    log::debug!("Using store at {}", store.root().display());

    let http_client = http_client::native::NativeClient::new();
    let client = LastFmApiClientImpl::new(Box::new(http_client), ClientConfig::from_env());

    if let Err(e) = execute_command(args.command, &client, &store).await {
        eprintln!("❌ Command failed: {e}");
        if matches!(e, LastFmError::Config(_)) {
            eprintln!();
            eprintln!("Please set the following environment variables:");
            eprintln!("  LASTFM_API_KEY=your_api_key");
            eprintln!("  LASTFM_SHARED_SECRET=your_shared_secret");
            eprintln!();
            eprintln!("API accounts can be created at https://www.last.fm/api/account/create");
        }
        std::process::exit(1);
    }
}
