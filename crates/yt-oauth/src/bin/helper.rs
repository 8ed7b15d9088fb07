use clap::Parser;
use yt_oauth::{
    Authenticator, CodeSource, ConsoleCodeSource, LoopbackCodeSource, OAuthConfig, OAuthError,
    OAuthToken, TokenStore,
};

/// OAuth 2.0 helper tool that caches a YouTube upload token ahead of time
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the OAuth client secret file
    #[arg(long, default_value = "credentials.json")]
    credentials: String,

    /// Path to save the OAuth token file
    #[arg(long, default_value = "token.json")]
    token_path: String,

    /// Receive the authorization code on a local callback server instead of typing it
    #[arg(long)]
    listen: bool,
}

async fn obtain_token<C: CodeSource>(
    config: OAuthConfig,
    store: TokenStore,
    code_source: C,
) -> Result<OAuthToken, OAuthError> {
    Authenticator::new(config, store, code_source).token().await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = OAuthConfig::from_file(&args.credentials)?;
    let store = TokenStore::new(&args.token_path);

    let token = if args.listen {
        config.ensure_loopback_redirect();
        let source = LoopbackCodeSource::from_redirect_uri(&config.redirect_uri)?;
        obtain_token(config, store, source).await?
    } else {
        obtain_token(config, store, ConsoleCodeSource::stdin()).await?
    };

    eprintln!("\nOAuth token cached in: {}", args.token_path);
    eprintln!("Valid until: {}", token.expiry);
    eprintln!("You can now upload with yt-uploader");

    Ok(())
}
