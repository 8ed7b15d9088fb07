mod upload;

use clap::{Args, Parser, Subcommand, error::ErrorKind};
use std::path::PathBuf;
use std::process::ExitCode;
use yt_oauth::{
    Authenticator, AuthorizedClient, CodeSource, ConsoleCodeSource, LoopbackCodeSource,
    OAuthConfig, OAuthError, TokenStore,
};
use yt_video_client::{DEFAULT_API_ADDRESS, VideoClient};

/// YouTube Uploader - Uploads a local video as a private YouTube video, then deletes it
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a video file and remove it once the upload succeeded
    Upload(UploadArgs),
}

#[derive(Args, Debug)]
struct UploadArgs {
    /// Path to the video file
    video: PathBuf,

    /// Path to the OAuth client secret file
    #[arg(long, default_value = "credentials.json")]
    credentials: PathBuf,

    /// Path to the cached OAuth token file
    #[arg(long, default_value = "token.json")]
    token: PathBuf,

    /// Receive the authorization code on a local callback server instead of typing it
    #[arg(long)]
    listen: bool,
}

/// Line shown to the operator when the upload fails
fn failure_message(error: &dyn std::error::Error) -> String {
    format!("Error: {}", error)
}

/// Exit code for a command line that could not be parsed
fn usage_exit_code(kind: ErrorKind) -> Option<u8> {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => None,
        _ => Some(1),
    }
}

async fn authorize<C: CodeSource>(
    config: OAuthConfig,
    store: TokenStore,
    code_source: C,
) -> Result<AuthorizedClient, OAuthError> {
    Authenticator::new(config, store, code_source)
        .authenticate()
        .await
}

async fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Upload(args) => {
            let mut config = OAuthConfig::from_file(&args.credentials)?;
            let store = TokenStore::new(&args.token);

            let authorized = if args.listen {
                config.ensure_loopback_redirect();
                let source = LoopbackCodeSource::from_redirect_uri(&config.redirect_uri)?;
                authorize(config, store, source).await?
            } else {
                authorize(config, store, ConsoleCodeSource::stdin()).await?
            };

            // Get upload API address from environment variable or use default
            let api_address = std::env::var("UPLOAD_API_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_API_ADDRESS.to_string());
            log::debug!("Using upload API at: {}", api_address);

            let client = VideoClient::new(authorized.into_http(), &api_address)?;
            upload::upload_video(&client, &args.video).await?;
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match usage_exit_code(e.kind()) {
            Some(code) => {
                println!("{}", e.render());
                return ExitCode::from(code);
            }
            None => e.exit(),
        },
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", failure_message(e.as_ref()));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("yt-uploader").chain(args.iter().copied()))
    }

    #[test]
    fn upload_with_one_path_parses() {
        let cli = parse(&["upload", "clip.mp4"]).unwrap();
        let Command::Upload(args) = cli.command;
        assert_eq!(args.video, PathBuf::from("clip.mp4"));
        assert_eq!(args.credentials, PathBuf::from("credentials.json"));
        assert_eq!(args.token, PathBuf::from("token.json"));
        assert!(!args.listen);
    }

    #[test]
    fn config_paths_can_be_overridden() {
        let cli = parse(&[
            "upload",
            "--credentials",
            "/etc/yt/client.json",
            "--token",
            "/tmp/t.json",
            "--listen",
            "clip.mp4",
        ])
        .unwrap();
        let Command::Upload(args) = cli.command;
        assert_eq!(args.credentials, PathBuf::from("/etc/yt/client.json"));
        assert_eq!(args.token, PathBuf::from("/tmp/t.json"));
        assert!(args.listen);
    }

    #[test]
    fn invalid_invocations_exit_with_one() {
        let cases: [&[&str]; 4] = [
            &[],
            &["download", "clip.mp4"],
            &["upload"],
            &["upload", "a.mp4", "b.mp4"],
        ];
        for args in cases {
            let err = parse(args).unwrap_err();
            assert_eq!(usage_exit_code(err.kind()), Some(1), "args: {:?}", args);
        }
    }

    #[tokio::test]
    async fn missing_credentials_are_reported_before_upload() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"frames").unwrap();

        let cli = parse(&[
            "upload",
            "--credentials",
            dir.path().join("credentials.json").to_str().unwrap(),
            "--token",
            dir.path().join("token.json").to_str().unwrap(),
            video.to_str().unwrap(),
        ])
        .unwrap();
        let err = run(cli.command).await.unwrap_err();

        let message = failure_message(err.as_ref());
        assert!(message.starts_with("Error: Unable to read client secret file"));
        assert!(video.exists());
        assert!(!dir.path().join("token.json").exists());
    }

    #[test]
    fn help_is_not_a_usage_error() {
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(usage_exit_code(err.kind()), None);
    }
}
