use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

use crate::error::OAuthError;
use crate::flow::AUTH_STATE;

/// Supplies the authorization code once the user has granted consent at `auth_url`
pub trait CodeSource {
    fn obtain_code(&mut self, auth_url: &str) -> impl Future<Output = Result<String, OAuthError>>;
}

/// Reads the code typed by the user on a line of input
pub struct ConsoleCodeSource<R> {
    input: R,
}

impl ConsoleCodeSource<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> ConsoleCodeSource<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }
}

impl<R: AsyncBufRead + Unpin> CodeSource for ConsoleCodeSource<R> {
    async fn obtain_code(&mut self, auth_url: &str) -> Result<String, OAuthError> {
        eprintln!("\n=================================================");
        eprintln!("OAuth 2.0 Authorization Required");
        eprintln!("=================================================");
        eprintln!(
            "\nGo to the following link in your browser then type the authorization code:\n"
        );
        eprintln!("{}\n", auth_url);

        let mut line = String::new();
        self.input
            .read_line(&mut line)
            .await
            .map_err(|e| OAuthError::AuthorizationCode(e.to_string()))?;

        line.split_whitespace()
            .next()
            .map(str::to_string)
            .ok_or_else(|| OAuthError::AuthorizationCode("no code entered".to_string()))
    }
}

/// Returns a preset code without any user interaction
#[derive(Debug, Clone)]
pub struct FixedCodeSource {
    code: String,
}

impl FixedCodeSource {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl CodeSource for FixedCodeSource {
    async fn obtain_code(&mut self, _auth_url: &str) -> Result<String, OAuthError> {
        Ok(self.code.clone())
    }
}

/// Receives the code on a local callback server bound to a loopback redirect URI
pub struct LoopbackCodeSource {
    port: u16,
    path: String,
    timeout: tokio::time::Duration,
}

impl LoopbackCodeSource {
    pub fn from_redirect_uri(redirect_uri: &str) -> Result<Self, OAuthError> {
        let url = reqwest::Url::parse(redirect_uri)
            .map_err(|_| OAuthError::RedirectUri(redirect_uri.to_string()))?;
        if url.scheme() != "http" {
            return Err(OAuthError::RedirectUri(redirect_uri.to_string()));
        }
        let port = url
            .port_or_known_default()
            .ok_or_else(|| OAuthError::RedirectUri(redirect_uri.to_string()))?;

        Ok(Self {
            port,
            path: url.path().to_string(),
            timeout: tokio::time::Duration::from_secs(300), // 5 minutes
        })
    }

    pub fn with_timeout(mut self, timeout: tokio::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl CodeSource for LoopbackCodeSource {
    async fn obtain_code(&mut self, auth_url: &str) -> Result<String, OAuthError> {
        use axum::{
            Router,
            extract::Query,
            response::{Html, IntoResponse},
            routing::get,
        };

        #[derive(Deserialize)]
        struct AuthCallback {
            code: Option<String>,
            state: Option<String>,
            error: Option<String>,
        }

        eprintln!("\n=================================================");
        eprintln!("OAuth 2.0 Authorization Required");
        eprintln!("=================================================");
        eprintln!("\nPlease visit the following URL to authorize the application:\n");
        eprintln!("{}\n", auth_url);
        eprintln!("Waiting for authorization...");
        eprintln!("=================================================\n");

        // Shared state for callback
        let code_receiver = Arc::new(Mutex::new(None::<Result<String, String>>));
        let code_receiver_clone = code_receiver.clone();

        let callback_handler = move |Query(params): Query<AuthCallback>| async move {
            if let Some(error) = params.error {
                *code_receiver_clone.lock().await = Some(Err(error.clone()));
                return Html(format!(
                    "<html><body><h1>Authorization Failed</h1><p>Error: {}</p>\
                    <p>You can close this window.</p></body></html>",
                    error
                ))
                .into_response();
            }

            if params.state.as_deref() != Some(AUTH_STATE) {
                return Html(
                    "<html><body><h1>Authorization Failed</h1><p>State mismatch</p></body></html>",
                )
                .into_response();
            }

            if let Some(code) = params.code {
                *code_receiver_clone.lock().await = Some(Ok(code));
                return Html(
                    "<html><body><h1>Authorization Successful!</h1>\
                    <p>You can close this window and return to the application.</p></body></html>",
                )
                .into_response();
            }

            Html("<html><body><h1>Authorization Failed</h1><p>No code received</p></body></html>")
                .into_response()
        };

        let app = Router::new().route(&self.path, get(callback_handler));

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", self.port)).await?;
        let server = axum::serve(listener, app);
        let server_handle = tokio::spawn(async move {
            server.await.ok();
        });

        let start = tokio::time::Instant::now();
        let outcome = loop {
            if start.elapsed() > self.timeout {
                break Err(OAuthError::AuthorizationCode(format!(
                    "no callback received within {} seconds",
                    self.timeout.as_secs()
                )));
            }

            if let Some(received) = code_receiver.lock().await.take() {
                break received.map_err(OAuthError::AuthorizationCode);
            }

            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        };

        server_handle.abort();
        outcome
    }
}
