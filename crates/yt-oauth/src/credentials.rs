use serde::Deserialize;
use std::path::Path;

use crate::OAUTH_CALLBACK_PORT;
use crate::error::OAuthError;

/// Google authorization endpoint used when the client secret file omits `auth_uri`
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
/// Google token endpoint used when the client secret file omits `token_uri`
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
/// Out-of-band redirect, the code is shown to the user instead of redirected
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";
/// Scope needed for `videos.insert`
pub const YOUTUBE_UPLOAD_SCOPE: &str = "https://www.googleapis.com/auth/youtube.upload";

/// Client secret file as downloaded from the Google Cloud console
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

#[derive(Debug, Deserialize)]
struct ClientSecret {
    client_id: String,
    client_secret: String,
    auth_uri: Option<String>,
    token_uri: Option<String>,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

/// OAuth configuration
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Authorization endpoint the user is sent to
    pub auth_uri: String,
    /// Token endpoint for code exchange and refresh
    pub token_uri: String,
    /// Redirect URI for OAuth callback
    pub redirect_uri: String,
    /// OAuth scope(s)
    pub scope: String,
}

impl OAuthConfig {
    /// Create new OAuth configuration with YouTube upload defaults
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
            auth_uri: DEFAULT_AUTH_URI.to_string(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
            redirect_uri: OOB_REDIRECT_URI.to_string(),
            scope: YOUTUBE_UPLOAD_SCOPE.to_string(),
        }
    }

    /// Parse the `installed` or `web` section of a client secret JSON document
    pub fn from_json(content: &str) -> Result<Self, OAuthError> {
        let file: ClientSecretFile = serde_json::from_str(content)
            .map_err(|e| OAuthError::InvalidCredentials(e.to_string()))?;

        let secret = file.installed.or(file.web).ok_or_else(|| {
            OAuthError::InvalidCredentials("missing 'installed' or 'web' section".to_string())
        })?;

        let mut config = Self::new(secret.client_id, secret.client_secret);
        if let Some(auth_uri) = secret.auth_uri {
            config.auth_uri = auth_uri;
        }
        if let Some(token_uri) = secret.token_uri {
            config.token_uri = token_uri;
        }
        if let Some(redirect_uri) = secret.redirect_uris.into_iter().next() {
            config.redirect_uri = redirect_uri;
        }
        Ok(config)
    }

    /// Load configuration from a client secret file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, OAuthError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            OAuthError::ReadCredentials {
                path: path.display().to_string(),
                source,
            }
        })?;
        Self::from_json(&content)
    }

    /// Whether the redirect URI points at an `http` listener on this machine
    pub fn has_loopback_redirect(&self) -> bool {
        reqwest::Url::parse(&self.redirect_uri)
            .map(|url| {
                url.scheme() == "http"
                    && matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"))
            })
            .unwrap_or(false)
    }

    /// Switch to the default loopback callback unless one is already configured
    pub fn ensure_loopback_redirect(&mut self) {
        if !self.has_loopback_redirect() {
            self.redirect_uri = format!("http://localhost:{}/oauth2callback", OAUTH_CALLBACK_PORT);
        }
    }
}
