use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while loading credentials or obtaining a token
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Unable to read client secret file '{path}': {source}")]
    ReadCredentials {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to parse client secret file to config: {0}")]
    InvalidCredentials(String),

    #[error("Unable to cache oauth token to '{path}': {source}")]
    SaveToken {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Token endpoint request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to {action} (status {status}): {body}")]
    TokenEndpoint {
        action: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("Missing {0} in token response")]
    MissingField(&'static str),

    #[error("Cached token has expired and has no refresh token")]
    NoRefreshToken,

    #[error("Access token cannot be used as a header value")]
    InvalidAccessToken,

    #[error("Unable to read authorization code: {0}")]
    AuthorizationCode(String),

    #[error("Invalid redirect URI '{0}' for a local callback server")]
    RedirectUri(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
