//! OAuth 2.0 support for uploading to the YouTube Data API.
//!
//! The [`Authenticator`] reuses a cached token from a [`TokenStore`], refreshes
//! it when expired, or runs the authorization-code flow through a
//! [`CodeSource`] when nothing is cached.

mod authenticator;
mod code_source;
mod credentials;
mod error;
mod flow;
mod token;

pub use authenticator::{Authenticator, AuthorizedClient};
pub use code_source::{CodeSource, ConsoleCodeSource, FixedCodeSource, LoopbackCodeSource};
pub use credentials::{
    DEFAULT_AUTH_URI, DEFAULT_TOKEN_URI, OAuthConfig, OOB_REDIRECT_URI, YOUTUBE_UPLOAD_SCOPE,
};
pub use error::OAuthError;
pub use flow::{AUTH_STATE, exchange_code, generate_auth_url, generate_pkce, refresh_token};
pub use token::{OAuthToken, TokenStore};

/// Default OAuth callback port
pub const OAUTH_CALLBACK_PORT: u16 = 8080;
