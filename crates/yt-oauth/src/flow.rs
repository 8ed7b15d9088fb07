use chrono::Utc;

use crate::credentials::OAuthConfig;
use crate::error::OAuthError;
use crate::token::OAuthToken;

/// State value sent with the authorization request and expected back on callback
pub const AUTH_STATE: &str = "state-token";

/// Generate PKCE verifier and challenge
pub fn generate_pkce() -> (String, String) {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use rand::Rng;
    use rand::distributions::Alphanumeric;
    use sha2::{Digest, Sha256};

    // Generate random verifier (43-128 characters) using cryptographically secure RNG
    let verifier: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();

    // Generate challenge: base64url(SHA256(verifier))
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let hash = hasher.finalize();
    let challenge = URL_SAFE_NO_PAD.encode(hash);

    (verifier, challenge)
}

/// Generate authorization URL, returning it together with the PKCE verifier
pub fn generate_auth_url(config: &OAuthConfig) -> (String, String) {
    let (verifier, challenge) = generate_pkce();

    let separator = if config.auth_uri.contains('?') { '&' } else { '?' };
    let auth_url = format!(
        "{}{}\
        client_id={}&\
        redirect_uri={}&\
        response_type=code&\
        scope={}&\
        state={}&\
        code_challenge={}&\
        code_challenge_method=S256&\
        access_type=offline",
        config.auth_uri,
        separator,
        urlencoding::encode(&config.client_id),
        urlencoding::encode(&config.redirect_uri),
        urlencoding::encode(&config.scope),
        urlencoding::encode(AUTH_STATE),
        urlencoding::encode(&challenge),
    );

    (auth_url, verifier)
}

/// POST a form to the token endpoint and return the decoded JSON body
async fn request_token(
    client: &reqwest::Client,
    config: &OAuthConfig,
    params: &[(&str, &str)],
    action: &'static str,
) -> Result<serde_json::Value, OAuthError> {
    let response = client.post(&config.token_uri).form(params).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await?;
        return Err(OAuthError::TokenEndpoint {
            action,
            status,
            body,
        });
    }

    Ok(response.json().await?)
}

/// Exchange authorization code for tokens
pub async fn exchange_code(
    client: &reqwest::Client,
    config: &OAuthConfig,
    code: &str,
    verifier: &str,
) -> Result<OAuthToken, OAuthError> {
    log::info!("Exchanging authorization code for tokens...");

    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("code", code),
        ("code_verifier", verifier),
        ("grant_type", "authorization_code"),
        ("redirect_uri", config.redirect_uri.as_str()),
    ];

    let token_response =
        request_token(client, config, &params, "exchange authorization code").await?;
    let token = OAuthToken::from_response(&token_response, Utc::now(), None)?;

    log::info!("Successfully obtained OAuth tokens");

    Ok(token)
}

/// Refresh the access token using the refresh token of `current`
pub async fn refresh_token(
    client: &reqwest::Client,
    config: &OAuthConfig,
    current: &OAuthToken,
) -> Result<OAuthToken, OAuthError> {
    let refresh_token = current
        .refresh_token
        .as_deref()
        .ok_or(OAuthError::NoRefreshToken)?;

    log::info!("Refreshing OAuth token...");

    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];

    let refresh_response = request_token(client, config, &params, "refresh OAuth token").await?;
    let token = OAuthToken::from_response(&refresh_response, Utc::now(), Some(refresh_token))?;

    log::info!("OAuth token refreshed successfully");

    Ok(token)
}
