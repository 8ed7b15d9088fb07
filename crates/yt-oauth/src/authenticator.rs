use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use crate::code_source::CodeSource;
use crate::credentials::OAuthConfig;
use crate::error::OAuthError;
use crate::flow;
use crate::token::{OAuthToken, TokenStore};

/// HTTP client that sends the access token with every request
#[derive(Debug, Clone)]
pub struct AuthorizedClient {
    http: reqwest::Client,
    token: OAuthToken,
}

impl AuthorizedClient {
    pub fn new(token: OAuthToken) -> Result<Self, OAuthError> {
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token.access_token))
            .map_err(|_| OAuthError::InvalidAccessToken)?;
        auth_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth_value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { http, token })
    }

    pub fn token(&self) -> &OAuthToken {
        &self.token
    }

    pub fn into_http(self) -> reqwest::Client {
        self.http
    }
}

/// Obtains a usable token from the cache, a refresh, or the user
pub struct Authenticator<C> {
    config: OAuthConfig,
    store: TokenStore,
    code_source: C,
    http: reqwest::Client,
}

impl<C: CodeSource> Authenticator<C> {
    pub fn new(config: OAuthConfig, store: TokenStore, code_source: C) -> Self {
        Self {
            config,
            store,
            code_source,
            http: reqwest::Client::new(),
        }
    }

    /// Get a valid token and wrap it in an authorized client
    pub async fn authenticate(&mut self) -> Result<AuthorizedClient, OAuthError> {
        let token = self.token().await?;
        AuthorizedClient::new(token)
    }

    /// Get valid token, refreshing or authorizing if necessary
    pub async fn token(&mut self) -> Result<OAuthToken, OAuthError> {
        self.token_at(Utc::now()).await
    }

    async fn token_at(&mut self, now: DateTime<Utc>) -> Result<OAuthToken, OAuthError> {
        let token = match self.store.load() {
            None => self.authorize().await?,
            Some(cached) if cached.is_expired_at(now) => {
                log::info!("Access token expired at {}, refreshing...", cached.expiry);
                flow::refresh_token(&self.http, &self.config, &cached).await?
            }
            Some(cached) => {
                log::debug!("Reusing cached token valid until {}", cached.expiry);
                return Ok(cached);
            }
        };

        self.store.save(&token)?;
        Ok(token)
    }

    /// Run the authorization-code flow with the configured code source
    async fn authorize(&mut self) -> Result<OAuthToken, OAuthError> {
        let (auth_url, verifier) = flow::generate_auth_url(&self.config);
        let code = self.code_source.obtain_code(&auth_url).await?;
        flow::exchange_code(&self.http, &self.config, &code, &verifier).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_source::FixedCodeSource;
    use axum::{Form, Json, Router, http::StatusCode, routing::post};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

    /// Code source for paths that must never prompt the user
    struct NoPrompt;

    impl CodeSource for NoPrompt {
        async fn obtain_code(&mut self, _auth_url: &str) -> Result<String, OAuthError> {
            Err(OAuthError::AuthorizationCode("unexpected prompt".to_string()))
        }
    }

    async fn spawn_token_endpoint(status: StatusCode, body: serde_json::Value) -> (String, Seen) {
        let seen: Seen = Arc::default();
        let seen_clone = seen.clone();

        let app = Router::new().route(
            "/token",
            post(
                move |Form(params): Form<HashMap<String, String>>| async move {
                    seen_clone.lock().unwrap().push(params);
                    (status, Json(body))
                },
            ),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/token", addr), seen)
    }

    fn config(token_uri: String) -> OAuthConfig {
        let mut config = OAuthConfig::new("client".to_string(), "secret".to_string());
        config.token_uri = token_uri;
        config
    }

    fn cached(expiry: DateTime<Utc>, refresh_token: Option<&str>) -> OAuthToken {
        OAuthToken {
            access_token: "cached-access".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: refresh_token.map(str::to_string),
            expiry,
        }
    }

    #[tokio::test]
    async fn missing_cache_runs_code_exchange_and_saves() {
        let (token_uri, seen) = spawn_token_endpoint(
            StatusCode::OK,
            serde_json::json!({
                "access_token": "new-access",
                "refresh_token": "new-refresh",
                "expires_in": 3600,
                "token_type": "Bearer"
            }),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));

        let mut auth = Authenticator::new(
            config(token_uri),
            store.clone(),
            FixedCodeSource::new("typed-code"),
        );
        let token = auth.token().await.unwrap();

        assert_eq!(token.access_token, "new-access");
        assert_eq!(token.refresh_token.as_deref(), Some("new-refresh"));
        assert_eq!(store.load(), Some(token));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["grant_type"], "authorization_code");
        assert_eq!(seen[0]["code"], "typed-code");
        assert_eq!(seen[0]["code_verifier"].len(), 64);
    }

    #[tokio::test]
    async fn valid_cached_token_is_reused_without_network() {
        let (token_uri, seen) =
            spawn_token_endpoint(StatusCode::OK, serde_json::json!({})).await;
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        let now = Utc::now();

        for expiry in [now, now + chrono::Duration::hours(1)] {
            let token = cached(expiry, Some("refresh"));
            store.save(&token).unwrap();

            let mut auth = Authenticator::new(config(token_uri.clone()), store.clone(), NoPrompt);
            assert_eq!(auth.token_at(now).await.unwrap(), token);
        }

        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_saved() {
        let (token_uri, seen) = spawn_token_endpoint(
            StatusCode::OK,
            serde_json::json!({ "access_token": "refreshed", "expires_in": 3599 }),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        let now = Utc::now();
        store
            .save(&cached(now - chrono::Duration::seconds(1), Some("long-lived")))
            .unwrap();

        let mut auth = Authenticator::new(config(token_uri), store.clone(), NoPrompt);
        let token = auth.token_at(now).await.unwrap();

        assert_eq!(token.access_token, "refreshed");
        assert_eq!(token.refresh_token.as_deref(), Some("long-lived"));
        assert!(!token.is_expired_at(now));
        assert_eq!(store.load(), Some(token));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["grant_type"], "refresh_token");
        assert_eq!(seen[0]["refresh_token"], "long-lived");
    }

    #[tokio::test]
    async fn failed_refresh_is_fatal_and_keeps_cache() {
        let (token_uri, _seen) = spawn_token_endpoint(
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "error": "invalid_grant" }),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        let now = Utc::now();
        let stale = cached(now - chrono::Duration::minutes(5), Some("revoked"));
        store.save(&stale).unwrap();

        let mut auth = Authenticator::new(config(token_uri), store.clone(), NoPrompt);
        let err = auth.token_at(now).await.unwrap_err();

        match err {
            OAuthError::TokenEndpoint { status, body, .. } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert!(body.contains("invalid_grant"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.load(), Some(stale));
    }

    #[tokio::test]
    async fn expired_token_without_refresh_token_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        let now = Utc::now();
        store
            .save(&cached(now - chrono::Duration::minutes(1), None))
            .unwrap();

        let mut auth = Authenticator::new(
            config("http://127.0.0.1:9/token".to_string()),
            store,
            NoPrompt,
        );
        let err = auth.token_at(now).await.unwrap_err();
        assert!(matches!(err, OAuthError::NoRefreshToken));
    }

    #[test]
    fn authorized_client_keeps_token() {
        let token = cached(Utc::now(), None);
        let client = AuthorizedClient::new(token.clone()).unwrap();
        assert_eq!(client.token(), &token);
    }
}
