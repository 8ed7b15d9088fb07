use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::OAuthError;

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// OAuth 2.0 token information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    /// Access token for API requests
    pub access_token: String,
    /// Token type (usually "Bearer")
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Refresh token for getting new access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Moment the access token stops being accepted
    pub expiry: DateTime<Utc>,
}

impl OAuthToken {
    /// Check if the token expired strictly before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry < now
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Build a token from a token endpoint response.
    ///
    /// A refresh response usually omits `refresh_token`, in which case
    /// `previous_refresh_token` is carried over.
    pub fn from_response(
        response: &serde_json::Value,
        now: DateTime<Utc>,
        previous_refresh_token: Option<&str>,
    ) -> Result<Self, OAuthError> {
        let access_token = response
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or(OAuthError::MissingField("access_token"))?
            .to_string();

        let expires_in = response
            .get("expires_in")
            .and_then(|v| v.as_i64())
            .ok_or(OAuthError::MissingField("expires_in"))?;

        let refresh_token = response
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .or(previous_refresh_token)
            .map(str::to_string);

        Ok(Self {
            access_token,
            token_type: response
                .get("token_type")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(default_token_type),
            refresh_token,
            expiry: now + chrono::Duration::seconds(expires_in),
        })
    }
}

/// Token cache kept in a single JSON file
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached token.
    ///
    /// Missing or unreadable caches yield `None` so the caller can fall back
    /// to interactive authorization.
    pub fn load(&self) -> Option<OAuthToken> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                log::debug!("No cached token at '{}': {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(token) => Some(token),
            Err(e) => {
                log::warn!(
                    "Ignoring malformed token file '{}': {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Save token to file with secure permissions, replacing any previous one
    pub fn save(&self, token: &OAuthToken) -> Result<(), OAuthError> {
        eprintln!("Saving credential file to: {}", self.path.display());

        let content = serde_json::to_string_pretty(token)
            .map_err(|e| self.save_error(std::io::Error::other(e)))?;

        std::fs::write(&self.path, content).map_err(|e| self.save_error(e))?;

        // Set secure permissions (owner read/write only) on Unix-like systems
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, permissions).map_err(|e| self.save_error(e))?;
        }

        Ok(())
    }

    fn save_error(&self, source: std::io::Error) -> OAuthError {
        OAuthError::SaveToken {
            path: self.path.display().to_string(),
            source,
        }
    }
}
