//! App credentials, endpoint URLs and transport timeouts.

use crate::error::{DropboxError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const AUTHORIZE_URL: &str = "https://www.dropbox.com/oauth2/authorize";
pub const TOKEN_URL: &str = "https://api.dropboxapi.com/oauth2/token";
pub const API_BASE: &str = "https://api.dropboxapi.com/2";

pub const ENV_CLIENT_ID: &str = "DROPBOX_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "DROPBOX_CLIENT_SECRET";
pub const ENV_REDIRECT_URI: &str = "DROPBOX_REDIRECT_URI";

/// OAuth 2.0 app credentials registered in the Dropbox App Console.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DropboxAppConfig {
    /// App key (client id).
    pub client_id: String,
    /// App secret.
    pub client_secret: String,
    /// Redirect URI registered for the app.
    pub redirect_uri: String,
}

impl std::fmt::Debug for DropboxAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DropboxAppConfig")
            .field("client_id", &"****")
            .field("client_secret", &"****")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

impl DropboxAppConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Read credentials from `DROPBOX_CLIENT_ID`, `DROPBOX_CLIENT_SECRET` and
    /// `DROPBOX_REDIRECT_URI`.
    pub fn from_env() -> Result<Self> {
        let read = |key: &str| {
            std::env::var(key)
                .map_err(|_| DropboxError::invalid(format!("environment variable {key} is not set")))
        };
        let config = Self::new(
            read(ENV_CLIENT_ID)?,
            read(ENV_CLIENT_SECRET)?,
            read(ENV_REDIRECT_URI)?,
        );
        config.validate()?;
        Ok(config)
    }

    /// Reject empty (or whitespace-only) credentials.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("redirect_uri", &self.redirect_uri),
        ] {
            if value.trim().is_empty() {
                return Err(DropboxError::invalid(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }
}

/// Base URLs for the authorization page, the token endpoint and the RPC API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Endpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub api_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            authorize_url: AUTHORIZE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            api_base: API_BASE.to_string(),
        }
    }
}

impl Endpoints {
    /// Point the token endpoint and RPC API at one base URL (a mock server).
    /// The authorization page is left on its default.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            authorize_url: AUTHORIZE_URL.to_string(),
            token_url: format!("{base}/oauth2/token"),
            api_base: format!("{base}/2"),
        }
    }
}

/// Connect/read timeouts for the two HTTP clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    /// Read timeout for the token endpoint.
    pub auth_read: Duration,
    /// Read timeout for API calls.
    pub api_read: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            auth_read: Duration::from_secs(30),
            api_read: Duration::from_secs(60),
        }
    }
}
