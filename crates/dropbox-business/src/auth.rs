//! OAuth 2.0 authorization-code flow for a Dropbox Business app.
//!
//! [`Authenticator`] owns the app credentials and the current token pair.
//! Callers obtain bearer tokens through [`Authenticator::valid_access_token`],
//! which refreshes an expired token before handing it out.

use crate::clock::{Clock, SystemClock};
use crate::config::{DropboxAppConfig, Endpoints, Timeouts};
use crate::error::{DropboxError, Result};
use crate::types::OAuthTokenResponse;
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Scopes requested for team info, member listing and the audit log.
pub const SCOPES: &[&str] = &["team_info.read", "members.read", "events.read"];

/// Seconds subtracted from the server-declared lifetime so a token is
/// refreshed before Dropbox stops accepting it.
pub const EXPIRY_MARGIN_SECS: i64 = 300;

/// Token pair held by the authenticator. Never persisted.
#[derive(Clone, Default)]
pub struct TokenState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for TokenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenState")
            .field("access_token", &self.access_token.as_deref().map(mask_token))
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Show a masked version of the token for logging.
pub fn mask_token(token: &str) -> String {
    if token.len() <= 8 || !token.is_char_boundary(4) || !token.is_char_boundary(token.len() - 4) {
        "****".into()
    } else {
        format!("{}…{}", &token[..4], &token[token.len() - 4..])
    }
}

/// Expiry instant for a token issued at `now` that lives `expires_in` seconds,
/// minus [`EXPIRY_MARGIN_SECS`].
///
/// Lifetimes that do not fit a timestamp are a [`DropboxError::Decode`].
pub fn expiry_from(now: DateTime<Utc>, expires_in: i64) -> Result<DateTime<Utc>> {
    expires_in
        .checked_sub(EXPIRY_MARGIN_SECS)
        .and_then(TimeDelta::try_seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| DropboxError::Decode(format!("expires_in out of range: {expires_in}")))
}

/// A token is expired once `now` is strictly past its recorded expiry.
/// Without a recorded expiry it never expires.
pub fn is_expired(expires_at: Option<&DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    matches!(expires_at, Some(exp) if now > *exp)
}

/// Percent-encode a query value (spaces as `%20`).
fn encode_query_value(value: &str) -> String {
    // byte_serialize escapes a literal '+' as %2B, so every '+' it emits is a space.
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Credential and token-lifecycle owner for one Dropbox app.
pub struct Authenticator {
    config: DropboxAppConfig,
    endpoints: Endpoints,
    http: reqwest::Client,
    clock: Arc<dyn Clock>,
    state: Mutex<TokenState>,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("client_id", &"****")
            .field("redirect_uri", &self.config.redirect_uri)
            .field("token_url", &self.endpoints.token_url)
            .finish()
    }
}

impl Authenticator {
    /// Create an authenticator for the given app credentials.
    ///
    /// Fails with [`DropboxError::InvalidArgument`] if any value is empty.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Result<Self> {
        Self::from_config(DropboxAppConfig::new(client_id, client_secret, redirect_uri))
    }

    /// Create an authenticator from a loaded [`DropboxAppConfig`].
    pub fn from_config(config: DropboxAppConfig) -> Result<Self> {
        config.validate()?;
        let timeouts = Timeouts::default();
        let http = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.auth_read)
            .build()
            .map_err(|e| DropboxError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            endpoints: Endpoints::default(),
            http,
            clock: Arc::new(SystemClock),
            state: Mutex::new(TokenState::default()),
        })
    }

    /// Override the endpoint URLs (used to target a mock server).
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Replace the time source used for expiry tracking.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// URL the user opens to grant the app access.
    ///
    /// Requests offline access so the exchange also yields a refresh token.
    pub fn authorization_url(&self) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&token_access_type=offline",
            self.endpoints.authorize_url,
            encode_query_value(&self.config.client_id),
            encode_query_value(&self.config.redirect_uri),
            encode_query_value(&SCOPES.join(" ")),
        )
    }

    /// Exchange the authorization code for an access/refresh token pair,
    /// replacing any tokens held before.
    pub async fn exchange_code(&self, code: &str) -> Result<()> {
        if code.trim().is_empty() {
            return Err(DropboxError::invalid("authorization code must not be empty"));
        }

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
        ];

        let mut state = self.state.lock().await;
        let token = self.request_token(&params).await?;
        let now = self.clock.now();
        let expires_at = token
            .expires_in
            .map(|secs| expiry_from(now, secs))
            .transpose()?;

        state.access_token = Some(token.access_token);
        state.refresh_token = token.refresh_token;
        state.expires_at = expires_at;

        info!("Obtained Dropbox access token");
        Ok(())
    }

    /// Mint a new access token from the stored refresh token.
    ///
    /// The refresh token itself is kept as is. On failure the previous token
    /// stays in place and the error is returned.
    pub async fn refresh_access_token(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.refresh_locked(&mut state).await
    }

    /// Return an access token that is not past its recorded expiry,
    /// refreshing first if needed.
    pub async fn valid_access_token(&self) -> Result<String> {
        let mut state = self.state.lock().await;
        if state.access_token.is_none() {
            return Err(DropboxError::illegal_state(
                "no access token available; exchange an authorization code first",
            ));
        }

        if is_expired(state.expires_at.as_ref(), self.clock.now()) {
            info!("Dropbox access token expired, refreshing");
            self.refresh_locked(&mut state).await?;
        }

        state
            .access_token
            .clone()
            .ok_or_else(|| DropboxError::illegal_state("no access token available"))
    }

    /// Whether a code exchange has succeeded.
    pub async fn is_authenticated(&self) -> bool {
        self.state.lock().await.access_token.is_some()
    }

    /// Recorded expiry of the current access token (already reduced by the
    /// safety margin).
    pub async fn token_expiry(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.expires_at
    }

    /// Whether the next [`Authenticator::valid_access_token`] call will refresh.
    pub async fn is_token_expired(&self) -> bool {
        let state = self.state.lock().await;
        is_expired(state.expires_at.as_ref(), self.clock.now())
    }

    /// A copy of the current token state.
    pub async fn token_state(&self) -> TokenState {
        self.state.lock().await.clone()
    }

    async fn refresh_locked(&self, state: &mut TokenState) -> Result<()> {
        let refresh_token = state
            .refresh_token
            .clone()
            .ok_or_else(|| DropboxError::illegal_state("no refresh token available"))?;

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let token = self.request_token(&params).await?;
        let now = self.clock.now();
        let expires_at = token
            .expires_in
            .map(|secs| expiry_from(now, secs))
            .transpose()?;

        state.access_token = Some(token.access_token);
        if expires_at.is_some() {
            state.expires_at = expires_at;
        }

        info!("Refreshed Dropbox access token");
        Ok(())
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<OAuthTokenResponse> {
        debug!("POST {}", self.endpoints.token_url);
        let resp = self
            .http
            .post(&self.endpoints.token_url)
            .form(params)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            warn!("Dropbox token endpoint returned {status}");
            return Err(DropboxError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Err(DropboxError::EmptyResponse);
        }

        serde_json::from_str(&body)
            .map_err(|e| DropboxError::Decode(format!("token response: {e}")))
    }
}
