//! HTTP client for the Dropbox Business team endpoints.
//!
//! Every call goes through [`TeamApiClient::rpc`]:
//! - pulls a valid bearer token from the [`Authenticator`]
//! - POSTs the JSON body to `{api_base}/{route}`
//! - maps non-2xx, empty and malformed bodies to [`DropboxError`]
//!
//! One request per call. Nothing is retried and no pagination is followed.

use crate::auth::{mask_token, Authenticator};
use crate::config::Timeouts;
use crate::error::{DropboxError, Result};
use crate::team;
use crate::types::{MembersListResponse, TeamEventsResponse, TeamInfo, TimeRange};
use log::{debug, info, warn};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

pub const ROUTE_TEAM_INFO: &str = "team/get_info";
pub const ROUTE_MEMBERS_LIST: &str = "team/members/list_v2";
pub const ROUTE_TEAM_EVENTS: &str = "team_log/get_events";

/// Audit-log category used by [`TeamApiClient::get_sign_in_events`].
pub const LOGINS_CATEGORY: &str = "logins";

/// Read-only client for team info, members and the team audit log.
pub struct TeamApiClient {
    http: reqwest::Client,
    auth: Arc<Authenticator>,
    api_base: String,
}

impl std::fmt::Debug for TeamApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamApiClient")
            .field("api_base", &self.api_base)
            .field("auth", &self.auth)
            .finish()
    }
}

impl TeamApiClient {
    /// Create a client that takes its tokens from `auth`.
    ///
    /// The API base URL is taken from the authenticator's endpoints.
    pub fn new(auth: Arc<Authenticator>) -> Result<Self> {
        Self::with_timeouts(auth, Timeouts::default())
    }

    pub fn with_timeouts(auth: Arc<Authenticator>, timeouts: Timeouts) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.api_read)
            .build()
            .map_err(|e| DropboxError::Transport(format!("failed to build HTTP client: {e}")))?;
        let api_base = auth.endpoints().api_base.trim_end_matches('/').to_string();

        Ok(Self {
            http,
            auth,
            api_base,
        })
    }

    pub fn authenticator(&self) -> &Arc<Authenticator> {
        &self.auth
    }

    /// Team name, id, license counts and policies.
    pub async fn get_team_info(&self) -> Result<TeamInfo> {
        self.rpc(ROUTE_TEAM_INFO, &team::build_get_team_info()).await
    }

    /// First page of team members. `limit` must be within `1..=1000`.
    pub async fn get_team_members(
        &self,
        limit: u32,
        include_removed: bool,
    ) -> Result<MembersListResponse> {
        let body = team::build_members_list(limit, include_removed)?;
        self.rpc(ROUTE_MEMBERS_LIST, &body).await
    }

    /// First page of audit-log events. `limit` must be at least 1;
    /// `category` and `time_range` are passed through for the server to check.
    pub async fn get_team_events(
        &self,
        limit: u32,
        category: Option<&str>,
        time_range: Option<TimeRange>,
    ) -> Result<TeamEventsResponse> {
        let body = team::build_team_events(limit, category, time_range)?;
        self.rpc(ROUTE_TEAM_EVENTS, &body).await
    }

    /// Sign-in events: [`TeamApiClient::get_team_events`] in the `logins` category.
    pub async fn get_sign_in_events(
        &self,
        limit: u32,
        time_range: Option<TimeRange>,
    ) -> Result<TeamEventsResponse> {
        self.get_team_events(limit, Some(LOGINS_CATEGORY), time_range)
            .await
    }

    /// Release the connection pool held by this client.
    pub fn close(self) {
        info!("Closing Dropbox team API client");
        drop(self.http);
    }

    // ── RPC endpoint (JSON in, JSON out) ────────────────────────────

    /// Call an RPC endpoint: `POST {api_base}/{route}` with JSON body.
    pub async fn rpc<P: Serialize, R: DeserializeOwned>(
        &self,
        route: &str,
        params: &P,
    ) -> Result<R> {
        let token = self.auth.valid_access_token().await?;
        let url = format!("{}/{}", self.api_base, route);
        debug!("POST {url} (token {})", mask_token(&token));

        let resp = self
            .http
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, "application/json")
            .json(params)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            warn!("Dropbox API {route} returned {status}");
            return Err(DropboxError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Err(DropboxError::EmptyResponse);
        }

        debug!("Dropbox API {route} response: {body}");
        serde_json::from_str(&body).map_err(|e| DropboxError::Decode(format!("{route}: {e}")))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
