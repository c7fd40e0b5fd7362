//! Typed records for the Dropbox Business team endpoints.
//!
//! Every record tolerates unknown fields and missing optional members so new
//! API fields never break decoding. Timestamps are kept as the opaque ISO-8601
//! strings Dropbox sends.

use crate::error::DropboxError;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OAuth 2.0
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Token response from `/oauth2/token`.
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuthTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
}

impl std::fmt::Debug for OAuthTokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthTokenResponse")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("scope", &self.scope)
            .field("team_id", &self.team_id)
            .finish()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Dropbox API Error
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Dropbox API v2 error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropboxApiError {
    #[serde(default)]
    pub error_summary: Option<String>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub user_message: Option<DropboxUserMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropboxUserMessage {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Union tags
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// An enumerated Dropbox value.
///
/// Decodes from a plain string (`"active"`) or a tagged object
/// (`{".tag": "active", ...}`); encodes as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnionTag(pub String);

impl UnionTag {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UnionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnionTag {
    fn from(s: &str) -> Self {
        UnionTag(s.to_string())
    }
}

impl Serialize for UnionTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UnionTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Plain(String),
            Tagged {
                #[serde(rename = ".tag")]
                tag: String,
            },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Plain(s) => UnionTag(s),
            Repr::Tagged { tag } => UnionTag(tag),
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Team info
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Result of `team/get_info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub num_licensed_users: Option<u32>,
    #[serde(default)]
    pub num_provisioned_users: Option<u32>,
    #[serde(default)]
    pub policies: Option<TeamPolicies>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamPolicies {
    #[serde(default)]
    pub sharing: Option<SharingPolicies>,
    #[serde(default)]
    pub emm_state: Option<UnionTag>,
    #[serde(default)]
    pub office_addin: Option<UnionTag>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharingPolicies {
    #[serde(default)]
    pub shared_folder_member_policy: Option<UnionTag>,
    #[serde(default)]
    pub shared_folder_join_policy: Option<UnionTag>,
    #[serde(default)]
    pub shared_link_create_policy: Option<UnionTag>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Team members
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NameInfo {
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub familiar_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub abbreviated_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamMemberProfile {
    #[serde(default)]
    pub team_member_id: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<NameInfo>,
    #[serde(default)]
    pub membership_type: Option<UnionTag>,
    #[serde(default)]
    pub status: Option<UnionTag>,
    /// ISO-8601, passed through unparsed.
    #[serde(default)]
    pub joined_on: Option<String>,
}

impl TeamMemberProfile {
    /// The member's display name, if Dropbox sent one.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_ref().and_then(|n| n.display_name.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    #[serde(default)]
    pub profile: Option<TeamMemberProfile>,
    #[serde(default)]
    pub role: Option<UnionTag>,
}

/// Body of `team/members/list_v2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembersListRequest {
    #[serde(default = "default_members_limit")]
    pub limit: u32,
    #[serde(default)]
    pub include_removed: bool,
}

fn default_members_limit() -> u32 {
    100
}

impl Default for MembersListRequest {
    fn default() -> Self {
        Self {
            limit: default_members_limit(),
            include_removed: false,
        }
    }
}

/// First page of `team/members/list_v2`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MembersListResponse {
    #[serde(default)]
    pub members: Vec<TeamMember>,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Team audit log
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Start/end bounds for an audit-log query, as opaque timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl TimeRange {
    pub fn new(start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        Self {
            start_time: Some(start_time.into()),
            end_time: Some(end_time.into()),
        }
    }

    /// The `days` days leading up to `now`, as RFC 3339 UTC strings.
    ///
    /// A window reaching past the representable calendar is an
    /// [`DropboxError::InvalidArgument`].
    pub fn last_days(now: DateTime<Utc>, days: u32) -> crate::Result<Self> {
        let start = TimeDelta::try_days(i64::from(days))
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| DropboxError::invalid(format!("{days} days is out of range")))?;
        Ok(Self::new(
            start.to_rfc3339_opts(SecondsFormat::Secs, true),
            now.to_rfc3339_opts(SecondsFormat::Secs, true),
        ))
    }
}

/// Body of `team_log/get_events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamEventsRequest {
    #[serde(default = "default_events_limit")]
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeRange>,
}

fn default_events_limit() -> u32 {
    50
}

impl Default for TeamEventsRequest {
    fn default() -> Self {
        Self {
            limit: default_events_limit(),
            category: None,
            time: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub team_member_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Who performed an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(default)]
    pub user: Option<UserInfo>,
    #[serde(default)]
    pub admin: Option<UserInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostInfo {
    #[serde(default)]
    pub host: Option<String>,
}

/// Where an event came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    #[serde(default)]
    pub geo_location: Option<GeoLocation>,
    #[serde(default)]
    pub host: Option<HostInfo>,
}

impl Origin {
    /// `"City, Region, Country"` with `Unknown` for missing parts, followed by
    /// `" (Host: h)"` when a host is known.
    pub fn location_summary(&self) -> String {
        let mut out = match &self.geo_location {
            Some(geo) => {
                let part = |v: &Option<String>| v.clone().unwrap_or_else(|| "Unknown".into());
                format!("{}, {}, {}", part(&geo.city), part(&geo.region), part(&geo.country))
            }
            None => "Unknown Location".to_string(),
        };
        if let Some(host) = self.host.as_ref().and_then(|h| h.host.as_deref()) {
            out.push_str(&format!(" (Host: {host})"));
        }
        out
    }
}

/// One audit-log entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamEvent {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub event_category: Option<UnionTag>,
    #[serde(default)]
    pub event_type: Option<UnionTag>,
    /// Event-specific payload; its schema varies with `event_type`.
    #[serde(default)]
    pub details: Option<serde_json::Value>,
    #[serde(default)]
    pub actor: Option<Actor>,
    #[serde(default)]
    pub origin: Option<Origin>,
}

impl TeamEvent {
    /// The user (or admin) that performed the event.
    pub fn actor_user(&self) -> Option<&UserInfo> {
        self.actor
            .as_ref()
            .and_then(|a| a.user.as_ref().or(a.admin.as_ref()))
    }
}

/// First page of `team_log/get_events`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamEventsResponse {
    #[serde(default)]
    pub events: Vec<TeamEvent>,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
