//! Team administration request bodies (Business / Enterprise accounts).

use crate::error::{DropboxError, Result};
use crate::types::{MembersListRequest, TeamEventsRequest, TimeRange};

/// Largest page `team/members/list_v2` accepts.
pub const MAX_MEMBERS_LIMIT: u32 = 1000;

/// Build team/get_info request (no args, empty object).
pub fn build_get_team_info() -> serde_json::Value {
    serde_json::json!({})
}

/// Build team/members/list_v2 request body.
pub fn build_members_list(limit: u32, include_removed: bool) -> Result<MembersListRequest> {
    if !(1..=MAX_MEMBERS_LIMIT).contains(&limit) {
        return Err(DropboxError::invalid(format!(
            "limit must be between 1 and {MAX_MEMBERS_LIMIT}, got {limit}"
        )));
    }
    Ok(MembersListRequest {
        limit,
        include_removed,
    })
}

/// Build team_log/get_events request body.
pub fn build_team_events(
    limit: u32,
    category: Option<&str>,
    time: Option<TimeRange>,
) -> Result<TeamEventsRequest> {
    if limit == 0 {
        return Err(DropboxError::invalid("limit must be greater than 0"));
    }
    Ok(TeamEventsRequest {
        limit,
        category: category.map(str::to_string),
        time,
    })
}

/// Rough Dropbox Business plan, estimated from the licensed-user count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanTier {
    Basic,
    Standard,
    Advanced,
    Enterprise,
    Unknown,
}

impl PlanTier {
    pub fn from_licensed_users(licensed: Option<u32>) -> Self {
        match licensed {
            None => PlanTier::Unknown,
            Some(0..=3) => PlanTier::Basic,
            Some(4..=100) => PlanTier::Standard,
            Some(101..=300) => PlanTier::Advanced,
            Some(_) => PlanTier::Enterprise,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlanTier::Basic => "Dropbox Business Basic (1-3 users)",
            PlanTier::Standard => "Dropbox Business Standard (3+ users)",
            PlanTier::Advanced => "Dropbox Business Advanced (3+ users)",
            PlanTier::Enterprise => "Dropbox Business Enterprise (300+ users)",
            PlanTier::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
