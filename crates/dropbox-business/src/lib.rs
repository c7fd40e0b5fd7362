//! # Dropbox Business team client
//!
//! Read-only access to the Dropbox Business administration API:
//!
//! - **OAuth 2.0**: authorization URL, code exchange, refresh-before-expiry
//! - **Team**: team info with sharing / EMM / add-in policies
//! - **Members**: first page of `team/members/list_v2`
//! - **Audit log**: first page of `team_log/get_events`, sign-in events
//!
//! ```no_run
//! use dropbox_business::{Authenticator, TeamApiClient, TimeRange};
//! use std::sync::Arc;
//!
//! # async fn example() -> dropbox_business::Result<()> {
//! let auth = Authenticator::new("app-key", "app-secret", "http://localhost:8080/callback")?;
//! println!("Open {}", auth.authorization_url());
//! auth.exchange_code("code-from-redirect").await?;
//!
//! let client = TeamApiClient::new(Arc::new(auth))?;
//! let team = client.get_team_info().await?;
//! let members = client.get_team_members(100, false).await?;
//! let range = TimeRange::last_days(chrono::Utc::now(), 30)?;
//! let logins = client.get_sign_in_events(50, Some(range)).await?;
//! client.close();
//! # let _ = (team, members, logins);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod team;
pub mod types;

pub use auth::{Authenticator, TokenState};
pub use client::TeamApiClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DropboxAppConfig, Endpoints, Timeouts};
pub use error::{DropboxError, Result};
pub use team::PlanTier;
pub use types::*;
