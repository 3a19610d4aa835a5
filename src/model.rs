//! Core data records for the invite feed.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// Feed operations take an explicit timestamp so tests can drive the
/// clock; callers pass this at the boundary.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// A participant. Created at login (name-only, client-generated id) or
/// pre-seeded as mock data. Immutable for the lifetime of the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub handle: String,
    pub avatar_url: String,
}

impl User {
    /// Build the local user at login. The handle is derived from the
    /// display name.
    pub fn new_local(name: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            handle: derive_handle(name),
            avatar_url: "https://picsum.photos/200/200".to_string(),
        }
    }
}

/// Derive a handle from a display name: lowercased, whitespace stripped,
/// `@`-prefixed.
pub fn derive_handle(name: &str) -> String {
    let compact: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect();
    format!("@{}", compact)
}

/// An open, time-bounded proposal for an activity. Joinable until it
/// expires; otherwise immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invite {
    pub id: String,
    pub creator: User,
    pub activity: String,
    pub emoji: String,
    pub caption: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Milliseconds since epoch. `expires_at` is strictly later than
    /// `created_at`.
    pub created_at: i64,
    pub expires_at: i64,
    /// User ids, duplicate-free, in join order.
    pub attendees: Vec<String>,
}

impl Invite {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at <= now_ms
    }

    pub fn has_attendee(&self, user_id: &str) -> bool {
        self.attendees.iter().any(|id| id == user_id)
    }

    /// Milliseconds until expiry, clamped to zero.
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        (self.expires_at - now_ms).max(0)
    }
}

/// Result of a join attempt. Joining never fails: unknown or expired
/// ids are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyIn,
    NotFound,
}

/// Generate an invite id: millisecond timestamp plus a short random
/// suffix, so two arrivals in the same millisecond cannot collide.
pub fn invite_id(now_ms: i64) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", now_ms, &suffix[..8])
}
