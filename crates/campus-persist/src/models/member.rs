use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    #[default]
    Member,
    Expert,
    Moderator,
}

/// A user's participation record within a thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadMember {
    /// Same as the user id
    pub id: String,
    pub username: String,
    pub joined_at: DateTime<Utc>,
    pub role: MemberRole,
    pub level: u32,
}

impl ThreadMember {
    pub fn for_user(user: &User, role: MemberRole, joined_at: DateTime<Utc>) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            joined_at,
            role,
            level: user.level.max(1),
        }
    }
}

/// Entry of the user table that memberships are checked against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub level: u32,
}
