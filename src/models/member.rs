use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")] // Ensures JSON uses "ADMIN" / "MEMBER"
pub enum GroupRole {
    Admin,
    Member,
}

impl std::fmt::Display for GroupRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GroupRole::Admin => "ADMIN",
            GroupRole::Member => "MEMBER",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Member {
    pub user_id: Uuid,
    pub name: String,
    pub role: GroupRole,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
}

impl Member {
    pub fn new(user_id: Uuid, name: String, role: GroupRole, joined_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            name,
            role,
            is_active: true,
            joined_at,
            left_at: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == GroupRole::Admin
    }

    /// Soft-remove: the record stays so historical splits still resolve a name.
    pub fn deactivate(&mut self, at: DateTime<Utc>) {
        self.is_active = false;
        self.left_at = Some(at);
    }

    pub fn reactivate(&mut self, at: DateTime<Utc>) {
        self.is_active = true;
        self.joined_at = at;
        self.left_at = None;
    }
}
