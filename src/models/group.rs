use super::member::{GroupRole, Member};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub currency: String,
    pub invite_code: String,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub members: Vec<Member>,
}

impl Group {
    /// Look up a member record regardless of whether it is still active.
    pub fn member(&self, user_id: Uuid) -> Option<&Member> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    pub fn member_mut(&mut self, user_id: Uuid) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.user_id == user_id)
    }

    pub fn active_members(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.is_active)
    }

    pub fn is_active_member(&self, user_id: Uuid) -> bool {
        self.member(user_id).is_some_and(|m| m.is_active)
    }

    pub fn is_admin(&self, user_id: Uuid) -> bool {
        self.member(user_id)
            .is_some_and(|m| m.is_active && m.role == GroupRole::Admin)
    }

    pub fn active_admin_count(&self) -> usize {
        self.active_members()
            .filter(|m| m.role == GroupRole::Admin)
            .count()
    }
}
