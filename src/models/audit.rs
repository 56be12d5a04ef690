use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ActivityAction {
    CreateGroup,
    UpdateGroup,
    ArchiveGroup,
    UnarchiveGroup,
    DeleteGroup,
    AddMember,
    JoinGroup,
    LeaveGroup,
    RemoveMember,
    UpdateMemberRole,
    RegenerateInviteCode,
    AddExpense,
    DeleteExpense,
    RecordSettlement,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum EntityType {
    Group,
    Member,
    Expense,
}

#[derive(Clone, Debug)]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub group_id: Option<Uuid>,
    pub action: ActivityAction,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    // Create activity entry with structured JSON payload
    pub fn new<T: Serialize>(
        user_id: Uuid,
        group_id: Option<Uuid>,
        action: ActivityAction,
        entity: (EntityType, Uuid),
        payload: &T,
        created_at: DateTime<Utc>,
    ) -> Self {
        ActivityLog {
            id: Uuid::new_v4(),
            user_id,
            group_id,
            action,
            entity_type: entity.0,
            entity_id: entity.1,
            payload: serde_json::to_string(payload).unwrap_or_default(),
            created_at,
        }
    }
}
