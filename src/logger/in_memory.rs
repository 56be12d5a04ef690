use crate::logger::AuditLogger;
use crate::models::{ActivityAction, ActivityLog};
use log::debug;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryAuditLogger {
    logs: Vec<ActivityLog>,
}

impl InMemoryAuditLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_logs(&self) -> &[ActivityLog] {
        &self.logs
    }

    pub fn logs_for_group(&self, group_id: Uuid) -> Vec<&ActivityLog> {
        self.logs
            .iter()
            .filter(|entry| entry.group_id == Some(group_id))
            .collect()
    }

    pub fn last_action(&self) -> Option<ActivityAction> {
        self.logs.last().map(|entry| entry.action)
    }
}

impl AuditLogger for InMemoryAuditLogger {
    fn log(&mut self, entry: ActivityLog) {
        debug!(
            "Activity {:?} by {} on {:?} {}",
            entry.action, entry.user_id, entry.entity_type, entry.entity_id
        );
        self.logs.push(entry);
    }
}
