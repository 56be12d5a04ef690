use crate::models::ActivityLog;

pub trait AuditLogger {
    fn log(&mut self, entry: ActivityLog);
}

pub mod in_memory;
