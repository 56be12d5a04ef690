pub mod balance;
pub mod config;
pub mod constants;
pub mod error;
pub mod logger;
pub mod models;
pub mod service;
pub mod storage;

pub use balance::{BalanceCalculator, GroupStatistics, MemberBalance, Transfer};
pub use error::SplitLedgerError;
pub use logger::in_memory::InMemoryAuditLogger;
pub use models::{GroupSnapshot, Page, PageRequest};
pub use service::{GroupDetail, GroupService, GroupSummary, NewExpense, SplitMode};
pub use storage::in_memory::InMemoryStorage;

#[cfg(test)]
mod tests; // Include integration tests
