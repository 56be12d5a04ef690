use super::expense::Expense;
use super::group::Group;
use super::member::Member;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Read-only view of a group and its expenses, taken at request time.
///
/// Balance computations depend only on this value, never on storage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub group_id: Uuid,
    pub currency: String,
    pub members: Vec<Member>,
    pub expenses: Vec<Expense>,
}

impl GroupSnapshot {
    pub fn new(group: &Group, expenses: Vec<Expense>) -> Self {
        GroupSnapshot {
            group_id: group.id,
            currency: group.currency.clone(),
            members: group.members.clone(),
            expenses,
        }
    }

    pub fn active_members(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.is_active)
    }

    /// Expenses that count towards balances and statistics.
    pub fn live_expenses(&self) -> impl Iterator<Item = &Expense> {
        self.expenses.iter().filter(|e| !e.is_deleted)
    }
}
