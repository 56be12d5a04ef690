use uuid::Uuid;

use crate::error::SplitLedgerError;
use crate::models::*;

pub trait Storage {
    fn create_group(&mut self, group: Group) -> Result<Group, SplitLedgerError>;
    fn update_group(&mut self, group: Group) -> Result<Group, SplitLedgerError>;
    fn delete_group(&mut self, group_id: Uuid) -> Result<(), SplitLedgerError>;
    fn get_group(&self, group_id: Uuid) -> Option<Group>;
    fn find_group_by_invite_code(&self, invite_code: &str) -> Option<Group>;
    fn list_groups(&self) -> Vec<Group>;

    fn upsert_member(&mut self, group_id: Uuid, member: Member) -> Result<(), SplitLedgerError>;

    fn create_expense(&mut self, expense: Expense) -> Result<Expense, SplitLedgerError>;
    fn update_expense(&mut self, expense: Expense) -> Result<Expense, SplitLedgerError>;
    fn get_expense(&self, expense_id: Uuid) -> Option<Expense>;
    fn list_expenses(&self, group_id: Uuid) -> Vec<Expense>;

    /// Group with its members and every expense (deleted ones included).
    fn load_snapshot(&self, group_id: Uuid) -> Option<GroupSnapshot> {
        self.get_group(group_id)
            .map(|group| GroupSnapshot::new(&group, self.list_expenses(group_id)))
    }

    /// Groups where `user_id` is an active member, most recently updated first.
    fn list_groups_for_user(&self, user_id: Uuid) -> Vec<Group> {
        let mut groups: Vec<Group> = self
            .list_groups()
            .into_iter()
            .filter(|g| g.is_active_member(user_id))
            .collect();
        groups.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        groups
    }

    fn is_active_member(&self, group_id: Uuid, user_id: Uuid) -> bool {
        self.get_group(group_id)
            .is_some_and(|g| g.is_active_member(user_id))
    }

    fn is_admin(&self, group_id: Uuid, user_id: Uuid) -> bool {
        self.get_group(group_id).is_some_and(|g| g.is_admin(user_id))
    }

    fn active_admin_count(&self, group_id: Uuid) -> usize {
        self.get_group(group_id)
            .map(|g| g.active_admin_count())
            .unwrap_or(0)
    }
}

pub mod in_memory;
