use crate::error::SplitLedgerError;
use crate::models::{Expense, Group, Member};
use crate::storage::Storage;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryStorage {
    groups: HashMap<Uuid, Group>,
    invite_codes: HashMap<String, Uuid>, // code -> group_id
    expenses: HashMap<Uuid, Expense>,
    // Insertion order per group, so snapshots list expenses as they were logged
    group_expenses: HashMap<Uuid, Vec<Uuid>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for InMemoryStorage {
    fn create_group(&mut self, group: Group) -> Result<Group, SplitLedgerError> {
        if self.groups.contains_key(&group.id) {
            return Err(SplitLedgerError::StorageError(format!(
                "Group {} already exists",
                group.id
            )));
        }
        if self.invite_codes.contains_key(&group.invite_code) {
            return Err(SplitLedgerError::StorageError(
                "Invite code already in use".to_string(),
            ));
        }
        self.invite_codes.insert(group.invite_code.clone(), group.id);
        self.groups.insert(group.id, group.clone());
        Ok(group)
    }

    fn update_group(&mut self, group: Group) -> Result<Group, SplitLedgerError> {
        let previous = self
            .groups
            .get(&group.id)
            .ok_or(SplitLedgerError::GroupNotFound(group.id))?;
        if previous.invite_code != group.invite_code {
            if self.invite_codes.contains_key(&group.invite_code) {
                return Err(SplitLedgerError::StorageError(
                    "Invite code already in use".to_string(),
                ));
            }
            self.invite_codes.remove(&previous.invite_code);
            self.invite_codes.insert(group.invite_code.clone(), group.id);
        }
        self.groups.insert(group.id, group.clone());
        Ok(group)
    }

    fn delete_group(&mut self, group_id: Uuid) -> Result<(), SplitLedgerError> {
        let group = self
            .groups
            .remove(&group_id)
            .ok_or(SplitLedgerError::GroupNotFound(group_id))?;
        self.invite_codes.remove(&group.invite_code);
        for expense_id in self.group_expenses.remove(&group_id).unwrap_or_default() {
            self.expenses.remove(&expense_id);
        }
        Ok(())
    }

    fn get_group(&self, group_id: Uuid) -> Option<Group> {
        self.groups.get(&group_id).cloned()
    }

    fn find_group_by_invite_code(&self, invite_code: &str) -> Option<Group> {
        self.invite_codes
            .get(invite_code)
            .and_then(|id| self.groups.get(id))
            .cloned()
    }

    fn list_groups(&self) -> Vec<Group> {
        self.groups.values().cloned().collect()
    }

    fn upsert_member(&mut self, group_id: Uuid, member: Member) -> Result<(), SplitLedgerError> {
        let group = self
            .groups
            .get_mut(&group_id)
            .ok_or(SplitLedgerError::GroupNotFound(group_id))?;
        match group.member_mut(member.user_id) {
            Some(existing) => *existing = member,
            None => group.members.push(member),
        }
        Ok(())
    }

    fn create_expense(&mut self, expense: Expense) -> Result<Expense, SplitLedgerError> {
        if !self.groups.contains_key(&expense.group_id) {
            return Err(SplitLedgerError::GroupNotFound(expense.group_id));
        }
        if self.expenses.contains_key(&expense.id) {
            return Err(SplitLedgerError::StorageError(format!(
                "Expense {} already exists",
                expense.id
            )));
        }
        self.group_expenses
            .entry(expense.group_id)
            .or_default()
            .push(expense.id);
        self.expenses.insert(expense.id, expense.clone());
        Ok(expense)
    }

    fn update_expense(&mut self, expense: Expense) -> Result<Expense, SplitLedgerError> {
        match self.expenses.get_mut(&expense.id) {
            Some(existing) => {
                *existing = expense.clone();
                Ok(expense)
            }
            None => Err(SplitLedgerError::ExpenseNotFound(expense.id)),
        }
    }

    fn get_expense(&self, expense_id: Uuid) -> Option<Expense> {
        self.expenses.get(&expense_id).cloned()
    }

    fn list_expenses(&self, group_id: Uuid) -> Vec<Expense> {
        self.group_expenses
            .get(&group_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.expenses.get(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}
