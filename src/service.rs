use crate::balance::{BalanceCalculator, GroupStatistics, MemberBalance, Transfer};
use crate::config::CONFIG;
use crate::constants::{
    INVITE_CODE_CHARSET, MAX_EXPENSE_AMOUNT, MAX_GROUP_NAME_LENGTH, MAX_INVITE_CODE_ATTEMPTS,
    currency_scale,
};
use crate::error::{FieldError, SplitLedgerError};
use crate::logger::AuditLogger;
use crate::models::*;
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

/// How an expense amount is divided between members.
#[derive(Clone, Debug)]
pub enum SplitMode {
    /// Divide evenly at the group currency's precision; the rounding
    /// remainder goes to the first participant.
    Equal(Vec<Uuid>),
    /// Caller-supplied amounts; must add up to the expense amount.
    Exact(Vec<Split>),
}

#[derive(Clone, Debug)]
pub struct NewExpense {
    pub amount: Decimal,
    pub description: String,
    pub note: Option<String>,
    pub category: Option<ExpenseCategory>,
    pub paid_by: Uuid,
    pub expense_date: Option<DateTime<Utc>>,
    pub split: SplitMode,
}

/// A group as seen by one of its members.
#[derive(Clone, Debug, Serialize)]
pub struct GroupDetail {
    /// The invite code is blank unless the requester is an admin.
    pub group: Group,
    pub is_admin: bool,
    pub user_balance: Decimal,
    /// One entry per member record, former members included, in join order.
    pub member_balances: Vec<MemberBalance>,
    pub statistics: GroupStatistics,
}

/// One row of a user's group list.
#[derive(Clone, Debug, Serialize)]
pub struct GroupSummary {
    pub group_id: Uuid,
    pub name: String,
    pub currency: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub member_count: usize,
    pub user_balance: Decimal,
    pub updated_at: DateTime<Utc>,
}

pub struct GroupService<'a> {
    pub storage: &'a mut dyn Storage,
    pub audit_logger: &'a mut dyn AuditLogger,
    calculator: BalanceCalculator,
}

impl<'a> GroupService<'a> {
    pub fn new(storage: &'a mut dyn Storage, audit_logger: &'a mut dyn AuditLogger) -> Self {
        Self::with_calculator(storage, audit_logger, BalanceCalculator::default())
    }

    pub fn with_calculator(
        storage: &'a mut dyn Storage,
        audit_logger: &'a mut dyn AuditLogger,
        calculator: BalanceCalculator,
    ) -> Self {
        info!(
            "Initializing GroupService (settlement tolerance {})",
            calculator.tolerance()
        );
        Self {
            storage,
            audit_logger,
            calculator,
        }
    }

    pub fn calculator(&self) -> &BalanceCalculator {
        &self.calculator
    }

    // GROUP MANAGEMENT

    pub fn create_group(
        &mut self,
        creator_id: Uuid,
        creator_name: String,
        name: String,
        description: Option<String>,
        currency: Option<String>,
    ) -> Result<Group, SplitLedgerError> {
        info!("Creating group '{}' for user {}", name, creator_id);
        Self::validate_string_input("name", &name, MAX_GROUP_NAME_LENGTH)?;

        let now = Utc::now();
        let currency = currency
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| CONFIG.default_currency.clone());

        let group = Group {
            id: Uuid::new_v4(),
            name,
            description,
            currency,
            invite_code: Self::unique_invite_code(&*self.storage, CONFIG.invite_code_length)?,
            is_active: true,
            created_by: creator_id,
            created_at: now,
            updated_at: now,
            members: vec![Member::new(creator_id, creator_name, GroupRole::Admin, now)],
        };

        let created = self.storage.create_group(group)?;
        debug!("Group created with ID: {}", created.id);

        self.audit(
            creator_id,
            created.id,
            ActivityAction::CreateGroup,
            (EntityType::Group, created.id),
            serde_json::json!({ "name": created.name, "currency": created.currency }),
        );

        Ok(created)
    }

    pub fn get_group(&self, group_id: Uuid, requester: Uuid) -> Result<GroupDetail, SplitLedgerError> {
        let mut group = self.load_group(group_id)?;
        Self::require_member(&group, requester)?;

        let snapshot = GroupSnapshot::new(&group, self.storage.list_expenses(group_id));
        let is_admin = group.is_admin(requester);
        let member_balances = group
            .members
            .iter()
            .map(|m| self.calculator.member_summary(&snapshot, m.user_id))
            .collect();
        if !is_admin {
            group.invite_code.clear();
        }

        Ok(GroupDetail {
            is_admin,
            user_balance: self.calculator.compute_balance(&snapshot, requester),
            member_balances,
            statistics: self.calculator.compute_statistics(&snapshot),
            group,
        })
    }

    /// Groups the user actively belongs to, most recently updated first.
    pub fn list_user_groups(
        &self,
        user_id: Uuid,
        request: PageRequest,
    ) -> Result<Page<GroupSummary>, SplitLedgerError> {
        if !request.is_valid() {
            return Err(Self::field_error(
                "page",
                "page must be at least 1 and page_size within bounds",
            ));
        }
        let groups = self.storage.list_groups_for_user(user_id);
        debug!("User {} belongs to {} groups", user_id, groups.len());

        // Balances are only computed for the rows on the requested page.
        let page = Page::slice(groups, request).map(|group| {
            let snapshot = GroupSnapshot::new(&group, self.storage.list_expenses(group.id));
            GroupSummary {
                group_id: group.id,
                is_admin: group.is_admin(user_id),
                member_count: group.active_members().count(),
                user_balance: self.calculator.compute_balance(&snapshot, user_id),
                name: group.name,
                currency: group.currency,
                is_active: group.is_active,
                updated_at: group.updated_at,
            }
        });
        Ok(page)
    }

    pub fn update_group(
        &mut self,
        group_id: Uuid,
        requester: Uuid,
        new_name: Option<String>,
        new_description: Option<String>,
        new_currency: Option<String>,
    ) -> Result<Group, SplitLedgerError> {
        info!("Updating group {} by user {}", group_id, requester);
        let mut group = self.load_group(group_id)?;
        Self::require_admin(&group, requester, "update the group")?;

        if let Some(name) = new_name {
            Self::validate_string_input("name", &name, MAX_GROUP_NAME_LENGTH)?;
            group.name = name;
        }
        if let Some(description) = new_description {
            group.description = Some(description).filter(|d| !d.trim().is_empty());
        }
        if let Some(currency) = new_currency {
            let currency = currency.trim().to_uppercase();
            if currency.is_empty() {
                return Err(Self::field_error("currency", "Currency cannot be empty"));
            }
            group.currency = currency;
        }
        group.updated_at = Utc::now();

        let updated = self.storage.update_group(group)?;
        self.audit(
            requester,
            group_id,
            ActivityAction::UpdateGroup,
            (EntityType::Group, group_id),
            serde_json::json!({ "name": updated.name, "currency": updated.currency }),
        );
        Ok(updated)
    }

    pub fn archive_group(&mut self, group_id: Uuid, requester: Uuid) -> Result<Group, SplitLedgerError> {
        self.set_group_active(group_id, requester, false)
    }

    pub fn unarchive_group(&mut self, group_id: Uuid, requester: Uuid) -> Result<Group, SplitLedgerError> {
        self.set_group_active(group_id, requester, true)
    }

    /// Permanently remove the group. Refused while any active member has an
    /// unsettled balance.
    pub fn delete_group(&mut self, group_id: Uuid, requester: Uuid) -> Result<(), SplitLedgerError> {
        info!("User {} attempting to delete group {}", requester, group_id);
        let group = self.load_group(group_id)?;
        Self::require_admin(&group, requester, "delete the group")?;

        let snapshot = self.load_snapshot(group_id)?;
        if self.calculator.has_unsettled_balances(&snapshot) {
            warn!("Refusing to delete group {} with unsettled balances", group_id);
            return Err(SplitLedgerError::GroupHasDebt(group_id));
        }

        self.storage.delete_group(group_id)?;
        self.audit(
            requester,
            group_id,
            ActivityAction::DeleteGroup,
            (EntityType::Group, group_id),
            serde_json::json!({ "name": group.name }),
        );
        debug!("Group {} deleted", group_id);
        Ok(())
    }

    pub fn regenerate_invite_code(
        &mut self,
        group_id: Uuid,
        requester: Uuid,
    ) -> Result<String, SplitLedgerError> {
        let mut group = self.load_group(group_id)?;
        Self::require_admin(&group, requester, "generate an invite code")?;

        group.invite_code = Self::unique_invite_code(&*self.storage, CONFIG.invite_code_length)?;
        group.updated_at = Utc::now();
        let updated = self.storage.update_group(group)?;

        self.audit(
            requester,
            group_id,
            ActivityAction::RegenerateInviteCode,
            (EntityType::Group, group_id),
            serde_json::json!({}),
        );
        Ok(updated.invite_code)
    }

    // MEMBERSHIP

    pub fn add_member(
        &mut self,
        group_id: Uuid,
        requester: Uuid,
        user_id: Uuid,
        name: String,
    ) -> Result<Member, SplitLedgerError> {
        info!(
            "User {} adding user {} to group {}",
            requester, user_id, group_id
        );
        let group = self.load_group(group_id)?;
        Self::require_admin(&group, requester, "add members")?;

        let member = self.admit(&group, user_id, name)?;
        self.audit(
            requester,
            group_id,
            ActivityAction::AddMember,
            (EntityType::Member, user_id),
            serde_json::json!({ "user_id": user_id }),
        );
        Ok(member)
    }

    pub fn join_group(
        &mut self,
        user_id: Uuid,
        name: String,
        invite_code: &str,
    ) -> Result<Group, SplitLedgerError> {
        info!("User {} attempting to join group via invite code", user_id);
        let group = self
            .storage
            .find_group_by_invite_code(invite_code.trim())
            .ok_or_else(|| {
                warn!("Invalid invite code: {}", invite_code);
                SplitLedgerError::InvalidInviteCode
            })?;
        if !group.is_active {
            return Err(SplitLedgerError::GroupArchived(group.id));
        }

        self.admit(&group, user_id, name)?;
        self.audit(
            user_id,
            group.id,
            ActivityAction::JoinGroup,
            (EntityType::Group, group.id),
            serde_json::json!({ "user_id": user_id }),
        );

        debug!("User {} joined group {}", user_id, group.id);
        self.load_group(group.id)
    }

    /// Leave voluntarily. The last active admin cannot leave, and nobody can
    /// leave while owing or being owed money.
    pub fn leave_group(&mut self, group_id: Uuid, user_id: Uuid) -> Result<(), SplitLedgerError> {
        info!("User {} leaving group {}", user_id, group_id);
        let group = self.load_group(group_id)?;
        let mut member = group
            .member(user_id)
            .filter(|m| m.is_active)
            .cloned()
            .ok_or(SplitLedgerError::NotGroupMember(user_id))?;

        if member.is_admin() && group.active_admin_count() <= 1 {
            warn!("Last admin {} attempted to leave group {}", user_id, group_id);
            return Err(SplitLedgerError::CannotLeaveAsAdmin);
        }
        self.ensure_settled(group_id, user_id)?;

        member.deactivate(Utc::now());
        self.storage.upsert_member(group_id, member)?;
        self.audit(
            user_id,
            group_id,
            ActivityAction::LeaveGroup,
            (EntityType::Group, group_id),
            serde_json::json!({ "user_id": user_id }),
        );
        Ok(())
    }

    pub fn remove_member(
        &mut self,
        group_id: Uuid,
        requester: Uuid,
        member_id: Uuid,
    ) -> Result<(), SplitLedgerError> {
        info!(
            "User {} attempting to remove user {} from group {}",
            requester, member_id, group_id
        );
        let group = self.load_group(group_id)?;
        Self::require_admin(&group, requester, "remove members")?;
        if requester == member_id {
            return Err(SplitLedgerError::CannotRemoveSelf);
        }

        let mut member = group
            .member(member_id)
            .filter(|m| m.is_active)
            .cloned()
            .ok_or(SplitLedgerError::MemberNotFound(member_id))?;
        self.ensure_settled(group_id, member_id)?;

        member.deactivate(Utc::now());
        self.storage.upsert_member(group_id, member)?;
        self.audit(
            requester,
            group_id,
            ActivityAction::RemoveMember,
            (EntityType::Member, member_id),
            serde_json::json!({ "user_id": member_id }),
        );
        Ok(())
    }

    pub fn update_member_role(
        &mut self,
        group_id: Uuid,
        requester: Uuid,
        member_id: Uuid,
        role: GroupRole,
    ) -> Result<Member, SplitLedgerError> {
        let group = self.load_group(group_id)?;
        Self::require_admin(&group, requester, "change member roles")?;

        let mut member = group
            .member(member_id)
            .filter(|m| m.is_active)
            .cloned()
            .ok_or(SplitLedgerError::MemberNotFound(member_id))?;
        member.role = role;
        self.storage.upsert_member(group_id, member.clone())?;

        self.audit(
            requester,
            group_id,
            ActivityAction::UpdateMemberRole,
            (EntityType::Member, member_id),
            serde_json::json!({ "user_id": member_id, "role": role.to_string() }),
        );
        Ok(member)
    }

    // EXPENSES

    pub fn add_expense(
        &mut self,
        group_id: Uuid,
        requester: Uuid,
        new_expense: NewExpense,
    ) -> Result<Expense, SplitLedgerError> {
        info!(
            "Adding expense in group {} by user {} for amount {}",
            group_id, requester, new_expense.amount
        );
        let group = self.load_group(group_id)?;
        let created = self.insert_expense(&group, requester, new_expense)?;
        self.audit(
            requester,
            group_id,
            ActivityAction::AddExpense,
            (EntityType::Expense, created.id),
            serde_json::json!({ "amount": created.amount, "paid_by": created.paid_by }),
        );
        Ok(created)
    }

    /// Validate and store an expense without writing an activity entry.
    fn insert_expense(
        &mut self,
        group: &Group,
        requester: Uuid,
        new_expense: NewExpense,
    ) -> Result<Expense, SplitLedgerError> {
        let group_id = group.id;
        Self::require_member(group, requester)?;
        if !group.is_active {
            return Err(SplitLedgerError::GroupArchived(group_id));
        }
        Self::validate_string_input("description", &new_expense.description, 255)?;

        let scale = currency_scale(&group.currency);
        Self::validate_amount(new_expense.amount, scale)?;
        if !group.is_active_member(new_expense.paid_by) {
            warn!("Payer {} not in group {}", new_expense.paid_by, group_id);
            return Err(SplitLedgerError::NotGroupMember(new_expense.paid_by));
        }

        let splits = match new_expense.split {
            SplitMode::Equal(users) => Self::equal_splits(new_expense.amount, &users, scale)?,
            SplitMode::Exact(splits) => self.exact_splits(new_expense.amount, splits)?,
        };
        for split in &splits {
            if !group.is_active_member(split.user_id) {
                warn!("User {} in splits not in group {}", split.user_id, group_id);
                return Err(SplitLedgerError::NotGroupMember(split.user_id));
            }
        }

        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4(),
            group_id,
            amount: new_expense.amount,
            currency: group.currency.clone(),
            description: new_expense.description,
            note: new_expense.note,
            category: new_expense.category,
            paid_by: new_expense.paid_by,
            created_by: requester,
            expense_date: new_expense.expense_date.unwrap_or(now),
            is_deleted: false,
            splits,
            created_at: now,
            updated_at: now,
        };

        let created = self.storage.create_expense(expense)?;
        debug!("Expense created with ID: {}", created.id);
        Ok(created)
    }

    /// Soft delete; the expense stops counting towards balances.
    pub fn delete_expense(
        &mut self,
        group_id: Uuid,
        requester: Uuid,
        expense_id: Uuid,
    ) -> Result<Expense, SplitLedgerError> {
        info!(
            "Soft deleting expense {} in group {} by user {}",
            expense_id, group_id, requester
        );
        let group = self.load_group(group_id)?;
        Self::require_member(&group, requester)?;

        let expense = self
            .storage
            .get_expense(expense_id)
            .filter(|e| e.group_id == group_id)
            .ok_or(SplitLedgerError::ExpenseNotFound(expense_id))?;
        if expense.is_deleted {
            warn!("Expense {} already deleted", expense_id);
            return Err(SplitLedgerError::ExpenseAlreadyDeleted(expense_id));
        }
        let permitted =
            expense.paid_by == requester || expense.created_by == requester || group.is_admin(requester);
        if !permitted {
            warn!(
                "User {} not permitted to delete expense {}",
                requester, expense_id
            );
            return Err(SplitLedgerError::NotAuthorized(
                requester,
                "delete this expense".to_string(),
            ));
        }

        let now = Utc::now();
        let deleted = Expense {
            is_deleted: true,
            updated_at: now,
            ..expense
        };
        let saved = self.storage.update_expense(deleted)?;
        self.audit(
            requester,
            group_id,
            ActivityAction::DeleteExpense,
            (EntityType::Expense, expense_id),
            serde_json::json!({ "amount": saved.amount }),
        );
        Ok(saved)
    }

    /// Record that `from` paid `to` back. Stored as an offsetting expense so
    /// the ordinary balance math picks it up. Only the two parties or an
    /// admin may record it.
    pub fn record_settlement(
        &mut self,
        group_id: Uuid,
        requester: Uuid,
        from: Uuid,
        to: Uuid,
        amount: Decimal,
    ) -> Result<Expense, SplitLedgerError> {
        info!(
            "User {} recording settlement of {} from {} to {} in group {}",
            requester, amount, from, to, group_id
        );
        if from == to {
            return Err(SplitLedgerError::SelfSettlement);
        }
        let group = self.load_group(group_id)?;
        Self::require_member(&group, requester)?;
        if requester != from && requester != to && !group.is_admin(requester) {
            warn!(
                "User {} not permitted to record a settlement between {} and {}",
                requester, from, to
            );
            return Err(SplitLedgerError::NotAuthorized(
                requester,
                "record this settlement".to_string(),
            ));
        }

        let mut split = Split::new(to, amount);
        split.is_settled = true;

        let expense = self.insert_expense(
            &group,
            requester,
            NewExpense {
                amount,
                description: "Settlement".to_string(),
                note: None,
                category: None,
                paid_by: from,
                expense_date: None,
                split: SplitMode::Exact(vec![split]),
            },
        )?;
        self.audit(
            requester,
            group_id,
            ActivityAction::RecordSettlement,
            (EntityType::Expense, expense.id),
            serde_json::json!({ "from": from, "to": to, "amount": amount }),
        );
        Ok(expense)
    }

    // BALANCES

    pub fn get_user_balance(
        &self,
        group_id: Uuid,
        requester: Uuid,
        user_id: Uuid,
    ) -> Result<Decimal, SplitLedgerError> {
        let snapshot = self.member_snapshot(group_id, requester)?;
        Ok(self.calculator.compute_balance(&snapshot, user_id))
    }

    pub fn get_group_statistics(
        &self,
        group_id: Uuid,
        requester: Uuid,
    ) -> Result<GroupStatistics, SplitLedgerError> {
        let snapshot = self.member_snapshot(group_id, requester)?;
        for mismatch in self.calculator.audit_splits(&snapshot) {
            warn!(
                "Expense {} in group {} has splits totalling {} against amount {}",
                mismatch.expense_id, group_id, mismatch.split_total, mismatch.amount
            );
        }
        Ok(self.calculator.compute_statistics(&snapshot))
    }

    pub fn suggest_settlements(
        &self,
        group_id: Uuid,
        requester: Uuid,
    ) -> Result<Vec<Transfer>, SplitLedgerError> {
        let snapshot = self.member_snapshot(group_id, requester)?;
        Ok(self.calculator.suggest_transfers(&snapshot))
    }

    pub fn has_unsettled_balances(&self, group_id: Uuid) -> Result<bool, SplitLedgerError> {
        let snapshot = self.load_snapshot(group_id)?;
        Ok(self.calculator.has_unsettled_balances(&snapshot))
    }

    // HELPERS

    fn load_group(&self, group_id: Uuid) -> Result<Group, SplitLedgerError> {
        self.storage
            .get_group(group_id)
            .ok_or(SplitLedgerError::GroupNotFound(group_id))
    }

    fn load_snapshot(&self, group_id: Uuid) -> Result<GroupSnapshot, SplitLedgerError> {
        self.storage
            .load_snapshot(group_id)
            .ok_or(SplitLedgerError::GroupNotFound(group_id))
    }

    fn member_snapshot(&self, group_id: Uuid, requester: Uuid) -> Result<GroupSnapshot, SplitLedgerError> {
        let snapshot = self.load_snapshot(group_id)?;
        if !snapshot.active_members().any(|m| m.user_id == requester) {
            return Err(SplitLedgerError::NotGroupMember(requester));
        }
        Ok(snapshot)
    }

    fn require_member(group: &Group, user_id: Uuid) -> Result<(), SplitLedgerError> {
        if group.is_active_member(user_id) {
            Ok(())
        } else {
            Err(SplitLedgerError::NotGroupMember(user_id))
        }
    }

    fn require_admin(group: &Group, user_id: Uuid, action: &str) -> Result<(), SplitLedgerError> {
        Self::require_member(group, user_id)?;
        if !group.is_admin(user_id) {
            warn!(
                "User {} attempted to {} in group {} without admin role",
                user_id, action, group.id
            );
            return Err(SplitLedgerError::NotAuthorized(user_id, action.to_string()));
        }
        Ok(())
    }

    fn ensure_settled(&self, group_id: Uuid, user_id: Uuid) -> Result<(), SplitLedgerError> {
        let snapshot = self.load_snapshot(group_id)?;
        let balance = self.calculator.compute_balance(&snapshot, user_id);
        if self.calculator.is_unsettled(balance) {
            warn!(
                "User {} has unsettled balance {} in group {}",
                user_id, balance, group_id
            );
            return Err(SplitLedgerError::MemberHasDebt {
                member: user_id,
                balance,
            });
        }
        Ok(())
    }

    /// Add a new member or reactivate a previously removed one.
    fn admit(&mut self, group: &Group, user_id: Uuid, name: String) -> Result<Member, SplitLedgerError> {
        let now = Utc::now();
        let member = match group.member(user_id) {
            Some(existing) if existing.is_active => {
                warn!("User {} already in group {}", user_id, group.id);
                return Err(SplitLedgerError::AlreadyGroupMember(user_id));
            }
            Some(existing) => {
                let mut member = existing.clone();
                member.reactivate(now);
                member.role = GroupRole::Member;
                member
            }
            None => Member::new(user_id, name, GroupRole::Member, now),
        };
        self.storage.upsert_member(group.id, member.clone())?;
        Ok(member)
    }

    fn set_group_active(
        &mut self,
        group_id: Uuid,
        requester: Uuid,
        active: bool,
    ) -> Result<Group, SplitLedgerError> {
        let mut group = self.load_group(group_id)?;
        let action = if active { "unarchive the group" } else { "archive the group" };
        Self::require_admin(&group, requester, action)?;

        group.is_active = active;
        group.updated_at = Utc::now();
        let updated = self.storage.update_group(group)?;

        let activity = if active {
            ActivityAction::UnarchiveGroup
        } else {
            ActivityAction::ArchiveGroup
        };
        self.audit(
            requester,
            group_id,
            activity,
            (EntityType::Group, group_id),
            serde_json::json!({ "is_active": active }),
        );
        Ok(updated)
    }

    fn equal_splits(amount: Decimal, users: &[Uuid], scale: u32) -> Result<Vec<Split>, SplitLedgerError> {
        if users.is_empty() {
            return Err(SplitLedgerError::InvalidSplit(
                "no participants for equal split".to_string(),
            ));
        }
        Self::ensure_unique(users.iter().copied())?;

        let count = Decimal::from(users.len());
        let share = (amount / count).round_dp_with_strategy(scale, RoundingStrategy::ToZero);
        let remainder = amount - share * count;

        Ok(users
            .iter()
            .enumerate()
            .map(|(i, &user_id)| {
                let owed = if i == 0 { share + remainder } else { share };
                Split::new(user_id, owed)
            })
            .collect())
    }

    fn exact_splits(&self, amount: Decimal, splits: Vec<Split>) -> Result<Vec<Split>, SplitLedgerError> {
        if splits.is_empty() {
            return Err(SplitLedgerError::InvalidSplit("no splits given".to_string()));
        }
        if let Some(bad) = splits.iter().find(|s| s.amount.is_sign_negative()) {
            return Err(SplitLedgerError::InvalidSplit(format!(
                "negative share {} for user {}",
                bad.amount, bad.user_id
            )));
        }
        if let Some(bad) = splits.iter().find(|s| s.amount > MAX_EXPENSE_AMOUNT) {
            return Err(SplitLedgerError::InvalidSplit(format!(
                "share {} for user {} exceeds {}",
                bad.amount, bad.user_id, MAX_EXPENSE_AMOUNT
            )));
        }
        Self::ensure_unique(splits.iter().map(|s| s.user_id))?;

        let total = splits
            .iter()
            .try_fold(Decimal::ZERO, |acc, s| acc.checked_add(s.amount))
            .ok_or_else(|| SplitLedgerError::InvalidSplit("splits sum overflows".to_string()))?;
        if (total - amount).abs() > self.calculator.tolerance() {
            warn!("Splits sum {} does not match amount {}", total, amount);
            return Err(SplitLedgerError::InvalidSplit(format!(
                "splits sum to {} but the amount is {}",
                total, amount
            )));
        }
        Ok(splits)
    }

    fn ensure_unique(users: impl Iterator<Item = Uuid>) -> Result<(), SplitLedgerError> {
        let mut seen = HashSet::new();
        for user_id in users {
            if !seen.insert(user_id) {
                return Err(SplitLedgerError::InvalidSplit(format!(
                    "user {} appears more than once",
                    user_id
                )));
            }
        }
        Ok(())
    }

    fn validate_amount(amount: Decimal, scale: u32) -> Result<(), SplitLedgerError> {
        if amount <= Decimal::ZERO {
            return Err(SplitLedgerError::InvalidAmount(
                "amount must be greater than 0".to_string(),
            ));
        }
        if amount > MAX_EXPENSE_AMOUNT {
            return Err(SplitLedgerError::InvalidAmount(format!(
                "amount cannot exceed {}",
                MAX_EXPENSE_AMOUNT
            )));
        }
        if amount.round_dp(scale) != amount {
            return Err(SplitLedgerError::InvalidAmount(format!(
                "amount cannot have more than {} decimal places",
                scale
            )));
        }
        Ok(())
    }

    fn validate_string_input(field: &str, value: &str, max_length: usize) -> Result<(), SplitLedgerError> {
        if value.trim().is_empty() {
            return Err(Self::field_error(field, &format!("{} cannot be empty", field)));
        }
        if value.chars().count() > max_length {
            return Err(Self::field_error(
                field,
                &format!("{} cannot exceed {} characters", field, max_length),
            ));
        }
        if value.chars().any(|c| c.is_control()) {
            return Err(Self::field_error(
                field,
                &format!("{} contains invalid characters", field),
            ));
        }
        Ok(())
    }

    fn field_error(field: &str, description: &str) -> SplitLedgerError {
        SplitLedgerError::InvalidInput(
            field.to_string(),
            FieldError {
                field: field.to_string(),
                title: format!("Invalid {}", field),
                description: description.to_string(),
            },
        )
    }

    fn audit(
        &mut self,
        user_id: Uuid,
        group_id: Uuid,
        action: ActivityAction,
        entity: (EntityType, Uuid),
        payload: serde_json::Value,
    ) {
        self.audit_logger.log(ActivityLog::new(
            user_id,
            Some(group_id),
            action,
            entity,
            &payload,
            Utc::now(),
        ));
    }

    /// Draw random codes until one is free, giving up after
    /// `MAX_INVITE_CODE_ATTEMPTS` collisions.
    pub(crate) fn unique_invite_code(
        storage: &dyn Storage,
        length: usize,
    ) -> Result<String, SplitLedgerError> {
        let mut rng = rand::rng();
        for _ in 0..MAX_INVITE_CODE_ATTEMPTS {
            let code: String = (0..length)
                .map(|_| INVITE_CODE_CHARSET[rng.random_range(0..INVITE_CODE_CHARSET.len())] as char)
                .collect();
            if storage.find_group_by_invite_code(&code).is_none() {
                debug!("Generated invite code: {}", code);
                return Ok(code);
            }
        }
        warn!(
            "No free invite code of length {} after {} attempts",
            length, MAX_INVITE_CODE_ATTEMPTS
        );
        Err(SplitLedgerError::StorageError(
            "could not generate a unique invite code".to_string(),
        ))
    }
}
