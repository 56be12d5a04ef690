use crate::config::CONFIG;
use crate::models::{ExpenseCategory, GroupSnapshot};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MemberBalance {
    pub user_id: Uuid,
    pub name: String,
    pub balance: Decimal,
    pub total_paid: Decimal,
    pub total_owed: Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupStatistics {
    pub total_expenses: Decimal,
    pub total_transactions: usize,
    pub average_expense_per_member: Decimal,
    pub expenses_by_category: BTreeMap<ExpenseCategory, Decimal>,
    pub member_balances: HashMap<Uuid, MemberBalance>,
}

/// An expense whose splits do not add up to its amount.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SplitMismatch {
    pub expense_id: Uuid,
    pub amount: Decimal,
    pub split_total: Decimal,
}

/// One payment that moves two balances towards zero.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transfer {
    pub from: Uuid,
    pub to: Uuid,
    pub amount: Decimal,
}

/// Stateless balance engine over a [`GroupSnapshot`].
///
/// Every figure is recomputed from the snapshot on each call. Soft-deleted
/// expenses are ignored everywhere. Nothing here can fail: malformed splits
/// produce skewed balances, which [`BalanceCalculator::audit_splits`] reports,
/// and sums saturate at `Decimal::MAX` instead of overflowing.
#[derive(Clone, Copy, Debug)]
pub struct BalanceCalculator {
    tolerance: Decimal,
}

impl Default for BalanceCalculator {
    fn default() -> Self {
        Self::new(CONFIG.settlement_tolerance)
    }
}

impl BalanceCalculator {
    pub fn new(tolerance: Decimal) -> Self {
        Self {
            tolerance: tolerance.abs(),
        }
    }

    pub fn tolerance(&self) -> Decimal {
        self.tolerance
    }

    /// Net position of `user_id`: paid minus owed. Positive means the group owes them.
    pub fn compute_balance(&self, snapshot: &GroupSnapshot, user_id: Uuid) -> Decimal {
        let (paid, owed) = Self::paid_and_owed(snapshot, user_id);
        paid.saturating_sub(owed)
    }

    pub fn member_summary(&self, snapshot: &GroupSnapshot, user_id: Uuid) -> MemberBalance {
        let (total_paid, total_owed) = Self::paid_and_owed(snapshot, user_id);
        let name = snapshot
            .members
            .iter()
            .find(|m| m.user_id == user_id)
            .map(|m| m.name.clone())
            .unwrap_or_default();
        MemberBalance {
            user_id,
            name,
            balance: total_paid.saturating_sub(total_owed),
            total_paid,
            total_owed,
        }
    }

    pub fn compute_statistics(&self, snapshot: &GroupSnapshot) -> GroupStatistics {
        debug!("Calculating statistics for group {}", snapshot.group_id);

        let total_expenses = snapshot
            .live_expenses()
            .fold(Decimal::ZERO, |acc, e| acc.saturating_add(e.amount));
        let total_transactions = snapshot.live_expenses().count();

        let active_count = snapshot.active_members().count();
        let average_expense_per_member = if active_count > 0 {
            total_expenses / Decimal::from(active_count)
        } else {
            Decimal::ZERO
        };

        let mut expenses_by_category: BTreeMap<ExpenseCategory, Decimal> = BTreeMap::new();
        for expense in snapshot.live_expenses() {
            if let Some(category) = expense.category {
                let total = expenses_by_category.entry(category).or_insert(Decimal::ZERO);
                *total = total.saturating_add(expense.amount);
            }
        }

        let member_balances: HashMap<Uuid, MemberBalance> = snapshot
            .active_members()
            .map(|m| (m.user_id, self.member_summary(snapshot, m.user_id)))
            .collect();

        GroupStatistics {
            total_expenses,
            total_transactions,
            average_expense_per_member,
            expenses_by_category,
            member_balances,
        }
    }

    /// True when any active member's balance is further than the tolerance from zero.
    pub fn has_unsettled_balances(&self, snapshot: &GroupSnapshot) -> bool {
        snapshot.active_members().any(|m| {
            let balance = self.compute_balance(snapshot, m.user_id);
            self.is_unsettled(balance)
        })
    }

    pub fn is_unsettled(&self, balance: Decimal) -> bool {
        balance.abs() > self.tolerance
    }

    pub fn audit_splits(&self, snapshot: &GroupSnapshot) -> Vec<SplitMismatch> {
        snapshot
            .live_expenses()
            .filter_map(|e| {
                let split_total = e.split_total();
                if split_total.saturating_sub(e.amount).abs() > self.tolerance {
                    Some(SplitMismatch {
                        expense_id: e.id,
                        amount: e.amount,
                        split_total,
                    })
                } else {
                    None
                }
            })
            .collect()
    }

    /// Greedy debtor/creditor matching over active members' balances.
    ///
    /// Largest debts are paid to the largest creditors first; ties are broken
    /// by user id so the plan is stable across calls. A settled group gets an
    /// empty plan; otherwise every non-zero balance is included, so following
    /// the plan leaves all balances at zero when they sum to zero.
    pub fn suggest_transfers(&self, snapshot: &GroupSnapshot) -> Vec<Transfer> {
        if !self.has_unsettled_balances(snapshot) {
            return Vec::new();
        }
        let balances: Vec<(Uuid, Decimal)> = snapshot
            .active_members()
            .map(|m| (m.user_id, self.compute_balance(snapshot, m.user_id)))
            .collect();
        debug!("Simplifying debts with balances: {:?}", balances);

        let mut creditors: Vec<(Uuid, Decimal)> = balances
            .iter()
            .filter(|(_, bal)| bal.is_sign_positive() && !bal.is_zero())
            .copied()
            .collect();
        let mut debtors: Vec<(Uuid, Decimal)> = balances
            .iter()
            .filter(|(_, bal)| bal.is_sign_negative() && !bal.is_zero())
            .map(|&(user, bal)| (user, -bal))
            .collect();

        creditors.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        debtors.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut transfers = Vec::new();
        let (mut i, mut j) = (0, 0);

        while i < debtors.len() && j < creditors.len() {
            let settled = debtors[i].1.min(creditors[j].1);
            if !settled.is_zero() {
                transfers.push(Transfer {
                    from: debtors[i].0,
                    to: creditors[j].0,
                    amount: settled,
                });
            }

            debtors[i].1 -= settled;
            creditors[j].1 -= settled;

            if debtors[i].1.is_zero() {
                i += 1;
            }
            if creditors[j].1.is_zero() {
                j += 1;
            }
        }

        debug!("Simplified debts: {:?}", transfers);
        transfers
    }

    fn paid_and_owed(snapshot: &GroupSnapshot, user_id: Uuid) -> (Decimal, Decimal) {
        snapshot
            .live_expenses()
            .fold((Decimal::ZERO, Decimal::ZERO), |(paid, owed), e| {
                let paid = if e.paid_by == user_id {
                    paid.saturating_add(e.amount)
                } else {
                    paid
                };
                (paid, owed.saturating_add(e.owed_by(user_id)))
            })
    }
}
