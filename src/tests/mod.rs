mod expense_tests;

use crate::balance::BalanceCalculator;
use crate::constants::DEFAULT_SETTLEMENT_TOLERANCE;
use crate::models::*;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

pub fn user(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

pub fn calculator() -> BalanceCalculator {
    BalanceCalculator::new(DEFAULT_SETTLEMENT_TOLERANCE)
}

pub fn member(user_id: Uuid, name: &str) -> Member {
    Member::new(user_id, name.to_string(), GroupRole::Member, Utc::now())
}

pub fn expense(
    paid_by: Uuid,
    amount: Decimal,
    splits: &[(Uuid, Decimal)],
    category: Option<ExpenseCategory>,
) -> Expense {
    let now = Utc::now();
    Expense {
        id: Uuid::new_v4(),
        group_id: GROUP_ID,
        amount,
        currency: "VND".to_string(),
        description: "test expense".to_string(),
        note: None,
        category,
        paid_by,
        created_by: paid_by,
        expense_date: now,
        is_deleted: false,
        splits: splits
            .iter()
            .map(|&(user_id, owed)| Split::new(user_id, owed))
            .collect(),
        created_at: now,
        updated_at: now,
    }
}

/// Expense whose amount divides exactly between `participants`.
pub fn equal_expense(
    paid_by: Uuid,
    amount: Decimal,
    participants: &[Uuid],
    category: Option<ExpenseCategory>,
) -> Expense {
    let share = amount / Decimal::from(participants.len());
    let splits: Vec<(Uuid, Decimal)> = participants.iter().map(|&u| (u, share)).collect();
    expense(paid_by, amount, &splits, category)
}

pub const GROUP_ID: Uuid = Uuid::from_u128(0xfeed);

pub fn snapshot(members: Vec<Member>, expenses: Vec<Expense>) -> GroupSnapshot {
    GroupSnapshot {
        group_id: GROUP_ID,
        currency: "VND".to_string(),
        members,
        expenses,
    }
}
