use super::split::Split;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExpenseCategory {
    Food,
    Transport,
    Accommodation,
    Entertainment,
    Shopping,
    Other,
}

impl std::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExpenseCategory::Food => "Food",
            ExpenseCategory::Transport => "Transport",
            ExpenseCategory::Accommodation => "Accommodation",
            ExpenseCategory::Entertainment => "Entertainment",
            ExpenseCategory::Shopping => "Shopping",
            ExpenseCategory::Other => "Other",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub group_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
    pub note: Option<String>,
    pub category: Option<ExpenseCategory>,
    pub paid_by: Uuid,
    pub created_by: Uuid,
    pub expense_date: DateTime<Utc>,
    pub is_deleted: bool,
    pub splits: Vec<Split>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Sums saturate so a corrupt record can skew figures but never panic.
impl Expense {
    pub fn split_total(&self) -> Decimal {
        self.splits
            .iter()
            .fold(Decimal::ZERO, |acc, s| acc.saturating_add(s.amount))
    }

    pub fn owed_by(&self, user_id: Uuid) -> Decimal {
        self.splits
            .iter()
            .filter(|s| s.user_id == user_id)
            .fold(Decimal::ZERO, |acc, s| acc.saturating_add(s.amount))
    }
}
