use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Split {
    pub user_id: Uuid,
    pub amount: Decimal,
    pub percentage: Option<Decimal>,
    // Carried for callers; balance math does not read it.
    pub is_settled: bool,
}

impl Split {
    pub fn new(user_id: Uuid, amount: Decimal) -> Self {
        Split {
            user_id,
            amount,
            percentage: None,
            is_settled: false,
        }
    }
}
