use rust_decimal::Decimal;

/// Balances within this distance of zero count as settled (0.01).
pub const DEFAULT_SETTLEMENT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

pub const DEFAULT_CURRENCY: &str = "VND";

pub const INVITE_CODE_LENGTH: usize = 8;
pub const INVITE_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const MAX_INVITE_CODE_ATTEMPTS: usize = 32;

pub const MAX_GROUP_NAME_LENGTH: usize = 100;

/// Upper bound for an expense or a single share (1,000,000,000,000).
/// Keeps every per-group sum far below `Decimal::MAX`.
pub const MAX_EXPENSE_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// Currencies without minor units.
const ZERO_DECIMAL_CURRENCIES: &[&str] = &["VND", "JPY", "KRW", "IDR", "CLP"];

/// Number of decimal places an amount in `currency` is rounded to.
pub fn currency_scale(currency: &str) -> u32 {
    if ZERO_DECIMAL_CURRENCIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(currency))
    {
        0
    } else {
        2
    }
}
