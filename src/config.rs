use crate::constants::{DEFAULT_CURRENCY, DEFAULT_SETTLEMENT_TOLERANCE, INVITE_CODE_LENGTH};
use dotenv::dotenv;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub settlement_tolerance: Decimal,
    pub default_currency: String,
    pub invite_code_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            settlement_tolerance: DEFAULT_SETTLEMENT_TOLERANCE,
            default_currency: DEFAULT_CURRENCY.to_string(),
            invite_code_length: INVITE_CODE_LENGTH,
        }
    }
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();
        let defaults = Self::default();

        Self {
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            settlement_tolerance: env::var("SETTLEMENT_TOLERANCE")
                .ok()
                .and_then(|v| v.parse::<Decimal>().ok())
                .filter(|t| !t.is_sign_negative())
                .unwrap_or(defaults.settlement_tolerance),
            default_currency: env::var("DEFAULT_CURRENCY")
                .map(|c| c.to_uppercase())
                .unwrap_or(defaults.default_currency),
            invite_code_length: env::var("INVITE_CODE_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|len| *len > 0)
                .unwrap_or(defaults.invite_code_length),
        }
    }
}

// Global static accessible everywhere
pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

/// Initialise `env_logger` at `CONFIG.log_level` unless `RUST_LOG` is set.
/// Safe to call more than once.
pub fn init_logging() {
    let mut builder = env_logger::Builder::new();
    match env::var("RUST_LOG") {
        Ok(filters) => builder.parse_filters(&filters),
        Err(_) => builder.parse_filters(&CONFIG.log_level),
    };
    let _ = builder.try_init();
}
