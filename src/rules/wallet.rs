use std::collections::HashSet;

use crate::models::CharacterCurrency;

use super::RuleError;

/// Currency names are compared case-insensitively after trimming
pub fn normalize_currency(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Normalized currency name, rejecting names that are blank once trimmed
pub fn currency_name(name: &str) -> Result<String, RuleError> {
    let normalized = normalize_currency(name);
    if normalized.is_empty() {
        return Err(RuleError::InvalidCurrency(name.to_string()));
    }
    Ok(normalized)
}

pub fn check_balances(balances: &[CharacterCurrency]) -> Result<(), RuleError> {
    let mut seen = HashSet::new();
    for balance in balances {
        if !seen.insert(currency_name(&balance.currency)?) {
            return Err(RuleError::DuplicateCurrency(balance.currency.clone()));
        }
        if balance.amount < 0 {
            return Err(RuleError::InsufficientFunds {
                currency: balance.currency.clone(),
                balance: 0,
                delta: balance.amount,
            });
        }
    }
    Ok(())
}

/// New balance after applying `delta`; never below zero
pub fn apply_transaction(currency: &str, balance: i64, delta: i64) -> Result<i64, RuleError> {
    match balance.checked_add(delta) {
        Some(result) if result >= 0 => Ok(result),
        _ => Err(RuleError::InsufficientFunds {
            currency: currency.to_string(),
            balance,
            delta,
        }),
    }
}
