use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// One currency balance in a character's wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, Validate)]
pub struct CharacterCurrency {
    #[validate(length(min = 1, max = 32))]
    pub currency: String,
    #[validate(range(min = 0))]
    pub amount: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetWalletRequest {
    #[validate(nested)]
    pub balances: Vec<CharacterCurrency>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WalletTransactionRequest {
    #[validate(length(min = 1, max = 32))]
    pub currency: String,
    pub delta: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_balance_rejected_by_schema() {
        let balance = CharacterCurrency {
            currency: "credits".to_string(),
            amount: -1,
        };
        assert!(balance.validate().is_err());
    }

    #[test]
    fn test_empty_currency_name_rejected() {
        let request = WalletTransactionRequest {
            currency: String::new(),
            delta: 10,
        };
        assert!(request.validate().is_err());
    }
}
