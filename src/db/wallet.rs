use sqlx::{PgConnection, PgExecutor, Result};
use uuid::Uuid;

use crate::models::CharacterCurrency;

pub async fn get_wallet<'e>(
    executor: impl PgExecutor<'e>,
    character_id: Uuid,
) -> Result<Vec<CharacterCurrency>> {
    sqlx::query_as::<_, CharacterCurrency>(
        "SELECT currency, amount FROM character_currencies WHERE character_id = $1 ORDER BY currency",
    )
    .bind(character_id)
    .fetch_all(executor)
    .await
}

/// Replace every balance of a character; run inside a transaction
pub async fn replace_wallet(
    conn: &mut PgConnection,
    character_id: Uuid,
    balances: &[CharacterCurrency],
) -> Result<()> {
    sqlx::query("DELETE FROM character_currencies WHERE character_id = $1")
        .bind(character_id)
        .execute(&mut *conn)
        .await?;

    for balance in balances {
        set_balance(&mut *conn, character_id, &balance.currency, balance.amount).await?;
    }
    Ok(())
}

/// Current balance, locking the row for the rest of the transaction
pub async fn get_balance_for_update<'e>(
    executor: impl PgExecutor<'e>,
    character_id: Uuid,
    currency: &str,
) -> Result<Option<i64>> {
    sqlx::query_scalar::<_, i64>(
        "SELECT amount FROM character_currencies WHERE character_id = $1 AND currency = $2 FOR UPDATE",
    )
    .bind(character_id)
    .bind(currency)
    .fetch_optional(executor)
    .await
}

pub async fn set_balance<'e>(
    executor: impl PgExecutor<'e>,
    character_id: Uuid,
    currency: &str,
    amount: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO character_currencies (character_id, currency, amount)
        VALUES ($1, $2, $3)
        ON CONFLICT (character_id, currency) DO UPDATE SET amount = EXCLUDED.amount
        "#,
    )
    .bind(character_id)
    .bind(currency)
    .bind(amount)
    .execute(executor)
    .await?;
    Ok(())
}
