use sqlx::{PgExecutor, Result};
use uuid::Uuid;

use crate::models::User;

/// Insert the user on first sight, refresh email and name afterwards
pub async fn upsert_user<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
    email: &str,
    name: Option<&str>,
) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, name)
        VALUES ($1, $2, $3)
        ON CONFLICT (id)
        DO UPDATE SET
            email = EXCLUDED.email,
            name = COALESCE(EXCLUDED.name, users.name),
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(email)
    .bind(name)
    .fetch_one(executor)
    .await
}

pub async fn get_user<'e>(executor: impl PgExecutor<'e>, user_id: Uuid) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await
}
