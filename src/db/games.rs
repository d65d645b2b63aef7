use sqlx::{PgExecutor, Result};
use uuid::Uuid;

use crate::models::{Game, GameRequest};

pub async fn insert_game<'e>(
    executor: impl PgExecutor<'e>,
    owner_id: Uuid,
    request: &GameRequest,
) -> Result<Game> {
    sqlx::query_as::<_, Game>(
        r#"
        INSERT INTO games (name, description, image_key, owner_id)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(&request.name)
    .bind(&request.description)
    .bind(&request.image_key)
    .bind(owner_id)
    .fetch_one(executor)
    .await
}

pub async fn get_game<'e>(executor: impl PgExecutor<'e>, game_id: Uuid) -> Result<Option<Game>> {
    sqlx::query_as::<_, Game>("SELECT * FROM games WHERE id = $1")
        .bind(game_id)
        .fetch_optional(executor)
        .await
}

/// Games the user is a member of, owned ones included
pub async fn list_games_for_user<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
) -> Result<Vec<Game>> {
    sqlx::query_as::<_, Game>(
        r#"
        SELECT g.*
        FROM games g
        JOIN game_users gu ON gu.game_id = g.id
        WHERE gu.user_id = $1
        ORDER BY g.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

pub async fn update_game<'e>(
    executor: impl PgExecutor<'e>,
    game_id: Uuid,
    request: &GameRequest,
) -> Result<Game> {
    sqlx::query_as::<_, Game>(
        r#"
        UPDATE games SET
            name = $2,
            description = $3,
            image_key = $4,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(game_id)
    .bind(&request.name)
    .bind(&request.description)
    .bind(&request.image_key)
    .fetch_one(executor)
    .await
}

pub async fn delete_game<'e>(executor: impl PgExecutor<'e>, game_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM games WHERE id = $1")
        .bind(game_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn is_member<'e>(executor: impl PgExecutor<'e>, game_id: Uuid, user_id: Uuid) -> Result<bool> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM game_users WHERE game_id = $1 AND user_id = $2)",
    )
    .bind(game_id)
    .bind(user_id)
    .fetch_one(executor)
    .await
}

pub async fn add_user<'e>(executor: impl PgExecutor<'e>, game_id: Uuid, user_id: Uuid) -> Result<()> {
    sqlx::query(
        "INSERT INTO game_users (game_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(game_id)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn remove_user<'e>(executor: impl PgExecutor<'e>, game_id: Uuid, user_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM game_users WHERE game_id = $1 AND user_id = $2")
        .bind(game_id)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Drop every character of `user_id` from the game
pub async fn remove_user_characters<'e>(
    executor: impl PgExecutor<'e>,
    game_id: Uuid,
    user_id: Uuid,
) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM game_characters gc
        USING characters c
        WHERE gc.character_id = c.id AND gc.game_id = $1 AND c.user_id = $2
        "#,
    )
    .bind(game_id)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn user_ids<'e>(executor: impl PgExecutor<'e>, game_id: Uuid) -> Result<Vec<Uuid>> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT user_id FROM game_users WHERE game_id = $1 ORDER BY joined_at",
    )
    .bind(game_id)
    .fetch_all(executor)
    .await
}

pub async fn character_ids<'e>(executor: impl PgExecutor<'e>, game_id: Uuid) -> Result<Vec<Uuid>> {
    sqlx::query_scalar::<_, Uuid>("SELECT character_id FROM game_characters WHERE game_id = $1")
        .bind(game_id)
        .fetch_all(executor)
        .await
}

pub async fn add_character<'e>(
    executor: impl PgExecutor<'e>,
    game_id: Uuid,
    character_id: Uuid,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO game_characters (game_id, character_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(game_id)
    .bind(character_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn remove_character<'e>(
    executor: impl PgExecutor<'e>,
    game_id: Uuid,
    character_id: Uuid,
) -> Result<bool> {
    let result = sqlx::query("DELETE FROM game_characters WHERE game_id = $1 AND character_id = $2")
        .bind(game_id)
        .bind(character_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
