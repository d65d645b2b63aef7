use sqlx::{types::Json, PgExecutor, Result};
use uuid::Uuid;

use crate::models::{CharacterRow, CharacterSheet, CombatInformation, Health};

pub async fn insert_character<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
    sheet: &CharacterSheet,
) -> Result<CharacterRow> {
    sqlx::query_as::<_, CharacterRow>(
        r#"
        INSERT INTO characters
            (user_id, general_information, health, combat_information, innate_attributes, learned_skills)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(Json(&sheet.general_information))
    .bind(Json(&sheet.health))
    .bind(Json(&sheet.combat_information))
    .bind(Json(&sheet.innate_attributes))
    .bind(Json(&sheet.learned_skills))
    .fetch_one(executor)
    .await
}

pub async fn get_character<'e>(
    executor: impl PgExecutor<'e>,
    character_id: Uuid,
) -> Result<Option<CharacterRow>> {
    sqlx::query_as::<_, CharacterRow>("SELECT * FROM characters WHERE id = $1")
        .bind(character_id)
        .fetch_optional(executor)
        .await
}

/// Same as [`get_character`] but locks the row until the transaction ends
pub async fn get_character_for_update<'e>(
    executor: impl PgExecutor<'e>,
    character_id: Uuid,
) -> Result<Option<CharacterRow>> {
    sqlx::query_as::<_, CharacterRow>("SELECT * FROM characters WHERE id = $1 FOR UPDATE")
        .bind(character_id)
        .fetch_optional(executor)
        .await
}

pub async fn list_characters_for_user<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
) -> Result<Vec<CharacterRow>> {
    sqlx::query_as::<_, CharacterRow>(
        "SELECT * FROM characters WHERE user_id = $1 ORDER BY created_at",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

pub async fn update_sheet<'e>(
    executor: impl PgExecutor<'e>,
    character_id: Uuid,
    sheet: &CharacterSheet,
) -> Result<CharacterRow> {
    sqlx::query_as::<_, CharacterRow>(
        r#"
        UPDATE characters SET
            general_information = $2,
            health = $3,
            combat_information = $4,
            innate_attributes = $5,
            learned_skills = $6,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(character_id)
    .bind(Json(&sheet.general_information))
    .bind(Json(&sheet.health))
    .bind(Json(&sheet.combat_information))
    .bind(Json(&sheet.innate_attributes))
    .bind(Json(&sheet.learned_skills))
    .fetch_one(executor)
    .await
}

pub async fn update_health<'e>(
    executor: impl PgExecutor<'e>,
    character_id: Uuid,
    health: &Health,
) -> Result<CharacterRow> {
    sqlx::query_as::<_, CharacterRow>(
        "UPDATE characters SET health = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(character_id)
    .bind(Json(health))
    .fetch_one(executor)
    .await
}

pub async fn update_combat_information<'e>(
    executor: impl PgExecutor<'e>,
    character_id: Uuid,
    combat: &CombatInformation,
) -> Result<()> {
    sqlx::query(
        "UPDATE characters SET combat_information = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(character_id)
    .bind(Json(combat))
    .execute(executor)
    .await?;
    Ok(())
}

/// Returns false when no row was deleted
pub async fn delete_character<'e>(executor: impl PgExecutor<'e>, character_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM characters WHERE id = $1")
        .bind(character_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// True when `user_id` owns a game the character takes part in
pub async fn is_game_master_of<'e>(
    executor: impl PgExecutor<'e>,
    character_id: Uuid,
    user_id: Uuid,
) -> Result<bool> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM game_characters gc
            JOIN games g ON g.id = gc.game_id
            WHERE gc.character_id = $1 AND g.owner_id = $2
        )
        "#,
    )
    .bind(character_id)
    .bind(user_id)
    .fetch_one(executor)
    .await
}
