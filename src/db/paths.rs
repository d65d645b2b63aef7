use sqlx::{PgConnection, PgExecutor, Result};
use uuid::Uuid;

use crate::{
    models::{CharacterFeature, CharacterPath, Feature, FeatureRequest, Path, PathRequest},
    rules::MAX_PATH_RANK,
};

// Path catalogue

pub async fn list_paths<'e>(executor: impl PgExecutor<'e>) -> Result<Vec<Path>> {
    sqlx::query_as::<_, Path>("SELECT * FROM paths ORDER BY name")
        .fetch_all(executor)
        .await
}

pub async fn get_path<'e>(executor: impl PgExecutor<'e>, path_id: Uuid) -> Result<Option<Path>> {
    sqlx::query_as::<_, Path>("SELECT * FROM paths WHERE id = $1")
        .bind(path_id)
        .fetch_optional(executor)
        .await
}

pub async fn insert_path<'e>(executor: impl PgExecutor<'e>, request: &PathRequest) -> Result<Path> {
    sqlx::query_as::<_, Path>(
        r#"
        INSERT INTO paths (name, base_feature, description, max_rank)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(&request.name)
    .bind(&request.base_feature)
    .bind(&request.description)
    .bind(request.max_rank.unwrap_or(MAX_PATH_RANK))
    .fetch_one(executor)
    .await
}

pub async fn update_path<'e>(
    executor: impl PgExecutor<'e>,
    path_id: Uuid,
    request: &PathRequest,
) -> Result<Option<Path>> {
    sqlx::query_as::<_, Path>(
        r#"
        UPDATE paths SET
            name = $2,
            base_feature = $3,
            description = $4,
            max_rank = $5,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(path_id)
    .bind(&request.name)
    .bind(&request.base_feature)
    .bind(&request.description)
    .bind(request.max_rank.unwrap_or(MAX_PATH_RANK))
    .fetch_optional(executor)
    .await
}

pub async fn delete_path<'e>(executor: impl PgExecutor<'e>, path_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM paths WHERE id = $1")
        .bind(path_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

// Feature catalogue

pub async fn list_features<'e>(executor: impl PgExecutor<'e>) -> Result<Vec<Feature>> {
    sqlx::query_as::<_, Feature>("SELECT * FROM feature_catalogue ORDER BY name")
        .fetch_all(executor)
        .await
}

pub async fn list_features_for_path<'e>(
    executor: impl PgExecutor<'e>,
    path_id: Uuid,
) -> Result<Vec<Feature>> {
    sqlx::query_as::<_, Feature>(
        "SELECT * FROM feature_catalogue WHERE $1 = ANY(path_ids) ORDER BY min_path_rank, name",
    )
    .bind(path_id)
    .fetch_all(executor)
    .await
}

pub async fn get_feature<'e>(
    executor: impl PgExecutor<'e>,
    feature_id: Uuid,
) -> Result<Option<Feature>> {
    sqlx::query_as::<_, Feature>("SELECT * FROM feature_catalogue WHERE id = $1")
        .bind(feature_id)
        .fetch_optional(executor)
        .await
}

/// Insert a feature and its path links; run inside a transaction
pub async fn insert_feature(conn: &mut PgConnection, request: &FeatureRequest) -> Result<Feature> {
    let feature_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO features (name, description, min_path_rank, max_grade, examples)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(&request.name)
    .bind(&request.description)
    .bind(request.min_path_rank)
    .bind(request.max_grade)
    .bind(&request.examples)
    .fetch_one(&mut *conn)
    .await?;

    link_feature_paths(conn, feature_id, &request.path_ids).await?;

    get_feature(&mut *conn, feature_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// Replace a feature and its path links; run inside a transaction
pub async fn update_feature(
    conn: &mut PgConnection,
    feature_id: Uuid,
    request: &FeatureRequest,
) -> Result<Option<Feature>> {
    let updated = sqlx::query(
        r#"
        UPDATE features SET
            name = $2,
            description = $3,
            min_path_rank = $4,
            max_grade = $5,
            examples = $6,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(feature_id)
    .bind(&request.name)
    .bind(&request.description)
    .bind(request.min_path_rank)
    .bind(request.max_grade)
    .bind(&request.examples)
    .execute(&mut *conn)
    .await?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    sqlx::query("DELETE FROM feature_paths WHERE feature_id = $1")
        .bind(feature_id)
        .execute(&mut *conn)
        .await?;
    link_feature_paths(conn, feature_id, &request.path_ids).await?;

    get_feature(&mut *conn, feature_id).await
}

async fn link_feature_paths(
    conn: &mut PgConnection,
    feature_id: Uuid,
    path_ids: &[Uuid],
) -> Result<()> {
    for path_id in path_ids {
        sqlx::query(
            "INSERT INTO feature_paths (feature_id, path_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(feature_id)
        .bind(path_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn delete_feature<'e>(executor: impl PgExecutor<'e>, feature_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM features WHERE id = $1")
        .bind(feature_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

// Character progression

pub async fn character_paths<'e>(
    executor: impl PgExecutor<'e>,
    character_id: Uuid,
) -> Result<Vec<CharacterPath>> {
    sqlx::query_as::<_, CharacterPath>(
        r#"
        SELECT cp.path_id, p.name, cp.rank
        FROM character_paths cp
        JOIN paths p ON p.id = cp.path_id
        WHERE cp.character_id = $1
        ORDER BY cp.rank DESC, p.name
        "#,
    )
    .bind(character_id)
    .fetch_all(executor)
    .await
}

pub async fn character_features<'e>(
    executor: impl PgExecutor<'e>,
    character_id: Uuid,
) -> Result<Vec<CharacterFeature>> {
    sqlx::query_as::<_, CharacterFeature>(
        r#"
        SELECT cf.feature_id, f.name, cf.grade
        FROM character_features cf
        JOIN features f ON f.id = cf.feature_id
        WHERE cf.character_id = $1
        ORDER BY f.name
        "#,
    )
    .bind(character_id)
    .fetch_all(executor)
    .await
}

pub async fn upsert_character_path<'e>(
    executor: impl PgExecutor<'e>,
    character_id: Uuid,
    path_id: Uuid,
    rank: i32,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO character_paths (character_id, path_id, rank)
        VALUES ($1, $2, $3)
        ON CONFLICT (character_id, path_id) DO UPDATE SET rank = EXCLUDED.rank
        "#,
    )
    .bind(character_id)
    .bind(path_id)
    .bind(rank)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn upsert_character_feature<'e>(
    executor: impl PgExecutor<'e>,
    character_id: Uuid,
    feature_id: Uuid,
    grade: i32,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO character_features (character_id, feature_id, grade)
        VALUES ($1, $2, $3)
        ON CONFLICT (character_id, feature_id) DO UPDATE SET grade = EXCLUDED.grade
        "#,
    )
    .bind(character_id)
    .bind(feature_id)
    .bind(grade)
    .execute(executor)
    .await?;
    Ok(())
}
