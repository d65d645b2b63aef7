use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    db,
    error::ApiError,
    extract::ValidatedJson,
    models::{
        Character, CharacterDetail, CharacterFeature, CharacterPath, CharacterRow,
        CreateCharacterRequest, LevelUpRequest, UpdateCharacterRequest, UpdateHealthRequest,
    },
    rules::{self, dice::roll_health, FeatureGradeChange, HealthRolls},
    routes::users::ensure_user,
    AppState,
};

#[derive(Debug, Serialize)]
pub struct LevelUpResponse {
    pub character: CharacterDetail,
    pub rolls: HealthRolls,
    pub new_path: bool,
    pub feature: Option<FeatureGradeChange>,
}

/// Load a character the caller may read: its owner, or the owner of a game it plays in
pub async fn load_readable(
    conn: &mut PgConnection,
    user: &AuthenticatedUser,
    character_id: Uuid,
) -> Result<CharacterRow, ApiError> {
    let row = db::characters::get_character(&mut *conn, character_id)
        .await?
        .ok_or(ApiError::NotFound("character"))?;

    if row.user_id == user.user_id
        || db::characters::is_game_master_of(&mut *conn, character_id, user.user_id).await?
    {
        Ok(row)
    } else {
        Err(ApiError::Forbidden("character"))
    }
}

/// Load and lock a character the caller owns; use inside a transaction
pub async fn load_owned(
    conn: &mut PgConnection,
    user: &AuthenticatedUser,
    character_id: Uuid,
) -> Result<CharacterRow, ApiError> {
    let row = db::characters::get_character_for_update(&mut *conn, character_id)
        .await?
        .ok_or(ApiError::NotFound("character"))?;

    if row.user_id != user.user_id {
        tracing::warn!(
            "User {} tried to modify character {} owned by {}",
            user.user_id,
            character_id,
            row.user_id
        );
        return Err(ApiError::Forbidden("character"));
    }
    Ok(row)
}

async fn detail(conn: &mut PgConnection, row: CharacterRow) -> Result<CharacterDetail, ApiError> {
    let paths = db::paths::character_paths(&mut *conn, row.id).await?;
    let features = db::paths::character_features(&mut *conn, row.id).await?;
    Ok(CharacterDetail {
        character: Character::from(row),
        paths,
        features,
    })
}

pub async fn create_character(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateCharacterRequest>,
) -> Result<(StatusCode, Json<CharacterDetail>), ApiError> {
    let sheet = rules::compute_character_request_data(&request)?;

    let mut tx = state.db.begin().await?;
    ensure_user(&mut *tx, &user).await?;
    let row = db::characters::insert_character(&mut *tx, user.user_id, &sheet).await?;

    if let Some(path_id) = request.path_id {
        db::paths::get_path(&mut *tx, path_id)
            .await?
            .ok_or(ApiError::NotFound("path"))?;
        db::paths::upsert_character_path(&mut *tx, row.id, path_id, 1).await?;
    }

    let detail = detail(&mut tx, row).await?;
    tx.commit().await?;

    tracing::info!(
        "User {} created character {} ({})",
        user.user_id,
        detail.character.id,
        detail.character.sheet.general_information.name
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn list_characters(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Character>>, ApiError> {
    let rows = db::characters::list_characters_for_user(&state.db, user.user_id).await?;
    Ok(Json(rows.into_iter().map(Character::from).collect()))
}

pub async fn get_character(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CharacterDetail>, ApiError> {
    let mut conn = state.db.acquire().await?;
    let row = load_readable(&mut conn, &user, id).await?;
    Ok(Json(detail(&mut conn, row).await?))
}

pub async fn update_character(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateCharacterRequest>,
) -> Result<Json<CharacterDetail>, ApiError> {
    let mut tx = state.db.begin().await?;
    let row = load_owned(&mut tx, &user, id).await?;

    let sheet = rules::apply_sheet_update(&row.sheet(), request)?;
    let row = db::characters::update_sheet(&mut *tx, id, &sheet).await?;
    let detail = detail(&mut tx, row).await?;
    tx.commit().await?;

    tracing::info!("Character {} updated", id);
    Ok(Json(detail))
}

pub async fn update_health(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateHealthRequest>,
) -> Result<Json<Character>, ApiError> {
    let mut tx = state.db.begin().await?;
    let row = load_owned(&mut tx, &user, id).await?;

    let health = rules::apply_health_update(&row.sheet(), &request);
    let row = db::characters::update_health(&mut *tx, id, &health).await?;
    tx.commit().await?;

    tracing::info!("Character {} health is now {:?}", id, health.status);
    Ok(Json(Character::from(row)))
}

pub async fn delete_character(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut tx = state.db.begin().await?;
    load_owned(&mut tx, &user, id).await?;
    db::characters::delete_character(&mut *tx, id).await?;
    tx.commit().await?;

    tracing::info!("User {} deleted character {}", user.user_id, id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn level_up(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<LevelUpRequest>,
) -> Result<Json<LevelUpResponse>, ApiError> {
    // Omitted rolls are rolled here, before any await
    let rolls = HealthRolls {
        physical: request
            .physical_health_roll
            .unwrap_or_else(|| roll_health(&mut rand::rng())),
        mental: request
            .mental_health_roll
            .unwrap_or_else(|| roll_health(&mut rand::rng())),
    };

    let mut tx = state.db.begin().await?;
    let row = load_owned(&mut tx, &user, id).await?;

    let paths = db::paths::character_paths(&mut *tx, id).await?;
    let features = db::paths::character_features(&mut *tx, id).await?;
    let path = db::paths::get_path(&mut *tx, request.path_id)
        .await?
        .ok_or(ApiError::NotFound("path"))?;
    let feature = match request.feature_id {
        Some(feature_id) => Some(
            db::paths::get_feature(&mut *tx, feature_id)
                .await?
                .ok_or(ApiError::NotFound("feature"))?,
        ),
        None => None,
    };

    let outcome = rules::parse_level_up(
        &row.sheet(),
        &paths,
        &features,
        &path,
        feature.as_ref(),
        &request,
        rolls,
    )?;

    let row = db::characters::update_sheet(&mut *tx, id, &outcome.sheet).await?;
    db::paths::upsert_character_path(&mut *tx, id, outcome.path.path_id, outcome.path.rank)
        .await?;
    if let Some(change) = &outcome.feature {
        db::paths::upsert_character_feature(&mut *tx, id, change.feature_id, change.grade).await?;
    }
    let character = detail(&mut tx, row).await?;
    tx.commit().await?;

    tracing::info!(
        "Character {} reached level {} ({} rank {})",
        id,
        outcome.sheet.general_information.level,
        outcome.path.name,
        outcome.path.rank
    );
    Ok(Json(LevelUpResponse {
        character,
        rolls: outcome.rolls,
        new_path: outcome.new_path,
        feature: outcome.feature,
    }))
}

pub async fn get_character_paths(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CharacterPath>>, ApiError> {
    let mut conn = state.db.acquire().await?;
    load_readable(&mut conn, &user, id).await?;
    Ok(Json(db::paths::character_paths(&mut *conn, id).await?))
}

pub async fn get_character_features(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CharacterFeature>>, ApiError> {
    let mut conn = state.db.acquire().await?;
    load_readable(&mut conn, &user, id).await?;
    Ok(Json(db::paths::character_features(&mut *conn, id).await?))
}
