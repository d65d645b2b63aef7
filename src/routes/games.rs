use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    db,
    error::ApiError,
    extract::ValidatedJson,
    models::{AddGameCharacterRequest, AddGameUserRequest, Game, GameDetail, GameRequest},
    routes::users::ensure_user,
    AppState,
};

async fn load_game(conn: &mut PgConnection, game_id: Uuid) -> Result<Game, ApiError> {
    db::games::get_game(conn, game_id)
        .await?
        .ok_or(ApiError::NotFound("game"))
}

async fn load_owned_game(
    conn: &mut PgConnection,
    user: &AuthenticatedUser,
    game_id: Uuid,
) -> Result<Game, ApiError> {
    let game = load_game(conn, game_id).await?;
    if game.owner_id != user.user_id {
        return Err(ApiError::Forbidden("game"));
    }
    Ok(game)
}

async fn game_detail(conn: &mut PgConnection, game: Game) -> Result<GameDetail, ApiError> {
    let user_ids = db::games::user_ids(&mut *conn, game.id).await?;
    let character_ids = db::games::character_ids(&mut *conn, game.id).await?;
    Ok(GameDetail {
        game,
        user_ids,
        character_ids,
    })
}

pub async fn create_game(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<GameRequest>,
) -> Result<(StatusCode, Json<GameDetail>), ApiError> {
    let mut tx = state.db.begin().await?;
    ensure_user(&mut *tx, &user).await?;
    let game = db::games::insert_game(&mut *tx, user.user_id, &request).await?;
    db::games::add_user(&mut *tx, game.id, user.user_id).await?;
    let detail = game_detail(&mut tx, game).await?;
    tx.commit().await?;

    tracing::info!("User {} created game {}", user.user_id, detail.game.id);
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn list_games(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Game>>, ApiError> {
    Ok(Json(
        db::games::list_games_for_user(&state.db, user.user_id).await?,
    ))
}

pub async fn get_game(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<GameDetail>, ApiError> {
    let mut conn = state.db.acquire().await?;
    let game = load_game(&mut conn, id).await?;
    if !db::games::is_member(&mut *conn, id, user.user_id).await? {
        return Err(ApiError::Forbidden("game"));
    }
    Ok(Json(game_detail(&mut conn, game).await?))
}

pub async fn update_game(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<GameRequest>,
) -> Result<Json<GameDetail>, ApiError> {
    let mut conn = state.db.acquire().await?;
    load_owned_game(&mut conn, &user, id).await?;
    let game = db::games::update_game(&mut *conn, id, &request).await?;

    tracing::info!("Game {} updated", id);
    Ok(Json(game_detail(&mut conn, game).await?))
}

pub async fn delete_game(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.db.acquire().await?;
    load_owned_game(&mut conn, &user, id).await?;
    db::games::delete_game(&mut *conn, id).await?;

    tracing::info!("User {} deleted game {}", user.user_id, id);
    Ok(StatusCode::NO_CONTENT)
}

/// Owner adds a user by id
pub async fn add_user(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AddGameUserRequest>,
) -> Result<Json<GameDetail>, ApiError> {
    let mut conn = state.db.acquire().await?;
    let game = load_owned_game(&mut conn, &user, id).await?;
    db::users::get_user(&mut *conn, request.user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    db::games::add_user(&mut *conn, id, request.user_id).await?;

    tracing::info!("User {} joined game {}", request.user_id, id);
    Ok(Json(game_detail(&mut conn, game).await?))
}

/// Owner removes a member, or a member leaves; their characters leave too
pub async fn remove_user(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let mut tx = state.db.begin().await?;
    let game = load_game(&mut tx, id).await?;

    if game.owner_id != user.user_id && user_id != user.user_id {
        return Err(ApiError::Forbidden("game"));
    }
    if user_id == game.owner_id {
        return Err(ApiError::Conflict(
            "the game owner cannot be removed from the game".to_string(),
        ));
    }

    if !db::games::remove_user(&mut *tx, id, user_id).await? {
        return Err(ApiError::NotFound("game member"));
    }
    db::games::remove_user_characters(&mut *tx, id, user_id).await?;
    tx.commit().await?;

    tracing::info!("User {} left game {}", user_id, id);
    Ok(StatusCode::NO_CONTENT)
}

/// A member adds one of their own characters
pub async fn add_character(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AddGameCharacterRequest>,
) -> Result<Json<GameDetail>, ApiError> {
    let mut conn = state.db.acquire().await?;
    let game = load_game(&mut conn, id).await?;
    if !db::games::is_member(&mut *conn, id, user.user_id).await? {
        return Err(ApiError::Forbidden("game"));
    }

    let character = db::characters::get_character(&mut *conn, request.character_id)
        .await?
        .ok_or(ApiError::NotFound("character"))?;
    if character.user_id != user.user_id {
        return Err(ApiError::Forbidden("character"));
    }

    db::games::add_character(&mut *conn, id, request.character_id).await?;

    tracing::info!("Character {} joined game {}", request.character_id, id);
    Ok(Json(game_detail(&mut conn, game).await?))
}

/// Game owner or character owner removes a character
pub async fn remove_character(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path((id, character_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.db.acquire().await?;
    let game = load_game(&mut conn, id).await?;

    if game.owner_id != user.user_id {
        let character = db::characters::get_character(&mut *conn, character_id)
            .await?
            .ok_or(ApiError::NotFound("character"))?;
        if character.user_id != user.user_id {
            return Err(ApiError::Forbidden("character"));
        }
    }

    if !db::games::remove_character(&mut *conn, id, character_id).await? {
        return Err(ApiError::NotFound("game character"));
    }

    tracing::info!("Character {} left game {}", character_id, id);
    Ok(StatusCode::NO_CONTENT)
}
