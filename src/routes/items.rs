use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    db,
    error::ApiError,
    extract::ValidatedJson,
    models::{CustomItem, Item, ItemProperties},
    routes::{inventory::refresh_characters, users::ensure_user},
    rules, AppState,
};

// Global catalogue, admins write

pub async fn list_items(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<Item>>, ApiError> {
    Ok(Json(db::items::list_items(&state.db).await?))
}

pub async fn get_item(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Item>, ApiError> {
    db::items::get_item(&state.db, id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("item"))
}

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ValidatedJson(props): ValidatedJson<ItemProperties>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    user.require_admin(&state.config)?;
    rules::check_item_properties(&props)?;
    let item = db::items::insert_item(&state.db, &props).await?;

    tracing::info!("Item '{}' created by {}", item.properties.name, user.email);
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidatedJson(props): ValidatedJson<ItemProperties>,
) -> Result<Json<Item>, ApiError> {
    user.require_admin(&state.config)?;
    rules::check_item_properties(&props)?;

    let mut tx = state.db.begin().await?;
    let item = db::items::update_item(&mut *tx, id, &props)
        .await?
        .ok_or(ApiError::NotFound("item"))?;
    let holders = db::items::characters_equipping_item(&mut *tx, id).await?;
    refresh_characters(&mut tx, &holders).await?;
    tx.commit().await?;

    tracing::info!("Item '{}' updated by {}", item.properties.name, user.email);
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    user.require_admin(&state.config)?;

    let mut tx = state.db.begin().await?;
    let holders = db::items::characters_equipping_item(&mut *tx, id).await?;
    if !db::items::delete_item(&mut *tx, id).await? {
        return Err(ApiError::NotFound("item"));
    }
    refresh_characters(&mut tx, &holders).await?;
    tx.commit().await?;

    tracing::info!("Item {} deleted by {}", id, user.email);
    Ok(StatusCode::NO_CONTENT)
}

// Custom items, owner writes

async fn load_owned_custom_item(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> Result<CustomItem, ApiError> {
    let item = db::items::get_custom_item(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("custom item"))?;
    if item.user_id != user.user_id {
        return Err(ApiError::Forbidden("custom item"));
    }
    Ok(item)
}

pub async fn list_custom_items(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<CustomItem>>, ApiError> {
    Ok(Json(
        db::items::list_custom_items(&state.db, user.user_id).await?,
    ))
}

pub async fn get_custom_item(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomItem>, ApiError> {
    Ok(Json(load_owned_custom_item(&state, &user, id).await?))
}

pub async fn create_custom_item(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ValidatedJson(props): ValidatedJson<ItemProperties>,
) -> Result<(StatusCode, Json<CustomItem>), ApiError> {
    rules::check_item_properties(&props)?;
    ensure_user(&state.db, &user).await?;
    let item = db::items::insert_custom_item(&state.db, user.user_id, &props).await?;

    tracing::info!(
        "User {} created custom item '{}'",
        user.user_id,
        item.properties.name
    );
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_custom_item(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidatedJson(props): ValidatedJson<ItemProperties>,
) -> Result<Json<CustomItem>, ApiError> {
    load_owned_custom_item(&state, &user, id).await?;
    rules::check_item_properties(&props)?;

    let mut tx = state.db.begin().await?;
    let item = db::items::update_custom_item(&mut *tx, id, &props)
        .await?
        .ok_or(ApiError::NotFound("custom item"))?;
    let holders = db::items::characters_equipping_custom_item(&mut *tx, id).await?;
    refresh_characters(&mut tx, &holders).await?;
    tx.commit().await?;

    tracing::info!("Custom item {} updated", id);
    Ok(Json(item))
}

pub async fn delete_custom_item(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    load_owned_custom_item(&state, &user, id).await?;

    let mut tx = state.db.begin().await?;
    let holders = db::items::characters_equipping_custom_item(&mut *tx, id).await?;
    db::items::delete_custom_item(&mut *tx, id).await?;
    refresh_characters(&mut tx, &holders).await?;
    tx.commit().await?;

    tracing::info!("Custom item {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}
