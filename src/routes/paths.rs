use std::sync::Arc;

use axum::{
    extract::{Path as UrlPath, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    db,
    error::ApiError,
    extract::ValidatedJson,
    models::{Feature, FeatureRequest, Path, PathRequest},
    AppState,
};

pub async fn list_paths(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<Path>>, ApiError> {
    Ok(Json(db::paths::list_paths(&state.db).await?))
}

pub async fn get_path(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    UrlPath(id): UrlPath<Uuid>,
) -> Result<Json<Path>, ApiError> {
    db::paths::get_path(&state.db, id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("path"))
}

pub async fn list_path_features(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    UrlPath(id): UrlPath<Uuid>,
) -> Result<Json<Vec<Feature>>, ApiError> {
    db::paths::get_path(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("path"))?;
    Ok(Json(db::paths::list_features_for_path(&state.db, id).await?))
}

pub async fn create_path(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<PathRequest>,
) -> Result<(StatusCode, Json<Path>), ApiError> {
    user.require_admin(&state.config)?;
    let path = db::paths::insert_path(&state.db, &request).await?;

    tracing::info!("Path '{}' created by {}", path.name, user.email);
    Ok((StatusCode::CREATED, Json(path)))
}

pub async fn update_path(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    UrlPath(id): UrlPath<Uuid>,
    ValidatedJson(request): ValidatedJson<PathRequest>,
) -> Result<Json<Path>, ApiError> {
    user.require_admin(&state.config)?;
    let path = db::paths::update_path(&state.db, id, &request)
        .await?
        .ok_or(ApiError::NotFound("path"))?;

    tracing::info!("Path '{}' updated by {}", path.name, user.email);
    Ok(Json(path))
}

pub async fn delete_path(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    UrlPath(id): UrlPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    user.require_admin(&state.config)?;
    if !db::paths::delete_path(&state.db, id).await? {
        return Err(ApiError::NotFound("path"));
    }

    tracing::info!("Path {} deleted by {}", id, user.email);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_features(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<Feature>>, ApiError> {
    Ok(Json(db::paths::list_features(&state.db).await?))
}

pub async fn get_feature(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    UrlPath(id): UrlPath<Uuid>,
) -> Result<Json<Feature>, ApiError> {
    db::paths::get_feature(&state.db, id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("feature"))
}

pub async fn create_feature(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<FeatureRequest>,
) -> Result<(StatusCode, Json<Feature>), ApiError> {
    user.require_admin(&state.config)?;

    let mut tx = state.db.begin().await?;
    let feature = db::paths::insert_feature(&mut tx, &request).await?;
    tx.commit().await?;

    tracing::info!("Feature '{}' created by {}", feature.name, user.email);
    Ok((StatusCode::CREATED, Json(feature)))
}

pub async fn update_feature(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    UrlPath(id): UrlPath<Uuid>,
    ValidatedJson(request): ValidatedJson<FeatureRequest>,
) -> Result<Json<Feature>, ApiError> {
    user.require_admin(&state.config)?;

    let mut tx = state.db.begin().await?;
    let feature = db::paths::update_feature(&mut tx, id, &request)
        .await?
        .ok_or(ApiError::NotFound("feature"))?;
    tx.commit().await?;

    tracing::info!("Feature '{}' updated by {}", feature.name, user.email);
    Ok(Json(feature))
}

pub async fn delete_feature(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    UrlPath(id): UrlPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    user.require_admin(&state.config)?;
    if !db::paths::delete_feature(&state.db, id).await? {
        return Err(ApiError::NotFound("feature"));
    }

    tracing::info!("Feature {} deleted by {}", id, user.email);
    Ok(StatusCode::NO_CONTENT)
}
