use std::sync::Arc;

use axum::{extract::State, Json};
use sqlx::PgExecutor;

use crate::{auth::AuthenticatedUser, db, error::ApiError, models::User, AppState};

/// Make sure the caller has a users row before anything references it
pub async fn ensure_user<'e>(
    executor: impl PgExecutor<'e>,
    user: &AuthenticatedUser,
) -> Result<User, ApiError> {
    Ok(db::users::upsert_user(executor, user.user_id, &user.email, user.name.as_deref()).await?)
}

/// Get the current authenticated user, creating the record on first visit
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<User>, ApiError> {
    let record = ensure_user(&state.db, &user).await?;
    tracing::debug!("Resolved user {} ({})", record.id, record.display_name());
    Ok(Json(record))
}
