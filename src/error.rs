use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::rules::RuleError;

/// Error returned by every API handler
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthorized,

    #[error("you do not have access to this {0}")]
    Forbidden(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("request validation failed")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("database error")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::Conflict("record already exists".to_string());
            }
            if db_err.is_foreign_key_violation() {
                return Self::BadRequest("referenced record does not exist".to_string());
            }
        }
        Self::Database(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::Rule(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::Rule(_) => "rule_violation",
            Self::Conflict(_) => "conflict",
            Self::BadRequest(_) => "bad_request",
            Self::Database(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Database(e) => {
                tracing::error!("Database error: {}", e);
                json!({ "error": self.kind(), "message": self.to_string() })
            }
            Self::Validation(errors) => json!({
                "error": self.kind(),
                "message": self.to_string(),
                "details": errors,
            }),
            Self::Rule(e) => {
                tracing::warn!("Rejected by game rules: {}", e);
                json!({ "error": self.kind(), "message": self.to_string() })
            }
            _ => json!({ "error": self.kind(), "message": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_rule_error_maps_to_422() {
        let err = ApiError::from(RuleError::AttributeCapExceeded { total: 40, cap: 36 });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"], "rule_violation");
        assert_eq!(body["message"], "attribute total 40 exceeds the cap of 36");
    }

    #[tokio::test]
    async fn test_database_error_text_is_hidden() {
        let err = ApiError::from(sqlx::Error::Protocol("secret detail".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["message"], "database error");
        assert!(!body.to_string().contains("secret detail"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden("game").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound("character").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Conflict("taken".to_string()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::NotFound("character").to_string(),
            "character not found"
        );
    }
}
