use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{config::Config, error::ApiError, AppState};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // User UUID
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

impl AuthenticatedUser {
    /// Admins may edit the shared path, feature and item catalogue
    pub fn is_admin(&self, config: &Config) -> bool {
        config
            .security
            .admin_emails
            .iter()
            .any(|admin| admin.eq_ignore_ascii_case(&self.email))
    }

    pub fn require_admin(&self, config: &Config) -> Result<(), ApiError> {
        if self.is_admin(config) {
            Ok(())
        } else {
            tracing::warn!("User {} attempted an admin-only write", self.user_id);
            Err(ApiError::Forbidden("catalogue"))
        }
    }
}

/// Extractor for authenticated users from JWT tokens
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let app_state = Arc::<AppState>::from_ref(state);

        // Authorization header first, then the `token` query parameter
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(String::from)
            .or_else(|| {
                parts
                    .uri
                    .query()
                    .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
                    .and_then(|params| {
                        params
                            .into_iter()
                            .find(|(k, _)| k == "token")
                            .map(|(_, v)| v)
                    })
            });

        async move {
            let token = token.ok_or(ApiError::Unauthorized)?;
            verify_token(&token, &app_state.config.security.jwt_secret)
        }
    }
}

pub fn verify_token(token: &str, jwt_secret: &str) -> Result<AuthenticatedUser, ApiError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        ApiError::Unauthorized
    })?;

    let user_id = token_data
        .claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| ApiError::Unauthorized)?;

    Ok(AuthenticatedUser {
        user_id,
        email: token_data.claims.email,
        name: token_data.claims.name,
    })
}

/// Generate a JWT token for a user
pub fn generate_token(
    user_id: Uuid,
    email: &str,
    name: Option<&str>,
    jwt_secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = (chrono::Utc::now() + chrono::Duration::hours(24)).timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        name: name.map(String::from),
        exp: expiration as usize,
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_ref()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, SecurityConfig, ServerConfig};

    const SECRET: &str = "test-secret";

    fn config(admin_emails: Vec<String>) -> Config {
        Config {
            database: DatabaseConfig {
                url: "postgres://localhost/neblir".to_string(),
                max_connections: 1,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                frontend_url: "http://localhost:5173".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: SECRET.to_string(),
                admin_emails,
            },
        }
    }

    #[test]
    fn test_token_round_trip() {
        let user_id = Uuid::new_v4();
        let token = generate_token(user_id, "gm@neblir.test", Some("Gamemaster"), SECRET).unwrap();

        let user = verify_token(&token, SECRET).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.email, "gm@neblir.test");
        assert_eq!(user.name.as_deref(), Some("Gamemaster"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = generate_token(Uuid::new_v4(), "a@b.test", None, SECRET).unwrap();
        assert!(matches!(
            verify_token(&token, "other-secret"),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn test_non_uuid_subject_rejected() {
        let claims = Claims {
            sub: "12345".to_string(),
            email: "a@b.test".to_string(),
            name: None,
            exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(SECRET.as_ref()),
        )
        .unwrap();
        assert!(verify_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_admin_check_ignores_case() {
        let user = AuthenticatedUser {
            user_id: Uuid::new_v4(),
            email: "Admin@Neblir.test".to_string(),
            name: None,
        };
        assert!(user.is_admin(&config(vec!["admin@neblir.test".to_string()])));
        assert!(!user.is_admin(&config(vec![])));
        assert!(user.require_admin(&config(vec![])).is_err());
    }
}
