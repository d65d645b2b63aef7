use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A progression track a character advances through by rank
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Path {
    pub id: Uuid,
    pub name: String,
    /// Feature every character on this path gets for free
    pub base_feature: String,
    pub description: Option<String>,
    pub max_rank: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An ability unlocked once one of its paths reaches `min_path_rank`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Feature {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub min_path_rank: i32,
    pub max_grade: i32,
    pub examples: Vec<String>,
    /// Paths this feature can be taken from
    pub path_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CharacterPath {
    pub path_id: Uuid,
    pub name: String,
    pub rank: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CharacterFeature {
    pub feature_id: Uuid,
    pub name: String,
    pub grade: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PathRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    #[validate(length(min = 1, max = 128))]
    pub base_feature: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 10))]
    pub max_rank: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FeatureRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 10))]
    pub min_path_rank: i32,
    #[validate(range(min = 1, max = 5))]
    pub max_grade: i32,
    #[serde(default)]
    #[validate(length(max = 10))]
    pub examples: Vec<String>,
    #[validate(length(min = 1))]
    pub path_ids: Vec<Uuid>,
}
