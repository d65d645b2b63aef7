// Game-balance rules: pure functions over character sheets, no I/O

pub mod character;
pub mod combat;
pub mod dice;
pub mod items;
pub mod level_up;
pub mod wallet;

use thiserror::Error;

use crate::models::{Attribute, Skill};

pub use character::{apply_health_update, apply_sheet_update, compute_character_request_data};
pub use combat::reequip;
pub use items::{
    build_inventory, check_equippable, check_item_properties, check_new_entry, equipment_bonus,
    resolve_unique_item,
};
pub use level_up::{parse_level_up, FeatureGradeChange, HealthRolls};
pub use wallet::{apply_transaction, check_balances, currency_name, normalize_currency};

/// Highest value a single sub-attribute can reach
pub const MAX_ATTRIBUTE_VALUE: u8 = 5;
/// Cap on the sum of all eighteen sub-attributes
pub const MAX_ATTRIBUTE_TOTAL: u32 = 36;
pub const MAX_SKILL_VALUE: u8 = 5;
/// Skill points available at level 1
pub const BASE_SKILL_POINTS: u32 = 10;
pub const SKILL_POINTS_PER_LEVEL: u32 = 2;
pub const MAX_SPECIAL_SKILLS: usize = 4;
pub const MAX_SPECIAL_SKILL_LENGTH: usize = 40;
pub const MAX_LEVEL: u8 = 20;

pub const BASE_PHYSICAL_HEALTH: i32 = 10;
pub const BASE_MENTAL_HEALTH: i32 = 10;
/// Extra max health granted per point in a health-linked attribute
pub const HEALTH_PER_ATTRIBUTE_POINT: i32 = 2;
/// Sides of the die rolled for health on level-up
pub const HEALTH_DIE: u8 = 6;
pub const MAX_SERIOUS_INJURIES: u8 = 3;
pub const MAX_SERIOUS_TRAUMA: u8 = 3;

pub const BASE_SPEED: i32 = 10;
/// Kilograms
pub const BASE_CARRY_WEIGHT: f64 = 10.0;
pub const CARRY_WEIGHT_PER_POINT: f64 = 5.0;

pub const MAX_PATHS: usize = 3;
pub const MAX_PATH_RANK: i32 = 10;

/// A write that would break a game-balance invariant
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    #[error("attribute total {total} exceeds the cap of {cap}")]
    AttributeCapExceeded { total: u32, cap: u32 },

    #[error("attribute {attribute:?} must be between 1 and {max}, got {value}")]
    AttributeOutOfRange { attribute: Attribute, value: u8, max: u8 },

    #[error("skill points spent ({total}) exceed the cap of {cap} at level {level}")]
    SkillCapExceeded { total: u32, cap: u32, level: u8 },

    #[error("skill {skill:?} cannot exceed {max}, got {value}")]
    SkillOutOfRange { skill: Skill, value: u8, max: u8 },

    #[error("invalid special skill: {0}")]
    InvalidSpecialSkill(String),

    #[error("character is already at the maximum level {0}")]
    MaxLevelReached(u8),

    #[error("level-up spends {spent} skill points but only {allowed} are granted")]
    SkillIncreaseExceeded { spent: u32, allowed: u32 },

    #[error("skill {0:?} is increased more than once")]
    DuplicateSkillIncrease(Skill),

    #[error("health roll {roll} is not a valid d{die} result")]
    InvalidHealthRoll { roll: u8, die: u8 },

    #[error("path '{path}' cannot exceed rank {max}")]
    PathRankExceeded { path: String, max: i32 },

    #[error("a character cannot follow more than {0} paths")]
    TooManyPaths(usize),

    #[error("path ranks ({ranks}) exceed character level {level}")]
    PathRanksExceedLevel { ranks: i32, level: u8 },

    #[error("feature '{feature}' requires rank {required_rank} in one of its paths")]
    FeatureNotEligible { feature: String, required_rank: i32 },

    #[error("feature '{feature}' is already at its maximum grade {max_grade}")]
    FeatureMaxGrade { feature: String, max_grade: i32 },

    #[error("feature grades ({grades}) exceed character level {level}")]
    FeatureGradesExceedLevel { grades: i32, level: u8 },

    #[error("invalid item: {0}")]
    InvalidItem(String),

    #[error("invalid dice expression '{0}'")]
    InvalidDiceExpression(String),

    #[error("unique item {0} already has an inventory entry")]
    UniqueItemHeld(String),

    #[error("item '{0}' cannot be equipped")]
    NotEquippable(String),

    #[error("insufficient {currency}: balance {balance}, change {delta}")]
    InsufficientFunds {
        currency: String,
        balance: i64,
        delta: i64,
    },

    #[error("currency name '{0}' is blank")]
    InvalidCurrency(String),

    #[error("currency '{0}' appears more than once")]
    DuplicateCurrency(String),
}
