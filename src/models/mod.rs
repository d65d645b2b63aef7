pub mod character;
pub mod game;
pub mod item;
pub mod path;
pub mod user;
pub mod wallet;

pub use character::{
    // Sheet sections
    Attribute, CharacterSheet, CombatInformation, ConstitutionAttributes, DexterityAttributes,
    GeneralInformation, GeneralInformationInput, GeneralSkills, Health, HealthStatus,
    InnateAttributes, IntelligenceAttributes, LearnedSkills, PersonalityAttributes, Skill,
    StrengthAttributes, WisdomAttributes,
    // Records and responses
    Character, CharacterDetail, CharacterRow,
    // Requests
    CreateCharacterRequest, LevelUpRequest, SkillIncrease, UpdateCharacterRequest,
    UpdateHealthRequest,
};
pub use game::{AddGameCharacterRequest, AddGameUserRequest, Game, GameDetail, GameRequest};
pub use item::{
    AddInventoryRequest, CreateUniqueItemRequest, CustomItem, Damage, DamageType, Inventory,
    InventoryEntry, InventoryRow, Item, ItemCategory, ItemOverrides, ItemProperties, ItemSource,
    UniqueItem, UpdateInventoryRequest,
};
pub use path::{CharacterFeature, CharacterPath, Feature, FeatureRequest, Path, PathRequest};
pub use user::User;
pub use wallet::{CharacterCurrency, SetWalletRequest, WalletTransactionRequest};
