use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;
use validator::Validate;

use super::{CharacterFeature, CharacterPath};

/// One of the eighteen innate sub-attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Investigation,
    Memory,
    Deduction,
    Sense,
    Perception,
    Insight,
    Mentality,
    Deception,
    Persuasion,
    Athletics,
    Resilience,
    BruteForce,
    Manual,
    Stealth,
    Agility,
    ResistInternal,
    ResistExternal,
    Stamina,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct IntelligenceAttributes {
    #[validate(range(min = 1, max = 5))]
    pub investigation: u8,
    #[validate(range(min = 1, max = 5))]
    pub memory: u8,
    #[validate(range(min = 1, max = 5))]
    pub deduction: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct WisdomAttributes {
    #[validate(range(min = 1, max = 5))]
    pub sense: u8,
    #[validate(range(min = 1, max = 5))]
    pub perception: u8,
    #[validate(range(min = 1, max = 5))]
    pub insight: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PersonalityAttributes {
    #[validate(range(min = 1, max = 5))]
    pub mentality: u8,
    #[validate(range(min = 1, max = 5))]
    pub deception: u8,
    #[validate(range(min = 1, max = 5))]
    pub persuasion: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct StrengthAttributes {
    #[validate(range(min = 1, max = 5))]
    pub athletics: u8,
    #[validate(range(min = 1, max = 5))]
    pub resilience: u8,
    #[validate(range(min = 1, max = 5))]
    pub brute_force: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DexterityAttributes {
    #[validate(range(min = 1, max = 5))]
    pub manual: u8,
    #[validate(range(min = 1, max = 5))]
    pub stealth: u8,
    #[validate(range(min = 1, max = 5))]
    pub agility: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ConstitutionAttributes {
    #[validate(range(min = 1, max = 5))]
    pub resist_internal: u8,
    #[validate(range(min = 1, max = 5))]
    pub resist_external: u8,
    #[validate(range(min = 1, max = 5))]
    pub stamina: u8,
}

/// Innate attributes, grouped the way the character sheet shows them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct InnateAttributes {
    #[validate(nested)]
    pub intelligence: IntelligenceAttributes,
    #[validate(nested)]
    pub wisdom: WisdomAttributes,
    #[validate(nested)]
    pub personality: PersonalityAttributes,
    #[validate(nested)]
    pub strength: StrengthAttributes,
    #[validate(nested)]
    pub dexterity: DexterityAttributes,
    #[validate(nested)]
    pub constitution: ConstitutionAttributes,
}

impl Attribute {
    pub const ALL: [Attribute; 18] = [
        Attribute::Investigation,
        Attribute::Memory,
        Attribute::Deduction,
        Attribute::Sense,
        Attribute::Perception,
        Attribute::Insight,
        Attribute::Mentality,
        Attribute::Deception,
        Attribute::Persuasion,
        Attribute::Athletics,
        Attribute::Resilience,
        Attribute::BruteForce,
        Attribute::Manual,
        Attribute::Stealth,
        Attribute::Agility,
        Attribute::ResistInternal,
        Attribute::ResistExternal,
        Attribute::Stamina,
    ];
}

impl InnateAttributes {
    pub fn get(&self, attribute: Attribute) -> u8 {
        match attribute {
            Attribute::Investigation => self.intelligence.investigation,
            Attribute::Memory => self.intelligence.memory,
            Attribute::Deduction => self.intelligence.deduction,
            Attribute::Sense => self.wisdom.sense,
            Attribute::Perception => self.wisdom.perception,
            Attribute::Insight => self.wisdom.insight,
            Attribute::Mentality => self.personality.mentality,
            Attribute::Deception => self.personality.deception,
            Attribute::Persuasion => self.personality.persuasion,
            Attribute::Athletics => self.strength.athletics,
            Attribute::Resilience => self.strength.resilience,
            Attribute::BruteForce => self.strength.brute_force,
            Attribute::Manual => self.dexterity.manual,
            Attribute::Stealth => self.dexterity.stealth,
            Attribute::Agility => self.dexterity.agility,
            Attribute::ResistInternal => self.constitution.resist_internal,
            Attribute::ResistExternal => self.constitution.resist_external,
            Attribute::Stamina => self.constitution.stamina,
        }
    }

    pub fn get_mut(&mut self, attribute: Attribute) -> &mut u8 {
        match attribute {
            Attribute::Investigation => &mut self.intelligence.investigation,
            Attribute::Memory => &mut self.intelligence.memory,
            Attribute::Deduction => &mut self.intelligence.deduction,
            Attribute::Sense => &mut self.wisdom.sense,
            Attribute::Perception => &mut self.wisdom.perception,
            Attribute::Insight => &mut self.wisdom.insight,
            Attribute::Mentality => &mut self.personality.mentality,
            Attribute::Deception => &mut self.personality.deception,
            Attribute::Persuasion => &mut self.personality.persuasion,
            Attribute::Athletics => &mut self.strength.athletics,
            Attribute::Resilience => &mut self.strength.resilience,
            Attribute::BruteForce => &mut self.strength.brute_force,
            Attribute::Manual => &mut self.dexterity.manual,
            Attribute::Stealth => &mut self.dexterity.stealth,
            Attribute::Agility => &mut self.dexterity.agility,
            Attribute::ResistInternal => &mut self.constitution.resist_internal,
            Attribute::ResistExternal => &mut self.constitution.resist_external,
            Attribute::Stamina => &mut self.constitution.stamina,
        }
    }

    /// Sum of all eighteen sub-attributes
    pub fn total(&self) -> u32 {
        Attribute::ALL.iter().map(|a| self.get(*a) as u32).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Mechanics,
    Software,
    GeneralKnowledge,
    History,
    Driving,
    Acrobatics,
    Aim,
    Melee,
    Grid,
    Research,
    Medicine,
    Science,
    Survival,
    Streetwise,
    Performance,
    ManipulationNegotiation,
}

/// Skills left out of a request default to 0
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GeneralSkills {
    #[validate(range(max = 5))]
    pub mechanics: u8,
    #[validate(range(max = 5))]
    pub software: u8,
    #[validate(range(max = 5))]
    pub general_knowledge: u8,
    #[validate(range(max = 5))]
    pub history: u8,
    #[validate(range(max = 5))]
    pub driving: u8,
    #[validate(range(max = 5))]
    pub acrobatics: u8,
    #[validate(range(max = 5))]
    pub aim: u8,
    #[validate(range(max = 5))]
    pub melee: u8,
    #[validate(range(max = 5))]
    pub grid: u8,
    #[validate(range(max = 5))]
    pub research: u8,
    #[validate(range(max = 5))]
    pub medicine: u8,
    #[validate(range(max = 5))]
    pub science: u8,
    #[validate(range(max = 5))]
    pub survival: u8,
    #[validate(range(max = 5))]
    pub streetwise: u8,
    #[validate(range(max = 5))]
    pub performance: u8,
    #[validate(range(max = 5))]
    pub manipulation_negotiation: u8,
}

impl Skill {
    pub const ALL: [Skill; 16] = [
        Skill::Mechanics,
        Skill::Software,
        Skill::GeneralKnowledge,
        Skill::History,
        Skill::Driving,
        Skill::Acrobatics,
        Skill::Aim,
        Skill::Melee,
        Skill::Grid,
        Skill::Research,
        Skill::Medicine,
        Skill::Science,
        Skill::Survival,
        Skill::Streetwise,
        Skill::Performance,
        Skill::ManipulationNegotiation,
    ];
}

impl GeneralSkills {
    pub fn get(&self, skill: Skill) -> u8 {
        match skill {
            Skill::Mechanics => self.mechanics,
            Skill::Software => self.software,
            Skill::GeneralKnowledge => self.general_knowledge,
            Skill::History => self.history,
            Skill::Driving => self.driving,
            Skill::Acrobatics => self.acrobatics,
            Skill::Aim => self.aim,
            Skill::Melee => self.melee,
            Skill::Grid => self.grid,
            Skill::Research => self.research,
            Skill::Medicine => self.medicine,
            Skill::Science => self.science,
            Skill::Survival => self.survival,
            Skill::Streetwise => self.streetwise,
            Skill::Performance => self.performance,
            Skill::ManipulationNegotiation => self.manipulation_negotiation,
        }
    }

    pub fn get_mut(&mut self, skill: Skill) -> &mut u8 {
        match skill {
            Skill::Mechanics => &mut self.mechanics,
            Skill::Software => &mut self.software,
            Skill::GeneralKnowledge => &mut self.general_knowledge,
            Skill::History => &mut self.history,
            Skill::Driving => &mut self.driving,
            Skill::Acrobatics => &mut self.acrobatics,
            Skill::Aim => &mut self.aim,
            Skill::Melee => &mut self.melee,
            Skill::Grid => &mut self.grid,
            Skill::Research => &mut self.research,
            Skill::Medicine => &mut self.medicine,
            Skill::Science => &mut self.science,
            Skill::Survival => &mut self.survival,
            Skill::Streetwise => &mut self.streetwise,
            Skill::Performance => &mut self.performance,
            Skill::ManipulationNegotiation => &mut self.manipulation_negotiation,
        }
    }

    /// Skill points spent across all general skills
    pub fn total(&self) -> u32 {
        Skill::ALL.iter().map(|s| self.get(*s) as u32).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct LearnedSkills {
    #[validate(nested)]
    pub general_skills: GeneralSkills,
    #[serde(default)]
    #[validate(length(max = 4))]
    pub special_skills: Vec<String>,
}

/// General information as submitted by the client (the level is never client-controlled)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GeneralInformationInput {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    #[validate(length(min = 1, max = 64))]
    pub surname: Option<String>,
    #[validate(range(min = 0, max = 1000))]
    pub age: Option<i32>,
    #[validate(length(min = 1, max = 64))]
    pub religion: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub profession: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub race: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub birthplace: Option<String>,
    /// Height in centimetres
    #[validate(range(min = 0.0, max = 400.0))]
    pub height: Option<f64>,
    /// Weight in kilograms
    #[validate(range(min = 0.0, max = 1000.0))]
    pub weight: Option<f64>,
    #[validate(length(min = 1, max = 256))]
    pub avatar_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralInformation {
    pub name: String,
    pub surname: Option<String>,
    pub age: Option<i32>,
    pub religion: Option<String>,
    pub profession: Option<String>,
    pub race: Option<String>,
    pub birthplace: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub avatar_key: Option<String>,
    pub level: u8,
}

impl GeneralInformation {
    pub fn from_input(input: GeneralInformationInput, level: u8) -> Self {
        Self {
            name: input.name,
            surname: input.surname,
            age: input.age,
            religion: input.religion,
            profession: input.profession,
            race: input.race,
            birthplace: input.birthplace,
            height: input.height,
            weight: input.weight,
            avatar_key: input.avatar_key,
            level,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Injured,
    Incapacitated,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Base pool plus every level-up roll, before attribute bonuses
    pub raw_max_physical_health: i32,
    pub raw_max_mental_health: i32,
    pub max_physical_health: i32,
    pub max_mental_health: i32,
    pub current_physical_health: i32,
    pub current_mental_health: i32,
    pub serious_physical_injuries: u8,
    pub serious_trauma: u8,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatInformation {
    pub armour_mod: i32,
    pub armour_max_hp: i32,
    pub armour_current_hp: i32,
    pub grid_mod: i32,
    pub initiative_mod: i32,
    /// Metres per turn
    pub speed: i32,
    pub range_attack_mod: i32,
    pub melee_attack_mod: i32,
    pub grid_attack_mod: i32,
    pub range_defence_mod: i32,
    pub melee_defence_mod: i32,
    pub grid_defence_mod: i32,
    /// Kilograms
    pub carry_weight: f64,
}

/// Everything stored for a character, derived stats included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSheet {
    pub general_information: GeneralInformation,
    pub health: Health,
    pub combat_information: CombatInformation,
    pub innate_attributes: InnateAttributes,
    pub learned_skills: LearnedSkills,
}

#[derive(Debug, Clone, FromRow)]
pub struct CharacterRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub general_information: Json<GeneralInformation>,
    pub health: Json<Health>,
    pub combat_information: Json<CombatInformation>,
    pub innate_attributes: Json<InnateAttributes>,
    pub learned_skills: Json<LearnedSkills>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CharacterRow {
    pub fn sheet(&self) -> CharacterSheet {
        CharacterSheet {
            general_information: self.general_information.0.clone(),
            health: self.health.0,
            combat_information: self.combat_information.0,
            innate_attributes: self.innate_attributes.0,
            learned_skills: self.learned_skills.0.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Character {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub sheet: CharacterSheet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CharacterRow> for Character {
    fn from(row: CharacterRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            sheet: row.sheet(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Character with its progression, as returned by the detail endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CharacterDetail {
    #[serde(flatten)]
    pub character: Character,
    pub paths: Vec<CharacterPath>,
    pub features: Vec<CharacterFeature>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCharacterRequest {
    #[validate(nested)]
    pub general_information: GeneralInformationInput,
    #[validate(nested)]
    pub innate_attributes: InnateAttributes,
    #[validate(nested)]
    pub learned_skills: LearnedSkills,
    /// Optional starting path, taken at rank 1
    pub path_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCharacterRequest {
    #[validate(nested)]
    pub general_information: GeneralInformationInput,
    #[validate(nested)]
    pub innate_attributes: InnateAttributes,
    #[validate(nested)]
    pub learned_skills: LearnedSkills,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateHealthRequest {
    pub current_physical_health: Option<i32>,
    pub current_mental_health: Option<i32>,
    #[validate(range(max = 3))]
    pub serious_physical_injuries: Option<u8>,
    #[validate(range(max = 3))]
    pub serious_trauma: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SkillIncrease {
    pub skill: Skill,
    #[validate(range(min = 1, max = 2))]
    pub amount: u8,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LevelUpRequest {
    pub attribute_increase: Option<Attribute>,
    #[serde(default)]
    #[validate(nested)]
    pub skill_increases: Vec<SkillIncrease>,
    #[validate(range(min = 1, max = 6))]
    pub physical_health_roll: Option<u8>,
    #[validate(range(min = 1, max = 6))]
    pub mental_health_roll: Option<u8>,
    pub path_id: Uuid,
    pub feature_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_attributes(value: u8) -> InnateAttributes {
        InnateAttributes {
            intelligence: IntelligenceAttributes {
                investigation: value,
                memory: value,
                deduction: value,
            },
            wisdom: WisdomAttributes {
                sense: value,
                perception: value,
                insight: value,
            },
            personality: PersonalityAttributes {
                mentality: value,
                deception: value,
                persuasion: value,
            },
            strength: StrengthAttributes {
                athletics: value,
                resilience: value,
                brute_force: value,
            },
            dexterity: DexterityAttributes {
                manual: value,
                stealth: value,
                agility: value,
            },
            constitution: ConstitutionAttributes {
                resist_internal: value,
                resist_external: value,
                stamina: value,
            },
        }
    }

    #[test]
    fn test_attribute_total() {
        assert_eq!(flat_attributes(1).total(), 18);
        assert_eq!(flat_attributes(2).total(), 36);
    }

    #[test]
    fn test_attribute_get_mut_targets_the_right_field() {
        let mut attributes = flat_attributes(1);
        *attributes.get_mut(Attribute::BruteForce) += 2;
        assert_eq!(attributes.strength.brute_force, 3);
        assert_eq!(attributes.get(Attribute::BruteForce), 3);
        assert_eq!(attributes.total(), 20);
    }

    #[test]
    fn test_attribute_range_validation() {
        let mut attributes = flat_attributes(1);
        assert!(attributes.validate().is_ok());

        attributes.dexterity.agility = 6;
        assert!(attributes.validate().is_err());

        attributes.dexterity.agility = 0;
        assert!(attributes.validate().is_err());
    }

    #[test]
    fn test_skill_total_and_lookup() {
        let mut skills = GeneralSkills::default();
        *skills.get_mut(Skill::Aim) = 3;
        *skills.get_mut(Skill::ManipulationNegotiation) = 2;
        assert_eq!(skills.total(), 5);
        assert_eq!(skills.get(Skill::Aim), 3);
        assert_eq!(skills.manipulation_negotiation, 2);
    }

    #[test]
    fn test_skill_names_are_snake_case() {
        let json = serde_json::to_string(&Skill::GeneralKnowledge).unwrap();
        assert_eq!(json, "\"general_knowledge\"");

        let attribute: Attribute = serde_json::from_str("\"brute_force\"").unwrap();
        assert_eq!(attribute, Attribute::BruteForce);
    }

    #[test]
    fn test_too_many_special_skills_rejected() {
        let skills = LearnedSkills {
            general_skills: GeneralSkills::default(),
            special_skills: vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into()],
        };
        assert!(skills.validate().is_err());
    }

    #[test]
    fn test_level_up_request_defaults() {
        let json = r#"{"path_id": "7f1c2a4e-6d0b-4f58-9a53-1d2e3f4a5b6c"}"#;
        let request: LevelUpRequest = serde_json::from_str(json).unwrap();
        assert!(request.skill_increases.is_empty());
        assert!(request.attribute_increase.is_none());
        assert!(request.physical_health_roll.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_level_up_request_rejects_out_of_range_roll() {
        let json = r#"{"path_id": "7f1c2a4e-6d0b-4f58-9a53-1d2e3f4a5b6c", "physical_health_roll": 7}"#;
        let request: LevelUpRequest = serde_json::from_str(json).unwrap();
        assert!(request.validate().is_err());
    }
}
