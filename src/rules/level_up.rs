use std::collections::HashSet;

use serde::Serialize;

use crate::models::{
    CharacterFeature, CharacterPath, CharacterSheet, Feature, LevelUpRequest, Path,
};

use super::{
    character::{check_attributes, check_skills, derive_health, max_health},
    combat::{derive_combat_information, EquipmentBonus},
    RuleError, HEALTH_DIE, MAX_LEVEL, MAX_PATHS, MAX_PATH_RANK, SKILL_POINTS_PER_LEVEL,
};

/// Level-up health die results, supplied by the player or rolled by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthRolls {
    pub physical: u8,
    pub mental: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureGradeChange {
    pub feature_id: uuid::Uuid,
    pub name: String,
    pub grade: i32,
    pub newly_acquired: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelUpOutcome {
    pub sheet: CharacterSheet,
    /// The advanced path with its new rank
    pub path: CharacterPath,
    pub new_path: bool,
    pub feature: Option<FeatureGradeChange>,
    pub rolls: HealthRolls,
}

/// Check a level-up request against the character's current state and
/// produce the resulting sheet and progression changes.
///
/// `path` is the path named by the request and `feature` the feature named
/// by `request.feature_id`, both already loaded by the caller.
pub fn parse_level_up(
    sheet: &CharacterSheet,
    paths: &[CharacterPath],
    features: &[CharacterFeature],
    path: &Path,
    feature: Option<&Feature>,
    request: &LevelUpRequest,
    rolls: HealthRolls,
) -> Result<LevelUpOutcome, RuleError> {
    let level = sheet.general_information.level;
    if level >= MAX_LEVEL {
        return Err(RuleError::MaxLevelReached(MAX_LEVEL));
    }
    let new_level = level + 1;

    let mut attributes = sheet.innate_attributes;
    if let Some(attribute) = request.attribute_increase {
        let value = attributes.get_mut(attribute);
        *value = value.saturating_add(1);
    }
    check_attributes(&attributes)?;

    let mut skills = sheet.learned_skills.clone();
    let mut increased = HashSet::new();
    let mut spent = 0u32;
    for increase in &request.skill_increases {
        if !increased.insert(increase.skill) {
            return Err(RuleError::DuplicateSkillIncrease(increase.skill));
        }
        spent += increase.amount as u32;
        let value = skills.general_skills.get_mut(increase.skill);
        *value = value.saturating_add(increase.amount);
    }
    if spent > SKILL_POINTS_PER_LEVEL {
        return Err(RuleError::SkillIncreaseExceeded {
            spent,
            allowed: SKILL_POINTS_PER_LEVEL,
        });
    }
    check_skills(&skills, new_level)?;

    for roll in [rolls.physical, rolls.mental] {
        if !(1..=HEALTH_DIE).contains(&roll) {
            return Err(RuleError::InvalidHealthRoll {
                roll,
                die: HEALTH_DIE,
            });
        }
    }

    let previous = &sheet.health;
    let raw_physical = previous.raw_max_physical_health + rolls.physical as i32;
    let raw_mental = previous.raw_max_mental_health + rolls.mental as i32;
    let (max_physical, max_mental) = max_health(raw_physical, raw_mental, &attributes);
    // current health rises by however much the maximum rose
    let health = derive_health(
        raw_physical,
        raw_mental,
        &attributes,
        previous.current_physical_health + (max_physical - previous.max_physical_health),
        previous.current_mental_health + (max_mental - previous.max_mental_health),
        previous.serious_physical_injuries,
        previous.serious_trauma,
    );

    let combat_information = derive_combat_information(
        &attributes,
        &skills.general_skills,
        EquipmentBonus::of(&sheet.combat_information),
        Some(sheet.combat_information.armour_current_hp),
    );

    let (advanced, new_path) = advance_path(paths, path)?;
    let mut updated_paths: Vec<CharacterPath> = paths
        .iter()
        .filter(|p| p.path_id != advanced.path_id)
        .cloned()
        .collect();
    updated_paths.push(advanced.clone());

    let ranks: i32 = updated_paths.iter().map(|p| p.rank).sum();
    if ranks > new_level as i32 {
        return Err(RuleError::PathRanksExceedLevel {
            ranks,
            level: new_level,
        });
    }

    let feature = match feature {
        Some(feature) => Some(advance_feature(
            &updated_paths,
            features,
            feature,
            new_level,
        )?),
        None => None,
    };

    let mut general_information = sheet.general_information.clone();
    general_information.level = new_level;

    Ok(LevelUpOutcome {
        sheet: CharacterSheet {
            general_information,
            health,
            combat_information,
            innate_attributes: attributes,
            learned_skills: skills,
        },
        path: advanced,
        new_path,
        feature,
        rolls,
    })
}

fn advance_path(
    paths: &[CharacterPath],
    path: &Path,
) -> Result<(CharacterPath, bool), RuleError> {
    match paths.iter().find(|p| p.path_id == path.id) {
        Some(existing) => {
            let max = path.max_rank.min(MAX_PATH_RANK);
            if existing.rank >= max {
                return Err(RuleError::PathRankExceeded {
                    path: path.name.clone(),
                    max,
                });
            }
            Ok((
                CharacterPath {
                    rank: existing.rank + 1,
                    ..existing.clone()
                },
                false,
            ))
        }
        None => {
            if paths.len() >= MAX_PATHS {
                return Err(RuleError::TooManyPaths(MAX_PATHS));
            }
            Ok((
                CharacterPath {
                    path_id: path.id,
                    name: path.name.clone(),
                    rank: 1,
                },
                true,
            ))
        }
    }
}

fn advance_feature(
    paths: &[CharacterPath],
    features: &[CharacterFeature],
    feature: &Feature,
    new_level: u8,
) -> Result<FeatureGradeChange, RuleError> {
    let eligible = paths
        .iter()
        .any(|p| feature.path_ids.contains(&p.path_id) && p.rank >= feature.min_path_rank);
    if !eligible {
        return Err(RuleError::FeatureNotEligible {
            feature: feature.name.clone(),
            required_rank: feature.min_path_rank,
        });
    }

    let current = features.iter().find(|f| f.feature_id == feature.id);
    let grade = current.map_or(1, |f| f.grade + 1);
    if grade > feature.max_grade {
        return Err(RuleError::FeatureMaxGrade {
            feature: feature.name.clone(),
            max_grade: feature.max_grade,
        });
    }

    let grades: i32 = features.iter().map(|f| f.grade).sum::<i32>() + 1;
    if grades > new_level as i32 {
        return Err(RuleError::FeatureGradesExceedLevel {
            grades,
            level: new_level,
        });
    }

    Ok(FeatureGradeChange {
        feature_id: feature.id,
        name: feature.name.clone(),
        grade,
        newly_acquired: current.is_none(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attribute, Skill, SkillIncrease};
    use crate::rules::{compute_character_request_data, fixtures, MAX_ATTRIBUTE_TOTAL};
    use chrono::Utc;
    use tokio_test::{assert_err, assert_ok};
    use uuid::Uuid;

    fn path(name: &str) -> Path {
        Path {
            id: Uuid::new_v4(),
            name: name.to_string(),
            base_feature: format!("{} basics", name),
            description: None,
            max_rank: 10,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn feature(name: &str, paths: &[&Path], min_path_rank: i32, max_grade: i32) -> Feature {
        Feature {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            min_path_rank,
            max_grade,
            examples: Vec::new(),
            path_ids: paths.iter().map(|p| p.id).collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request(path: &Path) -> LevelUpRequest {
        LevelUpRequest {
            attribute_increase: None,
            skill_increases: Vec::new(),
            physical_health_roll: None,
            mental_health_roll: None,
            path_id: path.id,
            feature_id: None,
        }
    }

    const ROLLS: HealthRolls = HealthRolls {
        physical: 4,
        mental: 2,
    };

    fn sheet() -> CharacterSheet {
        compute_character_request_data(&fixtures::creation_request()).unwrap()
    }

    #[test]
    fn test_level_up_grows_health_and_level() {
        let sheet = sheet();
        let gunner = path("Gunner");

        let outcome = assert_ok!(parse_level_up(
            &sheet,
            &[],
            &[],
            &gunner,
            None,
            &request(&gunner),
            ROLLS
        ));

        assert_eq!(outcome.sheet.general_information.level, 2);
        assert_eq!(outcome.sheet.health.raw_max_physical_health, 14);
        assert_eq!(outcome.sheet.health.max_physical_health, 24);
        assert_eq!(outcome.sheet.health.current_physical_health, 24);
        assert_eq!(outcome.sheet.health.max_mental_health, 22);
        assert!(outcome.new_path);
        assert_eq!(outcome.path.rank, 1);
        assert!(outcome.feature.is_none());
    }

    #[test]
    fn test_level_up_keeps_damage_taken() {
        let mut sheet = sheet();
        sheet.health.current_physical_health = 5;
        let gunner = path("Gunner");

        let outcome = parse_level_up(&sheet, &[], &[], &gunner, None, &request(&gunner), ROLLS)
            .unwrap();
        assert_eq!(outcome.sheet.health.current_physical_health, 9);
    }

    #[test]
    fn test_attribute_increase_respects_cap() {
        let mut sheet = sheet();
        for attribute in Attribute::ALL {
            *sheet.innate_attributes.get_mut(attribute) = 2;
        }
        assert_eq!(sheet.innate_attributes.total(), MAX_ATTRIBUTE_TOTAL);
        let gunner = path("Gunner");

        let mut req = request(&gunner);
        req.attribute_increase = Some(Attribute::Agility);
        let err = assert_err!(parse_level_up(&sheet, &[], &[], &gunner, None, &req, ROLLS));
        assert_eq!(err, RuleError::AttributeCapExceeded { total: 37, cap: 36 });
    }

    #[test]
    fn test_attribute_increase_updates_derived_stats() {
        let sheet = sheet();
        let gunner = path("Gunner");
        let mut req = request(&gunner);
        req.attribute_increase = Some(Attribute::Agility);

        let outcome = assert_ok!(parse_level_up(&sheet, &[], &[], &gunner, None, &req, ROLLS));
        assert_eq!(outcome.sheet.innate_attributes.dexterity.agility, 5);
        assert_eq!(outcome.sheet.combat_information.speed, 15);
        assert_eq!(outcome.sheet.combat_information.initiative_mod, 6);
    }

    #[test]
    fn test_skill_increases_are_limited_per_level() {
        let sheet = sheet();
        let gunner = path("Gunner");

        let mut req = request(&gunner);
        req.skill_increases = vec![
            SkillIncrease {
                skill: Skill::Aim,
                amount: 1,
            },
            SkillIncrease {
                skill: Skill::Medicine,
                amount: 2,
            },
        ];
        let err = assert_err!(parse_level_up(&sheet, &[], &[], &gunner, None, &req, ROLLS));
        assert_eq!(
            err,
            RuleError::SkillIncreaseExceeded {
                spent: 3,
                allowed: 2
            }
        );

        req.skill_increases = vec![
            SkillIncrease {
                skill: Skill::Aim,
                amount: 1,
            },
            SkillIncrease {
                skill: Skill::Aim,
                amount: 1,
            },
        ];
        let err = assert_err!(parse_level_up(&sheet, &[], &[], &gunner, None, &req, ROLLS));
        assert_eq!(err, RuleError::DuplicateSkillIncrease(Skill::Aim));

        req.skill_increases = vec![SkillIncrease {
            skill: Skill::Aim,
            amount: 2,
        }];
        let outcome = assert_ok!(parse_level_up(&sheet, &[], &[], &gunner, None, &req, ROLLS));
        assert_eq!(outcome.sheet.learned_skills.general_skills.aim, 5);
        assert_eq!(outcome.sheet.combat_information.range_attack_mod, 6);
    }

    #[test]
    fn test_skill_cannot_pass_five() {
        let mut sheet = sheet();
        sheet.learned_skills.general_skills.aim = 4;
        let gunner = path("Gunner");
        let mut req = request(&gunner);
        req.skill_increases = vec![SkillIncrease {
            skill: Skill::Aim,
            amount: 2,
        }];

        let err = assert_err!(parse_level_up(&sheet, &[], &[], &gunner, None, &req, ROLLS));
        assert!(matches!(err, RuleError::SkillOutOfRange { skill: Skill::Aim, .. }));
    }

    #[test]
    fn test_invalid_roll_rejected() {
        let sheet = sheet();
        let gunner = path("Gunner");
        let rolls = HealthRolls {
            physical: 0,
            mental: 3,
        };
        let err = assert_err!(parse_level_up(
            &sheet,
            &[],
            &[],
            &gunner,
            None,
            &request(&gunner),
            rolls
        ));
        assert_eq!(err, RuleError::InvalidHealthRoll { roll: 0, die: 6 });
    }

    #[test]
    fn test_max_level() {
        let mut sheet = sheet();
        sheet.general_information.level = MAX_LEVEL;
        let gunner = path("Gunner");
        let err = assert_err!(parse_level_up(
            &sheet,
            &[],
            &[],
            &gunner,
            None,
            &request(&gunner),
            ROLLS
        ));
        assert_eq!(err, RuleError::MaxLevelReached(MAX_LEVEL));
    }

    #[test]
    fn test_existing_path_gains_rank() {
        let mut sheet = sheet();
        sheet.general_information.level = 3;
        let gunner = path("Gunner");
        let held = vec![CharacterPath {
            path_id: gunner.id,
            name: gunner.name.clone(),
            rank: 3,
        }];

        let outcome = assert_ok!(parse_level_up(
            &sheet,
            &held,
            &[],
            &gunner,
            None,
            &request(&gunner),
            ROLLS
        ));
        assert_eq!(outcome.path.rank, 4);
        assert!(!outcome.new_path);
    }

    #[test]
    fn test_path_rank_cap() {
        let mut sheet = sheet();
        sheet.general_information.level = 5;
        let mut gunner = path("Gunner");
        gunner.max_rank = 2;
        let held = vec![CharacterPath {
            path_id: gunner.id,
            name: gunner.name.clone(),
            rank: 2,
        }];

        let err = assert_err!(parse_level_up(
            &sheet,
            &held,
            &[],
            &gunner,
            None,
            &request(&gunner),
            ROLLS
        ));
        assert_eq!(
            err,
            RuleError::PathRankExceeded {
                path: "Gunner".to_string(),
                max: 2
            }
        );
    }

    #[test]
    fn test_path_limit() {
        let mut sheet = sheet();
        sheet.general_information.level = 5;
        let held: Vec<CharacterPath> = ["A", "B", "C"]
            .iter()
            .map(|n| CharacterPath {
                path_id: Uuid::new_v4(),
                name: n.to_string(),
                rank: 1,
            })
            .collect();
        let fourth = path("Fourth");

        let err = assert_err!(parse_level_up(
            &sheet,
            &held,
            &[],
            &fourth,
            None,
            &request(&fourth),
            ROLLS
        ));
        assert_eq!(err, RuleError::TooManyPaths(MAX_PATHS));
    }

    #[test]
    fn test_path_ranks_bounded_by_level() {
        let sheet = sheet();
        let gunner = path("Gunner");
        // level 1 character already holding two ranks is inconsistent
        let held = vec![CharacterPath {
            path_id: gunner.id,
            name: gunner.name.clone(),
            rank: 2,
        }];

        let err = assert_err!(parse_level_up(
            &sheet,
            &held,
            &[],
            &gunner,
            None,
            &request(&gunner),
            ROLLS
        ));
        assert_eq!(err, RuleError::PathRanksExceedLevel { ranks: 3, level: 2 });
    }

    #[test]
    fn test_feature_unlocked_by_new_rank() {
        let sheet = sheet();
        let gunner = path("Gunner");
        let quickdraw = feature("Quickdraw", &[&gunner], 1, 3);
        let mut req = request(&gunner);
        req.feature_id = Some(quickdraw.id);

        let outcome = assert_ok!(parse_level_up(
            &sheet,
            &[],
            &[],
            &gunner,
            Some(&quickdraw),
            &req,
            ROLLS
        ));
        let change = outcome.feature.unwrap();
        assert_eq!(change.grade, 1);
        assert!(change.newly_acquired);
    }

    #[test]
    fn test_feature_requires_rank_in_linked_path() {
        let sheet = sheet();
        let gunner = path("Gunner");
        let medic = path("Medic");
        let triage = feature("Triage", &[&medic], 1, 3);
        let mut req = request(&gunner);
        req.feature_id = Some(triage.id);

        let err = assert_err!(parse_level_up(
            &sheet,
            &[],
            &[],
            &gunner,
            Some(&triage),
            &req,
            ROLLS
        ));
        assert_eq!(
            err,
            RuleError::FeatureNotEligible {
                feature: "Triage".to_string(),
                required_rank: 1
            }
        );
    }

    #[test]
    fn test_feature_grade_limits() {
        let mut sheet = sheet();
        sheet.general_information.level = 4;
        let gunner = path("Gunner");
        let quickdraw = feature("Quickdraw", &[&gunner], 1, 2);
        let held_paths = vec![CharacterPath {
            path_id: gunner.id,
            name: gunner.name.clone(),
            rank: 2,
        }];
        let held_features = vec![CharacterFeature {
            feature_id: quickdraw.id,
            name: quickdraw.name.clone(),
            grade: 2,
        }];
        let mut req = request(&gunner);
        req.feature_id = Some(quickdraw.id);

        let err = assert_err!(parse_level_up(
            &sheet,
            &held_paths,
            &held_features,
            &gunner,
            Some(&quickdraw),
            &req,
            ROLLS
        ));
        assert_eq!(
            err,
            RuleError::FeatureMaxGrade {
                feature: "Quickdraw".to_string(),
                max_grade: 2
            }
        );
    }

    #[test]
    fn test_feature_grades_bounded_by_level() {
        let mut sheet = sheet();
        sheet.general_information.level = 2;
        let gunner = path("Gunner");
        let quickdraw = feature("Quickdraw", &[&gunner], 1, 5);
        let steady = feature("Steady Aim", &[&gunner], 1, 5);
        let held_paths = vec![CharacterPath {
            path_id: gunner.id,
            name: gunner.name.clone(),
            rank: 1,
        }];
        let held_features = vec![CharacterFeature {
            feature_id: steady.id,
            name: steady.name.clone(),
            grade: 3,
        }];
        let mut req = request(&gunner);
        req.feature_id = Some(quickdraw.id);

        let err = assert_err!(parse_level_up(
            &sheet,
            &held_paths,
            &held_features,
            &gunner,
            Some(&quickdraw),
            &req,
            ROLLS
        ));
        assert_eq!(err, RuleError::FeatureGradesExceedLevel { grades: 4, level: 3 });
    }
}
