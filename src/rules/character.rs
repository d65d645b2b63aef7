use std::collections::HashSet;

use crate::models::{
    Attribute, CharacterSheet, CreateCharacterRequest, GeneralInformation, Health, HealthStatus,
    InnateAttributes, LearnedSkills, Skill, UpdateCharacterRequest, UpdateHealthRequest,
};

use super::{
    combat::{derive_combat_information, EquipmentBonus},
    RuleError, BASE_MENTAL_HEALTH, BASE_PHYSICAL_HEALTH, BASE_SKILL_POINTS,
    HEALTH_PER_ATTRIBUTE_POINT, MAX_ATTRIBUTE_TOTAL, MAX_ATTRIBUTE_VALUE, MAX_SERIOUS_INJURIES,
    MAX_SERIOUS_TRAUMA, MAX_SKILL_VALUE, MAX_SPECIAL_SKILLS, MAX_SPECIAL_SKILL_LENGTH,
    SKILL_POINTS_PER_LEVEL,
};

/// Total general skill points a character may have spent at `level`
pub fn skill_point_cap(level: u8) -> u32 {
    BASE_SKILL_POINTS + SKILL_POINTS_PER_LEVEL * (level.max(1) as u32 - 1)
}

pub fn check_attributes(attributes: &InnateAttributes) -> Result<(), RuleError> {
    for attribute in Attribute::ALL {
        let value = attributes.get(attribute);
        if !(1..=MAX_ATTRIBUTE_VALUE).contains(&value) {
            return Err(RuleError::AttributeOutOfRange {
                attribute,
                value,
                max: MAX_ATTRIBUTE_VALUE,
            });
        }
    }

    let total = attributes.total();
    if total > MAX_ATTRIBUTE_TOTAL {
        return Err(RuleError::AttributeCapExceeded {
            total,
            cap: MAX_ATTRIBUTE_TOTAL,
        });
    }
    Ok(())
}

pub fn check_skills(skills: &LearnedSkills, level: u8) -> Result<(), RuleError> {
    for skill in Skill::ALL {
        let value = skills.general_skills.get(skill);
        if value > MAX_SKILL_VALUE {
            return Err(RuleError::SkillOutOfRange {
                skill,
                value,
                max: MAX_SKILL_VALUE,
            });
        }
    }

    let total = skills.general_skills.total();
    let cap = skill_point_cap(level);
    if total > cap {
        return Err(RuleError::SkillCapExceeded { total, cap, level });
    }

    if skills.special_skills.len() > MAX_SPECIAL_SKILLS {
        return Err(RuleError::InvalidSpecialSkill(format!(
            "at most {} special skills are allowed",
            MAX_SPECIAL_SKILLS
        )));
    }
    let mut seen = HashSet::new();
    for name in &skills.special_skills {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.chars().count() > MAX_SPECIAL_SKILL_LENGTH {
            return Err(RuleError::InvalidSpecialSkill(format!(
                "'{}' must be 1 to {} characters",
                name, MAX_SPECIAL_SKILL_LENGTH
            )));
        }
        if !seen.insert(trimmed.to_lowercase()) {
            return Err(RuleError::InvalidSpecialSkill(format!(
                "'{}' is listed twice",
                trimmed
            )));
        }
    }
    Ok(())
}

/// Maximum (physical, mental) health for the given raw pools
pub fn max_health(raw_physical: i32, raw_mental: i32, attributes: &InnateAttributes) -> (i32, i32) {
    let physical_points =
        attributes.constitution.stamina as i32 + attributes.strength.resilience as i32;
    let mental_points =
        attributes.personality.mentality as i32 + attributes.wisdom.insight as i32;
    (
        raw_physical + HEALTH_PER_ATTRIBUTE_POINT * physical_points,
        raw_mental + HEALTH_PER_ATTRIBUTE_POINT * mental_points,
    )
}

pub fn health_status(health: &Health) -> HealthStatus {
    if health.current_physical_health <= -health.max_physical_health
        || health.serious_physical_injuries >= MAX_SERIOUS_INJURIES
    {
        HealthStatus::Dead
    } else if health.current_physical_health <= 0
        || health.current_mental_health <= 0
        || health.serious_trauma >= MAX_SERIOUS_TRAUMA
    {
        HealthStatus::Incapacitated
    } else if health.current_physical_health < health.max_physical_health
        || health.current_mental_health < health.max_mental_health
        || health.serious_physical_injuries > 0
        || health.serious_trauma > 0
    {
        HealthStatus::Injured
    } else {
        HealthStatus::Healthy
    }
}

/// Build a health block, clamping current values into `-max..=max`
pub(crate) fn derive_health(
    raw_physical: i32,
    raw_mental: i32,
    attributes: &InnateAttributes,
    current_physical: i32,
    current_mental: i32,
    serious_physical_injuries: u8,
    serious_trauma: u8,
) -> Health {
    let (max_physical, max_mental) = max_health(raw_physical, raw_mental, attributes);
    let mut health = Health {
        raw_max_physical_health: raw_physical,
        raw_max_mental_health: raw_mental,
        max_physical_health: max_physical,
        max_mental_health: max_mental,
        current_physical_health: current_physical.clamp(-max_physical, max_physical),
        current_mental_health: current_mental.clamp(-max_mental, max_mental),
        serious_physical_injuries: serious_physical_injuries.min(MAX_SERIOUS_INJURIES),
        serious_trauma: serious_trauma.min(MAX_SERIOUS_TRAUMA),
        status: HealthStatus::Healthy,
    };
    health.status = health_status(&health);
    health
}

/// Turn a creation request into a complete level-1 character sheet
pub fn compute_character_request_data(
    request: &CreateCharacterRequest,
) -> Result<CharacterSheet, RuleError> {
    let level = 1;
    check_attributes(&request.innate_attributes)?;
    check_skills(&request.learned_skills, level)?;

    let attributes = request.innate_attributes;
    let (max_physical, max_mental) =
        max_health(BASE_PHYSICAL_HEALTH, BASE_MENTAL_HEALTH, &attributes);
    let health = derive_health(
        BASE_PHYSICAL_HEALTH,
        BASE_MENTAL_HEALTH,
        &attributes,
        max_physical,
        max_mental,
        0,
        0,
    );
    let combat_information = derive_combat_information(
        &attributes,
        &request.learned_skills.general_skills,
        EquipmentBonus::default(),
        None,
    );

    Ok(CharacterSheet {
        general_information: GeneralInformation::from_input(
            request.general_information.clone(),
            level,
        ),
        health,
        combat_information,
        innate_attributes: attributes,
        learned_skills: request.learned_skills.clone(),
    })
}

/// Replace the editable parts of a sheet and recompute everything derived.
///
/// Level, health rolls, current health and armour damage carry over.
pub fn apply_sheet_update(
    current: &CharacterSheet,
    request: UpdateCharacterRequest,
) -> Result<CharacterSheet, RuleError> {
    let level = current.general_information.level;
    check_attributes(&request.innate_attributes)?;
    check_skills(&request.learned_skills, level)?;

    let attributes = request.innate_attributes;
    let previous = &current.health;
    let health = derive_health(
        previous.raw_max_physical_health,
        previous.raw_max_mental_health,
        &attributes,
        previous.current_physical_health,
        previous.current_mental_health,
        previous.serious_physical_injuries,
        previous.serious_trauma,
    );
    let combat_information = derive_combat_information(
        &attributes,
        &request.learned_skills.general_skills,
        EquipmentBonus::of(&current.combat_information),
        Some(current.combat_information.armour_current_hp),
    );

    Ok(CharacterSheet {
        general_information: GeneralInformation::from_input(request.general_information, level),
        health,
        combat_information,
        innate_attributes: attributes,
        learned_skills: request.learned_skills,
    })
}

/// Apply damage/healing and injury changes; omitted fields keep their value
pub fn apply_health_update(sheet: &CharacterSheet, request: &UpdateHealthRequest) -> Health {
    let previous = &sheet.health;
    derive_health(
        previous.raw_max_physical_health,
        previous.raw_max_mental_health,
        &sheet.innate_attributes,
        request
            .current_physical_health
            .unwrap_or(previous.current_physical_health),
        request
            .current_mental_health
            .unwrap_or(previous.current_mental_health),
        request
            .serious_physical_injuries
            .unwrap_or(previous.serious_physical_injuries),
        request.serious_trauma.unwrap_or(previous.serious_trauma),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_skill_point_cap_grows_with_level() {
        assert_eq!(skill_point_cap(1), 10);
        assert_eq!(skill_point_cap(2), 12);
        assert_eq!(skill_point_cap(20), 48);
        // level 0 never happens but must not underflow
        assert_eq!(skill_point_cap(0), 10);
    }

    #[test]
    fn test_compute_character_request_data() {
        let request = fixtures::creation_request();
        let sheet = assert_ok!(compute_character_request_data(&request));

        assert_eq!(sheet.general_information.level, 1);
        assert_eq!(sheet.general_information.name, "Mara");
        assert_eq!(sheet.health.raw_max_physical_health, 10);
        assert_eq!(sheet.health.max_physical_health, 20);
        assert_eq!(sheet.health.max_mental_health, 20);
        assert_eq!(sheet.health.current_physical_health, 20);
        assert_eq!(sheet.health.current_mental_health, 20);
        assert_eq!(sheet.health.status, HealthStatus::Healthy);
        assert_eq!(sheet.combat_information.speed, 14);
    }

    #[test]
    fn test_attribute_total_of_36_is_accepted() {
        let mut request = fixtures::creation_request();
        request.innate_attributes = fixtures::base_attributes();
        for attribute in Attribute::ALL {
            *request.innate_attributes.get_mut(attribute) = 2;
        }
        assert_eq!(request.innate_attributes.total(), 36);
        assert_ok!(compute_character_request_data(&request));
    }

    #[test]
    fn test_attribute_total_above_36_is_rejected() {
        let mut request = fixtures::creation_request();
        for attribute in Attribute::ALL {
            *request.innate_attributes.get_mut(attribute) = 2;
        }
        *request.innate_attributes.get_mut(Attribute::Memory) = 3;

        let err = assert_err!(compute_character_request_data(&request));
        assert_eq!(err, RuleError::AttributeCapExceeded { total: 37, cap: 36 });
    }

    #[test]
    fn test_attribute_out_of_range_is_rejected() {
        let mut attributes = fixtures::base_attributes();
        attributes.wisdom.sense = 0;
        let err = assert_err!(check_attributes(&attributes));
        assert!(matches!(
            err,
            RuleError::AttributeOutOfRange {
                attribute: Attribute::Sense,
                ..
            }
        ));
    }

    #[test]
    fn test_skill_points_above_level_cap_are_rejected() {
        let mut request = fixtures::creation_request();
        request.learned_skills.general_skills.science = 3;
        assert_eq!(request.learned_skills.general_skills.total(), 11);

        let err = assert_err!(compute_character_request_data(&request));
        assert_eq!(
            err,
            RuleError::SkillCapExceeded {
                total: 11,
                cap: 10,
                level: 1
            }
        );
    }

    #[test]
    fn test_duplicate_special_skills_are_rejected() {
        let mut skills = LearnedSkills::default();
        skills.special_skills = vec!["Lockpicking".into(), "lockpicking ".into()];
        assert_err!(check_skills(&skills, 1));

        skills.special_skills = vec!["Lockpicking".into(), "   ".into()];
        assert_err!(check_skills(&skills, 1));

        skills.special_skills = vec!["Lockpicking".into(), "Falconry".into()];
        assert_ok!(check_skills(&skills, 1));
    }

    #[test]
    fn test_update_keeps_level_and_damage() {
        let request = fixtures::creation_request();
        let mut sheet = compute_character_request_data(&request).unwrap();
        sheet.general_information.level = 3;
        sheet.health.current_physical_health = 12;

        let mut update = UpdateCharacterRequest {
            general_information: fixtures::general_information(),
            innate_attributes: request.innate_attributes,
            learned_skills: request.learned_skills.clone(),
        };
        // level 3 allows 14 skill points
        update.learned_skills.general_skills.medicine = 5;
        update.innate_attributes.constitution.stamina = 3;

        let updated = assert_ok!(apply_sheet_update(&sheet, update));
        assert_eq!(updated.general_information.level, 3);
        assert_eq!(updated.health.max_physical_health, 22);
        assert_eq!(updated.health.current_physical_health, 12);
        assert_eq!(updated.health.status, HealthStatus::Injured);
    }

    #[test]
    fn test_update_clamps_current_health_to_new_max() {
        let request = fixtures::creation_request();
        let sheet = compute_character_request_data(&request).unwrap();

        let mut update = UpdateCharacterRequest {
            general_information: fixtures::general_information(),
            innate_attributes: request.innate_attributes,
            learned_skills: request.learned_skills.clone(),
        };
        update.innate_attributes.strength.resilience = 1;

        let updated = assert_ok!(apply_sheet_update(&sheet, update));
        assert_eq!(updated.health.max_physical_health, 16);
        assert_eq!(updated.health.current_physical_health, 16);
    }

    #[test]
    fn test_health_status_transitions() {
        let sheet = compute_character_request_data(&fixtures::creation_request()).unwrap();

        let hurt = apply_health_update(
            &sheet,
            &UpdateHealthRequest {
                current_physical_health: Some(5),
                ..Default::default()
            },
        );
        assert_eq!(hurt.status, HealthStatus::Injured);
        assert_eq!(hurt.current_mental_health, 20);

        let down = apply_health_update(
            &sheet,
            &UpdateHealthRequest {
                current_mental_health: Some(0),
                ..Default::default()
            },
        );
        assert_eq!(down.status, HealthStatus::Incapacitated);

        let dead = apply_health_update(
            &sheet,
            &UpdateHealthRequest {
                current_physical_health: Some(-50),
                ..Default::default()
            },
        );
        assert_eq!(dead.current_physical_health, -20);
        assert_eq!(dead.status, HealthStatus::Dead);

        let maimed = apply_health_update(
            &sheet,
            &UpdateHealthRequest {
                serious_physical_injuries: Some(3),
                ..Default::default()
            },
        );
        assert_eq!(maimed.status, HealthStatus::Dead);

        let shaken = apply_health_update(
            &sheet,
            &UpdateHealthRequest {
                serious_trauma: Some(2),
                ..Default::default()
            },
        );
        assert_eq!(shaken.status, HealthStatus::Injured);

        let broken = apply_health_update(
            &sheet,
            &UpdateHealthRequest {
                serious_trauma: Some(3),
                ..Default::default()
            },
        );
        assert_eq!(broken.status, HealthStatus::Incapacitated);
    }

    #[test]
    fn test_healing_cannot_exceed_max() {
        let sheet = compute_character_request_data(&fixtures::creation_request()).unwrap();
        let healed = apply_health_update(
            &sheet,
            &UpdateHealthRequest {
                current_physical_health: Some(99),
                ..Default::default()
            },
        );
        assert_eq!(healed.current_physical_health, 20);
        assert_eq!(healed.status, HealthStatus::Healthy);
    }
}
