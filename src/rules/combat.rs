use crate::models::{CharacterSheet, CombatInformation, GeneralSkills, InnateAttributes};

use super::{BASE_CARRY_WEIGHT, BASE_SPEED, CARRY_WEIGHT_PER_POINT};

/// Bonuses contributed by everything the character has equipped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EquipmentBonus {
    pub armour_mod: i32,
    pub armour_max_hp: i32,
    pub grid_mod: i32,
}

impl EquipmentBonus {
    /// Bonus already baked into a stored combat block
    pub fn of(combat: &CombatInformation) -> Self {
        Self {
            armour_mod: combat.armour_mod,
            armour_max_hp: combat.armour_max_hp,
            grid_mod: combat.grid_mod,
        }
    }
}

/// Maximum carried weight in kilograms
pub fn carry_weight(attributes: &InnateAttributes) -> f64 {
    let points = attributes.strength.brute_force as f64 + attributes.strength.resilience as f64;
    BASE_CARRY_WEIGHT + CARRY_WEIGHT_PER_POINT * points
}

/// Derive attack/defence modifiers and armour state.
///
/// `armour_current_hp` keeps damaged armour damaged across recomputes; `None`
/// means the armour is intact. The value is clamped into `0..=armour_max_hp`.
pub fn derive_combat_information(
    attributes: &InnateAttributes,
    skills: &GeneralSkills,
    equipment: EquipmentBonus,
    armour_current_hp: Option<i32>,
) -> CombatInformation {
    let a = |v: u8| v as i32;

    let agility = a(attributes.dexterity.agility);
    let armour_max_hp = equipment.armour_max_hp.max(0);
    let armour_current_hp = armour_current_hp
        .unwrap_or(armour_max_hp)
        .clamp(0, armour_max_hp);

    CombatInformation {
        armour_mod: equipment.armour_mod,
        armour_max_hp,
        armour_current_hp,
        grid_mod: equipment.grid_mod,
        initiative_mod: agility + a(attributes.wisdom.perception),
        speed: BASE_SPEED + agility,
        range_attack_mod: a(attributes.dexterity.manual) + a(skills.aim),
        melee_attack_mod: a(attributes.strength.brute_force) + a(skills.melee),
        grid_attack_mod: a(attributes.intelligence.deduction) + a(skills.grid),
        range_defence_mod: agility + a(skills.acrobatics) + equipment.armour_mod,
        melee_defence_mod: a(attributes.strength.athletics) + a(skills.melee) + equipment.armour_mod,
        grid_defence_mod: a(attributes.personality.mentality) + a(skills.grid) + equipment.grid_mod,
        carry_weight: carry_weight(attributes),
    }
}

/// Recompute a sheet's combat block after its equipment changed.
///
/// Armour damage carries over: current armour hp moves by the same amount as
/// the maximum, so newly equipped armour arrives intact.
pub fn reequip(sheet: &CharacterSheet, equipment: EquipmentBonus) -> CombatInformation {
    let previous = &sheet.combat_information;
    let armour_current_hp =
        previous.armour_current_hp + (equipment.armour_max_hp - previous.armour_max_hp);
    derive_combat_information(
        &sheet.innate_attributes,
        &sheet.learned_skills.general_skills,
        equipment,
        Some(armour_current_hp),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures;

    #[test]
    fn test_unequipped_modifiers() {
        let request = fixtures::creation_request();
        let combat = derive_combat_information(
            &request.innate_attributes,
            &request.learned_skills.general_skills,
            EquipmentBonus::default(),
            None,
        );

        assert_eq!(combat.initiative_mod, 5);
        assert_eq!(combat.speed, 14);
        assert_eq!(combat.range_attack_mod, 4);
        assert_eq!(combat.melee_attack_mod, 4);
        assert_eq!(combat.grid_attack_mod, 3);
        assert_eq!(combat.range_defence_mod, 5);
        assert_eq!(combat.melee_defence_mod, 3);
        assert_eq!(combat.grid_defence_mod, 4);
        assert_eq!(combat.armour_mod, 0);
        assert_eq!(combat.armour_current_hp, 0);
        assert!((combat.carry_weight - 35.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_armour_feeds_physical_defences_only() {
        let request = fixtures::creation_request();
        let equipment = EquipmentBonus {
            armour_mod: 2,
            armour_max_hp: 12,
            grid_mod: 1,
        };
        let combat = derive_combat_information(
            &request.innate_attributes,
            &request.learned_skills.general_skills,
            equipment,
            None,
        );

        assert_eq!(combat.range_defence_mod, 7);
        assert_eq!(combat.melee_defence_mod, 5);
        assert_eq!(combat.grid_defence_mod, 5);
        // attacks are untouched by armour
        assert_eq!(combat.melee_attack_mod, 4);
        assert_eq!(combat.armour_current_hp, 12);
    }

    #[test]
    fn test_damaged_armour_is_clamped() {
        let request = fixtures::creation_request();
        let equipment = EquipmentBonus {
            armour_mod: 1,
            armour_max_hp: 8,
            grid_mod: 0,
        };
        let attrs = &request.innate_attributes;
        let skills = &request.learned_skills.general_skills;

        assert_eq!(derive_combat_information(attrs, skills, equipment, Some(3)).armour_current_hp, 3);
        assert_eq!(derive_combat_information(attrs, skills, equipment, Some(20)).armour_current_hp, 8);
        assert_eq!(derive_combat_information(attrs, skills, equipment, Some(-4)).armour_current_hp, 0);
    }

    #[test]
    fn test_reequip_keeps_armour_damage() {
        let mut sheet =
            crate::rules::compute_character_request_data(&fixtures::creation_request()).unwrap();
        let vest = EquipmentBonus {
            armour_mod: 2,
            armour_max_hp: 10,
            grid_mod: 0,
        };

        sheet.combat_information = reequip(&sheet, vest);
        assert_eq!(sheet.combat_information.armour_current_hp, 10);

        sheet.combat_information.armour_current_hp = 4;
        let helmet_too = EquipmentBonus {
            armour_mod: 3,
            armour_max_hp: 15,
            grid_mod: 0,
        };
        sheet.combat_information = reequip(&sheet, helmet_too);
        assert_eq!(sheet.combat_information.armour_current_hp, 9);
        assert_eq!(sheet.combat_information.range_defence_mod, 8);

        sheet.combat_information = reequip(&sheet, EquipmentBonus::default());
        assert_eq!(sheet.combat_information.armour_current_hp, 0);
    }
}
