use sqlx::types::Json;

use crate::models::{
    Inventory, InventoryEntry, ItemCategory, ItemOverrides, ItemProperties, ItemSource,
};

use super::{combat::EquipmentBonus, dice::DiceExpression, RuleError};

/// Check the cross-field rules an item template must satisfy
pub fn check_item_properties(item: &ItemProperties) -> Result<(), RuleError> {
    let category = item.category;

    if let Some(Json(damage)) = &item.damage {
        if category != ItemCategory::Weapon {
            return Err(RuleError::InvalidItem(format!(
                "'{}' is not a weapon and cannot deal damage",
                item.name
            )));
        }
        damage.attack_roll.parse::<DiceExpression>()?;
        damage.damage_roll.parse::<DiceExpression>()?;
        if let (Some(primary), Some(secondary)) = (damage.primary_range, damage.secondary_range) {
            if secondary < primary {
                return Err(RuleError::InvalidItem(format!(
                    "'{}' has a secondary range shorter than its primary range",
                    item.name
                )));
            }
        }
    }

    if (item.armour_mod.is_some() || item.armour_hp.is_some()) && category != ItemCategory::Armour
    {
        return Err(RuleError::InvalidItem(format!(
            "only armour can carry armour values, '{}' is {:?}",
            item.name, category
        )));
    }

    if item.grid_mod.is_some() && !matches!(category, ItemCategory::Grid | ItemCategory::Armour) {
        return Err(RuleError::InvalidItem(format!(
            "'{}' cannot carry a GRID modifier",
            item.name
        )));
    }

    if item.equippable && matches!(category, ItemCategory::General | ItemCategory::Consumable) {
        return Err(RuleError::InvalidItem(format!(
            "{:?} items cannot be equipped",
            category
        )));
    }
    if !item.equippable && matches!(category, ItemCategory::Weapon | ItemCategory::Armour) {
        return Err(RuleError::InvalidItem(format!(
            "'{}' is {:?} and must be equippable",
            item.name, category
        )));
    }
    Ok(())
}

/// Effective properties of a unique item: the source template with every
/// present override applied
pub fn resolve_unique_item(base: &ItemProperties, overrides: &ItemOverrides) -> ItemProperties {
    ItemProperties {
        name: overrides.name.clone().unwrap_or_else(|| base.name.clone()),
        category: base.category,
        weight: overrides.weight.unwrap_or(base.weight),
        cost: overrides.cost.unwrap_or(base.cost),
        description: overrides
            .description
            .clone()
            .or_else(|| base.description.clone()),
        equippable: base.equippable,
        damage: overrides
            .damage
            .clone()
            .map(Json)
            .or_else(|| base.damage.clone()),
        armour_mod: overrides.armour_mod.or(base.armour_mod),
        armour_hp: overrides.armour_hp.or(base.armour_hp),
        grid_mod: overrides.grid_mod.or(base.grid_mod),
        image_key: overrides.image_key.clone().or_else(|| base.image_key.clone()),
    }
}

/// A unique item backs exactly one inventory entry
pub fn check_new_entry(source: ItemSource, held: &[ItemSource]) -> Result<(), RuleError> {
    match source {
        ItemSource::UniqueItem(id) if held.contains(&source) => {
            Err(RuleError::UniqueItemHeld(id.to_string()))
        }
        _ => Ok(()),
    }
}

pub fn check_equippable(item: &ItemProperties) -> Result<(), RuleError> {
    if item.equippable {
        Ok(())
    } else {
        Err(RuleError::NotEquippable(item.name.clone()))
    }
}

/// Sum the bonuses of equipped entries; a stack counts once
pub fn equipment_bonus(entries: &[InventoryEntry]) -> EquipmentBonus {
    entries
        .iter()
        .filter(|e| e.equipped)
        .fold(EquipmentBonus::default(), |acc, e| EquipmentBonus {
            armour_mod: acc.armour_mod + e.item.armour_mod.unwrap_or(0),
            armour_max_hp: acc.armour_max_hp + e.item.armour_hp.unwrap_or(0),
            grid_mod: acc.grid_mod + e.item.grid_mod.unwrap_or(0),
        })
}

pub fn total_weight(entries: &[InventoryEntry]) -> f64 {
    entries
        .iter()
        .map(|e| e.item.weight * e.quantity as f64)
        .sum()
}

pub fn build_inventory(entries: Vec<InventoryEntry>, carry_weight: f64) -> Inventory {
    let total_weight = total_weight(&entries);
    Inventory {
        entries,
        total_weight,
        carry_weight,
        overloaded: total_weight > carry_weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Damage, DamageType};
    use tokio_test::{assert_err, assert_ok};
    use uuid::Uuid;

    fn rifle() -> ItemProperties {
        ItemProperties {
            name: "Rifle".to_string(),
            category: ItemCategory::Weapon,
            weight: 4.5,
            cost: 900,
            description: None,
            equippable: true,
            damage: Some(Json(Damage {
                attack_roll: "1d10".to_string(),
                damage_roll: "2d6+1".to_string(),
                damage_type: DamageType::Bullet,
                primary_range: Some(50),
                secondary_range: Some(150),
            })),
            armour_mod: None,
            armour_hp: None,
            grid_mod: None,
            image_key: None,
        }
    }

    fn vest() -> ItemProperties {
        ItemProperties {
            name: "Kevlar vest".to_string(),
            category: ItemCategory::Armour,
            weight: 3.0,
            cost: 400,
            description: None,
            equippable: true,
            damage: None,
            armour_mod: Some(2),
            armour_hp: Some(10),
            grid_mod: None,
            image_key: None,
        }
    }

    fn entry(item: ItemProperties, quantity: i32, equipped: bool) -> InventoryEntry {
        InventoryEntry {
            id: Uuid::new_v4(),
            source: ItemSource::Item(Uuid::new_v4()),
            quantity,
            equipped,
            item,
        }
    }

    #[test]
    fn test_valid_templates() {
        assert_ok!(check_item_properties(&rifle()));
        assert_ok!(check_item_properties(&vest()));
    }

    #[test]
    fn test_damage_only_on_weapons() {
        let mut item = rifle();
        item.category = ItemCategory::General;
        item.equippable = false;
        assert_err!(check_item_properties(&item));
    }

    #[test]
    fn test_grid_items_cannot_deal_damage() {
        let mut item = rifle();
        item.category = ItemCategory::Grid;
        let err = assert_err!(check_item_properties(&item));
        assert!(matches!(err, RuleError::InvalidItem(_)));

        item.damage = None;
        item.grid_mod = Some(1);
        assert_ok!(check_item_properties(&item));
    }

    #[test]
    fn test_weapons_and_armour_must_be_equippable() {
        let mut item = rifle();
        item.equippable = false;
        assert_err!(check_item_properties(&item));

        let mut item = vest();
        item.equippable = false;
        let err = assert_err!(check_item_properties(&item));
        assert_eq!(
            err,
            RuleError::InvalidItem("'Kevlar vest' is Armour and must be equippable".to_string())
        );
    }

    #[test]
    fn test_armour_values_only_on_armour() {
        let mut item = rifle();
        item.armour_mod = Some(1);
        let err = assert_err!(check_item_properties(&item));
        assert!(matches!(err, RuleError::InvalidItem(_)));
    }

    #[test]
    fn test_bad_damage_dice() {
        let mut item = rifle();
        if let Some(Json(damage)) = item.damage.as_mut() {
            damage.damage_roll = "lots".to_string();
        }
        let err = assert_err!(check_item_properties(&item));
        assert_eq!(err, RuleError::InvalidDiceExpression("lots".to_string()));
    }

    #[test]
    fn test_general_items_cannot_be_equippable() {
        let item = ItemProperties {
            name: "Rope".to_string(),
            category: ItemCategory::General,
            weight: 1.0,
            cost: 5,
            description: None,
            equippable: true,
            damage: None,
            armour_mod: None,
            armour_hp: None,
            grid_mod: None,
            image_key: None,
        };
        assert_err!(check_item_properties(&item));
        assert_err!(check_equippable(&ItemProperties {
            equippable: false,
            ..item
        }));
    }

    #[test]
    fn test_unique_item_held_once() {
        let unique = ItemSource::UniqueItem(Uuid::new_v4());
        let rifle = ItemSource::Item(Uuid::new_v4());

        assert_ok!(check_new_entry(unique, &[rifle]));
        assert_ok!(check_new_entry(rifle, &[rifle, unique]));
        let err = assert_err!(check_new_entry(unique, &[rifle, unique]));
        assert!(matches!(err, RuleError::UniqueItemHeld(_)));
    }

    #[test]
    fn test_resolve_unique_item_applies_overrides() {
        let overrides = ItemOverrides {
            name: Some("Grandfather's rifle".to_string()),
            weight: Some(5.0),
            ..Default::default()
        };
        let resolved = resolve_unique_item(&rifle(), &overrides);

        assert_eq!(resolved.name, "Grandfather's rifle");
        assert!((resolved.weight - 5.0).abs() < f64::EPSILON);
        assert_eq!(resolved.cost, 900);
        assert_eq!(resolved.category, ItemCategory::Weapon);
        assert_eq!(resolved.damage, rifle().damage);
    }

    #[test]
    fn test_equipment_bonus_counts_equipped_entries_once() {
        let entries = vec![
            entry(vest(), 2, true),
            entry(vest(), 1, false),
            entry(rifle(), 1, true),
        ];
        let bonus = equipment_bonus(&entries);
        assert_eq!(bonus.armour_mod, 2);
        assert_eq!(bonus.armour_max_hp, 10);
        assert_eq!(bonus.grid_mod, 0);
    }

    #[test]
    fn test_combat_stats_follow_template_edits() {
        use crate::rules::{compute_character_request_data, fixtures, reequip};

        let mut sheet = compute_character_request_data(&fixtures::creation_request()).unwrap();
        let base_defence = sheet.combat_information.range_defence_mod;

        let mut entries = vec![entry(vest(), 1, true)];
        sheet.combat_information = reequip(&sheet, equipment_bonus(&entries));
        assert_eq!(sheet.combat_information.range_defence_mod, base_defence + 2);

        // Template edited in the catalogue
        entries[0].item.armour_mod = Some(1);
        sheet.combat_information = reequip(&sheet, equipment_bonus(&entries));
        assert_eq!(sheet.combat_information.range_defence_mod, base_defence + 1);
        assert_eq!(sheet.combat_information.armour_max_hp, 10);

        // Template deleted, its inventory rows gone
        entries.clear();
        sheet.combat_information = reequip(&sheet, equipment_bonus(&entries));
        assert_eq!(sheet.combat_information.range_defence_mod, base_defence);
        assert_eq!(sheet.combat_information.armour_mod, 0);
        assert_eq!(sheet.combat_information.armour_max_hp, 0);
    }

    #[test]
    fn test_inventory_weight_and_overload() {
        let entries = vec![entry(vest(), 2, true), entry(rifle(), 1, false)];
        let inventory = build_inventory(entries.clone(), 10.0);
        assert!((inventory.total_weight - 10.5).abs() < 1e-9);
        assert!(inventory.overloaded);

        let inventory = build_inventory(entries, 35.0);
        assert!(!inventory.overloaded);
    }
}
