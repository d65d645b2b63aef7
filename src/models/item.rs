use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Weapon,
    Armour,
    Grid,
    General,
    Consumable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageType {
    Bullet,
    Blade,
    Piercing,
    Acid,
    Fire,
    Ice,
    Electric,
    Impact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Damage {
    /// Dice expression for the attack roll, e.g. "1d10"
    #[validate(length(min = 3, max = 16))]
    pub attack_roll: String,
    /// Dice expression for the damage roll, e.g. "2d6"
    #[validate(length(min = 3, max = 16))]
    pub damage_roll: String,
    pub damage_type: DamageType,
    #[validate(range(min = 0, max = 10000))]
    pub primary_range: Option<i32>,
    #[validate(range(min = 0, max = 10000))]
    pub secondary_range: Option<i32>,
}

/// Everything that describes an item, shared by templates and resolved items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Validate)]
pub struct ItemProperties {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    pub category: ItemCategory,
    /// Kilograms per unit
    #[validate(range(min = 0.0, max = 10000.0))]
    pub weight: f64,
    #[validate(range(min = 0))]
    pub cost: i32,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    pub equippable: bool,
    pub damage: Option<Json<Damage>>,
    #[validate(range(min = -10, max = 10))]
    pub armour_mod: Option<i32>,
    #[validate(range(min = 0, max = 1000))]
    pub armour_hp: Option<i32>,
    #[validate(range(min = -10, max = 10))]
    pub grid_mod: Option<i32>,
    #[validate(length(min = 1, max = 256))]
    pub image_key: Option<String>,
}

/// Global item template
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Item {
    pub id: Uuid,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub properties: ItemProperties,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Item template owned by one user
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomItem {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub properties: ItemProperties,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field-by-field overrides applied on top of a source template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ItemOverrides {
    #[validate(length(min = 1, max = 64))]
    pub name: Option<String>,
    #[validate(range(min = 0.0, max = 10000.0))]
    pub weight: Option<f64>,
    #[validate(range(min = 0))]
    pub cost: Option<i32>,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[validate(nested)]
    pub damage: Option<Damage>,
    #[validate(range(min = -10, max = 10))]
    pub armour_mod: Option<i32>,
    #[validate(range(min = 0, max = 1000))]
    pub armour_hp: Option<i32>,
    #[validate(range(min = -10, max = 10))]
    pub grid_mod: Option<i32>,
    #[validate(length(min = 1, max = 256))]
    pub image_key: Option<String>,
}

/// Per-instance item: one source template plus overrides
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UniqueItem {
    pub id: Uuid,
    pub character_id: Uuid,
    pub item_id: Option<Uuid>,
    pub custom_item_id: Option<Uuid>,
    pub overrides: Json<ItemOverrides>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ItemSource {
    Item(Uuid),
    CustomItem(Uuid),
    UniqueItem(Uuid),
}

impl ItemSource {
    /// Build a source from the three nullable reference columns; exactly one must be set
    pub fn from_columns(
        item_id: Option<Uuid>,
        custom_item_id: Option<Uuid>,
        unique_item_id: Option<Uuid>,
    ) -> Option<Self> {
        match (item_id, custom_item_id, unique_item_id) {
            (Some(id), None, None) => Some(Self::Item(id)),
            (None, Some(id), None) => Some(Self::CustomItem(id)),
            (None, None, Some(id)) => Some(Self::UniqueItem(id)),
            _ => None,
        }
    }

    pub fn columns(&self) -> (Option<Uuid>, Option<Uuid>, Option<Uuid>) {
        match *self {
            Self::Item(id) => (Some(id), None, None),
            Self::CustomItem(id) => (None, Some(id), None),
            Self::UniqueItem(id) => (None, None, Some(id)),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct InventoryRow {
    pub id: Uuid,
    pub item_id: Option<Uuid>,
    pub custom_item_id: Option<Uuid>,
    pub unique_item_id: Option<Uuid>,
    pub quantity: i32,
    pub equipped: bool,
}

impl InventoryRow {
    pub fn source(&self) -> Option<ItemSource> {
        ItemSource::from_columns(self.item_id, self.custom_item_id, self.unique_item_id)
    }
}

/// Inventory entry with its effective item properties
#[derive(Debug, Clone, Serialize)]
pub struct InventoryEntry {
    pub id: Uuid,
    pub source: ItemSource,
    pub quantity: i32,
    pub equipped: bool,
    pub item: ItemProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct Inventory {
    pub entries: Vec<InventoryEntry>,
    pub total_weight: f64,
    pub carry_weight: f64,
    pub overloaded: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddInventoryRequest {
    pub source: ItemSource,
    #[validate(range(min = 1, max = 9999))]
    pub quantity: i32,
    #[serde(default)]
    pub equipped: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateInventoryRequest {
    #[validate(range(min = 1, max = 9999))]
    pub quantity: Option<i32>,
    pub equipped: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUniqueItemRequest {
    pub item_id: Option<Uuid>,
    pub custom_item_id: Option<Uuid>,
    #[serde(default)]
    #[validate(nested)]
    pub overrides: ItemOverrides,
    #[serde(default)]
    pub equipped: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_source_from_columns() {
        let id = Uuid::new_v4();
        assert_eq!(
            ItemSource::from_columns(Some(id), None, None),
            Some(ItemSource::Item(id))
        );
        assert_eq!(
            ItemSource::from_columns(None, None, Some(id)),
            Some(ItemSource::UniqueItem(id))
        );
        assert_eq!(ItemSource::from_columns(None, None, None), None);
        assert_eq!(ItemSource::from_columns(Some(id), Some(id), None), None);
    }

    #[test]
    fn test_item_source_columns_round_trip() {
        let id = Uuid::new_v4();
        let source = ItemSource::CustomItem(id);
        let (a, b, c) = source.columns();
        assert_eq!(ItemSource::from_columns(a, b, c), Some(source));
    }

    #[test]
    fn test_inventory_row_source() {
        let id = Uuid::new_v4();
        let row = InventoryRow {
            id: Uuid::new_v4(),
            item_id: None,
            custom_item_id: None,
            unique_item_id: Some(id),
            quantity: 1,
            equipped: true,
        };
        assert_eq!(row.source(), Some(ItemSource::UniqueItem(id)));
        assert_eq!(
            InventoryRow {
                item_id: Some(id),
                ..row
            }
            .source(),
            None
        );
    }

    #[test]
    fn test_item_source_wire_format() {
        let id = Uuid::nil();
        let json = serde_json::to_value(ItemSource::UniqueItem(id)).unwrap();
        assert_eq!(json["kind"], "unique_item");
        assert_eq!(json["id"], id.to_string());
    }

    #[test]
    fn test_add_inventory_request_rejects_zero_quantity() {
        let json = format!(
            r#"{{"source": {{"kind": "item", "id": "{}"}}, "quantity": 0}}"#,
            Uuid::nil()
        );
        let request: AddInventoryRequest = serde_json::from_str(&json).unwrap();
        assert!(request.validate().is_err());
        assert!(!request.equipped);
    }
}
