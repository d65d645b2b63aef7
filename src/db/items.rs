use sqlx::{
    postgres::PgArguments, query::QueryAs, types::Json, PgConnection, PgExecutor, Postgres, Result,
};
use uuid::Uuid;

use crate::{
    models::{
        CustomItem, InventoryEntry, InventoryRow, Item, ItemOverrides, ItemProperties, ItemSource,
        UniqueItem,
    },
    rules,
};

fn bind_properties<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    props: &'q ItemProperties,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    query
        .bind(&props.name)
        .bind(props.category)
        .bind(props.weight)
        .bind(props.cost)
        .bind(&props.description)
        .bind(props.equippable)
        .bind(&props.damage)
        .bind(props.armour_mod)
        .bind(props.armour_hp)
        .bind(props.grid_mod)
        .bind(&props.image_key)
}

// Global item templates

pub async fn list_items<'e>(executor: impl PgExecutor<'e>) -> Result<Vec<Item>> {
    sqlx::query_as::<_, Item>("SELECT * FROM items ORDER BY category, name")
        .fetch_all(executor)
        .await
}

pub async fn get_item<'e>(executor: impl PgExecutor<'e>, item_id: Uuid) -> Result<Option<Item>> {
    sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
        .bind(item_id)
        .fetch_optional(executor)
        .await
}

pub async fn insert_item<'e>(executor: impl PgExecutor<'e>, props: &ItemProperties) -> Result<Item> {
    let query = sqlx::query_as::<_, Item>(
        r#"
        INSERT INTO items
            (name, category, weight, cost, description, equippable, damage, armour_mod, armour_hp, grid_mod, image_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    );
    bind_properties(query, props).fetch_one(executor).await
}

pub async fn update_item<'e>(
    executor: impl PgExecutor<'e>,
    item_id: Uuid,
    props: &ItemProperties,
) -> Result<Option<Item>> {
    let query = sqlx::query_as::<_, Item>(
        r#"
        UPDATE items SET
            name = $1, category = $2, weight = $3, cost = $4, description = $5,
            equippable = $6, damage = $7, armour_mod = $8, armour_hp = $9,
            grid_mod = $10, image_key = $11, updated_at = NOW()
        WHERE id = $12
        RETURNING *
        "#,
    );
    bind_properties(query, props)
        .bind(item_id)
        .fetch_optional(executor)
        .await
}

pub async fn delete_item<'e>(executor: impl PgExecutor<'e>, item_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM items WHERE id = $1")
        .bind(item_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

// Custom item templates owned by a user

pub async fn list_custom_items<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
) -> Result<Vec<CustomItem>> {
    sqlx::query_as::<_, CustomItem>(
        "SELECT * FROM custom_items WHERE user_id = $1 ORDER BY category, name",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

pub async fn get_custom_item<'e>(
    executor: impl PgExecutor<'e>,
    custom_item_id: Uuid,
) -> Result<Option<CustomItem>> {
    sqlx::query_as::<_, CustomItem>("SELECT * FROM custom_items WHERE id = $1")
        .bind(custom_item_id)
        .fetch_optional(executor)
        .await
}

pub async fn insert_custom_item<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
    props: &ItemProperties,
) -> Result<CustomItem> {
    let query = sqlx::query_as::<_, CustomItem>(
        r#"
        INSERT INTO custom_items
            (name, category, weight, cost, description, equippable, damage, armour_mod, armour_hp, grid_mod, image_key, user_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    );
    bind_properties(query, props)
        .bind(user_id)
        .fetch_one(executor)
        .await
}

pub async fn update_custom_item<'e>(
    executor: impl PgExecutor<'e>,
    custom_item_id: Uuid,
    props: &ItemProperties,
) -> Result<Option<CustomItem>> {
    let query = sqlx::query_as::<_, CustomItem>(
        r#"
        UPDATE custom_items SET
            name = $1, category = $2, weight = $3, cost = $4, description = $5,
            equippable = $6, damage = $7, armour_mod = $8, armour_hp = $9,
            grid_mod = $10, image_key = $11, updated_at = NOW()
        WHERE id = $12
        RETURNING *
        "#,
    );
    bind_properties(query, props)
        .bind(custom_item_id)
        .fetch_optional(executor)
        .await
}

pub async fn delete_custom_item<'e>(
    executor: impl PgExecutor<'e>,
    custom_item_id: Uuid,
) -> Result<bool> {
    let result = sqlx::query("DELETE FROM custom_items WHERE id = $1")
        .bind(custom_item_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

// Unique items

pub async fn insert_unique_item<'e>(
    executor: impl PgExecutor<'e>,
    character_id: Uuid,
    item_id: Option<Uuid>,
    custom_item_id: Option<Uuid>,
    overrides: &ItemOverrides,
) -> Result<UniqueItem> {
    sqlx::query_as::<_, UniqueItem>(
        r#"
        INSERT INTO unique_items (character_id, item_id, custom_item_id, overrides)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(character_id)
    .bind(item_id)
    .bind(custom_item_id)
    .bind(Json(overrides))
    .fetch_one(executor)
    .await
}

pub async fn get_unique_item<'e>(
    executor: impl PgExecutor<'e>,
    unique_item_id: Uuid,
) -> Result<Option<UniqueItem>> {
    sqlx::query_as::<_, UniqueItem>("SELECT * FROM unique_items WHERE id = $1")
        .bind(unique_item_id)
        .fetch_optional(executor)
        .await
}

pub async fn delete_unique_item<'e>(
    executor: impl PgExecutor<'e>,
    unique_item_id: Uuid,
) -> Result<()> {
    sqlx::query("DELETE FROM unique_items WHERE id = $1")
        .bind(unique_item_id)
        .execute(executor)
        .await?;
    Ok(())
}

// Inventory

pub async fn list_inventory_rows<'e>(
    executor: impl PgExecutor<'e>,
    character_id: Uuid,
) -> Result<Vec<InventoryRow>> {
    sqlx::query_as::<_, InventoryRow>(
        "SELECT id, item_id, custom_item_id, unique_item_id, quantity, equipped \
         FROM character_inventory WHERE character_id = $1 ORDER BY created_at",
    )
    .bind(character_id)
    .fetch_all(executor)
    .await
}

pub async fn get_inventory_row<'e>(
    executor: impl PgExecutor<'e>,
    character_id: Uuid,
    entry_id: Uuid,
) -> Result<Option<InventoryRow>> {
    sqlx::query_as::<_, InventoryRow>(
        "SELECT id, item_id, custom_item_id, unique_item_id, quantity, equipped \
         FROM character_inventory WHERE id = $1 AND character_id = $2",
    )
    .bind(entry_id)
    .bind(character_id)
    .fetch_optional(executor)
    .await
}

pub async fn insert_inventory_row<'e>(
    executor: impl PgExecutor<'e>,
    character_id: Uuid,
    source: ItemSource,
    quantity: i32,
    equipped: bool,
) -> Result<InventoryRow> {
    let (item_id, custom_item_id, unique_item_id) = source.columns();
    sqlx::query_as::<_, InventoryRow>(
        r#"
        INSERT INTO character_inventory
            (character_id, item_id, custom_item_id, unique_item_id, quantity, equipped)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, item_id, custom_item_id, unique_item_id, quantity, equipped
        "#,
    )
    .bind(character_id)
    .bind(item_id)
    .bind(custom_item_id)
    .bind(unique_item_id)
    .bind(quantity)
    .bind(equipped)
    .fetch_one(executor)
    .await
}

pub async fn update_inventory_row<'e>(
    executor: impl PgExecutor<'e>,
    entry_id: Uuid,
    quantity: i32,
    equipped: bool,
) -> Result<InventoryRow> {
    sqlx::query_as::<_, InventoryRow>(
        "UPDATE character_inventory SET quantity = $2, equipped = $3 WHERE id = $1 \
         RETURNING id, item_id, custom_item_id, unique_item_id, quantity, equipped",
    )
    .bind(entry_id)
    .bind(quantity)
    .bind(equipped)
    .fetch_one(executor)
    .await
}

pub async fn delete_inventory_row<'e>(executor: impl PgExecutor<'e>, entry_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM character_inventory WHERE id = $1")
        .bind(entry_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Characters with an equipped entry built on this catalogue item, directly or
/// through a unique item
pub async fn characters_equipping_item<'e>(
    executor: impl PgExecutor<'e>,
    item_id: Uuid,
) -> Result<Vec<Uuid>> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT DISTINCT ci.character_id
        FROM character_inventory ci
        LEFT JOIN unique_items ui ON ui.id = ci.unique_item_id
        WHERE ci.equipped AND (ci.item_id = $1 OR ui.item_id = $1)
        ORDER BY ci.character_id
        "#,
    )
    .bind(item_id)
    .fetch_all(executor)
    .await
}

pub async fn characters_equipping_custom_item<'e>(
    executor: impl PgExecutor<'e>,
    custom_item_id: Uuid,
) -> Result<Vec<Uuid>> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT DISTINCT ci.character_id
        FROM character_inventory ci
        LEFT JOIN unique_items ui ON ui.id = ci.unique_item_id
        WHERE ci.equipped AND (ci.custom_item_id = $1 OR ui.custom_item_id = $1)
        ORDER BY ci.character_id
        "#,
    )
    .bind(custom_item_id)
    .fetch_all(executor)
    .await
}

/// Effective properties behind an inventory source, `None` if it no longer exists
pub async fn resolve_source(
    conn: &mut PgConnection,
    source: ItemSource,
) -> Result<Option<ItemProperties>> {
    match source {
        ItemSource::Item(id) => Ok(get_item(&mut *conn, id).await?.map(|i| i.properties)),
        ItemSource::CustomItem(id) => {
            Ok(get_custom_item(&mut *conn, id).await?.map(|i| i.properties))
        }
        ItemSource::UniqueItem(id) => {
            let Some(unique) = get_unique_item(&mut *conn, id).await? else {
                return Ok(None);
            };
            let base = match (unique.item_id, unique.custom_item_id) {
                (Some(item_id), _) => get_item(&mut *conn, item_id).await?.map(|i| i.properties),
                (None, Some(custom_id)) => get_custom_item(&mut *conn, custom_id)
                    .await?
                    .map(|i| i.properties),
                (None, None) => None,
            };
            Ok(base.map(|base| rules::resolve_unique_item(&base, &unique.overrides)))
        }
    }
}

/// Every inventory row of a character with its item resolved
pub async fn load_inventory(
    conn: &mut PgConnection,
    character_id: Uuid,
) -> Result<Vec<InventoryEntry>> {
    let rows = list_inventory_rows(&mut *conn, character_id).await?;
    let mut entries = Vec::with_capacity(rows.len());

    for row in rows {
        let Some(source) = row.source() else {
            tracing::warn!("Inventory entry {} has no single item source", row.id);
            continue;
        };
        let Some(item) = resolve_source(&mut *conn, source).await? else {
            tracing::warn!("Inventory entry {} references a missing item", row.id);
            continue;
        };
        entries.push(InventoryEntry {
            id: row.id,
            source,
            quantity: row.quantity,
            equipped: row.equipped,
            item,
        });
    }

    Ok(entries)
}
