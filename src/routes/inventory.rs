use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    db,
    error::ApiError,
    extract::ValidatedJson,
    models::{
        AddInventoryRequest, CharacterRow, CreateUniqueItemRequest, Inventory, ItemProperties,
        ItemSource, UniqueItem, UpdateInventoryRequest,
    },
    routes::characters::{load_owned, load_readable},
    rules, AppState,
};

#[derive(Debug, Serialize)]
pub struct UniqueItemCreated {
    pub unique_item: UniqueItem,
    pub inventory: Inventory,
}

/// Resolve a source the caller is allowed to put in this character's inventory
async fn resolve_for_character(
    conn: &mut PgConnection,
    user: &AuthenticatedUser,
    character_id: Uuid,
    source: ItemSource,
) -> Result<ItemProperties, ApiError> {
    match source {
        ItemSource::CustomItem(id) => {
            let custom = db::items::get_custom_item(&mut *conn, id)
                .await?
                .ok_or(ApiError::NotFound("custom item"))?;
            if custom.user_id != user.user_id {
                return Err(ApiError::Forbidden("custom item"));
            }
        }
        ItemSource::UniqueItem(id) => {
            let unique = db::items::get_unique_item(&mut *conn, id)
                .await?
                .ok_or(ApiError::NotFound("unique item"))?;
            if unique.character_id != character_id {
                return Err(ApiError::Forbidden("unique item"));
            }
        }
        ItemSource::Item(_) => {}
    }

    db::items::resolve_source(conn, source)
        .await?
        .ok_or(ApiError::NotFound("item"))
}

/// Recompute equipment-derived combat stats and return the fresh inventory
async fn refresh_combat(conn: &mut PgConnection, row: &CharacterRow) -> Result<Inventory, ApiError> {
    let entries = db::items::load_inventory(&mut *conn, row.id).await?;
    let combat = rules::reequip(&row.sheet(), rules::equipment_bonus(&entries));
    db::characters::update_combat_information(&mut *conn, row.id, &combat).await?;
    Ok(rules::build_inventory(entries, combat.carry_weight))
}

/// Re-derive combat stats for characters whose equipped items changed under them
pub async fn refresh_characters(
    conn: &mut PgConnection,
    character_ids: &[Uuid],
) -> Result<(), ApiError> {
    for &character_id in character_ids {
        if let Some(row) = db::characters::get_character_for_update(&mut *conn, character_id).await? {
            refresh_combat(conn, &row).await?;
        }
    }
    if !character_ids.is_empty() {
        tracing::debug!("Recomputed combat stats of {} characters", character_ids.len());
    }
    Ok(())
}

pub async fn get_inventory(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Inventory>, ApiError> {
    let mut conn = state.db.acquire().await?;
    let row = load_readable(&mut conn, &user, id).await?;
    let entries = db::items::load_inventory(&mut conn, id).await?;
    Ok(Json(rules::build_inventory(
        entries,
        row.combat_information.carry_weight,
    )))
}

pub async fn add_entry(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AddInventoryRequest>,
) -> Result<(StatusCode, Json<Inventory>), ApiError> {
    let mut tx = state.db.begin().await?;
    let row = load_owned(&mut tx, &user, id).await?;

    let item = resolve_for_character(&mut tx, &user, id, request.source).await?;
    let held: Vec<ItemSource> = db::items::list_inventory_rows(&mut *tx, id)
        .await?
        .iter()
        .filter_map(|entry| entry.source())
        .collect();
    rules::check_new_entry(request.source, &held)?;
    if request.equipped {
        rules::check_equippable(&item)?;
    }

    db::items::insert_inventory_row(&mut *tx, id, request.source, request.quantity, request.equipped)
        .await?;
    let inventory = refresh_combat(&mut tx, &row).await?;
    tx.commit().await?;

    tracing::info!(
        "Added {} x '{}' to character {}",
        request.quantity,
        item.name,
        id
    );
    Ok((StatusCode::CREATED, Json(inventory)))
}

pub async fn update_entry(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path((id, entry_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(request): ValidatedJson<UpdateInventoryRequest>,
) -> Result<Json<Inventory>, ApiError> {
    let mut tx = state.db.begin().await?;
    let row = load_owned(&mut tx, &user, id).await?;
    let entry = db::items::get_inventory_row(&mut *tx, id, entry_id)
        .await?
        .ok_or(ApiError::NotFound("inventory entry"))?;

    let equipped = request.equipped.unwrap_or(entry.equipped);
    if equipped && !entry.equipped {
        let source = entry.source().ok_or(ApiError::NotFound("item"))?;
        let item = db::items::resolve_source(&mut tx, source)
            .await?
            .ok_or(ApiError::NotFound("item"))?;
        rules::check_equippable(&item)?;
    }

    db::items::update_inventory_row(
        &mut *tx,
        entry_id,
        request.quantity.unwrap_or(entry.quantity),
        equipped,
    )
    .await?;
    let inventory = refresh_combat(&mut tx, &row).await?;
    tx.commit().await?;

    tracing::info!("Inventory entry {} of character {} updated", entry_id, id);
    Ok(Json(inventory))
}

pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path((id, entry_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Inventory>, ApiError> {
    let mut tx = state.db.begin().await?;
    let row = load_owned(&mut tx, &user, id).await?;
    let entry = db::items::get_inventory_row(&mut *tx, id, entry_id)
        .await?
        .ok_or(ApiError::NotFound("inventory entry"))?;

    db::items::delete_inventory_row(&mut *tx, entry_id).await?;
    // A unique item only exists through its inventory entry
    if let Some(unique_item_id) = entry.unique_item_id {
        db::items::delete_unique_item(&mut *tx, unique_item_id).await?;
    }
    let inventory = refresh_combat(&mut tx, &row).await?;
    tx.commit().await?;

    tracing::info!("Inventory entry {} removed from character {}", entry_id, id);
    Ok(Json(inventory))
}

pub async fn create_unique_item(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateUniqueItemRequest>,
) -> Result<(StatusCode, Json<UniqueItemCreated>), ApiError> {
    let source = match (request.item_id, request.custom_item_id) {
        (Some(item_id), None) => ItemSource::Item(item_id),
        (None, Some(custom_item_id)) => ItemSource::CustomItem(custom_item_id),
        _ => {
            return Err(ApiError::BadRequest(
                "exactly one of item_id and custom_item_id must be set".to_string(),
            ))
        }
    };

    let mut tx = state.db.begin().await?;
    let row = load_owned(&mut tx, &user, id).await?;

    let base = resolve_for_character(&mut tx, &user, id, source).await?;
    let resolved = rules::resolve_unique_item(&base, &request.overrides);
    rules::check_item_properties(&resolved)?;
    if request.equipped {
        rules::check_equippable(&resolved)?;
    }

    let unique_item = db::items::insert_unique_item(
        &mut *tx,
        id,
        request.item_id,
        request.custom_item_id,
        &request.overrides,
    )
    .await?;
    db::items::insert_inventory_row(
        &mut *tx,
        id,
        ItemSource::UniqueItem(unique_item.id),
        1,
        request.equipped,
    )
    .await?;
    let inventory = refresh_combat(&mut tx, &row).await?;
    tx.commit().await?;

    tracing::info!(
        "Created unique item '{}' for character {}",
        resolved.name,
        id
    );
    Ok((
        StatusCode::CREATED,
        Json(UniqueItemCreated {
            unique_item,
            inventory,
        }),
    ))
}
