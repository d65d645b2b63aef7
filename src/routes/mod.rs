pub mod characters;
pub mod games;
pub mod health;
pub mod inventory;
pub mod items;
pub mod paths;
pub mod users;
pub mod wallet;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/me", get(users::get_current_user))
        // Characters
        .route(
            "/characters",
            get(characters::list_characters).post(characters::create_character),
        )
        .route(
            "/characters/{id}",
            get(characters::get_character)
                .put(characters::update_character)
                .delete(characters::delete_character),
        )
        .route(
            "/characters/{id}/health",
            axum::routing::patch(characters::update_health),
        )
        .route("/characters/{id}/level-up", post(characters::level_up))
        .route("/characters/{id}/paths", get(characters::get_character_paths))
        .route(
            "/characters/{id}/features",
            get(characters::get_character_features),
        )
        // Inventory
        .route(
            "/characters/{id}/inventory",
            get(inventory::get_inventory).post(inventory::add_entry),
        )
        .route(
            "/characters/{id}/inventory/{entry_id}",
            axum::routing::patch(inventory::update_entry).delete(inventory::delete_entry),
        )
        .route(
            "/characters/{id}/unique-items",
            post(inventory::create_unique_item),
        )
        // Wallet
        .route(
            "/characters/{id}/wallet",
            get(wallet::get_wallet).put(wallet::set_wallet),
        )
        .route(
            "/characters/{id}/wallet/transactions",
            post(wallet::create_transaction),
        )
        // Catalogue
        .route("/paths", get(paths::list_paths).post(paths::create_path))
        .route(
            "/paths/{id}",
            get(paths::get_path)
                .put(paths::update_path)
                .delete(paths::delete_path),
        )
        .route("/paths/{id}/features", get(paths::list_path_features))
        .route(
            "/features",
            get(paths::list_features).post(paths::create_feature),
        )
        .route(
            "/features/{id}",
            get(paths::get_feature)
                .put(paths::update_feature)
                .delete(paths::delete_feature),
        )
        .route("/items", get(items::list_items).post(items::create_item))
        .route(
            "/items/{id}",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        .route(
            "/custom-items",
            get(items::list_custom_items).post(items::create_custom_item),
        )
        .route(
            "/custom-items/{id}",
            get(items::get_custom_item)
                .put(items::update_custom_item)
                .delete(items::delete_custom_item),
        )
        // Games
        .route("/games", get(games::list_games).post(games::create_game))
        .route(
            "/games/{id}",
            get(games::get_game)
                .put(games::update_game)
                .delete(games::delete_game),
        )
        .route("/games/{id}/users", post(games::add_user))
        .route(
            "/games/{id}/users/{user_id}",
            axum::routing::delete(games::remove_user),
        )
        .route("/games/{id}/characters", post(games::add_character))
        .route(
            "/games/{id}/characters/{character_id}",
            axum::routing::delete(games::remove_character),
        )
}
