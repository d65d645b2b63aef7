use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    db,
    error::ApiError,
    extract::ValidatedJson,
    models::{CharacterCurrency, SetWalletRequest, WalletTransactionRequest},
    routes::characters::{load_owned, load_readable},
    rules, AppState,
};

pub async fn get_wallet(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CharacterCurrency>>, ApiError> {
    let mut conn = state.db.acquire().await?;
    load_readable(&mut conn, &user, id).await?;
    Ok(Json(db::wallet::get_wallet(&mut *conn, id).await?))
}

/// Replace all balances at once
pub async fn set_wallet(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<SetWalletRequest>,
) -> Result<Json<Vec<CharacterCurrency>>, ApiError> {
    rules::check_balances(&request.balances)?;
    let balances: Vec<CharacterCurrency> = request
        .balances
        .into_iter()
        .map(|b| CharacterCurrency {
            currency: rules::normalize_currency(&b.currency),
            amount: b.amount,
        })
        .collect();

    let mut tx = state.db.begin().await?;
    load_owned(&mut tx, &user, id).await?;
    db::wallet::replace_wallet(&mut tx, id, &balances).await?;
    let wallet = db::wallet::get_wallet(&mut *tx, id).await?;
    tx.commit().await?;

    tracing::info!("Wallet of character {} replaced ({} currencies)", id, wallet.len());
    Ok(Json(wallet))
}

/// Deposit or withdraw; the first deposit creates the currency
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<WalletTransactionRequest>,
) -> Result<Json<Vec<CharacterCurrency>>, ApiError> {
    let currency = rules::currency_name(&request.currency)?;

    let mut tx = state.db.begin().await?;
    load_owned(&mut tx, &user, id).await?;

    let balance = db::wallet::get_balance_for_update(&mut *tx, id, &currency)
        .await?
        .unwrap_or(0);
    let updated = rules::apply_transaction(&currency, balance, request.delta)?;
    db::wallet::set_balance(&mut *tx, id, &currency, updated).await?;
    let wallet = db::wallet::get_wallet(&mut *tx, id).await?;
    tx.commit().await?;

    tracing::info!(
        "Character {} {}: {} -> {}",
        id,
        currency,
        balance,
        updated
    );
    Ok(Json(wallet))
}
