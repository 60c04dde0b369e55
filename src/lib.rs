pub mod amount;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod providers;
pub mod services;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::providers::{LightningGateway, ProviderRegistry};
use crate::services::{FeeEstimator, TransferService, WithdrawalService};

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub fees: FeeEstimator,
    pub lightning: Arc<dyn LightningGateway>,
    pub transfers: TransferService,
    pub withdrawals: WithdrawalService,
}

impl AppState {
    /// Wires the service layer. Providers are constructed once at startup
    /// and injected here; nothing else holds external connections.
    pub fn new(
        db: sqlx::PgPool,
        providers: ProviderRegistry,
        lightning: Arc<dyn LightningGateway>,
    ) -> Self {
        let fees = FeeEstimator::new(providers.clone());
        let transfers = TransferService::new(db.clone());
        let withdrawals =
            WithdrawalService::new(db.clone(), providers, lightning.clone(), fees.clone());

        Self {
            db,
            fees,
            lightning,
            transfers,
            withdrawals,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/accounts", post(handlers::accounts::create_account))
        .route("/accounts/:id/balances", get(handlers::accounts::get_balances))
        .route(
            "/accounts/:id/transactions",
            get(handlers::transactions::history),
        )
        .route("/transfers", post(handlers::transactions::transfer))
        .route(
            "/transactions/:id",
            get(handlers::transactions::get_transaction),
        )
        .route("/withdrawals", post(handlers::withdrawals::withdraw))
        .route("/fees/:asset", get(handlers::withdrawals::get_fees))
        .route(
            "/lightning/:payment_hash",
            get(handlers::withdrawals::lightning_status),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
