use sqlx::migrate::Migrator;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledger_core::config::Config;
use ledger_core::db;
use ledger_core::db::models::Asset;
use ledger_core::providers::{
    BitcoinProvider, EthereumProvider, LnBitsClient, ProviderRegistry, TronProvider,
};
use ledger_core::{create_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = db::create_pool(&config.database_url).await?;

    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(&pool).await?;
    tracing::info!("database migrations completed");

    // One provider per asset, constructed once and injected.
    let providers = ProviderRegistry::new()
        .register(
            Asset::Btc,
            Arc::new(BitcoinProvider::new(
                config.btc_fee_url.clone(),
                config.btc_rpc_url.clone(),
                config.btc_api_key.clone(),
            )),
        )
        .register(
            Asset::Eth,
            Arc::new(EthereumProvider::new(
                config.eth_rpc_url.clone(),
                config.eth_hot_wallet.clone(),
            )),
        )
        .register(
            Asset::Usdt,
            Arc::new(TronProvider::new(config.tron_node_url.clone())),
        );
    let lightning = Arc::new(LnBitsClient::new(
        config.lnbits_url.clone(),
        config.lnbits_admin_key.clone(),
        config.lnbits_invoice_key.clone(),
    ));
    tracing::info!("network providers initialized");

    let state = AppState::new(pool, providers, lightning);
    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
