use sqlx::postgres::{PgPool, PgPoolOptions};

pub mod accounts;
pub mod ledger;
pub mod models;
pub mod transactions;

/// Atomic unit of work. Every balance or record mutation happens through one
/// of these, opened by the service layer and committed or rolled back as a
/// whole.
pub type DbTx<'a> = sqlx::Transaction<'a, sqlx::Postgres>;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}
