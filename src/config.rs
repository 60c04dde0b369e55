use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub btc_fee_url: String,
    pub btc_rpc_url: String,
    pub btc_api_key: String,
    pub eth_rpc_url: String,
    pub eth_hot_wallet: String,
    pub tron_node_url: String,
    pub lnbits_url: String,
    pub lnbits_admin_key: String,
    pub lnbits_invoice_key: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")?,
            btc_fee_url: env::var("BTC_FEE_URL")
                .unwrap_or_else(|_| "https://api.blockcypher.com/v1/btc/main".to_string()),
            btc_rpc_url: env::var("BTC_RPC_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8332".to_string()),
            btc_api_key: env::var("BLOCKCYPHER_API_KEY").unwrap_or_default(),
            eth_rpc_url: env::var("ETH_RPC_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8545".to_string()),
            eth_hot_wallet: env::var("ETH_HOT_WALLET")?,
            tron_node_url: env::var("TRON_NODE_URL")
                .unwrap_or_else(|_| "https://api.trongrid.io".to_string()),
            lnbits_url: env::var("LNBITS_URL")
                .unwrap_or_else(|_| "https://legend.lnbits.com".to_string()),
            lnbits_admin_key: env::var("LNBITS_ADMIN_KEY")?,
            lnbits_invoice_key: env::var("LNBITS_INVOICE_READ_KEY")?,
        })
    }
}
