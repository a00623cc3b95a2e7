//! Client configuration loaded from environment variables.

use crate::errors::{ClientError, Result};

/// Flat fee (in wei) attached to every campaign-creation submission.
/// 0.02 native units.
pub const DEFAULT_CREATION_FEE_WEI: u128 = 20_000_000_000_000_000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Address of the crowdfunding registry contract.
    pub store_address: String,
    /// Chain the session is expected to run against.
    pub chain_id: u64,
    /// Fee paid when submitting a new campaign.
    pub creation_fee_wei: u128,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load optional .env file (ignored if missing).
        let _ = dotenvy::dotenv();

        Ok(Config {
            store_address: env_var("STORE_ADDRESS").map_err(|_| {
                ClientError::Config("STORE_ADDRESS environment variable is required".to_string())
            })?,
            chain_id: env_var("CHAIN_ID")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .map_err(|_| ClientError::Config("Invalid CHAIN_ID".to_string()))?,
            creation_fee_wei: env_var("CREATION_FEE_WEI")
                .unwrap_or_else(|_| DEFAULT_CREATION_FEE_WEI.to_string())
                .parse()
                .map_err(|_| ClientError::Config("Invalid CREATION_FEE_WEI".to_string()))?,
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| ClientError::Config(format!("Missing env var: {key}")))
}
