mod file_config;

pub use file_config::FileConfig;

use crate::gemini::DEFAULT_GEMINI_MODEL;
use anyhow::{bail, Result};

pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_GEMINI_MODEL: &str = "GEMINI_MODEL";
pub const ENV_BLOCKCHAIN_RPC_URL: &str = "BLOCKCHAIN_RPC_URL";
pub const ENV_ALCHEMY_API_KEY: &str = "ALCHEMY_API_KEY";

/// Environment-derived secrets, validated once at startup.
///
/// Every missing required key is reported in a single error so a
/// misconfigured deployment fails fast with the full list instead of one
/// key at a time.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub rpc_url: String,
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        let mut missing = Vec::new();

        let gemini_api_key = non_empty_var(ENV_GEMINI_API_KEY);
        if gemini_api_key.is_none() {
            missing.push(ENV_GEMINI_API_KEY.to_string());
        }

        // A full RPC URL wins; otherwise derive the Alchemy Base Sepolia
        // endpoint from the bare API key, as the hosted deployment does.
        let rpc_url = non_empty_var(ENV_BLOCKCHAIN_RPC_URL).or_else(|| {
            non_empty_var(ENV_ALCHEMY_API_KEY)
                .map(|key| format!("https://base-sepolia.g.alchemy.com/v2/{}", key))
        });
        if rpc_url.is_none() {
            missing.push(format!(
                "{} (or {})",
                ENV_BLOCKCHAIN_RPC_URL, ENV_ALCHEMY_API_KEY
            ));
        }

        if !missing.is_empty() {
            bail!(
                "Missing required environment variables: {}",
                missing.join(", ")
            );
        }

        Ok(Secrets {
            gemini_api_key: gemini_api_key.unwrap(),
            gemini_model: non_empty_var(ENV_GEMINI_MODEL)
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            rpc_url: rpc_url.unwrap(),
        })
    }
}
