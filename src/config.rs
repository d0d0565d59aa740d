//! Configuration types.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Wizard configuration.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    /// Location of the persisted onboarding state file.
    pub state_path: PathBuf,
    /// Directory receiving the accepted ToS file and the log file.
    pub output_dir: PathBuf,
    /// JSON file listing the selectable networks.
    pub networks_path: PathBuf,
    /// Terms of service text the operator must accept.
    pub tos_path: PathBuf,
    /// Consecutive gateway network failures tolerated by the action menu.
    pub max_gateway_failures: u32,
    /// Per-request timeout for gateway calls.
    pub rpc_timeout: Duration,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("./state.json"),
            output_dir: PathBuf::from("./output"),
            networks_path: PathBuf::from("./config/networks.json"),
            tos_path: PathBuf::from("./config/tos.txt"),
            max_gateway_failures: 3,
            rpc_timeout: Duration::from_secs(30),
        }
    }
}

impl WizardConfig {
    /// Build the configuration from `ONBOARDING_*` environment variables,
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let path_var = |key: &str, fallback: PathBuf| {
            std::env::var(key).map(PathBuf::from).unwrap_or(fallback)
        };

        let max_gateway_failures = match std::env::var("ONBOARDING_MAX_GATEWAY_FAILURES") {
            Ok(raw) => parse_positive(&raw, "ONBOARDING_MAX_GATEWAY_FAILURES")?,
            Err(_) => defaults.max_gateway_failures,
        };

        let rpc_timeout = match std::env::var("ONBOARDING_RPC_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(u64::from(parse_positive(
                &raw,
                "ONBOARDING_RPC_TIMEOUT_SECS",
            )?)),
            Err(_) => defaults.rpc_timeout,
        };

        Ok(Self {
            state_path: path_var("ONBOARDING_STATE_PATH", defaults.state_path),
            output_dir: path_var("ONBOARDING_OUTPUT_DIR", defaults.output_dir),
            networks_path: path_var("ONBOARDING_NETWORKS_PATH", defaults.networks_path),
            tos_path: path_var("ONBOARDING_TOS_PATH", defaults.tos_path),
            max_gateway_failures,
            rpc_timeout,
        })
    }
}

fn parse_positive(raw: &str, key: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a positive integer, got '{raw}'"),
        }),
    }
}

/// Connection parameters of one selectable network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    /// Catalog name, e.g. "main" or "test".
    pub name: String,
    /// JSON-RPC endpoint of the registry gateway.
    pub rpc: String,
    pub chain_id: u64,
    pub head_contract_address: String,
    /// Domain suffix used by the node's deployment artifacts.
    pub domain: String,
}

/// Load the network catalog. An empty catalog is an error since no phase can
/// proceed without a network.
pub fn load_networks(path: &Path) -> Result<Vec<NetworkInfo>, ConfigError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: display.clone(),
        source,
    })?;
    let networks: Vec<NetworkInfo> =
        serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: display.clone(),
            message: e.to_string(),
        })?;
    if networks.is_empty() {
        return Err(ConfigError::NoNetworks(display));
    }
    Ok(networks)
}

/// Read the terms of service text.
pub fn load_tos_text(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path)
        .map(|text| text.trim_end().to_string())
        .map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })
}
