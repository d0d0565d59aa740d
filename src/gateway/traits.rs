//! `ContractGateway` trait: the registry, whitelist, payout and role
//! contracts as seen by phases and actions.

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::crypto;
use crate::error::{GatewayError, ValidationError};
use crate::state::NodeRole;

/// Whitelisting data recorded on-chain for an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistEntry {
    /// Role the address was whitelisted for.
    pub role: NodeRole,
    /// Deposit that must accompany the onboarding transaction.
    pub required_deposit: Decimal,
}

/// Read/write operations against the network's contracts.
///
/// Every failure is pre-classified into a [`GatewayError`] category; callers
/// branch on the category, never on message text. Network-level timeouts and
/// retries are the implementation's concern.
#[async_trait]
pub trait ContractGateway: Send + Sync {
    /// Whitelisting data for `address`, `None` if it is not whitelisted.
    async fn whitelist_status(&self, address: &str)
    -> Result<Option<WhitelistEntry>, GatewayError>;

    /// Spendable balance of `address`.
    async fn get_balance(&self, address: &str) -> Result<Decimal, GatewayError>;

    /// Role `address` is currently onboarded as, if any.
    async fn onboarded_role(&self, address: &str) -> Result<Option<NodeRole>, GatewayError>;

    /// Register the node. `endpoint` is the URL (Atlas/Hermes) or IP (Apollo).
    async fn submit_onboarding(
        &self,
        role: NodeRole,
        deposit: Decimal,
        endpoint: &str,
    ) -> Result<(), GatewayError>;

    async fn change_url(&self, new_url: &str) -> Result<(), GatewayError>;

    /// Payout currently available to `address`.
    async fn get_payout(&self, address: &str) -> Result<Decimal, GatewayError>;

    async fn withdraw_payout(&self, amount: Decimal) -> Result<(), GatewayError>;

    /// Whether a retirement was started on-chain and not yet finished.
    async fn retirement_in_progress(&self, address: &str) -> Result<bool, GatewayError>;

    async fn start_retirement(&self) -> Result<(), GatewayError>;

    async fn continue_retirement(&self) -> Result<(), GatewayError>;

    async fn stop_retirement(&self) -> Result<(), GatewayError>;

    fn hash_data(&self, text: &str) -> String {
        crypto::hash_data(text)
    }

    fn sign_message(&self, text: &str, key: &SecretString) -> Result<String, ValidationError> {
        crypto::sign_message(text, key)
    }
}
