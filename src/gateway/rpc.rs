//! JSON-RPC gateway talking to the network's registry endpoint.
//!
//! Reads are plain JSON-RPC calls. Writes carry the sender address and an
//! EIP-191 signature over `method` + newline + the JSON-encoded params, so
//! the endpoint can attribute them without this tool encoding transactions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::traits::{ContractGateway, WhitelistEntry};
use crate::config::NetworkInfo;
use crate::crypto;
use crate::error::GatewayError;
use crate::state::NodeRole;

/// Gateway bound to one network and one signing key.
pub struct RpcGateway {
    endpoint: String,
    head_contract: String,
    address: String,
    key: SecretString,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcGateway {
    pub fn new(
        network: &NetworkInfo,
        key: SecretString,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let address = crypto::address_of(&key)
            .map_err(|e| GatewayError::Rejected(e.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        Ok(Self {
            endpoint: network.rpc.clone(),
            head_contract: network.head_contract_address.clone(),
            address,
            key,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    /// Address transactions are sent from.
    pub fn address(&self) -> &str {
        &self.address
    }

    async fn call_raw(&self, method: &str, params: Value) -> Result<Value, GatewayError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!(method, id, "Gateway call");
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(GatewayError::Network(format!(
                "{method}: HTTP {}",
                resp.status()
            )));
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        if let Some(error) = data.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error")
                .to_string();
            tracing::warn!(method, %message, "Gateway call failed");
            return Err(GatewayError::classify(message));
        }

        data.get("result")
            .cloned()
            .ok_or_else(|| GatewayError::InvalidResponse(format!("{method}: missing result")))
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, GatewayError> {
        let result = self.call_raw(method, params).await?;
        serde_json::from_value(result)
            .map_err(|e| GatewayError::InvalidResponse(format!("{method}: {e}")))
    }

    /// Signed state-changing call.
    async fn send(&self, method: &str, params: Value) -> Result<(), GatewayError> {
        let payload = format!("{method}\n{params}");
        let signature = crypto::sign_message(&payload, &self.key)
            .map_err(|e| GatewayError::Rejected(e.to_string()))?;
        let envelope = json!({
            "head": self.head_contract,
            "from": self.address,
            "params": params,
            "signature": signature,
        });
        self.call_raw(method, envelope).await?;
        tracing::info!(method, "Gateway transaction accepted");
        Ok(())
    }
}

#[async_trait]
impl ContractGateway for RpcGateway {
    async fn whitelist_status(
        &self,
        address: &str,
    ) -> Result<Option<WhitelistEntry>, GatewayError> {
        self.call("kyc_whitelistStatus", json!([address])).await
    }

    async fn get_balance(&self, address: &str) -> Result<Decimal, GatewayError> {
        self.call("account_balance", json!([address])).await
    }

    async fn onboarded_role(&self, address: &str) -> Result<Option<NodeRole>, GatewayError> {
        self.call("roles_onboardedRole", json!([address])).await
    }

    async fn submit_onboarding(
        &self,
        role: NodeRole,
        deposit: Decimal,
        endpoint: &str,
    ) -> Result<(), GatewayError> {
        self.send(
            "roles_onboard",
            json!({ "role": role, "deposit": deposit, "endpoint": endpoint }),
        )
        .await
    }

    async fn change_url(&self, new_url: &str) -> Result<(), GatewayError> {
        self.send("roles_setUrl", json!({ "url": new_url })).await
    }

    async fn get_payout(&self, address: &str) -> Result<Decimal, GatewayError> {
        self.call("payouts_available", json!([address])).await
    }

    async fn withdraw_payout(&self, amount: Decimal) -> Result<(), GatewayError> {
        self.send("payouts_withdraw", json!({ "amount": amount })).await
    }

    async fn retirement_in_progress(&self, address: &str) -> Result<bool, GatewayError> {
        self.call("roles_isRetiring", json!([address])).await
    }

    async fn start_retirement(&self) -> Result<(), GatewayError> {
        self.send("roles_retireStart", json!({})).await
    }

    async fn continue_retirement(&self) -> Result<(), GatewayError> {
        self.send("roles_retireContinue", json!({})).await
    }

    async fn stop_retirement(&self) -> Result<(), GatewayError> {
        self.send("roles_retireStop", json!({})).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network(rpc: &str) -> NetworkInfo {
        NetworkInfo {
            name: "test".into(),
            rpc: rpc.into(),
            chain_id: 22,
            head_contract_address: "0x0000000000000000000000000000000000000F10".into(),
            domain: "test.example".into(),
        }
    }

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn derives_sender_address() {
        let gw = RpcGateway::new(
            &network("http://127.0.0.1:1"),
            SecretString::from(KEY),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(gw.address(), "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    }

    #[test]
    fn invalid_key_is_rejected() {
        let result = RpcGateway::new(
            &network("http://127.0.0.1:1"),
            SecretString::from("0x1"),
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(GatewayError::Rejected(_))));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_network_error() {
        // Port 1 on loopback is closed in any sane test environment.
        let gw = RpcGateway::new(
            &network("http://127.0.0.1:1"),
            SecretString::from(KEY),
            Duration::from_secs(2),
        )
        .unwrap();
        let err = gw.get_balance(gw.address()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Network(_)));
    }
}
