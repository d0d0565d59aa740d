//! StateModel: typed accessors over the persisted state store.
//!
//! This is the only component that writes to the store. Getters return
//! `Ok(None)` for absent facts; setters validate shape before persisting.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::NetworkInfo;
use crate::crypto;
use crate::error::{Error, Result, StoreError};
use crate::store::StateStore;

use super::model::{NodeRole, RetirementStage, TosAcceptance, Withdrawal, state_keys};
use super::validation;

/// File name of the accepted terms written to the output directory.
pub const TOS_FILE_NAME: &str = "TOS.txt";

/// Typed view of the onboarding state.
pub struct StateModel {
    store: Arc<dyn StateStore>,
    output_dir: PathBuf,
}

impl StateModel {
    pub fn new(store: Arc<dyn StateStore>, output_dir: PathBuf) -> Self {
        Self { store, output_dir }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(key).await? {
            None => Ok(None),
            Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
                Error::Store(StoreError::Corrupt {
                    path: key.to_string(),
                    message: e.to_string(),
                })
            }),
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_value(value).map_err(|e| StoreError::Serialization {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.store.set(key, json).await?;
        Ok(())
    }

    // ── Private key ─────────────────────────────────────────────────

    pub async fn get_private_key(&self) -> Result<Option<SecretString>> {
        Ok(self
            .read::<String>(state_keys::PRIVATE_KEY)
            .await?
            .map(SecretString::from))
    }

    /// Store the operator's key. A key that is already present is kept.
    pub async fn store_private_key(&self, key: &SecretString) -> Result<()> {
        crypto::parse_private_key(key)?;
        if self.store.contains(state_keys::PRIVATE_KEY).await? {
            tracing::warn!("Private key already stored, keeping the existing one");
            return Ok(());
        }
        self.write(state_keys::PRIVATE_KEY, &key.expose_secret())
            .await
    }

    pub async fn generate_and_store_private_key(&self) -> Result<SecretString> {
        let key = crypto::generate_private_key();
        self.store_private_key(&key).await?;
        self.get_private_key()
            .await?
            .ok_or_else(|| Error::Fatal("private key missing right after write".into()))
    }

    /// Address derived from the stored key.
    pub async fn get_address(&self) -> Result<Option<String>> {
        match self.get_private_key().await? {
            Some(key) => Ok(Some(crypto::address_of(&key)?)),
            None => Ok(None),
        }
    }

    // ── Network ─────────────────────────────────────────────────────

    pub async fn get_network(&self) -> Result<Option<NetworkInfo>> {
        self.read(state_keys::NETWORK).await
    }

    /// Record the selected network. Switching to a different network name
    /// once one is chosen is refused; refreshing the same network's
    /// parameters is allowed.
    pub async fn store_network(&self, network: &NetworkInfo) -> Result<()> {
        validation::validate_url(&network.rpc)?;
        if let Some(existing) = self.get_network().await?
            && existing.name != network.name
            && self.is_onboarding_complete().await?
        {
            return Err(Error::Fatal(format!(
                "node is onboarded on '{}', refusing to switch to '{}'",
                existing.name, network.name
            )));
        }
        self.write(state_keys::NETWORK, network).await
    }

    // ── Role ────────────────────────────────────────────────────────

    pub async fn get_role(&self) -> Result<Option<NodeRole>> {
        self.read(state_keys::NODE_ROLE).await
    }

    pub async fn store_role(&self, role: NodeRole) -> Result<()> {
        match self.get_role().await? {
            Some(existing) if existing == role => Ok(()),
            Some(existing) => Err(Error::Fatal(format!(
                "role already set to {existing}, refusing to change it to {role}"
            ))),
            None => self.write(state_keys::NODE_ROLE, &role).await,
        }
    }

    pub async fn get_apollo_minimal_deposit(&self) -> Result<Option<Decimal>> {
        self.read(state_keys::APOLLO_MINIMAL_DEPOSIT).await
    }

    pub async fn store_apollo_minimal_deposit(&self, deposit: Decimal) -> Result<()> {
        validation::validate_amount(deposit)?;
        self.write(state_keys::APOLLO_MINIMAL_DEPOSIT, &deposit).await
    }

    // ── Identifying data ────────────────────────────────────────────

    pub async fn get_node_url(&self) -> Result<Option<String>> {
        self.read(state_keys::NODE_URL).await
    }

    /// Set or replace the node URL (replacement only happens through the
    /// change-URL action after the gateway accepted it).
    pub async fn store_node_url(&self, url: &str) -> Result<()> {
        validation::validate_url(url)?;
        self.write(state_keys::NODE_URL, &url).await
    }

    pub async fn get_node_ip(&self) -> Result<Option<String>> {
        self.read(state_keys::NODE_IP).await
    }

    pub async fn store_node_ip(&self, ip: &str) -> Result<()> {
        validation::validate_ip(ip)?;
        self.write(state_keys::NODE_IP, &ip).await
    }

    /// `Some("")` means the operator declined to give an email.
    pub async fn get_user_email(&self) -> Result<Option<String>> {
        self.read(state_keys::USER_EMAIL).await
    }

    pub async fn store_user_email(&self, email: Option<&str>) -> Result<()> {
        let email = email.unwrap_or_default();
        if !email.is_empty() {
            validation::validate_email(email)?;
        }
        self.write(state_keys::USER_EMAIL, &email).await
    }

    // ── Terms of service ────────────────────────────────────────────

    pub async fn get_signed_tos(&self) -> Result<Option<TosAcceptance>> {
        self.read(state_keys::TOS_ACCEPTANCE).await
    }

    pub async fn tos_hash(&self) -> Result<Option<String>> {
        Ok(self.get_signed_tos().await?.map(|tos| tos.hash))
    }

    /// Persist the acceptance record. Append-only: if a record exists it is
    /// returned unchanged and `tos` is discarded.
    pub async fn store_signed_tos(&self, tos: TosAcceptance) -> Result<TosAcceptance> {
        if let Some(existing) = self.get_signed_tos().await? {
            return Ok(existing);
        }
        self.write(state_keys::TOS_ACCEPTANCE, &tos).await?;
        Ok(tos)
    }

    /// Write the accepted terms to the output directory. Skipped once a
    /// signed record exists so the file always matches the signature.
    pub async fn create_tos_file(&self, accepted_text: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(TOS_FILE_NAME);
        if self.get_signed_tos().await?.is_some() && tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(path);
        }
        let io_err = |source| StoreError::Io {
            path: path.display().to_string(),
            source,
        };
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(io_err)?;
        tokio::fs::write(&path, accepted_text).await.map_err(io_err)?;
        Ok(path)
    }

    // ── Completion ──────────────────────────────────────────────────

    pub async fn is_onboarding_complete(&self) -> Result<bool> {
        Ok(self
            .read::<bool>(state_keys::ONBOARDING_COMPLETE)
            .await?
            .unwrap_or(false))
    }

    pub async fn mark_onboarding_complete(&self) -> Result<()> {
        self.write(state_keys::ONBOARDING_COMPLETE, &true).await
    }

    /// Completion marker plus every field the recorded role depends on.
    pub async fn has_completed_onboarding(&self) -> Result<bool> {
        if !self.is_onboarding_complete().await? {
            return Ok(false);
        }
        if self.get_private_key().await?.is_none() || self.get_network().await?.is_none() {
            return Ok(false);
        }
        let Some(role) = self.get_role().await? else {
            return Ok(false);
        };
        if role.requires_url() && self.get_node_url().await?.is_none() {
            return Ok(false);
        }
        if role.requires_ip() && self.get_node_ip().await?.is_none() {
            return Ok(false);
        }
        Ok(true)
    }

    // ── Post-setup facts ────────────────────────────────────────────

    pub async fn get_retirement_stage(&self) -> Result<RetirementStage> {
        Ok(self
            .read(state_keys::RETIREMENT)
            .await?
            .unwrap_or_default())
    }

    /// Advance the retirement state machine; invalid transitions are
    /// invariant violations.
    pub async fn set_retirement_stage(&self, stage: RetirementStage) -> Result<()> {
        let current = self.get_retirement_stage().await?;
        if current == stage {
            return Ok(());
        }
        if !current.can_transition_to(stage) {
            return Err(Error::Fatal(format!(
                "invalid retirement transition {current} -> {stage}"
            )));
        }
        self.write(state_keys::RETIREMENT, &stage).await?;
        tracing::info!(from = %current, to = %stage, "Retirement stage changed");
        Ok(())
    }

    pub async fn get_last_withdrawal(&self) -> Result<Option<Withdrawal>> {
        self.read(state_keys::LAST_WITHDRAWAL).await
    }

    pub async fn record_withdrawal(&self, amount: Decimal) -> Result<()> {
        let withdrawal = Withdrawal {
            amount,
            at: Utc::now(),
        };
        self.write(state_keys::LAST_WITHDRAWAL, &withdrawal).await
    }
}
