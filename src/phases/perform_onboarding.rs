use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::{Phase, PhaseOutcome, RejectReason, missing};
use crate::dialogs::Dialogs;
use crate::error::{GatewayError, Result, ValidationError};
use crate::gateway::{ContractGateway, WhitelistEntry};
use crate::state::{NodeRole, StateModel};

/// Submit the onboarding transaction.
///
/// Completion is never assumed from local state alone: before submitting,
/// and again if the gateway reports the address as already registered, the
/// on-chain role is re-read. A match means an earlier run got through and
/// only the local marker is missing.
pub struct PerformOnboardingPhase {
    whitelist: WhitelistEntry,
    state: Arc<StateModel>,
    gateway: Arc<dyn ContractGateway>,
    dialogs: Arc<dyn Dialogs>,
}

impl PerformOnboardingPhase {
    pub fn new(
        whitelist: WhitelistEntry,
        state: Arc<StateModel>,
        gateway: Arc<dyn ContractGateway>,
        dialogs: Arc<dyn Dialogs>,
    ) -> Self {
        Self {
            whitelist,
            state,
            gateway,
            dialogs,
        }
    }

    /// Reconcile with an existing on-chain registration, if there is one.
    async fn reconcile(&self, address: &str, role: NodeRole) -> Result<Option<PhaseOutcome<()>>> {
        match self.gateway.onboarded_role(address).await? {
            None => Ok(None),
            Some(onchain) if onchain == role => {
                tracing::info!(%role, "Address already onboarded on-chain, recording completion");
                self.state.mark_onboarding_complete().await?;
                self.dialogs.already_onboarded(onchain).await?;
                Ok(Some(PhaseOutcome::Skipped(())))
            }
            Some(onchain) => {
                tracing::warn!(%onchain, chosen = %role, "Address onboarded with a different role");
                self.dialogs.already_onboarded(onchain).await?;
                Ok(Some(PhaseOutcome::Rejected(RejectReason::AlreadyOnboarded {
                    role: onchain,
                })))
            }
        }
    }

    async fn choose_deposit(&self, role: NodeRole) -> Result<Decimal> {
        if role != NodeRole::Apollo {
            return Ok(self.whitelist.required_deposit);
        }
        let preferred = self.state.get_apollo_minimal_deposit().await?;
        let minimum = self.whitelist.required_deposit;
        loop {
            let deposit = self.dialogs.ask_for_apollo_deposit(minimum, preferred).await?;
            if deposit >= minimum {
                return Ok(deposit);
            }
            let error = ValidationError::Amount(format!("{deposit} is below the required {minimum}"));
            self.dialogs.invalid_input(&error).await?;
        }
    }
}

#[async_trait]
impl Phase for PerformOnboardingPhase {
    type Output = ();

    fn name(&self) -> &'static str {
        "perform_onboarding"
    }

    async fn run(&self) -> Result<PhaseOutcome<()>> {
        if self.state.is_onboarding_complete().await? {
            return Ok(PhaseOutcome::Skipped(()));
        }

        let address = self
            .state
            .get_address()
            .await?
            .ok_or_else(|| missing("private key"))?;
        let role = self.state.get_role().await?.ok_or_else(|| missing("node role"))?;
        let endpoint = if role.requires_ip() {
            self.state.get_node_ip().await?
        } else {
            self.state.get_node_url().await?
        }
        .ok_or_else(|| missing("node endpoint"))?;

        if let Some(outcome) = self.reconcile(&address, role).await? {
            return Ok(outcome);
        }

        let available = self.gateway.get_balance(&address).await?;
        let required = self.whitelist.required_deposit;
        if available < required {
            self.dialogs.not_enough_balance(required, available).await?;
            return Ok(PhaseOutcome::Rejected(RejectReason::InsufficientBalance {
                required,
                available,
            }));
        }

        let deposit = self.choose_deposit(role).await?;
        if available < deposit {
            self.dialogs.not_enough_balance(deposit, available).await?;
            return Ok(PhaseOutcome::Rejected(RejectReason::InsufficientBalance {
                required: deposit,
                available,
            }));
        }

        if !self
            .dialogs
            .onboarding_confirmation(&address, role, deposit)
            .await?
        {
            tracing::info!("Operator declined the onboarding transaction");
            return Ok(PhaseOutcome::Rejected(RejectReason::Declined));
        }

        tracing::info!(%role, %deposit, %endpoint, "Submitting onboarding transaction");
        match self.gateway.submit_onboarding(role, deposit, &endpoint).await {
            Ok(()) => {
                self.state.mark_onboarding_complete().await?;
                self.dialogs.onboarding_successful().await?;
                Ok(PhaseOutcome::Collected(()))
            }
            Err(GatewayError::InsufficientFunds(reason)) => {
                tracing::warn!(%reason, "Onboarding transaction failed for lack of funds");
                self.dialogs.insufficient_funds().await?;
                Ok(PhaseOutcome::Rejected(RejectReason::InsufficientFunds))
            }
            Err(GatewayError::AlreadyRegistered(reason)) => {
                tracing::warn!(%reason, "Gateway reports the address as registered");
                match self.reconcile(&address, role).await? {
                    Some(outcome) => Ok(outcome),
                    None => Err(GatewayError::AlreadyRegistered(reason).into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}
