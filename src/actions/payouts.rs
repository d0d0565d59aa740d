use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::{Action, ActionOutcome};
use crate::dialogs::Dialogs;
use crate::error::Result;
use crate::gateway::ContractGateway;
use crate::state::StateModel;

/// Withdraw accumulated payouts.
pub struct PayoutsAction {
    address: String,
    state: Arc<StateModel>,
    gateway: Arc<dyn ContractGateway>,
    dialogs: Arc<dyn Dialogs>,
}

impl PayoutsAction {
    pub fn new(
        address: String,
        state: Arc<StateModel>,
        gateway: Arc<dyn ContractGateway>,
        dialogs: Arc<dyn Dialogs>,
    ) -> Self {
        Self {
            address,
            state,
            gateway,
            dialogs,
        }
    }
}

#[async_trait]
impl Action for PayoutsAction {
    async fn run(&self) -> Result<ActionOutcome> {
        let amount = self.gateway.get_payout(&self.address).await?;
        self.dialogs.available_payout(amount).await?;
        if amount <= Decimal::ZERO {
            self.dialogs.nothing_to_withdraw().await?;
            return Ok(ActionOutcome::Continue);
        }
        if !self.dialogs.confirm_payout_withdrawal(amount).await? {
            return Ok(ActionOutcome::Continue);
        }

        self.gateway.withdraw_payout(amount).await?;
        self.state.record_withdrawal(amount).await?;
        tracing::info!(%amount, "Payout withdrawn");
        self.dialogs.withdrawal_successful(amount).await?;
        Ok(ActionOutcome::Continue)
    }
}
