use std::sync::Arc;

use async_trait::async_trait;

use super::{Phase, PhaseOutcome, stored_or_retry};
use crate::dialogs::Dialogs;
use crate::error::Result;
use crate::state::{NodeRole, StateModel};

/// Choose the node role. Apollo operators also state the minimal deposit
/// they intend to stake, used later as the preferred deposit.
pub struct SelectRolePhase {
    state: Arc<StateModel>,
    dialogs: Arc<dyn Dialogs>,
}

impl SelectRolePhase {
    pub fn new(state: Arc<StateModel>, dialogs: Arc<dyn Dialogs>) -> Self {
        Self { state, dialogs }
    }
}

#[async_trait]
impl Phase for SelectRolePhase {
    type Output = NodeRole;

    fn name(&self) -> &'static str {
        "select_role"
    }

    async fn run(&self) -> Result<PhaseOutcome<NodeRole>> {
        if let Some(role) = self.state.get_role().await? {
            self.dialogs.role_selected(role).await?;
            return Ok(PhaseOutcome::Skipped(role));
        }

        let role = self.dialogs.ask_for_node_type().await?;
        if role == NodeRole::Apollo && self.state.get_apollo_minimal_deposit().await?.is_none() {
            loop {
                let deposit = self.dialogs.ask_for_apollo_minimal_deposit().await?;
                let result = self.state.store_apollo_minimal_deposit(deposit).await;
                if stored_or_retry(self.dialogs.as_ref(), result).await? {
                    break;
                }
            }
        }
        self.state.store_role(role).await?;
        tracing::info!(%role, "Node role selected");
        self.dialogs.role_selected(role).await?;
        Ok(PhaseOutcome::Collected(role))
    }
}
