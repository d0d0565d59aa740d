use std::sync::Arc;

use async_trait::async_trait;

use super::{Phase, PhaseOutcome, RejectReason, missing};
use crate::dialogs::Dialogs;
use crate::error::Result;
use crate::gateway::{ContractGateway, WhitelistEntry};
use crate::state::StateModel;

/// Check that the address was whitelisted, for the role the operator chose.
///
/// Whitelisting happens outside the wizard, so this phase never writes
/// state; it is re-run on every launch until it passes.
pub struct CheckWhitelistPhase {
    state: Arc<StateModel>,
    gateway: Arc<dyn ContractGateway>,
    dialogs: Arc<dyn Dialogs>,
}

impl CheckWhitelistPhase {
    pub fn new(
        state: Arc<StateModel>,
        gateway: Arc<dyn ContractGateway>,
        dialogs: Arc<dyn Dialogs>,
    ) -> Self {
        Self {
            state,
            gateway,
            dialogs,
        }
    }
}

#[async_trait]
impl Phase for CheckWhitelistPhase {
    type Output = WhitelistEntry;

    fn name(&self) -> &'static str {
        "check_whitelist"
    }

    async fn run(&self) -> Result<PhaseOutcome<WhitelistEntry>> {
        let address = self
            .state
            .get_address()
            .await?
            .ok_or_else(|| missing("private key"))?;
        let chosen = self.state.get_role().await?.ok_or_else(|| missing("node role"))?;

        match self.gateway.whitelist_status(&address).await? {
            None => {
                self.dialogs.address_not_whitelisted(&address).await?;
                Ok(PhaseOutcome::Rejected(RejectReason::NotWhitelisted { address }))
            }
            Some(entry) if entry.role != chosen => {
                self.dialogs.role_mismatch(entry.role, chosen).await?;
                Ok(PhaseOutcome::Rejected(RejectReason::RoleMismatch {
                    whitelisted: entry.role,
                    chosen,
                }))
            }
            Some(entry) => {
                self.dialogs.address_whitelisted(&entry).await?;
                Ok(PhaseOutcome::Collected(entry))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::NodeRole;
    use crate::testing::{MockGateway, ScriptedDialogs, TEST_ADDRESS, TEST_KEY, temp_state};
    use rust_decimal_macros::dec;
    use secrecy::SecretString;

    async fn phase_with(
        role: NodeRole,
        gateway: MockGateway,
    ) -> (CheckWhitelistPhase, Arc<ScriptedDialogs>, tempfile::TempDir) {
        let (state, dir) = temp_state().await;
        state
            .store_private_key(&SecretString::from(TEST_KEY))
            .await
            .unwrap();
        state.store_role(role).await.unwrap();
        let dialogs = Arc::new(ScriptedDialogs::new(vec![]));
        let phase = CheckWhitelistPhase::new(state, Arc::new(gateway), dialogs.clone());
        (phase, dialogs, dir)
    }

    #[tokio::test]
    async fn unknown_address_is_rejected() {
        let (phase, dialogs, _dir) = phase_with(NodeRole::Atlas, MockGateway::new()).await;
        assert_eq!(
            phase.run().await.unwrap(),
            PhaseOutcome::Rejected(RejectReason::NotWhitelisted {
                address: TEST_ADDRESS.to_string()
            })
        );
        assert_eq!(dialogs.calls(), vec!["address_not_whitelisted"]);
    }

    #[tokio::test]
    async fn role_mismatch_is_rejected() {
        let gateway = MockGateway::new().whitelisted(NodeRole::Hermes, dec!(1000));
        let (phase, dialogs, _dir) = phase_with(NodeRole::Atlas, gateway).await;
        assert_eq!(
            phase.run().await.unwrap(),
            PhaseOutcome::Rejected(RejectReason::RoleMismatch {
                whitelisted: NodeRole::Hermes,
                chosen: NodeRole::Atlas
            })
        );
        assert_eq!(dialogs.calls(), vec!["role_mismatch"]);
    }

    #[tokio::test]
    async fn matching_entry_passes() {
        let gateway = MockGateway::new().whitelisted(NodeRole::Atlas, dec!(1000));
        let (phase, _dialogs, _dir) = phase_with(NodeRole::Atlas, gateway).await;
        let entry = phase.run().await.unwrap().into_value().unwrap();
        assert_eq!(entry.required_deposit, dec!(1000));
    }
}
