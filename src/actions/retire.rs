use std::sync::Arc;

use async_trait::async_trait;

use super::{Action, ActionOutcome};
use crate::dialogs::{Dialogs, RetirementChoice};
use crate::error::Result;
use crate::gateway::ContractGateway;
use crate::state::{RetirementStage, StateModel};

/// Two-transaction Atlas retirement.
///
/// The first run starts the retirement; a later run, once the stage is
/// `Started` either locally or on-chain, offers to finish or stop it. A
/// started retirement is never confirmed a second time.
pub struct RetireAction {
    address: String,
    state: Arc<StateModel>,
    gateway: Arc<dyn ContractGateway>,
    dialogs: Arc<dyn Dialogs>,
}

impl RetireAction {
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

    async fn start(&self) -> Result<ActionOutcome> {
        if !self.dialogs.confirm_retirement().await? {
            return Ok(ActionOutcome::Continue);
        }
        self.gateway.start_retirement().await?;
        self.state
            .set_retirement_stage(RetirementStage::Started)
            .await?;
        self.dialogs.retirement_start_successful().await?;
        Ok(ActionOutcome::Continue)
    }

    async fn resume(&self) -> Result<ActionOutcome> {
        match self.dialogs.continue_retirement().await? {
            RetirementChoice::Continue => {
                self.gateway.continue_retirement().await?;
                self.state
                    .set_retirement_stage(RetirementStage::Completed)
                    .await?;
                self.dialogs.retirement_successful().await?;
                Ok(ActionOutcome::Quit)
            }
            RetirementChoice::Stop => {
                self.gateway.stop_retirement().await?;
                self.state
                    .set_retirement_stage(RetirementStage::Stopped)
                    .await?;
                self.dialogs.retirement_stopped().await?;
                Ok(ActionOutcome::Continue)
            }
        }
    }
}

#[async_trait]
impl Action for RetireAction {
    async fn run(&self) -> Result<ActionOutcome> {
        let stage = self.state.get_retirement_stage().await?;
        if stage == RetirementStage::Completed {
            self.dialogs.already_retired().await?;
            return Ok(ActionOutcome::Continue);
        }

        let in_progress = stage.is_in_progress()
            || self.gateway.retirement_in_progress(&self.address).await?;
        if !in_progress {
            return self.start().await;
        }
        if stage != RetirementStage::Started {
            tracing::info!(%stage, "Retirement in progress on-chain, syncing local stage");
            self.state
                .set_retirement_stage(RetirementStage::Started)
                .await?;
        }
        self.resume().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::testing::{Answer, GatewayCall, MockGateway, ScriptedDialogs, temp_state};

    #[tokio::test]
    async fn first_run_starts_second_run_completes() {
        let (state, _dir) = temp_state().await;
        let gateway = Arc::new(MockGateway::new());
        let dialogs = Arc::new(ScriptedDialogs::new(vec![
            Answer::Confirm(true),
            Answer::Retirement(RetirementChoice::Continue),
        ]));
        let action = RetireAction::new("0xabc".into(), state.clone(), gateway.clone(), dialogs.clone());

        assert_eq!(action.run().await.unwrap(), ActionOutcome::Continue);
        assert_eq!(
            state.get_retirement_stage().await.unwrap(),
            RetirementStage::Started
        );

        assert_eq!(action.run().await.unwrap(), ActionOutcome::Quit);
        assert_eq!(
            state.get_retirement_stage().await.unwrap(),
            RetirementStage::Completed
        );
        assert_eq!(
            gateway.calls(),
            vec![GatewayCall::StartRetirement, GatewayCall::ContinueRetirement]
        );
        assert_eq!(
            dialogs.calls(),
            vec![
                "confirm_retirement",
                "retirement_start_successful",
                "continue_retirement",
                "retirement_successful",
            ]
        );
    }

    #[tokio::test]
    async fn on_chain_progress_skips_confirmation() {
        let (state, _dir) = temp_state().await;
        let gateway = Arc::new(MockGateway::new().retiring());
        let dialogs = Arc::new(ScriptedDialogs::new(vec![Answer::Retirement(
            RetirementChoice::Stop,
        )]));
        let action = RetireAction::new("0xabc".into(), state.clone(), gateway.clone(), dialogs.clone());

        assert_eq!(action.run().await.unwrap(), ActionOutcome::Continue);
        assert_eq!(
            state.get_retirement_stage().await.unwrap(),
            RetirementStage::Stopped
        );
        assert_eq!(dialogs.calls(), vec!["continue_retirement", "retirement_stopped"]);
        assert_eq!(gateway.calls(), vec![GatewayCall::StopRetirement]);
    }

    #[tokio::test]
    async fn failed_start_leaves_stage_untouched() {
        let (state, _dir) = temp_state().await;
        let gateway = Arc::new(MockGateway::new().failing_writes(GatewayError::Network("down".into())));
        let dialogs = Arc::new(ScriptedDialogs::new(vec![Answer::Confirm(true)]));
        let action = RetireAction::new("0xabc".into(), state.clone(), gateway, dialogs);

        assert!(action.run().await.unwrap_err().is_network());
        assert_eq!(
            state.get_retirement_stage().await.unwrap(),
            RetirementStage::NotStarted
        );
    }

    #[tokio::test]
    async fn completed_retirement_is_final() {
        let (state, _dir) = temp_state().await;
        state
            .set_retirement_stage(RetirementStage::Started)
            .await
            .unwrap();
        state
            .set_retirement_stage(RetirementStage::Completed)
            .await
            .unwrap();
        let gateway = Arc::new(MockGateway::new());
        let dialogs = Arc::new(ScriptedDialogs::new(vec![]));
        let action = RetireAction::new("0xabc".into(), state, gateway.clone(), dialogs.clone());
        assert_eq!(action.run().await.unwrap(), ActionOutcome::Continue);
        assert_eq!(dialogs.calls(), vec!["already_retired"]);
        assert!(gateway.calls().is_empty());
    }
}
