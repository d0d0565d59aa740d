use std::sync::Arc;

use async_trait::async_trait;

use super::{Action, ActionOutcome};
use crate::dialogs::Dialogs;
use crate::error::Result;
use crate::gateway::ContractGateway;
use crate::state::{StateModel, validation};

/// Point the on-chain registration at a new node URL.
pub struct ChangeUrlAction {
    state: Arc<StateModel>,
    gateway: Arc<dyn ContractGateway>,
    dialogs: Arc<dyn Dialogs>,
}

impl ChangeUrlAction {
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
impl Action for ChangeUrlAction {
    async fn run(&self) -> Result<ActionOutcome> {
        self.dialogs.nectar_warning().await?;
        let new_url = loop {
            let url = self.dialogs.ask_for_node_url().await?;
            match validation::validate_url(&url) {
                Ok(()) => break url,
                Err(e) => self.dialogs.invalid_input(&e).await?,
            }
        };
        let old_url = self.state.get_node_url().await?.unwrap_or_default();
        if !self
            .dialogs
            .change_url_confirmation(&old_url, &new_url)
            .await?
        {
            return Ok(ActionOutcome::Continue);
        }

        self.gateway.change_url(&new_url).await?;
        self.state.store_node_url(&new_url).await?;
        tracing::info!(old = %old_url, new = %new_url, "Node URL changed");
        self.dialogs.change_url_successful(&new_url).await?;
        Ok(ActionOutcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, GatewayError};
    use crate::testing::{Answer, GatewayCall, MockGateway, ScriptedDialogs, temp_state};

    #[tokio::test]
    async fn url_is_updated_after_the_gateway_accepts_it() {
        let (state, _dir) = temp_state().await;
        state.store_node_url("https://old.example.com").await.unwrap();
        let gateway = Arc::new(MockGateway::new());
        let dialogs = Arc::new(ScriptedDialogs::new(vec![
            Answer::Text("new.example.com".into()),
            Answer::Text("https://new.example.com".into()),
            Answer::Confirm(true),
        ]));
        let action = ChangeUrlAction::new(state.clone(), gateway.clone(), dialogs.clone());

        assert_eq!(action.run().await.unwrap(), ActionOutcome::Continue);
        assert_eq!(
            gateway.calls(),
            vec![GatewayCall::ChangeUrl("https://new.example.com".into())]
        );
        assert_eq!(
            state.get_node_url().await.unwrap().as_deref(),
            Some("https://new.example.com")
        );
        assert_eq!(
            dialogs.calls(),
            vec![
                "nectar_warning",
                "ask_for_node_url",
                "invalid_input",
                "ask_for_node_url",
                "change_url_confirmation",
                "change_url_successful",
            ]
        );
    }

    #[tokio::test]
    async fn rejected_change_keeps_the_old_url() {
        let (state, _dir) = temp_state().await;
        state.store_node_url("https://old.example.com").await.unwrap();
        let gateway = Arc::new(MockGateway::new().failing_writes(GatewayError::Rejected("nope".into())));
        let dialogs = Arc::new(ScriptedDialogs::new(vec![
            Answer::Text("https://new.example.com".into()),
            Answer::Confirm(true),
        ]));
        let action = ChangeUrlAction::new(state.clone(), gateway, dialogs);

        let err = action.run().await.unwrap_err();
        assert!(matches!(err, Error::Gateway(GatewayError::Rejected(_))));
        assert_eq!(
            state.get_node_url().await.unwrap().as_deref(),
            Some("https://old.example.com")
        );
    }
}
