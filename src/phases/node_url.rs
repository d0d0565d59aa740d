use std::sync::Arc;

use async_trait::async_trait;

use super::{Phase, PhaseOutcome, stored_or_retry};
use crate::dialogs::Dialogs;
use crate::error::Result;
use crate::state::StateModel;

/// Public URL for Atlas and Hermes nodes.
pub struct GetNodeUrlPhase {
    state: Arc<StateModel>,
    dialogs: Arc<dyn Dialogs>,
}

impl GetNodeUrlPhase {
    pub fn new(state: Arc<StateModel>, dialogs: Arc<dyn Dialogs>) -> Self {
        Self { state, dialogs }
    }
}

#[async_trait]
impl Phase for GetNodeUrlPhase {
    type Output = String;

    fn name(&self) -> &'static str {
        "node_url"
    }

    async fn run(&self) -> Result<PhaseOutcome<String>> {
        if let Some(url) = self.state.get_node_url().await? {
            self.dialogs.node_url_detected(&url).await?;
            return Ok(PhaseOutcome::Skipped(url));
        }

        let url = loop {
            let url = self.dialogs.ask_for_node_url().await?;
            let result = self.state.store_node_url(&url).await;
            if stored_or_retry(self.dialogs.as_ref(), result).await? {
                break url;
            }
        };
        self.dialogs.node_url_detected(&url).await?;
        Ok(PhaseOutcome::Collected(url))
    }
}
