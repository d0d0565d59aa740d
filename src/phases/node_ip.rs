use std::sync::Arc;

use async_trait::async_trait;

use super::{Phase, PhaseOutcome, stored_or_retry};
use crate::dialogs::Dialogs;
use crate::error::Result;
use crate::state::StateModel;

/// Public IPv4 address for Apollo nodes.
pub struct GetNodeIpPhase {
    state: Arc<StateModel>,
    dialogs: Arc<dyn Dialogs>,
}

impl GetNodeIpPhase {
    pub fn new(state: Arc<StateModel>, dialogs: Arc<dyn Dialogs>) -> Self {
        Self { state, dialogs }
    }
}

#[async_trait]
impl Phase for GetNodeIpPhase {
    type Output = String;

    fn name(&self) -> &'static str {
        "node_ip"
    }

    async fn run(&self) -> Result<PhaseOutcome<String>> {
        if let Some(ip) = self.state.get_node_ip().await? {
            self.dialogs.node_ip_detected(&ip).await?;
            return Ok(PhaseOutcome::Skipped(ip));
        }

        let ip = loop {
            let ip = self.dialogs.ask_for_node_ip().await?;
            let result = self.state.store_node_ip(&ip).await;
            if stored_or_retry(self.dialogs.as_ref(), result).await? {
                break ip;
            }
        };
        self.dialogs.node_ip_detected(&ip).await?;
        Ok(PhaseOutcome::Collected(ip))
    }
}
