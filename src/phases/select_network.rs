use std::sync::Arc;

use async_trait::async_trait;

use super::{Phase, PhaseOutcome};
use crate::config::NetworkInfo;
use crate::dialogs::Dialogs;
use crate::error::{ConfigError, Result};
use crate::state::StateModel;

/// Pick the network to join from the bundled catalog.
///
/// A stored network whose parameters drifted from the catalog is refreshed
/// in place and the operator is told to restart the node containers. A
/// catalog with a single entry is selected without asking.
pub struct SelectNetworkPhase {
    networks: Vec<NetworkInfo>,
    state: Arc<StateModel>,
    dialogs: Arc<dyn Dialogs>,
}

impl SelectNetworkPhase {
    pub fn new(networks: Vec<NetworkInfo>, state: Arc<StateModel>, dialogs: Arc<dyn Dialogs>) -> Self {
        Self {
            networks,
            state,
            dialogs,
        }
    }

    fn find(&self, name: &str) -> Option<&NetworkInfo> {
        self.networks.iter().find(|n| n.name == name)
    }
}

#[async_trait]
impl Phase for SelectNetworkPhase {
    type Output = NetworkInfo;

    fn name(&self) -> &'static str {
        "select_network"
    }

    async fn run(&self) -> Result<PhaseOutcome<NetworkInfo>> {
        if let Some(stored) = self.state.get_network().await? {
            match self.find(&stored.name) {
                Some(current) if *current == stored => {
                    self.dialogs.network_selected(&stored).await?;
                    return Ok(PhaseOutcome::Skipped(stored));
                }
                Some(current) => {
                    tracing::info!(network = %current.name, "Stored network parameters changed, refreshing");
                    self.state.store_network(current).await?;
                    self.dialogs.docker_restart_required().await?;
                    self.dialogs.network_selected(current).await?;
                    return Ok(PhaseOutcome::Collected(current.clone()));
                }
                None => {
                    tracing::warn!(network = %stored.name, "Stored network is no longer in the catalog");
                }
            }
        }

        let chosen = match self.networks.as_slice() {
            [] => return Err(ConfigError::NoNetworks("catalog is empty".into()).into()),
            [only] => only.clone(),
            many => self.dialogs.ask_for_network(many).await?,
        };
        self.state.store_network(&chosen).await?;
        tracing::info!(network = %chosen.name, chain_id = chosen.chain_id, "Network selected");
        self.dialogs.network_selected(&chosen).await?;
        Ok(PhaseOutcome::Collected(chosen))
    }
}
