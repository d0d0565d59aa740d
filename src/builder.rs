//! Composition root.
//!
//! Stage 1 holds what exists before the operator picked a network and a
//! key: the state model, dialogs, host probes and the static catalog. Stage 2
//! adds the gateway bound to that network and key, and owns every phase and
//! action that talks to it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use crate::actions::ActionMenu;
use crate::config::{self, NetworkInfo, WizardConfig};
use crate::crypto;
use crate::dialogs::{Dialogs, Messages, TerminalDialogs};
use crate::error::{GatewayError, Result};
use crate::gateway::{ContractGateway, RpcGateway, WhitelistEntry};
use crate::phases::{
    AcceptTosPhase, CheckDockerPhase, CheckWhitelistPhase, GetNodeIpPhase, GetNodeUrlPhase,
    GetPrivateKeyPhase, GetUserEmailPhase, ManualSubmissionPhase, PerformOnboardingPhase,
    SelectNetworkPhase, SelectRolePhase,
};
use crate::state::{NodeRole, StateModel};
use crate::store::FileStore;
use crate::system::{DockerSystem, System};

/// Opens a gateway once the network and key are known.
pub trait GatewayConnector: Send + Sync {
    fn connect(
        &self,
        network: &NetworkInfo,
        key: SecretString,
    ) -> std::result::Result<Arc<dyn ContractGateway>, GatewayError>;
}

/// Connects over JSON-RPC.
pub struct RpcConnector {
    timeout: Duration,
}

impl RpcConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl GatewayConnector for RpcConnector {
    fn connect(
        &self,
        network: &NetworkInfo,
        key: SecretString,
    ) -> std::result::Result<Arc<dyn ContractGateway>, GatewayError> {
        let gateway = RpcGateway::new(network, key, self.timeout)?;
        tracing::info!(network = %network.name, rpc = %network.rpc, sender = %gateway.address(), "Gateway connected");
        Ok(Arc::new(gateway))
    }
}

/// Dependencies available before network selection.
pub struct Stage1 {
    pub state: Arc<StateModel>,
    pub dialogs: Arc<dyn Dialogs>,
    pub system: Arc<dyn System>,
    pub connector: Arc<dyn GatewayConnector>,
    pub networks: Vec<NetworkInfo>,
    pub tos_text: String,
    pub output_dir: PathBuf,
}

impl Stage1 {
    /// Production wiring: file-backed state, terminal dialogs, docker CLI
    /// probe and the JSON-RPC gateway.
    pub async fn from_config(config: &WizardConfig) -> Result<Self> {
        let networks = config::load_networks(&config.networks_path)?;
        let tos_text = config::load_tos_text(&config.tos_path)?;
        let store = FileStore::open(&config.state_path).await?;
        tracing::info!(
            state = %config.state_path.display(),
            networks = networks.len(),
            "Wizard dependencies ready"
        );
        Ok(Self {
            state: Arc::new(StateModel::new(
                Arc::new(store),
                config.output_dir.clone(),
            )),
            dialogs: Arc::new(TerminalDialogs::stdio(Messages::default())),
            system: Arc::new(DockerSystem::new()),
            connector: Arc::new(RpcConnector::new(config.rpc_timeout)),
            networks,
            tos_text,
            output_dir: config.output_dir.clone(),
        })
    }

    pub fn check_docker(&self) -> CheckDockerPhase {
        CheckDockerPhase::new(self.system.clone(), self.dialogs.clone())
    }

    pub fn private_key(&self) -> GetPrivateKeyPhase {
        GetPrivateKeyPhase::new(self.state.clone(), self.dialogs.clone())
    }

    pub fn select_network(&self) -> SelectNetworkPhase {
        SelectNetworkPhase::new(
            self.networks.clone(),
            self.state.clone(),
            self.dialogs.clone(),
        )
    }
}

/// Dependencies bound to the selected network and key.
pub struct Stage2 {
    pub network: NetworkInfo,
    pub address: String,
    pub gateway: Arc<dyn ContractGateway>,
    state: Arc<StateModel>,
    dialogs: Arc<dyn Dialogs>,
    tos_text: String,
}

/// Second construction stage: connect the gateway for `network` and `key`.
pub fn build_stage2(stage1: &Stage1, network: NetworkInfo, key: SecretString) -> Result<Stage2> {
    let address = crypto::address_of(&key)?;
    let gateway = stage1.connector.connect(&network, key)?;
    Ok(Stage2 {
        network,
        address,
        gateway,
        state: stage1.state.clone(),
        dialogs: stage1.dialogs.clone(),
        tos_text: stage1.tos_text.clone(),
    })
}

impl Stage2 {
    pub fn accept_tos(&self) -> AcceptTosPhase {
        AcceptTosPhase::new(
            self.tos_text.clone(),
            self.state.clone(),
            self.gateway.clone(),
            self.dialogs.clone(),
        )
    }

    pub fn select_role(&self) -> SelectRolePhase {
        SelectRolePhase::new(self.state.clone(), self.dialogs.clone())
    }

    pub fn node_url(&self) -> GetNodeUrlPhase {
        GetNodeUrlPhase::new(self.state.clone(), self.dialogs.clone())
    }

    pub fn node_ip(&self) -> GetNodeIpPhase {
        GetNodeIpPhase::new(self.state.clone(), self.dialogs.clone())
    }

    pub fn user_email(&self) -> GetUserEmailPhase {
        GetUserEmailPhase::new(self.state.clone(), self.dialogs.clone())
    }

    pub fn check_whitelist(&self) -> CheckWhitelistPhase {
        CheckWhitelistPhase::new(self.state.clone(), self.gateway.clone(), self.dialogs.clone())
    }

    pub fn manual_submission(&self) -> ManualSubmissionPhase {
        ManualSubmissionPhase::new(self.state.clone(), self.dialogs.clone())
    }

    pub fn perform_onboarding(&self, whitelist: WhitelistEntry) -> PerformOnboardingPhase {
        PerformOnboardingPhase::new(
            whitelist,
            self.state.clone(),
            self.gateway.clone(),
            self.dialogs.clone(),
        )
    }

    pub fn action_menu(&self, role: NodeRole) -> ActionMenu {
        ActionMenu::for_role(
            role,
            self.address.clone(),
            self.state.clone(),
            self.gateway.clone(),
            self.dialogs.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        MockGateway, ScriptedDialogs, StaticConnector, StubSystem, TEST_ADDRESS, TEST_KEY,
        network, temp_state,
    };

    #[tokio::test]
    async fn stage2_binds_address_and_gateway() {
        let (state, dir) = temp_state().await;
        let connector = Arc::new(StaticConnector::new(Arc::new(MockGateway::new())));
        let stage1 = Stage1 {
            state,
            dialogs: Arc::new(ScriptedDialogs::new(vec![])),
            system: Arc::new(StubSystem::new(true)),
            connector: connector.clone(),
            networks: vec![network("main")],
            tos_text: "Terms".into(),
            output_dir: dir.path().join("output"),
        };

        let stage2 = build_stage2(&stage1, network("main"), SecretString::from(TEST_KEY)).unwrap();
        assert_eq!(stage2.address, TEST_ADDRESS);
        assert_eq!(stage2.network, network("main"));
        assert_eq!(connector.connect_count(), 1);
    }

    #[tokio::test]
    async fn from_config_reports_missing_catalog() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = WizardConfig {
            state_path: dir.path().join("state.json"),
            output_dir: dir.path().join("output"),
            networks_path: dir.path().join("missing.json"),
            tos_path: dir.path().join("tos.txt"),
            ..WizardConfig::default()
        };
        let err = Stage1::from_config(&config).await.err().unwrap();
        assert!(err.is_fatal());
    }

    #[test]
    fn rpc_connector_derives_sender() {
        let connector = RpcConnector::new(Duration::from_secs(1));
        assert!(
            connector
                .connect(&network("main"), SecretString::from(TEST_KEY))
                .is_ok()
        );
        assert!(
            connector
                .connect(&network("main"), SecretString::from("0x01"))
                .is_err()
        );
    }
}
