//! End-to-end wizard sessions against a file-backed state store, scripted
//! dialogs and an in-memory gateway.
//!
//! Each `Harness::orchestrator` call reopens the state file, the same way a
//! relaunched wizard would.

use std::sync::Arc;

use rust_decimal_macros::dec;
use secrecy::SecretString;
use tempfile::TempDir;

use node_onboarding::actions::ActionKind;
use node_onboarding::builder::Stage1;
use node_onboarding::config::NetworkInfo;
use node_onboarding::dialogs::{PrivateKeySource, RetirementChoice};
use node_onboarding::error::{DialogError, Error, GatewayError};
use node_onboarding::orchestrator::{Onboarding, Orchestrator, RunOutcome};
use node_onboarding::phases::RejectReason;
use node_onboarding::state::{NodeRole, RetirementStage, StateModel};
use node_onboarding::store::FileStore;
use node_onboarding::testing::{
    Answer, GatewayCall, MockGateway, ScriptedDialogs, StaticConnector, StubSystem, TEST_ADDRESS,
    TEST_KEY, network,
};

const SENTENCE: &str = "I, Ada Lovelace, read and agreed with the terms and conditions above.";
const MAX_GATEWAY_FAILURES: u32 = 3;

struct Harness {
    dir: TempDir,
    networks: Vec<NetworkInfo>,
    docker: bool,
    dialogs: Arc<ScriptedDialogs>,
    gateway: Arc<MockGateway>,
}

impl Harness {
    fn new(gateway: MockGateway) -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            networks: vec![network("mainnet"), network("testnet")],
            docker: true,
            dialogs: Arc::new(ScriptedDialogs::new(vec![])),
            gateway: Arc::new(gateway),
        }
    }

    fn single_network(mut self) -> Self {
        self.networks = vec![network("testnet")];
        self
    }

    fn without_docker(mut self) -> Self {
        self.docker = false;
        self
    }

    fn state_path(&self) -> std::path::PathBuf {
        self.dir.path().join("state.json")
    }

    async fn state(&self) -> Arc<StateModel> {
        let store = FileStore::open(self.state_path()).await.unwrap();
        Arc::new(StateModel::new(
            Arc::new(store),
            self.dir.path().join("output"),
        ))
    }

    async fn orchestrator(&self) -> Orchestrator {
        let stage1 = Stage1 {
            state: self.state().await,
            dialogs: self.dialogs.clone(),
            system: Arc::new(StubSystem::new(self.docker)),
            connector: Arc::new(StaticConnector::new(self.gateway.clone())),
            networks: self.networks.clone(),
            tos_text: "Terms v1".to_string(),
            output_dir: self.dir.path().join("output"),
        };
        Orchestrator::new(stage1, MAX_GATEWAY_FAILURES)
    }

    /// Run a session with `answers` and return its outcome.
    async fn session(&self, answers: Vec<Answer>) -> Result<RunOutcome, Error> {
        self.dialogs.clear_calls();
        self.dialogs.script(answers);
        self.orchestrator().await.run().await
    }

    /// Record a completed Atlas onboarding without going through the phases.
    async fn seed_onboarded_atlas(&self) {
        let state = self.state().await;
        state
            .store_private_key(&SecretString::from(TEST_KEY))
            .await
            .unwrap();
        state.store_network(&network("mainnet")).await.unwrap();
        state.store_role(NodeRole::Atlas).await.unwrap();
        state
            .store_node_url("https://atlas.example.com")
            .await
            .unwrap();
        state.mark_onboarding_complete().await.unwrap();
    }
}

fn manual_key() -> Answer {
    Answer::Key(PrivateKeySource::Manual(SecretString::from(TEST_KEY)))
}

#[tokio::test]
async fn atlas_onboarding_then_quit() {
    let h = Harness::new(
        MockGateway::new()
            .whitelisted(NodeRole::Atlas, dec!(1000))
            .with_balance(dec!(5000)),
    );

    let outcome = h
        .session(vec![
            manual_key(),
            Answer::Network("testnet".into()),
            Answer::Text(SENTENCE.into()),
            Answer::Role(NodeRole::Atlas),
            Answer::Text("https://atlas.example.com".into()),
            Answer::Email(Some("ops@example.com".into())),
            Answer::Confirm(true),
            Answer::Action(ActionKind::Quit),
        ])
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Quit);
    assert_eq!(
        h.dialogs.calls(),
        vec![
            "docker_detected",
            "ask_for_private_key",
            "private_key_detected",
            "ask_for_network",
            "network_selected",
            "accept_tos",
            "ask_for_node_type",
            "role_selected",
            "ask_for_node_url",
            "node_url_detected",
            "ask_for_user_email",
            "user_email_detected",
            "address_whitelisted",
            "onboarding_confirmation",
            "onboarding_successful",
            "run_instructions",
            "select_action",
        ]
    );
    assert!(
        h.dialogs
            .notices()
            .contains(&"https://atlas.example.com/health".to_string())
    );
    assert_eq!(
        h.gateway.calls(),
        vec![GatewayCall::SubmitOnboarding {
            role: NodeRole::Atlas,
            deposit: dec!(1000),
            endpoint: "https://atlas.example.com".into()
        }]
    );

    let state = h.state().await;
    assert!(state.has_completed_onboarding().await.unwrap());
    assert_eq!(state.get_network().await.unwrap(), Some(network("testnet")));
}

#[tokio::test]
async fn completed_onboarding_resumes_without_dialogs_or_writes() {
    let h = Harness::new(MockGateway::new());
    h.seed_onboarded_atlas().await;
    let before = std::fs::read(h.state_path()).unwrap();

    for _ in 0..2 {
        h.dialogs.clear_calls();
        let orchestrator = h.orchestrator().await;
        let onboarding = orchestrator.onboard().await.unwrap();
        assert!(matches!(onboarding, Onboarding::Complete(_)));
        assert!(h.dialogs.calls().is_empty());
    }

    assert_eq!(std::fs::read(h.state_path()).unwrap(), before);
    assert_eq!(h.gateway.submit_count(), 0);
}

#[tokio::test]
async fn not_whitelisted_halts_and_resumes_from_whitelist_check() {
    let h = Harness::new(MockGateway::new().with_balance(dec!(500))).single_network();

    let outcome = h
        .session(vec![
            Answer::Key(PrivateKeySource::Generate),
            Answer::Text(SENTENCE.into()),
            Answer::Role(NodeRole::Hermes),
            Answer::Text("https://hermes.example.com".into()),
            Answer::Email(None),
        ])
        .await
        .unwrap();

    let address = h.state().await.get_address().await.unwrap().unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Halted(RejectReason::NotWhitelisted {
            address: address.clone()
        })
    );
    let calls = h.dialogs.calls();
    assert!(calls.ends_with(&["address_not_whitelisted", "display_submission"]));
    assert_eq!(h.gateway.submit_count(), 0);
    let tos = h.state().await.get_signed_tos().await.unwrap().unwrap();

    // Operators whitelist the address out of band.
    h.gateway.set_whitelist(Some(node_onboarding::gateway::WhitelistEntry {
        role: NodeRole::Hermes,
        required_deposit: dec!(100),
    }));
    let outcome = h
        .session(vec![Answer::Confirm(true), Answer::Action(ActionKind::Quit)])
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Quit);
    let calls = h.dialogs.calls();
    for asked in [
        "ask_for_private_key",
        "ask_for_network",
        "accept_tos",
        "ask_for_node_type",
        "ask_for_node_url",
        "ask_for_user_email",
    ] {
        assert!(!calls.contains(&asked), "{asked} was asked again");
    }
    assert!(calls.contains(&"onboarding_successful"));
    assert_eq!(h.gateway.submit_count(), 1);

    let state = h.state().await;
    assert_eq!(state.get_address().await.unwrap(), Some(address));
    assert_eq!(state.get_signed_tos().await.unwrap(), Some(tos));
}

#[tokio::test]
async fn apollo_onboarding_submits_exactly_once() {
    let h = Harness::new(
        MockGateway::new()
            .whitelisted(NodeRole::Apollo, dec!(100))
            .with_balance(dec!(1000)),
    )
    .single_network();

    let outcome = h
        .session(vec![
            manual_key(),
            Answer::Text(SENTENCE.into()),
            Answer::Role(NodeRole::Apollo),
            Answer::Amount(dec!(150)),
            Answer::Text("10.1.2.3".into()),
            Answer::Email(None),
            Answer::Amount(dec!(200)),
            Answer::Confirm(true),
            Answer::Action(ActionKind::Quit),
        ])
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Quit);
    assert_eq!(h.gateway.submit_count(), 1);
    assert_eq!(
        h.gateway.calls(),
        vec![GatewayCall::SubmitOnboarding {
            role: NodeRole::Apollo,
            deposit: dec!(200),
            endpoint: "10.1.2.3".into()
        }]
    );
    let state = h.state().await;
    assert!(state.is_onboarding_complete().await.unwrap());
    assert_eq!(
        state.get_apollo_minimal_deposit().await.unwrap(),
        Some(dec!(150))
    );
    assert_eq!(state.get_address().await.unwrap().as_deref(), Some(TEST_ADDRESS));
}

#[tokio::test]
async fn missing_docker_halts_before_any_question() {
    let h = Harness::new(MockGateway::new()).without_docker();
    let outcome = h.session(vec![]).await.unwrap();
    assert_eq!(outcome, RunOutcome::Halted(RejectReason::DockerMissing));
    assert_eq!(h.dialogs.calls(), vec!["docker_missing"]);
    assert!(h.state().await.get_private_key().await.unwrap().is_none());
}

#[tokio::test]
async fn closed_input_keeps_collected_fields() {
    let h = Harness::new(MockGateway::new());
    let err = h.session(vec![manual_key()]).await.unwrap_err();

    assert!(matches!(err, Error::Dialog(DialogError::InputClosed)));
    assert!(!h.dialogs.calls().contains(&"generic_error"));
    assert_eq!(
        h.state().await.get_address().await.unwrap().as_deref(),
        Some(TEST_ADDRESS)
    );
}

#[tokio::test]
async fn retirement_resumes_across_sessions() {
    let h = Harness::new(MockGateway::new());
    h.seed_onboarded_atlas().await;

    let outcome = h
        .session(vec![
            Answer::Action(ActionKind::Retire),
            Answer::Confirm(true),
            Answer::Action(ActionKind::Quit),
        ])
        .await
        .unwrap();
    assert_eq!(outcome, RunOutcome::Quit);
    assert_eq!(
        h.state().await.get_retirement_stage().await.unwrap(),
        RetirementStage::Started
    );

    let outcome = h
        .session(vec![
            Answer::Action(ActionKind::Retire),
            Answer::Retirement(RetirementChoice::Continue),
        ])
        .await
        .unwrap();
    assert_eq!(outcome, RunOutcome::Quit);
    let calls = h.dialogs.calls();
    assert!(calls.contains(&"continue_retirement"));
    assert!(!calls.contains(&"confirm_retirement"));
    assert_eq!(
        h.state().await.get_retirement_stage().await.unwrap(),
        RetirementStage::Completed
    );
    assert_eq!(
        h.gateway.calls(),
        vec![GatewayCall::StartRetirement, GatewayCall::ContinueRetirement]
    );
}

#[tokio::test]
async fn failed_action_is_reported_and_the_menu_continues() {
    let h = Harness::new(MockGateway::new().failing_writes(GatewayError::Rejected("paused".into())));
    h.seed_onboarded_atlas().await;

    let outcome = h
        .session(vec![
            Answer::Action(ActionKind::ChangeUrl),
            Answer::Text("https://atlas2.example.com".into()),
            Answer::Confirm(true),
            Answer::Action(ActionKind::Quit),
        ])
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Quit);
    assert!(h.dialogs.calls().contains(&"generic_error"));
    assert_eq!(
        h.state().await.get_node_url().await.unwrap().as_deref(),
        Some("https://atlas.example.com")
    );
}

#[tokio::test]
async fn insufficient_funds_in_menu_is_not_fatal() {
    let h = Harness::new(
        MockGateway::new()
            .with_payout(dec!(10))
            .failing_writes(GatewayError::InsufficientFunds("gas".into())),
    );
    h.seed_onboarded_atlas().await;

    let outcome = h
        .session(vec![
            Answer::Action(ActionKind::Payouts),
            Answer::Confirm(true),
            Answer::Action(ActionKind::Quit),
        ])
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Quit);
    assert!(h.dialogs.calls().contains(&"insufficient_funds"));
    assert!(h.state().await.get_last_withdrawal().await.unwrap().is_none());
}

#[tokio::test]
async fn repeated_network_failures_end_the_session() {
    let h = Harness::new(MockGateway::new().failing_reads(GatewayError::Network("timeout".into())));
    h.seed_onboarded_atlas().await;

    let err = h
        .session(vec![Answer::Action(ActionKind::Payouts); 5])
        .await
        .unwrap_err();

    assert!(err.is_network());
    let calls = h.dialogs.calls();
    assert_eq!(calls.iter().filter(|c| **c == "select_action").count(), 4);
    // Three rendered by the menu, one for the final error.
    assert_eq!(calls.iter().filter(|c| **c == "generic_error").count(), 4);
}
