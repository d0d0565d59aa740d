//! Test doubles for driving phases, actions and the orchestrator without a
//! terminal, a chain or docker.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::SecretString;

use crate::actions::ActionKind;
use crate::builder::GatewayConnector;
use crate::config::NetworkInfo;
use crate::dialogs::{Dialogs, PrivateKeySource, RetirementChoice};
use crate::error::{DialogError, GatewayError, SystemError, ValidationError};
use crate::gateway::{ContractGateway, WhitelistEntry};
use crate::phases::Submission;
use crate::state::NodeRole;
use crate::system::System;

/// Well-known development key and its address.
pub const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Catalog entry named `name` with deterministic parameters.
pub fn network(name: &str) -> NetworkInfo {
    NetworkInfo {
        name: name.to_string(),
        rpc: format!("https://rpc.{name}.example"),
        chain_id: 22040,
        head_contract_address: "0x0000000000000000000000000000000000000001".to_string(),
        domain: format!("{name}.example"),
    }
}

// ── Dialogs ─────────────────────────────────────────────────────────

/// One scripted operator answer, consumed in order by the asking dialogs.
#[derive(Debug, Clone)]
pub enum Answer {
    Key(PrivateKeySource),
    /// Network picked by name.
    Network(String),
    /// ToS sentence, node URL or node IP.
    Text(String),
    Role(NodeRole),
    /// Apollo minimal deposit or deposit.
    Amount(Decimal),
    Email(Option<String>),
    /// Any yes/no confirmation.
    Confirm(bool),
    Action(ActionKind),
    Retirement(RetirementChoice),
}

/// Dialogs answering from a script and recording every call.
///
/// Running out of answers behaves like a closed terminal.
pub struct ScriptedDialogs {
    answers: Mutex<VecDeque<Answer>>,
    calls: Mutex<Vec<&'static str>>,
    notices: Mutex<Vec<String>>,
}

impl ScriptedDialogs {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            calls: Mutex::new(Vec::new()),
            notices: Mutex::new(Vec::new()),
        }
    }

    /// Append answers for a later run.
    pub fn script(&self, answers: Vec<Answer>) {
        lock(&self.answers).extend(answers);
    }

    /// Names of the dialogs invoked so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
        lock(&self.notices).clear();
    }

    /// Text arguments of notices (addresses, URLs, error messages).
    pub fn notices(&self) -> Vec<String> {
        lock(&self.notices).clone()
    }

    pub fn remaining_answers(&self) -> usize {
        lock(&self.answers).len()
    }

    fn record(&self, call: &'static str) {
        lock(&self.calls).push(call);
    }

    fn notice(&self, call: &'static str, text: &str) -> Result<(), DialogError> {
        self.record(call);
        lock(&self.notices).push(text.to_string());
        Ok(())
    }

    fn next(&self, call: &'static str) -> Result<Answer, DialogError> {
        self.record(call);
        lock(&self.answers)
            .pop_front()
            .ok_or(DialogError::InputClosed)
    }
}

fn unexpected(call: &str, answer: Answer) -> ! {
    panic!("{call} cannot use scripted answer {answer:?}")
}

#[async_trait]
impl Dialogs for ScriptedDialogs {
    async fn docker_detected(&self) -> Result<(), DialogError> {
        self.record("docker_detected");
        Ok(())
    }

    async fn docker_missing(&self) -> Result<(), DialogError> {
        self.record("docker_missing");
        Ok(())
    }

    async fn ask_for_private_key(&self) -> Result<PrivateKeySource, DialogError> {
        match self.next("ask_for_private_key")? {
            Answer::Key(source) => Ok(source),
            other => unexpected("ask_for_private_key", other),
        }
    }

    async fn private_key_detected(&self, address: &str) -> Result<(), DialogError> {
        self.notice("private_key_detected", address)
    }

    async fn ask_for_network(&self, networks: &[NetworkInfo]) -> Result<NetworkInfo, DialogError> {
        match self.next("ask_for_network")? {
            Answer::Network(name) => match networks.iter().find(|n| n.name == name) {
                Some(network) => Ok(network.clone()),
                None => panic!("scripted network {name} is not offered"),
            },
            other => unexpected("ask_for_network", other),
        }
    }

    async fn network_selected(&self, _network: &NetworkInfo) -> Result<(), DialogError> {
        self.record("network_selected");
        Ok(())
    }

    async fn docker_restart_required(&self) -> Result<(), DialogError> {
        self.record("docker_restart_required");
        Ok(())
    }

    async fn accept_tos(&self, _tos_text: &str) -> Result<String, DialogError> {
        match self.next("accept_tos")? {
            Answer::Text(sentence) => Ok(sentence),
            other => unexpected("accept_tos", other),
        }
    }

    async fn ask_for_node_type(&self) -> Result<NodeRole, DialogError> {
        match self.next("ask_for_node_type")? {
            Answer::Role(role) => Ok(role),
            other => unexpected("ask_for_node_type", other),
        }
    }

    async fn ask_for_apollo_minimal_deposit(&self) -> Result<Decimal, DialogError> {
        match self.next("ask_for_apollo_minimal_deposit")? {
            Answer::Amount(amount) => Ok(amount),
            other => unexpected("ask_for_apollo_minimal_deposit", other),
        }
    }

    async fn role_selected(&self, _role: NodeRole) -> Result<(), DialogError> {
        self.record("role_selected");
        Ok(())
    }

    async fn ask_for_node_url(&self) -> Result<String, DialogError> {
        match self.next("ask_for_node_url")? {
            Answer::Text(url) => Ok(url),
            other => unexpected("ask_for_node_url", other),
        }
    }

    async fn node_url_detected(&self, url: &str) -> Result<(), DialogError> {
        self.notice("node_url_detected", url)
    }

    async fn ask_for_node_ip(&self) -> Result<String, DialogError> {
        match self.next("ask_for_node_ip")? {
            Answer::Text(ip) => Ok(ip),
            other => unexpected("ask_for_node_ip", other),
        }
    }

    async fn node_ip_detected(&self, ip: &str) -> Result<(), DialogError> {
        self.notice("node_ip_detected", ip)
    }

    async fn ask_for_user_email(&self) -> Result<Option<String>, DialogError> {
        match self.next("ask_for_user_email")? {
            Answer::Email(email) => Ok(email),
            other => unexpected("ask_for_user_email", other),
        }
    }

    async fn user_email_detected(&self, email: &str) -> Result<(), DialogError> {
        self.notice("user_email_detected", email)
    }

    async fn invalid_input(&self, _error: &ValidationError) -> Result<(), DialogError> {
        self.record("invalid_input");
        Ok(())
    }

    async fn address_whitelisted(&self, _entry: &WhitelistEntry) -> Result<(), DialogError> {
        self.record("address_whitelisted");
        Ok(())
    }

    async fn address_not_whitelisted(&self, address: &str) -> Result<(), DialogError> {
        self.notice("address_not_whitelisted", address)
    }

    async fn display_submission(&self, _submission: &Submission) -> Result<(), DialogError> {
        self.record("display_submission");
        Ok(())
    }

    async fn role_mismatch(&self, _whitelisted: NodeRole, _chosen: NodeRole) -> Result<(), DialogError> {
        self.record("role_mismatch");
        Ok(())
    }

    async fn not_enough_balance(&self, _required: Decimal, _available: Decimal) -> Result<(), DialogError> {
        self.record("not_enough_balance");
        Ok(())
    }

    async fn already_onboarded(&self, _role: NodeRole) -> Result<(), DialogError> {
        self.record("already_onboarded");
        Ok(())
    }

    async fn ask_for_apollo_deposit(
        &self,
        _minimum: Decimal,
        _preferred: Option<Decimal>,
    ) -> Result<Decimal, DialogError> {
        match self.next("ask_for_apollo_deposit")? {
            Answer::Amount(amount) => Ok(amount),
            other => unexpected("ask_for_apollo_deposit", other),
        }
    }

    async fn onboarding_confirmation(
        &self,
        _address: &str,
        _role: NodeRole,
        _deposit: Decimal,
    ) -> Result<bool, DialogError> {
        self.confirm("onboarding_confirmation")
    }

    async fn onboarding_successful(&self) -> Result<(), DialogError> {
        self.record("onboarding_successful");
        Ok(())
    }

    async fn insufficient_funds(&self) -> Result<(), DialogError> {
        self.record("insufficient_funds");
        Ok(())
    }

    async fn generic_error(&self, message: &str) -> Result<(), DialogError> {
        self.notice("generic_error", message)
    }

    async fn run_instructions(
        &self,
        healthcheck_url: Option<&str>,
        _output_dir: &Path,
    ) -> Result<(), DialogError> {
        self.notice("run_instructions", healthcheck_url.unwrap_or_default())
    }

    async fn select_action(&self, actions: &[ActionKind]) -> Result<ActionKind, DialogError> {
        match self.next("select_action")? {
            Answer::Action(kind) if actions.contains(&kind) => Ok(kind),
            Answer::Action(kind) => panic!("scripted action {kind} is not offered in {actions:?}"),
            other => unexpected("select_action", other),
        }
    }

    async fn nectar_warning(&self) -> Result<(), DialogError> {
        self.record("nectar_warning");
        Ok(())
    }

    async fn change_url_confirmation(&self, _old_url: &str, _new_url: &str) -> Result<bool, DialogError> {
        self.confirm("change_url_confirmation")
    }

    async fn change_url_successful(&self, new_url: &str) -> Result<(), DialogError> {
        self.notice("change_url_successful", new_url)
    }

    async fn available_payout(&self, _amount: Decimal) -> Result<(), DialogError> {
        self.record("available_payout");
        Ok(())
    }

    async fn nothing_to_withdraw(&self) -> Result<(), DialogError> {
        self.record("nothing_to_withdraw");
        Ok(())
    }

    async fn confirm_payout_withdrawal(&self, _amount: Decimal) -> Result<bool, DialogError> {
        self.confirm("confirm_payout_withdrawal")
    }

    async fn withdrawal_successful(&self, _amount: Decimal) -> Result<(), DialogError> {
        self.record("withdrawal_successful");
        Ok(())
    }

    async fn confirm_retirement(&self) -> Result<bool, DialogError> {
        self.confirm("confirm_retirement")
    }

    async fn continue_retirement(&self) -> Result<RetirementChoice, DialogError> {
        match self.next("continue_retirement")? {
            Answer::Retirement(choice) => Ok(choice),
            other => unexpected("continue_retirement", other),
        }
    }

    async fn retirement_start_successful(&self) -> Result<(), DialogError> {
        self.record("retirement_start_successful");
        Ok(())
    }

    async fn retirement_successful(&self) -> Result<(), DialogError> {
        self.record("retirement_successful");
        Ok(())
    }

    async fn retirement_stopped(&self) -> Result<(), DialogError> {
        self.record("retirement_stopped");
        Ok(())
    }

    async fn already_retired(&self) -> Result<(), DialogError> {
        self.record("already_retired");
        Ok(())
    }
}

impl ScriptedDialogs {
    fn confirm(&self, call: &'static str) -> Result<bool, DialogError> {
        match self.next(call)? {
            Answer::Confirm(yes) => Ok(yes),
            other => unexpected(call, other),
        }
    }
}

// ── Gateway ─────────────────────────────────────────────────────────

/// Write operations observed by [`MockGateway`], recorded once accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    SubmitOnboarding {
        role: NodeRole,
        deposit: Decimal,
        endpoint: String,
    },
    ChangeUrl(String),
    WithdrawPayout(Decimal),
    StartRetirement,
    ContinueRetirement,
    StopRetirement,
}

#[derive(Default)]
struct MockChain {
    whitelist: Option<WhitelistEntry>,
    balance: Decimal,
    onboarded: Option<NodeRole>,
    payout: Decimal,
    retiring: bool,
    submit_error: Option<GatewayError>,
    write_error: Option<GatewayError>,
    read_error: Option<GatewayError>,
    calls: Vec<GatewayCall>,
}

/// In-memory contract gateway.
#[derive(Default)]
pub struct MockGateway {
    chain: Mutex<MockChain>,
    submit_attempts: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn whitelisted(self, role: NodeRole, required_deposit: Decimal) -> Self {
        self.set_whitelist(Some(WhitelistEntry {
            role,
            required_deposit,
        }));
        self
    }

    pub fn with_balance(self, balance: Decimal) -> Self {
        lock(&self.chain).balance = balance;
        self
    }

    pub fn onboarded_as(self, role: NodeRole) -> Self {
        lock(&self.chain).onboarded = Some(role);
        self
    }

    pub fn with_payout(self, payout: Decimal) -> Self {
        lock(&self.chain).payout = payout;
        self
    }

    pub fn retiring(self) -> Self {
        lock(&self.chain).retiring = true;
        self
    }

    /// Fail the onboarding submission only.
    pub fn failing_submission(self, error: GatewayError) -> Self {
        lock(&self.chain).submit_error = Some(error);
        self
    }

    /// Fail every write.
    pub fn failing_writes(self, error: GatewayError) -> Self {
        lock(&self.chain).write_error = Some(error);
        self
    }

    /// Fail every read.
    pub fn failing_reads(self, error: GatewayError) -> Self {
        self.set_read_error(Some(error));
        self
    }

    pub fn set_whitelist(&self, entry: Option<WhitelistEntry>) {
        lock(&self.chain).whitelist = entry;
    }

    pub fn set_read_error(&self, error: Option<GatewayError>) {
        lock(&self.chain).read_error = error;
    }

    /// Accepted writes, in order.
    pub fn calls(&self) -> Vec<GatewayCall> {
        lock(&self.chain).calls.clone()
    }

    /// Onboarding submissions attempted, accepted or not.
    pub fn submit_count(&self) -> usize {
        self.submit_attempts.load(Ordering::SeqCst)
    }

    fn read<T>(&self, f: impl FnOnce(&MockChain) -> T) -> Result<T, GatewayError> {
        let chain = lock(&self.chain);
        match &chain.read_error {
            Some(e) => Err(e.clone()),
            None => Ok(f(&chain)),
        }
    }

    fn write(
        &self,
        call: GatewayCall,
        apply: impl FnOnce(&mut MockChain),
    ) -> Result<(), GatewayError> {
        let mut chain = lock(&self.chain);
        if let Some(e) = &chain.write_error {
            return Err(e.clone());
        }
        apply(&mut chain);
        chain.calls.push(call);
        Ok(())
    }
}

#[async_trait]
impl ContractGateway for MockGateway {
    async fn whitelist_status(&self, _address: &str) -> Result<Option<WhitelistEntry>, GatewayError> {
        self.read(|c| c.whitelist.clone())
    }

    async fn get_balance(&self, _address: &str) -> Result<Decimal, GatewayError> {
        self.read(|c| c.balance)
    }

    async fn onboarded_role(&self, _address: &str) -> Result<Option<NodeRole>, GatewayError> {
        self.read(|c| c.onboarded)
    }

    async fn submit_onboarding(
        &self,
        role: NodeRole,
        deposit: Decimal,
        endpoint: &str,
    ) -> Result<(), GatewayError> {
        self.submit_attempts.fetch_add(1, Ordering::SeqCst);
        let submit_error = lock(&self.chain).submit_error.clone();
        if let Some(e) = submit_error {
            return Err(e);
        }
        let call = GatewayCall::SubmitOnboarding {
            role,
            deposit,
            endpoint: endpoint.to_string(),
        };
        self.write(call, |c| {
            c.onboarded = Some(role);
            c.balance -= deposit;
        })
    }

    async fn change_url(&self, new_url: &str) -> Result<(), GatewayError> {
        self.write(GatewayCall::ChangeUrl(new_url.to_string()), |_| {})
    }

    async fn get_payout(&self, _address: &str) -> Result<Decimal, GatewayError> {
        self.read(|c| c.payout)
    }

    async fn withdraw_payout(&self, amount: Decimal) -> Result<(), GatewayError> {
        self.write(GatewayCall::WithdrawPayout(amount), |c| c.payout -= amount)
    }

    async fn retirement_in_progress(&self, _address: &str) -> Result<bool, GatewayError> {
        self.read(|c| c.retiring)
    }

    async fn start_retirement(&self) -> Result<(), GatewayError> {
        self.write(GatewayCall::StartRetirement, |c| c.retiring = true)
    }

    async fn continue_retirement(&self) -> Result<(), GatewayError> {
        self.write(GatewayCall::ContinueRetirement, |c| {
            c.retiring = false;
            c.onboarded = None;
        })
    }

    async fn stop_retirement(&self) -> Result<(), GatewayError> {
        self.write(GatewayCall::StopRetirement, |c| c.retiring = false)
    }
}

/// Hands out the same gateway for any network, counting connections.
pub struct StaticConnector {
    gateway: Arc<MockGateway>,
    connects: AtomicUsize,
}

impl StaticConnector {
    pub fn new(gateway: Arc<MockGateway>) -> Self {
        Self {
            gateway,
            connects: AtomicUsize::new(0),
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl GatewayConnector for StaticConnector {
    fn connect(
        &self,
        _network: &NetworkInfo,
        _key: SecretString,
    ) -> Result<Arc<dyn ContractGateway>, GatewayError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.gateway.clone())
    }
}

// ── System ──────────────────────────────────────────────────────────

pub struct StubSystem {
    docker: bool,
}

impl StubSystem {
    pub fn new(docker: bool) -> Self {
        Self { docker }
    }
}

#[async_trait]
impl System for StubSystem {
    async fn is_docker_available(&self) -> Result<bool, SystemError> {
        Ok(self.docker)
    }
}

#[cfg(test)]
pub(crate) async fn temp_state() -> (Arc<crate::state::StateModel>, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().unwrap();
    let store = crate::store::FileStore::open(dir.path().join("state.json"))
        .await
        .unwrap();
    let state = crate::state::StateModel::new(Arc::new(store), dir.path().join("output"));
    (Arc::new(state), dir)
}
