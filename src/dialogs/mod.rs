//! Dialog boundary: every question and notice shown to the operator.
//!
//! Dialogs that collect input validate and re-prompt internally; a value
//! they return must already pass the matching `StateModel` setter.

pub mod messages;
pub mod prompt;
pub mod terminal;

use std::path::Path;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::SecretString;

use crate::actions::ActionKind;
use crate::config::NetworkInfo;
use crate::error::{DialogError, ValidationError};
use crate::gateway::WhitelistEntry;
use crate::phases::manual_submission::Submission;
use crate::state::NodeRole;

pub use messages::Messages;
pub use prompt::Prompt;
pub use terminal::TerminalDialogs;

/// Where the operator's private key comes from.
#[derive(Debug, Clone)]
pub enum PrivateKeySource {
    Generate,
    Manual(SecretString),
}

/// Operator's answer when a retirement is already under way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetirementChoice {
    Continue,
    Stop,
}

type DialogResult<T> = Result<T, DialogError>;

/// All operator interaction used by phases, actions and the orchestrator.
#[async_trait]
pub trait Dialogs: Send + Sync {
    // ── Environment ─────────────────────────────────────────────────
    async fn docker_detected(&self) -> DialogResult<()>;
    async fn docker_missing(&self) -> DialogResult<()>;

    // ── Key and network ─────────────────────────────────────────────
    async fn ask_for_private_key(&self) -> DialogResult<PrivateKeySource>;
    async fn private_key_detected(&self, address: &str) -> DialogResult<()>;
    async fn ask_for_network(&self, networks: &[NetworkInfo]) -> DialogResult<NetworkInfo>;
    async fn network_selected(&self, network: &NetworkInfo) -> DialogResult<()>;
    async fn docker_restart_required(&self) -> DialogResult<()>;

    // ── Terms, role and identifying data ────────────────────────────
    /// Returns the acceptance sentence typed by the operator.
    async fn accept_tos(&self, tos_text: &str) -> DialogResult<String>;
    async fn ask_for_node_type(&self) -> DialogResult<NodeRole>;
    async fn ask_for_apollo_minimal_deposit(&self) -> DialogResult<Decimal>;
    async fn role_selected(&self, role: NodeRole) -> DialogResult<()>;
    async fn ask_for_node_url(&self) -> DialogResult<String>;
    async fn node_url_detected(&self, url: &str) -> DialogResult<()>;
    async fn ask_for_node_ip(&self) -> DialogResult<String>;
    async fn node_ip_detected(&self, ip: &str) -> DialogResult<()>;
    /// `None` when the operator skips the optional email.
    async fn ask_for_user_email(&self) -> DialogResult<Option<String>>;
    async fn user_email_detected(&self, email: &str) -> DialogResult<()>;
    /// A collected value was refused by the state model; the phase asks again.
    async fn invalid_input(&self, error: &ValidationError) -> DialogResult<()>;

    // ── Whitelisting and onboarding ─────────────────────────────────
    async fn address_whitelisted(&self, entry: &WhitelistEntry) -> DialogResult<()>;
    async fn address_not_whitelisted(&self, address: &str) -> DialogResult<()>;
    async fn display_submission(&self, submission: &Submission) -> DialogResult<()>;
    async fn role_mismatch(&self, whitelisted: NodeRole, chosen: NodeRole) -> DialogResult<()>;
    async fn not_enough_balance(&self, required: Decimal, available: Decimal)
    -> DialogResult<()>;
    async fn already_onboarded(&self, role: NodeRole) -> DialogResult<()>;
    async fn ask_for_apollo_deposit(
        &self,
        minimum: Decimal,
        preferred: Option<Decimal>,
    ) -> DialogResult<Decimal>;
    async fn onboarding_confirmation(
        &self,
        address: &str,
        role: NodeRole,
        deposit: Decimal,
    ) -> DialogResult<bool>;
    async fn onboarding_successful(&self) -> DialogResult<()>;
    async fn insufficient_funds(&self) -> DialogResult<()>;
    async fn generic_error(&self, message: &str) -> DialogResult<()>;
    async fn run_instructions(
        &self,
        healthcheck_url: Option<&str>,
        output_dir: &Path,
    ) -> DialogResult<()>;

    // ── Action menu ─────────────────────────────────────────────────
    async fn select_action(&self, actions: &[ActionKind]) -> DialogResult<ActionKind>;
    async fn nectar_warning(&self) -> DialogResult<()>;
    async fn change_url_confirmation(&self, old_url: &str, new_url: &str) -> DialogResult<bool>;
    async fn change_url_successful(&self, new_url: &str) -> DialogResult<()>;
    async fn available_payout(&self, amount: Decimal) -> DialogResult<()>;
    async fn nothing_to_withdraw(&self) -> DialogResult<()>;
    async fn confirm_payout_withdrawal(&self, amount: Decimal) -> DialogResult<bool>;
    async fn withdrawal_successful(&self, amount: Decimal) -> DialogResult<()>;
    async fn confirm_retirement(&self) -> DialogResult<bool>;
    async fn continue_retirement(&self) -> DialogResult<RetirementChoice>;
    async fn retirement_start_successful(&self) -> DialogResult<()>;
    async fn retirement_successful(&self) -> DialogResult<()>;
    async fn retirement_stopped(&self) -> DialogResult<()>;
    async fn already_retired(&self) -> DialogResult<()>;
}
