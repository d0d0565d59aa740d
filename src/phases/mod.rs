//! Onboarding phases: the resumable steps of the wizard.
//!
//! Every phase checks the state model first and skips its prompts when the
//! fact it owns is already recorded, so the pipeline can be re-entered after
//! an interruption at any point.

pub mod accept_tos;
pub mod check_docker;
pub mod manual_submission;
pub mod node_ip;
pub mod node_url;
pub mod perform_onboarding;
pub mod private_key;
pub mod select_network;
pub mod select_role;
pub mod user_email;
pub mod whitelist;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::dialogs::Dialogs;
use crate::error::{Error, Result};
use crate::state::NodeRole;

pub use accept_tos::AcceptTosPhase;
pub use check_docker::CheckDockerPhase;
pub use manual_submission::{ManualSubmissionPhase, Submission};
pub use node_ip::GetNodeIpPhase;
pub use node_url::GetNodeUrlPhase;
pub use perform_onboarding::PerformOnboardingPhase;
pub use private_key::GetPrivateKeyPhase;
pub use select_network::SelectNetworkPhase;
pub use select_role::SelectRolePhase;
pub use user_email::GetUserEmailPhase;
pub use whitelist::CheckWhitelistPhase;

/// Result of running one phase.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseOutcome<T> {
    /// The fact was already recorded; nothing was asked.
    Skipped(T),
    /// The fact was collected (or confirmed) during this run.
    Collected(T),
    /// A precondition is not met; the pipeline stops here and resumes from
    /// this phase on the next launch.
    Rejected(RejectReason),
}

impl<T> PhaseOutcome<T> {
    pub fn into_value(self) -> std::result::Result<T, RejectReason> {
        match self {
            Self::Skipped(v) | Self::Collected(v) => Ok(v),
            Self::Rejected(reason) => Err(reason),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Skipped(_) => "skipped",
            Self::Collected(_) => "collected",
            Self::Rejected(_) => "rejected",
        }
    }
}

/// Why a phase stopped the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("docker is not installed")]
    DockerMissing,

    #[error("address {address} is not whitelisted")]
    NotWhitelisted { address: String },

    #[error("address is whitelisted as {whitelisted}, not {chosen}")]
    RoleMismatch {
        whitelisted: NodeRole,
        chosen: NodeRole,
    },

    #[error("balance {available} is below the required {required}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },

    #[error("insufficient funds to pay for the onboarding transaction")]
    InsufficientFunds,

    #[error("address is already onboarded as {role}")]
    AlreadyOnboarded { role: NodeRole },

    #[error("operator declined")]
    Declined,
}

/// One resumable step. Dependencies are bound at construction.
#[async_trait]
pub trait Phase: Send + Sync {
    type Output: Send;

    fn name(&self) -> &'static str;

    async fn run(&self) -> Result<PhaseOutcome<Self::Output>>;
}

/// Run a phase and log its outcome.
pub async fn run_logged<P: Phase>(phase: &P) -> Result<PhaseOutcome<P::Output>> {
    tracing::debug!(phase = phase.name(), "Phase started");
    let outcome = phase.run().await?;
    match &outcome {
        PhaseOutcome::Rejected(reason) => {
            tracing::warn!(phase = phase.name(), %reason, "Phase rejected")
        }
        other => tracing::info!(phase = phase.name(), outcome = other.label(), "Phase finished"),
    }
    Ok(outcome)
}

/// Turn a setter result into "stored" / "ask again". Validation failures are
/// shown to the operator and never leave the phase.
pub(crate) async fn stored_or_retry(dialogs: &dyn Dialogs, result: Result<()>) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(Error::Validation(e)) => {
            tracing::warn!(error = %e, "Rejected operator input");
            dialogs.invalid_input(&e).await?;
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

pub(crate) fn missing(fact: &str) -> Error {
    Error::Fatal(format!("{fact} must be recorded before this phase"))
}
