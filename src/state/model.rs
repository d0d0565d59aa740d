//! Onboarding data models persisted by the state model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Role a node registers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeRole {
    /// Storage / validator-like node.
    Atlas,
    /// Relay node.
    Hermes,
    /// Gateway node.
    Apollo,
}

impl NodeRole {
    pub const ALL: [NodeRole; 3] = [NodeRole::Atlas, NodeRole::Hermes, NodeRole::Apollo];

    /// Atlas and Hermes nodes are reached by URL, Apollo nodes by IP.
    pub fn requires_url(&self) -> bool {
        matches!(self, Self::Atlas | Self::Hermes)
    }

    pub fn requires_ip(&self) -> bool {
        matches!(self, Self::Apollo)
    }
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Atlas => "Atlas",
            Self::Hermes => "Hermes",
            Self::Apollo => "Apollo",
        };
        write!(f, "{s}")
    }
}

/// Signed terms-of-service acceptance record. Written once, never replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TosAcceptance {
    /// Terms text as presented.
    pub text: String,
    /// Sentence typed by the operator.
    pub acceptance_sentence: String,
    /// keccak256 of `text`.
    pub hash: String,
    /// Signature over `text` + newline + `acceptance_sentence`.
    pub signature: String,
    pub accepted_at: DateTime<Utc>,
}

impl TosAcceptance {
    /// The exact document that was signed.
    pub fn signed_text(&self) -> String {
        format!("{}\n{}", self.text, self.acceptance_sentence)
    }
}

/// Progress of the two-transaction Atlas retirement.
///
/// `NotStarted -> Started -> Completed`, with `Started -> Stopped` when the
/// operator cancels and `Stopped -> Started` if retirement is begun again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RetirementStage {
    #[default]
    NotStarted,
    Started,
    Stopped,
    Completed,
}

impl RetirementStage {
    pub fn can_transition_to(&self, target: RetirementStage) -> bool {
        use RetirementStage::*;
        matches!(
            (self, target),
            (NotStarted, Started) | (Stopped, Started) | (Started, Completed) | (Started, Stopped)
        )
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Started)
    }
}

impl std::fmt::Display for RetirementStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotStarted => "not_started",
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// A payout withdrawal recorded after the gateway confirmed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub amount: Decimal,
    pub at: DateTime<Utc>,
}

/// Keys used in the persisted state store.
pub mod state_keys {
    pub const PRIVATE_KEY: &str = "privateKey";
    pub const NETWORK: &str = "network";
    pub const NODE_ROLE: &str = "nodeRole";
    pub const NODE_URL: &str = "nodeUrl";
    pub const NODE_IP: &str = "nodeIp";
    pub const USER_EMAIL: &str = "userEmail";
    pub const APOLLO_MINIMAL_DEPOSIT: &str = "apolloMinimalDeposit";
    pub const TOS_ACCEPTANCE: &str = "tosAcceptance";
    pub const ONBOARDING_COMPLETE: &str = "onboardingComplete";
    pub const RETIREMENT: &str = "retirement";
    pub const LAST_WITHDRAWAL: &str = "lastWithdrawal";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&NodeRole::Atlas).unwrap(), "\"ATLAS\"");
        let parsed: NodeRole = serde_json::from_str("\"APOLLO\"").unwrap();
        assert_eq!(parsed, NodeRole::Apollo);
    }

    #[test]
    fn role_address_requirements() {
        assert!(NodeRole::Atlas.requires_url());
        assert!(NodeRole::Hermes.requires_url());
        assert!(!NodeRole::Apollo.requires_url());
        assert!(NodeRole::Apollo.requires_ip());
        assert!(!NodeRole::Hermes.requires_ip());
    }

    #[test]
    fn retirement_transitions() {
        use RetirementStage::*;
        assert!(NotStarted.can_transition_to(Started));
        assert!(Started.can_transition_to(Completed));
        assert!(Started.can_transition_to(Stopped));
        assert!(Stopped.can_transition_to(Started));

        assert!(!NotStarted.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Started));
        assert!(!Completed.can_transition_to(NotStarted));
        assert!(!Started.can_transition_to(NotStarted));
        assert!(!Started.can_transition_to(Started));
    }

    #[test]
    fn signed_text_joins_with_newline() {
        let tos = TosAcceptance {
            text: "Terms".into(),
            acceptance_sentence: "I agree".into(),
            hash: "0x00".into(),
            signature: "0x01".into(),
            accepted_at: Utc::now(),
        };
        assert_eq!(tos.signed_text(), "Terms\nI agree");
    }
}
