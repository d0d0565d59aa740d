use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use super::{Phase, PhaseOutcome, missing};
use crate::dialogs::Dialogs;
use crate::error::Result;
use crate::state::{NodeRole, StateModel};

/// Everything the network operators need to whitelist an address by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub network: String,
    pub address: String,
    pub role: NodeRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub tos_hash: String,
    pub tos_signature: String,
}

/// Show the submission for manual whitelisting. Read-only.
pub struct ManualSubmissionPhase {
    state: Arc<StateModel>,
    dialogs: Arc<dyn Dialogs>,
}

impl ManualSubmissionPhase {
    pub fn new(state: Arc<StateModel>, dialogs: Arc<dyn Dialogs>) -> Self {
        Self { state, dialogs }
    }

    async fn build(&self) -> Result<Submission> {
        let tos = self
            .state
            .get_signed_tos()
            .await?
            .ok_or_else(|| missing("terms acceptance"))?;
        Ok(Submission {
            network: self
                .state
                .get_network()
                .await?
                .ok_or_else(|| missing("network"))?
                .name,
            address: self
                .state
                .get_address()
                .await?
                .ok_or_else(|| missing("private key"))?,
            role: self.state.get_role().await?.ok_or_else(|| missing("node role"))?,
            url: self.state.get_node_url().await?,
            ip: self.state.get_node_ip().await?,
            email: self.state.get_user_email().await?.filter(|e| !e.is_empty()),
            tos_hash: tos.hash,
            tos_signature: tos.signature,
        })
    }
}

#[async_trait]
impl Phase for ManualSubmissionPhase {
    type Output = Submission;

    fn name(&self) -> &'static str {
        "manual_submission"
    }

    async fn run(&self) -> Result<PhaseOutcome<Submission>> {
        let submission = self.build().await?;
        self.dialogs.display_submission(&submission).await?;
        Ok(PhaseOutcome::Collected(submission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case_without_absent_fields() {
        let submission = Submission {
            network: "main".into(),
            address: "0xabc".into(),
            role: NodeRole::Apollo,
            url: None,
            ip: Some("10.1.2.3".into()),
            email: None,
            tos_hash: "0x01".into(),
            tos_signature: "0x02".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["role"], "APOLLO");
        assert_eq!(json["tosHash"], "0x01");
        assert_eq!(json["ip"], "10.1.2.3");
        assert!(json.get("url").is_none());
        assert!(json.get("email").is_none());
    }
}
