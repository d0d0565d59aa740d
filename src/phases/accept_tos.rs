use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::{Phase, PhaseOutcome, missing, stored_or_retry};
use crate::dialogs::Dialogs;
use crate::error::Result;
use crate::gateway::ContractGateway;
use crate::state::{StateModel, TosAcceptance, validation};

/// Collect and sign the terms-of-service acceptance.
///
/// The record is written once; later runs return it untouched and never
/// show the terms again.
pub struct AcceptTosPhase {
    tos_text: String,
    state: Arc<StateModel>,
    gateway: Arc<dyn ContractGateway>,
    dialogs: Arc<dyn Dialogs>,
}

impl AcceptTosPhase {
    pub fn new(
        tos_text: String,
        state: Arc<StateModel>,
        gateway: Arc<dyn ContractGateway>,
        dialogs: Arc<dyn Dialogs>,
    ) -> Self {
        Self {
            tos_text,
            state,
            gateway,
            dialogs,
        }
    }
}

#[async_trait]
impl Phase for AcceptTosPhase {
    type Output = TosAcceptance;

    fn name(&self) -> &'static str {
        "accept_tos"
    }

    async fn run(&self) -> Result<PhaseOutcome<TosAcceptance>> {
        if let Some(existing) = self.state.get_signed_tos().await? {
            return Ok(PhaseOutcome::Skipped(existing));
        }

        let sentence = loop {
            let sentence = self.dialogs.accept_tos(&self.tos_text).await?;
            let checked = validation::validate_tos_acceptance(&sentence).map_err(Into::into);
            if stored_or_retry(self.dialogs.as_ref(), checked).await? {
                break sentence;
            }
        };

        let key = self
            .state
            .get_private_key()
            .await?
            .ok_or_else(|| missing("private key"))?;
        let mut record = TosAcceptance {
            text: self.tos_text.clone(),
            acceptance_sentence: sentence,
            hash: self.gateway.hash_data(&self.tos_text),
            signature: String::new(),
            accepted_at: Utc::now(),
        };
        let signed_text = record.signed_text();
        record.signature = self.gateway.sign_message(&signed_text, &key)?;

        let path = self.state.create_tos_file(&signed_text).await?;
        let stored = self.state.store_signed_tos(record).await?;
        tracing::info!(hash = %stored.hash, file = %path.display(), "Terms of service accepted");
        Ok(PhaseOutcome::Collected(stored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto;
    use crate::testing::{Answer, MockGateway, ScriptedDialogs, TEST_KEY, temp_state};
    use crate::state::state_model::TOS_FILE_NAME;
    use secrecy::SecretString;

    const SENTENCE: &str =
        "I, Ada Lovelace, read and agreed with the terms and conditions above.";

    #[tokio::test]
    async fn acceptance_is_signed_and_persisted_once() {
        let (state, dir) = temp_state().await;
        state
            .store_private_key(&SecretString::from(TEST_KEY))
            .await
            .unwrap();
        let dialogs = Arc::new(ScriptedDialogs::new(vec![
            Answer::Text("I agree".into()),
            Answer::Text(SENTENCE.into()),
        ]));
        let phase = AcceptTosPhase::new(
            "Terms v1".into(),
            state.clone(),
            Arc::new(MockGateway::new()),
            dialogs.clone(),
        );

        let record = phase.run().await.unwrap().into_value().unwrap();
        assert_eq!(record.hash, crypto::hash_data("Terms v1"));
        assert_eq!(record.acceptance_sentence, SENTENCE);
        assert_eq!(
            record.signature,
            crypto::sign_message(&record.signed_text(), &SecretString::from(TEST_KEY)).unwrap()
        );
        assert_eq!(dialogs.calls(), vec!["accept_tos", "invalid_input", "accept_tos"]);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("output").join(TOS_FILE_NAME)).unwrap(),
            record.signed_text()
        );

        let again = phase.run().await.unwrap();
        assert_eq!(again, PhaseOutcome::Skipped(record));
        assert_eq!(dialogs.calls().len(), 3);
    }

    #[tokio::test]
    async fn signing_requires_a_key() {
        let (state, _dir) = temp_state().await;
        let dialogs = Arc::new(ScriptedDialogs::new(vec![Answer::Text(SENTENCE.into())]));
        let phase = AcceptTosPhase::new(
            "Terms".into(),
            state.clone(),
            Arc::new(MockGateway::new()),
            dialogs,
        );
        assert!(phase.run().await.unwrap_err().is_fatal());
        assert!(state.get_signed_tos().await.unwrap().is_none());
    }
}
