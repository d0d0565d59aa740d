use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;

use super::{Phase, PhaseOutcome, stored_or_retry};
use crate::dialogs::{Dialogs, PrivateKeySource};
use crate::error::{Error, Result};
use crate::state::StateModel;

/// Obtain the operator's signing key, generating one on request.
pub struct GetPrivateKeyPhase {
    state: Arc<StateModel>,
    dialogs: Arc<dyn Dialogs>,
}

impl GetPrivateKeyPhase {
    pub fn new(state: Arc<StateModel>, dialogs: Arc<dyn Dialogs>) -> Self {
        Self { state, dialogs }
    }

    async fn announce(&self) -> Result<()> {
        let address = self
            .state
            .get_address()
            .await?
            .ok_or_else(|| Error::Fatal("private key missing after it was stored".into()))?;
        self.dialogs.private_key_detected(&address).await?;
        Ok(())
    }
}

#[async_trait]
impl Phase for GetPrivateKeyPhase {
    type Output = SecretString;

    fn name(&self) -> &'static str {
        "private_key"
    }

    async fn run(&self) -> Result<PhaseOutcome<SecretString>> {
        if let Some(key) = self.state.get_private_key().await? {
            self.announce().await?;
            return Ok(PhaseOutcome::Skipped(key));
        }

        let key = loop {
            match self.dialogs.ask_for_private_key().await? {
                PrivateKeySource::Generate => {
                    break self.state.generate_and_store_private_key().await?;
                }
                PrivateKeySource::Manual(key) => {
                    let result = self.state.store_private_key(&key).await;
                    if stored_or_retry(self.dialogs.as_ref(), result).await? {
                        break key;
                    }
                }
            }
        };
        tracing::info!("Private key recorded");
        self.announce().await?;
        Ok(PhaseOutcome::Collected(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Answer, ScriptedDialogs, TEST_ADDRESS, TEST_KEY, temp_state};
    use secrecy::ExposeSecret;

    #[tokio::test]
    async fn invalid_manual_key_is_asked_again() {
        let (state, _dir) = temp_state().await;
        let dialogs = Arc::new(ScriptedDialogs::new(vec![
            Answer::Key(PrivateKeySource::Manual(SecretString::from("0xdead"))),
            Answer::Key(PrivateKeySource::Manual(SecretString::from(TEST_KEY))),
        ]));
        let phase = GetPrivateKeyPhase::new(state.clone(), dialogs.clone());

        let key = phase.run().await.unwrap().into_value().unwrap();
        assert_eq!(key.expose_secret(), TEST_KEY);
        assert_eq!(
            dialogs.calls(),
            vec![
                "ask_for_private_key",
                "invalid_input",
                "ask_for_private_key",
                "private_key_detected",
            ]
        );
        assert_eq!(dialogs.notices(), vec![TEST_ADDRESS.to_string()]);
    }

    #[tokio::test]
    async fn generated_key_is_persisted_and_reused() {
        let (state, _dir) = temp_state().await;
        let dialogs = Arc::new(ScriptedDialogs::new(vec![Answer::Key(
            PrivateKeySource::Generate,
        )]));
        let phase = GetPrivateKeyPhase::new(state.clone(), dialogs.clone());
        let first = phase.run().await.unwrap();
        assert!(matches!(first, PhaseOutcome::Collected(_)));

        let second = phase.run().await.unwrap();
        assert!(second.is_skipped());
        assert_eq!(
            second.into_value().unwrap().expose_secret(),
            first.into_value().unwrap().expose_secret()
        );
    }
}
