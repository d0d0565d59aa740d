use std::sync::Arc;

use async_trait::async_trait;

use super::{Phase, PhaseOutcome, stored_or_retry};
use crate::dialogs::Dialogs;
use crate::error::Result;
use crate::state::StateModel;

/// Optional contact email. An empty string records that the operator
/// declined, so the question is not repeated.
pub struct GetUserEmailPhase {
    state: Arc<StateModel>,
    dialogs: Arc<dyn Dialogs>,
}

impl GetUserEmailPhase {
    pub fn new(state: Arc<StateModel>, dialogs: Arc<dyn Dialogs>) -> Self {
        Self { state, dialogs }
    }
}

#[async_trait]
impl Phase for GetUserEmailPhase {
    type Output = String;

    fn name(&self) -> &'static str {
        "user_email"
    }

    async fn run(&self) -> Result<PhaseOutcome<String>> {
        if let Some(email) = self.state.get_user_email().await? {
            self.dialogs.user_email_detected(&email).await?;
            return Ok(PhaseOutcome::Skipped(email));
        }

        let email = loop {
            let email = self.dialogs.ask_for_user_email().await?;
            let result = self.state.store_user_email(email.as_deref()).await;
            if stored_or_retry(self.dialogs.as_ref(), result).await? {
                break email.unwrap_or_default();
            }
        };
        self.dialogs.user_email_detected(&email).await?;
        Ok(PhaseOutcome::Collected(email))
    }
}
