//! Docker availability check.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Phase, PhaseOutcome, RejectReason};
use crate::dialogs::Dialogs;
use crate::error::Result;
use crate::system::System;

pub struct CheckDockerPhase {
    system: Arc<dyn System>,
    dialogs: Arc<dyn Dialogs>,
}

impl CheckDockerPhase {
    pub fn new(system: Arc<dyn System>, dialogs: Arc<dyn Dialogs>) -> Self {
        Self { system, dialogs }
    }
}

#[async_trait]
impl Phase for CheckDockerPhase {
    type Output = ();

    fn name(&self) -> &'static str {
        "check_docker"
    }

    async fn run(&self) -> Result<PhaseOutcome<()>> {
        if self.system.is_docker_available().await? {
            self.dialogs.docker_detected().await?;
            Ok(PhaseOutcome::Collected(()))
        } else {
            self.dialogs.docker_missing().await?;
            Ok(PhaseOutcome::Rejected(RejectReason::DockerMissing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedDialogs, StubSystem};

    #[tokio::test]
    async fn missing_docker_rejects() {
        let dialogs = Arc::new(ScriptedDialogs::new(vec![]));
        let phase = CheckDockerPhase::new(Arc::new(StubSystem::new(false)), dialogs.clone());
        assert_eq!(
            phase.run().await.unwrap(),
            PhaseOutcome::Rejected(RejectReason::DockerMissing)
        );
        assert_eq!(dialogs.calls(), vec!["docker_missing"]);
    }

    #[tokio::test]
    async fn available_docker_proceeds() {
        let dialogs = Arc::new(ScriptedDialogs::new(vec![]));
        let phase = CheckDockerPhase::new(Arc::new(StubSystem::new(true)), dialogs.clone());
        assert_eq!(phase.run().await.unwrap(), PhaseOutcome::Collected(()));
        assert_eq!(dialogs.calls(), vec!["docker_detected"]);
    }
}
