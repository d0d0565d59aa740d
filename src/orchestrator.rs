//! Orchestrator: ONBOARDING, then the action MENU.
//!
//! Onboarding runs the phases in order and stops at the first rejection;
//! the next launch resumes from that phase because every earlier phase
//! finds its fact already recorded. Once onboarding is complete the menu
//! loops over role-gated actions until the operator quits.

use crate::actions::ActionOutcome;
use crate::builder::{Stage1, Stage2, build_stage2};
use crate::error::{Error, GatewayError, Result};
use crate::phases::{Phase, RejectReason, run_logged};
use crate::state::NodeRole;

/// How a wizard session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The operator quit from the menu.
    Quit,
    /// Onboarding stopped on an unmet precondition.
    Halted(RejectReason),
}

/// Result of the onboarding stage.
pub enum Onboarding {
    /// Onboarding is complete; the menu can be entered.
    Complete(Stage2),
    Halted(RejectReason),
}

impl std::fmt::Debug for Onboarding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete(stage2) => f
                .debug_tuple("Complete")
                .field(&stage2.network.name)
                .finish(),
            Self::Halted(reason) => f.debug_tuple("Halted").field(reason).finish(),
        }
    }
}

pub struct Orchestrator {
    stage1: Stage1,
    max_gateway_failures: u32,
}

async fn step<P: Phase>(phase: P) -> Result<std::result::Result<P::Output, RejectReason>> {
    Ok(run_logged(&phase).await?.into_value())
}

impl Orchestrator {
    pub fn new(stage1: Stage1, max_gateway_failures: u32) -> Self {
        Self {
            stage1,
            max_gateway_failures,
        }
    }

    /// Run a full session. Unrecoverable errors are shown to the operator
    /// before they are returned.
    pub async fn run(&self) -> Result<RunOutcome> {
        let result = self.run_session().await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Wizard stopped");
            if !matches!(e, Error::Dialog(_))
                && let Err(render) = self.stage1.dialogs.generic_error(&e.to_string()).await
            {
                tracing::warn!(error = %render, "Could not show the error to the operator");
            }
        }
        result
    }

    async fn run_session(&self) -> Result<RunOutcome> {
        match self.onboard().await? {
            Onboarding::Halted(reason) => {
                tracing::info!(%reason, "Onboarding halted, rerun the wizard to resume");
                Ok(RunOutcome::Halted(reason))
            }
            Onboarding::Complete(stage2) => self.menu(&stage2).await,
        }
    }

    /// The ONBOARDING stage. Returns immediately, without any dialog, when
    /// onboarding was already completed in an earlier session.
    pub async fn onboard(&self) -> Result<Onboarding> {
        if self.stage1.state.has_completed_onboarding().await? {
            tracing::info!("Onboarding already complete");
            return Ok(Onboarding::Complete(self.resume().await?));
        }

        if let Err(reason) = step(self.stage1.check_docker()).await? {
            return Ok(Onboarding::Halted(reason));
        }
        let key = match step(self.stage1.private_key()).await? {
            Ok(key) => key,
            Err(reason) => return Ok(Onboarding::Halted(reason)),
        };
        let network = match step(self.stage1.select_network()).await? {
            Ok(network) => network,
            Err(reason) => return Ok(Onboarding::Halted(reason)),
        };
        let stage2 = build_stage2(&self.stage1, network, key)?;

        if let Err(reason) = step(stage2.accept_tos()).await? {
            return Ok(Onboarding::Halted(reason));
        }
        let role = match step(stage2.select_role()).await? {
            Ok(role) => role,
            Err(reason) => return Ok(Onboarding::Halted(reason)),
        };
        let endpoint = if role.requires_url() {
            step(stage2.node_url()).await?
        } else {
            step(stage2.node_ip()).await?
        };
        if let Err(reason) = endpoint {
            return Ok(Onboarding::Halted(reason));
        }
        if let Err(reason) = step(stage2.user_email()).await? {
            return Ok(Onboarding::Halted(reason));
        }

        let whitelist = match step(stage2.check_whitelist()).await? {
            Ok(entry) => entry,
            Err(reason @ RejectReason::NotWhitelisted { .. }) => {
                let _submission = step(stage2.manual_submission()).await?;
                return Ok(Onboarding::Halted(reason));
            }
            Err(reason) => return Ok(Onboarding::Halted(reason)),
        };
        if let Err(reason) = step(stage2.perform_onboarding(whitelist)).await? {
            return Ok(Onboarding::Halted(reason));
        }

        self.show_run_instructions(role).await?;
        Ok(Onboarding::Complete(stage2))
    }

    /// Rebuild stage 2 from recorded state. A catalog entry whose parameters
    /// changed since onboarding replaces the stored one.
    async fn resume(&self) -> Result<Stage2> {
        let state = &self.stage1.state;
        let missing = |fact: &str| Error::Fatal(format!("{fact} missing from completed onboarding"));
        let key = state.get_private_key().await?.ok_or_else(|| missing("private key"))?;
        let mut network = state.get_network().await?.ok_or_else(|| missing("network"))?;
        if let Some(current) = self.stage1.networks.iter().find(|n| n.name == network.name)
            && *current != network
        {
            tracing::info!(network = %current.name, "Refreshing stored network parameters");
            state.store_network(current).await?;
            self.stage1.dialogs.docker_restart_required().await?;
            network = current.clone();
        }
        build_stage2(&self.stage1, network, key)
    }

    async fn show_run_instructions(&self, role: NodeRole) -> Result<()> {
        let healthcheck = if role.requires_url() {
            self.stage1
                .state
                .get_node_url()
                .await?
                .map(|url| format!("{}/health", url.trim_end_matches('/')))
        } else {
            None
        };
        self.stage1
            .dialogs
            .run_instructions(healthcheck.as_deref(), &self.stage1.output_dir)
            .await?;
        Ok(())
    }

    /// The MENU stage. An action's error is shown and the loop continues,
    /// unless it is fatal or the gateway stayed unreachable for more than
    /// `max_gateway_failures` consecutive actions.
    pub async fn menu(&self, stage2: &Stage2) -> Result<RunOutcome> {
        let role = self
            .stage1
            .state
            .get_role()
            .await?
            .ok_or_else(|| Error::Fatal("node role missing from completed onboarding".into()))?;
        let menu = stage2.action_menu(role);
        let kinds = menu.kinds();
        let dialogs = &self.stage1.dialogs;
        let mut network_failures = 0u32;

        loop {
            let kind = dialogs.select_action(&kinds).await?;
            match menu.run(kind).await {
                Ok(ActionOutcome::Quit) => {
                    tracing::info!(action = %kind, "Leaving the menu");
                    return Ok(RunOutcome::Quit);
                }
                Ok(ActionOutcome::Continue) => network_failures = 0,
                Err(e) if e.is_fatal() => return Err(e),
                Err(Error::Gateway(GatewayError::InsufficientFunds(reason))) => {
                    tracing::warn!(action = %kind, %reason, "Action failed for lack of funds");
                    network_failures = 0;
                    dialogs.insufficient_funds().await?;
                }
                Err(e) => {
                    tracing::warn!(action = %kind, error = %e, "Action failed");
                    if e.is_network() {
                        network_failures += 1;
                        if network_failures > self.max_gateway_failures {
                            return Err(e);
                        }
                    } else {
                        network_failures = 0;
                    }
                    dialogs.generic_error(&e.to_string()).await?;
                }
            }
        }
    }
}
