//! Post-onboarding actions offered in the menu.
//!
//! Each action kind carries a static set of roles it is offered to; the
//! menu is filtered once when it is built.

pub mod change_url;
pub mod payouts;
pub mod retire;

use std::sync::Arc;

use async_trait::async_trait;

use crate::dialogs::Dialogs;
use crate::error::{Error, Result};
use crate::gateway::ContractGateway;
use crate::state::{NodeRole, StateModel};

pub use change_url::ChangeUrlAction;
pub use payouts::PayoutsAction;
pub use retire::RetireAction;

/// Menu entry identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    ChangeUrl,
    Payouts,
    Retire,
    Quit,
}

impl ActionKind {
    /// Menu order.
    pub const ALL: [ActionKind; 4] = [
        ActionKind::ChangeUrl,
        ActionKind::Payouts,
        ActionKind::Retire,
        ActionKind::Quit,
    ];

    /// Roles the action is offered to.
    pub fn allowed_roles(&self) -> &'static [NodeRole] {
        match self {
            Self::ChangeUrl => &[NodeRole::Atlas, NodeRole::Hermes],
            Self::Payouts | Self::Retire => &[NodeRole::Atlas],
            Self::Quit => &NodeRole::ALL,
        }
    }

    pub fn is_allowed_for(&self, role: NodeRole) -> bool {
        self.allowed_roles().contains(&role)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ChangeUrl => "change_url",
            Self::Payouts => "payouts",
            Self::Retire => "retire",
            Self::Quit => "quit",
        };
        write!(f, "{s}")
    }
}

/// What the menu loop does after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Continue,
    Quit,
}

/// A menu action. Dependencies are bound at construction.
#[async_trait]
pub trait Action: Send + Sync {
    async fn run(&self) -> Result<ActionOutcome>;
}

struct QuitAction;

#[async_trait]
impl Action for QuitAction {
    async fn run(&self) -> Result<ActionOutcome> {
        Ok(ActionOutcome::Quit)
    }
}

/// Actions available to one role, in menu order.
pub struct ActionMenu {
    entries: Vec<(ActionKind, Box<dyn Action>)>,
}

impl ActionMenu {
    /// Menu for `role` over the onboarded node's dependencies.
    pub fn for_role(
        role: NodeRole,
        address: String,
        state: Arc<StateModel>,
        gateway: Arc<dyn ContractGateway>,
        dialogs: Arc<dyn Dialogs>,
    ) -> Self {
        let entries = ActionKind::ALL
            .into_iter()
            .filter(|kind| kind.is_allowed_for(role))
            .map(|kind| {
                let action: Box<dyn Action> = match kind {
                    ActionKind::ChangeUrl => Box::new(ChangeUrlAction::new(
                        state.clone(),
                        gateway.clone(),
                        dialogs.clone(),
                    )),
                    ActionKind::Payouts => Box::new(PayoutsAction::new(
                        address.clone(),
                        state.clone(),
                        gateway.clone(),
                        dialogs.clone(),
                    )),
                    ActionKind::Retire => Box::new(RetireAction::new(
                        address.clone(),
                        state.clone(),
                        gateway.clone(),
                        dialogs.clone(),
                    )),
                    ActionKind::Quit => Box::new(QuitAction),
                };
                (kind, action)
            })
            .collect();
        Self { entries }
    }

    pub fn kinds(&self) -> Vec<ActionKind> {
        self.entries.iter().map(|(kind, _)| *kind).collect()
    }

    pub async fn run(&self, kind: ActionKind) -> Result<ActionOutcome> {
        let (_, action) = self
            .entries
            .iter()
            .find(|(k, _)| *k == kind)
            .ok_or_else(|| Error::Fatal(format!("action {kind} is not offered to this role")))?;
        tracing::info!(action = %kind, "Running action");
        action.run().await
    }
}
