//! Onboarding state: what has already been decided, and the only writer of
//! the persisted store.

pub mod model;
pub mod state_model;
pub mod validation;

pub use model::{NodeRole, RetirementStage, TosAcceptance, Withdrawal, state_keys};
pub use state_model::StateModel;
