//! Node onboarding: resumable setup wizard for Atlas, Hermes and Apollo nodes.

pub mod actions;
pub mod builder;
pub mod config;
pub mod crypto;
pub mod dialogs;
pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod phases;
pub mod state;
pub mod store;
pub mod system;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
