//! Persistence layer: a file-backed key/value store for onboarding state.

pub mod file;
pub mod traits;

pub use file::FileStore;
pub use traits::StateStore;
