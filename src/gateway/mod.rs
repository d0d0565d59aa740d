//! Smart contract gateway boundary.

pub mod rpc;
pub mod traits;

pub use rpc::RpcGateway;
pub use traits::{ContractGateway, WhitelistEntry};
