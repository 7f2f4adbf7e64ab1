//! # spigot-funding
//! The funding engine: multi-endpoint RPC failover, two-tier airdrop
//! acquisition, confirmation polling, and balance-based selection of a
//! funding account for outbound transfers.

pub mod airdrop;
pub mod confirm;
pub mod endpoints;
pub mod error;
pub mod retry;
pub mod rpc;
pub mod selector;
pub mod store;
pub mod transfer;

pub use airdrop::{Acquirer, Faucet, WebFaucet};
pub use confirm::await_confirmation;
pub use endpoints::EndpointPool;
pub use error::{EndpointError, FundingError};
pub use retry::RetryPolicy;
pub use rpc::{HttpTransport, ResilientClient, Transport};
pub use selector::Selector;
pub use store::{Funder, FunderStore};
