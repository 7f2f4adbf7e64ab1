//! Error taxonomy for the funding engine.
//!
//! Transient backend failures are absorbed by rotation and bounded retry
//! inside the components; only the exhaustion of a component's own retry
//! budget propagates upward, as one of the typed variants here.

use thiserror::Error;

use spigot_core::error::{KeystoreError, TransactionError};

/// A single backend call failed, transport- or protocol-level.
///
/// Recovered locally by endpoint rotation; never fatal to the overall
/// flow by itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("endpoint {endpoint}: {reason}")]
pub struct EndpointError {
    /// The endpoint that served (or failed to serve) the call.
    pub endpoint: String,
    pub reason: String,
}

/// The endpoint list handed to [`crate::EndpointPool::new`] was empty.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("endpoint pool requires at least one endpoint")]
pub struct EmptyEndpointList;

/// Failures of the funding flow, pattern-matchable on recoverability.
#[derive(Error, Debug)]
pub enum FundingError {
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    /// Both the RPC faucet and the web faucet exhausted their attempt
    /// budgets.
    #[error("funding exhausted after {attempts} airdrop attempts")]
    FundingExhausted { attempts: u32 },

    /// No account in the designated slot or pool qualified, even after one
    /// top-up attempt.
    #[error("no funded account available with {required} motes")]
    NoFundedAccountAvailable { required: u64 },

    /// A zero transfer amount was requested. Rejected before any network
    /// activity.
    #[error("transfer amount must be positive, got {motes} motes")]
    InvalidAmount { motes: u64 },

    #[error("account store: {0}")]
    Store(#[from] KeystoreError),

    #[error("signing: {0}")]
    Signing(#[from] TransactionError),
}
