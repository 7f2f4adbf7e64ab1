//! # spigot-core
//! Keys, addresses, amounts, and transfer signing for the spigot toolkit.

pub mod address;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod keystore;
pub mod transaction;
pub mod types;

pub use address::Address;
pub use crypto::{KeyPair, PublicKey};
pub use transaction::{SignedTransaction, TransferMessage};
pub use types::{BlockHash, Signature};
