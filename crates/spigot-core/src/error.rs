//! Error types for the spigot core crate.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("signature verification failed")] VerificationFailed,
    #[error("public key does not match the derived secret key")] InconsistentKeyPair,
    #[error("signer public key does not match the source address")] SourceKeyMismatch,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid length: {0} bytes")] InvalidLength(usize),
    #[error("invalid base58: {0}")] InvalidBase58(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("serialization: {0}")] Serialization(String),
    #[error("invalid payload hex: {0}")] InvalidHex(String),
    #[error("decode: {0}")] Decode(String),
    #[error(transparent)] Crypto(#[from] CryptoError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeystoreError {
    #[error("io on {path}: {reason}")] Io { path: String, reason: String },
    #[error("invalid key file {path}: {reason}")] InvalidFormat { path: String, reason: String },
    #[error("key file {path} holds {len} bytes, expected 64")] InvalidLength { path: String, len: usize },
    #[error("key file {path}: {source}")] InvalidKeyMaterial { path: String, source: CryptoError },
}

/// Errors converting a human-entered coin amount into motes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AmountError {
    #[error("amount is not a finite number")] NotFinite,
    #[error("amount must be positive: {0}")] NotPositive(f64),
    #[error("amount exceeds the representable range: {0}")] Overflow(f64),
}
