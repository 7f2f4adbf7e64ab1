//! Transfer message construction and signing.
//!
//! A transfer is a single-instruction message: move `motes` from `from` to
//! `to`, anchored to a recent blockhash so the backend can expire stale
//! submissions. The signed form is bincode-encoded and hex-wrapped for
//! `sendrawtransaction`.

use crate::address::Address;
use crate::crypto::{KeyPair, PublicKey};
use crate::error::{CryptoError, TransactionError};
use crate::types::{BlockHash, Signature};

/// The unsigned body of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct TransferMessage {
    pub from: Address,
    pub to: Address,
    /// Amount in motes.
    pub motes: u64,
    pub recent_blockhash: BlockHash,
}

impl TransferMessage {
    pub fn new(from: Address, to: Address, motes: u64, recent_blockhash: BlockHash) -> Self {
        Self {
            from,
            to,
            motes,
            recent_blockhash,
        }
    }

    /// Canonical byte encoding signed by the sender.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| TransactionError::Serialization(e.to_string()))
    }

    /// Sign with the sender's keypair, producing a submittable transaction.
    ///
    /// The keypair must be the one `from` was derived from; a mismatch is
    /// rejected rather than producing a transaction the backend would drop.
    pub fn sign(self, keypair: &KeyPair) -> Result<SignedTransaction, TransactionError> {
        let signer = keypair.public_key();
        if Address::from_public_key(&signer) != self.from {
            return Err(CryptoError::SourceKeyMismatch.into());
        }
        let bytes = self.to_bytes()?;
        let signature = Signature::from_bytes(keypair.sign(&bytes));
        Ok(SignedTransaction {
            message: self,
            signer_key: signer.to_bytes(),
            signature,
        })
    }
}

/// A signed transfer, ready for submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct SignedTransaction {
    pub message: TransferMessage,
    /// Raw bytes of the signer's Ed25519 public key.
    pub signer_key: [u8; 32],
    /// Ed25519 signature over the encoded message. Doubles as the
    /// transaction reference on the wire.
    pub signature: Signature,
}

impl SignedTransaction {
    /// The backend-facing identifier for this transaction.
    pub fn reference(&self) -> Signature {
        self.signature
    }

    /// Hex payload for `sendrawtransaction`.
    pub fn to_wire_hex(&self) -> Result<String, TransactionError> {
        let bytes = bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| TransactionError::Serialization(e.to_string()))?;
        Ok(hex::encode(bytes))
    }

    /// Decode a wire payload back into a transaction.
    pub fn from_wire_hex(payload: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(payload).map_err(|e| TransactionError::InvalidHex(e.to_string()))?;
        let (tx, _): (Self, _) = bincode::decode_from_slice(&bytes, bincode::config::standard())
            .map_err(|e| TransactionError::Decode(e.to_string()))?;
        Ok(tx)
    }

    /// Verify the signature and that the signer key matches the source
    /// address.
    pub fn verify(&self) -> Result<(), TransactionError> {
        let signer = PublicKey::from_bytes(&self.signer_key)?;
        if Address::from_public_key(&signer) != self.message.from {
            return Err(CryptoError::SourceKeyMismatch.into());
        }
        let bytes = self.message.to_bytes()?;
        signer.verify(&bytes, self.signature.as_bytes())?;
        Ok(())
    }
}
