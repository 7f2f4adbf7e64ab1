//! JSON keypair files.
//!
//! A key file is a JSON array of 64 byte values: the 32-byte secret key
//! followed by the 32-byte public key. Devnet keys are throwaway, so files
//! are stored unencrypted; the in-memory buffer is zeroized after use.

use std::fs;
use std::path::Path;

use zeroize::Zeroize;

use crate::crypto::KeyPair;
use crate::error::KeystoreError;

fn path_str(path: &Path) -> String {
    path.display().to_string()
}

/// Load a keypair from a JSON key file.
pub fn load_keypair(path: &Path) -> Result<KeyPair, KeystoreError> {
    let contents = fs::read_to_string(path).map_err(|e| KeystoreError::Io {
        path: path_str(path),
        reason: e.to_string(),
    })?;
    let mut bytes: Vec<u8> =
        serde_json::from_str(&contents).map_err(|e| KeystoreError::InvalidFormat {
            path: path_str(path),
            reason: e.to_string(),
        })?;
    if bytes.len() != 64 {
        let len = bytes.len();
        bytes.zeroize();
        return Err(KeystoreError::InvalidLength {
            path: path_str(path),
            len,
        });
    }
    let mut buf = [0u8; 64];
    buf.copy_from_slice(&bytes);
    bytes.zeroize();
    let result = KeyPair::from_bytes(&buf).map_err(|source| KeystoreError::InvalidKeyMaterial {
        path: path_str(path),
        source,
    });
    buf.zeroize();
    result
}

/// Save a keypair to a JSON key file, creating parent directories.
pub fn save_keypair(keypair: &KeyPair, path: &Path) -> Result<(), KeystoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| KeystoreError::Io {
            path: path_str(parent),
            reason: e.to_string(),
        })?;
    }
    let mut bytes = keypair.to_bytes();
    let json = serde_json::to_string(&bytes.to_vec()).map_err(|e| KeystoreError::InvalidFormat {
        path: path_str(path),
        reason: e.to_string(),
    })?;
    bytes.zeroize();
    fs::write(path, json).map_err(|e| KeystoreError::Io {
        path: path_str(path),
        reason: e.to_string(),
    })
}
