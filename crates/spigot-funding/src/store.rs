//! The funder store: key files on disk.
//!
//! Layout under the store directory:
//!
//! ```text
//! <dir>/primary.json       the designated funding account
//! <dir>/pool/*.json        ephemeral pool accounts
//! ```
//!
//! Pool accounts are enumerated in sorted filename order, which keeps
//! selection deterministic. The funding flow only reads this store; files
//! are created by the CLI's generate command. An unreadable pool file is
//! skipped with a warning rather than aborting enumeration.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use spigot_core::error::KeystoreError;
use spigot_core::{keystore, Address, KeyPair};

/// File name of the designated account.
pub const PRIMARY_FILE: &str = "primary.json";

/// Subdirectory holding the ephemeral pool accounts.
pub const POOL_DIR: &str = "pool";

/// An account usable as a transfer source.
#[derive(Debug, Clone)]
pub struct Funder {
    /// File stem the account was loaded from ("primary", "account_003", ...).
    pub label: String,
    pub keypair: KeyPair,
}

impl Funder {
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.keypair.public_key())
    }
}

/// Read-mostly directory of funder key files.
#[derive(Debug, Clone)]
pub struct FunderStore {
    dir: PathBuf,
}

impl FunderStore {
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn primary_path(&self) -> PathBuf {
        self.dir.join(PRIMARY_FILE)
    }

    pub fn pool_dir(&self) -> PathBuf {
        self.dir.join(POOL_DIR)
    }

    /// Load the designated account, if its key file exists.
    pub fn primary(&self) -> Result<Option<Funder>, KeystoreError> {
        let path = self.primary_path();
        if !path.exists() {
            return Ok(None);
        }
        let keypair = keystore::load_keypair(&path)?;
        Ok(Some(Funder {
            label: "primary".into(),
            keypair,
        }))
    }

    /// Enumerate pool accounts in sorted filename order.
    ///
    /// A missing pool directory is an empty pool. Unreadable or malformed
    /// key files are skipped.
    pub fn pool(&self) -> Result<Vec<Funder>, KeystoreError> {
        let dir = self.pool_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&dir).map_err(|e| KeystoreError::Io {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut funders = Vec::with_capacity(paths.len());
        for path in paths {
            match keystore::load_keypair(&path) {
                Ok(keypair) => {
                    let label = path
                        .file_stem()
                        .map(|stem| stem.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    funders.push(Funder { label, keypair });
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable pool key file"),
            }
        }
        Ok(funders)
    }

    /// Generate a fresh pool account and persist its key file.
    ///
    /// Picks the first free `account_NNN.json` slot; zero-padding keeps
    /// the sorted enumeration in creation order.
    pub fn create_pool_account(&self) -> Result<Funder, KeystoreError> {
        let pool_dir = self.pool_dir();
        let mut index = 1usize;
        let path = loop {
            let candidate = pool_dir.join(format!("account_{index:03}.json"));
            if !candidate.exists() {
                break candidate;
            }
            index += 1;
        };
        let keypair = KeyPair::generate();
        keystore::save_keypair(&keypair, &path)?;
        Ok(Funder {
            label: format!("account_{index:03}"),
            keypair,
        })
    }

    /// Generate and persist the designated account.
    pub fn create_primary(&self) -> Result<Funder, KeystoreError> {
        let keypair = KeyPair::generate();
        keystore::save_keypair(&keypair, &self.primary_path())?;
        Ok(Funder {
            label: "primary".into(),
            keypair,
        })
    }
}
