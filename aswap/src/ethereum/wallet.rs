use crate::ethereum::{Address, ChainId};
use htlc::{
    export::secp256k1::SecretKey,
    transaction::{self, SignedTransaction, UnsignedTransaction},
};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("parse private key")]
    InvalidKey(#[source] anyhow::Error),
    #[error("mismatch private key ({key_account}) and account ({account})")]
    Mismatch {
        key_account: Address,
        account: Address,
    },
    #[error("not found {account} in {} keystore", .dir.display())]
    NotFound { account: Address, dir: PathBuf },
    #[error("unlock {account} keystore: invalid password")]
    InvalidPassword { account: Address },
    #[error("unlock {account} keystore")]
    Keystore {
        account: Address,
        #[source]
        source: eth_keystore::KeystoreError,
    },
    #[error("no account configured to sign with")]
    NoAccount,
    #[error("failed to read keystore directory {}", .dir.display())]
    Io {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The unlocked capability to sign transactions for one account.
///
/// Both variants hold the decrypted key; they differ in where it came from.
#[derive(Debug)]
pub enum Signer {
    RawKey { key: SecretKey, account: Address },
    Keystore {
        path: PathBuf,
        key: SecretKey,
        account: Address,
    },
}

impl Signer {
    /// Unlocks with a hex private key given on the command line. The key must
    /// belong to the configured `account`.
    pub fn from_raw_key(private_key: &str, account: Address) -> Result<Self, AuthError> {
        let bytes = hex::decode(private_key.trim_start_matches("0x"))
            .map_err(|e| AuthError::InvalidKey(e.into()))?;
        let key = SecretKey::from_slice(&bytes).map_err(|e| AuthError::InvalidKey(e.into()))?;

        let key_account = transaction::account_of(&key);
        if key_account != account {
            return Err(AuthError::Mismatch {
                key_account,
                account,
            });
        }

        Ok(Signer::RawKey { key, account })
    }

    /// Unlocks `account` from an encrypted key file in `dir`.
    pub fn from_keystore(dir: &Path, account: Address, password: &str) -> Result<Self, AuthError> {
        let path = find_key_file(dir, account)?;

        let bytes = eth_keystore::decrypt_key(&path, password).map_err(|e| match e {
            eth_keystore::KeystoreError::MacMismatch => AuthError::InvalidPassword { account },
            source => AuthError::Keystore { account, source },
        })?;
        let key = SecretKey::from_slice(&bytes).map_err(|e| AuthError::InvalidKey(e.into()))?;

        tracing::debug!("Unlocked {} from {}", account, path.display());

        Ok(Signer::Keystore { path, key, account })
    }

    pub fn account(&self) -> Address {
        match self {
            Signer::RawKey { account, .. } | Signer::Keystore { account, .. } => *account,
        }
    }

    pub fn sign(
        &self,
        transaction: &UnsignedTransaction,
        chain_id: ChainId,
    ) -> Result<SignedTransaction, transaction::Error> {
        match self {
            Signer::RawKey { key, .. } | Signer::Keystore { key, .. } => {
                transaction.sign(key, chain_id)
            }
        }
    }
}

impl fmt::Display for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signer::RawKey { account, .. } => write!(f, "{} (private key)", account),
            Signer::Keystore { account, path, .. } => {
                write!(f, "{} ({})", account, path.display())
            }
        }
    }
}

/// Key files name their account in the `address` field, lowercase and
/// without prefix.
fn find_key_file(dir: &Path, account: Address) -> Result<PathBuf, AuthError> {
    #[derive(serde::Deserialize)]
    struct KeyFile {
        address: String,
    }

    let entries = fs::read_dir(dir).map_err(|source| AuthError::Io {
        dir: dir.to_path_buf(),
        source,
    })?;

    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .find(|path| {
            fs::read_to_string(path)
                .ok()
                .and_then(|contents| serde_json::from_str::<KeyFile>(&contents).ok())
                .and_then(|file| file.address.parse::<Address>().ok())
                .map_or(false, |address| address == account)
        })
        .ok_or_else(|| AuthError::NotFound {
            account,
            dir: dir.to_path_buf(),
        })
}
