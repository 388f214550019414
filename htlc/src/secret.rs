use crate::ethereum::{decode_fixed, ParseError};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::{fmt, str::FromStr};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to draw secret from OS randomness source")]
    Randomness(#[from] rand::Error),
    #[error("invalid 32-byte hex value")]
    Parse(#[from] ParseError),
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Secret([u8; Secret::LENGTH]);

impl Secret {
    pub const LENGTH: usize = 32;

    pub fn generate() -> Result<Self, Error> {
        let mut bytes = [0u8; Secret::LENGTH];
        OsRng.try_fill_bytes(&mut bytes)?;

        Ok(Secret(bytes))
    }

    pub fn hash(&self) -> SecretHash {
        SecretHash(Sha256::digest(self.0).into())
    }

    pub fn as_raw_secret(&self) -> &[u8; Secret::LENGTH] {
        &self.0
    }
}

impl From<[u8; Secret::LENGTH]> for Secret {
    fn from(bytes: [u8; Secret::LENGTH]) -> Self {
        Secret(bytes)
    }
}

impl FromStr for Secret {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Secret(decode_fixed(s)?))
    }
}

impl fmt::LowerHex for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self)
    }
}

// Never leak the preimage into logs by accident.
impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SecretHash([u8; Secret::LENGTH]);

impl SecretHash {
    pub fn as_raw(&self) -> &[u8; Secret::LENGTH] {
        &self.0
    }
}

impl From<[u8; Secret::LENGTH]> for SecretHash {
    fn from(bytes: [u8; Secret::LENGTH]) -> Self {
        SecretHash(bytes)
    }
}

impl FromStr for SecretHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SecretHash(decode_fixed(s)?))
    }
}

impl fmt::LowerHex for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Display for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self)
    }
}

/// A freshly drawn secret together with the commitment that is published on
/// both chains.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SecretHashPair {
    pub secret: Secret,
    pub hash: SecretHash,
}

impl SecretHashPair {
    pub fn generate() -> Result<Self, Error> {
        let secret = Secret::generate()?;

        Ok(SecretHashPair {
            hash: secret.hash(),
            secret,
        })
    }
}
