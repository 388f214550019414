use crate::serde_hex;
use hex::FromHexError;
pub use primitive_types::U256;
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fmt::{Display, Formatter, LowerHex},
    str::FromStr,
};
use tiny_keccak::{Hasher, Keccak};

pub fn keccak256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];

    hasher.update(bytes);
    hasher.finalize(&mut output);

    output
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid hex")]
    Hex(#[from] FromHexError),
    #[error("expected {expected} bytes but got {got}")]
    Length { expected: usize, got: usize },
}

/// Decodes hex with an optional `0x` prefix into exactly `N` bytes.
pub(crate) fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], ParseError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s)?;

    if bytes.len() != N {
        return Err(ParseError::Length {
            expected: N,
            got: bytes.len(),
        });
    }

    let mut array = [0u8; N];
    array.copy_from_slice(&bytes);

    Ok(array)
}

#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Address(#[serde(with = "serde_hex")] [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_slice(src: &[u8]) -> Self {
        let mut address = Address([0u8; 20]);
        address.0.copy_from_slice(src);
        address
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// The account address controlled by `public_key`: the last 20 bytes of
    /// the Keccak-256 hash of the uncompressed key without its tag byte.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let uncompressed = public_key.serialize_uncompressed();
        let hash = keccak256(&uncompressed[1..]);

        Address::from_slice(&hash[12..])
    }

    pub fn is_zero(&self) -> bool {
        self == &Address::ZERO
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl From<Address> for [u8; 20] {
    fn from(s: Address) -> Self {
        s.0
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed(s).map(Address)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self)
    }
}

impl LowerHex for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }
        for i in &self.0[..] {
            write!(f, "{:02x}", i)?;
        }
        Ok(())
    }
}

impl From<Address> for Hash {
    fn from(address: Address) -> Self {
        let mut h256 = Hash([0u8; 32]);
        h256.0[(32 - 20)..32].copy_from_slice(&address.0);
        h256
    }
}

#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Hash(#[serde(with = "serde_hex")] [u8; 32]);

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }
}

impl From<Hash> for [u8; 32] {
    fn from(s: Hash) -> Self {
        s.0
    }
}

impl Hash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Interprets a topic as an address by dropping the 12 bytes of left
    /// padding.
    pub fn to_address(self) -> Address {
        Address::from_slice(&self.0[12..])
    }
}

impl FromStr for Hash {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed(s).map(Hash)
    }
}

impl LowerHex for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }
        for i in &self.0[..] {
            write!(f, "{:02x}", i)?;
        }
        Ok(())
    }
}

impl Display for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self)
    }
}

/// "Receipt" of an executed transaction: details of its execution.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    #[serde(rename = "transactionHash")]
    pub transaction_hash: Hash,
    /// Contract address created, or `None` if not a deployment.
    #[serde(rename = "contractAddress", default)]
    pub contract_address: Option<Address>,
    /// Logs generated within this transaction.
    pub logs: Vec<Log>,
    /// Either 1 (success) or 0 (failure). Receipts from before Byzantium, and
    /// from some EVM chains, carry no status.
    #[serde(default, with = "serde_hex::quantity")]
    pub status: Option<u64>,
}

impl TransactionReceipt {
    pub fn is_reverted(&self) -> bool {
        self.status == Some(0)
    }
}

/// A log produced by a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    /// H160
    pub address: Address,
    /// Topics
    pub topics: Vec<Hash>,
    /// Data
    #[serde(with = "serde_hex")]
    pub data: Vec<u8>,
}

/// The EIP-155 signing domain of a chain.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(u64);

impl From<ChainId> for u64 {
    fn from(chain_id: ChainId) -> Self {
        chain_id.0
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        ChainId(id)
    }
}

impl Display for ChainId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
