//! One side of a swap as recorded by the HTLC contract on a single chain.

use crate::{
    ethereum::{decode_fixed, Address, Hash, ParseError, U256},
    Secret, SecretHash, Timestamp,
};
use std::{fmt, str::FromStr};

/// Identifier the contract assigns to a leg when it is created. It can only
/// be learned from the creation event, never computed locally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ContractId([u8; 32]);

impl ContractId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for ContractId {
    fn from(bytes: [u8; 32]) -> Self {
        ContractId(bytes)
    }
}

impl From<Hash> for ContractId {
    fn from(hash: Hash) -> Self {
        ContractId(hash.into())
    }
}

impl FromStr for ContractId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed(s).map(ContractId)
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Decoded `LogHTLCNew` event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CreatedLeg {
    pub contract_id: ContractId,
    pub sender: Address,
    pub receiver: Address,
    pub amount: U256,
    pub hashlock: SecretHash,
    pub timelock: Timestamp,
}

impl fmt::Display for CreatedLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ContractId = {}", self.contract_id)?;
        writeln!(f, "Sender     = {}", self.sender)?;
        writeln!(f, "Receiver   = {}", self.receiver)?;
        writeln!(f, "Amount     = {} (wei)", self.amount)?;
        writeln!(f, "TimeLock   = {}", self.timelock)?;
        write!(f, "SecretHash = {}", self.hashlock)
    }
}

/// Full on-chain state of a leg, as returned by `getContract`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwapLeg {
    pub contract_id: ContractId,
    pub sender: Address,
    pub receiver: Address,
    pub amount: U256,
    pub hashlock: SecretHash,
    pub timelock: Timestamp,
    pub withdrawn: bool,
    pub refunded: bool,
    /// All zero until the receiver redeemed.
    pub preimage: Secret,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LegState {
    /// The contract knows no leg with this id and answers with zero values.
    Empty,
    Locked,
    Withdrawn(Secret),
    Refunded,
}

impl SwapLeg {
    pub fn state(&self) -> LegState {
        if self.withdrawn {
            LegState::Withdrawn(self.preimage)
        } else if self.refunded {
            LegState::Refunded
        } else if self.sender.is_zero() {
            LegState::Empty
        } else {
            LegState::Locked
        }
    }

    pub fn revealed_secret(&self) -> Option<Secret> {
        match self.state() {
            LegState::Withdrawn(secret) => Some(secret),
            _ => None,
        }
    }
}

impl fmt::Display for SwapLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sender     = {}", self.sender)?;
        writeln!(f, "Receiver   = {}", self.receiver)?;
        writeln!(f, "Amount     = {} (wei)", self.amount)?;
        writeln!(f, "TimeLock   = {}", self.timelock)?;
        writeln!(f, "SecretHash = {}", self.hashlock)?;
        writeln!(f, "Withdrawn  = {}", self.withdrawn)?;
        writeln!(f, "Refunded   = {}", self.refunded)?;
        write!(f, "Secret     = {}", self.preimage)
    }
}
