//! Calldata encoding and result decoding for the HTLC contract.
//!
//! The contract exposes four methods and one event:
//!
//! - `newContract(address receiver, bytes32 hashlock, uint256 timelock)`
//!   (payable)
//! - `withdraw(bytes32 contractId, bytes32 preimage)`
//! - `refund(bytes32 contractId)`
//! - `getContract(bytes32 contractId)` returning `(address sender, address
//!   receiver, uint256 amount, bytes32 hashlock, uint256 timelock, bool
//!   withdrawn, bool refunded, bytes32 preimage)`
//! - `LogHTLCNew(bytes32 indexed contractId, address indexed sender, address
//!   indexed receiver, uint256 amount, bytes32 hashlock, uint256 timelock)`

use crate::{
    ethereum::{keccak256, Address, Hash, Log, TransactionReceipt, U256},
    ContractId, CreatedLeg, Secret, SecretHash, SwapLeg, Timestamp,
};
use clarity::{abi::Token, Uint256};

const WORD: usize = 32;

pub const LOG_HTLC_NEW: &str = "LogHTLCNew(bytes32,address,address,uint256,bytes32,uint256)";

#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
#[error("could not construct clarity::Address from {0}")]
pub struct EncodeError(Address);

#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("transaction reverted, receipt has no logs")]
    Reverted,
    #[error("receipt has no logs")]
    NoLogs,
    #[error("receipt contains no LogHTLCNew event")]
    NoCreationEvent,
    #[error("expected {expected} topics but log has {got}")]
    Topics { expected: usize, got: usize },
    #[error("expected {expected} bytes of data but got {got}")]
    Length { expected: usize, got: usize },
    #[error("call returned no data")]
    EmptyOutput,
    #[error("word {index} is not a valid bool")]
    Bool { index: usize },
}

/// A call to one of the HTLC contract's methods.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Call {
    NewContract {
        receiver: Address,
        hashlock: SecretHash,
        timelock: Timestamp,
    },
    Withdraw {
        contract_id: ContractId,
        preimage: Secret,
    },
    Refund {
        contract_id: ContractId,
    },
    GetContract {
        contract_id: ContractId,
    },
}

impl Call {
    pub fn signature(&self) -> &'static str {
        match self {
            Call::NewContract { .. } => "newContract(address,bytes32,uint256)",
            Call::Withdraw { .. } => "withdraw(bytes32,bytes32)",
            Call::Refund { .. } => "refund(bytes32)",
            Call::GetContract { .. } => "getContract(bytes32)",
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let tokens = match self {
            Call::NewContract {
                receiver,
                hashlock,
                timelock,
            } => vec![
                Token::Address(to_clarity_address(*receiver)?),
                Token::Bytes(hashlock.as_raw().to_vec()),
                Token::Uint(Uint256::from(timelock.as_secs())),
            ],
            Call::Withdraw {
                contract_id,
                preimage,
            } => vec![
                Token::Bytes(contract_id.as_bytes().to_vec()),
                Token::Bytes(preimage.as_raw_secret().to_vec()),
            ],
            Call::Refund { contract_id } | Call::GetContract { contract_id } => {
                vec![Token::Bytes(contract_id.as_bytes().to_vec())]
            }
        };

        Ok(clarity::abi::encode_call(self.signature(), &tokens))
    }
}

fn to_clarity_address(address: Address) -> Result<clarity::Address, EncodeError> {
    clarity::Address::from_slice(address.as_bytes()).map_err(|_| EncodeError(address))
}

pub fn creation_event_topic() -> Hash {
    Hash::from(keccak256(LOG_HTLC_NEW.as_bytes()))
}

/// Finds the first `LogHTLCNew` event of a receipt and decodes it.
pub fn find_creation_event(receipt: &TransactionReceipt) -> Result<CreatedLeg, DecodeError> {
    if receipt.logs.is_empty() {
        return Err(if receipt.is_reverted() {
            DecodeError::Reverted
        } else {
            DecodeError::NoLogs
        });
    }

    let topic = creation_event_topic();

    receipt
        .logs
        .iter()
        .find(|log| log.topics.first() == Some(&topic))
        .ok_or(DecodeError::NoCreationEvent)
        .and_then(decode_creation_event)
}

/// The indexed fields live in topics 1 to 3, the rest in three data words.
pub fn decode_creation_event(log: &Log) -> Result<CreatedLeg, DecodeError> {
    if log.topics.len() != 4 {
        return Err(DecodeError::Topics {
            expected: 4,
            got: log.topics.len(),
        });
    }

    let words = words(&log.data, 3)?;

    Ok(CreatedLeg {
        contract_id: ContractId::from(log.topics[1]),
        sender: log.topics[2].to_address(),
        receiver: log.topics[3].to_address(),
        amount: U256::from_big_endian(words[0]),
        hashlock: SecretHash::from(fixed(words[1])),
        timelock: Timestamp::from(U256::from_big_endian(words[2])),
    })
}

/// Decodes the tuple returned by `getContract`. The id is not part of the
/// output and is carried over from the query.
pub fn decode_get_contract(contract_id: ContractId, output: &[u8]) -> Result<SwapLeg, DecodeError> {
    if output.is_empty() {
        return Err(DecodeError::EmptyOutput);
    }

    let words = words(output, 8)?;

    Ok(SwapLeg {
        contract_id,
        sender: Address::from_slice(&words[0][12..]),
        receiver: Address::from_slice(&words[1][12..]),
        amount: U256::from_big_endian(words[2]),
        hashlock: SecretHash::from(fixed(words[3])),
        timelock: Timestamp::from(U256::from_big_endian(words[4])),
        withdrawn: bool_word(words[5], 5)?,
        refunded: bool_word(words[6], 6)?,
        preimage: Secret::from(fixed(words[7])),
    })
}

/// Encodes the tuple `getContract` returns.
pub fn encode_get_contract_output(leg: &SwapLeg) -> Vec<u8> {
    [
        address_word(&leg.sender),
        address_word(&leg.receiver),
        uint_word(leg.amount),
        *leg.hashlock.as_raw(),
        uint_word(U256::from(leg.timelock)),
        uint_word(U256::from(leg.withdrawn as u8)),
        uint_word(U256::from(leg.refunded as u8)),
        *leg.preimage.as_raw_secret(),
    ]
    .concat()
}

/// Builds the log the contract emits for a new leg.
pub fn encode_creation_event(contract: Address, leg: &CreatedLeg) -> Log {
    Log {
        address: contract,
        topics: vec![
            creation_event_topic(),
            Hash::from(*leg.contract_id.as_bytes()),
            Hash::from(leg.sender),
            Hash::from(leg.receiver),
        ],
        data: [
            uint_word(leg.amount),
            *leg.hashlock.as_raw(),
            uint_word(U256::from(leg.timelock)),
        ]
        .concat(),
    }
}

fn words(data: &[u8], count: usize) -> Result<Vec<&[u8]>, DecodeError> {
    if data.len() < count * WORD {
        return Err(DecodeError::Length {
            expected: count * WORD,
            got: data.len(),
        });
    }

    Ok(data.chunks(WORD).take(count).collect())
}

fn fixed(word: &[u8]) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(word);
    bytes
}

fn bool_word(word: &[u8], index: usize) -> Result<bool, DecodeError> {
    match U256::from_big_endian(word) {
        value if value.is_zero() => Ok(false),
        value if value == U256::one() => Ok(true),
        _ => Err(DecodeError::Bool { index }),
    }
}

fn address_word(address: &Address) -> [u8; 32] {
    Hash::from(*address).into()
}

fn uint_word(value: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}
