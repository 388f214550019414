//! Legacy Ethereum transactions signed with EIP-155 replay protection.

use crate::ethereum::{keccak256, Address, ChainId, Hash, U256};
use conquer_once::Lazy;
use rlp::{Rlp, RlpStream};
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    All, Message, PublicKey, Secp256k1, SecretKey,
};

static SECP: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// The account `key` signs for.
pub fn account_of(key: &SecretKey) -> Address {
    Address::from_public_key(&PublicKey::from_secret_key(&*SECP, key))
}

/// Offset added to the recovery id, see EIP-155.
const REPLAY_PROTECTION_OFFSET: u64 = 35;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("secp256k1 failure")]
    Crypto(#[from] secp256k1::Error),
    #[error("malformed RLP")]
    Rlp(#[from] rlp::DecoderError),
    #[error("expected a list of 9 items but got {0}")]
    ItemCount(usize),
    #[error("transaction is not replay protected (v = {0})")]
    NotReplayProtected(u64),
    #[error("recipient must be 20 bytes but got {0}")]
    Recipient(usize),
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnsignedTransaction {
    pub nonce: U256,
    pub gas_price: U256,
    pub gas_limit: U256,
    /// `None` creates a contract from `data`.
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SignedTransaction {
    raw: Vec<u8>,
    hash: Hash,
}

impl SignedTransaction {
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The transaction hash nodes will report for this transaction.
    pub fn hash(&self) -> Hash {
        self.hash
    }

    /// `0x`-prefixed hex as `eth_sendRawTransaction` expects it.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.raw))
    }
}

impl UnsignedTransaction {
    fn rlp_append_fields(&self, s: &mut RlpStream) {
        s.append(&self.nonce);
        s.append(&self.gas_price);
        s.append(&self.gas_limit);

        match self.to {
            Some(ref address) => s.append(&address.as_bytes().to_vec()),
            None => s.append_empty_data(),
        };

        s.append(&self.value);
        s.append(&self.data);
    }

    pub fn signing_hash(&self, chain_id: ChainId) -> [u8; 32] {
        let mut stream = RlpStream::new_list(9);

        self.rlp_append_fields(&mut stream);
        stream.append(&u64::from(chain_id));
        stream.append(&0u8);
        stream.append(&0u8);

        keccak256(&stream.out())
    }

    pub fn sign(&self, key: &SecretKey, chain_id: ChainId) -> Result<SignedTransaction, Error> {
        let message = Message::from_slice(&self.signing_hash(chain_id))?;
        let signature = SECP.sign_ecdsa_recoverable(&message, key);
        let (recovery_id, data) = signature.serialize_compact();

        // recovery ids are 0 or 1
        #[allow(clippy::cast_sign_loss)]
        let v = recovery_id.to_i32() as u64
            + REPLAY_PROTECTION_OFFSET
            + u64::from(chain_id) * 2;
        let r = U256::from_big_endian(&data[0..32]);
        let s = U256::from_big_endian(&data[32..64]);

        let mut stream = RlpStream::new_list(9);
        self.rlp_append_fields(&mut stream);
        stream.append(&v);
        stream.append(&r);
        stream.append(&s);

        let raw = stream.out().to_vec();
        let hash = Hash::from(keccak256(&raw));

        Ok(SignedTransaction { raw, hash })
    }
}

/// A transaction as decoded from its signed raw form.
#[derive(Clone, Debug, PartialEq)]
pub struct RecoveredTransaction {
    pub transaction: UnsignedTransaction,
    pub chain_id: ChainId,
    pub from: Address,
    pub hash: Hash,
}

/// Decodes a signed raw transaction and recovers the address that signed it.
pub fn recover(raw: &[u8]) -> Result<RecoveredTransaction, Error> {
    let rlp = Rlp::new(raw);
    let item_count = rlp.item_count()?;
    if item_count != 9 {
        return Err(Error::ItemCount(item_count));
    }

    let to: Vec<u8> = rlp.val_at(3)?;
    let to = match to.len() {
        0 => None,
        20 => Some(Address::from_slice(&to)),
        len => return Err(Error::Recipient(len)),
    };

    let transaction = UnsignedTransaction {
        nonce: rlp.val_at(0)?,
        gas_price: rlp.val_at(1)?,
        gas_limit: rlp.val_at(2)?,
        to,
        value: rlp.val_at(4)?,
        data: rlp.val_at(5)?,
    };

    let v: u64 = rlp.val_at(6)?;
    let r: U256 = rlp.val_at(7)?;
    let s: U256 = rlp.val_at(8)?;

    if v < REPLAY_PROTECTION_OFFSET {
        return Err(Error::NotReplayProtected(v));
    }
    let chain_id = ChainId::from((v - REPLAY_PROTECTION_OFFSET) / 2);
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let recovery_id = RecoveryId::from_i32(((v - REPLAY_PROTECTION_OFFSET) % 2) as i32)?;

    let mut compact = [0u8; 64];
    r.to_big_endian(&mut compact[0..32]);
    s.to_big_endian(&mut compact[32..64]);
    let signature = RecoverableSignature::from_compact(&compact, recovery_id)?;

    let message = Message::from_slice(&transaction.signing_hash(chain_id))?;
    let public_key = SECP.recover_ecdsa(&message, &signature)?;

    Ok(RecoveredTransaction {
        transaction,
        chain_id,
        from: Address::from_public_key(&public_key),
        hash: Hash::from(keccak256(raw)),
    })
}

/// Address of a contract created by `sender` with the given account nonce.
pub fn contract_address(sender: Address, nonce: U256) -> Address {
    let mut stream = RlpStream::new_list(2);
    stream.append(&sender.as_bytes().to_vec());
    stream.append(&nonce);

    let hash = keccak256(&stream.out());

    Address::from_slice(&hash[12..])
}
