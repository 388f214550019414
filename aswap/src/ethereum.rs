pub mod geth;
pub mod transactor;
pub mod wallet;

pub use htlc::ethereum::{Address, ChainId, Hash, Log, TransactionReceipt, U256};

use anyhow::Result;
use async_trait::async_trait;
use htlc::transaction::SignedTransaction;
use serde::{Serialize, Serializer};

/// The subset of a node's RPC interface the swap driver relies on.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn chain_id(&self) -> Result<ChainId>;

    /// Nonce for the next transaction of `account`, counting pending ones.
    async fn transaction_count(&self, account: Address) -> Result<U256>;

    async fn gas_price(&self) -> Result<U256>;

    async fn estimate_gas(&self, request: CallRequest) -> Result<U256>;

    async fn balance(&self, account: Address) -> Result<U256>;

    async fn send_raw_transaction(&self, transaction: &SignedTransaction) -> Result<Hash>;

    async fn transaction_receipt(&self, transaction_hash: Hash)
        -> Result<Option<TransactionReceipt>>;

    /// Read-only execution against the latest block.
    async fn call(&self, request: CallRequest) -> Result<Vec<u8>>;

    async fn code_at(&self, address: Address) -> Result<Vec<u8>>;
}

/// Parameters of `eth_call` and `eth_estimateGas`. A missing `to` means
/// contract creation.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_data"
    )]
    pub data: Vec<u8>,
}

fn serialize_data<S>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("0x{}", hex::encode(data)))
}
