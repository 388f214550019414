use crate::{
    ethereum::{Address, CallRequest, ChainId, Connector, Hash, TransactionReceipt, U256},
    jsonrpc,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use htlc::transaction::SignedTransaction;

#[derive(Debug, Clone)]
pub struct Client {
    rpc_client: jsonrpc::Client,
}

impl Client {
    pub fn new(url: url::Url) -> Self {
        Client {
            rpc_client: jsonrpc::Client::new(url),
        }
    }
}

#[async_trait]
impl Connector for Client {
    async fn chain_id(&self) -> Result<ChainId> {
        let chain_id: U256 = self
            .rpc_client
            .send::<Vec<()>, _>(jsonrpc::Request::new("eth_chainId", vec![]))
            .await
            .context("failed to fetch chain id")?;

        Ok(ChainId::from(chain_id.low_u64()))
    }

    async fn transaction_count(&self, account: Address) -> Result<U256> {
        let count = self
            .rpc_client
            .send(jsonrpc::Request::new("eth_getTransactionCount", vec![
                jsonrpc::serialize(account)?,
                jsonrpc::serialize("pending")?,
            ]))
            .await
            .context("failed to get transaction count")?;

        Ok(count)
    }

    async fn gas_price(&self) -> Result<U256> {
        let gas_price = self
            .rpc_client
            .send::<Vec<()>, _>(jsonrpc::Request::new("eth_gasPrice", vec![]))
            .await
            .context("failed to get gas price")?;

        Ok(gas_price)
    }

    async fn estimate_gas(&self, request: CallRequest) -> Result<U256> {
        let gas = self
            .rpc_client
            .send(jsonrpc::Request::new("eth_estimateGas", vec![
                jsonrpc::serialize(request)?,
            ]))
            .await
            .context("failed to estimate gas")?;

        Ok(gas)
    }

    async fn balance(&self, account: Address) -> Result<U256> {
        let balance = self
            .rpc_client
            .send(jsonrpc::Request::new("eth_getBalance", vec![
                jsonrpc::serialize(account)?,
                jsonrpc::serialize("latest")?,
            ]))
            .await
            .with_context(|| format!("failed to get balance of {}", account))?;

        Ok(balance)
    }

    async fn send_raw_transaction(&self, transaction: &SignedTransaction) -> Result<Hash> {
        let tx_hash = self
            .rpc_client
            .send(jsonrpc::Request::new("eth_sendRawTransaction", vec![
                transaction.to_hex(),
            ]))
            .await
            .context("failed to send raw transaction")?;

        Ok(tx_hash)
    }

    async fn transaction_receipt(
        &self,
        transaction_hash: Hash,
    ) -> Result<Option<TransactionReceipt>> {
        let receipt = self
            .rpc_client
            .send(jsonrpc::Request::new("eth_getTransactionReceipt", vec![
                jsonrpc::serialize(transaction_hash)?,
            ]))
            .await
            .with_context(|| format!("failed to get receipt of {}", transaction_hash))?;

        Ok(receipt)
    }

    async fn call(&self, request: CallRequest) -> Result<Vec<u8>> {
        let output: String = self
            .rpc_client
            .send(jsonrpc::Request::new("eth_call", vec![
                jsonrpc::serialize(request)?,
                jsonrpc::serialize("latest")?,
            ]))
            .await
            .context("failed to call contract")?;

        decode_data(&output)
    }

    async fn code_at(&self, address: Address) -> Result<Vec<u8>> {
        let code: String = self
            .rpc_client
            .send(jsonrpc::Request::new("eth_getCode", vec![
                jsonrpc::serialize(address)?,
                jsonrpc::serialize("latest")?,
            ]))
            .await
            .with_context(|| format!("failed to get code at {}", address))?;

        decode_data(&code)
    }
}

fn decode_data(data: &str) -> Result<Vec<u8>> {
    let bytes = hex::decode(data.strip_prefix("0x").unwrap_or(data))
        .with_context(|| format!("node returned malformed data {}", data))?;

    Ok(bytes)
}
