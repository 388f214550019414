use crate::{
    ethereum::{wallet::Signer, Address, CallRequest, ChainId, Connector, U256},
    Error,
};
use anyhow::Context;
use htlc::transaction::{SignedTransaction, UnsignedTransaction};

/// Every transaction is sent with this limit; the estimate is only shown.
pub const GAS_LIMIT: u64 = 3_000_000;

/// Everything needed to sign a transaction except its payload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Auth {
    pub from: Address,
    pub nonce: U256,
    pub gas_price: U256,
    pub gas_limit: U256,
    pub value: U256,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeeEstimate {
    pub gas: U256,
    pub fee: U256,
    pub balance: U256,
}

pub async fn prepare<C>(connector: &C, from: Address, value: U256) -> Result<Auth, Error>
where
    C: Connector + ?Sized,
{
    let nonce = connector
        .transaction_count(from)
        .await
        .map_err(Error::Connection)?;
    let gas_price = connector.gas_price().await.map_err(Error::Connection)?;

    Ok(Auth {
        from,
        nonce,
        gas_price,
        gas_limit: U256::from(GAS_LIMIT),
        value,
    })
}

/// Estimates what the transaction described by `auth`, `data` and `to` will
/// cost. A revert during estimation is reported as a submission failure since
/// the same transaction would fail on-chain.
pub async fn estimate_fee<C>(
    connector: &C,
    operation: &str,
    auth: &Auth,
    data: &[u8],
    to: Option<Address>,
) -> Result<FeeEstimate, Error>
where
    C: Connector + ?Sized,
{
    let balance = connector
        .balance(auth.from)
        .await
        .map_err(Error::Connection)?;
    tracing::info!("from = {}, balance = {}", auth.from, balance);

    let gas = connector
        .estimate_gas(CallRequest {
            from: Some(auth.from),
            to,
            gas_price: Some(auth.gas_price),
            value: Some(auth.value),
            data: data.to_vec(),
        })
        .await
        .map_err(Error::submission)?;
    let fee = gas.saturating_mul(auth.gas_price);
    tracing::info!(
        "{} Contract fee = gas({}) * gasPrice({}) = {}",
        operation,
        gas,
        auth.gas_price,
        fee
    );

    Ok(FeeEstimate { gas, fee, balance })
}

/// Signs for `chain_id` and submits. A missing `to` creates a contract.
pub async fn sign_and_send<C>(
    connector: &C,
    signer: &Signer,
    chain_id: ChainId,
    auth: &Auth,
    data: Vec<u8>,
    to: Option<Address>,
) -> Result<SignedTransaction, Error>
where
    C: Connector + ?Sized,
{
    let transaction = UnsignedTransaction {
        nonce: auth.nonce,
        gas_price: auth.gas_price,
        gas_limit: auth.gas_limit,
        to,
        value: auth.value,
        data,
    };

    let signed = signer
        .sign(&transaction, chain_id)
        .context("failed to sign transaction")
        .map_err(Error::Submission)?;

    let hash = connector
        .send_raw_transaction(&signed)
        .await
        .map_err(Error::submission)?;
    if hash != signed.hash() {
        tracing::warn!(
            "node reported transaction hash {} but {} was signed",
            hash,
            signed.hash()
        );
    }
    tracing::info!("transaction hash = {}", signed.hash());

    Ok(signed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_harness::FakeChain;
    use spectral::prelude::*;
    use std::str::FromStr;

    const KEY: &str = "4646464646464646464646464646464646464646464646464646464646464646";

    fn signer() -> Signer {
        Signer::from_raw_key(
            KEY,
            Address::from_str("0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f").unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn prepare_uses_pending_nonce_and_static_gas_limit() {
        let chain = FakeChain::new(ChainId::from(110));
        let account = signer().account();
        chain.fund(account, U256::exp10(18));
        chain.set_nonce(account, U256::from(7));

        let auth = prepare(&chain, account, U256::from(1000)).await.unwrap();

        assert_that(&auth.nonce).is_equal_to(U256::from(7));
        assert_that(&auth.gas_limit).is_equal_to(U256::from(GAS_LIMIT));
        assert_that(&auth.gas_price).is_equal_to(chain.gas_price_now());
        assert_that(&auth.value).is_equal_to(U256::from(1000));
    }

    #[tokio::test]
    async fn fee_is_gas_times_price() {
        let chain = FakeChain::new(ChainId::from(110));
        let account = signer().account();
        chain.fund(account, U256::exp10(18));
        let auth = prepare(&chain, account, U256::zero()).await.unwrap();

        let estimate = estimate_fee(&chain, "Deploy", &auth, &[0x60, 0x80], None)
            .await
            .unwrap();

        assert_that(&estimate.fee).is_equal_to(estimate.gas * auth.gas_price);
        assert_that(&estimate.balance).is_equal_to(U256::exp10(18));
    }

    #[tokio::test]
    async fn sent_transaction_advances_the_nonce() {
        let chain = FakeChain::new(ChainId::from(110));
        let signer = signer();
        chain.fund(signer.account(), U256::exp10(18));
        let auth = prepare(&chain, signer.account(), U256::zero()).await.unwrap();

        let signed = sign_and_send(
            &chain,
            &signer,
            ChainId::from(110),
            &auth,
            vec![0x60, 0x80],
            None,
        )
        .await
        .unwrap();

        assert_that(&chain.receipt(signed.hash())).is_some();
        let next = prepare(&chain, signer.account(), U256::zero()).await.unwrap();
        assert_that(&next.nonce).is_equal_to(U256::one());
    }

    #[tokio::test]
    async fn transaction_for_another_chain_is_rejected() {
        let chain = FakeChain::new(ChainId::from(110));
        let signer = signer();
        chain.fund(signer.account(), U256::exp10(18));
        let auth = prepare(&chain, signer.account(), U256::zero()).await.unwrap();

        let result = sign_and_send(
            &chain,
            &signer,
            ChainId::from(111),
            &auth,
            vec![0x60, 0x80],
            None,
        )
        .await;

        assert!(matches!(result, Err(Error::Submission(_))));
    }
}
