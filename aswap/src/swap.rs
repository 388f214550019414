//! The five on-chain operations of an HTLC swap, from the point of view of
//! one party on one chain.

use crate::{
    chain::ChainEndpoint,
    config::validation::validate_address,
    confirm::{Action, Confirm},
    ethereum::{
        transactor::{self, Auth, FeeEstimate},
        wallet::{AuthError, Signer},
        Address, CallRequest, Connector, Hash, U256,
    },
    Error,
};
use anyhow::{anyhow, Context};
use htlc::{
    abi::{self, Call, DecodeError},
    transaction, ContractId, CreatedLeg, Secret, SecretHash, SwapLeg, Timestamp,
};

/// Context of a single command: one chain, one contract and optionally the
/// account that signs.
#[derive(Debug)]
pub struct Session<'c, C: ?Sized, P> {
    connector: &'c C,
    confirm: P,
    endpoint: ChainEndpoint,
    signer: Option<Signer>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Deployed {
    pub address: Address,
    pub transaction: Hash,
}

impl<'c, C, P> Session<'c, C, P>
where
    C: Connector + ?Sized,
    P: Confirm,
{
    pub fn new(
        connector: &'c C,
        confirm: P,
        endpoint: ChainEndpoint,
        signer: Option<Signer>,
    ) -> Self {
        Session {
            connector,
            confirm,
            endpoint,
            signer,
        }
    }

    pub fn endpoint(&self) -> &ChainEndpoint {
        &self.endpoint
    }

    /// Deploys the HTLC contract and hands its address to `persist` before
    /// returning.
    pub async fn deploy_contract<F>(&self, bytecode: Vec<u8>, persist: F) -> Result<Deployed, Error>
    where
        F: FnOnce(Address) -> anyhow::Result<()>,
    {
        if bytecode.is_empty() {
            return Err(Error::validation("contract bytecode is empty"));
        }
        let signer = self.signer()?;

        let auth = transactor::prepare(self.connector, signer.account(), U256::zero()).await?;
        tracing::info!("Deploy contract...");
        let estimate =
            transactor::estimate_fee(self.connector, "Deploy", &auth, &bytecode, None).await?;
        warn_if_underfunded(&estimate, U256::zero());
        self.confirm(Action::Deploy)?;

        let signed = transactor::sign_and_send(
            self.connector,
            signer,
            self.endpoint.chain_id,
            &auth,
            bytecode,
            None,
        )
        .await?;

        let address = transaction::contract_address(auth.from, auth.nonce);
        let hash = signed.hash();
        tracing::info!("contract address = {}", address);
        persist(address)
            .with_context(|| {
                format!(
                    "contract {} was deployed in transaction {} but could not be saved",
                    address, hash
                )
            })
            .map_err(Error::Config)?;

        Ok(Deployed {
            address,
            transaction: hash,
        })
    }

    /// Locks `amount` wei for `participant` under `hashlock` until `timelock`.
    /// Both the initiator and the participant lock their leg this way.
    pub async fn new_contract(
        &self,
        participant: &str,
        amount: U256,
        hashlock: SecretHash,
        timelock: Timestamp,
    ) -> Result<Hash, Error> {
        let receiver = validate_address(participant)?;
        if amount.is_zero() {
            return Err(Error::validation("amount must be greater than zero"));
        }

        self.send_call("NewContract", amount, Call::NewContract {
            receiver,
            hashlock,
            timelock,
        })
        .await
    }

    /// Reads the leg created by the `newContract` transaction `transaction`.
    pub async fn get_contract_id(&self, transaction: Hash) -> Result<CreatedLeg, Error> {
        let receipt = self
            .connector
            .transaction_receipt(transaction)
            .await
            .map_err(Error::Connection)?
            .ok_or_else(|| Error::Encoding(anyhow!("no receipt for transaction {}", transaction)))?;

        abi::find_creation_event(&receipt).map_err(|e| Error::Encoding(e.into()))
    }

    pub async fn audit_contract(&self, contract_id: ContractId) -> Result<SwapLeg, Error> {
        let contract = self.endpoint.contract_address()?;
        let data = encode(Call::GetContract { contract_id })?;

        let output = self
            .connector
            .call(CallRequest {
                to: Some(contract),
                data,
                ..CallRequest::default()
            })
            .await
            .map_err(Error::submission)?;

        if output.is_empty() {
            let code = self
                .connector
                .code_at(contract)
                .await
                .map_err(Error::Connection)?;
            if code.is_empty() {
                return Err(Error::Encoding(anyhow!("no contract code at given address")));
            }

            return Err(Error::Encoding(DecodeError::EmptyOutput.into()));
        }

        abi::decode_get_contract(contract_id, &output).map_err(|e| Error::Encoding(e.into()))
    }

    /// The secret is not checked against the leg; the contract rejects a
    /// wrong one.
    pub async fn redeem(&self, contract_id: ContractId, secret: Secret) -> Result<Hash, Error> {
        self.send_call("Withdraw", U256::zero(), Call::Withdraw {
            contract_id,
            preimage: secret,
        })
        .await
    }

    pub async fn refund(&self, contract_id: ContractId) -> Result<Hash, Error> {
        self.send_call("Refund", U256::zero(), Call::Refund { contract_id })
            .await
    }

    async fn send_call(&self, operation: &str, value: U256, call: Call) -> Result<Hash, Error> {
        let contract = self.endpoint.contract_address()?;
        let signer = self.signer()?;
        let data = encode(call)?;

        let auth: Auth = transactor::prepare(self.connector, signer.account(), value).await?;
        tracing::info!("Call {} ...", operation);
        let estimate =
            transactor::estimate_fee(self.connector, operation, &auth, &data, Some(contract))
                .await?;
        warn_if_underfunded(&estimate, value);
        self.confirm(Action::Call)?;

        let signed = transactor::sign_and_send(
            self.connector,
            signer,
            self.endpoint.chain_id,
            &auth,
            data,
            Some(contract),
        )
        .await?;

        Ok(signed.hash())
    }

    fn signer(&self) -> Result<&Signer, Error> {
        self.signer.as_ref().ok_or(Error::Auth(AuthError::NoAccount))
    }

    fn confirm(&self, action: Action) -> Result<(), Error> {
        if self
            .confirm
            .confirm(action, &self.endpoint.name, self.endpoint.chain_id)
        {
            Ok(())
        } else {
            Err(Error::Declined)
        }
    }
}

fn encode(call: Call) -> Result<Vec<u8>, Error> {
    call.encode().map_err(|e| Error::Encoding(e.into()))
}

/// The node has the final say; this only tells the user early.
fn warn_if_underfunded(estimate: &FeeEstimate, value: U256) {
    let required = estimate.fee.saturating_add(value);
    if estimate.balance < required {
        tracing::warn!(
            "balance {} is below fee plus value {}, the transaction is likely to fail",
            estimate.balance,
            required
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        confirm::AutoConfirm,
        ethereum::ChainId,
        test_harness::FakeChain,
    };
    use htlc::{export::secp256k1, LegState, SecretHashPair};
    use spectral::prelude::*;
    use std::{cell::Cell, str::FromStr};

    const ALICE: &str = "4646464646464646464646464646464646464646464646464646464646464646";
    const BOB: &str = "0101010101010101010101010101010101010101010101010101010101010101";
    const BYTECODE: &[u8] = &[0x60, 0x80, 0x60, 0x40, 0x52];

    #[derive(Clone, Copy, Debug)]
    struct Decline;

    impl Confirm for Decline {
        fn confirm(&self, _: Action, _: &str, _: ChainId) -> bool {
            false
        }
    }

    fn account_of(key: &str) -> Address {
        transaction::account_of(&secp256k1::SecretKey::from_str(key).unwrap())
    }

    fn signer(key: &str) -> Signer {
        Signer::from_raw_key(key, account_of(key)).unwrap()
    }

    fn endpoint(chain_id: u64, contract: Address) -> ChainEndpoint {
        ChainEndpoint {
            chain_id: ChainId::from(chain_id),
            name: format!("chain{}", chain_id),
            url: "http://127.0.0.1:7545".parse().unwrap(),
            contract: contract.to_string(),
        }
    }

    fn funded_chain(chain_id: u64) -> FakeChain {
        let chain = FakeChain::new(ChainId::from(chain_id));
        chain.fund(account_of(ALICE), U256::exp10(18));
        chain.fund(account_of(BOB), U256::exp10(18));
        chain
    }

    async fn deploy(chain: &FakeChain, chain_id: u64, key: &str) -> Address {
        let session = Session::new(
            chain,
            AutoConfirm,
            endpoint(chain_id, Address::ZERO),
            Some(signer(key)),
        );

        session
            .deploy_contract(BYTECODE.to_vec(), |_| Ok(()))
            .await
            .unwrap()
            .address
    }

    #[tokio::test]
    async fn deploy_persists_the_derived_address() {
        let chain = funded_chain(110);
        let session = Session::new(
            &chain,
            AutoConfirm,
            endpoint(110, Address::ZERO),
            Some(signer(ALICE)),
        );
        let persisted = Cell::new(None);

        let deployed = session
            .deploy_contract(BYTECODE.to_vec(), |address| {
                persisted.set(Some(address));
                Ok(())
            })
            .await
            .unwrap();

        assert_that(&persisted.get()).is_equal_to(Some(deployed.address));
        assert_that(&deployed.address).is_equal_to(transaction::contract_address(
            account_of(ALICE),
            U256::zero(),
        ));
        let receipt = chain.receipt(deployed.transaction).unwrap();
        assert_that(&receipt.contract_address).is_equal_to(Some(deployed.address));
        assert!(chain.has_code(deployed.address));
    }

    #[tokio::test]
    async fn failing_to_persist_is_a_config_error() {
        let chain = funded_chain(110);
        let session = Session::new(
            &chain,
            AutoConfirm,
            endpoint(110, Address::ZERO),
            Some(signer(ALICE)),
        );

        let result = session
            .deploy_contract(BYTECODE.to_vec(), |_| Err(anyhow!("read-only file system")))
            .await;

        let address = transaction::contract_address(account_of(ALICE), U256::zero());
        let sent = chain.transaction_hashes();
        assert_that(&sent).has_length(1);
        match result {
            Err(Error::Config(e)) => {
                let message = format!("{:#}", e);
                assert_that(&message).contains(address.to_string().as_str());
                assert_that(&message).contains(sent[0].to_string().as_str());
                assert_that(&message).contains("read-only file system");
            }
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn declined_deploy_sends_nothing() {
        let chain = funded_chain(110);
        let session = Session::new(
            &chain,
            Decline,
            endpoint(110, Address::ZERO),
            Some(signer(ALICE)),
        );

        let result = session
            .deploy_contract(BYTECODE.to_vec(), |_| unreachable!())
            .await;

        assert!(matches!(result, Err(Error::Declined)));
        assert_that(&chain.transaction_count_total()).is_equal_to(0);
    }

    #[tokio::test]
    async fn invalid_participant_is_rejected_before_signing() {
        let chain = funded_chain(110);
        let contract = deploy(&chain, 110, ALICE).await;
        let session = Session::new(
            &chain,
            AutoConfirm,
            endpoint(110, contract),
            Some(signer(ALICE)),
        );

        let result = session
            .new_contract(
                "0x1234",
                U256::from(1000),
                SecretHash::from([1u8; 32]),
                Timestamp::initiator_timelock(Timestamp::now()),
            )
            .await;

        assert!(matches!(result, Err(Error::Validation(_))));
        assert_that(&chain.transaction_count_total()).is_equal_to(1);
    }

    #[tokio::test]
    async fn new_contract_requires_an_account() {
        let chain = funded_chain(110);
        let contract = deploy(&chain, 110, ALICE).await;
        let session = Session::new(&chain, AutoConfirm, endpoint(110, contract), None);

        let result = session
            .new_contract(
                &account_of(BOB).to_string(),
                U256::from(1000),
                SecretHash::from([1u8; 32]),
                Timestamp::initiator_timelock(Timestamp::now()),
            )
            .await;

        assert!(matches!(result, Err(Error::Auth(AuthError::NoAccount))));
    }

    #[tokio::test]
    async fn audit_of_unknown_id_is_empty() {
        let chain = funded_chain(110);
        let contract = deploy(&chain, 110, ALICE).await;
        let session = Session::new(&chain, AutoConfirm, endpoint(110, contract), None);

        let leg = session
            .audit_contract(ContractId::from([7u8; 32]))
            .await
            .unwrap();

        assert_that(&leg.state()).is_equal_to(LegState::Empty);
        assert_that(&leg.sender).is_equal_to(Address::ZERO);
        assert_that(&leg.receiver).is_equal_to(Address::ZERO);
        assert_that(&leg.amount).is_equal_to(U256::zero());
        assert_that(&leg.withdrawn).is_false();
        assert_that(&leg.refunded).is_false();
    }

    #[tokio::test]
    async fn audit_without_contract_code_is_an_encoding_error() {
        let chain = funded_chain(110);
        let session = Session::new(
            &chain,
            AutoConfirm,
            endpoint(110, Address::from([0x42u8; 20])),
            None,
        );

        let result = session.audit_contract(ContractId::from([7u8; 32])).await;

        match result {
            Err(Error::Encoding(e)) => {
                assert_that(&e.to_string()).is_equal_to("no contract code at given address".to_owned())
            }
            other => panic!("expected encoding error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_transaction_has_no_contract_id() {
        let chain = funded_chain(110);
        let session = Session::new(&chain, AutoConfirm, endpoint(110, Address::ZERO), None);

        let result = session.get_contract_id(Hash::from([9u8; 32])).await;

        assert!(matches!(result, Err(Error::Encoding(_))));
    }

    #[tokio::test]
    async fn redeem_with_wrong_secret_is_rejected() {
        let chain = funded_chain(110);
        let contract = deploy(&chain, 110, ALICE).await;
        let pair = SecretHashPair::generate().unwrap();
        let alice = Session::new(
            &chain,
            AutoConfirm,
            endpoint(110, contract),
            Some(signer(ALICE)),
        );
        let tx = alice
            .new_contract(
                &account_of(BOB).to_string(),
                U256::from(1000),
                pair.hash,
                Timestamp::initiator_timelock(Timestamp::now()),
            )
            .await
            .unwrap();
        let created = alice.get_contract_id(tx).await.unwrap();
        let sent = chain.transaction_count_total();

        let bob = Session::new(
            &chain,
            AutoConfirm,
            endpoint(110, contract),
            Some(signer(BOB)),
        );
        let result = bob
            .redeem(created.contract_id, Secret::from([0xffu8; 32]))
            .await;

        assert!(matches!(result, Err(Error::Submission(_))));
        assert_that(&chain.transaction_count_total()).is_equal_to(sent);

        let leg = bob.audit_contract(created.contract_id).await.unwrap();
        assert_that(&leg.state()).is_equal_to(LegState::Locked);
        assert_that(&leg.withdrawn).is_false();
        assert_that(&leg.refunded).is_false();
        assert_that(&leg.preimage).is_equal_to(Secret::from([0u8; 32]));
    }

    #[tokio::test]
    async fn refund_is_only_possible_after_the_timelock() {
        let chain = funded_chain(110);
        let contract = deploy(&chain, 110, ALICE).await;
        let now = Timestamp::now();
        chain.set_time(now);
        let alice = Session::new(
            &chain,
            AutoConfirm,
            endpoint(110, contract),
            Some(signer(ALICE)),
        );
        let timelock = Timestamp::initiator_timelock(now);
        let tx = alice
            .new_contract(
                &account_of(BOB).to_string(),
                U256::from(1000),
                SecretHash::from([1u8; 32]),
                timelock,
            )
            .await
            .unwrap();
        let created = alice.get_contract_id(tx).await.unwrap();

        let early = alice.refund(created.contract_id).await;
        assert!(matches!(early, Err(Error::Submission(_))));

        chain.set_time(timelock.plus(1));
        alice.refund(created.contract_id).await.unwrap();

        let leg = alice.audit_contract(created.contract_id).await.unwrap();
        assert_that(&leg.state()).is_equal_to(LegState::Refunded);
    }

    #[tokio::test]
    async fn full_swap_reveals_the_secret_to_the_participant() {
        let chain_a = funded_chain(110);
        let chain_b = funded_chain(111);
        let contract_a = deploy(&chain_a, 110, ALICE).await;
        let contract_b = deploy(&chain_b, 111, BOB).await;
        let now = Timestamp::now();

        // Alice initiates on chain A.
        let pair = SecretHashPair::generate().unwrap();
        let alice_a = Session::new(
            &chain_a,
            AutoConfirm,
            endpoint(110, contract_a),
            Some(signer(ALICE)),
        );
        let tx = alice_a
            .new_contract(
                &account_of(BOB).to_string(),
                U256::from(1000),
                pair.hash,
                Timestamp::initiator_timelock(now),
            )
            .await
            .unwrap();
        let leg_a = alice_a.get_contract_id(tx).await.unwrap();
        assert_that(&leg_a.sender).is_equal_to(account_of(ALICE));
        assert_that(&leg_a.receiver).is_equal_to(account_of(BOB));

        // Bob audits it and participates on chain B with half the window.
        let bob_a = Session::new(&chain_a, AutoConfirm, endpoint(110, contract_a), None);
        let audited = bob_a.audit_contract(leg_a.contract_id).await.unwrap();
        assert_that(&audited.state()).is_equal_to(LegState::Locked);
        assert_that(&audited.hashlock).is_equal_to(pair.hash);

        let participant_timelock =
            Timestamp::participant_timelock(now, audited.timelock).unwrap();
        assert!(participant_timelock < audited.timelock);
        let bob_b = Session::new(
            &chain_b,
            AutoConfirm,
            endpoint(111, contract_b),
            Some(signer(BOB)),
        );
        let tx = bob_b
            .new_contract(
                &account_of(ALICE).to_string(),
                U256::from(500),
                audited.hashlock,
                participant_timelock,
            )
            .await
            .unwrap();
        let leg_b = bob_b.get_contract_id(tx).await.unwrap();

        // Alice redeems on chain B, revealing the secret.
        let alice_b = Session::new(
            &chain_b,
            AutoConfirm,
            endpoint(111, contract_b),
            Some(signer(ALICE)),
        );
        let before = chain_b.balance_of(account_of(ALICE));
        alice_b.redeem(leg_b.contract_id, pair.secret).await.unwrap();
        assert_that(&chain_b.balance_of(account_of(ALICE))).is_equal_to(before + U256::from(500));

        // Bob learns it from chain B and redeems on chain A.
        let revealed = bob_b
            .audit_contract(leg_b.contract_id)
            .await
            .unwrap()
            .revealed_secret()
            .unwrap();
        assert_that(&revealed).is_equal_to(pair.secret);

        let bob_a = Session::new(
            &chain_a,
            AutoConfirm,
            endpoint(110, contract_a),
            Some(signer(BOB)),
        );
        bob_a.redeem(leg_a.contract_id, revealed).await.unwrap();

        let leg = bob_a.audit_contract(leg_a.contract_id).await.unwrap();
        assert_that(&leg.state()).is_equal_to(LegState::Withdrawn(pair.secret));
    }
}
