//! An in-process chain that executes the HTLC contract rules, so the swap
//! commands can be tested without a node.

use crate::{
    ethereum::{
        Address, CallRequest, ChainId, Connector, Hash, TransactionReceipt, U256,
    },
    jsonrpc::JsonRpcError,
};
use async_trait::async_trait;
use htlc::{
    abi,
    ethereum::keccak256,
    transaction::{self, SignedTransaction},
    ContractId, CreatedLeg, Secret, SecretHash, SwapLeg, Timestamp,
};
use std::{collections::HashMap, sync::Mutex};

const GAS_PRICE: u64 = 20_000_000_000;

#[derive(Debug)]
pub struct FakeChain {
    chain_id: ChainId,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    now: Option<Timestamp>,
    nonces: HashMap<Address, U256>,
    balances: HashMap<Address, U256>,
    code: HashMap<Address, Vec<u8>>,
    legs: HashMap<(Address, ContractId), SwapLeg>,
    receipts: HashMap<Hash, TransactionReceipt>,
}

/// The effect of a successful execution.
#[derive(Debug, Default)]
struct Outcome {
    contract_address: Option<Address>,
    logs: Vec<htlc::ethereum::Log>,
}

impl FakeChain {
    pub fn new(chain_id: ChainId) -> Self {
        FakeChain {
            chain_id,
            state: Mutex::new(State::default()),
        }
    }

    pub fn fund(&self, account: Address, amount: U256) {
        self.state().balances.insert(account, amount);
    }

    pub fn set_nonce(&self, account: Address, nonce: U256) {
        self.state().nonces.insert(account, nonce);
    }

    /// Pins the block time. Without it the wall clock is used.
    pub fn set_time(&self, now: Timestamp) {
        self.state().now = Some(now);
    }

    pub fn gas_price_now(&self) -> U256 {
        U256::from(GAS_PRICE)
    }

    pub fn receipt(&self, transaction_hash: Hash) -> Option<TransactionReceipt> {
        self.state().receipts.get(&transaction_hash).cloned()
    }

    pub fn transaction_hashes(&self) -> Vec<Hash> {
        self.state().receipts.keys().copied().collect()
    }

    pub fn transaction_count_total(&self) -> usize {
        self.state().receipts.len()
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.state().balances.get(&account).copied().unwrap_or_default()
    }

    pub fn has_code(&self, address: Address) -> bool {
        self.state().code.contains_key(&address)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

impl State {
    fn now(&self) -> Timestamp {
        self.now.unwrap_or_else(Timestamp::now)
    }

    fn balance(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    fn execute(
        &mut self,
        from: Address,
        nonce: U256,
        to: Option<Address>,
        value: U256,
        data: &[u8],
    ) -> Result<Outcome, Revert> {
        if self.balance(from) < value {
            return Err(Revert("insufficient funds for transfer"));
        }

        let to = match to {
            Some(to) => to,
            None => {
                if data.is_empty() {
                    return Err(Revert("empty init code"));
                }
                let address = transaction::contract_address(from, nonce);
                self.code.insert(address, data.to_vec());

                return Ok(Outcome {
                    contract_address: Some(address),
                    ..Outcome::default()
                });
            }
        };

        if !self.code.contains_key(&to) {
            self.transfer(from, to, value);
            return Ok(Outcome::default());
        }

        let (selector, words) = split_call(data)?;
        if selector == selector_of("newContract(address,bytes32,uint256)") {
            self.new_contract(to, from, value, &words)
        } else if selector == selector_of("withdraw(bytes32,bytes32)") {
            self.withdraw(to, from, &words)
        } else if selector == selector_of("refund(bytes32)") {
            self.refund(to, from, &words)
        } else {
            Err(Revert("unknown method"))
        }
    }

    fn new_contract(
        &mut self,
        contract: Address,
        sender: Address,
        amount: U256,
        words: &[[u8; 32]],
    ) -> Result<Outcome, Revert> {
        let [receiver, hashlock, timelock] = match words {
            [a, b, c, ..] => [*a, *b, *c],
            _ => return Err(Revert("short input")),
        };
        let receiver = Address::from_slice(&receiver[12..]);
        let timelock = Timestamp::from(U256::from_big_endian(&timelock));

        if amount.is_zero() {
            return Err(Revert("msg.value must be > 0"));
        }
        if timelock.has_passed(self.now()) {
            return Err(Revert("timelock time must be in the future"));
        }

        let mut preimage = Vec::with_capacity(3 * 32 + 2 * 20);
        preimage.extend_from_slice(sender.as_bytes());
        preimage.extend_from_slice(receiver.as_bytes());
        preimage.extend_from_slice(&word(amount));
        preimage.extend_from_slice(&hashlock);
        preimage.extend_from_slice(&word(U256::from(timelock)));
        let contract_id = ContractId::from(keccak256(&preimage));

        if self.legs.contains_key(&(contract, contract_id)) {
            return Err(Revert("Contract already exists"));
        }

        let created = CreatedLeg {
            contract_id,
            sender,
            receiver,
            amount,
            hashlock: SecretHash::from(hashlock),
            timelock,
        };
        self.legs.insert((contract, contract_id), SwapLeg {
            contract_id,
            sender,
            receiver,
            amount,
            hashlock: created.hashlock,
            timelock,
            withdrawn: false,
            refunded: false,
            preimage: Secret::from([0u8; 32]),
        });
        self.transfer(sender, contract, amount);

        Ok(Outcome {
            logs: vec![abi::encode_creation_event(contract, &created)],
            ..Outcome::default()
        })
    }

    fn withdraw(
        &mut self,
        contract: Address,
        caller: Address,
        words: &[[u8; 32]],
    ) -> Result<Outcome, Revert> {
        let (contract_id, preimage) = match words {
            [id, preimage, ..] => (ContractId::from(*id), Secret::from(*preimage)),
            _ => return Err(Revert("short input")),
        };
        let now = self.now();
        let leg = self
            .legs
            .get_mut(&(contract, contract_id))
            .ok_or(Revert("contractId does not exist"))?;

        if leg.hashlock != preimage.hash() {
            return Err(Revert("hashlock hash does not match"));
        }
        if leg.receiver != caller {
            return Err(Revert("withdrawable: not receiver"));
        }
        if leg.withdrawn {
            return Err(Revert("withdrawable: already withdrawn"));
        }
        if leg.timelock.has_passed(now) {
            return Err(Revert("withdrawable: timelock time must be in the future"));
        }

        leg.withdrawn = true;
        leg.preimage = preimage;
        let (receiver, amount) = (leg.receiver, leg.amount);
        self.transfer(contract, receiver, amount);

        Ok(Outcome::default())
    }

    fn refund(
        &mut self,
        contract: Address,
        caller: Address,
        words: &[[u8; 32]],
    ) -> Result<Outcome, Revert> {
        let contract_id = match words {
            [id, ..] => ContractId::from(*id),
            _ => return Err(Revert("short input")),
        };
        let now = self.now();
        let leg = self
            .legs
            .get_mut(&(contract, contract_id))
            .ok_or(Revert("contractId does not exist"))?;

        if leg.sender != caller {
            return Err(Revert("refundable: not sender"));
        }
        if leg.refunded {
            return Err(Revert("refundable: already refunded"));
        }
        if leg.withdrawn {
            return Err(Revert("refundable: already withdrawn"));
        }
        if !leg.timelock.has_passed(now) {
            return Err(Revert("refundable: timelock not yet passed"));
        }

        leg.refunded = true;
        let (sender, amount) = (leg.sender, leg.amount);
        self.transfer(contract, sender, amount);

        Ok(Outcome::default())
    }

    fn transfer(&mut self, from: Address, to: Address, amount: U256) {
        let from_balance = self.balance(from);
        self.balances.insert(from, from_balance.saturating_sub(amount));
        let to_balance = self.balance(to);
        self.balances.insert(to, to_balance.saturating_add(amount));
    }
}

#[derive(Debug)]
struct Revert(&'static str);

impl Revert {
    /// What geth answers for a reverting call.
    fn into_rpc_error(self) -> anyhow::Error {
        anyhow::Error::new(JsonRpcError {
            code: -32000,
            message: format!("execution reverted: {}", self.0),
        })
    }
}

fn selector_of(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn split_call(data: &[u8]) -> Result<([u8; 4], Vec<[u8; 32]>), Revert> {
    if data.len() < 4 || (data.len() - 4) % 32 != 0 {
        return Err(Revert("malformed input"));
    }

    let selector = [data[0], data[1], data[2], data[3]];
    let words = data[4..]
        .chunks(32)
        .map(|chunk| {
            let mut word = [0u8; 32];
            word.copy_from_slice(chunk);
            word
        })
        .collect();

    Ok((selector, words))
}

fn word(value: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

#[async_trait]
impl Connector for FakeChain {
    async fn chain_id(&self) -> anyhow::Result<ChainId> {
        Ok(self.chain_id)
    }

    async fn transaction_count(&self, account: Address) -> anyhow::Result<U256> {
        Ok(self.state().nonces.get(&account).copied().unwrap_or_default())
    }

    async fn gas_price(&self) -> anyhow::Result<U256> {
        Ok(self.gas_price_now())
    }

    async fn estimate_gas(&self, request: CallRequest) -> anyhow::Result<U256> {
        let mut state = self.state();
        let from = request.from.unwrap_or_default();
        let nonce = state.nonces.get(&from).copied().unwrap_or_default();

        // Estimation must not leave traces.
        let snapshot = (
            state.balances.clone(),
            state.code.clone(),
            state.legs.clone(),
        );
        let result = state.execute(
            from,
            nonce,
            request.to,
            request.value.unwrap_or_default(),
            &request.data,
        );
        let (balances, code, legs) = snapshot;
        state.balances = balances;
        state.code = code;
        state.legs = legs;

        result.map_err(Revert::into_rpc_error)?;

        Ok(U256::from(21_000 + 16 * request.data.len()))
    }

    async fn balance(&self, account: Address) -> anyhow::Result<U256> {
        Ok(self.balance_of(account))
    }

    async fn send_raw_transaction(&self, signed: &SignedTransaction) -> anyhow::Result<Hash> {
        let recovered = transaction::recover(signed.raw())?;
        if recovered.chain_id != self.chain_id {
            anyhow::bail!(JsonRpcError {
                code: -32000,
                message: "invalid sender".to_owned(),
            });
        }

        let mut state = self.state();
        let from = recovered.from;
        let nonce = state.nonces.get(&from).copied().unwrap_or_default();
        if recovered.transaction.nonce != nonce {
            anyhow::bail!(JsonRpcError {
                code: -32000,
                message: format!(
                    "nonce too low: expected {}, got {}",
                    nonce, recovered.transaction.nonce
                ),
            });
        }

        let tx = recovered.transaction;
        let receipt = match state.execute(from, nonce, tx.to, tx.value, &tx.data) {
            Ok(outcome) => TransactionReceipt {
                transaction_hash: recovered.hash,
                contract_address: outcome.contract_address,
                logs: outcome.logs,
                status: Some(1),
            },
            Err(_) => TransactionReceipt {
                transaction_hash: recovered.hash,
                status: Some(0),
                ..TransactionReceipt::default()
            },
        };
        state.nonces.insert(from, nonce + 1);
        state.receipts.insert(recovered.hash, receipt);

        Ok(recovered.hash)
    }

    async fn transaction_receipt(
        &self,
        transaction_hash: Hash,
    ) -> anyhow::Result<Option<TransactionReceipt>> {
        Ok(self.receipt(transaction_hash))
    }

    async fn call(&self, request: CallRequest) -> anyhow::Result<Vec<u8>> {
        let state = self.state();
        let to = match request.to {
            Some(to) if state.code.contains_key(&to) => to,
            _ => return Ok(Vec::new()),
        };

        let (selector, words) = split_call(&request.data).map_err(Revert::into_rpc_error)?;
        if selector != selector_of("getContract(bytes32)") {
            return Err(Revert("unknown method").into_rpc_error());
        }
        let contract_id = words
            .first()
            .map(|id| ContractId::from(*id))
            .ok_or(Revert("short input"))
            .map_err(Revert::into_rpc_error)?;

        let leg = state
            .legs
            .get(&(to, contract_id))
            .copied()
            .unwrap_or(SwapLeg {
                contract_id,
                sender: Address::ZERO,
                receiver: Address::ZERO,
                amount: U256::zero(),
                hashlock: SecretHash::from([0u8; 32]),
                timelock: Timestamp::from(0u64),
                withdrawn: false,
                refunded: false,
                preimage: Secret::from([0u8; 32]),
            });

        Ok(abi::encode_get_contract_output(&leg))
    }

    async fn code_at(&self, address: Address) -> anyhow::Result<Vec<u8>> {
        Ok(self.state().code.get(&address).cloned().unwrap_or_default())
    }
}
