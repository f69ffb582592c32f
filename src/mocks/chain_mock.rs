use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;

use crate::blockchain::abi::{IBroker, ILegacyBroker};
use crate::blockchain::client::{ChainReader, ChainWriter, RawExchange, TxStatus};
use crate::errors::SwapError;

/// Scripted in-memory chain for tests: venues, linear rates, balances,
/// allowances, per-transaction outcomes, and selector acceptance for
/// call-signature negotiation.
pub struct MockChainClient {
    signer: Address,
    broker: Address,
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    exchanges: Vec<RawExchange>,
    /// (exchange id, token in, token out) -> (numerator, denominator)
    rates: HashMap<(B256, Address, Address), (U256, U256)>,
    /// (token, owner) -> balance
    balances: HashMap<(Address, Address), U256>,
    /// (token, owner, spender) -> allowance
    allowances: HashMap<(Address, Address, Address), U256>,
    receipts: HashMap<B256, TxStatus>,
    accept_primary: bool,
    accept_legacy: bool,
    fail_approval_once: bool,
    fail_approval_send_once: bool,
    fail_transfer_once: bool,
    /// Indices (in submission order) of swaps that revert on-chain.
    failing_swaps: HashSet<usize>,
    /// Indices (in call order) of token_balance reads that fail.
    failing_balance_reads: HashSet<usize>,
    balance_reads: usize,
    /// Transactions whose receipt never arrives.
    held_receipts: HashSet<B256>,
    hold_receipt_once: bool,
    swaps_submitted: usize,
    approvals_submitted: usize,
    rejected_calls: usize,
    next_tx: u64,
}

impl MockChainClient {
    pub fn new(signer: Address) -> Self {
        let state = MockState {
            accept_primary: true,
            ..Default::default()
        };
        Self {
            signer,
            broker: Address::repeat_byte(0xbb),
            state: Mutex::new(state),
        }
    }

    pub fn broker(&self) -> Address {
        self.broker
    }

    pub fn add_exchange(&self, id: B256, provider: Address, assets: Vec<Address>) {
        self.lock().exchanges.push(RawExchange {
            id,
            provider,
            assets,
        });
    }

    /// Linear venue pricing: amount_out = amount_in * num / den.
    pub fn set_rate(&self, id: B256, token_in: Address, token_out: Address, num: u128, den: u128) {
        self.lock()
            .rates
            .insert((id, token_in, token_out), (U256::from(num), U256::from(den)));
    }

    pub fn set_balance(&self, token: Address, owner: Address, amount: U256) {
        self.lock().balances.insert((token, owner), amount);
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.lock().allowances.insert((token, owner, spender), amount);
    }

    pub fn balance_of(&self, token: Address, owner: Address) -> U256 {
        *self
            .lock()
            .balances
            .get(&(token, owner))
            .unwrap_or(&U256::ZERO)
    }

    pub fn allowance_of(&self, token: Address, owner: Address, spender: Address) -> U256 {
        *self
            .lock()
            .allowances
            .get(&(token, owner, spender))
            .unwrap_or(&U256::ZERO)
    }

    pub fn approvals_submitted(&self) -> usize {
        self.lock().approvals_submitted
    }

    pub fn swaps_submitted(&self) -> usize {
        self.lock().swaps_submitted
    }

    pub fn rejected_calls(&self) -> usize {
        self.lock().rejected_calls
    }

    pub fn fail_next_approval(&self) {
        self.lock().fail_approval_once = true;
    }

    /// The next approve submission fails at the transport layer, before any
    /// transaction exists.
    pub fn fail_next_approval_send(&self) {
        self.lock().fail_approval_send_once = true;
    }

    /// The nth token_balance read (0-based, in call order) fails.
    pub fn fail_balance_read_at(&self, index: usize) {
        self.lock().failing_balance_reads.insert(index);
    }

    /// The next swap submission's receipt never arrives; waiters stay pending.
    pub fn hold_next_receipt(&self) {
        self.lock().hold_receipt_once = true;
    }

    pub fn fail_next_transfer(&self) {
        self.lock().fail_transfer_once = true;
    }

    /// The nth accepted swap submission (0-based) reverts on-chain.
    pub fn fail_swap_at(&self, index: usize) {
        self.lock().failing_swaps.insert(index);
    }

    pub fn reject_primary_signature(&self) {
        self.lock().accept_primary = false;
    }

    pub fn accept_legacy_signature(&self) {
        self.lock().accept_legacy = true;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_tx_hash(state: &mut MockState) -> B256 {
        state.next_tx += 1;
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&state.next_tx.to_be_bytes());
        B256::from_slice(&bytes)
    }

    fn credit(state: &mut MockState, token: Address, owner: Address, amount: U256) {
        let entry = state.balances.entry((token, owner)).or_insert(U256::ZERO);
        *entry += amount;
    }

    fn debit(state: &mut MockState, token: Address, owner: Address, amount: U256) {
        let entry = state.balances.entry((token, owner)).or_insert(U256::ZERO);
        *entry = entry.saturating_sub(amount);
    }

    fn apply_swap(
        &self,
        state: &mut MockState,
        exchange_id: B256,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> B256 {
        let index = state.swaps_submitted;
        state.swaps_submitted += 1;
        let tx_hash = Self::next_tx_hash(state);

        if state.hold_receipt_once {
            state.hold_receipt_once = false;
            state.held_receipts.insert(tx_hash);
        }

        if state.failing_swaps.contains(&index) {
            state.receipts.insert(tx_hash, TxStatus::Reverted);
            return tx_hash;
        }

        let amount_out = state
            .rates
            .get(&(exchange_id, token_in, token_out))
            .map(|(num, den)| amount_in * num / den)
            .unwrap_or(U256::ZERO);
        Self::debit(state, token_in, self.signer, amount_in);
        Self::credit(state, token_out, self.signer, amount_out);
        state.receipts.insert(tx_hash, TxStatus::Success);
        tx_hash
    }
}

#[async_trait]
impl ChainReader for MockChainClient {
    async fn list_exchanges(&self) -> Result<Vec<RawExchange>, SwapError> {
        Ok(self.lock().exchanges.clone())
    }

    async fn quote_out(
        &self,
        _provider: Address,
        exchange_id: B256,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<U256, SwapError> {
        Ok(self
            .lock()
            .rates
            .get(&(exchange_id, token_in, token_out))
            .map(|(num, den)| amount_in * num / den)
            .unwrap_or(U256::ZERO))
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, SwapError> {
        Ok(self.allowance_of(token, owner, spender))
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, SwapError> {
        let mut state = self.lock();
        let index = state.balance_reads;
        state.balance_reads += 1;
        if state.failing_balance_reads.contains(&index) {
            return Err(SwapError::Rpc("balance read failed".to_string()));
        }
        Ok(*state.balances.get(&(token, owner)).unwrap_or(&U256::ZERO))
    }

    async fn broker_address(&self) -> Result<Address, SwapError> {
        Ok(self.broker)
    }

    async fn broker_function_names(&self) -> Result<Vec<String>, SwapError> {
        Ok(vec![
            "getExchangeProviders".to_string(),
            "getAmountOut".to_string(),
            "swapIn".to_string(),
            "swapOut".to_string(),
        ])
    }
}

#[async_trait]
impl ChainWriter for MockChainClient {
    fn signer_address(&self) -> Address {
        self.signer
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<B256, SwapError> {
        let mut state = self.lock();
        if state.fail_approval_send_once {
            state.fail_approval_send_once = false;
            return Err(SwapError::Rpc("approve send failed".to_string()));
        }
        state.approvals_submitted += 1;
        let tx_hash = Self::next_tx_hash(&mut state);
        if state.fail_approval_once {
            state.fail_approval_once = false;
            state.receipts.insert(tx_hash, TxStatus::Reverted);
        } else {
            state
                .allowances
                .insert((token, self.signer, spender), amount);
            state.receipts.insert(tx_hash, TxStatus::Success);
        }
        Ok(tx_hash)
    }

    async fn submit_call(&self, _to: Address, calldata: Vec<u8>) -> Result<B256, SwapError> {
        let mut state = self.lock();

        if let Ok(call) = IBroker::swapInCall::abi_decode(&calldata) {
            if !state.accept_primary {
                state.rejected_calls += 1;
                return Err(SwapError::CallRejected {
                    reason: "execution reverted: function signature not recognized".to_string(),
                });
            }
            return Ok(self.apply_swap(
                &mut state,
                call.exchangeId,
                call.tokenIn,
                call.tokenOut,
                call.amountIn,
            ));
        }

        if let Ok(call) = ILegacyBroker::swapInCall::abi_decode(&calldata) {
            if !state.accept_legacy {
                state.rejected_calls += 1;
                return Err(SwapError::CallRejected {
                    reason: "execution reverted: function signature not recognized".to_string(),
                });
            }
            return Ok(self.apply_swap(
                &mut state,
                call.exchangeId,
                call.tokenIn,
                call.tokenOut,
                call.amountIn,
            ));
        }

        state.rejected_calls += 1;
        Err(SwapError::CallRejected {
            reason: "unknown selector".to_string(),
        })
    }

    async fn transfer(
        &self,
        token: Address,
        to: Address,
        amount: U256,
    ) -> Result<B256, SwapError> {
        let mut state = self.lock();
        let tx_hash = Self::next_tx_hash(&mut state);
        if state.fail_transfer_once {
            state.fail_transfer_once = false;
            state.receipts.insert(tx_hash, TxStatus::Reverted);
        } else {
            Self::debit(&mut state, token, self.signer, amount);
            Self::credit(&mut state, token, to, amount);
            state.receipts.insert(tx_hash, TxStatus::Success);
        }
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxStatus, SwapError> {
        loop {
            {
                let state = self.lock();
                if !state.held_receipts.contains(&tx_hash) {
                    return state
                        .receipts
                        .get(&tx_hash)
                        .copied()
                        .ok_or_else(|| SwapError::Rpc(format!("unknown transaction: {tx_hash}")));
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_swap_revert() {
        let signer = Address::repeat_byte(0xaa);
        let mock = MockChainClient::new(signer);
        let id = B256::repeat_byte(1);
        let token_a = Address::repeat_byte(1);
        let token_b = Address::repeat_byte(2);
        mock.set_rate(id, token_a, token_b, 1, 1);
        mock.fail_swap_at(0);

        let calldata = IBroker::swapInCall {
            exchangeProvider: Address::repeat_byte(0xEE),
            exchangeId: id,
            tokenIn: token_a,
            tokenOut: token_b,
            amountIn: U256::from(100u64),
            amountOutMin: U256::from(99u64),
        }
        .abi_encode();

        let tx = mock.submit_call(mock.broker(), calldata).await.unwrap();
        assert_eq!(mock.wait_for_receipt(tx).await.unwrap(), TxStatus::Reverted);
        // reverted swap moved no funds
        assert_eq!(mock.balance_of(token_b, signer), U256::ZERO);
    }
}
