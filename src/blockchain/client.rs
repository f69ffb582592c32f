use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::SwapError;

/// Confirmation outcome of a broadcast transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Success,
    Reverted,
}

/// A venue as reported by the chain, before token metadata is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct RawExchange {
    pub id: B256,
    pub provider: Address,
    pub assets: Vec<Address>,
}

/// Read-only chain boundary.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Every venue across all exchange providers registered on the broker.
    async fn list_exchanges(&self) -> Result<Vec<RawExchange>, SwapError>;

    /// Simulate a swap's output on a specific venue.
    async fn quote_out(
        &self,
        provider: Address,
        exchange_id: B256,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<U256, SwapError>;

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, SwapError>;

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, SwapError>;

    async fn broker_address(&self) -> Result<Address, SwapError>;

    /// Function names declared by the broker contract, for diagnostics when
    /// call-signature negotiation exhausts every known shape.
    async fn broker_function_names(&self) -> Result<Vec<String>, SwapError>;
}

/// Transaction-submitting chain boundary. Signing happens behind the
/// implementation; key custody never enters this crate.
#[async_trait]
pub trait ChainWriter: Send + Sync {
    fn signer_address(&self) -> Address;

    /// Submit an exact-amount ERC20 approval.
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<B256, SwapError>;

    /// Submit pre-encoded calldata to a contract. Implementations must report
    /// pre-broadcast rejection (ABI mismatch, estimation revert) as
    /// `SwapError::CallRejected` so the caller can try the next call shape.
    async fn submit_call(&self, to: Address, calldata: Vec<u8>) -> Result<B256, SwapError>;

    /// Submit an ERC20 transfer.
    async fn transfer(&self, token: Address, to: Address, amount: U256)
        -> Result<B256, SwapError>;

    /// Block until the transaction settles. Callers bound this with
    /// [`await_receipt`]; the raw wait has no timeout of its own.
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxStatus, SwapError>;
}

/// Full chain boundary used by the executor.
pub trait ChainClient: ChainReader + ChainWriter {}

impl<T: ChainReader + ChainWriter> ChainClient for T {}

/// Receipt wait with the configured upper bound. A timeout is surfaced as
/// `ConfirmationTimeout` with the hash so the caller can inspect the chain.
pub async fn await_receipt(
    client: &dyn ChainClient,
    tx_hash: B256,
    timeout: Duration,
) -> Result<TxStatus, SwapError> {
    tokio::time::timeout(timeout, client.wait_for_receipt(tx_hash))
        .await
        .map_err(|_| SwapError::ConfirmationTimeout {
            tx_hash,
            seconds: timeout.as_secs(),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::abi::IBroker;
    use crate::mocks::MockChainClient;
    use alloy::sol_types::SolCall;

    #[tokio::test]
    async fn test_await_receipt_times_out_on_pending_tx() {
        let mock = MockChainClient::new(Address::repeat_byte(0xaa));
        let id = B256::repeat_byte(1);
        let token_a = Address::repeat_byte(1);
        let token_b = Address::repeat_byte(2);
        mock.set_rate(id, token_a, token_b, 1, 1);
        mock.hold_next_receipt();

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

        let err = await_receipt(&mock, tx, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(
            matches!(err, SwapError::ConfirmationTimeout { tx_hash, .. } if tx_hash == tx)
        );
    }
}
