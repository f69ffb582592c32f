use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use tracing::{debug, info};

use crate::blockchain::{await_receipt, ChainClient, TxStatus};
use crate::errors::SwapError;
use crate::types::Token;

/// Ensures the broker holds a sufficient spending allowance before a leg is
/// submitted. Approvals are for the exact required amount, never unlimited.
pub struct AllowanceManager {
    client: Arc<dyn ChainClient>,
    confirm_timeout: Duration,
}

impl AllowanceManager {
    pub fn new(client: Arc<dyn ChainClient>, confirm_timeout: Duration) -> Self {
        Self {
            client,
            confirm_timeout,
        }
    }

    /// No-op when the current allowance already covers `required`; otherwise
    /// submits an exact approval and blocks until it confirms. Returns the
    /// approval tx hash when one was needed.
    pub async fn ensure(
        &self,
        token: &Token,
        owner: Address,
        spender: Address,
        required: U256,
    ) -> Result<Option<B256>, SwapError> {
        let current = self
            .client
            .allowance(token.address, owner, spender)
            .await?;

        if current >= required {
            debug!(
                token = %token.symbol,
                %current,
                %required,
                "allowance already sufficient"
            );
            return Ok(None);
        }

        info!(
            token = %token.symbol,
            %current,
            %required,
            "approving broker spend"
        );
        // A transport failure here means nothing was broadcast; it propagates
        // as-is. ApprovalReverted is reserved for a reverted receipt.
        let tx_hash = self.client.approve(token.address, spender, required).await?;

        match await_receipt(self.client.as_ref(), tx_hash, self.confirm_timeout).await? {
            TxStatus::Success => Ok(Some(tx_hash)),
            TxStatus::Reverted => Err(SwapError::ApprovalReverted {
                token: token.symbol.clone(),
                tx_hash,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CELO_MAINNET;
    use crate::mocks::MockChainClient;
    use crate::registry::TokenRegistry;

    fn setup() -> (Arc<MockChainClient>, Token, Address, Address) {
        let registry = TokenRegistry::for_network(CELO_MAINNET).unwrap();
        let token = registry.token("cUSD").unwrap().clone();
        let owner = Address::repeat_byte(0xaa);
        let broker = Address::repeat_byte(0xbb);
        (Arc::new(MockChainClient::new(owner)), token, owner, broker)
    }

    #[tokio::test]
    async fn test_noop_when_allowance_sufficient() {
        let (mock, token, owner, broker) = setup();
        mock.set_allowance(token.address, owner, broker, U256::from(1_000u64));

        let manager = AllowanceManager::new(mock.clone(), Duration::from_secs(5));
        let tx = manager
            .ensure(&token, owner, broker, U256::from(500u64))
            .await
            .unwrap();
        assert!(tx.is_none());
        assert_eq!(mock.approvals_submitted(), 0);
    }

    #[tokio::test]
    async fn test_exact_approval_when_short() {
        let (mock, token, owner, broker) = setup();
        let required = U256::from(123_456u64);

        let manager = AllowanceManager::new(mock.clone(), Duration::from_secs(5));
        let tx = manager.ensure(&token, owner, broker, required).await.unwrap();
        assert!(tx.is_some());
        assert_eq!(mock.approvals_submitted(), 1);
        // exact amount, not unlimited
        assert_eq!(
            mock.allowance_of(token.address, owner, broker),
            required
        );
    }

    #[tokio::test]
    async fn test_reverted_approval_surfaces() {
        let (mock, token, owner, broker) = setup();
        mock.fail_next_approval();

        let manager = AllowanceManager::new(mock.clone(), Duration::from_secs(5));
        let err = manager
            .ensure(&token, owner, broker, U256::from(10u64))
            .await
            .unwrap_err();
        assert!(matches!(err, SwapError::ApprovalReverted { .. }));
    }

    #[tokio::test]
    async fn test_transport_error_on_approve_stays_rpc() {
        let (mock, token, owner, broker) = setup();
        mock.fail_next_approval_send();

        let manager = AllowanceManager::new(mock.clone(), Duration::from_secs(5));
        let err = manager
            .ensure(&token, owner, broker, U256::from(10u64))
            .await
            .unwrap_err();
        // nothing was broadcast; this is not a revert
        assert!(matches!(err, SwapError::Rpc(_)));
        assert_eq!(mock.approvals_submitted(), 0);
    }
}
