use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use tracing::info;

use crate::blockchain::{await_receipt, ChainClient, TxStatus};
use crate::errors::SwapError;
use crate::types::Token;

/// Transfers the settled output to a recipient distinct from the initiator
/// after the final leg confirms.
///
/// A failure here never rolls back the swap: the legs are already settled
/// on-chain and the initiator retains the output token. The caller retries
/// the remittance alone.
pub struct RemittanceHandler {
    client: Arc<dyn ChainClient>,
    confirm_timeout: Duration,
}

impl RemittanceHandler {
    pub fn new(client: Arc<dyn ChainClient>, confirm_timeout: Duration) -> Self {
        Self {
            client,
            confirm_timeout,
        }
    }

    pub async fn remit(
        &self,
        token: &Token,
        recipient: Address,
        amount: U256,
    ) -> Result<B256, SwapError> {
        info!(token = %token.symbol, %recipient, %amount, "remitting settled output");
        let tx_hash = self
            .client
            .transfer(token.address, recipient, amount)
            .await
            .map_err(|e| SwapError::RemittanceFailed {
                recipient,
                reason: e.to_string(),
            })?;

        match await_receipt(self.client.as_ref(), tx_hash, self.confirm_timeout).await {
            Ok(TxStatus::Success) => Ok(tx_hash),
            Ok(TxStatus::Reverted) => Err(SwapError::RemittanceFailed {
                recipient,
                reason: format!("transfer reverted (tx: {tx_hash})"),
            }),
            Err(e) => Err(SwapError::RemittanceFailed {
                recipient,
                reason: e.to_string(),
            }),
        }
    }
}
