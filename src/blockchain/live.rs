use std::time::Duration;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use tracing::{debug, info};

use super::abi::{IBroker, IExchangeProvider, IERC20, BROKER_FUNCTION_NAMES};
use super::client::{ChainReader, ChainWriter, RawExchange, TxStatus};
use crate::errors::SwapError;

/// Chain client backed by an alloy provider.
///
/// The provider is constructed by the caller (with its wallet filler already
/// attached for write paths) and handed in erased; RPC construction and key
/// custody stay outside this crate.
pub struct LiveChainClient {
    provider: DynProvider,
    broker: Address,
    signer: Address,
    receipt_poll_interval: Duration,
}

impl LiveChainClient {
    pub fn new(
        provider: DynProvider,
        broker: Address,
        signer: Address,
        receipt_poll_interval: Duration,
    ) -> Self {
        Self {
            provider,
            broker,
            signer,
            receipt_poll_interval,
        }
    }

    fn rpc_err(e: impl std::fmt::Display) -> SwapError {
        SwapError::Rpc(e.to_string())
    }
}

#[async_trait]
impl ChainReader for LiveChainClient {
    async fn list_exchanges(&self) -> Result<Vec<RawExchange>, SwapError> {
        let broker = IBroker::new(self.broker, self.provider.clone());
        let providers = broker
            .getExchangeProviders()
            .call()
            .await
            .map_err(Self::rpc_err)?;
        debug!("broker reports {} exchange providers", providers.len());

        let mut exchanges = Vec::new();
        for provider_addr in providers {
            let venue = IExchangeProvider::new(provider_addr, self.provider.clone());
            let listed = venue.getExchanges().call().await.map_err(Self::rpc_err)?;
            for exchange in listed {
                exchanges.push(RawExchange {
                    id: exchange.exchangeId,
                    provider: provider_addr,
                    assets: exchange.assets,
                });
            }
        }
        Ok(exchanges)
    }

    async fn quote_out(
        &self,
        provider: Address,
        exchange_id: B256,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<U256, SwapError> {
        let broker = IBroker::new(self.broker, self.provider.clone());
        broker
            .getAmountOut(provider, exchange_id, token_in, token_out, amount_in)
            .call()
            .await
            .map_err(Self::rpc_err)
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, SwapError> {
        let erc20 = IERC20::new(token, self.provider.clone());
        erc20
            .allowance(owner, spender)
            .call()
            .await
            .map_err(Self::rpc_err)
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, SwapError> {
        let erc20 = IERC20::new(token, self.provider.clone());
        erc20.balanceOf(owner).call().await.map_err(Self::rpc_err)
    }

    async fn broker_address(&self) -> Result<Address, SwapError> {
        Ok(self.broker)
    }

    async fn broker_function_names(&self) -> Result<Vec<String>, SwapError> {
        // The compiled broker ABI is the interface we negotiate against.
        Ok(BROKER_FUNCTION_NAMES
            .iter()
            .map(|name| name.to_string())
            .collect())
    }
}

#[async_trait]
impl ChainWriter for LiveChainClient {
    fn signer_address(&self) -> Address {
        self.signer
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<B256, SwapError> {
        let erc20 = IERC20::new(token, self.provider.clone());
        let pending = erc20
            .approve(spender, amount)
            .send()
            .await
            .map_err(Self::rpc_err)?;
        let tx_hash = *pending.tx_hash();
        info!(%token, %spender, %amount, %tx_hash, "approval submitted");
        Ok(tx_hash)
    }

    async fn submit_call(&self, to: Address, calldata: Vec<u8>) -> Result<B256, SwapError> {
        debug!(%to, calldata = %hex::encode(&calldata), "preparing swap call");
        let tx = TransactionRequest::default()
            .with_from(self.signer)
            .with_to(to)
            .with_input(calldata);

        // Pre-flight estimation: a revert here means the contract rejected the
        // call shape before anything was broadcast.
        if let Err(e) = self.provider.estimate_gas(tx.clone()).await {
            return Err(SwapError::CallRejected {
                reason: e.to_string(),
            });
        }

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(Self::rpc_err)?;
        let tx_hash = *pending.tx_hash();
        info!(%to, %tx_hash, "swap call submitted");
        Ok(tx_hash)
    }

    async fn transfer(
        &self,
        token: Address,
        to: Address,
        amount: U256,
    ) -> Result<B256, SwapError> {
        let erc20 = IERC20::new(token, self.provider.clone());
        let pending = erc20.transfer(to, amount).send().await.map_err(Self::rpc_err)?;
        let tx_hash = *pending.tx_hash();
        info!(%token, %to, %amount, %tx_hash, "transfer submitted");
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxStatus, SwapError> {
        loop {
            match self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(Self::rpc_err)?
            {
                Some(receipt) => {
                    let status = if receipt.status() {
                        TxStatus::Success
                    } else {
                        TxStatus::Reverted
                    };
                    debug!(%tx_hash, ?status, "receipt observed");
                    return Ok(status);
                }
                None => tokio::time::sleep(self.receipt_poll_interval).await,
            }
        }
    }
}
