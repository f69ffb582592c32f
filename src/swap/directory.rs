use std::sync::Arc;

use tracing::debug;

use crate::blockchain::ChainClient;
use crate::errors::SwapError;
use crate::registry::TokenRegistry;
use crate::types::Exchange;

/// Lists the trading venues registered on the broker, with token metadata
/// attached from the registry.
///
/// The listing is fetched fresh per resolution request; venues are not cached
/// across swap attempts.
pub struct ExchangeDirectory {
    client: Arc<dyn ChainClient>,
    registry: Arc<TokenRegistry>,
}

impl ExchangeDirectory {
    pub fn new(client: Arc<dyn ChainClient>, registry: Arc<TokenRegistry>) -> Self {
        Self { client, registry }
    }

    /// All venues whose asset pair consists of two registered tokens. Venues
    /// touching unknown assets are skipped; they cannot be quoted or settled
    /// with correct decimals.
    pub async fn list(&self) -> Result<Vec<Exchange>, SwapError> {
        let raw = self.client.list_exchanges().await?;
        let mut exchanges = Vec::with_capacity(raw.len());

        for entry in raw {
            if entry.assets.len() != 2 {
                debug!(id = %entry.id, "skipping venue with {} assets", entry.assets.len());
                continue;
            }
            let (a, b) = (
                self.registry.token_by_address(entry.assets[0]),
                self.registry.token_by_address(entry.assets[1]),
            );
            match (a, b) {
                (Some(a), Some(b)) => exchanges.push(Exchange {
                    id: entry.id,
                    provider: entry.provider,
                    assets: [a.clone(), b.clone()],
                }),
                _ => {
                    debug!(id = %entry.id, "skipping venue with unregistered asset");
                }
            }
        }

        Ok(exchanges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CELO_MAINNET;
    use crate::mocks::MockChainClient;
    use alloy::primitives::{Address, B256};

    #[tokio::test]
    async fn test_unknown_assets_are_skipped() {
        let registry = Arc::new(TokenRegistry::for_network(CELO_MAINNET).unwrap());
        let cusd = registry.token("cUSD").unwrap().clone();
        let usdc = registry.token("USDC").unwrap().clone();

        let mock = MockChainClient::new(Address::repeat_byte(0xaa));
        mock.add_exchange(B256::repeat_byte(1), Address::repeat_byte(1), vec![
            cusd.address,
            usdc.address,
        ]);
        // A venue trading an asset the registry does not know
        mock.add_exchange(B256::repeat_byte(2), Address::repeat_byte(1), vec![
            cusd.address,
            Address::repeat_byte(0xff),
        ]);

        let directory = ExchangeDirectory::new(Arc::new(mock), registry);
        let listed = directory.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].is_pair(cusd.address, usdc.address));
    }
}
