use std::sync::Arc;

use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::blockchain::ChainClient;
use crate::errors::SwapError;
use crate::types::{min_amount_out, Quote, Token, TradablePair};

/// Quotes for every leg of a route, chained in order: leg i's simulated
/// output is leg i+1's input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSet {
    pub legs: Vec<Quote>,
    pub amount_in: U256,
    /// Simulated output of the final leg.
    pub expected_out: U256,
    /// Slippage-adjusted floor on the final leg's output.
    pub min_final_out: U256,
    pub slippage_bps: u32,
    pub quoted_at: DateTime<Utc>,
}

impl QuoteSet {
    /// Whether the quotes are older than the given TTL and should be
    /// refreshed before anything is broadcast.
    pub fn is_stale(&self, ttl_secs: u64) -> bool {
        let age = Utc::now().signed_duration_since(self.quoted_at);
        age.num_seconds() >= ttl_secs as i64
    }
}

/// Simulates route output via the broker's quote function.
pub struct QuoteEngine {
    client: Arc<dyn ChainClient>,
}

impl QuoteEngine {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self { client }
    }

    /// Quote every leg of the route for `amount_in` base units of the source
    /// token. Fails with `QuoteFailed` if any leg's simulation reverts or
    /// returns zero.
    pub async fn quote_pair(
        &self,
        pair: &TradablePair,
        amount_in: U256,
        slippage_bps: u32,
    ) -> Result<QuoteSet, SwapError> {
        if amount_in.is_zero() {
            return Err(SwapError::InvalidAmount("zero input amount".to_string()));
        }

        let quoted_at = Utc::now();
        let mut legs = Vec::with_capacity(pair.path.len());
        let mut token_in: &Token = &pair.source;
        let mut leg_amount_in = amount_in;

        for exchange in &pair.path {
            let token_out = exchange.other_asset(token_in.address).ok_or_else(|| {
                SwapError::QuoteFailed {
                    token_in: token_in.symbol.clone(),
                    token_out: pair.dest.symbol.clone(),
                    reason: format!("venue {} does not trade {}", exchange.id, token_in.symbol),
                }
            })?;

            let amount_out = self
                .client
                .quote_out(
                    exchange.provider,
                    exchange.id,
                    token_in.address,
                    token_out.address,
                    leg_amount_in,
                )
                .await
                .map_err(|e| SwapError::QuoteFailed {
                    token_in: token_in.symbol.clone(),
                    token_out: token_out.symbol.clone(),
                    reason: e.to_string(),
                })?;

            if amount_out.is_zero() {
                return Err(SwapError::QuoteFailed {
                    token_in: token_in.symbol.clone(),
                    token_out: token_out.symbol.clone(),
                    reason: "simulation returned zero output".to_string(),
                });
            }

            let min_out = min_amount_out(amount_out, slippage_bps);
            debug!(
                exchange = %exchange.id,
                %leg_amount_in,
                %amount_out,
                %min_out,
                "{} -> {} quoted",
                token_in.symbol,
                token_out.symbol
            );

            legs.push(Quote {
                exchange: exchange.clone(),
                token_in: token_in.clone(),
                token_out: token_out.clone(),
                amount_in: leg_amount_in,
                amount_out,
                slippage_bps,
                min_amount_out: min_out,
                quoted_at,
            });

            leg_amount_in = amount_out;
            token_in = token_out;
        }

        // the chained path must end at the destination token
        if token_in.address != pair.dest.address {
            return Err(SwapError::QuoteFailed {
                token_in: pair.source.symbol.clone(),
                token_out: pair.dest.symbol.clone(),
                reason: "route does not terminate at destination token".to_string(),
            });
        }

        let last = legs.last().ok_or_else(|| SwapError::QuoteFailed {
            token_in: pair.source.symbol.clone(),
            token_out: pair.dest.symbol.clone(),
            reason: "empty route".to_string(),
        })?;

        Ok(QuoteSet {
            expected_out: last.amount_out,
            min_final_out: last.min_amount_out,
            amount_in,
            slippage_bps,
            quoted_at,
            legs,
        })
    }
}

impl Default for QuoteSet {
    fn default() -> Self {
        Self {
            legs: Vec::new(),
            amount_in: U256::ZERO,
            expected_out: U256::ZERO,
            min_final_out: U256::ZERO,
            slippage_bps: 0,
            quoted_at: Utc::now(),
        }
    }
}
