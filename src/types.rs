use alloy::primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::SwapError;

/// Swappable asset metadata, sourced from the token registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// One liquidity venue on the aggregator: a venue id, the provider contract
/// that hosts it, and exactly two participating assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub id: B256,
    pub provider: Address,
    pub assets: [Token; 2],
}

impl Exchange {
    pub fn has_asset(&self, address: Address) -> bool {
        self.assets[0].address == address || self.assets[1].address == address
    }

    /// The venue's other asset, given one of its two assets.
    pub fn other_asset(&self, address: Address) -> Option<&Token> {
        if self.assets[0].address == address {
            Some(&self.assets[1])
        } else if self.assets[1].address == address {
            Some(&self.assets[0])
        } else {
            None
        }
    }

    /// True when the venue trades exactly this pair, in either order.
    pub fn is_pair(&self, a: Address, b: Address) -> bool {
        (self.assets[0].address == a && self.assets[1].address == b)
            || (self.assets[0].address == b && self.assets[1].address == a)
    }
}

/// A resolved route: one venue (direct) or two venues sharing a single
/// intermediate asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradablePair {
    pub source: Token,
    pub dest: Token,
    pub path: Vec<Exchange>,
}

impl TradablePair {
    pub fn is_direct(&self) -> bool {
        self.path.len() == 1
    }

    /// The shared asset between the two legs of a 2-hop route.
    pub fn intermediate(&self) -> Option<&Token> {
        if self.path.len() != 2 {
            return None;
        }
        self.path[0].other_asset(self.source.address)
    }
}

/// Per-leg simulated quote. Ephemeral: recomputed per attempt, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub exchange: Exchange,
    pub token_in: Token,
    pub token_out: Token,
    pub amount_in: U256,
    pub amount_out: U256,
    pub slippage_bps: u32,
    pub min_amount_out: U256,
    pub quoted_at: DateTime<Utc>,
}

/// Slippage floor: floor(amount_out * (10000 - slippage_bps) / 10000).
pub fn min_amount_out(amount_out: U256, slippage_bps: u32) -> U256 {
    let bps = slippage_bps.min(crate::constants::BPS_DENOMINATOR);
    amount_out * U256::from(crate::constants::BPS_DENOMINATOR - bps)
        / U256::from(crate::constants::BPS_DENOMINATOR)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegStatus {
    Pending,
    Approving,
    Submitted,
    Confirmed,
    Reverted,
}

impl std::fmt::Display for LegStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LegStatus::Pending => "Pending",
            LegStatus::Approving => "Approving",
            LegStatus::Submitted => "Submitted",
            LegStatus::Confirmed => "Confirmed",
            LegStatus::Reverted => "Reverted",
        };
        write!(f, "{}", s)
    }
}

/// One atomic on-chain swap within a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapLeg {
    pub exchange: Exchange,
    pub token_in: Token,
    pub token_out: Token,
    pub amount_in: U256,
    pub min_amount_out: U256,
    pub tx_hash: Option<B256>,
    pub status: LegStatus,
    /// On-chain output observed after confirmation; feeds the next leg.
    pub settled_out: Option<U256>,
}

impl SwapLeg {
    pub fn from_quote(quote: &Quote) -> Self {
        Self {
            exchange: quote.exchange.clone(),
            token_in: quote.token_in.clone(),
            token_out: quote.token_out.clone(),
            amount_in: quote.amount_in,
            min_amount_out: quote.min_amount_out,
            tx_hash: None,
            status: LegStatus::Pending,
            settled_out: None,
        }
    }
}

/// The full execution plan for one swap attempt.
///
/// Invariant: legs[i].token_out == legs[i+1].token_in; legs[0].token_in is
/// the source token and the last leg's token_out is the destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapPlan {
    pub legs: Vec<SwapLeg>,
    pub initiator: Address,
    pub recipient: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapState {
    /// All legs confirmed (and remittance attempted, if required).
    Completed,
    /// At least one leg confirmed, a later step failed. The initiator now
    /// holds an intermediate asset.
    PartiallyCompleted,
    /// The first leg never confirmed; nothing settled.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RemittanceStatus {
    /// Recipient equals initiator; no transfer needed.
    NotRequired,
    /// The plan ended before the final leg settled, so no transfer was made.
    Skipped,
    Completed { tx_hash: B256 },
    /// The swap itself stays settled; only the transfer must be retried.
    Failed { reason: String },
}

/// Terminal outcome of one swap attempt, returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapResult {
    pub state: SwapState,
    pub legs: Vec<SwapLeg>,
    pub initiator: Address,
    pub recipient: Address,
    /// Final settled output in human units (destination token decimals).
    pub amount_out: Option<Decimal>,
    pub remittance: RemittanceStatus,
    pub error: Option<SwapError>,
}

impl SwapResult {
    /// Index of the last confirmed leg, if any.
    pub fn last_confirmed_leg(&self) -> Option<usize> {
        self.legs
            .iter()
            .rposition(|leg| leg.status == LegStatus::Confirmed)
    }

    /// The asset and base-unit amount the initiator was left holding when the
    /// plan stopped short, so callers can always tell where funds are.
    pub fn stranded_asset(&self) -> Option<(&Token, U256)> {
        if self.state != SwapState::PartiallyCompleted {
            return None;
        }
        let idx = self.last_confirmed_leg()?;
        let leg = &self.legs[idx];
        Some((&leg.token_out, leg.settled_out.unwrap_or(leg.min_amount_out)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(sym: &str, last_byte: u8, decimals: u8) -> Token {
        let mut bytes = [0u8; 20];
        bytes[19] = last_byte;
        Token {
            address: Address::from_slice(&bytes),
            symbol: sym.to_string(),
            decimals,
        }
    }

    fn exchange(id_byte: u8, a: Token, b: Token) -> Exchange {
        let mut id = [0u8; 32];
        id[31] = id_byte;
        Exchange {
            id: B256::from_slice(&id),
            provider: Address::ZERO,
            assets: [a, b],
        }
    }

    #[test]
    fn test_min_amount_out_floor() {
        // 1% slippage on 1_000_003 floors to 990_002
        let out = min_amount_out(U256::from(1_000_003u64), 100);
        assert_eq!(out, U256::from(990_002u64));

        // zero slippage is identity
        assert_eq!(min_amount_out(U256::from(42u64), 0), U256::from(42u64));
    }

    #[test]
    fn test_exchange_pair_matching() {
        let cusd = token("cUSD", 1, 18);
        let usdc = token("USDC", 2, 6);
        let ex = exchange(1, cusd.clone(), usdc.clone());

        assert!(ex.is_pair(cusd.address, usdc.address));
        assert!(ex.is_pair(usdc.address, cusd.address));
        assert!(ex.has_asset(cusd.address));
        assert_eq!(ex.other_asset(cusd.address), Some(&usdc));
        assert_eq!(ex.other_asset(Address::ZERO), None);
    }

    #[test]
    fn test_intermediate_of_two_hop() {
        let cusd = token("cUSD", 1, 18);
        let celo = token("CELO", 2, 18);
        let ceur = token("cEUR", 3, 18);
        let pair = TradablePair {
            source: cusd.clone(),
            dest: ceur.clone(),
            path: vec![
                exchange(1, cusd.clone(), celo.clone()),
                exchange(2, celo.clone(), ceur.clone()),
            ],
        };
        assert!(!pair.is_direct());
        assert_eq!(pair.intermediate(), Some(&celo));
    }
}
