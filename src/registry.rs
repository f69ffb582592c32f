use std::collections::HashMap;
use std::str::FromStr;

use alloy::primitives::{Address, U256};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::constants;
use crate::errors::SwapError;
use crate::types::Token;

/// Static per-network token metadata, indexed by symbol and address.
///
/// Every amount conversion in the engine goes through here so that each
/// token's own declared decimals are used. The swappable assets on these
/// networks mix 18- and 6-decimal tokens; a fixed decimal count is never
/// assumed for both sides of a pair.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    chain_id: u64,
    by_symbol: HashMap<String, Token>,
    by_address: HashMap<Address, Token>,
}

impl TokenRegistry {
    /// Build the registry for a supported network.
    pub fn for_network(chain_id: u64) -> Result<Self, SwapError> {
        let defs = constants::tokens_for_network(chain_id)
            .ok_or_else(|| SwapError::Config(format!("unsupported network: {}", chain_id)))?;

        let mut by_symbol = HashMap::new();
        let mut by_address = HashMap::new();
        for def in defs {
            let address = Address::from_str(def.address).map_err(|e| {
                SwapError::Config(format!("bad address for {}: {}", def.symbol, e))
            })?;
            let token = Token {
                address,
                symbol: def.symbol.to_string(),
                decimals: def.decimals,
            };
            by_symbol.insert(def.symbol.to_string(), token.clone());
            by_address.insert(address, token);
        }

        Ok(Self {
            chain_id,
            by_symbol,
            by_address,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn token(&self, symbol: &str) -> Result<&Token, SwapError> {
        self.by_symbol
            .get(symbol)
            .ok_or_else(|| SwapError::UnknownToken(symbol.to_string()))
    }

    pub fn token_by_address(&self, address: Address) -> Option<&Token> {
        self.by_address.get(&address)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.by_symbol.values()
    }

    /// Human units -> base units, scaled by this token's declared decimals.
    /// Fractional dust below one base unit is truncated.
    pub fn to_base_units(amount: Decimal, token: &Token) -> Result<U256, SwapError> {
        if amount.is_sign_negative() {
            return Err(SwapError::InvalidAmount(format!(
                "negative amount: {} {}",
                amount, token.symbol
            )));
        }
        let scale = Decimal::from(10u64.pow(token.decimals as u32));
        let scaled = amount.checked_mul(scale).ok_or_else(|| {
            SwapError::InvalidAmount(format!("amount overflow: {} {}", amount, token.symbol))
        })?;
        let base = scaled.trunc().to_u128().ok_or_else(|| {
            SwapError::InvalidAmount(format!("amount out of range: {} {}", amount, token.symbol))
        })?;
        Ok(U256::from(base))
    }

    /// Base units -> human units for display and result reporting.
    pub fn from_base_units(amount: U256, token: &Token) -> Result<Decimal, SwapError> {
        let raw: u128 = amount.try_into().map_err(|_| {
            SwapError::InvalidAmount(format!("base amount too large for {}", token.symbol))
        })?;
        if raw > i128::MAX as u128 {
            return Err(SwapError::InvalidAmount(format!(
                "base amount too large for {}",
                token.symbol
            )));
        }
        Ok(Decimal::from_i128_with_scale(raw as i128, token.decimals as u32).normalize())
    }
}
