use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::SolCall;

use crate::blockchain::abi::{IBroker, ILegacyBroker};

/// Everything needed to encode one leg's broker invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapLegParams {
    pub provider: Address,
    pub exchange_id: B256,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: U256,
    pub min_amount_out: U256,
}

/// One candidate call shape for the broker's swap entrypoint.
///
/// The executor tries encoders in priority order; a shape rejected before
/// broadcast moves on to the next. Encoders are pure so negotiation can be
/// tested without a chain.
pub trait SwapCallEncoder: Send + Sync {
    /// Full signature string, used in the `UnknownCallSignature` diagnostic.
    fn name(&self) -> &'static str;

    fn encode(&self, params: &SwapLegParams) -> Vec<u8>;
}

/// Primary shape: swapIn(provider, exchangeId, tokenIn, tokenOut, amountIn, amountOutMin).
pub struct BrokerSwapInEncoder;

impl SwapCallEncoder for BrokerSwapInEncoder {
    fn name(&self) -> &'static str {
        "swapIn(address,bytes32,address,address,uint256,uint256)"
    }

    fn encode(&self, params: &SwapLegParams) -> Vec<u8> {
        IBroker::swapInCall {
            exchangeProvider: params.provider,
            exchangeId: params.exchange_id,
            tokenIn: params.token_in,
            tokenOut: params.token_out,
            amountIn: params.amount_in,
            amountOutMin: params.min_amount_out,
        }
        .abi_encode()
    }
}

/// Fallback shape used by older broker deployments, without the provider
/// address.
pub struct LegacySwapInEncoder;

impl SwapCallEncoder for LegacySwapInEncoder {
    fn name(&self) -> &'static str {
        "swapIn(bytes32,address,address,uint256,uint256)"
    }

    fn encode(&self, params: &SwapLegParams) -> Vec<u8> {
        ILegacyBroker::swapInCall {
            exchangeId: params.exchange_id,
            tokenIn: params.token_in,
            tokenOut: params.token_out,
            amountIn: params.amount_in,
            amountOutMin: params.min_amount_out,
        }
        .abi_encode()
    }
}

/// The negotiation order: primary signature first, then the legacy shape.
pub fn default_encoders() -> Vec<Box<dyn SwapCallEncoder>> {
    vec![Box::new(BrokerSwapInEncoder), Box::new(LegacySwapInEncoder)]
}
