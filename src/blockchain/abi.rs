use alloy::sol;

// Aggregator execution/quoting contract ("broker"). The swapIn shape here is
// the primary call signature; see ILegacyBroker for the negotiated fallback.
sol! {
    #[sol(rpc)]
    interface IBroker {
        function getExchangeProviders() external view returns (address[] memory);

        function getAmountOut(
            address exchangeProvider,
            bytes32 exchangeId,
            address tokenIn,
            address tokenOut,
            uint256 amountIn
        ) external view returns (uint256 amountOut);

        function swapIn(
            address exchangeProvider,
            bytes32 exchangeId,
            address tokenIn,
            address tokenOut,
            uint256 amountIn,
            uint256 amountOutMin
        ) external returns (uint256 amountOut);
    }
}

// Older broker deployments take the venue id without the provider address.
sol! {
    interface ILegacyBroker {
        function swapIn(
            bytes32 exchangeId,
            address tokenIn,
            address tokenOut,
            uint256 amountIn,
            uint256 amountOutMin
        ) external returns (uint256 amountOut);
    }
}

// One liquidity-provider contract; each venue trades exactly two assets.
sol! {
    #[sol(rpc)]
    interface IExchangeProvider {
        struct Exchange {
            bytes32 exchangeId;
            address[] assets;
        }

        function getExchanges() external view returns (Exchange[] memory exchanges);
    }
}

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address to, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
    }
}

/// Function surface of the broker ABI this crate was built against. Used for
/// the diagnostic reported when every negotiated call shape is rejected.
pub const BROKER_FUNCTION_NAMES: &[&str] = &[
    "getExchangeProviders",
    "getAmountOut",
    "getAmountIn",
    "swapIn",
    "swapOut",
];
