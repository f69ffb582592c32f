use alloy::primitives::Address;
use once_cell::sync::Lazy;

// Chain ids
pub const CELO_MAINNET: u64 = 42220;
pub const CELO_ALFAJORES: u64 = 44787;

// Slippage (basis points)
pub const DEFAULT_SLIPPAGE_BPS: u32 = 100; // 1%
pub const MAX_SLIPPAGE_BPS: u32 = 5_000; // 50%
pub const BPS_DENOMINATOR: u32 = 10_000;

// Confirmation handling
pub const DEFAULT_CONFIRM_TIMEOUT_SECS: u64 = 180;
pub const DEFAULT_RECEIPT_POLL_MS: u64 = 2_000;

// Quotes older than this are re-fetched at execution time
pub const DEFAULT_QUOTE_TTL_SECS: u64 = 30;

/// Static token metadata baked in per network.
#[derive(Debug, Clone, Copy)]
pub struct TokenDef {
    pub symbol: &'static str,
    pub address: &'static str,
    pub decimals: u8,
}

// Broker (aggregator execution contract) addresses
pub const MAINNET_BROKER: &str = "0x777A8255cA72412f0d706dc03C9D1987306B4CaD";
pub const ALFAJORES_BROKER: &str = "0xD3Dff18E465bCa6241A244144765b4421Ac14D09";

pub static MAINNET_BROKER_ADDRESS: Lazy<Address> =
    Lazy::new(|| MAINNET_BROKER.parse().expect("static broker address"));
pub static ALFAJORES_BROKER_ADDRESS: Lazy<Address> =
    Lazy::new(|| ALFAJORES_BROKER.parse().expect("static broker address"));

pub const MAINNET_TOKENS: &[TokenDef] = &[
    TokenDef { symbol: "CELO", address: "0x471EcE3750Da237f93B8E339c536989b8978a438", decimals: 18 },
    TokenDef { symbol: "cUSD", address: "0x765DE816845861e75A25fCA122bb6898B8B1282a", decimals: 18 },
    TokenDef { symbol: "cEUR", address: "0xD8763CBa276a3738E6DE85b4b3bF5FDed6D6cA73", decimals: 18 },
    TokenDef { symbol: "cREAL", address: "0xe8537a3d056DA446677B9E9d6c5dB704EaAb4787", decimals: 18 },
    TokenDef { symbol: "USDC", address: "0xcebA9300f2b948710d2653dD7B07f33A8B32118C", decimals: 6 },
    TokenDef { symbol: "USDT", address: "0x48065fbBE25f71C9282ddf5e1cD6D6A887483D5e", decimals: 6 },
];

pub const ALFAJORES_TOKENS: &[TokenDef] = &[
    TokenDef { symbol: "CELO", address: "0xF194afDf50B03e69Bd7D057c1Aa9e10c9954E4C9", decimals: 18 },
    TokenDef { symbol: "cUSD", address: "0x874069Fa1Eb16D44d622F2e0Ca25eeA172369bC1", decimals: 18 },
    TokenDef { symbol: "cEUR", address: "0x10c892A6EC43a53E45D0B916B4b7D383B1b78C0F", decimals: 18 },
    TokenDef { symbol: "cREAL", address: "0xE4D517785D091D3c54818832dB6094bcc2744545", decimals: 18 },
    TokenDef { symbol: "USDC", address: "0x2F25deB3848C207fc8E0c34035B3Ba7fC157602B", decimals: 6 },
];

/// Token table for a network, if supported.
pub fn tokens_for_network(chain_id: u64) -> Option<&'static [TokenDef]> {
    match chain_id {
        CELO_MAINNET => Some(MAINNET_TOKENS),
        CELO_ALFAJORES => Some(ALFAJORES_TOKENS),
        _ => None,
    }
}

/// Broker address for a network, if supported.
pub fn broker_for_network(chain_id: u64) -> Option<Address> {
    match chain_id {
        CELO_MAINNET => Some(*MAINNET_BROKER_ADDRESS),
        CELO_ALFAJORES => Some(*ALFAJORES_BROKER_ADDRESS),
        _ => None,
    }
}
