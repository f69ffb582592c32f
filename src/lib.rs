pub mod blockchain;
pub mod config;
pub mod constants;
pub mod errors;
pub mod mocks;
pub mod registry;
pub mod swap;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use errors::SwapError;
pub use registry::TokenRegistry;
pub use swap::{ExecutorSettings, SwapExecutor, SwapProposal};
pub use types::{RemittanceStatus, SwapResult, SwapState, TradablePair};
