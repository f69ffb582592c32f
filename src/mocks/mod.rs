pub mod chain_mock;

pub use chain_mock::MockChainClient;
