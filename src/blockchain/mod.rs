pub mod abi;
pub mod client;
pub mod live;

pub use client::{await_receipt, ChainClient, ChainReader, ChainWriter, RawExchange, TxStatus};
pub use live::LiveChainClient;
