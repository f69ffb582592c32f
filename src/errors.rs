use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// Swap engine error taxonomy.
///
/// `NoRouteFound` and `QuoteFailed` are raised before anything is broadcast
/// and are safe to retry with a fresh route/quote. Everything from
/// `ApprovalReverted` onward can leave settled legs behind; those are
/// surfaced through `SwapResult`, never silently discarded.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum SwapError {
    // The field can't be named `source`: thiserror would infer it as the
    // error source and require `String: std::error::Error`.
    #[error("no trading route from {source_token} to {dest}")]
    NoRouteFound {
        #[serde(rename = "source")]
        source_token: String,
        dest: String,
    },

    #[error("quote failed for {token_in} -> {token_out}: {reason}")]
    QuoteFailed {
        token_in: String,
        token_out: String,
        reason: String,
    },

    #[error("approval of {token} reverted (tx: {tx_hash})")]
    ApprovalReverted { token: String, tx_hash: B256 },

    /// The broker rejected a candidate call before broadcast (ABI mismatch,
    /// estimation revert). Triggers the next invocation adapter.
    #[error("broker rejected swap call: {reason}")]
    CallRejected { reason: String },

    /// Every negotiated call shape was rejected. Carries the signatures we
    /// attempted and the function names the broker ABI declares.
    #[error("no known swap call signature accepted (tried: {attempted:?}, broker exposes: {available:?})")]
    UnknownCallSignature {
        attempted: Vec<String>,
        available: Vec<String>,
    },

    #[error("swap leg {leg} reverted on-chain (tx: {tx_hash})")]
    SwapReverted { leg: usize, tx_hash: B256 },

    #[error("remittance to {recipient} failed: {reason}")]
    RemittanceFailed { recipient: Address, reason: String },

    #[error("timed out after {seconds}s waiting for confirmation of {tx_hash}")]
    ConfirmationTimeout { tx_hash: B256, seconds: u64 },

    #[error("unknown token: {0}")]
    UnknownToken(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("rpc error: {0}")]
    Rpc(String),
}

impl SwapError {
    /// True when the error occurred before any transaction was broadcast,
    /// so a full retry is safe.
    pub fn is_retry_safe(&self) -> bool {
        matches!(
            self,
            SwapError::NoRouteFound { .. }
                | SwapError::QuoteFailed { .. }
                | SwapError::UnknownToken(_)
                | SwapError::InvalidAmount(_)
                | SwapError::Config(_)
        )
    }
}
