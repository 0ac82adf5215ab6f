//! Typed errors for the mining core.

use thiserror::Error;

/// Errors raised by the encoder, miner, rule generator and aggregator.
#[derive(Debug, Error)]
pub enum MiningError {
    #[error("invalid transaction at index {index}: {reason}")]
    InvalidInput { index: usize, reason: String },

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("support for itemset {{{0}}} was never computed")]
    MissingSupport(String),
}
