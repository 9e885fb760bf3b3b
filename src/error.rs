//! Structured error types for the kernel engine and the validation facade.

use crate::hash::Hash256;
use thiserror::Error;

/// Errors surfaced by the stake-modifier engine, the kernel predicate, and the
/// retarget routines. Block-level consensus failures (as opposed to programmer
/// errors) are rejections, not panics — every variant here is returned, never
/// `unwrap`'d, on untrusted input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KernelError {
    #[error("null block index")]
    NullBlockIndex,

    #[error("no generating ancestor found while computing stake modifier")]
    NoGeneratingAncestor,

    #[error("timestamp {time_tx} precedes previous transaction time {time_tx_prev}")]
    NtimeViolation { time_tx: i64, time_tx_prev: i64 },

    #[error("coin age at {time_tx} is below stake-min-age (from block time {block_from_time})")]
    MinAgeViolation {
        time_tx: i64,
        block_from_time: i64,
    },

    #[error("stake modifier not yet available for timestamp {time_tx}")]
    StakeModifierNotYetAvailable { time_tx: i64 },

    #[error("compact target {compact:#010x} is negative, zero, or overflowing")]
    CompactEncodingInvalid { compact: u32 },

    #[error("empty candidate set for stake-modifier selection round {round}")]
    EmptySelectionRound { round: u32 },

    #[error("output index {index} out of range for previous transaction with {len} outputs")]
    PrevoutIndexOutOfRange { index: u32, len: usize },

    #[error("kernel hash {kernel_hash} exceeds coin-day-weighted target")]
    KernelTargetNotMet { kernel_hash: Hash256 },
}

/// Errors surfaced by the `CheckProofOfStake` validation facade (component G).
/// Hand-written `Display` rather than `#[derive(thiserror::Error)]`: the variant
/// set mixes plain signals and contextual payloads and reads better as explicit
/// per-arm messages than as templated ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NotCoinstake,
    TxIndexMissing,
    TxPosNotFound { txid: Hash256 },
    IoError(String),
    TxIdMismatch { expected: Hash256, found: Hash256 },
    InvalidPosScript,
    CheckKernelFailed(KernelError),
    CoinstakeTimestampMismatch { block_time: i64, tx_time: i64 },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::NotCoinstake => write!(f, "transaction is not a coinstake"),
            ValidationError::TxIndexMissing => {
                write!(f, "transaction index unavailable for previous-output lookup")
            }
            ValidationError::TxPosNotFound { txid } => {
                write!(f, "previous transaction {txid} not found in transaction index")
            }
            ValidationError::IoError(msg) => write!(f, "i/o error reading block storage: {msg}"),
            ValidationError::TxIdMismatch { expected, found } => write!(
                f,
                "previous transaction id mismatch: expected {expected}, read {found}"
            ),
            ValidationError::InvalidPosScript => {
                write!(f, "proof-of-stake input script failed verification")
            }
            ValidationError::CheckKernelFailed(inner) => {
                write!(f, "kernel check failed: {inner}")
            }
            ValidationError::CoinstakeTimestampMismatch {
                block_time,
                tx_time,
            } => write!(
                f,
                "coinstake timestamp {tx_time} does not match block time {block_time}"
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<KernelError> for ValidationError {
    fn from(e: KernelError) -> Self {
        ValidationError::CheckKernelFailed(e)
    }
}
