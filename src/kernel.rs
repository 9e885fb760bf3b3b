//! Kernel hash predicate (component D): binds a coin, a stake modifier, and a
//! candidate timestamp to a coin-day-weighted target comparison.

use crate::bignum::{BigNum, Target256};
use crate::block_index::{BlockHeader, BlockIndexNode, OutPoint, Transaction};
use crate::error::KernelError;
use crate::hash::{Hash256, LeBuf};
use crate::params::ConsensusParams;
use crate::stake_modifier::get_kernel_stake_modifier_v05;
use std::sync::Arc;

pub struct KernelCheckOutcome {
    pub kernel_hash: Hash256,
}

/// `CheckStakeKernelHash` (§4.4).
#[allow(clippy::too_many_arguments)]
pub fn check_stake_kernel_hash(
    bits: u32,
    prev_index: &Arc<BlockIndexNode>,
    block_from: &BlockHeader,
    tx_prev_offset: u32,
    tx_prev: &Transaction,
    prevout: &OutPoint,
    time_tx: i64,
    params: &ConsensusParams,
) -> Result<KernelCheckOutcome, KernelError> {
    let time_tx_prev = if tx_prev.n_time != 0 {
        tx_prev.n_time as i64
    } else {
        block_from.time
    };

    if time_tx < time_tx_prev {
        return Err(KernelError::NtimeViolation {
            time_tx,
            time_tx_prev,
        });
    }
    if block_from.time + params.stake_min_age > time_tx {
        return Err(KernelError::MinAgeViolation {
            time_tx,
            block_from_time: block_from.time,
        });
    }

    let output = tx_prev
        .outputs
        .get(prevout.index as usize)
        .ok_or(KernelError::PrevoutIndexOutOfRange {
            index: prevout.index,
            len: tx_prev.outputs.len(),
        })?;
    let value = output.value;

    let time_weight = (time_tx - time_tx_prev).min(params.stake_max_age) - params.stake_min_age;
    let coin_day_weight = if time_weight <= 0 || value == 0 {
        0i64
    } else {
        // value * timeWeight / COIN / 86400, integer truncating.
        ((value as i128 * time_weight as i128) / params.coin as i128 / 86_400) as i64
    };

    let (target_per_coin_day, negative, overflow) = Target256::from_compact(bits);
    if negative || overflow {
        return Err(KernelError::CompactEncodingInvalid { compact: bits });
    }

    let kernel_mod = get_kernel_stake_modifier_v05(prev_index, time_tx, params)?;

    let kernel_hash = LeBuf::new()
        .u64(kernel_mod.modifier)
        .u32(block_from.time as u32)
        .u32(tx_prev_offset)
        .u32(time_tx_prev as u32)
        .u32(prevout.index)
        .u32(time_tx as u32)
        .sha256d();

    let target = BigNum::coin_day_product(&target_per_coin_day, coin_day_weight.max(0) as u64);

    if target.ge_hash(&kernel_hash) {
        Ok(KernelCheckOutcome { kernel_hash })
    } else {
        Err(kernel_rejected(kernel_hash))
    }
}

fn kernel_rejected(kernel_hash: Hash256) -> KernelError {
    KernelError::KernelTargetNotMet { kernel_hash }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_index::TxOut;
    use crate::test_support::default_params;

    fn sample_block_from(time: i64) -> BlockHeader {
        BlockHeader {
            version: 1,
            prev_block_hash: Hash256::ZERO,
            merkle_root: Hash256::ZERO,
            time,
            bits: 0x1d00ffff,
        }
    }

    fn sample_tx_prev(value: u64, n_time: u32) -> Transaction {
        Transaction {
            version: 1,
            n_time,
            inputs: vec![],
            outputs: vec![TxOut {
                value,
                script_pubkey: vec![],
            }],
            lock_time: 0,
            is_coinstake: false,
        }
    }

    fn genesis_prev_index(params: &ConsensusParams) -> Arc<BlockIndexNode> {
        Arc::new(BlockIndexNode::genesis(params.genesis_hash, 0, 0x1d00ffff))
    }

    #[test]
    fn rejects_ntime_violation() {
        let params = default_params();
        let block_from = sample_block_from(1000);
        let tx_prev = sample_tx_prev(100 * params.coin, 2000);
        let prev_index = genesis_prev_index(&params);

        let err = check_stake_kernel_hash(
            0x1d00ffff,
            &prev_index,
            &block_from,
            0,
            &tx_prev,
            &OutPoint {
                txid: Hash256::ZERO,
                index: 0,
            },
            1999,
            &params,
        )
        .unwrap_err();
        assert!(matches!(err, KernelError::NtimeViolation { .. }));
    }

    #[test]
    fn rejects_min_age_violation_at_boundary_minus_one() {
        let params = default_params();
        let block_from = sample_block_from(1000);
        let tx_prev = sample_tx_prev(100 * params.coin, 0);
        let prev_index = genesis_prev_index(&params);

        let time_tx = 1000 + params.stake_min_age - 1;
        let err = check_stake_kernel_hash(
            0x1d00ffff,
            &prev_index,
            &block_from,
            0,
            &tx_prev,
            &OutPoint {
                txid: Hash256::ZERO,
                index: 0,
            },
            time_tx,
            &params,
        )
        .unwrap_err();
        assert!(matches!(err, KernelError::MinAgeViolation { .. }));
    }

    #[test]
    fn zero_value_never_satisfies_predicate() {
        let params = default_params();
        let block_from = sample_block_from(1000);
        let tx_prev = sample_tx_prev(0, 0);
        let prev_index = genesis_prev_index(&params);
        let time_tx = 1000 + params.stake_min_age;

        let err = check_stake_kernel_hash(
            0x1d00ffff,
            &prev_index,
            &block_from,
            0,
            &tx_prev,
            &OutPoint {
                txid: Hash256::ZERO,
                index: 0,
            },
            time_tx,
            &params,
        )
        .unwrap_err();
        assert!(matches!(err, KernelError::KernelTargetNotMet { .. }));
    }

    #[test]
    fn out_of_range_prevout_index_is_rejected() {
        let params = default_params();
        let block_from = sample_block_from(1000);
        let tx_prev = sample_tx_prev(100 * params.coin, 0);
        let prev_index = genesis_prev_index(&params);
        let time_tx = 1000 + params.stake_min_age;

        let err = check_stake_kernel_hash(
            0x1d00ffff,
            &prev_index,
            &block_from,
            0,
            &tx_prev,
            &OutPoint {
                txid: Hash256::ZERO,
                index: 5,
            },
            time_tx,
            &params,
        )
        .unwrap_err();
        assert!(matches!(err, KernelError::PrevoutIndexOutOfRange { .. }));
    }
}
