//! Stake modifier engine (component C): the 64-round deterministic selection
//! of historical blocks that produces the 64-bit stake modifier, the V0.5 and
//! V0.3 kernel-modifier lookups, and the modifier checkpoint/checksum machinery.

use crate::block_index::BlockIndexNode;
use crate::collaborators::{ChainView, ClockAdjusted, Random};
use crate::consensus_helpers::entropy_bit;
use crate::error::KernelError;
use crate::hash::{Hash256, LeBuf};
use crate::params::{ConsensusParams, MODIFIER_SELECTION_ROUNDS};
use std::sync::Arc;

/// Result of `compute_next_stake_modifier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextModifier {
    pub modifier: u64,
    pub generated: bool,
}

/// Walks from `start` backward (inclusive) to the most recent ancestor with
/// `GENERATED_STAKE_MODIFIER` set.
fn last_generating_ancestor(start: &Arc<BlockIndexNode>) -> Option<Arc<BlockIndexNode>> {
    let mut cur = Some(start.clone());
    loop {
        let node = cur?;
        if node.generated_stake_modifier() {
            return Some(node);
        }
        cur = node.prev().cloned();
    }
}

/// Candidates for a modifier computation: every ancestor of `prev` (inclusive)
/// with `block_time >= start_time`, walking back until the bound is no longer
/// satisfied (ancestors are time-monotonic, so this is a straightforward
/// iterative prefix walk, not a full-index scan).
fn candidates_since(prev: &Arc<BlockIndexNode>, start_time: i64) -> Vec<Arc<BlockIndexNode>> {
    let mut out = Vec::new();
    let mut cur = Some(prev.clone());
    while let Some(node) = cur {
        if node.block_time < start_time {
            break;
        }
        cur = node.prev().cloned();
        out.push(node);
    }
    out
}

/// Performs the reference implementation's in-place shuffle of all but the
/// first two elements. Consensus-neutral by construction: the subsequent sort
/// comparator (`block_time`, then full-hash magnitude) is a total order, so
/// the pre-shuffle permutation cannot change the final ordering. Preserved
/// only for bit-for-bit behavioral parity with the original log output.
fn shuffle_except_first_two(items: &mut [Arc<BlockIndexNode>], rng: &mut dyn Random) {
    let len = items.len();
    if len < 3 {
        return;
    }
    for i in (2..len).rev() {
        let j = rng.below((i + 1) as u64) as usize;
        items.swap(i, j);
    }
}

fn sort_candidates(items: &mut [Arc<BlockIndexNode>]) {
    items.sort_by(|a, b| {
        a.block_time
            .cmp(&b.block_time)
            .then_with(|| a.block_hash.cmp(&b.block_hash))
    });
}

/// `ComputeNextStakeModifier` (§4.3.2).
pub fn compute_next_stake_modifier(
    cur: &Arc<BlockIndexNode>,
    params: &ConsensusParams,
    rng: &mut dyn Random,
) -> Result<NextModifier, KernelError> {
    let prev = match cur.prev() {
        None => {
            return Ok(NextModifier {
                modifier: 0,
                generated: true,
            })
        }
        Some(p) => p.clone(),
    };

    let generating_ancestor =
        last_generating_ancestor(&prev).ok_or(KernelError::NoGeneratingAncestor)?;
    let prev_modifier = generating_ancestor.stake_modifier;
    let prev_mod_time = generating_ancestor.block_time;

    let epoch_prev_mod = params.epoch(prev_mod_time);
    if epoch_prev_mod >= params.epoch(prev.block_time) || epoch_prev_mod >= params.epoch(cur.block_time) {
        return Ok(NextModifier {
            modifier: prev_modifier,
            generated: false,
        });
    }

    let selection_interval = params.selection_interval();
    let start_time = params.epoch(prev.block_time) * params.modifier_interval - selection_interval;

    let mut candidates = candidates_since(&prev, start_time);
    shuffle_except_first_two(&mut candidates, rng);
    sort_candidates(&mut candidates);

    let mut selected: Vec<bool> = vec![false; candidates.len()];
    let mut new_modifier: u64 = 0;
    let mut selection_stop = start_time;

    let rounds = candidates.len().min(MODIFIER_SELECTION_ROUNDS as usize) as u32;
    for round in 0..rounds {
        selection_stop += params.selection_interval_section(round);

        let mut best: Option<usize> = None;
        let mut best_hash: Option<Hash256> = None;

        for (idx, node) in candidates.iter().enumerate() {
            if selected[idx] {
                continue;
            }
            if node.block_time > selection_stop {
                continue;
            }
            let mut selection_hash =
                LeBuf::new().hash(&node.proof_hash()).u64(prev_modifier).sha256d();
            if node.is_proof_of_stake() {
                selection_hash = shift_right_32(selection_hash);
            }
            if best_hash.is_none() || selection_hash < best_hash.unwrap() {
                best_hash = Some(selection_hash);
                best = Some(idx);
            }
        }

        let winner_idx = best.ok_or(KernelError::EmptySelectionRound { round })?;
        selected[winner_idx] = true;
        let winner = &candidates[winner_idx];
        new_modifier |= (entropy_bit(winner) as u64) << round;
    }

    Ok(NextModifier {
        modifier: new_modifier,
        generated: true,
    })
}

/// Right-shifts a 256-bit hash (big-endian magnitude) by 32 bits, used to bias
/// PoS candidates toward winning a selection round.
fn shift_right_32(hash: Hash256) -> Hash256 {
    let be = hash.as_be_bytes();
    let mut shifted = [0u8; 32];
    shifted[4..].copy_from_slice(&be[..28]);
    // Re-encode as the internal little-endian-limb storage `Hash256` expects.
    let mut internal = shifted;
    internal.reverse();
    Hash256::from_bytes(internal)
}

/// Result of locating the kernel's stake modifier.
#[derive(Debug, Clone, Copy)]
pub struct KernelModifier {
    pub modifier: u64,
    pub height: u32,
    pub block_time: i64,
}

/// Variant V0.5 (§4.3.3): the variant wired into the kernel by default.
pub fn get_kernel_stake_modifier_v05(
    prev_index: &Arc<BlockIndexNode>,
    tx_time: i64,
    params: &ConsensusParams,
) -> Result<KernelModifier, KernelError> {
    let selection_interval = params.selection_interval();
    let mut cur = Some(prev_index.clone());

    loop {
        let node = cur.ok_or(KernelError::StakeModifierNotYetAvailable { time_tx: tx_time })?;
        if node.generated_stake_modifier()
            && node.block_time + params.stake_min_age - selection_interval <= tx_time
        {
            return Ok(KernelModifier {
                modifier: node.stake_modifier,
                height: node.height,
                block_time: node.block_time,
            });
        }
        cur = node.prev().cloned();
    }
}

/// Variant V0.3 (§4.3.3): preserved for historical validation and test parity.
/// Walks forward from the block containing the staked coin, preferring the
/// active chain but honoring a temporary side-chain path when `prev` is not
/// on the active chain. Treats "reached the tip" as the canonical forward-walk
/// exit (see DESIGN.md for the boundary-check open question).
pub fn get_kernel_stake_modifier_v03(
    from: &Arc<BlockIndexNode>,
    chain: &dyn ChainView,
    clock: &dyn ClockAdjusted,
    params: &ConsensusParams,
    stake_is_old_enough: bool,
) -> Result<Option<KernelModifier>, KernelError> {
    let selection_interval = params.selection_interval();
    let target_time = from.block_time + selection_interval;

    let mut cur = from.clone();
    loop {
        let next = if chain.contains(&cur) {
            chain.next(&cur)
        } else {
            cur.prev().cloned()
        };

        let next = match next {
            Some(n) => n,
            None => {
                // Reached the tip without satisfying the bound.
                if stake_is_old_enough {
                    return Err(KernelError::StakeModifierNotYetAvailable {
                        time_tx: clock.now(),
                    });
                }
                return Ok(None);
            }
        };

        if next.block_time > target_time && next.generated_stake_modifier() {
            return Ok(Some(KernelModifier {
                modifier: next.stake_modifier,
                height: next.height,
                block_time: next.block_time,
            }));
        }
        cur = next;
    }
}

/// `checksum(node)` (§4.3.4): lowest 32 bits of
/// `sha256d(parent.checksum || flags || hashProofOfStake || stakeModifier)`.
pub fn stake_modifier_checksum(
    parent_checksum: u32,
    flags: u32,
    hash_proof_of_stake: &Hash256,
    stake_modifier: u64,
) -> u32 {
    let digest = LeBuf::new()
        .u32(parent_checksum)
        .u32(flags)
        .hash(hash_proof_of_stake)
        .u64(stake_modifier)
        .sha256d();
    // The original right-shifts the 256-bit digest by 224 bits and takes the
    // low 64 (truncated to 32): that's the digest's top internal word, i.e.
    // `digest.0[28..32]` read little-endian, not the low word reached via
    // big-endian reinterpretation.
    u32::from_le_bytes(digest.0[28..32].try_into().unwrap())
}

/// `CheckStakeModifierCheckpoints`: true if no checkpoint exists for `height`,
/// else equality with the recorded checksum.
pub fn check_stake_modifier_checkpoints(
    params: &ConsensusParams,
    height: u32,
    checksum: u32,
) -> bool {
    match params.stake_modifier_checkpoints.get(&height) {
        None => true,
        Some(expected) => *expected == checksum,
    }
}
