//! Synthetic chain construction shared by unit tests across modules.

use crate::block_index::{
    BlockIndexNode, FLAG_ENTROPY_BIT, FLAG_GENERATED_STAKE_MODIFIER, FLAG_IS_PROOF_OF_STAKE,
};
use crate::hash::{sha256d, Hash256};
use crate::params::{ConsensusParams, Network};
use std::collections::HashMap;
use std::sync::Arc;

pub fn default_params() -> ConsensusParams {
    ConsensusParams {
        network: Network::Mainnet,
        modifier_interval: 6 * 60 * 60,
        stake_target_spacing: 30,
        pow_target_spacing: 30,
        target_timespan: 40 * 60,
        stake_min_age: 86_400,
        stake_max_age: 7_776_000,
        pow_limit: Hash256::from_bytes([0xff; 32]),
        initial_hash_target: Hash256::from_bytes({
            let mut b = [0u8; 32];
            b[0] = 0x00;
            b[1] = 0x0f;
            b
        }),
        dgw_blocks_avg: 60,
        pow_dgw_height: 1000,
        pos_activation_height: 500,
        genesis_hash: sha256d(b"genesis"),
        coin: 100_000_000,
        stake_modifier_checkpoints: HashMap::new(),
    }
}

/// Builds a linear chain of `count` blocks on top of a genesis node, with
/// `block_time = 500 * height` and `block_hash = sha256d(height)`, matching
/// the S2 scenario's seed description. `is_pos(height)` selects the PoS/PoW
/// flag per height.
pub fn chain_of(
    params: &ConsensusParams,
    count: u32,
    is_pos: impl Fn(u32) -> bool,
) -> Vec<Arc<BlockIndexNode>> {
    let mut nodes = Vec::with_capacity(count as usize + 1);
    let genesis = Arc::new(BlockIndexNode::genesis(params.genesis_hash, 0, 0x1d00ffff));
    nodes.push(genesis);

    for height in 1..=count {
        let prev = nodes.last().unwrap().clone();
        let block_time = 500 * height as i64;
        let block_hash = sha256d(&height.to_le_bytes());
        let pos = is_pos(height);
        let mut flags = FLAG_GENERATED_STAKE_MODIFIER;
        if pos {
            flags |= FLAG_IS_PROOF_OF_STAKE;
        }
        if block_hash.low_bit() == 1 {
            flags |= FLAG_ENTROPY_BIT;
        }
        let hash_proof_of_stake = if pos {
            sha256d(&[block_hash.as_bytes().as_slice(), b"pos"].concat())
        } else {
            Hash256::ZERO
        };
        let node = Arc::new(BlockIndexNode {
            height,
            block_time,
            bits: 0x1d00ffff,
            version: 1,
            flags,
            stake_modifier: (height as u64).wrapping_mul(0x9E3779B97F4A7C15),
            stake_modifier_checksum: 0,
            hash_proof_of_stake,
            block_hash,
            prev: Some(prev),
        });
        nodes.push(node);
    }
    nodes
}
