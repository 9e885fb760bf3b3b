//! Immutable consensus parameters and the diagnostic-logging flags the kernel
//! is threaded with.

use crate::hash::Hash256;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

/// Ratio between successive stake-modifier selection sections. Fixed by protocol.
pub const MODIFIER_INTERVAL_RATIO: i64 = 3;

/// Number of selection rounds in `ComputeNextStakeModifier`.
pub const MODIFIER_SELECTION_ROUNDS: u32 = 64;

#[derive(Debug, Clone)]
pub struct ConsensusParams {
    pub network: Network,
    pub modifier_interval: i64,
    pub stake_target_spacing: i64,
    pub pow_target_spacing: i64,
    pub target_timespan: i64,
    pub stake_min_age: i64,
    pub stake_max_age: i64,
    pub pow_limit: Hash256,
    pub initial_hash_target: Hash256,
    pub dgw_blocks_avg: u32,
    pub pow_dgw_height: u32,
    pub pos_activation_height: u32,
    pub genesis_hash: Hash256,
    pub coin: u64,
    /// Hard-coded `{height -> expected stake-modifier checksum}` checkpoints for
    /// this network, consulted by `CheckStakeModifierCheckpoints`.
    pub stake_modifier_checkpoints: HashMap<u32, u32>,
}

impl ConsensusParams {
    /// `section(s)` from the selection-interval geometry in §4.3.1.
    pub fn selection_interval_section(&self, section: u32) -> i64 {
        (self.modifier_interval * 63)
            / (63 + (63 - section as i64) * (MODIFIER_INTERVAL_RATIO - 1))
    }

    /// `selectionInterval = Σ section(s) for s in 0..64`.
    pub fn selection_interval(&self) -> i64 {
        (0..MODIFIER_SELECTION_ROUNDS)
            .map(|s| self.selection_interval_section(s))
            .sum()
    }

    pub fn epoch(&self, time: i64) -> i64 {
        time / self.modifier_interval
    }
}

/// Collects the two consensus-neutral debug flags the original reads from a
/// global `args` table at each log site; threaded explicitly instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelLogging {
    pub debug: bool,
    pub print_stake_modifier: bool,
}
