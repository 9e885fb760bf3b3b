//! External collaborator contracts. The kernel depends only on these narrow
//! interfaces; storage, networking, scripting, and timekeeping live outside it.

use crate::block_index::{BlockHeader, BlockIndexNode, Transaction};
use crate::hash::Hash256;
use std::sync::Arc;

/// Disk position of a transaction, as returned by `TxIndex::find_tx_position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskTxPos {
    pub file: u32,
    pub offset_in_file: u32,
}

pub trait BlockIndexStore {
    fn lookup(&self, hash: &Hash256) -> Option<Arc<BlockIndexNode>>;
}

pub trait ChainView {
    fn contains(&self, node: &Arc<BlockIndexNode>) -> bool;
    fn next(&self, node: &Arc<BlockIndexNode>) -> Option<Arc<BlockIndexNode>>;
}

pub trait TxIndex {
    /// Whether the transaction index collaborator itself is up and queryable
    /// (the original's `!g_txindex` check); distinct from a specific txid
    /// being absent from an available index.
    fn is_available(&self) -> bool;
    fn find_tx_position(&self, txid: &Hash256) -> Option<DiskTxPos>;
    fn cache_lookup(&self, txid: &Hash256) -> Option<(BlockHeader, Transaction)>;
    /// Synchronous read from block storage at `pos`, used when the cache misses.
    fn read_from_disk(&self, pos: DiskTxPos) -> Result<(BlockHeader, Transaction), String>;
}

/// Script verification flags; only `P2SH` is exercised by the kernel facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptFlags(u32);

impl ScriptFlags {
    pub const NONE: ScriptFlags = ScriptFlags(0);
    pub const P2SH: ScriptFlags = ScriptFlags(1 << 0);

    pub fn contains(&self, other: ScriptFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ScriptFlags {
    type Output = ScriptFlags;
    fn bitor(self, rhs: ScriptFlags) -> ScriptFlags {
        ScriptFlags(self.0 | rhs.0)
    }
}

pub trait ScriptVerifier {
    fn verify(
        &self,
        script_sig: &[u8],
        script_pubkey: &[u8],
        witness: &[Vec<u8>],
        flags: ScriptFlags,
    ) -> bool;
}

pub trait ClockAdjusted {
    /// Network-adjusted unix seconds. Used only by the V0.3 modifier walk.
    fn now(&self) -> i64;
}

pub trait Random {
    /// Uniform random value in `[0, n)`. Used only by the pre-sort shuffle in
    /// `ComputeNextStakeModifier` (§4.3.2); never consulted by any consensus
    /// decision whose outcome depends on it, since the subsequent sort is a
    /// total order.
    fn below(&mut self, n: u64) -> u64;
}
