//! The kernel's read-only view of block-index nodes and the transaction shapes
//! it is handed by its external collaborators.

use crate::hash::Hash256;
use std::sync::Arc;

pub const FLAG_IS_PROOF_OF_STAKE: u32 = 1 << 0;
pub const FLAG_GENERATED_STAKE_MODIFIER: u32 = 1 << 1;
pub const FLAG_ENTROPY_BIT: u32 = 1 << 2;

/// A node in the block index. The kernel never mutates these; callers own the
/// arena and hand out `Arc` handles. `prev` is strictly lower height than
/// `self` for every non-genesis node, so the chain of `Arc`s forms a DAG with
/// no cycles (an `Arc` back-pointer is safe here for exactly that reason).
#[derive(Debug, Clone)]
pub struct BlockIndexNode {
    pub height: u32,
    pub block_time: i64,
    pub bits: u32,
    pub version: i32,
    pub flags: u32,
    pub stake_modifier: u64,
    pub stake_modifier_checksum: u32,
    pub hash_proof_of_stake: Hash256,
    pub block_hash: Hash256,
    pub prev: Option<Arc<BlockIndexNode>>,
}

impl BlockIndexNode {
    pub fn genesis(block_hash: Hash256, block_time: i64, bits: u32) -> Self {
        BlockIndexNode {
            height: 0,
            block_time,
            bits,
            version: 1,
            flags: FLAG_GENERATED_STAKE_MODIFIER,
            stake_modifier: 0,
            stake_modifier_checksum: 0,
            hash_proof_of_stake: Hash256::ZERO,
            block_hash,
            prev: None,
        }
    }

    pub fn is_proof_of_stake(&self) -> bool {
        self.flags & FLAG_IS_PROOF_OF_STAKE != 0
    }

    pub fn generated_stake_modifier(&self) -> bool {
        self.flags & FLAG_GENERATED_STAKE_MODIFIER != 0
    }

    pub fn cached_entropy_bit(&self) -> u8 {
        if self.flags & FLAG_ENTROPY_BIT != 0 {
            1
        } else {
            0
        }
    }

    /// The hash used when this node is drawn as a stake-modifier candidate:
    /// `hashProofOfStake` for PoS blocks, the block's own hash for PoW blocks.
    pub fn proof_hash(&self) -> Hash256 {
        if self.is_proof_of_stake() {
            self.hash_proof_of_stake
        } else {
            self.block_hash
        }
    }

    pub fn prev(&self) -> Option<&Arc<BlockIndexNode>> {
        self.prev.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutPoint {
    pub txid: Hash256,
    pub index: u32,
}

#[derive(Debug, Clone)]
pub struct TxOut {
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct TxIn {
    pub prevout: OutPoint,
    pub script_sig: Vec<u8>,
    pub witness: Vec<Vec<u8>>,
}

/// Standard Bitcoin-style transaction, plus the legacy PPCoin `nTime` field.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub version: i32,
    pub n_time: u32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
    /// `true` for the synthetic first transaction of a PoS block.
    pub is_coinstake: bool,
}

impl Transaction {
    pub fn hash(&self) -> Hash256 {
        // Not consensus-critical in this kernel (no wire serialization is in
        // scope); a stable content hash suffices for txid comparisons in tests.
        use crate::hash::LeBuf;
        let mut buf = LeBuf::new().u32(self.version as u32).u32(self.n_time);
        for input in &self.inputs {
            buf = buf.hash(&input.prevout.txid).u32(input.prevout.index);
        }
        for output in &self.outputs {
            buf = buf.u64(output.value);
        }
        buf.u32(self.lock_time).sha256d()
    }
}

#[derive(Debug, Clone)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_block_hash: Hash256,
    pub merkle_root: Hash256,
    pub time: i64,
    pub bits: u32,
}

/// What `TxIndex` returns for a located transaction.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub containing_header: BlockHeader,
    pub tx: Transaction,
    pub offset_in_block: u32,
}
