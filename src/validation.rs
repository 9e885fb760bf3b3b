//! Validation facade (component G): `CheckProofOfStake` orchestration —
//! tx-index lookup, script verification, kernel check, error mapping.

use crate::block_index::{BlockIndexNode, Transaction};
use crate::collaborators::{DiskTxPos, ScriptFlags, ScriptVerifier, TxIndex};
use crate::consensus_helpers::{check_coin_stake_timestamp, is_btc16_bips_enabled};
use crate::error::ValidationError;
use crate::hash::Hash256;
use crate::kernel::check_stake_kernel_hash;
use crate::params::{ConsensusParams, Network};
use std::sync::Arc;
use tracing::warn;

/// Size, in bytes, of the serialized block header preceding a transaction's
/// position within a block file; added to the indexed offset to get the byte
/// offset of the transaction itself (`txPrevOffset` in §4.4 step 8).
pub const NORMAL_HEADER_SIZE: u32 = 80;

pub struct ProofOfStakeCheck {
    pub hash_proof_of_stake: Hash256,
}

/// `CheckProofOfStake` (§4.7).
pub fn check_proof_of_stake(
    tx_index: &dyn TxIndex,
    script_verifier: &dyn ScriptVerifier,
    prev_index: &Arc<BlockIndexNode>,
    block_time: i64,
    tx: &Transaction,
    bits: u32,
    time_tx: i64,
    params: &ConsensusParams,
) -> Result<ProofOfStakeCheck, ValidationError> {
    if !tx.is_coinstake {
        return Err(ValidationError::NotCoinstake);
    }

    // CoinStake timestamp rule (§4.4): enforced by the orchestrator, not the
    // kernel predicate itself.
    if !check_coin_stake_timestamp(block_time, time_tx) {
        return Err(ValidationError::CoinstakeTimestampMismatch {
            block_time,
            tx_time: time_tx,
        });
    }

    if !tx_index.is_available() {
        return Err(ValidationError::TxIndexMissing);
    }

    let prevout = &tx.inputs[0].prevout;

    let (header, tx_prev, offset) = match tx_index.cache_lookup(&prevout.txid) {
        Some((header, tx_prev)) => (header, tx_prev, None),
        None => {
            let pos = tx_index
                .find_tx_position(&prevout.txid)
                .ok_or(ValidationError::TxPosNotFound { txid: prevout.txid })?;
            let (header, tx_prev) = tx_index
                .read_from_disk(pos)
                .map_err(ValidationError::IoError)?;
            (header, tx_prev, Some(pos))
        }
    };

    let disk_offset = offset.map(|p: DiskTxPos| p.offset_in_file).unwrap_or(0);

    let prev_txid = tx_prev.hash();
    if prev_txid != prevout.txid {
        return Err(ValidationError::TxIdMismatch {
            expected: prevout.txid,
            found: prev_txid,
        });
    }

    let flags = if is_btc16_bips_enabled(time_tx, params.network) {
        ScriptFlags::P2SH
    } else {
        ScriptFlags::NONE
    };

    let input = &tx.inputs[0];
    let output = tx_prev
        .outputs
        .get(prevout.index as usize)
        .ok_or(ValidationError::InvalidPosScript)?;
    if !script_verifier.verify(&input.script_sig, &output.script_pubkey, &input.witness, flags) {
        return Err(ValidationError::InvalidPosScript);
    }

    let tx_prev_offset = disk_offset + NORMAL_HEADER_SIZE;
    match check_stake_kernel_hash(
        bits,
        prev_index,
        &header,
        tx_prev_offset,
        &tx_prev,
        prevout,
        time_tx,
        params,
    ) {
        Ok(outcome) => Ok(ProofOfStakeCheck {
            hash_proof_of_stake: outcome.kernel_hash,
        }),
        Err(kernel_err) => {
            // Even on rejection, diagnostics want the attempted kernel hash;
            // `check_stake_kernel_hash` only returns it on acceptance, so a
            // rejected block is reported with the zero hash here and the
            // underlying kernel error carries the detail instead.
            warn!(error = %kernel_err, "CheckProofOfStake: kernel check failed");
            Err(ValidationError::CheckKernelFailed(kernel_err))
        }
    }
}

/// `CheckStakeModifierCheckpoints`/BIP-16 gate convenience re-export point for
/// the CLI and tests; not itself part of the facade's call graph.
pub fn network_requires_p2sh(time_tx: i64, network: Network) -> bool {
    is_btc16_bips_enabled(time_tx, network)
}
