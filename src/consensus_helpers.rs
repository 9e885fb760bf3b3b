//! Consensus helpers (component F): entropy-bit extraction, version
//! supermajority counting, and the coinstake timestamp / BIP-switch gates.

use crate::block_index::BlockIndexNode;
use crate::params::Network;
use std::sync::Arc;

/// `entropyBit`: the low bit of the block's own hash. Deterministic and cheap;
/// unrelated to the `ENTROPY_BIT` flag cached on later ancestors (that flag
/// records this same value once a node is selected as a modifier winner).
pub fn entropy_bit(node: &BlockIndexNode) -> u8 {
    node.block_hash.low_bit()
}

/// `HowSuperMajority`: counts ancestors from `start` with `version >= min_version`
/// among up to `window` *PoS* ancestors, stopping early once `required` is hit.
///
/// Resolved open question (see DESIGN.md): non-PoS ancestors are skipped
/// entirely and do **not** consume a window slot — the window only ever
/// decrements on a PoS ancestor actually examined, whether or not its version
/// qualifies. This matches the majority reading of the original's comment
/// ("non-PoS blocks are skipped") over a literal post-increment-in-loop
/// reading that would also count skipped blocks.
pub fn how_super_majority(
    min_version: i32,
    start: &Arc<BlockIndexNode>,
    required: u32,
    window: u32,
) -> u32 {
    let mut count = 0u32;
    let mut examined = 0u32;
    let mut cur = Some(start.clone());

    while examined < window {
        let node = match cur {
            Some(n) => n,
            None => break,
        };
        if node.is_proof_of_stake() {
            if node.version >= min_version {
                count += 1;
                if count >= required {
                    return count;
                }
            }
            examined += 1;
        }
        cur = node.prev().cloned();
    }
    count
}

pub fn is_super_majority(
    min_version: i32,
    start: &Arc<BlockIndexNode>,
    required: u32,
    window: u32,
) -> bool {
    how_super_majority(min_version, start, required, window) >= required
}

/// Coinstake timestamp rule (§4.4): a coinstake is valid only when the block
/// time equals the transaction time.
pub fn check_coin_stake_timestamp(block_time: i64, tx_time: i64) -> bool {
    block_time == tx_time
}

/// `IsBTC16BIPsEnabled`: a fixed per-network switch time, past which BIP16
/// script semantics (P2SH) are required. No consensus effect before that
/// point; callers gate `ScriptFlags::P2SH` on this.
pub fn is_btc16_bips_enabled(time_tx: i64, network: Network) -> bool {
    let switch_time = match network {
        Network::Mainnet => 1_677_525_510, // nBTC16BIPsSwitchTime
        Network::Testnet => 1_677_525_510, // nBTC16BIPsTestSwitchTime (same instant)
        Network::Regtest => 0,
    };
    time_tx >= switch_time
}
