//! Consensus kernel for a hybrid proof-of-work / proof-of-stake chain:
//! big-integer target arithmetic, the PoW-hash cache, the stake-modifier
//! engine, the kernel hash predicate, difficulty retargeting, and the
//! `CheckProofOfStake` validation facade.

pub mod bignum;
pub mod block_index;
pub mod collaborators;
pub mod config;
pub mod consensus_helpers;
pub mod difficulty;
pub mod error;
pub mod hash;
pub mod kernel;
pub mod params;
pub mod powcache;
pub mod serialize;
pub mod stake_modifier;
pub mod validation;

#[cfg(test)]
pub mod test_support;

pub use bignum::{BigNum, Target256, Target512};
pub use block_index::BlockIndexNode;
pub use error::{KernelError, ValidationError};
pub use hash::Hash256;
pub use params::{ConsensusParams, Network};
pub use validation::check_proof_of_stake;
