//! 256-bit hash type and the double-SHA256 primitive used throughout the kernel.

use sha2::{Digest, Sha256};
use std::fmt;

/// A 256-bit hash, stored internally-endian (as produced by SHA-256) but compared
/// and displayed as a big-endian unsigned integer, matching Bitcoin-style `uint256`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash256(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Interpret the hash as a big-endian 256-bit unsigned integer and compare.
    /// Internally the bytes are stored little-endian-limb (as `sha256d` emits them),
    /// so comparisons reverse byte order to recover big-endian magnitude ordering.
    pub fn as_be_bytes(&self) -> [u8; 32] {
        let mut out = self.0;
        out.reverse();
        out
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Low bit of the hash, used by `entropyBit`.
    pub fn low_bit(&self) -> u8 {
        self.0[0] & 1
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.as_be_bytes()))
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.as_be_bytes()))
    }
}

impl PartialOrd for Hash256 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Hash256 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_be_bytes().cmp(&other.as_be_bytes())
    }
}

/// `sha256d` (double SHA-256) over an arbitrary byte buffer.
pub fn sha256d(data: &[u8]) -> Hash256 {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut out = [0u8; 32];
    out.copy_from_slice(&second);
    Hash256(out)
}

/// Accumulates little-endian-encoded fields the way the original kernel hash and
/// checksum formulas do, then hashes the result with `sha256d`.
#[derive(Default)]
pub struct LeBuf(Vec<u8>);

impl LeBuf {
    pub fn new() -> Self {
        LeBuf(Vec::new())
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i64(mut self, v: i64) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u64(mut self, v: u64) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn hash(mut self, h: &Hash256) -> Self {
        self.0.extend_from_slice(&h.0);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.0
    }

    pub fn sha256d(self) -> Hash256 {
        sha256d(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_big_endian() {
        let mut small = [0u8; 32];
        small[31] = 1; // big-endian 1 -> stored little-endian-limb as first byte
        let mut large = [0u8; 32];
        large[31] = 2;
        assert!(Hash256(small) < Hash256(large));
    }

    #[test]
    fn sha256d_matches_double_digest() {
        let h = sha256d(b"abc");
        let first = Sha256::digest(b"abc");
        let second = Sha256::digest(first);
        assert_eq!(h.0.as_slice(), second.as_slice());
    }
}
