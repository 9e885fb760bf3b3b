//! Process-wide bounded LRU cache from block-header hash to its expensive
//! proof-of-work hash, persisted to `powcache.dat` across restarts.
//!
//! Grounded on the original's `CPowCache` (a process-global singleton wrapping
//! an `unordered_lru_cache` behind a recursive mutex); this port drops the
//! lazy-global singleton in favor of an owned component per the "eliminate
//! lazy global construction" design note, and uses a plain `Mutex` since no
//! call path here re-enters the lock while holding it.

use crate::hash::Hash256;
use crate::serialize::{read_compact_size, write_compact_size};
use lru::LruCache;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

pub const DEFAULT_MAX_ELEMENTS: i64 = 1_000_000;
pub const DEFAULT_SAVE_INTERVAL: i64 = 720;
pub const DEFAULT_VALIDATE: bool = false;
pub const CURRENT_VERSION: u32 = 1;

/// Cache tunables; mirrors the `powcachemaxelements` / `powcachevalidate` /
/// `powcachesaveinterval` configuration options.
#[derive(Debug, Clone, Copy)]
pub struct PowCacheConfig {
    pub max_elements: i64,
    pub validate: bool,
    pub save_interval: i64,
}

impl Default for PowCacheConfig {
    fn default() -> Self {
        PowCacheConfig {
            max_elements: DEFAULT_MAX_ELEMENTS,
            validate: DEFAULT_VALIDATE,
            save_interval: DEFAULT_SAVE_INTERVAL,
        }
    }
}

impl PowCacheConfig {
    /// Values `<= 0` fall back to the default, as the original's `Instance()` does.
    pub fn normalized_max_elements(&self) -> usize {
        if self.max_elements <= 0 {
            DEFAULT_MAX_ELEMENTS as usize
        } else {
            self.max_elements as usize
        }
    }
}

struct Inner {
    lru: LruCache<Hash256, Hash256>,
    saved_size: usize,
}

pub struct PowHashCache {
    inner: Mutex<Inner>,
    validate: bool,
    save_interval: i64,
}

impl PowHashCache {
    pub fn new(config: PowCacheConfig) -> Self {
        if config.validate {
            debug!("PowCache: validation and auto correction enabled");
        }
        let cap = NonZeroUsize::new(config.normalized_max_elements())
            .unwrap_or(NonZeroUsize::new(DEFAULT_MAX_ELEMENTS as usize).unwrap());
        PowHashCache {
            inner: Mutex::new(Inner {
                lru: LruCache::new(cap),
                saved_size: 0,
            }),
            validate: config.validate,
            save_interval: config.save_interval,
        }
    }

    pub fn validate_enabled(&self) -> bool {
        self.validate
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Plain lookup, promoting the entry to most-recently-used on hit. Use
    /// this when `validate` is disabled.
    pub fn get(&self, header_hash: &Hash256) -> Option<Hash256> {
        self.inner.lock().unwrap().lru.get(header_hash).copied()
    }

    /// Lookup with paranoia: if `validate` is enabled and the entry is present,
    /// `recompute` is invoked (lock-free) and the cached value is corrected
    /// in place on mismatch. Returns `None` on a miss regardless of `validate`
    /// — the caller must compute and `insert` itself, without holding this
    /// cache's lock across that (possibly expensive) computation.
    pub fn get_validated(
        &self,
        header_hash: &Hash256,
        recompute: impl FnOnce() -> Hash256,
    ) -> Option<Hash256> {
        let cached = self.get(header_hash)?;
        if !self.validate {
            return Some(cached);
        }
        let fresh = recompute();
        if fresh != cached {
            warn!(
                header = %header_hash,
                "PowCache: correcting stale entry found by validation"
            );
            self.insert(*header_hash, fresh);
            return Some(fresh);
        }
        Some(cached)
    }

    pub fn insert(&self, header_hash: Hash256, pow_hash: Hash256) {
        self.inner.lock().unwrap().lru.put(header_hash, pow_hash);
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.lru.clear();
        inner.saved_size = 0;
    }

    pub fn saved_size(&self) -> usize {
        self.inner.lock().unwrap().saved_size
    }

    pub fn wants_to_save(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.lru.len().saturating_sub(inner.saved_size) as i64 >= self.save_interval
    }

    /// Invokes `save()` if `wants_to_save()`; the maintenance hook callers are
    /// expected to run periodically.
    pub fn do_maintenance(&self, path: &Path) {
        if self.wants_to_save() {
            self.save(path);
        }
    }

    /// Serializes `{version, compactSize(len), len * (headerHash, powHash)}` to
    /// `path`. An unopenable file logs and returns without panicking.
    pub fn save(&self, path: &Path) {
        let file = match File::create(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "PowCache: unable to save file");
                return;
            }
        };
        let mut writer = BufWriter::new(file);
        if let Err(e) = self.write_to(&mut writer) {
            warn!(error = %e, "PowCache: error while writing cache file");
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        inner.saved_size = inner.lru.len();
        debug!(elements = inner.lru.len(), "PowCache: saved");
    }

    fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let inner = self.inner.lock().unwrap();
        w.write_all(&CURRENT_VERSION.to_le_bytes())?;
        write_compact_size(w, inner.lru.len() as u64)?;
        for (header_hash, pow_hash) in inner.lru.iter() {
            w.write_all(header_hash.as_bytes())?;
            w.write_all(pow_hash.as_bytes())?;
        }
        Ok(())
    }

    /// Loads from `path`, clearing the in-memory cache first. A missing file
    /// is a silent no-op: the cache starts empty, as the original does.
    pub fn load(&self, path: &Path) {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(_) => {
                debug!(path = %path.display(), "PowCache: unable to load file, cache is empty");
                return;
            }
        };
        let mut reader = BufReader::new(file);
        self.clear();
        if let Err(e) = self.read_from(&mut reader) {
            warn!(error = %e, "PowCache: error while reading cache file, cache may be partial");
        }
        let mut inner = self.inner.lock().unwrap();
        inner.saved_size = inner.lru.len();
        debug!(elements = inner.lru.len(), "PowCache: loaded");
    }

    fn read_from<R: Read>(&self, r: &mut R) -> io::Result<()> {
        let mut version_bytes = [0u8; 4];
        r.read_exact(&mut version_bytes)?;
        let _version = u32::from_le_bytes(version_bytes);

        let count = read_compact_size(r)?;
        let mut inner = self.inner.lock().unwrap();
        for _ in 0..count {
            let mut header_hash = [0u8; 32];
            let mut pow_hash = [0u8; 32];
            r.read_exact(&mut header_hash)?;
            r.read_exact(&mut pow_hash)?;
            // Entries are inserted in file order; `maxElements` is assumed to
            // cover the file contents, so no eviction should occur here.
            inner
                .lru
                .put(Hash256::from_bytes(header_hash), Hash256::from_bytes(pow_hash));
        }
        Ok(())
    }
}

/// Default on-disk location for the cache file under a process data directory.
pub fn default_cache_path(data_dir: &Path) -> PathBuf {
    data_dir.join("powcache.dat")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn hash_of(n: u8) -> Hash256 {
        let mut bytes = [0u8; 32];
        bytes[0] = n;
        Hash256::from_bytes(bytes)
    }

    #[test]
    fn lru_evicts_oldest_beyond_capacity() {
        let cache = PowHashCache::new(PowCacheConfig {
            max_elements: 3,
            validate: false,
            save_interval: 720,
        });
        for i in 0..5u8 {
            cache.insert(hash_of(i), hash_of(100 + i));
        }
        assert_eq!(cache.len(), 3);
        assert!(cache.get(&hash_of(0)).is_none());
        assert!(cache.get(&hash_of(1)).is_none());
        assert!(cache.get(&hash_of(4)).is_some());
    }

    #[test]
    fn validate_corrects_stale_entry() {
        let cache = PowHashCache::new(PowCacheConfig {
            max_elements: 10,
            validate: true,
            save_interval: 720,
        });
        cache.insert(hash_of(1), hash_of(200));
        let corrected = cache.get_validated(&hash_of(1), || hash_of(201));
        assert_eq!(corrected, Some(hash_of(201)));
        assert_eq!(cache.get(&hash_of(1)), Some(hash_of(201)));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = default_cache_path(dir.path());

        let cache = PowHashCache::new(PowCacheConfig::default());
        for i in 0..10u8 {
            cache.insert(hash_of(i), hash_of(100 + i));
        }
        cache.save(&path);
        assert_eq!(cache.saved_size(), 10);

        let fresh = PowHashCache::new(PowCacheConfig::default());
        fresh.load(&path);
        assert_eq!(fresh.saved_size(), 10);
        for i in 0..10u8 {
            assert_eq!(fresh.get(&hash_of(i)), Some(hash_of(100 + i)));
        }
    }

    #[test]
    fn load_missing_file_is_silent_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("does-not-exist.dat");
        let cache = PowHashCache::new(PowCacheConfig::default());
        cache.load(&path);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn wants_to_save_threshold() {
        let cache = PowHashCache::new(PowCacheConfig {
            max_elements: 100,
            validate: false,
            save_interval: 5,
        });
        for i in 0..4u8 {
            cache.insert(hash_of(i), hash_of(i));
        }
        assert!(!cache.wants_to_save());
        cache.insert(hash_of(4), hash_of(4));
        assert!(cache.wants_to_save());
    }
}
