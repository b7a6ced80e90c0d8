//! Result cache.
//!
//! Results are keyed by `"<path>:" + base64(JSON(resolved config))`, held in
//! a capacity-bounded LRU with a per-entry TTL, and optionally persisted to
//! a directory (default `~/.cache/codefacts/analysis`). Disk entries are
//! promoted to memory on hit.
//!
//! Corrupt persisted entries never fail a lookup; they are misses. They are
//! surfaced only by [`ResultCache::validate`] and removed by
//! [`ResultCache::repair`].

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use directories::ProjectDirs;
use lru::LruCache;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{CacheConfig, ResolvedConfig};
use crate::error::AnalysisError;

mod disk;

use disk::{DiskRead, DiskStore, Persisted};

/// Derive the cache key for a file and configuration.
pub fn cache_key(path: &str, config: &ResolvedConfig) -> String {
    format!("{}:{}", path, STANDARD.encode(config.canonical_json()))
}

/// Path part of a key built by [`cache_key`]. The encoded configuration
/// never contains `:`, so the path ends at the last one.
fn key_path(key: &str) -> Option<&str> {
    key.rsplit_once(':').map(|(path, _)| path)
}

/// Default persistence directory.
pub fn default_cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "codefacts").map(|dirs| dirs.cache_dir().join("analysis"))
}

#[derive(Debug, Clone)]
struct MemoryEntry<T> {
    value: T,
    expires_at_ms: u64,
}

/// Cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

/// Findings of a scan over persisted entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheReport {
    pub scanned: usize,
    /// Unreadable, unparseable or misnamed files.
    pub corrupt: Vec<PathBuf>,
    pub expired: Vec<PathBuf>,
    /// Files deleted (only set by `repair`).
    pub removed: Vec<PathBuf>,
}

impl CacheReport {
    pub fn is_clean(&self) -> bool {
        self.corrupt.is_empty()
    }

    /// `Err(CacheCorruption)` when corrupt entries were found.
    pub fn into_result(self) -> Result<CacheReport, AnalysisError> {
        if self.corrupt.is_empty() {
            Ok(self)
        } else {
            Err(AnalysisError::CacheCorruption {
                entries: self
                    .corrupt
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect(),
            })
        }
    }
}

/// LRU + TTL result cache with optional persistence.
pub struct ResultCache<T> {
    memory: Mutex<LruCache<String, MemoryEntry<T>>>,
    disk: Option<DiskStore>,
    counters: Counters,
}

impl<T> ResultCache<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    /// In-memory cache holding at most `max_entries` results.
    pub fn in_memory(max_entries: usize) -> Self {
        Self {
            memory: Mutex::new(LruCache::new(
                NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN),
            )),
            disk: None,
            counters: Counters::default(),
        }
    }

    /// Cache persisting to `dir`.
    pub fn persistent(max_entries: usize, dir: PathBuf) -> Result<Self, AnalysisError> {
        let disk = DiskStore::open(dir.clone()).map_err(|source| AnalysisError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        let mut cache = Self::in_memory(max_entries);
        cache.disk = Some(disk);
        Ok(cache)
    }

    /// Build a cache from settings. A persistence directory that cannot be
    /// created degrades to memory only.
    pub fn from_config(config: &CacheConfig) -> Self {
        if !config.persist {
            return Self::in_memory(config.max_entries);
        }
        let Some(dir) = config.directory.clone().or_else(default_cache_dir) else {
            warn!("no cache directory available, caching in memory only");
            return Self::in_memory(config.max_entries);
        };
        match Self::persistent(config.max_entries, dir) {
            Ok(cache) => cache,
            Err(err) => {
                warn!(error = %err, "cannot open cache directory, caching in memory only");
                Self::in_memory(config.max_entries)
            }
        }
    }

    pub fn directory(&self) -> Option<&Path> {
        self.disk.as_ref().map(DiskStore::dir)
    }

    /// Look up a live entry, returning an owned copy.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = now_ms();
        {
            let mut memory = self.memory.lock();
            if let Some(entry) = memory.get(key) {
                if entry.expires_at_ms > now {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.value.clone());
                }
                memory.pop(key);
                self.counters.expirations.fetch_add(1, Ordering::Relaxed);
                if let Some(disk) = &self.disk {
                    let _ = disk.remove(key);
                }
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        }

        if let Some(disk) = &self.disk {
            match disk.read::<T>(key) {
                DiskRead::Found(entry) if entry.expires_at_ms > now => {
                    let value = entry.value.clone();
                    self.insert_memory(key.to_string(), entry.value, entry.expires_at_ms);
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(value);
                }
                DiskRead::Found(_) => {
                    self.counters.expirations.fetch_add(1, Ordering::Relaxed);
                    let _ = disk.remove(key);
                }
                DiskRead::Corrupt(reason) => {
                    debug!(reason = %reason, "corrupt cache entry, treating as miss");
                }
                DiskRead::Missing => {}
            }
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a value for `ttl`.
    pub fn put(&self, key: &str, value: T, ttl: Duration) {
        let expires_at_ms = now_ms().saturating_add(ttl.as_millis().min(u64::MAX as u128) as u64);
        if let Some(disk) = &self.disk {
            let entry = Persisted {
                key: key.to_string(),
                expires_at_ms,
                value: value.clone(),
            };
            if let Err(err) = disk.write(&entry) {
                warn!(error = %err, "failed to persist cache entry");
            }
        }
        self.insert_memory(key.to_string(), value, expires_at_ms);
    }

    fn insert_memory(&self, key: String, value: T, expires_at_ms: u64) {
        let mut memory = self.memory.lock();
        if let Some((evicted, _)) = memory.push(key.clone(), MemoryEntry { value, expires_at_ms }) {
            if evicted != key {
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(key = %evicted, "evicted cache entry");
            }
        }
    }

    /// Remove one key.
    pub fn remove(&self, key: &str) {
        self.memory.lock().pop(key);
        if let Some(disk) = &self.disk {
            let _ = disk.remove(key);
        }
    }

    /// Remove every entry for `path`, under any configuration. Returns the
    /// number of entries removed.
    pub fn invalidate_path(&self, path: &str) -> usize {
        let mut removed: HashSet<String> = HashSet::new();
        {
            let mut memory = self.memory.lock();
            let keys: Vec<String> = memory
                .iter()
                .filter(|(k, _)| key_path(k) == Some(path))
                .map(|(k, _)| k.clone())
                .collect();
            for key in keys {
                memory.pop(&key);
                removed.insert(key);
            }
        }

        if let Some(disk) = &self.disk {
            for file in disk.files().unwrap_or_default() {
                if let DiskRead::Found(entry) = disk::read_file::<T>(&file) {
                    if key_path(&entry.key) == Some(path) && disk::remove_if_present(&file).is_ok() {
                        removed.insert(entry.key);
                    }
                }
            }
        }
        removed.len()
    }

    /// Drop every entry, in memory and on disk.
    pub fn clear(&self) {
        self.memory.lock().clear();
        if let Some(disk) = &self.disk {
            for file in disk.files().unwrap_or_default() {
                let _ = disk::remove_if_present(&file);
            }
        }
    }

    /// Drop expired in-memory entries. Returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        let now = now_ms();
        let mut memory = self.memory.lock();
        let expired: Vec<String> = memory
            .iter()
            .filter(|(_, e)| e.expires_at_ms <= now)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            memory.pop(key);
        }
        if !expired.is_empty() {
            self.counters
                .expirations
                .fetch_add(expired.len() as u64, Ordering::Relaxed);
            debug!(count = expired.len(), "pruned expired cache entries");
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.memory.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            expirations: self.counters.expirations.load(Ordering::Relaxed),
        }
    }

    pub fn reset_stats(&self) {
        self.counters.hits.store(0, Ordering::Relaxed);
        self.counters.misses.store(0, Ordering::Relaxed);
        self.counters.evictions.store(0, Ordering::Relaxed);
        self.counters.expirations.store(0, Ordering::Relaxed);
    }

    /// Scan persisted entries for corrupt and expired files.
    pub fn validate(&self) -> Result<CacheReport, AnalysisError> {
        let mut report = CacheReport::default();
        let Some(disk) = &self.disk else {
            return Ok(report);
        };
        let now = now_ms();
        let files = disk.files().map_err(|source| AnalysisError::Io {
            path: disk.dir().display().to_string(),
            source,
        })?;

        for file in files {
            report.scanned += 1;
            match disk::read_file::<T>(&file) {
                DiskRead::Found(entry) if entry.expires_at_ms <= now => report.expired.push(file),
                DiskRead::Found(_) | DiskRead::Missing => {}
                DiskRead::Corrupt(reason) => {
                    debug!(reason = %reason, "corrupt cache file");
                    report.corrupt.push(file);
                }
            }
        }
        Ok(report)
    }

    /// Delete corrupt and expired persisted entries.
    pub fn repair(&self) -> Result<CacheReport, AnalysisError> {
        let mut report = self.validate()?;
        for file in report.corrupt.iter().chain(&report.expired) {
            disk::remove_if_present(file).map_err(|source| AnalysisError::Io {
                path: file.display().to_string(),
                source,
            })?;
            report.removed.push(file.clone());
        }
        if !report.removed.is_empty() {
            debug!(count = report.removed.len(), "removed cache files");
        }
        Ok(report)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}
