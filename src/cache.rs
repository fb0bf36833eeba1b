//! In-memory cache of exact transcoded sizes.
//!
//! A size reported before a transcode completes is only an estimate. Once a
//! file has been transcoded in full its exact size is recorded here, keyed by
//! source path and invalidated when the source's modification time moves on.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
    time::SystemTime,
};

use crate::traits::{SizeCache, SourceKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStat {
    size: u64,
    mtime: SystemTime,
    /// Access tick; larger is more recent
    atime: u64,
}

#[derive(Debug, Default)]
struct Entries {
    map: HashMap<PathBuf, FileStat>,
    tick: u64,
}

impl Entries {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Remove `path` only if its entry has not changed since `stat` was taken.
    fn remove_if_unchanged(&mut self, path: &Path, stat: &FileStat) -> bool {
        if self.map.get(path) == Some(stat) {
            self.map.remove(path);
            true
        } else {
            false
        }
    }
}

/// Bounded map from source path to exact output size.
#[derive(Debug)]
pub struct StatsCache {
    capacity: usize,
    entries: Mutex<Entries>,
}

impl StatsCache {
    /// Create a cache holding up to `capacity` entries; 0 disables caching.
    pub fn new(capacity: usize) -> Self {
        StatsCache {
            capacity,
            entries: Mutex::new(Entries::default()),
        }
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size recorded for `path`, unless the source has changed since.
    ///
    /// An entry older than `mtime` is dropped. A hit counts as an access.
    pub fn get_filesize(&self, path: &Path, mtime: SystemTime) -> Option<u64> {
        let mut entries = self.lock();
        let tick = entries.next_tick();
        let stat = entries.map.get_mut(path)?;

        if mtime > stat.mtime {
            entries.map.remove(path);
            log::debug!("Removed out of date file '{}' from stats cache", path.display());
            return None;
        }

        stat.atime = tick;
        log::debug!(
            "Found file '{}' in stats cache with size {}",
            path.display(),
            stat.size
        );
        Some(stat.size)
    }

    /// Record the size for `path`. An existing entry is only replaced by one
    /// with the same or a newer mtime. Prunes when over capacity.
    pub fn put_filesize(&self, path: &Path, size: u64, mtime: SystemTime) {
        if self.capacity == 0 {
            return;
        }

        let over_capacity = {
            let mut entries = self.lock();
            let atime = entries.next_tick();
            let stat = FileStat { size, mtime, atime };
            match entries.map.get_mut(path) {
                None => {
                    entries.map.insert(path.to_path_buf(), stat);
                    log::debug!(
                        "Added file '{}' to stats cache with size {}",
                        path.display(),
                        size
                    );
                }
                Some(existing) if mtime >= existing.mtime => {
                    *existing = stat;
                    log::debug!(
                        "Updated file '{}' in stats cache with size {}",
                        path.display(),
                        size
                    );
                }
                Some(_) => {}
            }
            entries.map.len() > self.capacity
        };

        if over_capacity {
            self.prune();
        }
    }

    /// Drop entries for sources that are gone or have changed on disk, then
    /// the least recently used ones until the cache is at 90% of capacity.
    pub fn prune(&self) {
        log::debug!("Pruning stats cache");
        let target = 9 * self.capacity / 10;

        let mut sorted: Vec<(PathBuf, FileStat)> = self
            .lock()
            .map
            .iter()
            .map(|(path, stat)| (path.clone(), *stat))
            .collect();
        sorted.sort_by_key(|(_, stat)| stat.atime);

        // Stat the sources without holding the lock.
        for (path, stat) in &sorted {
            let stale = match fs::metadata(path).and_then(|m| m.modified()) {
                Ok(modified) => modified > stat.mtime,
                Err(_) => true,
            };
            if stale && self.lock().remove_if_unchanged(path, stat) {
                log::debug!("Removed out of date file '{}' from stats cache", path.display());
            }
        }

        let mut entries = self.lock();
        for (path, stat) in &sorted {
            if entries.map.len() <= target {
                break;
            }
            if entries.remove_if_unchanged(path, stat) {
                log::debug!("Pruned oldest file '{}' from stats cache", path.display());
            }
        }
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.lock().map.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // Entries are plain values updated in one step, so a poisoned lock
        // still guards consistent data.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for StatsCache {
    fn default() -> Self {
        StatsCache::new(500)
    }
}

impl SizeCache for StatsCache {
    fn lookup(&self, key: &SourceKey) -> Option<u64> {
        self.get_filesize(&key.path, key.mtime)
    }

    fn store(&self, key: &SourceKey, size: u64, _bytes: &[u8]) {
        self.put_filesize(&key.path, size, key.mtime);
    }
}
