// Time-bounded cache in front of another storage
// Author: Gabriel Demetrios Lafis

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use log::debug;

use crate::data::RecordSet;
use super::{DataStorage, StorageError};

struct CacheEntry {
    data: RecordSet,
    stored_at: Instant,
}

/// Cache hit and miss counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Caches record sets of a backend for a fixed time
///
/// Without a TTL entries never expire. Writes go to the backend first, and
/// an expired entry is removed from the backend as well, so names that stop
/// being requested do not accumulate. Expired entries are swept on every miss.
pub struct CacheStorage {
    backend: Box<dyn DataStorage + Send + Sync>,
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStorage {
    /// Create a new cache over a backend
    pub fn new<S>(backend: S) -> Self
    where
        S: DataStorage + Send + Sync + 'static,
    {
        CacheStorage {
            backend: Box::new(backend),
            entries: RwLock::new(HashMap::new()),
            ttl: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Expire entries once they are older than `ttl`
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.ttl.map_or(true, |ttl| entry.stored_at.elapsed() < ttl)
    }

    fn fresh(&self, name: &str) -> Result<Option<RecordSet>, StorageError> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries
            .get(name)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.data.clone()))
    }

    fn remember(&self, name: &str, data: &RecordSet) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
        entries.insert(
            name.to_string(),
            CacheEntry {
                data: data.clone(),
                stored_at: Instant::now(),
            },
        );
        Ok(())
    }

    /// Return the cached set, or compute it, store it and return it
    ///
    /// A failing `compute` leaves the cache untouched.
    pub fn get_or_insert_with<F, E>(&self, name: &str, compute: F) -> Result<RecordSet, E>
    where
        F: FnOnce() -> Result<RecordSet, E>,
        E: From<StorageError>,
    {
        if let Some(data) = self.fresh(name)? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit for {}", name);
            return Ok(data);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        self.clear_expired()?;
        let data = compute()?;
        self.store(name, &data)?;
        Ok(data)
    }

    /// Drop expired entries from the cache and the backend
    ///
    /// Returns how many entries were evicted.
    pub fn clear_expired(&self) -> Result<usize, StorageError> {
        let ttl = match self.ttl {
            Some(ttl) => ttl,
            None => return Ok(0),
        };

        let expired: Vec<String> = {
            let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
            let names: Vec<String> = entries
                .iter()
                .filter(|(_, entry)| entry.stored_at.elapsed() >= ttl)
                .map(|(name, _)| name.clone())
                .collect();
            for name in &names {
                entries.remove(name);
            }
            names
        };

        for name in &expired {
            match self.backend.delete(name) {
                Ok(()) | Err(StorageError::NotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }

        if !expired.is_empty() {
            debug!("Evicted {} expired cache entries", expired.len());
        }
        Ok(expired.len())
    }

    /// Drop every entry; the backend keeps its data
    pub fn clear_all(&self) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
        entries.clear();
        Ok(())
    }
}

impl DataStorage for CacheStorage {
    fn store(&self, name: &str, data: &RecordSet) -> Result<(), StorageError> {
        self.backend.store(name, data)?;
        self.remember(name, data)
    }

    fn load(&self, name: &str) -> Result<RecordSet, StorageError> {
        if let Some(data) = self.fresh(name)? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(data);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        self.clear_expired()?;
        let data = self.backend.load(name)?;
        self.remember(name, &data)?;
        Ok(data)
    }

    fn exists(&self, name: &str) -> Result<bool, StorageError> {
        if self.fresh(name)?.is_some() {
            return Ok(true);
        }
        self.backend.exists(name)
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        {
            let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
            entries.remove(name);
        }
        self.backend.delete(name)
    }

    fn list(&self) -> Result<Vec<String>, StorageError> {
        self.backend.list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DimensionName, MetricRecord};
    use crate::storage::MemoryStorage;
    use std::thread;

    fn sample() -> RecordSet {
        RecordSet::from_records(vec![
            MetricRecord::new(1, 10, 10.0, 1.0).with_dimension(DimensionName::Query, "rust"),
        ])
    }

    #[test]
    fn test_get_or_insert_with_computes_once() {
        let cache = CacheStorage::new(MemoryStorage::new());
        let mut calls = 0;

        for _ in 0..3 {
            let data: Result<RecordSet, StorageError> = cache.get_or_insert_with("top", || {
                calls += 1;
                Ok(sample())
            });
            assert_eq!(data.unwrap().len(), 1);
        }

        assert_eq!(calls, 1);
        assert_eq!(cache.stats(), CacheStats { hits: 2, misses: 1 });
    }

    #[test]
    fn test_expired_entries_are_recomputed() {
        let cache = CacheStorage::new(MemoryStorage::new()).with_ttl(Duration::from_millis(10));
        cache.store("top", &sample()).unwrap();

        thread::sleep(Duration::from_millis(30));
        cache.clear_expired().unwrap();

        let mut recomputed = false;
        let _: Result<RecordSet, StorageError> = cache.get_or_insert_with("top", || {
            recomputed = true;
            Ok(sample())
        });
        assert!(recomputed);
    }

    #[test]
    fn test_expired_entries_leave_the_backend() {
        let cache = CacheStorage::new(MemoryStorage::new()).with_ttl(Duration::from_millis(10));
        let _: Result<RecordSet, StorageError> =
            cache.get_or_insert_with("records_2024-01-01_2024-01-07", || Ok(sample()));
        assert_eq!(cache.list().unwrap().len(), 1);

        thread::sleep(Duration::from_millis(30));

        // The next day's window misses and sweeps the stale one
        let _: Result<RecordSet, StorageError> =
            cache.get_or_insert_with("records_2024-01-02_2024-01-08", || Ok(sample()));
        assert_eq!(cache.list().unwrap(), vec!["records_2024-01-02_2024-01-08".to_string()]);
        assert!(matches!(
            cache.load("records_2024-01-01_2024-01-07"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_failed_compute_is_not_cached() {
        let cache = CacheStorage::new(MemoryStorage::new());
        let result: Result<RecordSet, StorageError> =
            cache.get_or_insert_with("top", || Err(StorageError::NotFound("top".to_string())));

        assert!(result.is_err());
        assert!(!cache.exists("top").unwrap());
    }
}
