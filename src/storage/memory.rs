// In-process storage of record sets
// Author: Gabriel Demetrios Lafis

use std::collections::HashMap;
use std::sync::RwLock;

use crate::data::RecordSet;
use super::{validate_name, DataStorage, StorageError};

/// Memory storage for record sets
#[derive(Default)]
pub struct MemoryStorage {
    sets: RwLock<HashMap<String, RecordSet>>,
}

impl MemoryStorage {
    /// Create a new memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

impl DataStorage for MemoryStorage {
    fn store(&self, name: &str, data: &RecordSet) -> Result<(), StorageError> {
        validate_name(name)?;
        let mut sets = self.sets.write().map_err(|_| StorageError::LockPoisoned)?;
        sets.insert(name.to_string(), data.clone());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<RecordSet, StorageError> {
        let sets = self.sets.read().map_err(|_| StorageError::LockPoisoned)?;
        sets.get(name)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    fn exists(&self, name: &str) -> Result<bool, StorageError> {
        let sets = self.sets.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(sets.contains_key(name))
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        let mut sets = self.sets.write().map_err(|_| StorageError::LockPoisoned)?;
        sets.remove(name)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    fn list(&self) -> Result<Vec<String>, StorageError> {
        let sets = self.sets.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut names: Vec<String> = sets.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
