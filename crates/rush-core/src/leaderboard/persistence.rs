//! Async key-value store holding the local score cache

use crate::error::StorageError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

#[async_trait]
pub trait PersistenceProvider: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Backend name for display
    fn name(&self) -> &'static str;
}

/// In-memory store; can be switched to fail every call
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.data.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self, key: &str, write: bool) -> Result<(), StorageError> {
        if !self.failing.load(Ordering::SeqCst) {
            return Ok(());
        }
        let key = key.to_string();
        let reason = "store unavailable".to_string();
        Err(if write {
            StorageError::Write { key, reason }
        } else {
            StorageError::Read { key, reason }
        })
    }
}

#[async_trait]
impl PersistenceProvider for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check(key, false)?;
        let data = self.data.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(data.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.check(key, true)?;
        let mut data = self.data.lock().unwrap_or_else(PoisonError::into_inner);
        data.insert(key.to_string(), value);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Memory"
    }
}
