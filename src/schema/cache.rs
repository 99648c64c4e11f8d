// src/schema/cache.rs
//! Short-lived memo of schema inspections.
//!
//! Keyed by database and integration so two profiles pointing at the same
//! database through different integrations never share an entry. Entries
//! live for [`SCHEMA_VALIDATION_TTL_MINUTES`]; only successful inspections
//! are stored.

use super::inspector;
use super::DatabaseSchemaCheck;
use crate::api::NotionRepository;
use crate::clock::{Clock, SystemClock};
use crate::constants::{CACHE_KEY_SUFFIX_LEN, SCHEMA_VALIDATION_TTL_MINUTES};
use crate::error::AppError;
use crate::types::{ApiKey, DatabaseId};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// `"<database id>-<last 8 chars of the API key>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(api_key: &ApiKey, database_id: &DatabaseId) -> Self {
        Self(format!(
            "{}-{}",
            database_id.as_str(),
            api_key.suffix(CACHE_KEY_SUFFIX_LEN)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct CacheEntry {
    check: DatabaseSchemaCheck,
    stored_at: DateTime<Utc>,
}

pub struct ValidationCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ValidationCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::minutes(SCHEMA_VALIDATION_TTL_MINUTES),
            clock,
        }
    }

    /// Returns the stored check if it is still fresh. Stale entries are dropped.
    pub fn lookup(&self, key: &CacheKey) -> Option<DatabaseSchemaCheck> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if now - entry.stored_at < self.ttl => Some(entry.check.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn store(&self, key: CacheKey, check: DatabaseSchemaCheck) {
        let stored_at = self.clock.now();
        self.entries.lock().insert(key, CacheEntry { check, stored_at });
    }

    /// Inspects the database unless a fresh result is already cached.
    pub async fn inspect_cached<R>(
        &self,
        repo: &R,
        database_id: &DatabaseId,
    ) -> Result<DatabaseSchemaCheck, AppError>
    where
        R: NotionRepository + ?Sized,
    {
        let key = CacheKey::new(repo.api_key(), database_id);
        if let Some(check) = self.lookup(&key) {
            log::debug!("Schema cache hit for {}", key);
            return Ok(check);
        }

        let check = inspector::inspect(repo, database_id).await?;
        self.store(key, check.clone());
        Ok(check)
    }

    /// Drops one entry, or every entry when `key` is `None`.
    pub fn invalidate(&self, key: Option<&CacheKey>) {
        let mut entries = self.entries.lock();
        match key {
            Some(key) => {
                entries.remove(key);
            }
            None => entries.clear(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for ValidationCache {
    fn default() -> Self {
        Self::new()
    }
}
