//! Instrument metadata cache.
//!
//! Optional: executions resolve metadata fresh unless a cache is wired in.
//! Entries never expire on their own; callers invalidate explicitly.

use crate::client::InstrumentClient;
use crate::error::RegistryResult;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sigx_core::InstrumentMeta;
use tracing::{debug, warn};

/// Cache entry with change tracking.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub meta: InstrumentMeta,
    pub fetched_at: DateTime<Utc>,
    pub version: u64,
}

/// Instrument metadata cache keyed by instrument id.
#[derive(Debug, Default)]
pub struct InstrumentCache {
    entries: DashMap<String, CacheEntry>,
}

impl InstrumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get cached metadata for an instrument.
    pub fn get(&self, inst_id: &str) -> Option<InstrumentMeta> {
        self.entries.get(inst_id).map(|entry| entry.meta.clone())
    }

    /// Insert or replace metadata.
    ///
    /// Returns `true` when an existing entry had different increments.
    pub fn update(&self, meta: InstrumentMeta) -> bool {
        let key = meta.inst_id.clone();
        let (changed, version) = match self.entries.get(&key) {
            Some(existing) => (existing.meta != meta, existing.version + 1),
            None => (false, 1),
        };

        if changed {
            warn!(
                inst_id = %key,
                version,
                "Instrument increments changed since last fetch"
            );
        }

        self.entries.insert(
            key,
            CacheEntry {
                meta,
                fetched_at: Utc::now(),
                version,
            },
        );
        changed
    }

    /// Drop one instrument so the next lookup refetches it.
    pub fn invalidate(&self, inst_id: &str) -> Option<InstrumentMeta> {
        self.entries.remove(inst_id).map(|(_, entry)| entry.meta)
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the cached entry or fetch and remember it.
    pub async fn resolve(
        &self,
        client: &InstrumentClient,
        inst_id: &str,
    ) -> RegistryResult<InstrumentMeta> {
        if let Some(meta) = self.get(inst_id) {
            debug!(inst_id, "Instrument metadata served from cache");
            return Ok(meta);
        }
        let meta = client.resolve(inst_id).await?;
        self.update(meta.clone());
        Ok(meta)
    }
}
