//! Per-region persistent records.
//!
//! Everything the planner keeps between invocations goes through a
//! [`RegionMemoryStore`], keyed by region name and record key. Each record
//! carries its schema version next to a JSON payload. Records older than the
//! current schema load with serde defaults for newly added fields and are
//! rewritten at the current version. Records newer than the current schema
//! are refused and left untouched.

use crate::error::PlannerError;
use fnv::FnvHashMap;
use log::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const PLAN_KEY: &str = "plan";
pub const VERDICT_KEY: &str = "verdict";
pub const PIPELINE_KEY: &str = "pipeline";
pub const SCHEDULER_KEY: &str = "scheduler";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub version: u32,
    pub payload: String,
}

/// Key-value memory scoped per region.
pub trait RegionMemoryStore {
    fn get(&self, region: &str, key: &str) -> Option<StoredRecord>;

    fn set(&mut self, region: &str, key: &str, record: StoredRecord);

    fn remove(&mut self, region: &str, key: &str);

    /// Drop every record of a region.
    fn remove_region(&mut self, region: &str);
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryRegionStore {
    regions: FnvHashMap<String, FnvHashMap<String, StoredRecord>>,
}

impl InMemoryRegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_region(&self, region: &str) -> bool {
        self.regions.get(region).map_or(false, |r| !r.is_empty())
    }
}

impl RegionMemoryStore for InMemoryRegionStore {
    fn get(&self, region: &str, key: &str) -> Option<StoredRecord> {
        self.regions.get(region)?.get(key).cloned()
    }

    fn set(&mut self, region: &str, key: &str, record: StoredRecord) {
        self.regions
            .entry(region.to_string())
            .or_default()
            .insert(key.to_string(), record);
    }

    fn remove(&mut self, region: &str, key: &str) {
        if let Some(records) = self.regions.get_mut(region) {
            records.remove(key);
        }
    }

    fn remove_region(&mut self, region: &str) {
        self.regions.remove(region);
    }
}

pub fn save_record<T: Serialize>(
    store: &mut dyn RegionMemoryStore,
    region: &str,
    key: &str,
    version: u32,
    value: &T,
) -> Result<(), PlannerError> {
    let payload = serde_json::to_string(value)?;
    store.set(region, key, StoredRecord { version, payload });
    Ok(())
}

/// Load a record, migrating it forward to `current_version` if it is older.
pub fn load_record<T: Serialize + DeserializeOwned>(
    store: &mut dyn RegionMemoryStore,
    region: &str,
    key: &str,
    current_version: u32,
) -> Result<Option<T>, PlannerError> {
    let record = match store.get(region, key) {
        Some(record) => record,
        None => return Ok(None),
    };

    if record.version > current_version {
        return Err(PlannerError::UnsupportedVersion {
            key: key.to_string(),
            found: record.version,
            supported: current_version,
        });
    }

    let value: T = serde_json::from_str(&record.payload)?;

    if record.version < current_version {
        info!(
            "Migrating {} record of {} from version {} to {}",
            key, region, record.version, current_version
        );
        save_record(store, region, key, current_version, &value)?;
    }

    Ok(Some(value))
}
