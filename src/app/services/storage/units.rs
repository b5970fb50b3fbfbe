//! Persisted sensor unit settings

use std::sync::Arc;
use tracing::{debug, warn};

use super::store::KeyValueStore;
use crate::Result;
use crate::app::models::{SensorKey, SensorUnitConfig};
use crate::constants::UNITS_STORAGE_KEY;

/// Write-through wrapper around [`SensorUnitConfig`]
#[derive(Debug)]
pub struct UnitSettings {
    store: Arc<dyn KeyValueStore>,
    units: SensorUnitConfig,
}

impl UnitSettings {
    /// Load unit settings; malformed JSON falls back to the defaults
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let units = match store.get(UNITS_STORAGE_KEY)? {
            Some(json) => SensorUnitConfig::from_json(&json).unwrap_or_else(|e| {
                warn!("Ignoring malformed sensor units: {}", e);
                SensorUnitConfig::defaults()
            }),
            None => SensorUnitConfig::defaults(),
        };
        Ok(Self { store, units })
    }

    /// Write `next` to the store, then make it the in-memory state
    fn commit(&mut self, next: SensorUnitConfig) -> Result<()> {
        self.store.set(UNITS_STORAGE_KEY, &next.to_json()?)?;
        self.units = next;
        Ok(())
    }

    pub fn unit(&self, key: SensorKey) -> &str {
        self.units.unit(key)
    }

    pub fn units(&self) -> &SensorUnitConfig {
        &self.units
    }

    pub fn set_unit(&mut self, key: SensorKey, unit: &str) -> Result<()> {
        debug!("Setting unit for {} to '{}'", key, unit);
        let mut next = self.units.clone();
        next.set(key, unit.trim());
        self.commit(next)
    }

    pub fn reset_to_defaults(&mut self) -> Result<()> {
        self.commit(SensorUnitConfig::defaults())
    }
}
