//! Flash-backed configuration store.
//!
//! Implements [`ConfigPort`] by keeping a single `postcard` blob in the
//! config region:
//!
//! ```text
//! CONFIG_REGION_BASE: [len u16 LE][postcard(SystemConfig) …][0xFF …]
//! ```
//!
//! An erased length field means "never saved": `load` returns defaults.
//! `save` validates first and never persists an out-of-range config.

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, FlashPort};
use crate::config::SystemConfig;
use crate::storage::layout::{CONFIG_REGION_BASE, CONFIG_REGION_LEN};

const LEN_PREFIX: usize = 2;
const ERASED_LEN: u16 = 0xFFFF;

pub struct FlashConfigStore<F: FlashPort> {
    flash: F,
}

impl<F: FlashPort> FlashConfigStore<F> {
    pub fn new(flash: F) -> Self {
        Self { flash }
    }

    pub fn into_inner(self) -> F {
        self.flash
    }
}

impl<F: FlashPort> ConfigPort for FlashConfigStore<F> {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let mut prefix = [0u8; LEN_PREFIX];
        self.flash.read(CONFIG_REGION_BASE, &mut prefix)?;
        let len = u16::from_le_bytes(prefix);
        if len == ERASED_LEN {
            info!("FlashConfigStore: no stored config, using defaults");
            return Ok(SystemConfig::default());
        }
        if len as u32 > CONFIG_REGION_LEN - LEN_PREFIX as u32 {
            warn!("FlashConfigStore: blob length {len} exceeds region");
            return Err(ConfigError::Corrupted);
        }

        let mut blob = vec![0u8; len as usize];
        self.flash
            .read(CONFIG_REGION_BASE + LEN_PREFIX as u32, &mut blob)?;
        let cfg: SystemConfig = postcard::from_bytes(&blob).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        info!("FlashConfigStore: loaded config ({len} bytes)");
        Ok(cfg)
    }

    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;

        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        if bytes.len() + LEN_PREFIX > CONFIG_REGION_LEN as usize {
            return Err(ConfigError::StorageFull);
        }

        self.flash.erase(CONFIG_REGION_BASE, CONFIG_REGION_LEN)?;
        self.flash
            .write(CONFIG_REGION_BASE, &(bytes.len() as u16).to_le_bytes())?;
        self.flash
            .write(CONFIG_REGION_BASE + LEN_PREFIX as u32, &bytes)?;
        info!("FlashConfigStore: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_flash::MemoryFlash;

    #[test]
    fn first_boot_loads_defaults() {
        let store = FlashConfigStore::new(MemoryFlash::new());
        assert_eq!(store.load().unwrap(), SystemConfig::default());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let mut store = FlashConfigStore::new(MemoryFlash::new());
        let cfg = SystemConfig {
            mop_debounce_reads: 5,
            link_refresh_ticks: 12_345,
            ..Default::default()
        };
        store.save(&cfg).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.mop_debounce_reads, 5);
        assert_eq!(loaded.link_refresh_ticks, 12_345);
    }

    #[test]
    fn save_overwrites_previous_blob() {
        let mut store = FlashConfigStore::new(MemoryFlash::new());
        store.save(&SystemConfig::default()).unwrap();
        let cfg = SystemConfig {
            activation_cycles: 4,
            ..Default::default()
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load().unwrap().activation_cycles, 4);
    }

    #[test]
    fn invalid_config_is_not_persisted() {
        let mut store = FlashConfigStore::new(MemoryFlash::new());
        let bad = SystemConfig {
            mop_debounce_reads: 0,
            ..Default::default()
        };
        assert!(matches!(store.save(&bad), Err(ConfigError::ValidationFailed(_))));
        assert_eq!(store.load().unwrap(), SystemConfig::default());
    }

    #[test]
    fn garbage_blob_is_corrupted() {
        let mut flash = MemoryFlash::new();
        flash.write(CONFIG_REGION_BASE, &[3, 0, 0xFF, 0xFF, 0xFF]).unwrap();
        let store = FlashConfigStore::new(flash);
        assert_eq!(store.load(), Err(ConfigError::Corrupted));
    }
}
