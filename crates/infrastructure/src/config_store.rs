use std::sync::{Arc, Mutex};

use hostwatch_domain::{ConfigError, ResolverConfig};
use tracing::info;

use crate::sync::lock;

pub type ConfigChangeHandler = Arc<dyn Fn(&ResolverConfig) + Send + Sync>;

/// Thread-safe configuration snapshot holder and single change notifier.
///
/// `get` clones the current snapshot out; in-flight resolutions keep the
/// snapshot captured at dispatch. Invalid snapshots are rejected without
/// touching the current one. File watching and hot reload are the
/// embedder's concern; whoever detects a change calls `update`.
pub struct ConfigStore {
    config: Mutex<ResolverConfig>,
    change_handler: Mutex<Option<ConfigChangeHandler>>,
}

impl ConfigStore {
    pub fn new(config: ResolverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: Mutex::new(config),
            change_handler: Mutex::new(None),
        })
    }

    pub fn get(&self) -> ResolverConfig {
        lock(&self.config).clone()
    }

    /// Validate and swap in a new snapshot, then notify the registered
    /// change handler (outside the snapshot lock).
    pub fn update(&self, new: ResolverConfig) -> Result<(), ConfigError> {
        self.replace(new.clone())?;

        let handler = lock(&self.change_handler).clone();
        if let Some(handler) = handler {
            handler(&new);
        }
        Ok(())
    }

    pub fn register_change_handler(&self, handler: ConfigChangeHandler) {
        *lock(&self.change_handler) = Some(handler);
    }

    pub fn clear_change_handler(&self) {
        *lock(&self.change_handler) = None;
    }

    /// Replace the snapshot from a JSON file without notifying the change
    /// handler.
    pub fn load_from_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let new = ResolverConfig::from_json(&contents)?;
        self.replace(new)?;
        info!(path = %path, "Configuration loaded");
        Ok(())
    }

    pub fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let json = self.get().to_json()?;
        std::fs::write(path, json).map_err(|e| ConfigError::io(path, e))?;
        info!(path = %path, "Configuration saved");
        Ok(())
    }

    fn replace(&self, new: ResolverConfig) -> Result<(), ConfigError> {
        new.validate()?;
        *lock(&self.config) = new;
        Ok(())
    }
}
