//! Configuration sources for the timer engine.
//!
//! The engine never caches durations: it asks its [`ConfigSource`] for the
//! current values every time a session ends. [`SharedConfig`] is the live
//! handle the daemon hands to the engine and keeps fresh when the user
//! changes settings; [`Settings`] is the persisted form.

mod error;
mod settings;

use std::sync::{Arc, PoisonError, RwLock};

pub use error::SettingsError;
pub use settings::{CompletionMessages, MessageText, Settings, SettingsStore};

use crate::types::{ConfigError, EngineConfig};

/// Read accessor the engine consults at every session boundary.
pub trait ConfigSource: Send + Sync {
    /// Returns the configuration as it is right now.
    fn current(&self) -> EngineConfig;
}

impl ConfigSource for EngineConfig {
    fn current(&self) -> EngineConfig {
        self.clone()
    }
}

impl<T: ConfigSource + ?Sized> ConfigSource for Arc<T> {
    fn current(&self) -> EngineConfig {
        (**self).current()
    }
}

// ============================================================================
// SharedConfig
// ============================================================================

/// Cloneable, validated, live engine configuration.
///
/// Every clone observes the same value. Updates are validated before they
/// are stored, so readers only ever see a valid configuration.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    inner: Arc<RwLock<EngineConfig>>,
}

impl SharedConfig {
    /// Creates a shared configuration from a valid initial value.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(RwLock::new(config)),
        })
    }

    /// Applies `change` to a copy of the current value and stores it if valid.
    ///
    /// Returns the stored configuration.
    ///
    /// # Errors
    ///
    /// Returns an error (and keeps the old value) if the result is invalid.
    pub fn update(
        &self,
        change: impl FnOnce(&mut EngineConfig),
    ) -> Result<EngineConfig, ConfigError> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.clone();
        change(&mut next);
        next.validate()?;
        *guard = next.clone();
        tracing::debug!(config = ?next, "engine configuration updated");
        Ok(next)
    }

    /// Replaces the whole configuration.
    ///
    /// # Errors
    ///
    /// Returns an error (and keeps the old value) if `config` is invalid.
    pub fn replace(&self, config: EngineConfig) -> Result<(), ConfigError> {
        self.update(|current| *current = config).map(|_| ())
    }
}

impl ConfigSource for SharedConfig {
    fn current(&self) -> EngineConfig {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

// ============================================================================
// Tests
// ============================================================================
