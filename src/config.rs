//! Index configuration.
//!
//! ```rust
//! use spatio_geohash::IndexConfig;
//!
//! let json = r#"{ "precision": 5, "lock_timeout_ms": 250 }"#;
//! let config = IndexConfig::from_json(json)?;
//! assert_eq!(config.precision.get(), 5);
//! # Ok::<(), spatio_geohash::GeohashError>(())
//! ```

use crate::compute::geohash::Precision;
use crate::error::{GeohashError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings applied when an index is created or opened through
/// [`IndexBuilder`](crate::IndexBuilder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Code length used when creating an index. Ignored on open, where the
    /// persisted precision wins.
    #[serde(default)]
    pub precision: Precision,

    /// Deadline for acquiring the write synchronizer. `None` waits forever.
    #[serde(default)]
    pub lock_timeout_ms: Option<u64>,
}

impl IndexConfig {
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lock_timeout_ms == Some(0) {
            return Err(GeohashError::InvalidInput(
                "Lock timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: IndexConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: IndexConfig =
            toml::from_str(toml_str).map_err(|e| GeohashError::InvalidInput(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GeohashError::InvalidInput(e.to_string()))
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            precision: Precision::DEFAULT,
            lock_timeout_ms: None,
        }
    }
}
