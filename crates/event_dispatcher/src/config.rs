//! Dispatcher configuration

use crate::error::DispatchError;
use serde::{Deserialize, Serialize};

fn default_wildcard_cache() -> bool {
    true
}

fn default_max_defer_depth() -> usize {
    64
}

/// Tunables for an [`EventDispatcher`](crate::EventDispatcher).
///
/// Usually embedded as a `[dispatcher]` table in a host application's TOML
/// configuration; every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Cache wildcard matches per event name until the next listener change
    #[serde(default = "default_wildcard_cache")]
    pub wildcard_cache: bool,
    /// Log a warning when an event is dispatched with no listeners
    #[serde(default)]
    pub warn_unhandled: bool,
    /// Maximum number of nested `defer` contexts per dispatcher scope
    #[serde(default = "default_max_defer_depth")]
    pub max_defer_depth: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            wildcard_cache: default_wildcard_cache(),
            warn_unhandled: false,
            max_defer_depth: default_max_defer_depth(),
        }
    }
}

impl DispatcherConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, DispatchError> {
        let config: DispatcherConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.max_defer_depth == 0 {
            return Err(DispatchError::Config(
                "max_defer_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = DispatcherConfig::from_toml_str("").unwrap();
        assert_eq!(config, DispatcherConfig::default());
        assert!(config.wildcard_cache);
        assert!(!config.warn_unhandled);
        assert_eq!(config.max_defer_depth, 64);
    }

    #[test]
    fn fields_override_defaults() {
        let config = DispatcherConfig::from_toml_str(
            r#"
wildcard_cache = false
warn_unhandled = true
max_defer_depth = 4
"#,
        )
        .unwrap();
        assert!(!config.wildcard_cache);
        assert!(config.warn_unhandled);
        assert_eq!(config.max_defer_depth, 4);
    }

    #[test]
    fn zero_depth_is_rejected() {
        let err = DispatcherConfig::from_toml_str("max_defer_depth = 0").unwrap_err();
        assert!(matches!(err, DispatchError::Config(_)));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = DispatcherConfig::from_toml_str("wildcard_cache = \"maybe\"").unwrap_err();
        assert!(matches!(err, DispatchError::Config(_)));
    }
}
