//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::graph::DEFAULT_MAX_DEPTH;

/// Tunables for the permission engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Depth used when a closure query does not name one
    pub default_max_depth: usize,

    /// Largest depth a closure query may ask for
    pub max_depth_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_max_depth: DEFAULT_MAX_DEPTH,
            max_depth_limit: 10,
        }
    }
}

impl EngineConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_depth_limit == 0 {
            return Err(GraphError::InvalidInput(
                "max_depth_limit must be at least 1".to_string(),
            ));
        }
        if self.default_max_depth > self.max_depth_limit {
            return Err(GraphError::InvalidInput(format!(
                "default_max_depth ({}) exceeds max_depth_limit ({})",
                self.default_max_depth, self.max_depth_limit
            )));
        }
        Ok(())
    }

    /// Reject depths above the configured limit
    pub fn check_depth(&self, max_depth: usize) -> Result<()> {
        if max_depth > self.max_depth_limit {
            return Err(GraphError::InvalidInput(format!(
                "max_depth {} exceeds limit {}",
                max_depth, self.max_depth_limit
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_max_depth, 3);
    }

    #[test]
    fn test_validation() {
        let config = EngineConfig {
            default_max_depth: 5,
            max_depth_limit: 4,
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            default_max_depth: 0,
            max_depth_limit: 0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_check_depth() {
        let config = EngineConfig::default();
        assert!(config.check_depth(10).is_ok());
        assert!(config.check_depth(11).is_err());
    }

    #[test]
    fn test_partial_deserialization() {
        let config: EngineConfig = serde_json::from_str(r#"{"max_depth_limit": 6}"#).unwrap();
        assert_eq!(config.max_depth_limit, 6);
        assert_eq!(config.default_max_depth, 3);
    }
}
