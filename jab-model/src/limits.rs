//! Walk limits and their validation

use crate::error::{BindError, Result};

/// Limits applied while walking value graphs and JSON trees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum nesting depth of objects/lists (default: 64, hard: 512)
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

impl Limits {
    /// Hard maximum limits that cannot be exceeded
    pub fn hard_maximums() -> Self {
        Self { max_depth: 512 }
    }

    /// Validate limits against hard maximums
    pub fn validate(&self) -> Result<()> {
        let hard = Self::hard_maximums();
        if self.max_depth == 0 {
            return Err(BindError::ConfigurationExceedsHardLimits(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.max_depth > hard.max_depth {
            return Err(BindError::ConfigurationExceedsHardLimits(format!(
                "max_depth {} exceeds hard limit {}",
                self.max_depth, hard.max_depth
            )));
        }
        Ok(())
    }

    /// Fail if `depth` is past `max_depth`
    pub fn check_depth(&self, depth: usize, path: &str) -> Result<()> {
        if depth > self.max_depth {
            return Err(BindError::LimitExceeded(format!(
                "nesting depth {} at '{}' exceeds max_depth {}",
                depth, path, self.max_depth
            )));
        }
        Ok(())
    }
}
