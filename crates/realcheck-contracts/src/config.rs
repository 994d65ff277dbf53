use serde::{Deserialize, Serialize};

use crate::catalog::Category;
use crate::error::SamplerError;

pub const DEFAULT_HISTORY_LEN: usize = 30;
pub const DEFAULT_PRIMARY_WEIGHT: usize = 3;
pub const DEFAULT_UNIQUE_TARGET: usize = 50;
pub const DEFAULT_MAX_ATTEMPTS: usize = 20;
pub const DEFAULT_PRIMARY_CATEGORY: Category = Category::People;

/// Upper bound accepted for every numeric tunable.
pub const MAX_TUNABLE: usize = 100_000;

/// Tunables shared by both sampling modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Session history window (`H`).
    pub history_len: usize,
    /// Category favoured by the weighted draw; `None` disables the bias.
    pub primary_category: Option<Category>,
    /// Copies of the primary category in the virtual draw list (`W`).
    pub primary_weight: usize,
    /// Swipe-mode advances before a forced reshuffle (`U`).
    pub unique_target: usize,
    /// Draws tried before a recent repeat is accepted.
    pub max_attempts: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            history_len: DEFAULT_HISTORY_LEN,
            primary_category: Some(DEFAULT_PRIMARY_CATEGORY),
            primary_weight: DEFAULT_PRIMARY_WEIGHT,
            unique_target: DEFAULT_UNIQUE_TARGET,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<(), SamplerError> {
        let checks = [
            ("history_len", self.history_len),
            ("primary_weight", self.primary_weight),
            ("unique_target", self.unique_target),
            ("max_attempts", self.max_attempts),
        ];
        for (name, value) in checks {
            if value == 0 {
                return Err(SamplerError::InvalidConfig(format!(
                    "{name} must be at least 1"
                )));
            }
            if value > MAX_TUNABLE {
                return Err(SamplerError::InvalidConfig(format!(
                    "{name} must be at most {MAX_TUNABLE}"
                )));
            }
        }
        Ok(())
    }
}
