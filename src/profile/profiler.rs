// src/profile/profiler.rs
//! Standalone profile-driven evaluation
//!
//! Unlike the detector's rule list, the profiler owns its profile store and
//! produces flags directly: a dynamic flag relative to the user's own
//! average and an absolute large-amount flag.

use crate::profile::{exceeds_average, ProfileEngine};
use crate::rules::{DynamicLargeTransactionRule, LargeTransactionRule};
use crate::{ConfigError, Transaction};

pub const DEFAULT_PROFILER_THRESHOLD: f64 = 1_000.0;

#[derive(Debug, Clone)]
pub struct Profiler {
    engine: ProfileEngine,
    multiplier: f64,
    threshold: f64,
}

impl Profiler {
    pub const NAME: &'static str = "Profiler";

    pub fn new(multiplier: f64, threshold: f64) -> Result<Self, ConfigError> {
        for (param, value) in [("multiplier", multiplier), ("threshold", threshold)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidParameter {
                    rule: Self::NAME,
                    reason: format!("{} must be a positive number, got {}", param, value),
                });
            }
        }
        Ok(Self {
            engine: ProfileEngine::new(),
            multiplier,
            threshold,
        })
    }

    /// Flags for `transaction`, computed against the profile as it stood
    /// before this transaction. The profile is updated afterwards.
    pub fn evaluate(&mut self, transaction: &Transaction) -> Vec<String> {
        let mut flags = Vec::new();

        let average = self.engine.get_profile(transaction.user_id()).average_amount;
        if exceeds_average(transaction.amount(), average, self.multiplier) {
            flags.push(DynamicLargeTransactionRule::NAME.to_string());
        }
        if transaction.amount() > self.threshold {
            flags.push(LargeTransactionRule::NAME.to_string());
        }

        self.engine.update_profile(transaction);
        flags
    }

    pub fn profiles(&self) -> &ProfileEngine {
        &self.engine
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self {
            engine: ProfileEngine::new(),
            multiplier: crate::rules::dynamic::DEFAULT_MULTIPLIER,
            threshold: DEFAULT_PROFILER_THRESHOLD,
        }
    }
}
