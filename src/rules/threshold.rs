// src/rules/threshold.rs
//! Fixed-threshold large amount rule

use crate::rules::Rule;
use crate::{ConfigError, RuleError, Transaction};

pub const DEFAULT_THRESHOLD: f64 = 10_000.0;

/// Flags any transaction whose amount is strictly above `threshold`.
///
/// Stateless: the only data is read-only configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LargeTransactionRule {
    threshold: f64,
}

/// Name used where the rule is described by what it compares against.
pub type ThresholdRule = LargeTransactionRule;

impl LargeTransactionRule {
    pub const NAME: &'static str = "LargeTransactionRule";

    pub fn new(threshold: f64) -> Result<Self, ConfigError> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                rule: Self::NAME,
                reason: format!("threshold must be a positive number, got {}", threshold),
            });
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[inline]
    pub fn exceeds(&self, amount: f64) -> bool {
        amount > self.threshold
    }
}

impl Default for LargeTransactionRule {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl Rule for LargeTransactionRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn check(&mut self, transaction: &Transaction) -> Result<bool, RuleError> {
        Ok(self.exceeds(transaction.amount()))
    }
}
