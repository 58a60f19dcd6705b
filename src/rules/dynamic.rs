// src/rules/dynamic.rs
//! Profile-relative large amount rule

use crate::profile::{exceeds_average, SharedProfiles};
use crate::rules::Rule;
use crate::{ConfigError, RuleError, Transaction};

pub const DEFAULT_MULTIPLIER: f64 = 3.0;

/// Flags an amount of at least `multiplier` times the user's average.
///
/// Only reads the shared profile store. The detector that owns this rule is
/// responsible for folding the transaction into the profile once every rule
/// has run, so the comparison is always against the pre-update average.
#[derive(Debug, Clone)]
pub struct DynamicLargeTransactionRule {
    multiplier: f64,
    profiles: SharedProfiles,
}

impl DynamicLargeTransactionRule {
    pub const NAME: &'static str = "DynamicLargeTransactionRule";

    pub fn new(multiplier: f64, profiles: SharedProfiles) -> Result<Self, ConfigError> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                rule: Self::NAME,
                reason: format!("multiplier must be a positive number, got {}", multiplier),
            });
        }
        Ok(Self {
            multiplier,
            profiles,
        })
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn profiles(&self) -> &SharedProfiles {
        &self.profiles
    }
}

impl Rule for DynamicLargeTransactionRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn check(&mut self, transaction: &Transaction) -> Result<bool, RuleError> {
        let profiles = self
            .profiles
            .read()
            .map_err(|_| RuleError::fault(Self::NAME, "profile store lock poisoned"))?;
        let average = profiles.get_profile(transaction.user_id()).average_amount;

        Ok(exceeds_average(transaction.amount(), average, self.multiplier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProfileEngine;
    use chrono::Utc;
    use std::sync::Arc;

    fn txn(amount: f64) -> Transaction {
        Transaction::new("t", "u1", "m1", amount, Utc::now()).unwrap()
    }

    #[test]
    fn test_reads_without_updating() {
        let profiles = ProfileEngine::shared();
        let mut rule = DynamicLargeTransactionRule::new(3.0, profiles.clone()).unwrap();

        assert!(!rule.check(&txn(1_000_000.0)).unwrap());
        assert!(profiles.read().unwrap().is_empty());
    }

    #[test]
    fn test_flags_against_existing_average() {
        let profiles = ProfileEngine::shared();
        profiles.write().unwrap().update_profile(&txn(50.0));
        let mut rule = DynamicLargeTransactionRule::new(3.0, profiles).unwrap();

        assert!(rule.check(&txn(150.0)).unwrap());
        assert!(!rule.check(&txn(149.0)).unwrap());
    }

    #[test]
    fn test_poisoned_store_is_a_fault() {
        let profiles = ProfileEngine::shared();
        let poison = Arc::clone(&profiles);
        let _ = std::thread::spawn(move || {
            let _guard = poison.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        let mut rule = DynamicLargeTransactionRule::new(3.0, profiles).unwrap();
        assert!(matches!(rule.check(&txn(10.0)), Err(RuleError::Fault { .. })));
    }

    #[test]
    fn test_invalid_multiplier() {
        assert!(DynamicLargeTransactionRule::new(0.0, ProfileEngine::shared()).is_err());
    }
}
