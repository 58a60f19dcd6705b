// src/profile/mod.rs
//! Running per-user spending profiles

pub mod profiler;

use crate::Transaction;
use ahash::HashMap;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

pub use profiler::Profiler;

/// Profile store shared between the detector and profile-aware rules
pub type SharedProfiles = Arc<RwLock<ProfileEngine>>;

/// Aggregate of one user's history
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UserProfile {
    pub transaction_count: u64,
    pub total_amount: f64,
    pub average_amount: f64,
}

impl UserProfile {
    fn observe(&mut self, amount: f64) {
        self.transaction_count += 1;
        self.total_amount += amount;
        self.average_amount = self.total_amount / self.transaction_count as f64;
    }
}

/// Owns the profile of every user seen so far. Profiles are never evicted.
#[derive(Debug, Clone, Default)]
pub struct ProfileEngine {
    profiles: HashMap<String, UserProfile>,
}

impl ProfileEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a fresh engine for sharing with profile-aware rules.
    pub fn shared() -> SharedProfiles {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Fold `transaction` into its user's profile and return the new snapshot.
    pub fn update_profile(&mut self, transaction: &Transaction) -> UserProfile {
        let profile = self
            .profiles
            .entry(transaction.user_id().to_string())
            .or_default();
        profile.observe(transaction.amount());
        *profile
    }

    /// Current profile, or a zeroed one for unknown users. Never creates an entry.
    pub fn get_profile(&self, user_id: &str) -> UserProfile {
        self.profiles.get(user_id).copied().unwrap_or_default()
    }

    /// Snapshot of every known profile, ordered by user id.
    pub fn summary(&self) -> BTreeMap<String, UserProfile> {
        self.profiles
            .iter()
            .map(|(user, profile)| (user.clone(), *profile))
            .collect()
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.profiles.contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Deviation check against a user's average taken *before* the current
/// transaction was folded in.
#[inline]
pub fn exceeds_average(amount: f64, average: f64, multiplier: f64) -> bool {
    average > 0.0 && amount >= multiplier * average
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn txn(user: &str, amount: f64) -> Transaction {
        Transaction::new("t", user, "m1", amount, Utc::now()).unwrap()
    }

    #[test]
    fn test_update_and_average() {
        let mut engine = ProfileEngine::new();
        engine.update_profile(&txn("u1", 100.0));
        let profile = engine.update_profile(&txn("u1", 300.0));

        assert_eq!(profile.transaction_count, 2);
        assert_eq!(profile.total_amount, 400.0);
        assert_eq!(profile.average_amount, 200.0);
        assert_eq!(engine.get_profile("u1"), profile);
    }

    #[test]
    fn test_unknown_user_is_zeroed_and_not_stored() {
        let engine = ProfileEngine::new();
        let profile = engine.get_profile("ghost");

        assert_eq!(profile, UserProfile::default());
        assert!(!engine.contains("ghost"));
        assert!(engine.summary().is_empty());
    }

    #[test]
    fn test_summary_is_a_snapshot() {
        let mut engine = ProfileEngine::new();
        engine.update_profile(&txn("u2", 10.0));
        engine.update_profile(&txn("u1", 20.0));

        let snapshot = engine.summary();
        engine.update_profile(&txn("u1", 40.0));

        assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["u1", "u2"]);
        assert_eq!(snapshot["u1"].transaction_count, 1);
        assert_eq!(engine.get_profile("u1").transaction_count, 2);
    }

    #[test]
    fn test_exceeds_average() {
        assert!(!exceeds_average(1000.0, 0.0, 3.0));
        assert!(exceeds_average(300.0, 100.0, 3.0));
        assert!(!exceeds_average(299.99, 100.0, 3.0));
    }
}
