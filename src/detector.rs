// src/detector.rs
//! Evaluation pass over a fixed rule list
//!
//! The detector runs every rule in configured order against one transaction
//! and collects the names of the rules that fired. A faulting rule is logged
//! and counted as not-triggered; it never aborts the pass or the stream.

use crate::profile::SharedProfiles;
use crate::rules::Rule;
use crate::{RuleError, Transaction};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Outcome of one evaluation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub transaction_id: String,
    pub user_id: String,
    /// Triggered rule names, in rule evaluation order
    pub flags: Vec<String>,
    pub is_fraud: bool,
}

impl EvaluationResult {
    pub fn new(transaction: &Transaction, flags: Vec<String>) -> Self {
        Self {
            transaction_id: transaction.transaction_id().to_string(),
            user_id: transaction.user_id().to_string(),
            is_fraud: !flags.is_empty(),
            flags,
        }
    }
}

/// Verdict of a single rule within a pass
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub rule: String,
    pub verdict: Result<bool, RuleError>,
}

impl RuleOutcome {
    pub fn triggered(&self) -> bool {
        matches!(self.verdict, Ok(true))
    }

    pub fn is_fault(&self) -> bool {
        self.verdict.is_err()
    }
}

/// Runs a fixed, ordered rule set against one transaction at a time
pub struct Detector {
    rules: Vec<Box<dyn Rule>>,
    profiles: Option<SharedProfiles>,
}

impl Detector {
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self {
            rules,
            profiles: None,
        }
    }

    /// Attach a profile store. Each evaluated transaction is folded into it
    /// exactly once, after every rule has seen the pre-update profile.
    pub fn with_profiles(mut self, profiles: SharedProfiles) -> Self {
        self.profiles = Some(profiles);
        self
    }

    pub fn profiles(&self) -> Option<&SharedProfiles> {
        self.profiles.as_ref()
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule and build the result.
    pub fn evaluate(&mut self, transaction: &Transaction) -> EvaluationResult {
        self.evaluate_with_outcomes(transaction).0
    }

    /// Like [`Detector::evaluate`], also returning each rule's raw verdict.
    pub fn evaluate_with_outcomes(
        &mut self,
        transaction: &Transaction,
    ) -> (EvaluationResult, Vec<RuleOutcome>) {
        let mut outcomes = Vec::with_capacity(self.rules.len());

        for rule in self.rules.iter_mut() {
            let verdict = rule.check(transaction);
            if let Err(e) = &verdict {
                error!(
                    rule = rule.name(),
                    transaction_id = transaction.transaction_id(),
                    error = %e,
                    "Rule evaluation failed, treating as not triggered"
                );
            }
            outcomes.push(RuleOutcome {
                rule: rule.name().to_string(),
                verdict,
            });
        }

        self.update_profile(transaction);

        let flags = outcomes
            .iter()
            .filter(|outcome| outcome.triggered())
            .map(|outcome| outcome.rule.clone())
            .collect();
        let result = EvaluationResult::new(transaction, flags);

        debug!(
            transaction_id = %result.transaction_id,
            user_id = %result.user_id,
            flags = ?result.flags,
            "Transaction evaluated"
        );

        (result, outcomes)
    }

    /// Lazily evaluate a stream, one transaction at a time in arrival order.
    pub fn detect<I>(&mut self, transactions: I) -> Detections<'_, I::IntoIter>
    where
        I: IntoIterator<Item = Transaction>,
    {
        Detections {
            detector: self,
            transactions: transactions.into_iter(),
        }
    }

    fn update_profile(&self, transaction: &Transaction) {
        let Some(profiles) = &self.profiles else {
            return;
        };
        match profiles.write() {
            Ok(mut engine) => {
                engine.update_profile(transaction);
            }
            Err(_) => error!(
                transaction_id = transaction.transaction_id(),
                "Profile store lock poisoned, profile not updated"
            ),
        }
    }
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("rules", &self.rule_names())
            .field("profiles", &self.profiles.is_some())
            .finish()
    }
}

/// Iterator returned by [`Detector::detect`]
pub struct Detections<'a, I> {
    detector: &'a mut Detector,
    transactions: I,
}

impl<I> Iterator for Detections<'_, I>
where
    I: Iterator<Item = Transaction>,
{
    type Item = EvaluationResult;

    fn next(&mut self) -> Option<Self::Item> {
        let transaction = self.transactions.next()?;
        Some(self.detector.evaluate(&transaction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{DynamicLargeTransactionRule, LargeTransactionRule, RapidTransactionsRule};
    use crate::ProfileEngine;
    use chrono::{Duration, TimeZone, Utc};

    struct FailingRule;

    impl Rule for FailingRule {
        fn name(&self) -> &str {
            "FailingRule"
        }

        fn check(&mut self, _transaction: &Transaction) -> Result<bool, RuleError> {
            Err(RuleError::fault("FailingRule", "backend unavailable"))
        }
    }

    struct AlwaysRule;

    impl Rule for AlwaysRule {
        fn name(&self) -> &str {
            "AlwaysRule"
        }

        fn check(&mut self, _transaction: &Transaction) -> Result<bool, RuleError> {
            Ok(true)
        }
    }

    fn txn(id: &str, user: &str, amount: f64, secs: i64) -> Transaction {
        let t0 = Utc.with_ymd_and_hms(2025, 9, 16, 10, 0, 0).unwrap();
        Transaction::new(id, user, "m1", amount, t0 + Duration::seconds(secs)).unwrap()
    }

    #[test]
    fn test_empty_rule_list() {
        let mut detector = Detector::new(Vec::new());
        let result = detector.evaluate(&txn("1", "u1", 1_000_000.0, 0));

        assert!(result.flags.is_empty());
        assert!(!result.is_fraud);
        assert_eq!(result.transaction_id, "1");
        assert_eq!(result.user_id, "u1");
    }

    #[test]
    fn test_fault_does_not_abort_pass() {
        let rules: Vec<Box<dyn Rule>> = vec![Box::new(FailingRule), Box::new(AlwaysRule)];
        let mut detector = Detector::new(rules);

        let (result, outcomes) = detector.evaluate_with_outcomes(&txn("1", "u1", 10.0, 0));

        assert_eq!(result.flags, vec!["AlwaysRule"]);
        assert!(result.is_fraud);
        assert!(outcomes[0].is_fault());
        assert!(!outcomes[0].triggered());
        assert!(outcomes[1].triggered());
    }

    #[test]
    fn test_flags_follow_rule_order() {
        let rules: Vec<Box<dyn Rule>> = vec![
            Box::new(LargeTransactionRule::new(100.0).unwrap()),
            Box::new(AlwaysRule),
        ];
        let mut detector = Detector::new(rules);

        let result = detector.evaluate(&txn("1", "u1", 500.0, 0));
        assert_eq!(result.flags, vec!["LargeTransactionRule", "AlwaysRule"]);
    }

    #[test]
    fn test_stateless_evaluation_is_deterministic() {
        let rules: Vec<Box<dyn Rule>> = vec![Box::new(LargeTransactionRule::new(100.0).unwrap())];
        let mut detector = Detector::new(rules);
        let transaction = txn("1", "u1", 500.0, 0);

        assert_eq!(detector.evaluate(&transaction), detector.evaluate(&transaction));
    }

    #[test]
    fn test_profile_updated_once_after_rules() {
        let profiles = ProfileEngine::shared();
        let rules: Vec<Box<dyn Rule>> = vec![Box::new(
            DynamicLargeTransactionRule::new(3.0, profiles.clone()).unwrap(),
        )];
        let mut detector = Detector::new(rules).with_profiles(profiles.clone());

        assert!(!detector.evaluate(&txn("1", "u1", 100.0, 0)).is_fraud);
        assert!(detector.evaluate(&txn("2", "u1", 300.0, 1)).is_fraud);

        let profile = profiles.read().unwrap().get_profile("u1");
        assert_eq!(profile.transaction_count, 2);
        assert_eq!(profile.total_amount, 400.0);
    }

    #[test]
    fn test_detect_stream() {
        let rules: Vec<Box<dyn Rule>> =
            vec![Box::new(RapidTransactionsRule::new(2, Duration::seconds(60)).unwrap())];
        let mut detector = Detector::new(rules);

        let stream = vec![
            txn("1", "u1", 1.0, 0),
            txn("2", "u1", 1.0, 10),
            txn("3", "u1", 1.0, 20),
        ];
        let fraud: Vec<bool> = detector.detect(stream).map(|r| r.is_fraud).collect();

        assert_eq!(fraud, vec![false, false, true]);
    }
}
