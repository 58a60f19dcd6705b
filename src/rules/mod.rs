// src/rules/mod.rs
//! Fraud heuristics
//!
//! Every heuristic implements [`Rule`]. A rule may keep its own mutable
//! state (per-user history) but never touches the transaction it inspects.
//! A rule that cannot reach a verdict returns a [`RuleError`]; the detector
//! treats that as not-triggered and keeps going.

pub mod dynamic;
pub mod rapid;
pub mod threshold;

use crate::{RuleError, Transaction};

pub use dynamic::DynamicLargeTransactionRule;
pub use rapid::RapidTransactionsRule;
pub use threshold::{LargeTransactionRule, ThresholdRule};

/// A single fraud heuristic
pub trait Rule: Send {
    /// Identifier reported in [`crate::EvaluationResult::flags`].
    fn name(&self) -> &str;

    /// Returns `Ok(true)` when the transaction looks suspicious.
    fn check(&mut self, transaction: &Transaction) -> Result<bool, RuleError>;
}

impl<R: Rule + ?Sized> Rule for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn check(&mut self, transaction: &Transaction) -> Result<bool, RuleError> {
        (**self).check(transaction)
    }
}
