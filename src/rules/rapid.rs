// src/rules/rapid.rs
//! Rolling-window burst detection
//!
//! Each user gets a queue of recent timestamps, oldest first. Every call
//! records the new timestamp, purges everything that fell out of the window
//! and flags when more than `max_txns` timestamps remain.

use crate::rules::Rule;
use crate::{ConfigError, RuleError, Transaction};
use ahash::HashMap;
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

pub const DEFAULT_MAX_TXNS: usize = 3;
pub const DEFAULT_WINDOW_MINUTES: f64 = 1.0;

/// Flags users issuing more than `max_txns` transactions inside `window`.
///
/// Every transaction from the `(max_txns + 1)`-th onward inside a live window
/// is flagged, not only the one that crosses the limit.
///
/// Timestamps that arrive out of order are inserted at their sorted position,
/// and the window is always measured back from the newest timestamp seen for
/// that user. A late arrival older than the window is therefore dropped
/// immediately and only the remaining entries are counted.
#[derive(Debug, Clone)]
pub struct RapidTransactionsRule {
    max_txns: usize,
    window: Duration,
    history: HashMap<String, VecDeque<DateTime<Utc>>>,
}

impl RapidTransactionsRule {
    pub const NAME: &'static str = "RapidTransactionsRule";

    pub fn new(max_txns: usize, window: Duration) -> Result<Self, ConfigError> {
        if max_txns == 0 {
            return Err(ConfigError::InvalidParameter {
                rule: Self::NAME,
                reason: "max_txns must be at least 1".to_string(),
            });
        }
        if window <= Duration::zero() {
            return Err(ConfigError::InvalidParameter {
                rule: Self::NAME,
                reason: format!("window must be positive, got {}", window),
            });
        }

        Ok(Self {
            max_txns,
            window,
            history: HashMap::default(),
        })
    }

    /// Build from a window expressed in (possibly fractional) minutes.
    pub fn from_minutes(max_txns: usize, window_minutes: f64) -> Result<Self, ConfigError> {
        if !window_minutes.is_finite() || window_minutes <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                rule: Self::NAME,
                reason: format!("window_minutes must be positive, got {}", window_minutes),
            });
        }
        let millis = (window_minutes * 60_000.0).round() as i64;
        Self::new(max_txns, Duration::milliseconds(millis))
    }

    pub fn max_txns(&self) -> usize {
        self.max_txns
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Number of timestamps currently held for `user_id`.
    pub fn window_len(&self, user_id: &str) -> usize {
        self.history.get(user_id).map_or(0, VecDeque::len)
    }

    /// Number of users with window state.
    pub fn tracked_users(&self) -> usize {
        self.history.len()
    }

    fn record(&mut self, user_id: &str, at: DateTime<Utc>) -> usize {
        let times = self.history.entry(user_id.to_string()).or_default();

        let pos = times.partition_point(|t| *t <= at);
        times.insert(pos, at);

        let newest = times.back().copied().unwrap_or(at);
        while let Some(&oldest) = times.front() {
            if newest - oldest > self.window {
                times.pop_front();
            } else {
                break;
            }
        }

        times.len()
    }
}

impl Default for RapidTransactionsRule {
    fn default() -> Self {
        Self {
            max_txns: DEFAULT_MAX_TXNS,
            window: Duration::minutes(1),
            history: HashMap::default(),
        }
    }
}

impl Rule for RapidTransactionsRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn check(&mut self, transaction: &Transaction) -> Result<bool, RuleError> {
        let in_window = self.record(transaction.user_id(), transaction.timestamp());
        Ok(in_window > self.max_txns)
    }
}
