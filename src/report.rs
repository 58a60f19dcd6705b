// src/report.rs
//! Stream-level detection statistics

use crate::detector::{EvaluationResult, RuleOutcome};
use ahash::HashMap;
use tracing::info;

/// Join flags into the `a;b;c` form used in alert output.
pub fn format_flags(flags: &[String]) -> String {
    flags.join(";")
}

/// Counters accumulated over a detection run
#[derive(Debug, Clone, Default)]
pub struct DetectionReport {
    pub total: u64,
    pub flagged: u64,
    pub rule_faults: u64,
    rule_counts: HashMap<String, u64>,
    user_counts: HashMap<String, u64>,
}

impl DetectionReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &EvaluationResult) {
        self.total += 1;
        if !result.is_fraud {
            return;
        }

        self.flagged += 1;
        for flag in &result.flags {
            *self.rule_counts.entry(flag.clone()).or_insert(0) += 1;
        }
        *self.user_counts.entry(result.user_id.clone()).or_insert(0) += 1;
    }

    /// Record a pass together with its per-rule outcomes, counting faults.
    pub fn record_outcomes(&mut self, result: &EvaluationResult, outcomes: &[RuleOutcome]) {
        self.rule_faults += outcomes.iter().filter(|o| o.is_fault()).count() as u64;
        self.record(result);
    }

    pub fn rule_count(&self, rule: &str) -> u64 {
        self.rule_counts.get(rule).copied().unwrap_or(0)
    }

    pub fn user_count(&self, user_id: &str) -> u64 {
        self.user_counts.get(user_id).copied().unwrap_or(0)
    }

    /// Every rule that fired, most frequent first.
    pub fn top_rules(&self) -> Vec<(String, u64)> {
        ranked(&self.rule_counts, usize::MAX)
    }

    /// The `n` most frequently flagged users.
    pub fn top_users(&self, n: usize) -> Vec<(String, u64)> {
        ranked(&self.user_counts, n)
    }

    pub fn log_summary(&self, top_users: usize) {
        info!("=== Detection Summary ===");
        info!("Total transactions processed: {}", self.total);
        info!("Total flagged (fraud): {}", self.flagged);
        if self.rule_faults > 0 {
            info!("Rule faults: {}", self.rule_faults);
        }
        info!("Top rules fired:");
        for (rule, count) in self.top_rules() {
            info!("  {}: {}", rule, count);
        }
        info!("Top flagged users:");
        for (user, count) in self.top_users(top_users) {
            info!("  {}: {}", user, count);
        }
    }
}

fn ranked(counts: &HashMap<String, u64>, n: usize) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(n);
    entries
}
