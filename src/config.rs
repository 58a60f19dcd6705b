// src/config.rs
//! Engine configuration
//!
//! Loaded from TOML. Rules are validated and built before any transaction
//! is processed, so a bad parameter or an unknown rule type fails fast.

use crate::detector::Detector;
use crate::profile::{ProfileEngine, SharedProfiles};
use crate::rules::{dynamic, rapid, threshold};
use crate::rules::{DynamicLargeTransactionRule, LargeTransactionRule, RapidTransactionsRule, Rule};
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default = "default_rules")]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where flagged transactions are written
    #[serde(default = "default_alerts_csv")]
    pub alerts_csv: PathBuf,
    /// How many users the summary lists
    #[serde(default = "default_top_users")]
    pub top_users: usize,
}

/// One entry of the `[[rules]]` list, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleConfig {
    RapidTransactions {
        #[serde(default = "default_max_txns")]
        max_txns: usize,
        #[serde(default = "default_window_minutes")]
        window_minutes: f64,
    },
    LargeTransaction {
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    DynamicLargeTransaction {
        #[serde(default = "default_multiplier")]
        multiplier: f64,
    },
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_alerts_csv() -> PathBuf {
    PathBuf::from("logs/fraud_alerts.csv")
}

fn default_top_users() -> usize {
    10
}

fn default_max_txns() -> usize {
    rapid::DEFAULT_MAX_TXNS
}

fn default_window_minutes() -> f64 {
    rapid::DEFAULT_WINDOW_MINUTES
}

fn default_threshold() -> f64 {
    threshold::DEFAULT_THRESHOLD
}

fn default_multiplier() -> f64 {
    dynamic::DEFAULT_MULTIPLIER
}

fn default_rules() -> Vec<RuleConfig> {
    vec![
        RuleConfig::RapidTransactions {
            max_txns: default_max_txns(),
            window_minutes: default_window_minutes(),
        },
        RuleConfig::LargeTransaction {
            threshold: default_threshold(),
        },
    ]
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            alerts_csv: default_alerts_csv(),
            top_users: default_top_users(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            output: OutputConfig::default(),
            rules: default_rules(),
        }
    }
}

impl RuleConfig {
    /// Construct the rule, validating its parameters.
    pub fn build(&self, profiles: &SharedProfiles) -> Result<Box<dyn Rule>, ConfigError> {
        let rule: Box<dyn Rule> = match self {
            RuleConfig::RapidTransactions {
                max_txns,
                window_minutes,
            } => Box::new(RapidTransactionsRule::from_minutes(*max_txns, *window_minutes)?),
            RuleConfig::LargeTransaction { threshold } => {
                Box::new(LargeTransactionRule::new(*threshold)?)
            }
            RuleConfig::DynamicLargeTransaction { multiplier } => Box::new(
                DynamicLargeTransactionRule::new(*multiplier, profiles.clone())?,
            ),
        };
        Ok(rule)
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Build the detector described by this configuration.
    ///
    /// The detector always carries a profile store, so profiles are kept up
    /// to date for reporting even when no profile-aware rule is configured.
    pub fn build_detector(&self) -> Result<Detector, ConfigError> {
        let profiles = ProfileEngine::shared();
        let rules = self
            .rules
            .iter()
            .map(|rule| rule.build(&profiles))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Detector::new(rules).with_profiles(profiles))
    }
}
