// demos/basic_usage.rs
//! Basic usage example of the fraud stream engine

use chrono::{Duration, TimeZone, Utc};
use fraud_stream_engine::{format_flags, DetectionReport, EngineConfig, Profiler, Transaction};

fn main() {
    println!("=== Fraud Stream Engine - Basic Usage ===\n");

    let config = EngineConfig::from_toml_str(
        r#"
        [[rules]]
        type = "rapid_transactions"
        max_txns = 2
        window_minutes = 1.0

        [[rules]]
        type = "large_transaction"
        threshold = 5000.0

        [[rules]]
        type = "dynamic_large_transaction"
        multiplier = 3.0
        "#,
    )
    .expect("Failed to parse config");

    let mut detector = config.build_detector().expect("Failed to build rules");
    println!("Rules: {:?}\n", detector.rule_names());

    let t0 = Utc.with_ymd_and_hms(2025, 9, 16, 10, 0, 0).unwrap();
    let stream = vec![
        ("1", "alice", 120.0, 0),
        ("2", "alice", 80.0, 5),
        ("3", "alice", 900.0, 12),
        ("4", "bob", 7500.0, 20),
        ("5", "alice", 40.0, 200),
    ];

    let mut report = DetectionReport::new();
    for (id, user, amount, secs) in stream {
        let txn = Transaction::new(id, user, "merchant-1", amount, t0 + Duration::seconds(secs))
            .expect("valid transaction");
        let result = detector.evaluate(&txn);
        report.record(&result);

        if result.is_fraud {
            println!("  ALERT txn={} user={} flags={}", id, user, format_flags(&result.flags));
        } else {
            println!("  ok    txn={} user={}", id, user);
        }
    }

    println!("\nFlagged {} of {} transactions", report.flagged, report.total);
    for (rule, count) in report.top_rules() {
        println!("  {}: {}", rule, count);
    }

    if let Some(profiles) = detector.profiles() {
        println!("\nProfiles:");
        for (user, profile) in profiles.read().expect("profile lock").summary() {
            println!(
                "  {}: {} txns, avg {:.2}",
                user, profile.transaction_count, profile.average_amount
            );
        }
    }

    println!("\nStandalone profiler:");
    let mut profiler = Profiler::default();
    for (i, amount) in [200.0, 250.0, 1500.0].iter().enumerate() {
        let txn = Transaction::new(i.to_string(), "carol", "m", *amount, t0).expect("valid transaction");
        println!("  {:>7.2} -> {:?}", amount, profiler.evaluate(&txn));
    }
}
