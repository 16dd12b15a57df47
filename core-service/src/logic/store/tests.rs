use super::{owner_profile, AppendOutcome, ResultStore, RiskBand};
use crate::logic::config::DuplicatePolicy;
use crate::logic::record::StatsSummary;
use crate::logic::testing::record;

#[test]
fn test_empty_stats() {
    let store = ResultStore::default();
    let stats = store.stats();
    assert_eq!(stats.total, 0);
    assert_eq!(stats.flagged_count, 0);
    assert_eq!(stats.flagged_rate(), 0.0);
    assert_eq!(stats.mean_amount, 0.0);
    assert!(stats.most_active_owner.is_none());
}

#[test]
fn test_total_tracks_length() {
    let mut store = ResultStore::default();
    for i in 0..25 {
        store.append(record(&format!("t{}", i), "u", 10.0, i % 3 == 0));
        assert_eq!(store.stats().total as usize, store.len());
        assert!(store.stats().flagged_count <= store.stats().total);
    }
    assert_eq!(store.stats().flagged_count, 9);
}

#[test]
fn test_incremental_mean_matches_naive_mean() {
    let amounts = [0.0, 12.5, 999.99, 3.25, 1e6, 0.01, 47.0, 47.0, 250.75];
    let mut store = ResultStore::default();
    for (i, amount) in amounts.iter().enumerate() {
        store.append(record(&i.to_string(), "u", *amount, false));
    }

    let naive = amounts.iter().sum::<f64>() / amounts.len() as f64;
    let incremental = store.stats().mean_amount;
    assert!((naive - incremental).abs() < 1e-6 * naive.abs().max(1.0));
}

#[test]
fn test_most_active_owner() {
    let mut store = ResultStore::default();
    store.append(record("1", "alice", 1.0, false));
    store.append(record("2", "bob", 1.0, false));
    // tie: alice got there first
    assert_eq!(store.stats().most_active_owner.as_deref(), Some("alice"));

    store.append(record("3", "bob", 1.0, false));
    assert_eq!(store.stats().most_active_owner.as_deref(), Some("bob"));

    store.append(record("4", "alice", 1.0, false));
    assert_eq!(store.stats().most_active_owner.as_deref(), Some("bob"));
    assert_eq!(store.stats().owner_count("alice"), 2);
    assert_eq!(store.stats().unique_owners(), 2);
}

#[test]
fn test_summary_overwrites_consistency_fields_only() {
    let mut store = ResultStore::default();
    store.append(record("a", "u1", 10.0, true));
    store.append(record("b", "u2", 30.0, false));

    store.apply_summary(&StatsSummary {
        total: Some(2),
        flagged_count: Some(1),
        mean_amount: Some(20.5),
        most_active_owner: Some("u2".to_string()),
    });

    let stats = store.stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.flagged_count, 1);
    assert_eq!(stats.mean_amount, 20.5);
    assert_eq!(stats.most_active_owner.as_deref(), Some("u2"));
    let ids: Vec<&str> = store.records().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn test_duplicates_appended_by_default() {
    let mut store = ResultStore::default();
    assert_eq!(store.append(record("dup", "u", 1.0, false)), AppendOutcome::Appended);
    assert_eq!(store.append(record("dup", "u", 1.0, false)), AppendOutcome::Appended);
    assert_eq!(store.len(), 2);
    assert_eq!(store.stats().total, 2);
}

#[test]
fn test_skip_repeated_ids_policy() {
    let mut store = ResultStore::new(DuplicatePolicy::SkipRepeatedIds);
    store.append(record("dup", "u", 1.0, true));
    assert_eq!(store.append(record("dup", "u", 5.0, true)), AppendOutcome::SkippedDuplicate);
    store.append(record("other", "u", 3.0, false));

    assert_eq!(store.len(), 2);
    assert_eq!(store.stats().total, 2);
    assert_eq!(store.stats().flagged_count, 1);
    assert_eq!(store.stats().mean_amount, 2.0);
}

#[test]
fn test_clear_discards_everything() {
    let mut store = ResultStore::new(DuplicatePolicy::SkipRepeatedIds);
    store.append(record("x", "u", 1.0, true));
    store.clear();
    assert!(store.is_empty());
    assert_eq!(store.stats().total, 0);
    assert_eq!(store.append(record("x", "u", 1.0, true)), AppendOutcome::Appended);
}

#[test]
fn test_owner_profile() {
    let mut store = ResultStore::default();
    let mut flagged = record("t1", "user_7", 900.0, true);
    flagged.score = Some(0.9);
    flagged.explanation.text = Some("Amount far above user mean".to_string());
    let mut normal = record("t2", "user_7", 100.0, false);
    normal.score = Some(0.5);
    let mut unscored = record("t3", "user_7", 50.0, false);
    unscored.score = None;

    store.append(flagged);
    store.append(record("t4", "someone_else", 5.0, true));
    store.append(normal);
    store.append(unscored);

    let profile = owner_profile(&store, "user_7").unwrap();
    assert_eq!(profile.item_count, 3);
    assert_eq!(profile.flagged_count, 1);
    assert_eq!(profile.total_volume, 1050.0);
    assert!((profile.risk_score - 0.7).abs() < 1e-9);
    assert_eq!(profile.risk_band, RiskBand::Suspicious);
    assert_eq!(profile.history[0].id, "t1");
    assert_eq!(profile.history[0].explanation.as_deref(), Some("Amount far above user mean"));

    assert!(owner_profile(&store, "nobody").is_none());
}

#[test]
fn test_risk_bands() {
    assert_eq!(RiskBand::from_score(0.71), RiskBand::Critical);
    assert_eq!(RiskBand::from_score(0.7), RiskBand::Suspicious);
    assert_eq!(RiskBand::from_score(0.3), RiskBand::Low);
}
