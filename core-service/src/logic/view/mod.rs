//! View Pipeline - store snapshot -> capped, ordered DisplaySet
//!
//! `project` is pure: it never touches the store and returns the same
//! DisplaySet for the same inputs, so it is safe to call redundantly.

use std::cmp::Ordering;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_DISPLAY_CAP;
use crate::logic::record::ResultRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    None,
    Id,
    Owner,
    Amount,
    Timestamp,
    Score,
    Status,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "" | "none" => Some(Self::None),
            "id" | "transaction_id" => Some(Self::Id),
            "owner" | "user_id" => Some(Self::Owner),
            "amount" => Some(Self::Amount),
            "timestamp" => Some(Self::Timestamp),
            "score" | "final_score" => Some(Self::Score),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

/// User-controlled view settings. Read-only to the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub flagged_only: bool,
    pub search_term: String,
    pub sort_key: SortKey,
}

impl DisplayConfig {
    /// Narrow the table to a single owner (profile "show all" action)
    pub fn focus_owner(&mut self, owner: &str) {
        self.search_term = owner.to_string();
    }
}

/// Rows handed to the table renderer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplaySet {
    pub rows: Vec<ResultRecord>,
    /// Rows that passed the filter before the cap
    pub matched: usize,
}

impl DisplaySet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_truncated(&self) -> bool {
        self.matched > self.rows.len()
    }
}

/// Project with the default 500 row cap
pub fn project(records: &[ResultRecord], config: &DisplayConfig) -> DisplaySet {
    project_capped(records, config, DEFAULT_DISPLAY_CAP)
}

/// Filter, stable-sort ascending, then truncate to `cap`.
/// `cap` can lower the 500 row limit but never raise it.
pub fn project_capped(records: &[ResultRecord], config: &DisplayConfig, cap: usize) -> DisplaySet {
    let cap = cap.min(DEFAULT_DISPLAY_CAP);
    let needle = config.search_term.to_lowercase();

    let mut rows: Vec<&ResultRecord> = records
        .iter()
        .filter(|r| !config.flagged_only || r.is_flagged)
        .filter(|r| needle.is_empty() || r.owner_key.to_lowercase().contains(&needle))
        .collect();

    let matched = rows.len();

    if config.sort_key != SortKey::None {
        // sort_by is stable: equal keys keep arrival order
        rows.sort_by(|a, b| compare(a, b, config.sort_key));
    }

    DisplaySet {
        rows: rows.into_iter().take(cap).cloned().collect(),
        matched,
    }
}

fn compare(a: &ResultRecord, b: &ResultRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::None => Ordering::Equal,
        SortKey::Id => locale_compare(&a.id, &b.id),
        SortKey::Owner => locale_compare(&a.owner_key, &b.owner_key),
        SortKey::Timestamp => locale_compare(&a.timestamp, &b.timestamp),
        SortKey::Status => locale_compare(a.status(), b.status()),
        SortKey::Amount => numeric_compare(Some(a.amount), Some(b.amount)),
        SortKey::Score => numeric_compare(a.score, b.score),
    }
}

/// Case-insensitive first, then exact code point order as tiebreak
fn locale_compare(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

/// Missing values sort as 0
fn numeric_compare(a: Option<f64>, b: Option<f64>) -> Ordering {
    let a = a.unwrap_or(0.0);
    let b = b.unwrap_or(0.0);
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::testing::record;

    fn ids(set: &DisplaySet) -> Vec<&str> {
        set.rows.iter().map(|r| r.id.as_str()).collect()
    }

    fn sample() -> Vec<ResultRecord> {
        let mut a = record("b-2", "Alice", 300.0, true);
        a.score = Some(0.9);
        a.timestamp = "2024-01-03".into();
        let mut b = record("a-1", "bob", 100.0, false);
        b.score = None;
        b.timestamp = "2024-01-01".into();
        let mut c = record("C-3", "alicia", 200.0, false);
        c.score = Some(0.4);
        c.timestamp = "2024-01-02".into();
        let mut d = record("d-4", "Bobby", 100.0, true);
        d.score = Some(0.2);
        d.timestamp = "2024-01-04".into();
        vec![a, b, c, d]
    }

    #[test]
    fn test_no_filter_keeps_arrival_order() {
        let set = project(&sample(), &DisplayConfig::default());
        assert_eq!(ids(&set), vec!["b-2", "a-1", "C-3", "d-4"]);
        assert_eq!(set.matched, 4);
    }

    #[test]
    fn test_flagged_only() {
        let config = DisplayConfig { flagged_only: true, ..Default::default() };
        assert_eq!(ids(&project(&sample(), &config)), vec!["b-2", "d-4"]);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let config = DisplayConfig { search_term: "ALI".into(), ..Default::default() };
        assert_eq!(ids(&project(&sample(), &config)), vec!["b-2", "C-3"]);

        let config = DisplayConfig {
            search_term: "bob".into(),
            flagged_only: true,
            ..Default::default()
        };
        assert_eq!(ids(&project(&sample(), &config)), vec!["d-4"]);
    }

    #[test]
    fn test_sort_by_string_fields() {
        let mut config = DisplayConfig { sort_key: SortKey::Id, ..Default::default() };
        assert_eq!(ids(&project(&sample(), &config)), vec!["a-1", "b-2", "C-3", "d-4"]);

        config.sort_key = SortKey::Owner;
        assert_eq!(ids(&project(&sample(), &config)), vec!["b-2", "C-3", "a-1", "d-4"]);

        config.sort_key = SortKey::Timestamp;
        assert_eq!(ids(&project(&sample(), &config)), vec!["a-1", "C-3", "b-2", "d-4"]);
    }

    #[test]
    fn test_sort_amount_is_stable() {
        let config = DisplayConfig { sort_key: SortKey::Amount, ..Default::default() };
        // a-1 and d-4 tie at 100 and keep arrival order
        assert_eq!(ids(&project(&sample(), &config)), vec!["a-1", "d-4", "C-3", "b-2"]);
    }

    #[test]
    fn test_sort_score_missing_as_zero() {
        let config = DisplayConfig { sort_key: SortKey::Score, ..Default::default() };
        assert_eq!(ids(&project(&sample(), &config)), vec!["a-1", "d-4", "C-3", "b-2"]);
    }

    #[test]
    fn test_sort_status() {
        let config = DisplayConfig { sort_key: SortKey::Status, ..Default::default() };
        // "Flagged" < "Normal"
        assert_eq!(ids(&project(&sample(), &config)), vec!["b-2", "d-4", "a-1", "C-3"]);
    }

    #[test]
    fn test_cap_at_500() {
        let records: Vec<ResultRecord> = (0..1234)
            .map(|i| record(&format!("t{}", i), "u", i as f64, i % 2 == 0))
            .collect();

        let set = project(&records, &DisplayConfig::default());
        assert_eq!(set.len(), 500);
        assert_eq!(set.matched, 1234);
        assert!(set.is_truncated());
        assert_eq!(set.rows[0].id, "t0");
        assert_eq!(set.rows[499].id, "t499");

        let sorted = DisplayConfig { sort_key: SortKey::Amount, ..Default::default() };
        assert!(project(&records, &sorted).len() <= 500);
        assert_eq!(project_capped(&records, &sorted, 3).len(), 3);
    }

    #[test]
    fn test_larger_cap_is_clamped() {
        let records: Vec<ResultRecord> = (0..800)
            .map(|i| record(&format!("t{}", i), "u", i as f64, false))
            .collect();

        let set = project_capped(&records, &DisplayConfig::default(), 1000);
        assert_eq!(set.len(), 500);
        assert_eq!(set.matched, 800);
        assert!(set.is_truncated());
    }

    #[test]
    fn test_project_is_idempotent() {
        let records = sample();
        let config = DisplayConfig {
            flagged_only: false,
            search_term: "b".into(),
            sort_key: SortKey::Score,
        };
        let first = project(&records, &config);
        let second = project(&records, &config);
        assert_eq!(first, second);
        assert_eq!(records, sample());
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!(SortKey::parse("final_score"), Some(SortKey::Score));
        assert_eq!(SortKey::parse(""), Some(SortKey::None));
        assert_eq!(SortKey::parse("colour"), None);
    }

    #[test]
    fn test_focus_owner() {
        let mut config = DisplayConfig::default();
        config.focus_owner("Bobby");
        assert_eq!(ids(&project(&sample(), &config)), vec!["d-4"]);
    }
}
