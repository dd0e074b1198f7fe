// ai
//! 📈 The KPI Aggregator: where test runs become numbers and numbers become opinions.
//!
//! 🎬 COLD OPEN, INT. SPRINT RETRO, 10:03 AM
//!
//! "How productive was Alice?" asked the manager. "Two test runs on one day," said
//! the aggregator. "So, two per day." "And defects?" "One defect per two runs. 0.5."
//! The manager wrote it on a sticky note. The sticky note went on a slide. The slide
//! went to a VP. None of them ever divided by zero. That was the aggregator's doing.
//!
//! 🧠 Knowledge graph:
//! - Grouping key: [`UserKey`], either a display name or the one shared
//!   [`UserKey::Unresolved`] bucket for every id that never resolved.
//! - Test runs bump `testrun_count` and drop their date token into a set.
//! - Defects bump `defect_count`.
//! - `unique_days` = size of that set. Same token twice is still one day.
//! - Ratios floor their denominator at 1 and round to 2 decimals, half away from zero.
//! - Rows come out in first-seen order of the grouping key. Deterministic, boring, good.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::common::DisplayName;
use crate::normalizer::NormalizedRecord;

/// 👤 Who a bucket belongs to. Everyone who failed to resolve shares one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum UserKey {
    Named(DisplayName),
    Unresolved,
}

impl UserKey {
    pub fn from_display_name(display_name: Option<&str>) -> Self {
        match display_name {
            Some(name) => Self::Named(name.to_string()),
            None => Self::Unresolved,
        }
    }

    /// 🏷️ The name to print. The sentinel prints as nothing at all.
    pub fn display_name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Unresolved => None,
        }
    }
}

/// 🧮 Running counters for one user. Counts only go up, days only accumulate.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UserTally {
    pub defect_count: u64,
    pub testrun_count: u64,
    days: HashSet<String>,
}

impl UserTally {
    pub fn unique_days(&self) -> u64 {
        self.days.len() as u64
    }
}

/// 📊 A finished KPI row: the tally plus the two ratios.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiRow {
    pub user: UserKey,
    pub testrun_count: u64,
    pub defect_count: u64,
    pub unique_days: u64,
    pub test_case_productivity: f64,
    pub defect_observation_rate: f64,
}

/// 🎯 Round to two decimals, ties away from zero (`0.125 → 0.13`, `2.675` lands on
/// whatever its binary float really is). One rule, everywhere.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// ➗ `round2(numerator / max(denominator, 1))`. The floor is the whole point.
pub fn floored_ratio(numerator: u64, denominator: u64) -> f64 {
    round2(numerator as f64 / denominator.max(1) as f64)
}

/// 📈 Folds normalized records into per-user tallies.
#[derive(Debug, Default, Clone)]
pub struct KpiAggregator {
    order: Vec<UserKey>,
    tallies: HashMap<UserKey, UserTally>,
}

impl KpiAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a NormalizedRecord>,
    {
        let mut aggregator = Self::new();
        for record in records {
            aggregator.ingest(record);
        }
        aggregator
    }

    fn tally_for(&mut self, key: UserKey) -> &mut UserTally {
        // -- 🐣 lazy birth: a bucket exists from the first record that mentions it
        if !self.tallies.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.tallies.entry(key).or_default()
    }

    pub fn ingest(&mut self, record: &NormalizedRecord) {
        let key = UserKey::from_display_name(record.user());
        match record {
            NormalizedRecord::TestRun { execution_date, .. } => {
                let tally = self.tally_for(key);
                tally.testrun_count += 1;
                if let Some(day) = execution_date.as_deref().filter(|day| !day.is_empty()) {
                    tally.days.insert(day.to_string());
                }
            }
            NormalizedRecord::Defect { .. } => {
                self.tally_for(key).defect_count += 1;
            }
        }
    }

    /// 🏁 Counting is over. Derive the ratios, in first-seen order.
    pub fn into_rows(self) -> Vec<KpiRow> {
        let Self { order, mut tallies } = self;
        order
            .into_iter()
            .filter_map(|user| {
                let tally = tallies.remove(&user)?;
                let unique_days = tally.unique_days();
                Some(KpiRow {
                    test_case_productivity: floored_ratio(tally.testrun_count, unique_days),
                    defect_observation_rate: floored_ratio(tally.defect_count, tally.testrun_count),
                    testrun_count: tally.testrun_count,
                    defect_count: tally.defect_count,
                    unique_days,
                    user,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(user: Option<&str>, day: Option<&str>) -> NormalizedRecord {
        NormalizedRecord::TestRun {
            document_key: None,
            assignee: user.map(str::to_string),
            execution_date: day.map(str::to_string),
        }
    }

    fn defect(user: Option<&str>) -> NormalizedRecord {
        NormalizedRecord::Defect {
            document_key: None,
            creator: user.map(str::to_string),
        }
    }

    #[test]
    fn the_one_where_same_day_counts_once() {
        let records = vec![
            run(Some("Bob"), Some("2024-01-01")),
            run(Some("Bob"), Some("2024-01-01")),
            run(Some("Bob"), Some("2024-01-02")),
        ];
        let rows = KpiAggregator::from_records(&records).into_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].unique_days, 2);
        assert_eq!(rows[0].testrun_count, 3);
        assert_eq!(rows[0].test_case_productivity, 1.5);
    }

    #[test]
    fn the_one_where_nobody_divides_by_zero() {
        // 🧪 defect-only user: 0 runs, 0 days, 5 defects. Floors everywhere.
        let records: Vec<_> = (0..5).map(|_| defect(Some("Dana"))).collect();
        let rows = KpiAggregator::from_records(&records).into_rows();
        assert_eq!(rows[0].testrun_count, 0);
        assert_eq!(rows[0].unique_days, 0);
        assert_eq!(rows[0].test_case_productivity, 0.0);
        assert_eq!(rows[0].defect_observation_rate, 5.0);
    }

    #[test]
    fn the_one_where_alice_has_a_perfectly_average_sprint() {
        let records = vec![
            run(Some("Alice"), Some("2024-03-01")),
            run(Some("Alice"), Some("2024-03-01")),
            defect(Some("Alice")),
        ];
        let rows = KpiAggregator::from_records(&records).into_rows();
        assert_eq!(
            rows,
            vec![KpiRow {
                user: UserKey::Named("Alice".into()),
                testrun_count: 2,
                defect_count: 1,
                unique_days: 1,
                test_case_productivity: 2.0,
                defect_observation_rate: 0.5,
            }]
        );
    }

    #[test]
    fn the_one_where_strangers_share_one_bucket() {
        // 🧪 Unresolved assignee and unresolved creator end up in the same sentinel row.
        let records = vec![run(None, Some("d1")), defect(None), run(Some("Eve"), None)];
        let rows = KpiAggregator::from_records(&records).into_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user, UserKey::Unresolved);
        assert_eq!(rows[0].user.display_name(), None);
        assert_eq!((rows[0].testrun_count, rows[0].defect_count), (1, 1));
        assert_eq!(rows[1].user, UserKey::Named("Eve".into()));
        assert_eq!(rows[1].unique_days, 0);
        // -- 1 run / max(0, 1) day
        assert_eq!(rows[1].test_case_productivity, 1.0);
    }

    #[test]
    fn the_one_where_rounding_picks_a_side() {
        assert_eq!(floored_ratio(1, 3), 0.33);
        assert_eq!(floored_ratio(2, 3), 0.67);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(floored_ratio(7, 0), 7.0);
    }

    #[test]
    fn the_one_where_rows_come_out_in_first_seen_order() {
        let records = vec![run(Some("Zed"), None), defect(Some("Amy")), run(Some("Amy"), None)];
        let rows = KpiAggregator::from_records(&records).into_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].user, UserKey::Named("Amy".into()));
        assert_eq!((rows[1].testrun_count, rows[1].defect_count), (1, 1));
        let names: Vec<_> = rows
            .iter()
            .map(|row| row.user.display_name().map(str::to_string))
            .collect();
        assert_eq!(names, vec![Some("Zed".to_string()), Some("Amy".to_string())]);
    }
}
