// ai
//! 🧹 The Record Normalizer: squashing nested records into flat, tagged tuples.
//!
//! Pure projection. No I/O, no lookups, no opinions. Every field goes through the
//! key resolver because the same field lives at different depths depending on which
//! Jama endpoint coughed up the record. User ids are swapped for display names from
//! the (read-only, already built) [`UserDirectory`]; unresolved ids become `None`.
//!
//! Each tuple is a [`NormalizedRecord`] variant, so the stream it came from rides
//! along in the type. Nobody downstream has to ask "wait, was this one a defect?" 🦆

use serde::Serialize;

use crate::common::{DisplayName, RawRecord};
use crate::directory::UserDirectory;
use crate::resolver::{find_token, find_user_id};

/// 🎭 One normalized record. The variant says which stream it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NormalizedRecord {
    TestRun {
        document_key: Option<String>,
        assignee: Option<DisplayName>,
        execution_date: Option<String>,
    },
    Defect {
        document_key: Option<String>,
        creator: Option<DisplayName>,
    },
}

impl NormalizedRecord {
    /// 👤 The display name this record is grouped under, if the user resolved.
    pub fn user(&self) -> Option<&str> {
        match self {
            Self::TestRun { assignee, .. } => assignee.as_deref(),
            Self::Defect { creator, .. } => creator.as_deref(),
        }
    }
}

/// 🧪 test run → (documentKey, assignee name, executionDate)
pub fn normalize_test_run(record: &RawRecord, directory: &UserDirectory) -> NormalizedRecord {
    NormalizedRecord::TestRun {
        document_key: find_token(record, "documentKey"),
        assignee: directory
            .resolve(find_user_id(record, "assignedTo").as_ref())
            .map(str::to_string),
        execution_date: find_token(record, "executionDate"),
    }
}

/// 🐛 defect → (documentKey, creator name)
pub fn normalize_defect(record: &RawRecord, directory: &UserDirectory) -> NormalizedRecord {
    NormalizedRecord::Defect {
        document_key: find_token(record, "documentKey"),
        creator: directory
            .resolve(find_user_id(record, "createdBy").as_ref())
            .map(str::to_string),
    }
}

/// 📦 All test runs first, then all defects. Order is preserved within each stream.
pub fn normalize_all(
    test_runs: &[RawRecord],
    defects: &[RawRecord],
    directory: &UserDirectory,
) -> Vec<NormalizedRecord> {
    test_runs
        .iter()
        .map(|record| normalize_test_run(record, directory))
        .chain(defects.iter().map(|record| normalize_defect(record, directory)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::UserId;
    use serde_json::json;

    fn directory_with_alice() -> UserDirectory {
        let mut directory = UserDirectory::new();
        directory.insert(UserId::from(101u64), "Alice".to_string());
        directory
    }

    #[test]
    fn the_one_where_a_test_run_flattens_nicely() {
        let record = json!({
            "id": 9,
            "fields": {
                "documentKey": "PRJ-TR-1",
                "assignedTo": 101,
                "executionDate": "2024-03-01"
            }
        });
        let normalized = normalize_test_run(&record, &directory_with_alice());
        assert_eq!(
            normalized,
            NormalizedRecord::TestRun {
                document_key: Some("PRJ-TR-1".into()),
                assignee: Some("Alice".into()),
                execution_date: Some("2024-03-01".into()),
            }
        );
    }

    #[test]
    fn the_one_where_the_creator_is_a_stranger() {
        // 🧪 404 never resolved. The defect still counts, it just has nobody to blame.
        let record = json!({"fields": {"documentKey": "PRJ-BUG-3", "createdBy": 404}});
        let normalized = normalize_defect(&record, &directory_with_alice());
        assert_eq!(normalized.user(), None);
        assert_eq!(
            normalized,
            NormalizedRecord::Defect { document_key: Some("PRJ-BUG-3".into()), creator: None }
        );
    }

    #[test]
    fn the_one_where_duplicate_tuples_keep_their_identity() {
        // 🧪 Two identical test runs stay two test runs. Tagging, not set membership.
        let run = json!({"documentKey": "K", "assignedTo": 101, "executionDate": "d"});
        let all = normalize_all(&[run.clone(), run], &[], &directory_with_alice());
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|r| matches!(r, NormalizedRecord::TestRun { .. })));
    }

    #[test]
    fn the_one_where_missing_fields_are_just_none() {
        let normalized = normalize_test_run(&json!({}), &UserDirectory::new());
        assert_eq!(
            normalized,
            NormalizedRecord::TestRun { document_key: None, assignee: None, execution_date: None }
        );
    }
}
