// ai
//! 📇 The User Directory Builder: turning `101` into `"Alice"`, one round trip at a time.
//!
//! 🎬 *[a batch of records arrives, clutching user ids like unlabeled keys]*
//! *["who is 101?" asks the report. "who is 7?" "who is 'jdoe-42'?"]*
//! *[the builder gathers every id first, THEN knocks on the directory's door.]*
//! *[once per id. never twice. the directory has a life.]*
//!
//! 🧠 Knowledge graph:
//! - Ids come from `assignedTo`, `modifiedBy` and `createdBy`, found by the key resolver.
//! - All ids are collected (distinct, first-seen order) before a single lookup fires.
//! - Ids already in the [`UserDirectory`] are never re-queried.
//! - Lookups run sequentially. A failed lookup gets a `warn!` and the id is left out.
//!   One broken profile never takes the report down with it.
//! - A profile without a name still resolves, to [`UNKNOWN_DISPLAY_NAME`].

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::backends::DirectoryService;
use crate::common::{DisplayName, RawRecord, UNKNOWN_DISPLAY_NAME, UserId, scalar_token};
use crate::progress::LookupProgress;
use crate::resolver::{find_key, find_user_id};

/// 🏷️ The fields that can point at a user. Order matters only for log readability.
pub const USER_REFERENCE_FIELDS: [&str; 3] = ["assignedTo", "modifiedBy", "createdBy"];

/// 📇 Id → display name, built once per run and append-only while it is built.
///
/// Later stages only ever get `&UserDirectory`. If you find yourself wanting
/// `&mut` downstream, the answer is no.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UserDirectory {
    names: HashMap<UserId, DisplayName>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: &UserId) -> Option<&str> {
        self.names.get(user_id).map(String::as_str)
    }

    /// 🔎 Resolve an optional id. `None` in, `None` out; unknown id, also `None`.
    pub fn resolve(&self, user_id: Option<&UserId>) -> Option<&str> {
        user_id.and_then(|id| self.get(id))
    }

    pub fn contains(&self, user_id: &UserId) -> bool {
        self.names.contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// ➕ First write wins. The directory never overwrites, it only grows.
    pub fn insert(&mut self, user_id: UserId, display_name: DisplayName) {
        self.names.entry(user_id).or_insert(display_name);
    }
}

/// 📊 What the builder did, for the logs and for the tests that don't trust the logs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryStats {
    /// distinct ids referenced by the records
    pub referenced: usize,
    /// ids we actually asked the service about
    pub looked_up: usize,
    pub resolved: usize,
    pub failed: usize,
}

/// 🔍 Every distinct user id referenced by `records`, first-seen order.
pub fn referenced_user_ids<'a, I>(records: I) -> Vec<UserId>
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for record in records {
        for field in USER_REFERENCE_FIELDS {
            if let Some(user_id) = find_user_id(record, field) {
                if seen.insert(user_id.clone()) {
                    ids.push(user_id);
                }
            }
        }
    }
    ids
}

/// 🏷️ Pull the display name out of a profile. Present-but-nameless → "Unknown".
pub fn display_name_from_profile(profile: &RawRecord, display_name_field: &str) -> DisplayName {
    find_key(profile, display_name_field)
        .and_then(scalar_token)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_DISPLAY_NAME.to_string())
}

/// 🚀 Fill `directory` with a display name for every id the records mention.
///
/// Never fails. Lookup errors are logged and skipped, the rest of the run carries on.
pub async fn build_user_directory<'a, I, D>(
    records: I,
    service: &mut D,
    directory: &mut UserDirectory,
    display_name_field: &str,
) -> DirectoryStats
where
    I: IntoIterator<Item = &'a RawRecord>,
    D: DirectoryService + ?Sized,
{
    let referenced = referenced_user_ids(records);
    let pending: Vec<UserId> = referenced
        .iter()
        .filter(|user_id| !directory.contains(user_id))
        .cloned()
        .collect();

    let mut stats = DirectoryStats {
        referenced: referenced.len(),
        ..DirectoryStats::default()
    };
    info!(
        "📇 {} distinct users referenced, {} already known, {} to look up",
        stats.referenced,
        stats.referenced - pending.len(),
        pending.len()
    );

    let progress = LookupProgress::new(pending.len() as u64);
    for user_id in pending {
        stats.looked_up += 1;
        match service.lookup(&user_id).await {
            Ok(profile) => {
                let display_name = display_name_from_profile(&profile, display_name_field);
                debug!("✅ user {} is '{}'", user_id, display_name);
                directory.insert(user_id, display_name);
                stats.resolved += 1;
            }
            Err(err) => {
                // -- 💀 one bad id does not get to cancel the report for everyone else
                warn!("⚠️ lookup for user {} failed, leaving them nameless: {:#}", user_id, err);
                stats.failed += 1;
            }
        }
        progress.tick(stats.resolved, stats.failed);
    }
    progress.finish();

    info!(
        "📇 directory built: {} resolved, {} failed, {} total entries",
        stats.resolved,
        stats.failed,
        directory.len()
    );
    stats
}
