//! # Previously, on jkpi...
//!
//! 🎬 The report had to be tested. But Jama was three VPNs away and the CI runner
//! had never heard of OAuth. Someone had to fake it. Someone had to be a record
//! source that lives entirely in RAM, gone the moment you blink.
//!
//! That someone was this module.
//!
//! - [`InMemorySource`]: filters registered by id, optional failing filters.
//!   Unknown filters are simply empty.
//! - [`InMemoryDirectory`]: canned profiles, optional failing users, and a shared
//!   log of every id it was asked about (tests count the lookups).
//! - [`InMemorySink`]: hoards received tables behind an `Arc<Mutex<...>>` so
//!   callers can inspect what arrived after handing the sink off.
//!
//! ⚠️ This is NOT for production. This is for tests. If you're deploying this
//! to prod, please also deploy a therapist. 🦆

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::backends::{DirectoryService, RecordSource, Sink, UserProfile};
use crate::common::{RawRecord, ReportTable, UserId};

/// 📦 A record source made of `Vec`s and good intentions.
#[derive(Debug, Default, Clone)]
pub struct InMemorySource {
    filters: HashMap<u64, Vec<RawRecord>>,
    failing_filters: HashSet<u64>,
}

impl InMemorySource {
    pub fn with_filter(mut self, filter_id: u64, records: Vec<RawRecord>) -> Self {
        self.filters.insert(filter_id, records);
        self
    }

    /// 💀 This filter will fail to fetch. Fatal, like the real thing.
    pub fn with_failing_filter(mut self, filter_id: u64) -> Self {
        self.failing_filters.insert(filter_id);
        self
    }
}

#[async_trait]
impl RecordSource for InMemorySource {
    async fn fetch(&mut self, filter_id: u64) -> Result<Vec<RawRecord>> {
        if self.failing_filters.contains(&filter_id) {
            bail!("💀 in-memory filter {} was told to fail, and it is nothing if not obedient", filter_id);
        }
        Ok(self.filters.get(&filter_id).cloned().unwrap_or_default())
    }
}

/// 📇 A directory of canned profiles. `None` means "this lookup explodes".
#[derive(Debug, Default, Clone)]
pub struct InMemoryDirectory {
    profiles: HashMap<UserId, Option<UserProfile>>,
    lookups: Arc<Mutex<Vec<UserId>>>,
}

impl InMemoryDirectory {
    pub fn with_user(mut self, user_id: impl Into<UserId>, profile: UserProfile) -> Self {
        self.profiles.insert(user_id.into(), Some(profile));
        self
    }

    pub fn with_failing_user(mut self, user_id: impl Into<UserId>) -> Self {
        self.profiles.insert(user_id.into(), None);
        self
    }

    /// 🔍 Every id this directory was asked about, in order. Shared across clones.
    pub async fn lookups(&self) -> Vec<UserId> {
        self.lookups.lock().await.clone()
    }
}

#[async_trait]
impl DirectoryService for InMemoryDirectory {
    async fn lookup(&mut self, user_id: &UserId) -> Result<UserProfile> {
        self.lookups.lock().await.push(user_id.clone());
        match self.profiles.get(user_id) {
            Some(Some(profile)) => Ok(profile.clone()),
            Some(None) => Err(anyhow!("💀 user {} was told to fail. Timeout cosplay.", user_id)),
            None => Err(anyhow!("💀 user {} does not exist in this little world", user_id)),
        }
    }
}

/// 📦 A sink that never forgets. Unlike my dad, who forgot my soccer game in 1998.
///
/// Clone-able because tests need to peek inside after handing `self` off to the
/// pipeline. The `Arc` means everyone shares the same Vec.
#[derive(Debug, Default, Clone)]
pub struct InMemorySink {
    pub received: Arc<Mutex<Vec<ReportTable>>>,
    closed: Arc<Mutex<bool>>,
}

impl InMemorySink {
    pub async fn tables(&self) -> Vec<ReportTable> {
        self.received.lock().await.clone()
    }

    pub async fn is_closed(&self) -> bool {
        *self.closed.lock().await
    }
}

#[async_trait]
impl Sink for InMemorySink {
    async fn send(&mut self, table: &ReportTable) -> Result<()> {
        // 🔒 The Mutex is load-bearing. Do not remove. I know it looks optional. It isn't.
        self.received.lock().await.push(table.clone());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        *self.closed.lock().await = true;
        Ok(())
    }
}
