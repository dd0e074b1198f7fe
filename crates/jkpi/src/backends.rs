//! 🔌 Backends: where the real I/O happens.
//!
//! 🚰 Record sources pour the data, directory services put names to faces, sinks
//! slurp up the finished tables. And in between, we panic! (kidding, we use anyhow)
//!
//! 🎭 This module is the casting agency. Need records from a live Jama instance?
//! From a dump on disk? From a `vec![]` in a test? We've got a backend for that.
//!
//! 🧠 Knowledge graph:
//! - Pattern: trait → concrete impls (Jama, File, InMemory) → `*Backend` enum dispatcher
//! - [`RecordSource::fetch`] failing is fatal to the run.
//! - [`DirectoryService::lookup`] failing is recoverable, per user.
//! - [`Sink`] is I/O only: it gets finished tables, it composes and writes them.
//! - The pipeline never reaches for a global client. Everything is handed in.
//!
//! 🦆 The duck is here because every file must have one. This is law. Do not question the duck.

use anyhow::Result;
use async_trait::async_trait;

use crate::app_config::{SinkConfig, SourceConfig};
use crate::common::{RawRecord, ReportTable, UserId};

pub(crate) mod file;
pub(crate) mod in_mem;
pub(crate) mod jama;

pub use file::{FileDirectory, FileSink, FileSinkConfig, FileSource, FileSourceConfig, FilterDump};
pub use in_mem::{InMemoryDirectory, InMemorySink, InMemorySource};
pub use jama::{JamaClient, JamaSourceConfig};

/// 👤 What a directory lookup hands back: the user's profile, untyped.
pub type UserProfile = serde_json::Value;

// ===== Record Source =====

/// 🚰 Produces the records behind a saved filter.
///
/// # Contract 📜
/// - `fetch` returns every record the filter yields, all pages, in source order.
/// - `Err(...)` means the run is over. There is no partial-filter recovery.
#[async_trait]
pub trait RecordSource: std::fmt::Debug {
    async fn fetch(&mut self, filter_id: u64) -> Result<Vec<RawRecord>>;
}

// ===== Directory Service =====

/// 📇 Resolves one user id to a profile.
///
/// # Contract 📜
/// - `Ok(profile)`: the user exists. The profile may or may not carry a name.
/// - `Err(...)`: this one user is a lost cause. The caller logs it and moves on.
#[async_trait]
pub trait DirectoryService: std::fmt::Debug {
    async fn lookup(&mut self, user_id: &UserId) -> Result<UserProfile>;
}

// ===== Sink =====

/// 🕳️ Takes finished tables and puts them somewhere durable-ish.
///
/// # Contract 📜
/// - `send` receives one table at a time: kpi, then defects, then test runs.
/// - `close` flushes and finalizes. MUST be called. Skipping it is a bug, and rude.
#[async_trait]
pub trait Sink: std::fmt::Debug {
    async fn send(&mut self, table: &ReportTable) -> Result<()>;
    async fn close(&mut self) -> Result<()>;
}

// ===== Backend enums =====

/// 🎭 The many faces of a record source.
#[derive(Debug)]
pub enum SourceBackend {
    Jama(jama::JamaClient),
    File(file::FileSource),
    InMemory(in_mem::InMemorySource),
}

#[async_trait]
impl RecordSource for SourceBackend {
    async fn fetch(&mut self, filter_id: u64) -> Result<Vec<RawRecord>> {
        match self {
            SourceBackend::Jama(jama) => jama.fetch(filter_id).await,
            SourceBackend::File(file) => file.fetch(filter_id).await,
            SourceBackend::InMemory(mem) => mem.fetch(filter_id).await,
        }
    }
}

/// 🎭 The many faces of a directory service.
#[derive(Debug)]
pub enum DirectoryBackend {
    Jama(jama::JamaClient),
    File(file::FileDirectory),
    InMemory(in_mem::InMemoryDirectory),
}

#[async_trait]
impl DirectoryService for DirectoryBackend {
    async fn lookup(&mut self, user_id: &UserId) -> Result<UserProfile> {
        match self {
            DirectoryBackend::Jama(jama) => jama.lookup(user_id).await,
            DirectoryBackend::File(file) => file.lookup(user_id).await,
            DirectoryBackend::InMemory(mem) => mem.lookup(user_id).await,
        }
    }
}

/// 🎭 The many faces of a sink.
#[derive(Debug)]
pub enum SinkBackend {
    File(file::FileSink),
    InMemory(in_mem::InMemorySink),
}

#[async_trait]
impl Sink for SinkBackend {
    async fn send(&mut self, table: &ReportTable) -> Result<()> {
        match self {
            SinkBackend::File(sink) => sink.send(table).await,
            SinkBackend::InMemory(sink) => sink.send(table).await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self {
            SinkBackend::File(sink) => sink.close().await,
            SinkBackend::InMemory(sink) => sink.close().await,
        }
    }
}

/// 🔌 Wire up the source side: one record source and one directory service.
///
/// For Jama both halves share one authenticated client (the token is fetched once).
pub async fn connect_source(config: &SourceConfig) -> Result<(SourceBackend, DirectoryBackend)> {
    match config {
        SourceConfig::Jama(jama_config) => {
            let client = jama::JamaClient::new(jama_config.clone()).await?;
            Ok((
                SourceBackend::Jama(client.clone()),
                DirectoryBackend::Jama(client),
            ))
        }
        SourceConfig::File(file_config) => Ok((
            SourceBackend::File(file::FileSource::new(file_config.clone())),
            DirectoryBackend::File(file::FileDirectory::new(file_config.users_file.as_deref()).await?),
        )),
        SourceConfig::InMemory => Ok((
            SourceBackend::InMemory(in_mem::InMemorySource::default()),
            DirectoryBackend::InMemory(in_mem::InMemoryDirectory::default()),
        )),
    }
}

/// 🔌 Wire up the sink side.
pub async fn connect_sink(config: &SinkConfig) -> Result<SinkBackend> {
    match config {
        SinkConfig::File(file_config) => Ok(SinkBackend::File(
            file::FileSink::new(file_config.clone()).await?,
        )),
        SinkConfig::InMemory => Ok(SinkBackend::InMemory(in_mem::InMemorySink::default())),
    }
}
