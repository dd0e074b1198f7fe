//! 🎬 *[camera pans across a dimly lit open-plan office]*
//! 🎬 *[dramatic orchestral music swells]*
//! 🎬 "In a world where test runs pile up unread..."
//! 🎬 "One supervisor dared to count them all."
//! 🎬 *[record scratch]* 🦆
//!
//! 📦 The Supervisor module: part middle manager, part helicopter parent.
//!
//! It owns the one fixed shape of a run:
//!
//! ```text
//! fetch testruns ─┐
//!                 ├─► build directory ─► normalize ─► aggregate ─► assemble ─► sink
//! fetch defects ──┘
//! ```
//!
//! [`run_pipeline`] takes every collaborator by `&mut`, so tests hand in fakes and the
//! CLI hands in whatever [`Supervisor`] wired up from config. No globals, no ambient
//! clients, no surprises.
//!
//! 💀 Fetch failures and sink failures end the run. Lookup failures do not.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::aggregator::KpiAggregator;
use crate::app_config::{AppConfig, FieldsConfig, FiltersConfig};
use crate::backends::{DirectoryService, RecordSource, Sink, SinkBackend, connect_sink, connect_source};
use crate::directory::{DirectoryStats, UserDirectory, build_user_directory};
use crate::normalizer::normalize_all;
use crate::report::{ReportTables, assemble_report};

/// 📊 What a finished run leaves behind, besides the files.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub tables: ReportTables,
    pub directory_stats: DirectoryStats,
    pub test_run_count: usize,
    pub defect_count: usize,
    /// 💾 Files the sink wrote, in send order. Empty for sinks that don't write files.
    pub written_files: Vec<PathBuf>,
}

/// 🚀 Run the whole report once against the given collaborators.
///
/// The sink is closed on success. On a failed `send` it is left as is: the run is
/// already over and a half-written report is not worth finalizing.
pub async fn run_pipeline<R, D, S>(
    source: &mut R,
    directory_service: &mut D,
    sink: &mut S,
    filters: &FiltersConfig,
    fields: &FieldsConfig,
) -> Result<PipelineOutcome>
where
    R: RecordSource + ?Sized,
    D: DirectoryService + ?Sized,
    S: Sink + ?Sized,
{
    // -- 📥 stage 0: both streams, fully materialized. either one failing is fatal.
    let test_runs = source
        .fetch(filters.testrun_filter_id)
        .await
        .with_context(|| format!("💀 Fetching test runs (filter {}) failed", filters.testrun_filter_id))?;
    let defects = source
        .fetch(filters.defect_filter_id)
        .await
        .with_context(|| format!("💀 Fetching defects (filter {}) failed", filters.defect_filter_id))?;
    info!("📥 fetched {} test runs and {} defects", test_runs.len(), defects.len());

    // -- 📇 stage 1: names for every id either stream mentions
    let mut directory = UserDirectory::new();
    let directory_stats = build_user_directory(
        test_runs.iter().chain(defects.iter()),
        directory_service,
        &mut directory,
        &fields.display_name_field,
    )
    .await;

    // -- 🔄 stages 2-4: pure, no I/O beyond this point until the sink
    let normalized = normalize_all(&test_runs, &defects, &directory);
    let kpi_rows = KpiAggregator::from_records(&normalized).into_rows();
    info!("🧮 {} KPI rows from {} normalized records", kpi_rows.len(), normalized.len());
    let tables = assemble_report(&kpi_rows, &test_runs, &defects, &directory, fields);

    // -- 🚰 stage 5: kpi, defects, test runs, then close
    for table in tables.iter() {
        sink.send(table)
            .await
            .with_context(|| format!("💀 The sink refused the {:?} table", table.kind))?;
    }
    sink.close().await.context("💀 The sink failed to close")?;
    info!("✅ report delivered: {} tables", tables.iter().count());

    Ok(PipelineOutcome {
        tables,
        directory_stats,
        test_run_count: test_runs.len(),
        defect_count: defects.len(),
        written_files: Vec::new(),
    })
}

/// 📦 The Supervisor: turns an [`AppConfig`] into connected backends and one run.
pub(crate) struct Supervisor {
    app_config: AppConfig,
}

impl Supervisor {
    pub(crate) fn new(app_config: AppConfig) -> Self {
        Self { app_config }
    }

    /// 🧵 Connect everything, run once, report back.
    pub(crate) async fn start(&self) -> Result<PipelineOutcome> {
        let (mut source, mut directory_service) = connect_source(&self.app_config.source_config)
            .await
            .context("💀 Could not connect to the record source")?;
        let mut sink = connect_sink(&self.app_config.sink_config)
            .await
            .context("💀 Could not open the sink")?;

        let mut outcome = run_pipeline(
            &mut source,
            &mut directory_service,
            &mut sink,
            &self.app_config.filters,
            &self.app_config.fields,
        )
        .await?;

        if let SinkBackend::File(file_sink) = &sink {
            outcome.written_files = file_sink.written().to_vec();
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::UserKey;
    use crate::backends::{InMemoryDirectory, InMemorySink, InMemorySource};
    use crate::common::TableKind;
    use serde_json::json;

    fn filters() -> FiltersConfig {
        FiltersConfig::default()
    }

    fn alice_source() -> InMemorySource {
        InMemorySource::default()
            .with_filter(
                6261,
                vec![
                    json!({"documentKey": "TR-1", "fields": {"assignedTo": 101, "executionDate": "2024-03-01", "testRunStatus": "PASSED"}}),
                    json!({"documentKey": "TR-2", "fields": {"assignedTo": 101, "executionDate": "2024-03-01", "testRunStatus": "FAILED"}}),
                ],
            )
            .with_filter(6017, vec![json!({"fields": {"documentKey": "BUG-1", "name": "It broke", "createdBy": 101}})])
    }

    #[tokio::test]
    async fn the_one_where_alice_gets_the_numbers() -> Result<()> {
        let mut source = alice_source();
        let mut directory = InMemoryDirectory::default().with_user(101u64, json!({"firstName": "Alice"}));
        let sink = InMemorySink::default();
        let mut handed_off = sink.clone();

        let outcome = run_pipeline(&mut source, &mut directory, &mut handed_off, &filters(), &FieldsConfig::default()).await?;

        let kpi = &outcome.tables.kpi;
        assert_eq!(kpi.rows.len(), 1);
        assert_eq!(
            kpi.rows[0],
            vec![json!("Alice"), json!(2), json!(1), json!(1), json!(2.0), json!(0.5)]
        );
        assert_eq!(outcome.test_run_count, 2);
        assert_eq!(outcome.defect_count, 1);
        assert_eq!(outcome.directory_stats.looked_up, 1);
        assert_eq!(directory.lookups().await.len(), 1, "101 appears three times, asked once");

        let received = sink.tables().await;
        let kinds: Vec<_> = received.iter().map(|table| table.kind).collect();
        assert_eq!(kinds, vec![TableKind::Kpi, TableKind::Defects, TableKind::TestRuns]);
        assert!(sink.is_closed().await);
        assert_eq!(received[2].cell(1, "Status"), Some(&json!("FAILED")));
        assert_eq!(received[1].cell(0, "Created By"), Some(&json!("Alice")));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_failed_fetch_ends_the_run() {
        let mut source = alice_source().with_failing_filter(6017);
        let mut directory = InMemoryDirectory::default();
        let mut sink = InMemorySink::default();

        let err = run_pipeline(&mut source, &mut directory, &mut sink, &filters(), &FieldsConfig::default())
            .await
            .expect_err("💀 a failing defect filter must be fatal");
        assert!(format!("{err:#}").contains("filter 6017"));
        assert!(sink.tables().await.is_empty(), "nothing reaches the sink");
        assert!(directory.lookups().await.is_empty(), "no lookups before both fetches succeed");
    }

    #[tokio::test]
    async fn the_one_where_nobody_knows_who_ran_the_test() -> Result<()> {
        let mut source = InMemorySource::default()
            .with_filter(6261, vec![json!({"documentKey": "TR-9", "assignedTo": 404, "executionDate": "2024-05-05"})]);
        let mut directory = InMemoryDirectory::default().with_failing_user(404u64);
        let mut sink = InMemorySink::default();

        let outcome = run_pipeline(&mut source, &mut directory, &mut sink, &filters(), &FieldsConfig::default()).await?;

        assert_eq!(outcome.directory_stats.failed, 1);
        let kpi = &outcome.tables.kpi;
        assert_eq!(kpi.rows.len(), 1);
        assert_eq!(kpi.cell(0, "User"), Some(&json!(null)));
        assert_eq!(kpi.cell(0, "Testrun_count"), Some(&json!(1)));
        assert_eq!(outcome.tables.test_runs.cell(0, "Assigned To"), Some(&json!(null)));
        assert_eq!(UserKey::from_display_name(None), UserKey::Unresolved);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_supervisor_writes_real_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let app_config = AppConfig {
            source_config: crate::app_config::SourceConfig::InMemory,
            sink_config: crate::app_config::SinkConfig::File(crate::backends::FileSinkConfig {
                output_dir: dir.path().display().to_string(),
                format: crate::composers::OutputFormat::Csv,
            }),
            filters: filters(),
            fields: FieldsConfig::default(),
        };

        let outcome = Supervisor::new(app_config).start().await?;

        assert!(outcome.tables.kpi.rows.is_empty());
        assert_eq!(outcome.written_files.len(), 3);
        let kpi = tokio::fs::read_to_string(dir.path().join("kp_data.csv")).await?;
        assert_eq!(
            kpi,
            "User,Testrun_count,Defect_count,Days,Test case Productivity,Defect Observation Rate\n"
        );
        Ok(())
    }
}
