// ai
//! 🗂️ The Report Assembler: three tables, zero dropped rows.
//!
//! 🎬 *[the numbers are ready. the spreadsheet is hungry.]*
//! *["give me columns," it says. "named exactly like last quarter. I have pivot tables."]*
//!
//! 🧠 Knowledge graph:
//! - `kpi`: one row per user bucket. Column names are a contract, downstream keys off them.
//! - `defects`: one row per defect record, custom build / found-on fields included.
//! - `testruns`: one row per test run, status and execution date up front.
//! - Detail fields are resolved inside the record's `fields` container when it has one,
//!   otherwise inside the record itself. Missing → `null`. A row is never skipped.

use serde_json::Value;

use crate::aggregator::KpiRow;
use crate::app_config::FieldsConfig;
use crate::common::{RawRecord, ReportTable, TableKind};
use crate::directory::UserDirectory;
use crate::resolver::{find_key, find_user_id};

pub const KPI_COLUMNS: [&str; 6] = [
    "User",
    "Testrun_count",
    "Defect_count",
    "Days",
    "Test case Productivity",
    "Defect Observation Rate",
];

pub const DEFECT_COLUMNS: [&str; 5] = [
    "Document Key",
    "Name",
    "Created By",
    "Found in Build",
    "Found On Date",
];

pub const TESTRUN_COLUMNS: [&str; 5] = [
    "Status",
    "Execution Date",
    "Document Key",
    "Name",
    "Assigned To",
];

/// 📦 The three tables, in the order the sink receives them.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTables {
    pub kpi: ReportTable,
    pub defects: ReportTable,
    pub test_runs: ReportTable,
}

impl ReportTables {
    pub fn iter(&self) -> impl Iterator<Item = &ReportTable> {
        [&self.kpi, &self.defects, &self.test_runs].into_iter()
    }
}

/// 📂 The `fields` container if the record has one, else the record itself.
fn field_container(record: &RawRecord) -> &RawRecord {
    match record.get("fields") {
        Some(fields) if fields.is_object() => fields,
        _ => record,
    }
}

fn cell(container: &RawRecord, key: &str) -> Value {
    find_key(container, key).cloned().unwrap_or(Value::Null)
}

fn user_cell(container: &RawRecord, key: &str, directory: &UserDirectory) -> Value {
    directory
        .resolve(find_user_id(container, key).as_ref())
        .map(|name| Value::String(name.to_string()))
        .unwrap_or(Value::Null)
}

pub fn kpi_table(rows: &[KpiRow]) -> ReportTable {
    let mut table = ReportTable::new(TableKind::Kpi, &KPI_COLUMNS);
    for row in rows {
        table.push_row(vec![
            row.user
                .display_name()
                .map(|name| Value::String(name.to_string()))
                .unwrap_or(Value::Null),
            Value::from(row.testrun_count),
            Value::from(row.defect_count),
            Value::from(row.unique_days),
            Value::from(row.test_case_productivity),
            Value::from(row.defect_observation_rate),
        ]);
    }
    table
}

pub fn defect_table(
    defects: &[RawRecord],
    directory: &UserDirectory,
    fields: &FieldsConfig,
) -> ReportTable {
    let mut table = ReportTable::new(TableKind::Defects, &DEFECT_COLUMNS);
    for record in defects {
        let container = field_container(record);
        table.push_row(vec![
            cell(container, "documentKey"),
            cell(container, "name"),
            user_cell(container, "createdBy", directory),
            cell(container, &fields.build_field),
            cell(container, &fields.found_on_field),
        ]);
    }
    table
}

pub fn test_run_table(
    test_runs: &[RawRecord],
    directory: &UserDirectory,
    fields: &FieldsConfig,
) -> ReportTable {
    let mut table = ReportTable::new(TableKind::TestRuns, &TESTRUN_COLUMNS);
    for record in test_runs {
        let container = field_container(record);
        table.push_row(vec![
            cell(container, &fields.status_field),
            cell(container, "executionDate"),
            cell(container, "documentKey"),
            cell(container, "name"),
            user_cell(container, "assignedTo", directory),
        ]);
    }
    table
}

/// 🏗️ Build all three tables.
pub fn assemble_report(
    kpi_rows: &[KpiRow],
    test_runs: &[RawRecord],
    defects: &[RawRecord],
    directory: &UserDirectory,
    fields: &FieldsConfig,
) -> ReportTables {
    ReportTables {
        kpi: kpi_table(kpi_rows),
        defects: defect_table(defects, directory, fields),
        test_runs: test_run_table(test_runs, directory, fields),
    }
}
