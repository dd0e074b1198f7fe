// ai
//! 📦 Common data structures: the building blocks of jkpi
//!
//! ---
//!
//! 🎬 COLD OPEN, INT. QA LAB, 4:52 PM, LAST DAY OF THE SPRINT
//!
//! 🌩️  Forty test runs, nine defects, and one manager who wants "the numbers"
//! before the retro. The numbers live in Jama. Jama speaks JSON. The JSON is
//! nested like a matryoshka doll that went to grad school. Somewhere in there,
//! a user id. Somewhere else, a date. Nobody knows how deep.
//!
//! ✅ This module defines the small, honest types that ferry those records
//! through the pipeline: the raw record (untyped, unapologetic), the user id
//! (opaque, occasionally a number, occasionally a string, always a mystery), and
//! the report table (rows and columns, like our ancestors intended).
//!
//! 🦆

use serde::Serialize;
use serde_json::{Map, Value};

/// 📦 A raw record straight from the source system. One test run or one defect.
///
/// Untyped on purpose: maps, sequences and scalars nested to whatever depth Jama
/// felt like that day. `serde_json` is built with `preserve_order`, so iterating a
/// map walks its keys in document order. The key resolver depends on that.
pub type RawRecord = Value;

/// 🏷️ A resolved, human-readable user name.
pub type DisplayName = String;

/// 🤷 What a user is called when the directory answered but forgot to say their name.
pub const UNKNOWN_DISPLAY_NAME: &str = "Unknown";

/// 🔑 An opaque reference to a user in the source system.
///
/// The source hands these out as numbers (`101`) or strings (`"101"`) depending on
/// the endpoint's mood. Both normalize to the same textual form so `101` and `"101"`
/// land in the same directory slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// 🔍 Interpret a raw value as a user id.
    ///
    /// Numbers and non-blank strings qualify. `null`, booleans, blanks, maps and
    /// sequences do not, they are simply "no user here".
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => Some(Self(number.to_string())),
            Value::String(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Self(trimmed.to_string()))
                }
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.trim().to_string())
    }
}

/// 🧵 Render a scalar as an opaque text token.
///
/// Strings pass through verbatim, numbers and booleans use their JSON text.
/// `null`, maps and sequences have no token.
pub fn scalar_token(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// 🗂️ Which of the three output tables this is. Also decides the output file stem,
/// because downstream spreadsheets have been opening `kp_data.csv` since forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TableKind {
    Kpi,
    Defects,
    TestRuns,
}

impl TableKind {
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::Kpi => "kp_data",
            Self::Defects => "defect_data",
            Self::TestRuns => "testrun_data",
        }
    }
}

/// 📊 One flat output table: fixed column names, uniform rows, `null` for the gaps.
///
/// Every row has exactly `columns.len()` cells. Cells stay `serde_json::Value` so
/// numbers remain numbers until a composer decides how they should look on disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    pub kind: TableKind,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<Value>>,
}

impl ReportTable {
    pub fn new(kind: TableKind, columns: &[&'static str]) -> Self {
        Self {
            kind,
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    /// ➕ Append a row. Short rows are padded with `null`, long rows are truncated,
    /// so the table stays rectangular no matter what the caller was thinking.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// 🔎 Cell lookup by row index and column name. Test helper, mostly.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let position = self.columns.iter().position(|name| *name == column)?;
        self.rows.get(row)?.get(position)
    }

    /// 🧱 Rows as JSON objects, keys in column order.
    pub fn row_objects(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row.iter())
                    .map(|(column, cell)| ((*column).to_string(), cell.clone()))
                    .collect()
            })
            .collect()
    }
}
