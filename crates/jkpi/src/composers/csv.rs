// ai
//! 🎬 *[the spreadsheet opens. the commas line up. somewhere, an accountant smiles.]*
//!
//! 📄 **CsvComposer**: header row, data rows, RFC 4180 quoting, assembled by hand.
//!
//! 🧠 Knowledge graph:
//! - `null` → empty field. Strings verbatim. Numbers and bools as their JSON text,
//!   so `2.0` stays `2.0` and does not quietly become `2`.
//! - Nested values (should they ever sneak in) become compact JSON text.
//! - A field is quoted when it contains `,`, `"`, `\r` or `\n`; inner quotes double up.
//! - Line terminator is `\n`. Every line, including the last one, gets one.

use std::borrow::Cow;

use anyhow::Result;
use serde_json::Value;

use super::Composer;
use crate::common::ReportTable;

#[derive(Debug, Clone, Copy)]
pub(crate) struct CsvComposer;

fn render_cell(cell: &Value) -> Cow<'_, str> {
    match cell {
        Value::Null => Cow::Borrowed(""),
        Value::String(text) => Cow::Borrowed(text.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

fn push_field(line: &mut String, field: &str) {
    if field.contains([',', '"', '\r', '\n']) {
        line.push('"');
        line.push_str(&field.replace('"', "\"\""));
        line.push('"');
    } else {
        line.push_str(field);
    }
}

fn push_record<'a, I>(payload: &mut String, fields: I)
where
    I: IntoIterator<Item = Cow<'a, str>>,
{
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            payload.push(',');
        }
        push_field(payload, &field);
    }
    payload.push('\n');
}

impl Composer for CsvComposer {
    fn compose(&self, table: &ReportTable) -> Result<String> {
        let mut payload = String::with_capacity(64 * (table.rows.len() + 1));
        push_record(&mut payload, table.columns.iter().map(|c| Cow::Borrowed(*c)));
        for row in &table.rows {
            push_record(&mut payload, row.iter().map(render_cell));
        }
        Ok(payload)
    }

    fn extension(&self) -> &'static str {
        "csv"
    }
}
