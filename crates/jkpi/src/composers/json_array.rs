// ai
//! 🎬 *[JSON Array: the format tests love, the one that wraps, the one that brackets.]*
//!
//! 📦 **JsonArrayComposer**: `[row,row,row]`, each row an object keyed by column name.
//!
//! Brackets and commas by hand, rows through serde. Half artisanal, half industrial.

use anyhow::{Context, Result};
use serde_json::Value;

use super::Composer;
use crate::common::ReportTable;

#[derive(Debug, Clone, Copy)]
pub(crate) struct JsonArrayComposer;

impl Composer for JsonArrayComposer {
    fn compose(&self, table: &ReportTable) -> Result<String> {
        let mut payload = String::from("[");
        for (i, row) in table.row_objects().into_iter().enumerate() {
            if i > 0 {
                // 🔗 The comma: JSON's way of saying "and there's more where that came from."
                payload.push(',');
            }
            let item = serde_json::to_string(&Value::Object(row))
                .context("💀 A report row refused to become JSON inside the array.")?;
            payload.push_str(&item);
        }
        payload.push(']');
        Ok(payload)
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
