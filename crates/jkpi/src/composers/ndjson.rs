// ai
//! 🎬 *[every row, alone. no brackets. no comfort. just `\n`. this is NDJSON.]*
//!
//! 📡 **NdjsonComposer**: one JSON object per row, keys in column order.
//!
//! 🦆 The duck asked what NDJSON stands for. We told it. It left anyway.

use anyhow::{Context, Result};
use serde_json::Value;

use super::Composer;
use crate::common::ReportTable;

#[derive(Debug, Clone, Copy)]
pub(crate) struct NdjsonComposer;

impl Composer for NdjsonComposer {
    fn compose(&self, table: &ReportTable) -> Result<String> {
        let mut payload = String::new();
        for row in table.row_objects() {
            let line = serde_json::to_string(&Value::Object(row))
                .context("💀 A report row refused to become JSON. It was just a row. It had one job.")?;
            payload.push_str(&line);
            payload.push('\n');
        }
        // -- ✅ trailing \n included, line-oriented tools appreciate it
        Ok(payload)
    }

    fn extension(&self) -> &'static str {
        "ndjson"
    }
}
