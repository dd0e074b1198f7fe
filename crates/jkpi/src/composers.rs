// ai
//! 🎬 *[the tables are built. the sink awaits. but someone... must pick the commas.]*
//! *["CSV," says finance. "NDJSON," says the data team. "JSON," says the intern.]*
//! *[the composer nods at all of them. it has seen worse meetings.]*
//!
//! 🎼 The Composers module: rendering a [`ReportTable`] into a payload string.
//!
//! 🧠 Knowledge graph:
//! - **CSV** (`CsvComposer`): header + rows, RFC 4180 quoting, `null` → empty field.
//!   The default, because spreadsheets are the real consumers here.
//! - **NDJSON** (`NdjsonComposer`): one JSON object per row, keys in column order.
//! - **JSON Array** (`JsonArrayComposer`): `[row,row]`, same objects, one document.
//! - Resolution: from [`OutputFormat`], same trait → impls → enum dispatcher shape
//!   as the backends.
//!
//! ```text
//! Supervisor:
//!   ReportTables → for each table: sink.send(table) → sink composes → bytes on disk
//! ```
//!
//! 🦆 (the duck prefers TSV. nobody asked the duck.)

use anyhow::Result;
use serde::Deserialize;

use crate::common::ReportTable;

pub(crate) mod csv;
pub(crate) mod json_array;
pub(crate) mod ndjson;

pub(crate) use csv::CsvComposer;
pub(crate) use json_array::JsonArrayComposer;
pub(crate) use ndjson::NdjsonComposer;

// ===== Trait =====

/// 🎼 Renders one table into the sink's wire format.
///
/// Ancient proverb: "He who hardcodes ',' in the sink, reformats in production."
pub(crate) trait Composer: std::fmt::Debug {
    fn compose(&self, table: &ReportTable) -> Result<String>;
    /// 📎 File extension for this format, no dot.
    fn extension(&self) -> &'static str;
}

/// 🎛️ Which format the file sink writes. Lives in config as `format = "csv"`.
#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Csv,
    Ndjson,
    JsonArray,
}

// ===== Dispatcher Enum =====

/// 🎭 The polymorphic composer: wraps concrete composers, dispatches via match.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ComposerBackend {
    Csv(CsvComposer),
    Ndjson(NdjsonComposer),
    JsonArray(JsonArrayComposer),
}

impl ComposerBackend {
    /// | OutputFormat | Composer | Shape |
    /// |---|---|---|
    /// | Csv | CsvComposer | `h1,h2\nv1,v2\n` |
    /// | Ndjson | NdjsonComposer | `{..}\n{..}\n` |
    /// | JsonArray | JsonArrayComposer | `[{..},{..}]` |
    pub(crate) fn from_format(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Csv => Self::Csv(CsvComposer),
            OutputFormat::Ndjson => Self::Ndjson(NdjsonComposer),
            OutputFormat::JsonArray => Self::JsonArray(JsonArrayComposer),
        }
    }
}

impl Composer for ComposerBackend {
    #[inline]
    fn compose(&self, table: &ReportTable) -> Result<String> {
        match self {
            Self::Csv(c) => c.compose(table),
            Self::Ndjson(c) => c.compose(table),
            Self::JsonArray(c) => c.compose(table),
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            Self::Csv(c) => c.extension(),
            Self::Ndjson(c) => c.extension(),
            Self::JsonArray(c) => c.extension(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TableKind;
    use serde_json::json;

    fn tiny_table() -> ReportTable {
        let mut table = ReportTable::new(TableKind::Kpi, &["User", "Days"]);
        table.push_row(vec![json!("Alice"), json!(1)]);
        table
    }

    #[test]
    fn backend_the_one_where_formats_pick_their_composers() {
        assert!(matches!(ComposerBackend::from_format(OutputFormat::Csv), ComposerBackend::Csv(_)));
        assert!(matches!(ComposerBackend::from_format(OutputFormat::Ndjson), ComposerBackend::Ndjson(_)));
        assert!(matches!(
            ComposerBackend::from_format(OutputFormat::JsonArray),
            ComposerBackend::JsonArray(_)
        ));
    }

    #[test]
    fn backend_the_one_where_compose_dispatches_correctly() -> Result<()> {
        let composer = ComposerBackend::from_format(OutputFormat::JsonArray);
        assert_eq!(composer.compose(&tiny_table())?, r#"[{"User":"Alice","Days":1}]"#);
        assert_eq!(composer.extension(), "json");
        Ok(())
    }

    #[test]
    fn backend_the_one_where_format_deserializes_from_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: OutputFormat,
        }
        let wrapper: Wrapper = toml::from_str(r#"format = "json_array""#).expect("💀 format should parse");
        assert_eq!(wrapper.format, OutputFormat::JsonArray);
        assert_eq!(OutputFormat::default(), OutputFormat::Csv);
    }
}
