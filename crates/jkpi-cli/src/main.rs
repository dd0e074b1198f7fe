//! 🚀 jkpi: the front door. Loads config, sets up logging, runs the report, prints
//! the KPI table. The real work lives in the `jkpi` crate. 🦆

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{Table, presets::UTF8_FULL};
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use jkpi::common::ReportTable;

/// 📊 Per-user test-run and defect KPIs from Jama saved filters.
#[derive(Debug, Parser)]
#[command(name = "jkpi", version, about)]
struct Cli {
    /// TOML config file. Missing file means "environment variables only" (JKPI_*).
    #[arg(default_value = "jkpi.toml")]
    config: PathBuf,
}

/// 🎨 One cell for the terminal: strings bare, null empty, everything else as JSON text.
fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn render_table(report_table: &ReportTable) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(report_table.columns.iter().copied());
    for row in &report_table.rows {
        table.add_row(row.iter().map(render_cell));
    }
    table
}

/// 🕵️ Does any layer of the error smell like the network?
fn looks_like_connection_trouble(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        let cause_str = cause.to_string();
        cause_str.contains("error sending request")
            || cause_str.contains("connection refused")
            || cause_str.contains("Connection refused")
            || cause_str.contains("tcp connect error")
            || cause_str.contains("dns error")
            || cause_str.contains("timed out")
    })
}

async fn run_cli(cli: Cli) -> Result<()> {
    let config_file = cli.config.as_path();
    let config_file_if_it_exists = match config_file.try_exists().context(format!(
        "💀 Could not even check whether '{}' exists. Permissions, perhaps. Or a cursed mount.",
        config_file.display()
    ))? {
        true => Some(config_file),
        false => {
            info!(
                "🔧 '{}' not found, configuring from JKPI_* environment variables only",
                config_file.display()
            );
            None
        }
    };

    let app_config = jkpi::app_config::load_config(config_file_if_it_exists).context(
        "💀 Couldn't load the configuration. Take a look at the file and the JKPI_* variables, \
         make sure source_config is set and nothing obvious is missing.",
    )?;

    let outcome = jkpi::run(app_config).await?;

    println!("{}", render_table(&outcome.tables.kpi));
    for path in &outcome.written_files {
        println!("💾 {}", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(err) = run_cli(cli).await {
        error!("💀 error: {}", err);
        // -- 🧅 peel the onion of sadness, one layer at a time
        for cause in err.chain().skip(1) {
            error!("⚠️  cause: {}", cause);
        }
        if looks_like_connection_trouble(&err) {
            error!(
                "🔧 hint: Jama doesn't seem reachable. Check the url in source_config, \
                 the VPN, and whether the instance is up. Even servers need a nudge sometimes. ☕"
            );
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn the_one_where_cells_render_like_a_spreadsheet() {
        assert_eq!(render_cell(&json!(null)), "");
        assert_eq!(render_cell(&json!("Alice")), "Alice");
        assert_eq!(render_cell(&json!(2.5)), "2.5");
        assert_eq!(render_cell(&json!(3)), "3");
    }

    #[test]
    fn the_one_where_a_refused_connection_gets_a_hint() {
        let err = anyhow::anyhow!("Connection refused (os error 111)").context("fetching filter 6261");
        assert!(looks_like_connection_trouble(&err));
        assert!(!looks_like_connection_trouble(&anyhow::anyhow!("bad toml")));
    }

    #[test]
    fn the_one_where_the_config_defaults_to_jkpi_toml() {
        let cli = Cli::parse_from(["jkpi"]);
        assert_eq!(cli.config, PathBuf::from("jkpi.toml"));
        let cli = Cli::parse_from(["jkpi", "other.toml"]);
        assert_eq!(cli.config, PathBuf::from("other.toml"));
    }
}
