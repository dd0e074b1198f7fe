//! 📊 jkpi: per-user test-run and defect KPIs out of Jama saved filters.
//!
//! Fetch two filters, put names to user ids, count, divide carefully, write three
//! tables. The interesting parts are [`resolver`] (finding a key anywhere in a record)
//! and [`aggregator`] (the counting and the dividing). Everything else is plumbing.

pub mod aggregator;
pub mod app_config;
pub mod backends;
pub mod common;
mod composers;
pub mod directory;
pub mod normalizer;
mod progress;
pub mod report;
pub mod resolver;
pub mod supervisors;

use anyhow::{Context, Result};

use crate::app_config::AppConfig;
use crate::supervisors::{PipelineOutcome, Supervisor};

pub use crate::composers::OutputFormat;

/// 🚀 Connect the configured backends and run the report once.
pub async fn run(app_config: AppConfig) -> Result<PipelineOutcome> {
    Supervisor::new(app_config)
        .start()
        .await
        .context("💀 The KPI run did not make it to the end")
}
