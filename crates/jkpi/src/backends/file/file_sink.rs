use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::{
    fs::File,
    io::{self, AsyncWriteExt},
};
use tracing::{info, trace};

use crate::backends::Sink;
use crate::common::ReportTable;
use crate::composers::{Composer, ComposerBackend, OutputFormat};

// -- 🚰 FileSinkConfig: cousin of FileSourceConfig, equally traumatized by disk full errors.
#[derive(Debug, Deserialize, Clone)]
pub struct FileSinkConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_output_dir() -> String {
    // -- ✅ "right here", the same place the old scripts dumped their CSVs
    ".".to_string()
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            format: OutputFormat::default(),
        }
    }
}

/// 🚰 FileSink: composes each table and writes it to its own file. I/O only.
///
/// ⚠️ `File::create` truncates if the file exists. No warning. No backup. Just gone.
/// Last run's `kp_data.csv` is this run's `kp_data.csv`. That is the point.
#[derive(Debug)]
pub struct FileSink {
    sink_config: FileSinkConfig,
    composer: ComposerBackend,
    written: Vec<PathBuf>,
}

impl FileSink {
    /// 🚀 Makes sure the output directory exists, then gets out of the way.
    pub async fn new(sink_config: FileSinkConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&sink_config.output_dir)
            .await
            .context(format!(
                "💀 The output directory '{}' could not be conjured into existence. \
                 We stared at the path. The path stared back.",
                sink_config.output_dir
            ))?;
        let composer = ComposerBackend::from_format(sink_config.format);
        Ok(Self {
            sink_config,
            composer,
            written: Vec::new(),
        })
    }

    pub fn path_for(&self, table: &ReportTable) -> PathBuf {
        Path::new(&self.sink_config.output_dir)
            .join(format!("{}.{}", table.kind.file_stem(), self.composer.extension()))
    }

    /// 📜 Files written so far, in send order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn send(&mut self, table: &ReportTable) -> Result<()> {
        let payload = self.composer.compose(table)?;
        let path = self.path_for(table);
        trace!("📬 {} bytes walked into the file sink, heading for {}", payload.len(), path.display());

        let file_handle = File::create(&path).await.context(format!(
            "💀 The report file '{}' refused to be born. Perhaps permissions were set by \
             someone who really, truly, did not want this file to exist.",
            path.display()
        ))?;
        // -- 📦 BufWriter: because one syscall per row is a war crime.
        let mut file_buf = io::BufWriter::new(file_handle);
        file_buf.write_all(payload.as_bytes()).await?;
        // -- 🗑️ flush now, async Drop is not a thing yet
        file_buf.flush().await.context(format!(
            "💀 Error flushing '{}'. The bytes were SO CLOSE. They could SEE the disk.",
            path.display()
        ))?;

        info!("💾 wrote {} rows to {}", table.rows.len(), path.display());
        self.written.push(path);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        // -- 🎬 every file was flushed on send. the curtain falls on an empty stage.
        trace!("🎬 file sink closing after {} files", self.written.len());
        Ok(())
    }
}
