use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::backends::{DirectoryService, RecordSource, UserProfile};
use crate::common::{RawRecord, UserId};

// -- 📂 FileSourceConfig: "It's just a file", said no sysadmin ever before the disk filled up.
// -- Lives here, close to the FileSource that actually uses it. Ethos pattern, baby. 🎯
#[derive(Debug, Deserialize, Clone)]
pub struct FileSourceConfig {
    /// 🗂️ One dump per filter id. A filter without a dump is a fatal fetch.
    #[serde(default)]
    pub dumps: Vec<FilterDump>,
    /// 📇 Optional user profiles file. Without it, every lookup fails (gracefully).
    #[serde(default)]
    pub users_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FilterDump {
    pub filter_id: u64,
    pub file_name: String,
}

/// 🔬 Sniff the dump format and pull the records out.
///
/// - `[ ... ]` → the array is the records
/// - `{ "data": [ ... ] }` → a saved Jama page, `data` is the records
/// - anything else → NDJSON, one record per non-blank line
pub(crate) fn parse_dump(contents: &str) -> Result<Vec<RawRecord>> {
    let trimmed = contents.trim_start();
    if trimmed.starts_with('[') {
        let records: Vec<RawRecord> = serde_json::from_str(trimmed)
            .context("💀 The dump looked like a JSON array and then betrayed us halfway through.")?;
        return Ok(records);
    }
    if trimmed.starts_with('{') {
        // -- 🕵️ could be a single Jama page, could be the first line of NDJSON. Try the page first.
        if let Ok(Value::Object(mut page)) = serde_json::from_str::<Value>(trimmed) {
            if let Some(Value::Array(records)) = page.remove("data") {
                return Ok(records);
            }
            // -- a single object with no data array: treat it as a one-record NDJSON file
            return Ok(vec![Value::Object(page)]);
        }
    }
    trimmed
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str(line).with_context(|| {
                format!("💀 NDJSON line {} is not JSON. It is, at best, JSON-adjacent.", number + 1)
            })
        })
        .collect()
}

/// 📂 FileSource: reads a whole filter dump per fetch. Dumps are report-sized, not
/// migration-sized, so one `read_to_string` is plenty.
#[derive(Debug, Clone)]
pub struct FileSource {
    source_config: FileSourceConfig,
}

impl FileSource {
    pub fn new(source_config: FileSourceConfig) -> Self {
        Self { source_config }
    }
}

#[async_trait]
impl RecordSource for FileSource {
    async fn fetch(&mut self, filter_id: u64) -> Result<Vec<RawRecord>> {
        let dump = self
            .source_config
            .dumps
            .iter()
            .find(|dump| dump.filter_id == filter_id)
            .ok_or_else(|| {
                anyhow!(
                    "💀 No dump configured for filter {}. We checked every drawer. \
                     Add a [[source_config.file.dumps]] entry with filter_id = {}.",
                    filter_id,
                    filter_id
                )
            })?;

        let contents = tokio::fs::read_to_string(&dump.file_name).await.context(format!(
            "💀 The door to '{}' would not budge. We knocked. We pleaded. \
             The file remains unopened. We remain outside.",
            dump.file_name
        ))?;
        trace!("📖 hauled {} bytes out of '{}'", contents.len(), dump.file_name);

        let records = parse_dump(&contents)
            .with_context(|| format!("💀 Could not make sense of dump '{}'", dump.file_name))?;
        debug!("📂 filter {} → {} records from '{}'", filter_id, records.len(), dump.file_name);
        Ok(records)
    }
}

/// 📇 FileDirectory: user profiles from a JSON object keyed by user id.
#[derive(Debug, Default, Clone)]
pub struct FileDirectory {
    profiles: Map<String, Value>,
}

impl FileDirectory {
    pub async fn new(users_file: Option<&str>) -> Result<Self> {
        let Some(users_file) = users_file else {
            return Ok(Self::default());
        };
        let contents = tokio::fs::read_to_string(users_file)
            .await
            .context(format!("💀 The users file '{}' is playing hide and seek. It is winning.", users_file))?;
        let profiles = Self::parse(&contents)
            .with_context(|| format!("💀 The users file '{}' is not a JSON object of profiles", users_file))?;
        Ok(Self { profiles })
    }

    pub(crate) fn parse(contents: &str) -> Result<Map<String, Value>> {
        match serde_json::from_str::<Value>(contents)? {
            Value::Object(profiles) => Ok(profiles),
            other => bail!("expected an object keyed by user id, found {}", json_kind(&other)),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl DirectoryService for FileDirectory {
    async fn lookup(&mut self, user_id: &UserId) -> Result<UserProfile> {
        self.profiles
            .get(user_id.as_str())
            .cloned()
            .ok_or_else(|| anyhow!("💀 user {} is not in the users file", user_id))
    }
}
