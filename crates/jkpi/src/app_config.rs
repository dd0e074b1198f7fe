//! 🔧 App Configuration: the sacred TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." (every developer at 3am) 🦆
//!
//! 🏗️ Powered by Figment. Env vars (`JKPI_*`, `__` for nesting) are the base layer, an
//! optional TOML file goes on top. Everything except the source has a default, so the
//! smallest useful config is a Jama URL and some credentials.

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::backends::{FileSinkConfig, FileSourceConfig, JamaSourceConfig};

/// 📦 The AppConfig: one struct to rule them all, and in the Figment bind them.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// 📡 Where the records and the user profiles come from.
    pub source_config: SourceConfig,
    /// 🚰 Where the three report tables go. Defaults to CSV files in the working directory.
    #[serde(default)]
    pub sink_config: SinkConfig,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub fields: FieldsConfig,
}

/// 📡 Record source + user directory, picked together.
///
/// Variant keys are snake_case (`[source_config.jama]`) because figment lowercases env
/// keys: `JKPI_SOURCE_CONFIG__JAMA__CLIENT_SECRET` arrives as `source_config.jama.client_secret`,
/// and it has to land in the same table as the TOML file's `url`.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub enum SourceConfig {
    Jama(JamaSourceConfig),
    File(FileSourceConfig),
    /// 🧪 Empty filters, empty directory. Useful for smoke tests and not much else.
    InMemory,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub enum SinkConfig {
    File(FileSinkConfig),
    InMemory,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self::File(FileSinkConfig::default())
    }
}

/// 🔍 The two saved filters the report is built from.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FiltersConfig {
    #[serde(default = "default_testrun_filter_id")]
    pub testrun_filter_id: u64,
    #[serde(default = "default_defect_filter_id")]
    pub defect_filter_id: u64,
}

fn default_testrun_filter_id() -> u64 {
    6261
}

fn default_defect_filter_id() -> u64 {
    6017
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            testrun_filter_id: default_testrun_filter_id(),
            defect_filter_id: default_defect_filter_id(),
        }
    }
}

/// 🏷️ Field names that are instance-specific in Jama (custom fields carry an item type suffix).
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FieldsConfig {
    /// Profile field holding the display name.
    #[serde(default = "default_display_name_field")]
    pub display_name_field: String,
    #[serde(default = "default_build_field")]
    pub build_field: String,
    #[serde(default = "default_found_on_field")]
    pub found_on_field: String,
    #[serde(default = "default_status_field")]
    pub status_field: String,
}

fn default_display_name_field() -> String {
    "firstName".to_string()
}

fn default_build_field() -> String {
    "BUG_foundInBuild$154".to_string()
}

fn default_found_on_field() -> String {
    "BUG_foundOnDate$154".to_string()
}

fn default_status_field() -> String {
    "testRunStatus".to_string()
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            display_name_field: default_display_name_field(),
            build_field: default_build_field(),
            found_on_field: default_found_on_field(),
            status_field: default_status_field(),
        }
    }
}

/// 🚀 Load the config: from a file, from env vars, or from the sheer power of hoping.
///
/// 📐 Layering:
///   - `config_file_name` is None  → env vars only.
///   - `config_file_name` is Some  → env vars + TOML file, merged. TOML wins on conflicts.
///
/// 💀 Returns an error if the result does not deserialize into an [`AppConfig`].
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let config = Figment::new().merge(Env::prefixed("JKPI_").split("__"));
    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (JKPI_*). \
             The file exists in our hearts, but apparently not in a shape serde recognizes.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (JKPI_*). \
                 No file was provided, this one's all on the environment. Classic."
            .to_string(),
    };

    config.extract().context(context_msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composers::OutputFormat;

    /// 🧪 Load `contents` as jkpi.toml inside a figment Jail. The Jail's lock keeps the
    /// env-var tests from leaking JKPI_* into this one.
    fn load_in_jail(contents: &str) -> Result<AppConfig, String> {
        let mut loaded = None;
        figment::Jail::expect_with(|jail| {
            jail.create_file("jkpi.toml", contents)?;
            loaded = Some(load_config(Some(Path::new("jkpi.toml"))).map_err(|err| format!("{err:#}")));
            Ok(())
        });
        loaded.unwrap_or_else(|| Err("💀 the jail never ran".to_string()))
    }

    #[test]
    fn the_one_where_a_jama_config_shows_up_with_only_a_url() {
        let loaded = load_in_jail(
            r#"
            [source_config.jama]
            url = "https://acme.jamacloud.com"
            client_id = "id"
            client_secret = "secret"
            "#,
        );

        let app_config = loaded.expect("💀 A minimal Jama config should parse.");

        match &app_config.source_config {
            SourceConfig::Jama(jama) => {
                assert_eq!(jama.url, "https://acme.jamacloud.com");
                assert_eq!(jama.page_size, 50);
                assert_eq!(jama.request_timeout_secs, 30);
            }
            honestly_who_knows => panic!("💀 Expected Jama, serde took us to {:?}", honestly_who_knows),
        }
        assert_eq!(app_config.filters, FiltersConfig::default());
        assert_eq!(app_config.filters.testrun_filter_id, 6261);
        assert_eq!(app_config.filters.defect_filter_id, 6017);
        assert_eq!(app_config.fields.build_field, "BUG_foundInBuild$154");
        match app_config.sink_config {
            SinkConfig::File(file) => {
                assert_eq!(file.output_dir, ".");
                assert_eq!(file.format, OutputFormat::Csv);
            }
            SinkConfig::InMemory => panic!("💀 the default sink should write files"),
        }
    }

    #[test]
    fn the_one_where_every_knob_gets_turned() {
        let loaded = load_in_jail(
            r#"
            source_config = "in_memory"

            [sink_config.file]
            output_dir = "reports"
            format = "ndjson"

            [filters]
            testrun_filter_id = 1
            defect_filter_id = 2

            [fields]
            display_name_field = "lastName"
            status_field = "status"
            "#,
        );

        let app_config = loaded.expect("💀 Full config should parse.");

        assert!(matches!(app_config.source_config, SourceConfig::InMemory));
        assert_eq!(app_config.filters, FiltersConfig { testrun_filter_id: 1, defect_filter_id: 2 });
        assert_eq!(app_config.fields.display_name_field, "lastName");
        assert_eq!(app_config.fields.status_field, "status");
        assert_eq!(app_config.fields.found_on_field, "BUG_foundOnDate$154");
        match app_config.sink_config {
            SinkConfig::File(file) => {
                assert_eq!(file.output_dir, "reports");
                assert_eq!(file.format, OutputFormat::Ndjson);
            }
            SinkConfig::InMemory => panic!("💀 expected a file sink"),
        }
    }

    #[test]
    fn the_one_where_file_dumps_are_listed() {
        let loaded = load_in_jail(
            r#"
            [source_config.file]
            users_file = "users.json"

            [[source_config.file.dumps]]
            filter_id = 6261
            file_name = "runs.json"

            [[source_config.file.dumps]]
            filter_id = 6017
            file_name = "defects.ndjson"
            "#,
        );

        let app_config = loaded.expect("💀 File source config should parse.");
        match app_config.source_config {
            SourceConfig::File(file) => {
                assert_eq!(file.dumps.len(), 2);
                assert_eq!(file.dumps[1].file_name, "defects.ndjson");
                assert_eq!(file.users_file.as_deref(), Some("users.json"));
            }
            honestly_who_knows => panic!("💀 Expected File, got {:?}", honestly_who_knows),
        }
    }

    #[test]
    fn the_one_where_partial_sections_fill_in_the_blanks() {
        let fields: FieldsConfig = toml::from_str(r#"build_field = "BUG_build$77""#)
            .expect("💀 a lone build_field should parse");
        assert_eq!(fields.build_field, "BUG_build$77");
        assert_eq!(fields.status_field, "testRunStatus");
        assert_eq!(fields.display_name_field, "firstName");

        let filters: FiltersConfig = toml::from_str("").expect("💀 an empty table is still a table");
        assert_eq!(filters, FiltersConfig::default());

        let sink: SinkConfig = toml::from_str(
            r#"
            [file]
            format = "json_array"
            "#,
        )
        .expect("💀 a file sink with only a format should parse");
        match sink {
            SinkConfig::File(file) => {
                assert_eq!(file.format, OutputFormat::JsonArray);
                assert_eq!(file.output_dir, ".");
            }
            SinkConfig::InMemory => panic!("💀 expected a file sink"),
        }
    }

    #[test]
    fn the_one_where_the_secret_lives_in_env_and_the_url_in_toml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "jkpi.toml",
                r#"
                [source_config.jama]
                url = "https://acme.jamacloud.com"
                "#,
            )?;
            jail.set_env("JKPI_SOURCE_CONFIG__JAMA__CLIENT_ID", "env-id");
            jail.set_env("JKPI_SOURCE_CONFIG__JAMA__CLIENT_SECRET", "s3cret");
            jail.set_env("JKPI_FILTERS__DEFECT_FILTER_ID", "42");

            let app_config = load_config(Some(Path::new("jkpi.toml"))).map_err(|err| format!("{err:#}"))?;
            match app_config.source_config {
                SourceConfig::Jama(jama) => {
                    assert_eq!(jama.url, "https://acme.jamacloud.com");
                    assert_eq!(jama.client_id.as_deref(), Some("env-id"));
                    assert_eq!(jama.client_secret.as_deref(), Some("s3cret"));
                }
                honestly_who_knows => panic!("💀 Expected Jama, got {:?}", honestly_who_knows),
            }
            assert_eq!(app_config.filters.defect_filter_id, 42);
            assert_eq!(app_config.filters.testrun_filter_id, 6261);
            Ok(())
        });
    }

    #[test]
    fn the_one_where_env_alone_is_enough() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("JKPI_SOURCE_CONFIG__JAMA__URL", "https://env.jamacloud.com");
            jail.set_env("JKPI_SINK_CONFIG", "in_memory");

            let app_config = load_config(None).map_err(|err| format!("{err:#}"))?;
            assert!(matches!(app_config.source_config, SourceConfig::Jama(ref jama) if jama.url == "https://env.jamacloud.com"));
            assert!(matches!(app_config.sink_config, SinkConfig::InMemory));
            Ok(())
        });
    }

    #[test]
    fn the_one_where_toml_beats_env_on_a_tie() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "jkpi.toml",
                r#"
                [source_config.jama]
                url = "https://toml.jamacloud.com"
                "#,
            )?;
            jail.set_env("JKPI_SOURCE_CONFIG__JAMA__URL", "https://env.jamacloud.com");

            let app_config = load_config(Some(Path::new("jkpi.toml"))).map_err(|err| format!("{err:#}"))?;
            assert!(matches!(app_config.source_config, SourceConfig::Jama(ref jama) if jama.url == "https://toml.jamacloud.com"));
            Ok(())
        });
    }

    #[test]
    fn the_one_where_the_source_is_missing() {
        let loaded = load_in_jail(
            r#"
            [filters]
            testrun_filter_id = 1
            "#,
        );
        assert!(loaded.is_err());
    }
}
