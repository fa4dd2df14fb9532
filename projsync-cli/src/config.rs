//! Configuration file loading for projsync.
//!
//! Discovers and loads `projsync.toml` next to the project file.
//! Merges config file settings over the library defaults; CLI arguments take
//! precedence over both.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use projsync_core::{IntegrationSpec, ProjectKind, SyncSettings};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "projsync.toml";

/// Top-level configuration from projsync.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjsyncConfig {
    /// Integration used when a command does not name one.
    pub default_integration: Option<String>,

    /// Item classification overrides.
    pub classification: ClassificationConfig,

    /// Global properties applied during evaluation.
    pub properties: BTreeMap<String, String>,

    /// Additional or replacement integrations, keyed by name.
    pub integrations: BTreeMap<String, IntegrationConfig>,
}

/// Classification section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub tracked_item_type: Option<String>,
    pub generated_item_types: Option<Vec<String>>,
    pub generated_marker: Option<String>,
    /// Project kinds integration detection applies to.
    pub integration_kinds: Option<Vec<ProjectKind>>,
}

/// One `[integrations.<name>]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct IntegrationConfig {
    pub props_suffix: String,
    pub targets_suffix: String,
    pub props_import: String,
    pub targets_import: String,
}

impl FromStr for ProjsyncConfig {
    type Err = toml::de::Error;

    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        toml::from_str(contents)
    }
}

/// Where the config for `project_file` lives: a sibling `projsync.toml`.
pub fn config_path_for(project_file: &Utf8Path) -> Utf8PathBuf {
    project_file.with_file_name(CONFIG_FILE_NAME)
}

pub fn load_config(path: &Utf8Path) -> anyhow::Result<ProjsyncConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    contents
        .parse::<ProjsyncConfig>()
        .with_context(|| format!("parse config file {}", path))
}

/// Load the config beside `project_file`, falling back to library defaults.
pub fn load_for_project(project_file: &Utf8Path) -> anyhow::Result<ProjsyncConfig> {
    let path = config_path_for(project_file);
    if path.is_file() {
        debug!(config = %path, "loading config");
        load_config(&path)
    } else {
        debug!(config = %path, "no config file; using defaults");
        Ok(ProjsyncConfig::default())
    }
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: ProjsyncConfig,
}

impl ConfigMerger {
    pub fn new(config: ProjsyncConfig) -> Self {
        Self { config }
    }

    /// Produce settings from defaults, the config file, then CLI properties.
    pub fn merge(self, cli_properties: &BTreeMap<String, String>) -> SyncSettings {
        let mut settings = SyncSettings::default();
        let ProjsyncConfig {
            default_integration,
            classification,
            properties,
            integrations,
        } = self.config;

        if let Some(t) = classification.tracked_item_type {
            settings.tracked_item_type = t;
        }
        if let Some(types) = classification.generated_item_types {
            settings.generated_item_types = types;
        }
        if let Some(marker) = classification.generated_marker {
            settings.generated_marker = marker;
        }
        if let Some(kinds) = classification.integration_kinds {
            settings.integration_kinds = kinds;
        }

        for (name, cfg) in integrations {
            let spec = IntegrationSpec {
                name: name.clone(),
                props_suffix: cfg.props_suffix,
                targets_suffix: cfg.targets_suffix,
                props_import: cfg.props_import,
                targets_import: cfg.targets_import,
            };
            match settings.integrations.iter_mut().find(|i| i.name == name) {
                Some(existing) => *existing = spec,
                None => settings.integrations.push(spec),
            }
        }
        if let Some(name) = default_integration {
            settings.default_integration = name;
        }

        settings.global_properties = properties;
        for (k, v) in cli_properties {
            settings.global_properties.insert(k.clone(), v.clone());
        }
        settings
    }
}

/// Parse CLI properties from key=value strings.
pub fn parse_cli_properties(entries: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    for entry in entries {
        let mut parts = entry.splitn(2, '=');
        let key = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("invalid property '{}': missing name", entry))?;
        let value = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("invalid property '{}': missing '='", entry))?;
        out.insert(key.to_string(), value.trim().to_string());
    }
    Ok(out)
}
