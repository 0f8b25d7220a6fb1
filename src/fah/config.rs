use crate::fah::collection::SourceLoadOptions;
use crate::fah::index::DEFAULT_INDEX_FILE;
use crate::fah::managed::ManagedLoadOptions;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedConfig {
    #[serde(default = "default_index_file")]
    pub index_file: String,
    #[serde(default)]
    pub ignore_missing: bool,
    #[serde(default)]
    pub ignore_extra: bool,
}

fn default_index_file() -> String {
    DEFAULT_INDEX_FILE.to_string()
}

impl Default for ManagedConfig {
    fn default() -> Self {
        Self {
            index_file: default_index_file(),
            ignore_missing: false,
            ignore_extra: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_normalize_records")]
    pub normalize_records: bool,
}

fn default_normalize_records() -> bool {
    true
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            normalize_records: default_normalize_records(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FahdbConfig {
    pub managed: ManagedConfig,
    pub source: SourceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialFahdbConfig {
    managed: Option<ManagedConfig>,
    source: Option<SourceConfig>,
}

impl FahdbConfig {
    pub fn managed_load_options(&self) -> ManagedLoadOptions {
        ManagedLoadOptions {
            index_file: self.managed.index_file.clone(),
            ignore_missing: self.managed.ignore_missing,
            ignore_extra: self.managed.ignore_extra,
        }
    }

    pub fn source_load_options(&self) -> SourceLoadOptions {
        SourceLoadOptions {
            normalize_records: self.source.normalize_records,
        }
    }
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => match v.trim() {
            "1" | "true" | "TRUE" | "yes" | "on" => true,
            "0" | "false" | "FALSE" | "no" | "off" => false,
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn validate(cfg: &FahdbConfig) -> Result<()> {
    let index_file = cfg.managed.index_file.as_str();
    if index_file.trim().is_empty() {
        return Err(anyhow!("invalid index file: cannot be empty"));
    }
    if index_file.trim() != index_file {
        return Err(anyhow!(
            "invalid index file `{index_file}`: surrounding whitespace is not allowed"
        ));
    }
    if index_file.contains('/') || index_file.contains('\\') {
        return Err(anyhow!(
            "invalid index file `{index_file}`: must be a bare file name"
        ));
    }
    if !index_file.ends_with(".csv") {
        return Err(anyhow!("invalid index file `{index_file}`: must end in .csv"));
    }
    Ok(())
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("FAHDB_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("fahdb").join("fahdb.toml"))
}

fn merge_file_config(base: &mut FahdbConfig, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(path)?;
    let parsed: PartialFahdbConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse fahdb config {}: {err}", path.display()))?;
    if let Some(mut managed) = parsed.managed {
        managed.index_file = managed.index_file.trim().to_string();
        base.managed = managed;
    }
    if let Some(source) = parsed.source {
        base.source = source;
    }
    Ok(())
}

pub fn load_config() -> Result<FahdbConfig> {
    let mut cfg = FahdbConfig::default();
    if let Some(path) = resolve_config_path() {
        merge_file_config(&mut cfg, &path)?;
    }

    cfg.managed.index_file = env_or_string("FAHDB_INDEX_FILE", &cfg.managed.index_file);
    cfg.managed.ignore_missing = env_or_bool("FAHDB_IGNORE_MISSING", cfg.managed.ignore_missing);
    cfg.managed.ignore_extra = env_or_bool("FAHDB_IGNORE_EXTRA", cfg.managed.ignore_extra);
    cfg.source.normalize_records = env_or_bool(
        "FAHDB_NORMALIZE_SOURCE_RECORDS",
        cfg.source.normalize_records,
    );

    validate(&cfg)?;
    Ok(cfg)
}
