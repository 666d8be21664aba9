use anyhow::{Context, Result};
use cardimport_core::{Importer, ImporterConfig};
use cardimport_ingest::{ImporterKind, default_importers};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Accounts file: one entry per configured importer instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, rename = "account")]
    pub accounts: Vec<AccountSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSection {
    pub importer: ImporterKind,
    #[serde(flatten)]
    pub options: ImporterConfig,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(toml::from_str(s)?)
}

/// Importers in config order, or one of every kind when no config is given.
pub fn build_importers(config: Option<&Config>) -> Result<Vec<Box<dyn Importer>>> {
    let Some(config) = config.filter(|c| !c.accounts.is_empty()) else {
        return Ok(default_importers()?);
    };
    config
        .accounts
        .iter()
        .map(|a| {
            a.importer
                .build(&a.options)
                .with_context(|| format!("configure {} importer", a.importer))
        })
        .collect()
}
