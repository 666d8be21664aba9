//! Importer registry and file dispatch.

use std::fmt;
use std::str::FromStr;

use cardimport_core::{ImportError, Importer, ImporterConfig, StatementFile};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::parsers::{ScbCard, UobCard};

/// Every export format this crate knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImporterKind {
    ScbCard,
    UobCard,
}

impl ImporterKind {
    pub const ALL: [ImporterKind; 2] = [ImporterKind::ScbCard, ImporterKind::UobCard];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImporterKind::ScbCard => "scb-card",
            ImporterKind::UobCard => "uob-card",
        }
    }

    pub fn build(&self, config: &ImporterConfig) -> Result<Box<dyn Importer>, ImportError> {
        Ok(match self {
            ImporterKind::ScbCard => Box::new(ScbCard::new(config)?),
            ImporterKind::UobCard => Box::new(UobCard::new(config)?),
        })
    }
}

impl fmt::Display for ImporterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImporterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImporterKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown importer: {s}"))
    }
}

/// One importer of each kind, all with default options.
pub fn default_importers() -> Result<Vec<Box<dyn Importer>>, ImportError> {
    ImporterKind::ALL
        .iter()
        .map(|k| k.build(&ImporterConfig::default()))
        .collect()
}

/// First importer, in order, that claims `file`.
pub fn find_importer<'a>(
    importers: &'a [Box<dyn Importer>],
    file: &StatementFile,
) -> Option<&'a dyn Importer> {
    let found = importers.iter().find(|imp| imp.identify(file)).map(|imp| &**imp);
    match found {
        Some(imp) => debug!(importer = imp.name(), file = %file.path().display(), "file claimed"),
        None => warn!(file = %file.path().display(), "no importer claimed file"),
    }
    found
}
