//! Statement files as handed to importers.
//!
//! The file is read once and cached, so identification, table extraction and
//! the balance-label scan all see the same bytes.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ImportError;
use crate::table::{Table, Value};

/// How much of the file `head()` exposes to identification.
pub const HEAD_BYTES: usize = 8192;

#[derive(Debug, Clone)]
pub struct StatementFile {
    path: PathBuf,
    contents: String,
}

impl StatementFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ImportError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_contents(
            path,
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    }

    pub fn from_contents(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base name of the file, used for filename-pattern matching.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// The first [`HEAD_BYTES`] of the file, cut back to a char boundary.
    pub fn head(&self) -> &str {
        if self.contents.len() <= HEAD_BYTES {
            return &self.contents;
        }
        let mut end = HEAD_BYTES;
        while !self.contents.is_char_boundary(end) {
            end -= 1;
        }
        &self.contents[..end]
    }

    /// Parse the file as CSV exactly as exported: the first record becomes the
    /// header, every cell is text, rows may differ in length.
    pub fn raw_table(&self) -> Result<Table, ImportError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_reader(self.contents.as_bytes());

        let mut records = rdr.records();
        let header = match records.next() {
            Some(record) => record?.iter().map(str::to_string).collect(),
            None => Vec::new(),
        };

        let mut rows = Vec::new();
        for result in records {
            let record = result?;
            rows.push(record.iter().map(Value::from).collect());
        }

        debug!(file = %self.path.display(), rows = rows.len(), "loaded raw table");
        Ok(Table::from_rows(header, rows))
    }
}
