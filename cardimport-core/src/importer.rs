//! The contract every bank adapter implements.
//!
//! An adapter is a fixed [`ImporterSpec`] plus a handful of table hooks. The
//! reader pipeline calls the hooks in order:
//!
//! raw file -> `prepare_raw_file` -> header map -> `prepare_table` ->
//! common normalization -> `prepare_processed_table` -> `skip_transaction`
//!
//! and finally `get_balance_statement` against a [`StatementReader`].

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ImportError;
use crate::file::StatementFile;
use crate::table::{Table, Value};
use crate::types::{BalanceAssertion, Transaction};

/// Which date a pipeline-dated balance assertion carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceDateRule {
    /// Day after the latest transaction (the balance holds at start of day).
    #[default]
    DayAfterLastTransaction,
    LastTransaction,
}

impl BalanceDateRule {
    pub fn apply(&self, max_transaction_date: NaiveDate) -> Option<NaiveDate> {
        match self {
            BalanceDateRule::DayAfterLastTransaction => max_transaction_date.succ_opt(),
            BalanceDateRule::LastTransaction => Some(max_transaction_date),
        }
    }
}

/// Per-account options supplied by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterConfig {
    /// Overrides the adapter's header identifier regex
    pub custom_header: Option<String>,
    /// Substring the file head must contain; empty matches every file
    pub account_number: String,
    /// Emit foreign amount/currency fields
    pub convert_currencies: bool,
    /// Overrides the adapter's filename regex
    pub filename_pattern: Option<String>,
    pub balance_assertion_date: BalanceDateRule,
}

/// Static description of one export format, built once per adapter instance.
#[derive(Debug, Clone)]
pub struct ImporterSpec {
    pub name: String,
    pub filename_pattern: Regex,
    pub header_identifier: Regex,
    pub account_number: String,
    /// Header row of the transaction table, cell by cell
    pub column_labels: Vec<String>,
    /// chrono format string for `date` and `date_posting`
    pub date_format: String,
    /// Source column -> canonical field, applied in order
    pub header_map: Vec<(String, String)>,
    pub skip_tail_rows: usize,
    pub skip_comments: Option<String>,
    pub balance_date: BalanceDateRule,
}

impl ImporterSpec {
    /// Start a spec from the adapter's defaults, letting `config` override the
    /// header identifier and filename pattern.
    pub fn new(
        name: &str,
        default_filename_pattern: &str,
        default_header: &str,
        config: &ImporterConfig,
    ) -> Result<Self, ImportError> {
        let filename = config
            .filename_pattern
            .as_deref()
            .unwrap_or(default_filename_pattern);
        let header = config.custom_header.as_deref().unwrap_or(default_header);

        Ok(Self {
            name: name.to_string(),
            filename_pattern: anchored(filename)?,
            header_identifier: anchored(header)?,
            account_number: config.account_number.clone(),
            column_labels: Vec::new(),
            date_format: "%Y-%m-%d".to_string(),
            header_map: Vec::new(),
            skip_tail_rows: 0,
            skip_comments: None,
            balance_date: config.balance_assertion_date,
        })
    }

    pub fn with_column_labels(mut self, line: &str) -> Self {
        self.column_labels = line.split(',').map(str::to_string).collect();
        self
    }

    pub fn with_date_format(mut self, format: &str) -> Self {
        self.date_format = format.to_string();
        self
    }

    pub fn map_column(mut self, from: &str, to: &str) -> Self {
        self.header_map.push((from.to_string(), to.to_string()));
        self
    }

    pub fn with_skip_tail_rows(mut self, n: usize) -> Self {
        self.skip_tail_rows = n;
        self
    }

    pub fn with_skip_comments(mut self, prefix: &str) -> Self {
        self.skip_comments = Some(prefix.to_string());
        self
    }

    pub fn matches_filename(&self, file_name: &str) -> bool {
        self.filename_pattern.is_match(file_name)
    }

    /// Header regex matches at the start of `head` and the account number
    /// appears somewhere in it.
    pub fn matches_head(&self, head: &str) -> bool {
        self.header_identifier.is_match(head) && head.contains(&self.account_number)
    }
}

/// Patterns only match at the start of the input.
fn anchored(pattern: &str) -> Result<Regex, ImportError> {
    Ok(Regex::new(&format!("^(?:{pattern})"))?)
}

/// What the reader pipeline exposes to `get_balance_statement`.
pub trait StatementReader {
    /// Latest date among the normalized transaction rows.
    fn max_transaction_date(&self) -> Option<NaiveDate>;

    /// The pipeline's own convention for dating a balance assertion.
    fn balance_assertion_date(&self) -> Option<NaiveDate>;

    /// First raw row (after `prepare_raw_file`) whose first cell is `label`.
    fn row_by_label(&self, label: &str) -> Result<Option<Vec<Value>>, ImportError>;
}

pub trait Importer {
    fn spec(&self) -> &ImporterSpec;

    fn name(&self) -> &str {
        &self.spec().name
    }

    /// Cheap check used by dispatch: filename pattern plus `deep_identify`.
    fn identify(&self, file: &StatementFile) -> bool {
        self.spec().matches_filename(file.file_name()) && self.deep_identify(file)
    }

    fn deep_identify(&self, file: &StatementFile) -> bool {
        self.spec().matches_head(file.head())
    }

    fn skip_transaction(&self, _txn: &Transaction) -> bool {
        false
    }

    /// Runs on the table as parsed, before the column labels row is located.
    fn prepare_raw_file(&self, table: Table) -> Table {
        table
    }

    /// Runs after the header map, before common normalization.
    fn prepare_table(&self, table: Table) -> Result<Table, ImportError> {
        Ok(table)
    }

    /// Runs after common normalization.
    fn prepare_processed_table(&self, table: Table) -> Result<Table, ImportError> {
        Ok(table)
    }

    fn get_balance_statement(
        &self,
        _reader: &dyn StatementReader,
    ) -> Result<Option<BalanceAssertion>, ImportError> {
        Ok(None)
    }
}
