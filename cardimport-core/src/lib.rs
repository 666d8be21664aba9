//! cardimport-core: tables, statement files, normalized records and the importer contract

pub mod error;
pub mod file;
pub mod importer;
pub mod table;
pub mod types;

pub use error::ImportError;
pub use file::StatementFile;
pub use importer::{BalanceDateRule, Importer, ImporterConfig, ImporterSpec, StatementReader};
pub use table::{RowRef, Table, Value, parse_decimal};
pub use types::{BalanceAssertion, Statement, Transaction, fields};
