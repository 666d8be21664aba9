//! cardimport-ingest: the reader pipeline, importer dispatch and bank-specific adapters.

pub mod dispatch;
pub mod parsers;
pub mod reader;

pub use dispatch::{ImporterKind, default_importers, find_importer};
pub use parsers::{ScbCard, UobCard};
pub use reader::{FileReader, extract, read_table};
