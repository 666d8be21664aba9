pub mod scb_card;
pub mod uob_card;

pub use scb_card::ScbCard;
pub use uob_card::UobCard;

use cardimport_core::{Table, Value};

/// Trim spaces and tabs around text cells and drop rows that are entirely blank.
///
/// Both card exports pad cells and separate sections with empty lines.
pub(crate) fn clean_raw_table(table: Table) -> Table {
    table
        .convert_all(|v| match v {
            Value::Text(s) => Value::Text(s.trim_matches([' ', '\t']).to_string()),
            other => other,
        })
        .select(|row| row.cells().iter().any(|c| !c.is_blank()))
}
