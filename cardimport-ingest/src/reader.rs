//! Generic reader/builder pipeline.
//!
//! Drives an [`Importer`]'s hooks over one file and turns the resulting table
//! into [`Transaction`]s plus an optional balance assertion.

use cardimport_core::fields::{
    AMOUNT, CURRENCY, DATE, DATE_POSTING, FOREIGN_AMOUNT, FOREIGN_CURRENCY, MEMO, PAYEE,
};
use cardimport_core::{
    ImportError, Importer, ImporterSpec, RowRef, Statement, StatementFile, StatementReader, Table,
    Transaction, Value,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Run the full pipeline for `file` with `importer`.
pub fn extract(importer: &dyn Importer, file: &StatementFile) -> Result<Statement, ImportError> {
    let table = read_table(importer, file)?;
    let transactions = build_transactions(importer, &table)?;
    let max_date = max_transaction_date(&transactions);

    let reader = FileReader::new(importer, file, max_date);
    let balance = importer.get_balance_statement(&reader)?;

    info!(
        importer = importer.name(),
        file = %file.path().display(),
        transactions = transactions.len(),
        balance = balance.is_some(),
        "extracted statement"
    );

    Ok(Statement {
        importer: importer.name().to_string(),
        transactions,
        balance,
    })
}

/// Raw file to processed table: every hook up to `prepare_processed_table`.
pub fn read_table(importer: &dyn Importer, file: &StatementFile) -> Result<Table, ImportError> {
    let spec = importer.spec();

    let mut table = importer.prepare_raw_file(file.raw_table()?);
    if !spec.column_labels.is_empty() {
        table = table.start_at_labels(&spec.column_labels)?;
    }
    table = table.drop_last(spec.skip_tail_rows);
    if let Some(prefix) = &spec.skip_comments {
        table = table.select(|row| {
            !row
                .cells()
                .first()
                .and_then(Value::as_str)
                .is_some_and(|s| s.starts_with(prefix.as_str()))
        });
    }

    let table = table.rename(&spec.header_map);
    let table = importer.prepare_table(table)?;
    let table = normalize(table, spec)?;
    importer.prepare_processed_table(table)
}

/// Common normalization shared by every importer: drop rows without a date
/// or amount, then coerce dates, amounts and currency codes.
pub fn normalize(table: Table, spec: &ImporterSpec) -> Result<Table, ImportError> {
    for column in [DATE, PAYEE, AMOUNT, CURRENCY] {
        table.require_column(column)?;
    }
    let mut table = table;
    if table.column_index(MEMO).is_none() {
        table = table.add_field(MEMO, |_| Value::empty());
    }

    let before = table.len();
    let table = table.select(|row| !is_missing(row, DATE) && !is_missing(row, AMOUNT));
    if table.len() < before {
        debug!(dropped = before - table.len(), "dropped rows without date or amount");
    }

    let format = spec.date_format.as_str();
    let mut table = table
        .convert_indexed(DATE, |i, v| parse_date(i, v, format))?
        .convert_indexed(AMOUNT, parse_amount)?
        .convert_indexed(CURRENCY, parse_currency)?;

    if table.column_index(DATE_POSTING).is_some() {
        table = table.convert_indexed(DATE_POSTING, |i, v| {
            if v.is_blank() {
                Ok(v)
            } else {
                parse_date(i, v, format)
            }
        })?;
    }
    if table.column_index(FOREIGN_AMOUNT).is_some() {
        table = table.convert_indexed(FOREIGN_AMOUNT, |i, v| {
            if v.is_blank() { Ok(v) } else { parse_amount(i, v) }
        })?;
    }
    if table.column_index(FOREIGN_CURRENCY).is_some() {
        table = table.convert_indexed(FOREIGN_CURRENCY, |i, v| {
            if v.is_blank() { Ok(v) } else { parse_currency(i, v) }
        })?;
    }
    Ok(table)
}

fn is_missing(row: &RowRef<'_>, column: &str) -> bool {
    row.get(column).is_none_or(Value::is_blank)
}

fn parse_date(row: usize, v: Value, format: &str) -> Result<Value, ImportError> {
    match v {
        Value::Date(_) => Ok(v),
        Value::Text(s) => NaiveDate::parse_from_str(&s, format)
            .map(Value::Date)
            .map_err(|_| ImportError::InvalidDate {
                row,
                value: s,
                format: format.to_string(),
            }),
        Value::Number(_) => Err(ImportError::InvalidDate {
            row,
            value: v.to_string(),
            format: format.to_string(),
        }),
    }
}

fn parse_amount(row: usize, v: Value) -> Result<Value, ImportError> {
    match v.to_decimal() {
        Some(d) => Ok(Value::Number(d)),
        None => Err(ImportError::InvalidAmount {
            row,
            value: v.to_string(),
        }),
    }
}

fn parse_currency(row: usize, v: Value) -> Result<Value, ImportError> {
    let code = v.to_string().trim().to_ascii_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(Value::Text(code))
    } else {
        Err(ImportError::InvalidCurrency {
            row,
            value: v.to_string(),
        })
    }
}

/// Turn a processed table into transactions, dropping the ones the importer skips.
pub fn build_transactions(
    importer: &dyn Importer,
    table: &Table,
) -> Result<Vec<Transaction>, ImportError> {
    let mut out = Vec::with_capacity(table.len());
    for row in table.rows() {
        let txn = Transaction {
            date: date_cell(&row, DATE)?.ok_or_else(|| missing(DATE))?,
            date_posting: date_cell(&row, DATE_POSTING)?,
            payee: row.text(PAYEE).to_string(),
            amount: decimal_cell(&row, AMOUNT)?.ok_or_else(|| missing(AMOUNT))?,
            currency: row.text(CURRENCY).to_string(),
            memo: row.text(MEMO).to_string(),
            foreign_amount: decimal_cell(&row, FOREIGN_AMOUNT)?,
            foreign_currency: Some(row.text(FOREIGN_CURRENCY))
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        };

        if importer.skip_transaction(&txn) {
            debug!(payee = %txn.payee, date = %txn.date, "skipping transaction");
            continue;
        }
        out.push(txn);
    }
    Ok(out)
}

fn missing(column: &str) -> ImportError {
    ImportError::MissingColumn(column.to_string())
}

fn date_cell(row: &RowRef<'_>, column: &str) -> Result<Option<NaiveDate>, ImportError> {
    match row.get(column) {
        None => Ok(None),
        Some(v) if v.is_blank() => Ok(None),
        Some(Value::Date(d)) => Ok(Some(*d)),
        Some(other) => Err(ImportError::UnexpectedValue {
            column: column.to_string(),
            value: other.to_string(),
        }),
    }
}

fn decimal_cell(row: &RowRef<'_>, column: &str) -> Result<Option<Decimal>, ImportError> {
    match row.get(column) {
        None => Ok(None),
        Some(v) if v.is_blank() => Ok(None),
        Some(Value::Number(d)) => Ok(Some(*d)),
        Some(other) => Err(ImportError::UnexpectedValue {
            column: column.to_string(),
            value: other.to_string(),
        }),
    }
}

/// Latest `date` among emitted transactions; skipped rows do not count.
pub fn max_transaction_date(transactions: &[Transaction]) -> Option<NaiveDate> {
    transactions.iter().map(|t| t.date).max()
}

/// [`StatementReader`] backed by the cached file and the parsed table.
pub struct FileReader<'a> {
    importer: &'a dyn Importer,
    file: &'a StatementFile,
    max_date: Option<NaiveDate>,
}

impl<'a> FileReader<'a> {
    pub fn new(
        importer: &'a dyn Importer,
        file: &'a StatementFile,
        max_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            importer,
            file,
            max_date,
        }
    }
}

impl StatementReader for FileReader<'_> {
    fn max_transaction_date(&self) -> Option<NaiveDate> {
        self.max_date
    }

    fn balance_assertion_date(&self) -> Option<NaiveDate> {
        self.max_date
            .and_then(|d| self.importer.spec().balance_date.apply(d))
    }

    fn row_by_label(&self, label: &str) -> Result<Option<Vec<Value>>, ImportError> {
        let raw = self.importer.prepare_raw_file(self.file.raw_table()?);
        Ok(raw.find_labeled_row(label).map(<[Value]>::to_vec))
    }
}
