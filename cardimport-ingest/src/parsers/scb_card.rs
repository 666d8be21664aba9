//! Standard Chartered credit card CSV export.
//!
//! Expected layout after the card banner lines:
//!   Date,DESCRIPTION,Foreign Currency Amount,SGD Amount
//!   05/01/2024,AMAZON US,USD 12.99,SGD 17.62 DR
//!   10/01/2024,PAYMENT - THANK YOU,,SGD 500.00 CR
//! followed by a six-line summary footer that includes
//!   Current Balance,SGD,1234.56 DR

use cardimport_core::fields::{
    AMOUNT, CURRENCY, DATE, FOREIGN_AMOUNT, FOREIGN_CURRENCY, MEMO, PAYEE,
};
use cardimport_core::{
    BalanceAssertion, ImportError, Importer, ImporterConfig, ImporterSpec, StatementReader, Table,
    Transaction, Value, parse_decimal,
};
use rust_decimal::Decimal;
use tracing::debug;

use super::clean_raw_table;

const FOREIGN_CURRENCY_AMOUNT: &str = "Foreign Currency Amount";
const SGD_AMOUNT: &str = "SGD Amount";
const BALANCE_LABEL: &str = "Current Balance";
const UNPOSTED: &str = "[UNPOSTED]";

pub struct ScbCard {
    spec: ImporterSpec,
    convert_currencies: bool,
}

impl ScbCard {
    pub fn new(config: &ImporterConfig) -> Result<Self, ImportError> {
        let spec = ImporterSpec::new(
            "SCB Card CSV",
            "CardTransactions[0-9]*",
            "PRIORITY BANKING VISA INFINITE CARD",
            config,
        )?
        .with_column_labels("Date,DESCRIPTION,Foreign Currency Amount,SGD Amount")
        .with_date_format("%d/%m/%Y")
        .with_skip_tail_rows(6)
        .with_skip_comments("# ")
        .map_column("Date", DATE)
        .map_column("DESCRIPTION", PAYEE);

        Ok(Self {
            spec,
            convert_currencies: config.convert_currencies,
        })
    }
}

/// "USD 12.99" -> ("USD", "12.99"); anything shorter -> ("", "").
fn split_foreign_amount(s: &str) -> (&str, &str) {
    let mut parts = s.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(currency), Some(amount)) => (currency, amount),
        _ => ("", ""),
    }
}

/// "SGD 17.62 DR" -> ("-17.62", "SGD"). Fewer than three tokens yields empty
/// fields, which normalization later drops; more than three is malformed.
fn parse_sgd_amount(s: &str) -> Result<(String, String), ImportError> {
    let parts: Vec<&str> = s.split_whitespace().collect();
    match parts.as_slice() {
        [currency, amount, drcr] => {
            let amount = if *drcr == "DR" {
                format!("-{amount}")
            } else {
                amount.to_string()
            };
            Ok((amount, currency.to_string()))
        }
        short if short.len() < 3 => Ok((String::new(), String::new())),
        _ => Err(ImportError::malformed(SGD_AMOUNT, s)),
    }
}

/// "1,234.56 DR" -> -1234.56. Only an explicit CR is a credit balance.
// Transaction rows negate only on DR, so the two rules disagree on any other suffix.
fn parse_balance_amount(s: &str) -> Result<Decimal, ImportError> {
    let parts: Vec<&str> = s.split_whitespace().collect();
    let [units, drcr] = parts.as_slice() else {
        return Err(ImportError::malformed(BALANCE_LABEL, s));
    };
    let units = parse_decimal(units).ok_or_else(|| ImportError::malformed(BALANCE_LABEL, s))?;
    Ok(if *drcr != "CR" { -units } else { units })
}

impl Importer for ScbCard {
    fn spec(&self) -> &ImporterSpec {
        &self.spec
    }

    fn skip_transaction(&self, txn: &Transaction) -> bool {
        txn.payee.contains(UNPOSTED)
    }

    fn prepare_raw_file(&self, table: Table) -> Table {
        clean_raw_table(table)
    }

    fn prepare_table(&self, table: Table) -> Result<Table, ImportError> {
        let mut table = table;
        if self.convert_currencies {
            table = table
                .try_add_field(FOREIGN_AMOUNT, |row| {
                    let (_, amount) = split_foreign_amount(row.text(FOREIGN_CURRENCY_AMOUNT));
                    if amount.is_empty() {
                        return Ok(Value::empty());
                    }
                    parse_decimal(amount)
                        .map(Value::Number)
                        .ok_or_else(|| ImportError::malformed(FOREIGN_CURRENCY_AMOUNT, amount))
                })?
                .add_field(FOREIGN_CURRENCY, |row| {
                    Value::text(split_foreign_amount(row.text(FOREIGN_CURRENCY_AMOUNT)).0)
                });
        }

        let table = table
            .cut_out(FOREIGN_CURRENCY_AMOUNT)?
            .try_add_field(AMOUNT, |row| {
                parse_sgd_amount(row.text(SGD_AMOUNT)).map(|(amount, _)| Value::Text(amount))
            })?
            .try_add_field(CURRENCY, |row| {
                parse_sgd_amount(row.text(SGD_AMOUNT)).map(|(_, currency)| Value::Text(currency))
            })?
            .cut_out(SGD_AMOUNT)?;

        Ok(table.add_field(MEMO, |_| Value::empty()))
    }

    fn get_balance_statement(
        &self,
        reader: &dyn StatementReader,
    ) -> Result<Option<BalanceAssertion>, ImportError> {
        let Some(date) = reader.max_transaction_date().and_then(|d| d.succ_opt()) else {
            return Ok(None);
        };
        let Some(row) = reader.row_by_label(BALANCE_LABEL)? else {
            debug!(label = BALANCE_LABEL, "no balance row in statement");
            return Ok(None);
        };

        let cell = |i: usize| {
            row.get(i)
                .and_then(Value::as_str)
                .ok_or_else(|| ImportError::malformed(BALANCE_LABEL, format!("{row:?}")))
        };
        let currency = cell(1)?;
        let amount = cell(2)?;
        Ok(Some(BalanceAssertion {
            date,
            amount: parse_balance_amount(amount)?,
            currency: currency.to_string(),
        }))
    }
}
