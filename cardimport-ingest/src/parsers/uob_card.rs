//! United Overseas Bank credit card transaction history.
//!
//! The export carries separate foreign and local columns:
//!   Transaction Date,Posting Date,Description,Foreign Currency Type,
//!   Transaction Amount(Foreign),Local Currency Type,Transaction Amount(Local)
//!   04 Mar 2024,05 Mar 2024,HOTEL TOKYO,JPY,"15,000",SGD,134.80
//!
//! Amounts are positive for spend, the opposite of the ledger convention, and
//! the header block holds `Statement Balance:,1020.30,SGD`.

use cardimport_core::fields::{
    AMOUNT, CURRENCY, DATE, DATE_POSTING, FOREIGN_AMOUNT, FOREIGN_CURRENCY, MEMO, PAYEE,
};
use cardimport_core::{
    BalanceAssertion, ImportError, Importer, ImporterConfig, ImporterSpec, StatementReader, Table,
    Value,
};
use tracing::debug;

use super::clean_raw_table;

const BALANCE_LABEL: &str = "Statement Balance:";

pub struct UobCard {
    spec: ImporterSpec,
}

impl UobCard {
    pub fn new(config: &ImporterConfig) -> Result<Self, ImportError> {
        let mut spec = ImporterSpec::new(
            "UOB Card",
            "^CC_TXN_History[0-9]*",
            "United Overseas Bank Limited.*Account Type:VISA SIGNATURE",
            config,
        )?
        .with_column_labels(concat!(
            "Transaction Date,Posting Date,Description,Foreign Currency Type,",
            "Transaction Amount(Foreign),Local Currency Type,Transaction Amount(Local)"
        ))
        .with_date_format("%d %b %Y")
        .map_column("Transaction Date", DATE)
        .map_column("Posting Date", DATE_POSTING)
        .map_column("Description", PAYEE)
        .map_column("Local Currency Type", CURRENCY)
        .map_column("Transaction Amount(Local)", AMOUNT);

        // Unmapped foreign columns keep their source names and never reach a transaction.
        if config.convert_currencies {
            spec = spec
                .map_column("Foreign Currency Type", FOREIGN_CURRENCY)
                .map_column("Transaction Amount(Foreign)", FOREIGN_AMOUNT);
        }

        Ok(Self { spec })
    }
}

impl Importer for UobCard {
    fn spec(&self) -> &ImporterSpec {
        &self.spec
    }

    fn prepare_raw_file(&self, table: Table) -> Table {
        clean_raw_table(table)
    }

    fn prepare_table(&self, table: Table) -> Result<Table, ImportError> {
        let table = table
            .convert(PAYEE, |v| {
                Ok(match v {
                    Value::Text(s) => Value::Text(s.replace('\n', " ")),
                    other => other,
                })
            })?
            .add_field(MEMO, |_| Value::empty());

        // Footer and summary rows have no transaction date.
        Ok(table.select(|row| !row.get(DATE).is_some_and(Value::is_blank)))
    }

    fn prepare_processed_table(&self, table: Table) -> Result<Table, ImportError> {
        table.convert(AMOUNT, |v| match v {
            Value::Number(d) => Ok(Value::Number(-d)),
            other => Err(ImportError::UnexpectedValue {
                column: AMOUNT.to_string(),
                value: other.to_string(),
            }),
        })
    }

    fn get_balance_statement(
        &self,
        reader: &dyn StatementReader,
    ) -> Result<Option<BalanceAssertion>, ImportError> {
        let Some(date) = reader.balance_assertion_date() else {
            return Ok(None);
        };
        let Some(row) = reader.row_by_label(BALANCE_LABEL)? else {
            debug!(label = BALANCE_LABEL, "no balance row in statement");
            return Ok(None);
        };

        let malformed = || ImportError::malformed(BALANCE_LABEL, format!("{row:?}"));
        let units = row.get(1).and_then(Value::to_decimal).ok_or_else(malformed)?;
        let currency = row.get(2).and_then(Value::as_str).ok_or_else(malformed)?;

        Ok(Some(BalanceAssertion {
            date,
            amount: -units,
            currency: currency.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardimport_core::StatementFile;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn importer(convert_currencies: bool) -> UobCard {
        UobCard::new(&ImporterConfig {
            convert_currencies,
            ..Default::default()
        })
        .unwrap()
    }

    struct FakeReader {
        date: Option<NaiveDate>,
        balance_row: Option<Vec<Value>>,
    }

    impl StatementReader for FakeReader {
        fn max_transaction_date(&self) -> Option<NaiveDate> {
            self.date.and_then(|d| d.pred_opt())
        }

        fn balance_assertion_date(&self) -> Option<NaiveDate> {
            self.date
        }

        fn row_by_label(&self, label: &str) -> Result<Option<Vec<Value>>, ImportError> {
            assert_eq!(label, BALANCE_LABEL);
            Ok(self.balance_row.clone())
        }
    }

    #[test]
    fn test_prepare_raw_file_trims_cells_and_drops_blank_rows() {
        let table = Table::from_rows(
            vec!["United Overseas Bank Limited".into(), "".into()],
            vec![
                vec![Value::text("04 Mar 2024 "), Value::text("\tHOTEL TOKYO ")],
                vec![Value::empty(), Value::text(" \t")],
                vec![Value::empty(), Value::text("Total")],
            ],
        );
        let table = importer(false).prepare_raw_file(table);
        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].cells(),
            [Value::text("04 Mar 2024"), Value::text("HOTEL TOKYO")]
        );
        assert_eq!(rows[1].cells(), [Value::empty(), Value::text("Total")]);
    }

    #[test]
    fn test_prepare_table_joins_description_lines() {
        let table = Table::from_rows(
            vec![DATE.into(), PAYEE.into()],
            vec![
                vec!["01 Mar 2024".into(), "Coffee\nShop".into()],
                vec!["".into(), "Total".into()],
            ],
        );
        let table = importer(false).prepare_table(table).unwrap();
        assert_eq!(table.len(), 1);

        let row = table.rows().next().unwrap();
        assert_eq!(row.text(PAYEE), "Coffee Shop");
        assert_eq!(row.text(MEMO), "");
    }

    #[test]
    fn test_processed_amount_sign_is_flipped() {
        let table = Table::from_rows(
            vec![AMOUNT.into()],
            vec![
                vec![Value::Number(dec!(50.00))],
                vec![Value::Number(dec!(-50.00))],
            ],
        );
        let table = importer(false).prepare_processed_table(table).unwrap();
        let amounts: Vec<_> = table.rows().map(|r| r.get(AMOUNT).unwrap().to_string()).collect();
        assert_eq!(amounts, ["-50.00", "50.00"]);
    }

    #[test]
    fn test_processed_amount_must_be_numeric() {
        let table = Table::from_rows(vec![AMOUNT.into()], vec![vec!["50.00".into()]]);
        assert!(matches!(
            importer(false).prepare_processed_table(table),
            Err(ImportError::UnexpectedValue { .. })
        ));
    }

    #[test]
    fn test_foreign_columns_follow_config() {
        let mapped = |imp: &UobCard| -> Vec<String> {
            imp.spec().header_map.iter().map(|(_, to)| to.clone()).collect()
        };
        assert!(!mapped(&importer(false)).contains(&FOREIGN_AMOUNT.to_string()));
        let with_fx = mapped(&importer(true));
        assert!(with_fx.contains(&FOREIGN_AMOUNT.to_string()));
        assert!(with_fx.contains(&FOREIGN_CURRENCY.to_string()));
    }

    #[test]
    fn test_balance_statement_is_negated() {
        let reader = FakeReader {
            date: NaiveDate::from_ymd_opt(2024, 3, 11),
            balance_row: Some(vec!["Statement Balance:".into(), "1,020.30".into(), "SGD".into()]),
        };
        let balance = importer(false).get_balance_statement(&reader).unwrap().unwrap();
        assert_eq!(balance.date, NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        assert_eq!(balance.amount, dec!(-1020.30));
        assert_eq!(balance.currency, "SGD");

        let numeric = FakeReader {
            date: NaiveDate::from_ymd_opt(2024, 3, 11),
            balance_row: Some(vec![
                "Statement Balance:".into(),
                Value::Number(dec!(-12.5)),
                "SGD".into(),
            ]),
        };
        let balance = importer(false).get_balance_statement(&numeric).unwrap().unwrap();
        assert_eq!(balance.amount, dec!(12.5));
    }

    #[test]
    fn test_no_balance_without_transactions() {
        let reader = FakeReader {
            date: None,
            balance_row: Some(vec!["Statement Balance:".into(), "1.00".into(), "SGD".into()]),
        };
        assert_eq!(importer(false).get_balance_statement(&reader).unwrap(), None);
    }

    #[test]
    fn test_deep_identify() {
        let head = "United Overseas Bank Limited,,Account Type:VISA SIGNATURE,,,,\n\
                    Account Number:,4265-XXXX-XXXX-5678,,,,,\n";
        let file = StatementFile::from_contents("CC_TXN_History_2024.csv", head);
        assert!(importer(false).identify(&file));

        let configured = UobCard::new(&ImporterConfig {
            account_number: "0000".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert!(!configured.deep_identify(&file));

        let renamed = StatementFile::from_contents("statement.csv", head);
        assert!(!importer(false).identify(&renamed));
    }
}
