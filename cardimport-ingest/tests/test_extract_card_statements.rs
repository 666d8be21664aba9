use cardimport_core::{Importer, ImporterConfig, StatementFile};
use cardimport_ingest::{
    ImporterKind, ScbCard, UobCard, default_importers, extract, find_importer, read_table,
};
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::path::PathBuf;

fn fixture(name: &str) -> StatementFile {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    StatementFile::open(path).expect("fixture should exist")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_scb_statement_end_to_end() {
    let file = fixture("CardTransactions202401.csv");
    let importer = ScbCard::new(&ImporterConfig::default()).unwrap();
    let statement = extract(&importer, &file).unwrap();

    assert_eq!(statement.importer, "SCB Card CSV");
    // The [UNPOSTED] row is parsed but not emitted.
    assert_eq!(statement.transactions.len(), 3);
    assert!(statement.transactions.iter().all(|t| !t.payee.contains("[UNPOSTED]")));

    let grab = &statement.transactions[0];
    assert_eq!(grab.date, date(2024, 1, 3));
    assert_eq!(grab.payee, "GRAB*FOOD SINGAPORE SG");
    assert_eq!(grab.amount, dec!(-23.50));
    assert_eq!(grab.currency, "SGD");
    assert_eq!(grab.memo, "");
    assert_eq!(grab.foreign_amount, None);

    let payment = &statement.transactions[2];
    assert_eq!(payment.amount, dec!(500.00));

    // Dated the day after the latest emitted transaction; the unposted row is ignored.
    let balance = statement.balance.expect("balance assertion");
    assert_eq!(balance.date, date(2024, 1, 11));
    assert_eq!(balance.amount, dec!(-1234.56));
    assert_eq!(balance.currency, "SGD");
}

#[test]
fn test_scb_foreign_amounts() {
    let file = fixture("CardTransactions202401.csv");
    let importer = ScbCard::new(&ImporterConfig {
        convert_currencies: true,
        ..Default::default()
    })
    .unwrap();
    let statement = extract(&importer, &file).unwrap();

    let amazon = statement
        .transactions
        .iter()
        .find(|t| t.payee == "AMAZON US")
        .unwrap();
    assert_eq!(amazon.amount, dec!(-17.62));
    assert_eq!(amazon.foreign_amount, Some(dec!(12.99)));
    assert_eq!(amazon.foreign_currency.as_deref(), Some("USD"));

    let grab = &statement.transactions[0];
    assert_eq!(grab.foreign_amount, None);
    assert_eq!(grab.foreign_currency, None);
}

#[test]
fn test_uob_statement_end_to_end() {
    let file = fixture("CC_TXN_History_202403.csv");
    let importer = UobCard::new(&ImporterConfig::default()).unwrap();
    let statement = extract(&importer, &file).unwrap();

    let txns = &statement.transactions;
    assert_eq!(txns.len(), 3);
    assert_eq!(txns[0].payee, "COFFEE SHOP SINGAPORE");
    assert_eq!(txns[0].date, date(2024, 3, 1));
    assert_eq!(txns[0].date_posting, Some(date(2024, 3, 2)));
    assert_eq!(txns[0].amount, dec!(-5.50));
    assert_eq!(txns[1].date, date(2024, 3, 4));
    assert_eq!(txns[1].payee, "HOTEL TOKYO");
    assert_eq!(txns[1].amount, dec!(-134.80));
    assert_eq!(txns[2].amount, dec!(500.00));
    assert!(txns.iter().all(|t| t.foreign_amount.is_none()));

    let balance = statement.balance.expect("balance assertion");
    assert_eq!(balance.date, date(2024, 3, 11));
    assert_eq!(balance.amount, dec!(-1020.30));
    assert_eq!(balance.currency, "SGD");
}

#[test]
fn test_uob_foreign_columns_and_balance_date_rule() {
    let file = fixture("CC_TXN_History_202403.csv");
    let config: ImporterConfig = serde_json::from_str(
        r#"{"convert_currencies": true, "balance_assertion_date": "last_transaction"}"#,
    )
    .unwrap();
    let statement = extract(&UobCard::new(&config).unwrap(), &file).unwrap();

    let hotel = &statement.transactions[1];
    assert_eq!(hotel.foreign_currency.as_deref(), Some("JPY"));
    assert_eq!(hotel.foreign_amount, Some(dec!(15000)));
    assert_eq!(statement.balance.unwrap().date, date(2024, 3, 10));
}

#[test]
fn test_statements_without_transactions_have_no_balance() {
    let scb = ScbCard::new(&ImporterConfig::default()).unwrap();
    let statement = extract(&scb, &fixture("CardTransactions202402.csv")).unwrap();
    assert!(statement.transactions.is_empty());
    assert_eq!(statement.balance, None);

    let uob = UobCard::new(&ImporterConfig::default()).unwrap();
    let statement = extract(&uob, &fixture("CC_TXN_History_202404.csv")).unwrap();
    assert!(statement.transactions.is_empty());
    assert_eq!(statement.balance, None);
}

#[test]
fn test_unposted_only_statement_has_no_balance() {
    let file = fixture("CardTransactions202403.csv");
    let importer = ScbCard::new(&ImporterConfig::default()).unwrap();

    // The pending row survives normalization but is never emitted.
    assert_eq!(read_table(&importer, &file).unwrap().len(), 1);

    let statement = extract(&importer, &file).unwrap();
    assert!(statement.transactions.is_empty());
    assert_eq!(statement.balance, None);
}

#[test]
fn test_dispatch_picks_matching_importer() {
    let importers = default_importers().unwrap();

    let scb = fixture("CardTransactions202401.csv");
    assert_eq!(find_importer(&importers, &scb).unwrap().name(), "SCB Card CSV");

    let uob = fixture("CC_TXN_History_202403.csv");
    assert_eq!(find_importer(&importers, &uob).unwrap().name(), "UOB Card");

    let scoped = ImporterKind::ScbCard
        .build(&ImporterConfig {
            account_number: "5678".to_string(),
            ..Default::default()
        })
        .unwrap();
    assert!(!scoped.deep_identify(&scb));
}

#[test]
fn test_raw_cleanup_runs_before_table_extraction() {
    let file = fixture("CardTransactions202401.csv");
    let importer = ScbCard::new(&ImporterConfig::default()).unwrap();
    let table = read_table(&importer, &file).unwrap();

    // Four rows survive the footer cut and comment skip; skipping happens later.
    assert_eq!(table.len(), 4);
    assert_eq!(
        table.header(),
        ["date", "payee", "amount", "currency", "memo"]
    );
}
