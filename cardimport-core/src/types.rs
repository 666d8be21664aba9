use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Normalized output of statement importers (bank-agnostic)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub date_posting: Option<NaiveDate>,
    pub payee: String,
    /// Negative means debit/outflow; positive means credit/refund.
    pub amount: Decimal,
    pub currency: String,
    pub memo: String,
    pub foreign_amount: Option<Decimal>,
    pub foreign_currency: Option<String>,
}

/// Statement-derived account balance as of `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceAssertion {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub currency: String,
}

/// Everything one importer produced for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub importer: String,
    pub transactions: Vec<Transaction>,
    pub balance: Option<BalanceAssertion>,
}

/// Canonical column names of a normalized table.
pub mod fields {
    pub const DATE: &str = "date";
    pub const DATE_POSTING: &str = "date_posting";
    pub const PAYEE: &str = "payee";
    pub const AMOUNT: &str = "amount";
    pub const CURRENCY: &str = "currency";
    pub const MEMO: &str = "memo";
    pub const FOREIGN_AMOUNT: &str = "foreign_amount";
    pub const FOREIGN_CURRENCY: &str = "foreign_currency";
}
