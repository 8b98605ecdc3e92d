//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    account::AccountId,
    category::CategoryId,
    database_id::TransactionId,
    ledger::LedgerEntry,
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction brings money in or takes money out.
///
/// The stored `amount` of a transaction is always positive; the kind decides
/// the sign of its effect on an account balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("{other} is not a valid transaction kind")),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub user_id: UserID,
    /// The category the transaction is filed under.
    pub category_id: Option<CategoryId>,
    /// The account the transaction was applied to, if any.
    pub account_id: Option<AccountId>,
    /// The amount of money spent or earned. Always positive; the sign of the
    /// effect on the account balance comes from `kind`.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The path of the uploaded receipt, if one was attached.
    pub receipt_url: Option<String>,
    /// Whether the transaction was expanded from a recurring transaction
    /// rather than entered by hand.
    pub is_recurring_generated: bool,
}

impl Transaction {
    /// The fields of the transaction that decide its effect on an account
    /// balance.
    pub fn ledger_entry(&self) -> LedgerEntry {
        LedgerEntry {
            account_id: self.account_id,
            kind: self.kind,
            amount: self.amount,
        }
    }
}

/// The data needed to record a new transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// The user recording the transaction.
    pub user_id: UserID,
    /// The category the transaction is filed under.
    pub category_id: Option<CategoryId>,
    /// The account the transaction applies to, if any.
    pub account_id: Option<AccountId>,
    /// The amount of money spent or earned. Always positive.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The path of the uploaded receipt, if one was attached.
    pub receipt_url: Option<String>,
    /// Whether the transaction was expanded from a recurring transaction.
    pub is_recurring_generated: bool,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

pub(crate) const TRANSACTION_COLUMNS: &str = "id, user_id, category_id, account_id, amount, \
     kind, date, description, receipt_url, is_recurring_generated";

/// Create a new transaction in the database.
///
/// This only inserts the row; applying the transaction's effect to an
/// account balance is the caller's job (see [crate::ledger]).
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
             (user_id, category_id, account_id, amount, kind, date, description, receipt_url, is_recurring_generated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            params![
                new_transaction.user_id.as_i64(),
                new_transaction.category_id,
                new_transaction.account_id,
                new_transaction.amount,
                new_transaction.kind,
                new_transaction.date,
                new_transaction.description,
                new_transaction.receipt_url,
                new_transaction.is_recurring_generated,
            ],
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(new_transaction.category_id),
            error => error.into(),
        })?;

    Ok(transaction)
}

/// Retrieve a transaction by its `id`, scoped to its owner.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE id = :id AND user_id = :user_id"
        ))?
        .query_one(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Get the number of transactions recorded by `user_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(user_id: UserID, connection: &Connection) -> Result<u32, Error> {
    connection
        .prepare("SELECT COUNT(id) FROM \"transaction\" WHERE user_id = :user_id")?
        .query_one(&[(":user_id", &user_id.as_i64())], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                category_id INTEGER,
                account_id INTEGER,
                amount REAL NOT NULL,
                kind TEXT NOT NULL,
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                receipt_url TEXT,
                is_recurring_generated INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY(user_id) REFERENCES user(id),
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL,
                FOREIGN KEY(account_id) REFERENCES account(id)
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    // Composite index used by the budget evaluator and the dashboard page.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_category_date
         ON \"transaction\"(user_id, category_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_user_id: i64 = row.get(1)?;

    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(raw_user_id),
        category_id: row.get(2)?,
        account_id: row.get(3)?,
        amount: row.get(4)?,
        kind: row.get(5)?,
        date: row.get(6)?,
        description: row.get(7)?,
        receipt_url: row.get(8)?,
        is_recurring_generated: row.get(9)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod test_utils {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        PasswordHash,
        db::initialize,
        user::{NewUser, UserID, create_user},
    };

    /// An in-memory database with one registered user.
    pub(crate) fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let user = create_user(
            NewUser {
                full_name: "Test User".to_owned(),
                email: "test@example.com".to_owned(),
                password_hash: PasswordHash::new_unchecked("hunter2"),
                recovery_hint: "test hint".to_owned(),
                created_at: date!(2023 - 01 - 01),
            },
            &conn,
        )
        .unwrap();

        (conn, user.id)
    }
}

#[cfg(test)]
mod database_tests {
    use time::macros::date;

    use crate::{
        Error,
        transaction::{
            NewTransaction, TransactionKind, count_transactions, create_transaction,
            get_transaction,
        },
        user::UserID,
    };

    use super::test_utils::get_test_connection;

    fn new_transaction(user_id: UserID, amount: f64, kind: TransactionKind) -> NewTransaction {
        NewTransaction {
            user_id,
            category_id: None,
            account_id: None,
            amount,
            kind,
            date: date!(2023 - 01 - 01),
            description: "test transaction".to_owned(),
            receipt_url: None,
            is_recurring_generated: false,
        }
    }

    #[test]
    fn create_succeeds() {
        let (conn, user_id) = get_test_connection();
        let amount = 12.3;

        let result = create_transaction(
            new_transaction(user_id, amount, TransactionKind::Expense),
            &conn,
        );

        match result {
            Ok(transaction) => {
                assert_eq!(transaction.amount, amount);
                assert_eq!(transaction.kind, TransactionKind::Expense);
                assert!(!transaction.is_recurring_generated);
            }
            Err(error) => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn create_fails_on_invalid_category_id() {
        let (conn, user_id) = get_test_connection();
        let mut transaction = new_transaction(user_id, 12.3, TransactionKind::Expense);
        transaction.category_id = Some(42);

        let result = create_transaction(transaction, &conn);

        assert_eq!(result, Err(Error::InvalidCategory(Some(42))));
    }

    #[test]
    fn get_transaction_scopes_by_user() {
        let (conn, user_id) = get_test_connection();
        let transaction =
            create_transaction(new_transaction(user_id, 12.3, TransactionKind::Income), &conn)
                .unwrap();

        let other_user = UserID::new(user_id.as_i64() + 1);

        assert_eq!(
            get_transaction(transaction.id, user_id, &conn),
            Ok(transaction)
        );
        assert_eq!(
            get_transaction(1, other_user, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn get_count() {
        let (conn, user_id) = get_test_connection();
        let want_count = 20;
        for i in 1..=want_count {
            create_transaction(
                new_transaction(user_id, i as f64, TransactionKind::Income),
                &conn,
            )
            .expect("Could not create transaction");
        }

        let got_count = count_transactions(user_id, &conn).expect("Could not get count");

        assert_eq!(want_count, got_count);
    }
}
