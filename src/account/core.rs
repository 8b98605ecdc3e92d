use rusqlite::{Connection, Row, params};

use crate::{Error, user::UserID};

pub type AccountId = i64;

/// A bank account, credit card or wallet that transactions draw from or pay
/// into.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The user that owns the account, or [None] for shared accounts.
    pub user_id: Option<UserID>,
    /// The name of the account.
    pub name: String,
    /// A free-form label such as "Checking" or "Savings".
    pub account_type: String,
    /// The running balance. Equal to the sum of the signed amounts of every
    /// transaction ever applied to the account.
    pub balance: f64,
    /// The currency code for the balance.
    pub currency: String,
    /// Whether the account is still in use.
    pub is_active: bool,
}

/// The data needed to create an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// The user that owns the account, or [None] for shared accounts.
    pub user_id: Option<UserID>,
    /// The name of the account.
    pub name: String,
    /// A free-form label such as "Checking" or "Savings".
    pub account_type: String,
    /// The opening balance.
    pub balance: f64,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER,
            name TEXT NOT NULL,
            account_type TEXT NOT NULL,
            balance REAL NOT NULL,
            currency TEXT NOT NULL DEFAULT 'USD',
            is_active INTEGER NOT NULL DEFAULT 1,
            FOREIGN KEY(user_id) REFERENCES user(id)
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let raw_user_id: Option<i64> = row.get(1)?;

    Ok(Account {
        id: row.get(0)?,
        user_id: raw_user_id.map(UserID::new),
        name: row.get(2)?,
        account_type: row.get(3)?,
        balance: row.get(4)?,
        currency: row.get(5)?,
        is_active: row.get(6)?,
    })
}

const ACCOUNT_COLUMNS: &str = "id, user_id, name, account_type, balance, currency, is_active";

/// Create a new account in the database.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn create_account(new_account: NewAccount, connection: &Connection) -> Result<Account, Error> {
    let account = connection
        .prepare(&format!(
            "INSERT INTO account (user_id, name, account_type, balance)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING {ACCOUNT_COLUMNS}"
        ))?
        .query_one(
            params![
                new_account.user_id.map(|id| id.as_i64()),
                new_account.name,
                new_account.account_type,
                new_account.balance,
            ],
            map_row_to_account,
        )?;

    Ok(account)
}

/// Retrieve the account with `id` owned by `user_id`.
///
/// # Errors
/// Returns an [Error::NotFound] if the account does not exist or belongs to
/// another user, or an [Error::SqlError] if there is some other SQL error.
pub fn get_account(
    id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Account, Error> {
    let account = connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE id = :id AND user_id = :user_id"
        ))?
        .query_one(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_row_to_account,
        )?;

    Ok(account)
}

/// Retrieve the accounts owned by `user_id`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_accounts_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE user_id = :user_id"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

/// Retrieve the accounts a user may attach transactions to: their own
/// accounts plus the shared accounts that have no owner.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_selectable_accounts(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account
             WHERE user_id = :user_id OR user_id IS NULL"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

/// Get the total balance across all of a user's accounts.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_total_account_balance(user_id: UserID, connection: &Connection) -> Result<f64, Error> {
    let total = connection
        .prepare("SELECT COALESCE(SUM(balance), 0) FROM account WHERE user_id = :user_id")?
        .query_one(&[(":user_id", &user_id.as_i64())], |row| row.get(0))?;

    Ok(total)
}

/// Add `delta` to the balance of the account with `account_id`.
///
/// The adjustment happens in a single UPDATE statement so concurrent
/// requests never race on a read-then-write of the balance.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn adjust_account_balance(
    account_id: AccountId,
    delta: f64,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "UPDATE account SET balance = balance + ?1 WHERE id = ?2",
        params![delta, account_id],
    )?;

    Ok(())
}

/// The number of transactions attached to the account with `account_id`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn count_transactions_for_account(
    account_id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<u32, Error> {
    connection
        .prepare(
            "SELECT COUNT(id) FROM \"transaction\"
             WHERE account_id = :account_id AND user_id = :user_id",
        )?
        .query_one(
            &[(":account_id", &account_id), (":user_id", &user_id.as_i64())],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

#[cfg(test)]
mod create_table_tests {
    use rusqlite::Connection;

    use super::create_account_table;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), create_account_table(&connection));
    }
}
