//! Defines the core data models and database queries for recurring
//! transactions.

use rusqlite::{Connection, Row, params};
use time::Date;

use crate::{
    Error,
    account::AccountId,
    category::CategoryId,
    recurring::Frequency,
    transaction::TransactionKind,
    user::UserID,
};

pub type RecurringId = i64;

/// A template that periodically spawns concrete transactions, e.g. wages or
/// a phone bill.
///
/// Once deactivated a template stays inactive; there is no reactivation
/// path, the user creates a new template instead.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringTransaction {
    /// The ID of the template.
    pub id: RecurringId,
    /// The user the template belongs to.
    pub user_id: UserID,
    /// The category generated transactions are filed under.
    pub category_id: CategoryId,
    /// The account generated transactions reference, if any.
    pub account_id: Option<AccountId>,
    /// The amount of each generated transaction. Always positive.
    pub amount: f64,
    /// Whether generated transactions are income or expenses.
    pub kind: TransactionKind,
    /// How often a new transaction is due.
    pub frequency: Frequency,
    /// The date the schedule starts from.
    pub start_date: Date,
    /// The date after which no more transactions are generated, if set.
    pub end_date: Option<Date>,
    /// The description copied onto generated transactions.
    pub description: String,
    /// The date the template last generated a transaction.
    pub last_generated_date: Option<Date>,
    /// Whether the template still generates transactions.
    pub is_active: bool,
}

/// The data needed to create a recurring transaction.
///
/// New templates start active and with no generated instances.
#[derive(Debug, Clone)]
pub struct NewRecurringTransaction {
    /// The user the template belongs to.
    pub user_id: UserID,
    /// The category generated transactions are filed under.
    pub category_id: CategoryId,
    /// The account generated transactions reference, if any.
    pub account_id: Option<AccountId>,
    /// The amount of each generated transaction. Always positive.
    pub amount: f64,
    /// Whether generated transactions are income or expenses.
    pub kind: TransactionKind,
    /// How often a new transaction is due.
    pub frequency: Frequency,
    /// The date the schedule starts from.
    pub start_date: Date,
    /// The date after which no more transactions are generated, if set.
    pub end_date: Option<Date>,
    /// The description copied onto generated transactions.
    pub description: String,
}

/// A recurring transaction joined with the display names of its category
/// and account.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringListItem {
    /// The template itself.
    pub recurring: RecurringTransaction,
    /// The name of the category generated transactions are filed under.
    pub category_name: Option<String>,
    /// The name of the account generated transactions reference.
    pub account_name: Option<String>,
}

/// Create the recurring transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_recurring_transaction_table(
    connection: &Connection,
) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS recurring_transaction (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                category_id INTEGER NOT NULL,
                account_id INTEGER,
                amount REAL NOT NULL,
                kind TEXT NOT NULL,
                frequency TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT,
                description TEXT NOT NULL,
                last_generated_date TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                FOREIGN KEY(user_id) REFERENCES user(id),
                FOREIGN KEY(category_id) REFERENCES category(id),
                FOREIGN KEY(account_id) REFERENCES account(id)
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [RecurringTransaction].
pub fn map_recurring_row(row: &Row) -> Result<RecurringTransaction, rusqlite::Error> {
    let raw_user_id: i64 = row.get(1)?;

    Ok(RecurringTransaction {
        id: row.get(0)?,
        user_id: UserID::new(raw_user_id),
        category_id: row.get(2)?,
        account_id: row.get(3)?,
        amount: row.get(4)?,
        kind: row.get(5)?,
        frequency: row.get(6)?,
        start_date: row.get(7)?,
        end_date: row.get(8)?,
        description: row.get(9)?,
        last_generated_date: row.get(10)?,
        is_active: row.get(11)?,
    })
}

const RECURRING_COLUMNS: &str = "id, user_id, category_id, account_id, amount, kind, frequency, \
     start_date, end_date, description, last_generated_date, is_active";

/// Create a new recurring transaction in the database.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn create_recurring_transaction(
    new_recurring: NewRecurringTransaction,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    let recurring = connection
        .prepare(&format!(
            "INSERT INTO recurring_transaction
             (user_id, category_id, account_id, amount, kind, frequency,
              start_date, end_date, description, last_generated_date, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL, 1)
             RETURNING {RECURRING_COLUMNS}"
        ))?
        .query_one(
            params![
                new_recurring.user_id.as_i64(),
                new_recurring.category_id,
                new_recurring.account_id,
                new_recurring.amount,
                new_recurring.kind,
                new_recurring.frequency,
                new_recurring.start_date,
                new_recurring.end_date,
                new_recurring.description,
            ],
            map_recurring_row,
        )?;

    Ok(recurring)
}

/// Retrieve the recurring transaction with `id` owned by `user_id`.
///
/// # Errors
/// Returns an [Error::NotFound] if the template does not exist or belongs
/// to another user, or an [Error::SqlError] if there is some other SQL error.
pub fn get_recurring_transaction(
    id: RecurringId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    let recurring = connection
        .prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_transaction
             WHERE id = :id AND user_id = :user_id"
        ))?
        .query_one(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_recurring_row,
        )?;

    Ok(recurring)
}

/// Retrieve the recurring transactions owned by `user_id` with category and
/// account names, newest start date first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn list_recurring_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<RecurringListItem>, Error> {
    connection
        .prepare(
            "SELECT rt.id, rt.user_id, rt.category_id, rt.account_id, rt.amount, rt.kind,
                    rt.frequency, rt.start_date, rt.end_date, rt.description,
                    rt.last_generated_date, rt.is_active,
                    c.name, a.name
             FROM recurring_transaction rt
             JOIN category c ON rt.category_id = c.id
             LEFT JOIN account a ON rt.account_id = a.id
             WHERE rt.user_id = :user_id
             ORDER BY rt.start_date DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| {
            Ok(RecurringListItem {
                recurring: map_recurring_row(row)?,
                category_name: row.get(12)?,
                account_name: row.get(13)?,
            })
        })?
        .map(|maybe_item| maybe_item.map_err(Error::from))
        .collect()
}

/// Retrieve the active recurring transactions owned by `user_id`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_active_recurring_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<RecurringTransaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_transaction
             WHERE user_id = :user_id AND is_active = 1"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_recurring_row)?
        .map(|maybe_recurring| maybe_recurring.map_err(Error::from))
        .collect()
}

/// Record that a template generated a transaction on `date`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn set_last_generated_date(
    id: RecurringId,
    date: Date,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "UPDATE recurring_transaction SET last_generated_date = ?1 WHERE id = ?2",
        params![date, id],
    )?;

    Ok(())
}

type RowsAffected = usize;

/// Replace every editable field of the template with `id` owned by
/// `user_id`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn update_recurring_transaction(
    id: RecurringId,
    user_id: UserID,
    new_recurring: &NewRecurringTransaction,
    is_active: bool,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "UPDATE recurring_transaction
             SET category_id = ?1, kind = ?2, amount = ?3, frequency = ?4,
                 start_date = ?5, end_date = ?6, description = ?7, account_id = ?8,
                 is_active = ?9
             WHERE id = ?10 AND user_id = ?11",
            params![
                new_recurring.category_id,
                new_recurring.kind,
                new_recurring.amount,
                new_recurring.frequency,
                new_recurring.start_date,
                new_recurring.end_date,
                new_recurring.description,
                new_recurring.account_id,
                is_active,
                id,
                user_id.as_i64(),
            ],
        )
        .map_err(Error::from)
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        category::{CategoryId, CategoryKind, CategoryName, NewCategory, create_category},
        recurring::Frequency,
        transaction::{TransactionKind, test_utils::get_test_connection},
        user::UserID,
    };

    use super::{
        NewRecurringTransaction, create_recurring_transaction,
        get_active_recurring_transactions, get_recurring_transaction,
        list_recurring_transactions, set_last_generated_date, update_recurring_transaction,
    };

    fn setup() -> (Connection, UserID, CategoryId) {
        let (conn, user_id) = get_test_connection();

        let category = create_category(
            NewCategory {
                user_id: Some(user_id),
                name: CategoryName::new_unchecked("Rent"),
                kind: CategoryKind::Expense,
            },
            &conn,
        )
        .unwrap();

        (conn, user_id, category.id)
    }

    fn new_recurring(user_id: UserID, category_id: CategoryId) -> NewRecurringTransaction {
        NewRecurringTransaction {
            user_id,
            category_id,
            account_id: None,
            amount: 1200.0,
            kind: TransactionKind::Expense,
            frequency: Frequency::Monthly,
            start_date: date!(2023 - 01 - 01),
            end_date: None,
            description: "Rent".to_owned(),
        }
    }

    #[test]
    fn new_template_is_active_with_no_generated_date() {
        let (conn, user_id, category_id) = setup();

        let recurring =
            create_recurring_transaction(new_recurring(user_id, category_id), &conn).unwrap();

        assert!(recurring.is_active);
        assert_eq!(recurring.last_generated_date, None);
        assert_eq!(recurring.frequency, Frequency::Monthly);
    }

    #[test]
    fn set_last_generated_date_round_trips() {
        let (conn, user_id, category_id) = setup();
        let recurring =
            create_recurring_transaction(new_recurring(user_id, category_id), &conn).unwrap();

        set_last_generated_date(recurring.id, date!(2023 - 02 - 01), &conn).unwrap();

        let got = get_recurring_transaction(recurring.id, user_id, &conn).unwrap();
        assert_eq!(got.last_generated_date, Some(date!(2023 - 02 - 01)));
    }

    #[test]
    fn deactivated_templates_are_excluded_from_active_list() {
        let (conn, user_id, category_id) = setup();
        let recurring =
            create_recurring_transaction(new_recurring(user_id, category_id), &conn).unwrap();

        assert_eq!(
            get_active_recurring_transactions(user_id, &conn)
                .unwrap()
                .len(),
            1
        );

        let rows = update_recurring_transaction(
            recurring.id,
            user_id,
            &new_recurring(user_id, category_id),
            false,
            &conn,
        )
        .unwrap();
        assert_eq!(rows, 1);

        assert!(
            get_active_recurring_transactions(user_id, &conn)
                .unwrap()
                .is_empty()
        );
        // The template still shows up in the full listing.
        assert_eq!(list_recurring_transactions(user_id, &conn).unwrap().len(), 1);
    }

    #[test]
    fn list_includes_category_name() {
        let (conn, user_id, category_id) = setup();
        create_recurring_transaction(new_recurring(user_id, category_id), &conn).unwrap();

        let items = list_recurring_transactions(user_id, &conn).unwrap();

        assert_eq!(items[0].category_name.as_deref(), Some("Rent"));
        assert_eq!(items[0].account_name, None);
    }
}
