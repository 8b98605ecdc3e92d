//! Database schema initialization.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error, account::create_account_table, bill::create_bill_reminder_table,
    budget::create_budget_table, category::create_category_table,
    notification::create_notification_table, recurring::create_recurring_transaction_table,
    savings::{create_savings_goal_table, create_savings_history_table},
    transaction::create_transaction_table, user::create_user_table,
};

/// Create the tables for the application's domain models.
///
/// Tables are created inside a single exclusive transaction so that a
/// partially initialized schema is never left behind.
///
/// # Errors
/// Returns an [Error::SqlError] if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_account_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_recurring_transaction_table(&transaction)?;
    create_bill_reminder_table(&transaction)?;
    create_notification_table(&transaction)?;
    create_savings_goal_table(&transaction)?;
    create_savings_history_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_succeeds_on_empty_database() {
        let connection =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");

        assert_eq!(Ok(()), initialize(&connection));
    }

    #[test]
    fn initialize_is_idempotent() {
        let connection =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");

        initialize(&connection).expect("first initialization failed");

        assert_eq!(Ok(()), initialize(&connection));
    }
}
