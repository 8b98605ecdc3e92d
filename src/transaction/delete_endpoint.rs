use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, params};

use crate::{
    AppState, Error,
    account::adjust_account_balance,
    database_id::TransactionId,
    ledger::reversal_adjustment,
    transaction::core::get_transaction,
    user::UserID,
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a transaction.
///
/// The transaction's effect on its account balance is undone before the
/// row is removed, restoring the balance to its pre-creation value.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match apply_delete(transaction_id, user_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => StatusCode::OK.into_response(),
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Undo the transaction's balance effect and delete the row within one
/// database transaction.
fn apply_delete(
    transaction_id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let transaction = get_transaction(transaction_id, user_id, &sql_transaction)
        .map_err(|error| match error {
            Error::NotFound => Error::DeleteMissingTransaction,
            error => error,
        })?;

    if let Some(adjustment) = reversal_adjustment(&transaction.ledger_entry()) {
        adjust_account_balance(adjustment.account_id, adjustment.delta, &sql_transaction)?;
    }

    let rows_affected = sql_transaction.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        params![transaction_id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    sql_transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use time::macros::date;

    use crate::{
        Error,
        account::{NewAccount, adjust_account_balance, create_account, get_account},
        ledger::creation_adjustment,
        transaction::{
            NewTransaction, TransactionKind, core::test_utils::get_test_connection,
            create_transaction,
            delete_endpoint::{DeleteTransactionState, delete_transaction_endpoint},
            get_transaction,
        },
        user::UserID,
    };

    #[tokio::test]
    async fn delete_restores_pre_creation_balance() {
        let (conn, user_id) = get_test_connection();
        let account = create_account(
            NewAccount {
                user_id: Some(user_id),
                name: "Test Account".to_owned(),
                account_type: "Checking".to_owned(),
                balance: 1000.0,
            },
            &conn,
        )
        .unwrap();

        // 200 expense applied to the account leaves 800.
        let transaction = create_transaction(
            NewTransaction {
                user_id,
                category_id: None,
                account_id: Some(account.id),
                amount: 200.0,
                kind: TransactionKind::Expense,
                date: date!(2023 - 01 - 01),
                description: "test".to_owned(),
                receipt_url: None,
                is_recurring_generated: false,
            },
            &conn,
        )
        .unwrap();
        let adjustment = creation_adjustment(&transaction.ledger_entry()).unwrap();
        adjust_account_balance(adjustment.account_id, adjustment.delta, &conn).unwrap();

        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = delete_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Path(transaction.id),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_transaction(transaction.id, user_id, &connection),
            Err(Error::NotFound)
        );
        let account = get_account(account.id, user_id, &connection).unwrap();
        assert_eq!(account.balance, 1000.0);
    }

    #[tokio::test]
    async fn delete_for_other_user_is_rejected() {
        let (conn, user_id) = get_test_connection();
        let transaction = create_transaction(
            NewTransaction {
                user_id,
                category_id: None,
                account_id: None,
                amount: 1.0,
                kind: TransactionKind::Expense,
                date: date!(2023 - 01 - 01),
                description: "test".to_owned(),
                receipt_url: None,
                is_recurring_generated: false,
            },
            &conn,
        )
        .unwrap();
        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = delete_transaction_endpoint(
            State(state.clone()),
            Extension(UserID::new(user_id.as_i64() + 1)),
            Path(transaction.id),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let connection = state.db_connection.lock().unwrap();
        assert!(get_transaction(transaction.id, user_id, &connection).is_ok());
    }
}
