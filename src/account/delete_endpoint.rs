//! Defines the endpoint for deleting an account.

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
    account::{AccountId, count_transactions_for_account},
    user::UserID,
};

/// The state needed to delete an account.
#[derive(Debug, Clone)]
pub struct DeleteAccountState {
    /// The database connection for managing accounts.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting an account.
///
/// Accounts that still have transactions linked to them are not deleted,
/// because deleting them would orphan the transactions and make the balance
/// history unexplainable.
pub async fn delete_account_endpoint(
    State(state): State<DeleteAccountState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<AccountId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let transaction_count = match count_transactions_for_account(account_id, user_id, &connection)
    {
        Ok(count) => count,
        Err(error) => {
            tracing::error!("Could not count transactions for account {account_id}: {error}");
            return error.into_alert_response();
        }
    };

    if transaction_count > 0 {
        return Error::AccountHasTransactions.into_alert_response();
    }

    match delete_account(account_id, user_id, &connection) {
        Ok(0) => Error::DeleteMissingAccount.into_alert_response(),
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(_) => StatusCode::OK.into_response(),
        Err(error) => {
            tracing::error!("Could not delete account {account_id}: {error}");
            error.into_alert_response()
        }
    }
}

type RowsAffected = usize;

fn delete_account(
    id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM account WHERE id = ?1 AND user_id = ?2",
            params![id, user_id.as_i64()],
        )
        .map_err(|err| err.into())
}
