use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::{Connection, params};
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    account::{AccountId, adjust_account_balance},
    category::CategoryId,
    database_id::TransactionId,
    endpoints,
    ledger::{LedgerEntry, edit_adjustments},
    transaction::{TransactionKind, core::get_transaction},
    user::UserID,
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for editing a transaction.
#[derive(Debug, Deserialize)]
pub struct EditTransactionForm {
    amount: f64,
    kind: TransactionKind,
    date: Date,
    description: String,
    category_id: CategoryId,
    #[serde(default)]
    account_id: Option<AccountId>,
    #[serde(default)]
    receipt_url: Option<String>,
}

/// A route handler for updating a transaction.
///
/// The old transaction's effect is removed from the account it was applied
/// to, then the new values are applied to the account the form selects.
/// The two balance adjustments are persisted separately, so moving a
/// transaction from one account to another leaves the first account as if
/// the transaction never existed.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    Form(form): Form<EditTransactionForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = apply_edit(transaction_id, user_id, &form, &connection) {
        tracing::error!("Could not update transaction {transaction_id}: {error}");
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// Update the transaction row and rebalance the affected accounts within
/// one database transaction.
fn apply_edit(
    transaction_id: TransactionId,
    user_id: UserID,
    form: &EditTransactionForm,
    connection: &Connection,
) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let old = get_transaction(transaction_id, user_id, &sql_transaction)
        .map_err(|error| match error {
            Error::NotFound => Error::UpdateMissingTransaction,
            error => error,
        })?;

    let new_entry = LedgerEntry {
        account_id: form.account_id,
        kind: form.kind,
        amount: form.amount,
    };

    for adjustment in edit_adjustments(&old.ledger_entry(), &new_entry) {
        adjust_account_balance(adjustment.account_id, adjustment.delta, &sql_transaction)?;
    }

    let rows_affected = sql_transaction.execute(
        "UPDATE \"transaction\"
        SET category_id = ?1, kind = ?2, amount = ?3, date = ?4,
            description = ?5, receipt_url = ?6, account_id = ?7
        WHERE id = ?8 AND user_id = ?9",
        params![
            form.category_id,
            form.kind,
            form.amount,
            form.date,
            form.description,
            form.receipt_url,
            form.account_id,
            transaction_id,
            user_id.as_i64(),
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    sql_transaction.commit()?;

    Ok(())
}
